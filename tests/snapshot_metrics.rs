use std::collections::HashSet;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use gazette::application::comments::{CommentPageLimits, CommentService};
use gazette::application::snapshots::SnapshotService;
use gazette::cache::SnapshotCacheConfig;
use gazette::domain::comments::NewComment;
use gazette::domain::entities::PostRecord;
use gazette::infra::memory::InMemoryRepositories;
use metrics_util::debugging::DebuggingRecorder;

#[tokio::test(start_paused = true)]
async fn snapshot_and_comment_paths_emit_expected_metric_keys() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    recorder
        .install()
        .expect("debug metrics recorder should install in this test process");

    let repos = Arc::new(InMemoryRepositories::with_posts(vec![PostRecord {
        id: "p1".to_string(),
        name: "Metrics".to_string(),
        body: "Counting.".to_string(),
        img: String::new(),
    }]));
    let snapshots = SnapshotService::new(repos.clone(), &SnapshotCacheConfig::default());

    // miss, then hit
    snapshots.get("p1").await.expect("generated");
    snapshots.get("p1").await.expect("fresh");

    // stale, then background regeneration
    tokio::time::advance(Duration::from_secs(10)).await;
    snapshots.get("p1").await.expect("stale");
    tokio::time::sleep(Duration::from_secs(1)).await;

    let comments = CommentService::new(
        repos,
        CommentPageLimits {
            default: NonZeroU32::new(10).expect("non-zero"),
            max: NonZeroU32::new(10).expect("non-zero"),
        },
    );
    comments
        .add(NewComment {
            post_id: "p1".to_string(),
            author_name: "Ada".to_string(),
            author_photo: String::new(),
            body: "counted".to_string(),
        })
        .await
        .expect("comment added");

    let names: HashSet<String> = snapshotter
        .snapshot()
        .into_vec()
        .into_iter()
        .map(|(composite_key, _, _, _)| composite_key.key().name().to_string())
        .collect();

    let expected = [
        "gazette_snapshot_hit_total",
        "gazette_snapshot_stale_total",
        "gazette_snapshot_miss_total",
        "gazette_snapshot_regenerate_total",
        "gazette_snapshot_generate_ms",
        "gazette_comments_added_total",
    ];

    for metric in expected {
        assert!(names.contains(metric), "missing metric: {metric}");
    }
}
