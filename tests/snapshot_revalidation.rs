use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use gazette::application::repos::RepoError;
use gazette::application::snapshots::{SnapshotError, SnapshotService};
use gazette::cache::SnapshotCacheConfig;
use gazette::domain::entities::PostRecord;
use gazette::infra::memory::InMemoryRepositories;

fn post(id: &str, name: &str) -> PostRecord {
    PostRecord {
        id: id.to_string(),
        name: name.to_string(),
        body: format!("{name} body"),
        img: String::new(),
    }
}

fn service(repos: &Arc<InMemoryRepositories>) -> SnapshotService {
    SnapshotService::new(repos.clone(), &SnapshotCacheConfig::default())
}

#[tokio::test(start_paused = true)]
async fn prerendered_posts_are_served_without_store_lookups() {
    let repos = Arc::new(InMemoryRepositories::with_posts(vec![
        post("a", "Alpha"),
        post("b", "Beta"),
    ]));
    let service = service(&repos);
    service.prerender_all().await.expect("prerender");
    let after_prerender = repos.post_lookups();

    for _ in 0..5 {
        assert_eq!(service.get("a").await.expect("a").post.name, "Alpha");
        assert_eq!(service.get("b").await.expect("b").post.name, "Beta");
    }

    assert_eq!(repos.post_lookups(), after_prerender);
}

#[tokio::test(start_paused = true)]
async fn concurrent_misses_share_one_generation() {
    let repos = Arc::new(InMemoryRepositories::with_posts(vec![post("p1", "First")]));
    repos.set_lookup_delay(Duration::from_millis(100));
    let service = service(&repos);

    let results = join_all((0..8).map(|_| service.get("p1"))).await;
    let snapshots: Vec<_> = results
        .into_iter()
        .map(|result| result.expect("generated"))
        .collect();

    assert_eq!(repos.post_lookups(), 1);
    for snapshot in &snapshots {
        assert!(Arc::ptr_eq(snapshot, &snapshots[0]));
    }
    assert_eq!(service.store().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn concurrent_stale_requests_trigger_one_regeneration() {
    let repos = Arc::new(InMemoryRepositories::with_posts(vec![post("p1", "First")]));
    let service = service(&repos);
    service.prerender_all().await.expect("prerender");
    let after_prerender = repos.post_lookups();

    repos.insert_post(post("p1", "Second"));
    repos.set_lookup_delay(Duration::from_millis(200));
    tokio::time::advance(Duration::from_secs(10)).await;

    let results = join_all((0..16).map(|_| service.get("p1"))).await;
    for result in results {
        assert_eq!(result.expect("stale snapshot").post.name, "First");
    }
    assert!(
        service
            .store()
            .entry("p1")
            .expect("entry")
            .regeneration_in_flight
    );

    tokio::time::sleep(Duration::from_secs(1)).await;

    assert_eq!(repos.post_lookups(), after_prerender + 1);
    let refreshed = service.get("p1").await.expect("fresh snapshot");
    assert_eq!(refreshed.post.name, "Second");
    assert_eq!(repos.post_lookups(), after_prerender + 1);
}

#[tokio::test(start_paused = true)]
async fn failed_regeneration_keeps_serving_stale_snapshot() {
    let repos = Arc::new(InMemoryRepositories::with_posts(vec![post("p1", "First")]));
    let service = service(&repos);
    service.prerender_all().await.expect("prerender");

    repos.set_unavailable(true);
    tokio::time::advance(Duration::from_secs(10)).await;

    let stale = service.get("p1").await.expect("stale snapshot");
    assert_eq!(stale.post.name, "First");
    tokio::time::sleep(Duration::from_secs(1)).await;

    let entry = service.store().entry("p1").expect("entry kept");
    assert_eq!(entry.value.post.name, "First");
    assert!(!entry.regeneration_in_flight);

    repos.set_unavailable(false);
    repos.insert_post(post("p1", "Recovered"));
    assert_eq!(service.get("p1").await.expect("stale").post.name, "First");
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(
        service.get("p1").await.expect("fresh").post.name,
        "Recovered"
    );
}

#[tokio::test(start_paused = true)]
async fn deleted_post_keeps_its_last_snapshot() {
    let repos = Arc::new(InMemoryRepositories::with_posts(vec![post("p1", "First")]));
    let service = service(&repos);
    service.prerender_all().await.expect("prerender");

    repos.remove_post("p1");
    tokio::time::advance(Duration::from_secs(10)).await;

    assert_eq!(service.get("p1").await.expect("stale").post.name, "First");
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert!(service.store().current("p1").is_some());
}

#[tokio::test]
async fn unavailable_store_fails_first_generation() {
    let repos = Arc::new(InMemoryRepositories::with_posts(vec![post("p1", "First")]));
    repos.set_unavailable(true);
    let service = service(&repos);

    let err = service.get("p1").await.unwrap_err();
    assert!(matches!(
        err,
        SnapshotError::Store(RepoError::Unavailable { .. })
    ));
    assert!(service.store().is_empty());
}
