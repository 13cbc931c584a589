//! Pre-rendered post pages with time-based revalidation.
//!
//! A request for a post is answered from the snapshot store:
//!
//! - a fresh snapshot is returned as-is;
//! - a stale snapshot is returned immediately and one background regeneration is
//!   scheduled, unless one is already running for that id;
//! - a missing snapshot is generated while the caller waits, with concurrent
//!   callers for the same id sharing that single generation.
//!
//! Failed regenerations leave the stale snapshot in place. Failed first
//! generations are reported to the caller and nothing is cached.

use std::{sync::Arc, time::Duration};

use dashmap::DashMap;
use metrics::{counter, histogram};
use thiserror::Error;
use tokio::{sync::Mutex, time::Instant};
use tracing::{debug, info, warn};

use crate::{
    application::repos::{PostsRepo, RepoError},
    cache::{SnapshotCacheConfig, SnapshotLookup, SnapshotStore},
    domain::entities::PostRecord,
    presentation::views::render_post_document,
};

const TARGET: &str = "gazette::snapshots";

/// A post page rendered ahead of request time.
#[derive(Debug, Clone)]
pub struct PostSnapshot {
    pub post: PostRecord,
    pub html: String,
}

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("post `{id}` not found")]
    NotFound { id: String },
    #[error(transparent)]
    Store(#[from] RepoError),
    #[error("failed to render post page: {0}")]
    Render(#[from] askama::Error),
}

/// Outcome of the startup prerender pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PrerenderReport {
    pub generated: usize,
    pub skipped: usize,
}

#[derive(Clone)]
pub struct SnapshotService {
    posts: Arc<dyn PostsRepo>,
    store: Arc<SnapshotStore<PostSnapshot>>,
    first_generation: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl SnapshotService {
    pub fn new(posts: Arc<dyn PostsRepo>, config: &SnapshotCacheConfig) -> Self {
        Self {
            posts,
            store: Arc::new(SnapshotStore::new(config.stale_after)),
            first_generation: Arc::new(DashMap::new()),
        }
    }

    pub fn store(&self) -> &SnapshotStore<PostSnapshot> {
        &self.store
    }

    pub fn stale_after(&self) -> Duration {
        self.store.stale_after()
    }

    /// Lists every post id the store knows about right now.
    pub async fn enumerate_known_ids(&self) -> Result<Vec<String>, RepoError> {
        self.posts.list_post_ids().await
    }

    /// Loads and renders a single post without touching the cache.
    pub async fn generate_snapshot(&self, id: &str) -> Result<PostSnapshot, SnapshotError> {
        let started = Instant::now();
        let post = self
            .posts
            .find_post_by_id(id)
            .await?
            .ok_or_else(|| SnapshotError::NotFound { id: id.to_string() })?;
        let html = render_post_document(&post)?;
        histogram!("gazette_snapshot_generate_ms").record(started.elapsed().as_secs_f64() * 1000.0);
        Ok(PostSnapshot { post, html })
    }

    /// Generates a snapshot for every known id. Individual failures are logged and skipped.
    pub async fn prerender_all(&self) -> Result<PrerenderReport, RepoError> {
        let ids = self.enumerate_known_ids().await?;
        let mut report = PrerenderReport::default();

        for id in ids {
            match self.generate_snapshot(&id).await {
                Ok(snapshot) => {
                    self.store.insert(id, snapshot, Instant::now());
                    report.generated += 1;
                }
                Err(err) => {
                    warn!(target: TARGET, post_id = %id, error = %err, "prerender skipped post");
                    report.skipped += 1;
                }
            }
        }

        info!(
            target: TARGET,
            generated = report.generated,
            skipped = report.skipped,
            "prerendered post snapshots"
        );
        Ok(report)
    }

    /// Returns the snapshot for `id`, generating or scheduling regeneration as needed.
    pub async fn get(&self, id: &str) -> Result<Arc<PostSnapshot>, SnapshotError> {
        match self.store.lookup(id, Instant::now()) {
            SnapshotLookup::Fresh(snapshot) => {
                counter!("gazette_snapshot_hit_total").increment(1);
                Ok(snapshot)
            }
            SnapshotLookup::Stale(snapshot) => {
                counter!("gazette_snapshot_stale_total").increment(1);
                self.schedule_regeneration(id);
                Ok(snapshot)
            }
            SnapshotLookup::Missing => {
                counter!("gazette_snapshot_miss_total").increment(1);
                self.generate_blocking(id).await
            }
        }
    }

    /// Spawns a background regeneration unless one is already in flight for `id`.
    ///
    /// Returns whether a new regeneration was started.
    pub fn schedule_regeneration(&self, id: &str) -> bool {
        let Some(guard) = self.store.try_begin_regeneration(id) else {
            debug!(target: TARGET, post_id = %id, "regeneration already in flight");
            return false;
        };

        let service = self.clone();
        tokio::spawn(async move {
            let id = guard.id().to_string();
            let outcome = match service.generate_snapshot(&id).await {
                Ok(snapshot) => {
                    service.store.insert(id.as_str(), snapshot, Instant::now());
                    "ok"
                }
                Err(SnapshotError::NotFound { .. }) => {
                    warn!(
                        target: TARGET,
                        post_id = %id,
                        "post vanished during regeneration; keeping stale snapshot"
                    );
                    "not_found"
                }
                Err(err) => {
                    warn!(
                        target: TARGET,
                        post_id = %id,
                        error = %err,
                        "regeneration failed; keeping stale snapshot"
                    );
                    "error"
                }
            };
            counter!("gazette_snapshot_regenerate_total", "outcome" => outcome).increment(1);
            drop(guard);
        });
        true
    }

    async fn generate_blocking(&self, id: &str) -> Result<Arc<PostSnapshot>, SnapshotError> {
        let gate = self
            .first_generation
            .entry(id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        let result = self.generate_under_gate(id, &gate).await;

        drop(gate);
        self.first_generation
            .remove_if(id, |_, gate| Arc::strong_count(gate) == 1);
        result
    }

    async fn generate_under_gate(
        &self,
        id: &str,
        gate: &Mutex<()>,
    ) -> Result<Arc<PostSnapshot>, SnapshotError> {
        let _permit = gate.lock().await;

        // A caller that held the gate before us may have stored it already.
        if let Some(snapshot) = self.store.current(id) {
            return Ok(snapshot);
        }

        let snapshot = self.generate_snapshot(id).await?;
        debug!(target: TARGET, post_id = %id, "generated snapshot on demand");
        Ok(self.store.insert(id, snapshot, Instant::now()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::memory::InMemoryRepositories;

    fn post(id: &str, name: &str) -> PostRecord {
        PostRecord {
            id: id.to_string(),
            name: name.to_string(),
            body: format!("body of {name}"),
            img: String::new(),
        }
    }

    fn service(repos: &Arc<InMemoryRepositories>) -> SnapshotService {
        SnapshotService::new(repos.clone(), &SnapshotCacheConfig::default())
    }

    #[tokio::test]
    async fn generate_snapshot_renders_post_fields() {
        let repos = Arc::new(InMemoryRepositories::with_posts(vec![post("p1", "Hello")]));
        let snapshot = service(&repos).generate_snapshot("p1").await.expect("snapshot");
        assert_eq!(snapshot.post.name, "Hello");
        assert!(snapshot.html.contains("Hello"));
        assert!(snapshot.html.contains("data-post-id=\"p1\""));
    }

    #[tokio::test]
    async fn generate_snapshot_reports_unknown_post() {
        let repos = Arc::new(InMemoryRepositories::default());
        let err = service(&repos).generate_snapshot("nope").await.unwrap_err();
        assert!(matches!(err, SnapshotError::NotFound { id } if id == "nope"));
    }

    #[tokio::test]
    async fn prerender_covers_every_known_id() {
        let repos = Arc::new(InMemoryRepositories::with_posts(vec![
            post("a", "A"),
            post("b", "B"),
        ]));
        let service = service(&repos);

        let report = service.prerender_all().await.expect("prerender");
        assert_eq!(report, PrerenderReport { generated: 2, skipped: 0 });
        assert_eq!(service.store().len(), 2);
    }

    #[tokio::test]
    async fn prerender_with_empty_store_is_empty() {
        let repos = Arc::new(InMemoryRepositories::default());
        let service = service(&repos);
        let report = service.prerender_all().await.expect("prerender");
        assert_eq!(report, PrerenderReport::default());
        assert!(service.store().is_empty());
    }

    #[tokio::test]
    async fn missing_generation_failure_is_not_cached() {
        let repos = Arc::new(InMemoryRepositories::default());
        let service = service(&repos);

        assert!(matches!(
            service.get("late").await,
            Err(SnapshotError::NotFound { .. })
        ));
        assert!(service.store().current("late").is_none());

        repos.insert_post(post("late", "Late"));
        let snapshot = service.get("late").await.expect("now exists");
        assert_eq!(snapshot.post.name, "Late");
    }

    #[tokio::test]
    async fn regeneration_is_claimed_once() {
        let repos = Arc::new(InMemoryRepositories::with_posts(vec![post("p1", "One")]));
        let service = service(&repos);

        let guard = service.store().try_begin_regeneration("p1").expect("claim");
        assert!(!service.schedule_regeneration("p1"));
        drop(guard);
        assert!(service.schedule_regeneration("p1"));
    }
}
