//! Snapshot storage.

use std::{collections::HashMap, sync::Arc, sync::RwLock, time::Duration};

use tokio::time::Instant;

use super::inflight::{InFlightRegenerations, RegenerationGuard};
use super::lock::{rw_read, rw_write};

const SOURCE: &str = "cache::store";

/// One cached snapshot together with its freshness bookkeeping.
#[derive(Debug)]
pub struct SnapshotEntry<V> {
    pub value: Arc<V>,
    pub generated_at: Instant,
    pub stale_after: Duration,
    pub regeneration_in_flight: bool,
}

impl<V> SnapshotEntry<V> {
    pub fn is_stale(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.generated_at) >= self.stale_after
    }
}

#[derive(Debug)]
pub enum SnapshotLookup<V> {
    Fresh(Arc<V>),
    Stale(Arc<V>),
    Missing,
}

struct StoredSnapshot<V> {
    value: Arc<V>,
    generated_at: Instant,
}

/// Snapshots keyed by post id.
///
/// Entries are only ever replaced, never evicted. Regeneration claims live
/// beside the entries so a stale entry can report whether a refresh is running.
pub struct SnapshotStore<V> {
    entries: RwLock<HashMap<String, StoredSnapshot<V>>>,
    inflight: InFlightRegenerations,
    stale_after: Duration,
}

impl<V> SnapshotStore<V> {
    pub fn new(stale_after: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            inflight: InFlightRegenerations::new(),
            stale_after,
        }
    }

    pub fn stale_after(&self) -> Duration {
        self.stale_after
    }

    pub fn lookup(&self, id: &str, now: Instant) -> SnapshotLookup<V> {
        let entries = rw_read(&self.entries, SOURCE, "lookup");
        match entries.get(id) {
            Some(stored)
                if now.saturating_duration_since(stored.generated_at) >= self.stale_after =>
            {
                SnapshotLookup::Stale(Arc::clone(&stored.value))
            }
            Some(stored) => SnapshotLookup::Fresh(Arc::clone(&stored.value)),
            None => SnapshotLookup::Missing,
        }
    }

    /// Returns the stored value regardless of freshness.
    pub fn current(&self, id: &str) -> Option<Arc<V>> {
        rw_read(&self.entries, SOURCE, "current")
            .get(id)
            .map(|stored| Arc::clone(&stored.value))
    }

    pub fn entry(&self, id: &str) -> Option<SnapshotEntry<V>> {
        let entries = rw_read(&self.entries, SOURCE, "entry");
        entries.get(id).map(|stored| SnapshotEntry {
            value: Arc::clone(&stored.value),
            generated_at: stored.generated_at,
            stale_after: self.stale_after,
            regeneration_in_flight: self.inflight.contains(id),
        })
    }

    pub fn insert(&self, id: impl Into<String>, value: V, generated_at: Instant) -> Arc<V> {
        let value = Arc::new(value);
        rw_write(&self.entries, SOURCE, "insert").insert(
            id.into(),
            StoredSnapshot {
                value: Arc::clone(&value),
                generated_at,
            },
        );
        value
    }

    pub fn try_begin_regeneration(&self, id: &str) -> Option<RegenerationGuard> {
        self.inflight.acquire(id)
    }

    pub fn len(&self) -> usize {
        rw_read(&self.entries, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn entry_turns_stale_after_window() {
        let store = SnapshotStore::new(Duration::from_secs(10));
        store.insert("p1", "v1".to_string(), Instant::now());

        assert!(matches!(
            store.lookup("p1", Instant::now()),
            SnapshotLookup::Fresh(_)
        ));

        tokio::time::advance(Duration::from_secs(10)).await;
        match store.lookup("p1", Instant::now()) {
            SnapshotLookup::Stale(value) => assert_eq!(value.as_str(), "v1"),
            other => panic!("expected stale entry, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn replacing_entry_resets_freshness() {
        let store = SnapshotStore::new(Duration::from_secs(10));
        store.insert("p1", "v1".to_string(), Instant::now());
        tokio::time::advance(Duration::from_secs(11)).await;

        store.insert("p1", "v2".to_string(), Instant::now());
        match store.lookup("p1", Instant::now()) {
            SnapshotLookup::Fresh(value) => assert_eq!(value.as_str(), "v2"),
            other => panic!("expected fresh entry, got {other:?}"),
        }
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn missing_entry_is_reported() {
        let store: SnapshotStore<String> = SnapshotStore::new(Duration::from_secs(10));
        assert!(matches!(
            store.lookup("nope", Instant::now()),
            SnapshotLookup::Missing
        ));
        assert!(store.current("nope").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn entry_carries_its_staleness_window() {
        let store = SnapshotStore::new(Duration::from_secs(10));
        let generated_at = Instant::now();
        store.insert("p1", 1_u8, generated_at);

        let entry = store.entry("p1").expect("entry");
        assert_eq!(entry.generated_at, generated_at);
        assert_eq!(entry.stale_after, Duration::from_secs(10));
        assert!(!entry.is_stale(generated_at + Duration::from_secs(9)));
        assert!(entry.is_stale(generated_at + Duration::from_secs(10)));
    }

    #[test]
    fn entry_reports_regeneration_claim() {
        let store = SnapshotStore::new(Duration::from_secs(10));
        store.insert("p1", 1_u8, Instant::now());

        let guard = store.try_begin_regeneration("p1").expect("claim");
        assert!(store.entry("p1").expect("entry").regeneration_in_flight);
        assert!(store.try_begin_regeneration("p1").is_none());

        drop(guard);
        assert!(!store.entry("p1").expect("entry").regeneration_in_flight);
    }
}
