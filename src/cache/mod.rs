//! Gazette snapshot cache
//!
//! Holds pre-rendered post pages keyed by post id. Each entry records when it was
//! generated and how long it stays fresh; past that point it is still served
//! while at most one background regeneration per id refreshes it.
//!
//! ## Configuration
//!
//! ```toml
//! [snapshots]
//! stale_after_seconds = 10
//! prerender_on_startup = true
//! ```

mod config;
mod inflight;
pub(crate) mod lock;
mod store;

pub(crate) use config::DEFAULT_STALE_AFTER_SECS;
pub use config::SnapshotCacheConfig;
pub use inflight::{InFlightRegenerations, RegenerationGuard};
pub use store::{SnapshotEntry, SnapshotLookup, SnapshotStore};
