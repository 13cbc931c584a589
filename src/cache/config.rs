//! Snapshot cache configuration.

use std::time::Duration;

pub(crate) const DEFAULT_STALE_AFTER_SECS: u64 = 10;

#[derive(Debug, Clone)]
pub struct SnapshotCacheConfig {
    /// How long a snapshot is served without triggering regeneration.
    pub stale_after: Duration,
    /// Generate a snapshot for every known post before accepting requests.
    pub prerender_on_startup: bool,
}

impl Default for SnapshotCacheConfig {
    fn default() -> Self {
        Self {
            stale_after: Duration::from_secs(DEFAULT_STALE_AFTER_SECS),
            prerender_on_startup: true,
        }
    }
}

impl From<&crate::config::SnapshotSettings> for SnapshotCacheConfig {
    fn from(settings: &crate::config::SnapshotSettings) -> Self {
        Self {
            stale_after: settings.stale_after,
            prerender_on_startup: settings.prerender_on_startup,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_window_is_ten_seconds() {
        let config = SnapshotCacheConfig::default();
        assert_eq!(config.stale_after, Duration::from_secs(10));
        assert!(config.prerender_on_startup);
    }
}
