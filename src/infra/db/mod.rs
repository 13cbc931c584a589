//! Postgres-backed repository implementations.

mod comments;
mod posts;
mod util;

pub use util::map_sqlx_error;

use std::{num::NonZeroU32, sync::Arc, time::Duration};

use async_trait::async_trait;
use sqlx::{
    postgres::{PgPool, PgPoolOptions},
    query,
};
use tokio::sync::OnceCell;
use tracing::info;

use crate::application::repos::{RepoError, StoreHealth};
use crate::config::DatabaseSettings;

const TARGET: &str = "gazette::db";

/// Process-wide handle to the document store.
///
/// The pool is created on first use and shared by every clone. Concurrent first
/// callers wait on the same connection attempt; a failed attempt is not kept,
/// so the next call dials again.
#[derive(Clone)]
pub struct PostgresRepositories {
    url: Arc<str>,
    max_connections: NonZeroU32,
    connect_timeout: Duration,
    pool: Arc<OnceCell<PgPool>>,
}

impl PostgresRepositories {
    pub fn new(
        url: impl Into<Arc<str>>,
        max_connections: NonZeroU32,
        connect_timeout: Duration,
    ) -> Self {
        Self {
            url: url.into(),
            max_connections,
            connect_timeout,
            pool: Arc::new(OnceCell::new()),
        }
    }

    pub fn from_settings(url: &str, settings: &DatabaseSettings) -> Self {
        Self::new(url, settings.max_connections, settings.connect_timeout)
    }

    pub fn is_connected(&self) -> bool {
        self.pool.initialized()
    }

    /// Returns the shared pool, establishing it on the first call.
    pub async fn connect(&self) -> Result<&PgPool, RepoError> {
        self.pool
            .get_or_try_init(|| async {
                let pool = PgPoolOptions::new()
                    .max_connections(self.max_connections.get())
                    .acquire_timeout(self.connect_timeout)
                    .connect(&self.url)
                    .await
                    .map_err(|err| RepoError::unavailable(err.to_string()))?;
                info!(
                    target: TARGET,
                    max_connections = self.max_connections.get(),
                    "document store connected"
                );
                Ok::<_, RepoError>(pool)
            })
            .await
    }

    pub async fn run_migrations(&self) -> Result<(), RepoError> {
        let pool = self.connect().await?;
        sqlx::migrate!("./migrations")
            .run(pool)
            .await
            .map_err(RepoError::from_persistence)
    }
}

#[async_trait]
impl StoreHealth for PostgresRepositories {
    async fn health_check(&self) -> Result<(), RepoError> {
        let pool = self.connect().await?;
        query("SELECT 1")
            .execute(pool)
            .await
            .map(|_| ())
            .map_err(map_sqlx_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unreachable() -> PostgresRepositories {
        PostgresRepositories::new(
            "postgres://gazette@127.0.0.1:1/gazette",
            NonZeroU32::new(1).expect("non-zero"),
            Duration::from_millis(200),
        )
    }

    #[test]
    fn construction_does_not_connect() {
        assert!(!unreachable().is_connected());
    }

    #[tokio::test]
    async fn unreachable_store_reports_unavailable_and_stays_unconnected() {
        let repos = unreachable();

        let err = repos.connect().await.unwrap_err();
        assert!(err.is_unavailable());
        assert!(!repos.is_connected());
        assert!(repos.health_check().await.is_err());
    }
}
