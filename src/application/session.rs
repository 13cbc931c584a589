//! Server-side sessions for signed-in users.
//!
//! A session starts empty (no entry), is opened by a successful sign-in and is
//! cleared by logout or expiry. Only a SHA-256 digest of each token is retained.

use std::{sync::Arc, time::Duration};

use dashmap::DashMap;
use sha2::{Digest, Sha256};
use tokio::time::Instant;
use tracing::debug;
use uuid::Uuid;

use crate::domain::entities::SessionUser;

const TARGET: &str = "gazette::session";

/// Longest lifetime a session can be given.
pub const MAX_SESSION_TTL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

#[derive(Debug, Clone)]
struct SessionEntry {
    user: SessionUser,
    expires_at: Instant,
}

#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<DashMap<String, SessionEntry>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
            ttl: ttl.min(MAX_SESSION_TTL),
        }
    }

    /// Opens a session for `user` and returns the bearer token for the cookie.
    pub fn open(&self, user: SessionUser) -> String {
        let token = Self::generate_token();
        let now = Instant::now();
        let expires_at = now
            .checked_add(self.ttl)
            .or_else(|| now.checked_add(MAX_SESSION_TTL))
            .unwrap_or(now);
        let entry = SessionEntry { user, expires_at };
        self.sessions.insert(Self::digest(&token), entry);
        token
    }

    /// Resolves a token to its user. Expired sessions are removed on sight.
    pub fn resolve(&self, token: &str) -> Option<SessionUser> {
        let key = Self::digest(token);
        let now = Instant::now();
        let entry = self.sessions.get(&key).map(|entry| entry.clone())?;
        if entry.expires_at <= now {
            self.sessions.remove(&key);
            debug!(target: TARGET, "session expired");
            return None;
        }
        Some(entry.user)
    }

    /// Ends the session. Returns whether one existed.
    pub fn clear(&self, token: &str) -> bool {
        self.sessions.remove(&Self::digest(token)).is_some()
    }

    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.sessions.len();
        self.sessions.retain(|_, entry| entry.expires_at > now);
        before.saturating_sub(self.sessions.len())
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    fn generate_token() -> String {
        format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
    }

    fn digest(token: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        hex::encode(hasher.finalize().to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ada() -> SessionUser {
        SessionUser {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            photo: "https://example.com/ada.png".to_string(),
        }
    }

    #[test]
    fn store_starts_empty() {
        let store = SessionStore::new(Duration::from_secs(60));
        assert!(store.is_empty());
        assert!(store.resolve("anything").is_none());
    }

    #[tokio::test]
    async fn open_resolve_clear_lifecycle() {
        let store = SessionStore::new(Duration::from_secs(60));
        let token = store.open(ada());

        assert_eq!(store.resolve(&token), Some(ada()));
        assert!(store.clear(&token));
        assert!(store.resolve(&token).is_none());
        assert!(!store.clear(&token));
    }

    #[tokio::test]
    async fn raw_token_is_not_stored() {
        let store = SessionStore::new(Duration::from_secs(60));
        let token = store.open(ada());
        assert!(!store.sessions.contains_key(&token));
    }

    #[tokio::test(start_paused = true)]
    async fn oversized_ttl_is_capped() {
        let store = SessionStore::new(Duration::from_secs(u64::MAX));
        let token = store.open(ada());

        assert_eq!(store.resolve(&token), Some(ada()));
        tokio::time::advance(MAX_SESSION_TTL).await;
        assert!(store.resolve(&token).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn sessions_expire_after_ttl() {
        let store = SessionStore::new(Duration::from_secs(60));
        let token = store.open(ada());
        let other = store.open(ada());

        tokio::time::advance(Duration::from_secs(61)).await;
        assert!(store.resolve(&token).is_none());
        assert_eq!(store.purge_expired(), 1);
        assert!(store.resolve(&other).is_none());
        assert!(store.is_empty());
    }
}
