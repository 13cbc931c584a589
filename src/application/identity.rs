//! Sign-in through an external identity provider.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{info, warn};

use crate::{application::session::SessionStore, domain::entities::SessionUser};

const TARGET: &str = "gazette::identity";

#[derive(Debug, Error)]
pub enum AuthFailure {
    #[error("no credential was supplied")]
    MissingCredential,
    #[error("credential rejected: {0}")]
    Rejected(String),
    #[error("identity provider error: {0}")]
    Provider(String),
}

/// Exchanges a credential from the provider's sign-in popup for a user profile.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn login(&self, credential: &str) -> Result<SessionUser, AuthFailure>;
}

/// Couples the identity provider with the session store.
#[derive(Clone)]
pub struct LoginService {
    provider: Arc<dyn IdentityProvider>,
    sessions: SessionStore,
}

impl LoginService {
    pub fn new(provider: Arc<dyn IdentityProvider>, sessions: SessionStore) -> Self {
        Self { provider, sessions }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Verifies the credential and opens a session, returning the user and session token.
    ///
    /// On failure no session is opened.
    pub async fn login(&self, credential: &str) -> Result<(SessionUser, String), AuthFailure> {
        let credential = credential.trim();
        if credential.is_empty() {
            return Err(AuthFailure::MissingCredential);
        }

        match self.provider.login(credential).await {
            Ok(user) => {
                info!(target: TARGET, email = %user.email, "user signed in");
                let token = self.sessions.open(user.clone());
                Ok((user, token))
            }
            Err(err) => {
                warn!(target: TARGET, error = %err, "sign-in failed");
                Err(err)
            }
        }
    }

    pub fn current_user(&self, token: Option<&str>) -> Option<SessionUser> {
        token.and_then(|token| self.sessions.resolve(token))
    }

    pub fn logout(&self, token: &str) -> bool {
        self.sessions.clear(token)
    }
}
