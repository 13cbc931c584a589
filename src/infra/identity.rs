//! Google sign-in adapter.
//!
//! The login page runs Google's sign-in popup in the browser and posts the
//! resulting ID token here. The token is checked against Google's `tokeninfo`
//! endpoint; on success the profile becomes the session user.

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use tracing::debug;

use crate::{
    application::identity::{AuthFailure, IdentityProvider},
    config::IdentitySettings,
    domain::entities::SessionUser,
    infra::error::InfraError,
};

const TARGET: &str = "gazette::identity::google";
const NOT_CONFIGURED: &str = "sign-in is not configured";

#[derive(Debug, Deserialize)]
struct TokenInfo {
    aud: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    picture: Option<String>,
}

#[derive(Clone, Debug)]
pub struct GoogleIdentityProvider {
    client: Client,
    tokeninfo_url: Url,
    client_id: Option<String>,
}

impl GoogleIdentityProvider {
    pub fn new(settings: &IdentitySettings) -> Result<Self, InfraError> {
        let client = Client::builder()
            .user_agent(concat!("gazette/", env!("CARGO_PKG_VERSION")))
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| InfraError::identity(err.to_string()))?;
        Ok(Self {
            client,
            tokeninfo_url: settings.tokeninfo_url.clone(),
            client_id: settings.google_client_id.clone(),
        })
    }

    fn profile(&self, info: TokenInfo) -> Result<SessionUser, AuthFailure> {
        let Some(expected) = self.client_id.as_deref() else {
            return Err(AuthFailure::Provider(NOT_CONFIGURED.to_string()));
        };
        if info.aud != expected {
            return Err(AuthFailure::Rejected(format!(
                "token issued for audience `{}`",
                info.aud
            )));
        }
        if info.email.is_empty() {
            return Err(AuthFailure::Rejected("token carries no email".to_string()));
        }

        Ok(SessionUser {
            name: info.name.unwrap_or_else(|| info.email.clone()),
            email: info.email,
            photo: info.picture.unwrap_or_default(),
        })
    }
}

#[async_trait]
impl IdentityProvider for GoogleIdentityProvider {
    async fn login(&self, credential: &str) -> Result<SessionUser, AuthFailure> {
        if self.client_id.is_none() {
            return Err(AuthFailure::Provider(NOT_CONFIGURED.to_string()));
        }

        let mut url = self.tokeninfo_url.clone();
        url.query_pairs_mut().append_pair("id_token", credential);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| AuthFailure::Provider(err.to_string()))?;

        let status = response.status();
        if status == StatusCode::BAD_REQUEST || status == StatusCode::UNAUTHORIZED {
            return Err(AuthFailure::Rejected("token is invalid or expired".to_string()));
        }
        if !status.is_success() {
            return Err(AuthFailure::Provider(format!("tokeninfo returned {status}")));
        }

        let info: TokenInfo = response
            .json()
            .await
            .map_err(|err| AuthFailure::Provider(err.to_string()))?;
        debug!(target: TARGET, aud = %info.aud, "token verified");
        self.profile(info)
    }
}
