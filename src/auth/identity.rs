//! Identity-provider contract and the Reddit implementation.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::auth::broker::AuthError;
use crate::config::Config;

/// Reddit's OAuth2 authorization endpoint.
pub const AUTHORIZE_ENDPOINT: &str = "https://www.reddit.com/api/v1/authorize";
/// Reddit's OAuth2 token endpoint.
const TOKEN_ENDPOINT: &str = "https://www.reddit.com/api/v1/access_token";

/// The identity provider side of the OAuth2 authorization-code flow.
///
/// Only the code exchange goes over the wire; crafting the authorization URL
/// is pure string work and lives in the broker. A trait seam here keeps the
/// network out of the tests and lets them assert the exchange is never
/// reached on a state mismatch.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Exchange an authorization code for a long-lived refresh token.
    ///
    /// `redirect_uri` must be byte-identical to the one used in the
    /// authorization request. Provider rejections map to
    /// [`AuthError::ExchangeFailed`] and are never retried here; the user
    /// restarts the flow instead.
    async fn exchange_code(&self, code: &str, redirect_uri: &str) -> Result<String, AuthError>;
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    refresh_token: Option<String>,
}

/// Production provider talking to Reddit's token endpoint.
pub struct RedditIdentityProvider {
    http: reqwest::Client,
    client_id: String,
    client_secret: String,
}

impl RedditIdentityProvider {
    /// Build a provider from the application configuration.
    pub fn new(config: &Config) -> Result<Self, AuthError> {
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent())
            .build()
            .map_err(|e| AuthError::ExchangeFailed(format!("could not build HTTP client: {e}")))?;

        Ok(Self {
            http,
            client_id: config.reddit.client_id.clone(),
            client_secret: config.reddit.client_secret.clone(),
        })
    }
}

#[async_trait]
impl IdentityProvider for RedditIdentityProvider {
    async fn exchange_code(&self, code: &str, redirect_uri: &str) -> Result<String, AuthError> {
        debug!("OAuth: exchanging authorization code at {TOKEN_ENDPOINT}");

        let response = self
            .http
            .post(TOKEN_ENDPOINT)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", redirect_uri),
            ])
            .send()
            .await
            .map_err(|e| AuthError::ExchangeFailed(e.to_string()))?
            .error_for_status()
            .map_err(|e| AuthError::ExchangeFailed(e.to_string()))?;

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| AuthError::ExchangeFailed(e.to_string()))?;

        body.refresh_token.ok_or_else(|| {
            AuthError::ExchangeFailed("token response carried no refresh token".to_string())
        })
    }
}
