//! OAuth2 credential lifecycle for a browser session.
//!
//! A session starts unauthenticated, is sent to the identity provider via
//! [`authentication_url`], comes back through [`handle_callback`] and, once
//! the code exchange succeeds, holds a refresh token the archiver can use to
//! read Reddit on the user's behalf.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::{error, info, warn};
use url::Url;

use crate::app::App;
use crate::auth::identity::{IdentityProvider as _, AUTHORIZE_ENDPOINT};
use crate::auth::redirect::redirect_uri;
use crate::store::{Datastore as _, StoreError};
use crate::token::SessionCookie;

#[derive(Debug, Error)]
pub enum AuthError {
    /// The configured application base URL uses a scheme that cannot be
    /// upgraded to HTTPS. Configuration error, not a user error.
    #[error("application base URL must use HTTPS: {0}")]
    InvalidBaseUrl(String),
    /// The callback `state` did not match the session cookie.
    #[error("authentication failed: state parameter does not match the session")]
    StateMismatch,
    /// The identity provider rejected the code exchange.
    #[error("the identity provider did not recognize the code given: {0}")]
    ExchangeFailed(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let code = match self {
            Self::StateMismatch | Self::ExchangeFailed(_) => StatusCode::BAD_REQUEST,
            Self::InvalidBaseUrl(_) | Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (code, self.to_string()).into_response()
    }
}

/// Craft the authorization URL the user is sent to.
///
/// The `state` parameter carries the session cookie so the callback can be
/// correlated back to the session that initiated the flow. Scope is fixed to
/// read-only and the grant is requested as permanent, which is what yields a
/// refresh token.
pub fn authentication_url(app: &App, cookie: &SessionCookie) -> Result<String, AuthError> {
    let redirect = redirect_uri(&app.config.app.url)?;

    let url = Url::parse_with_params(
        AUTHORIZE_ENDPOINT,
        &[
            ("client_id", app.config.reddit.client_id.as_str()),
            ("response_type", "code"),
            ("state", cookie.as_str()),
            ("redirect_uri", redirect.as_str()),
            ("duration", "permanent"),
            ("scope", "read"),
        ],
    )
    .expect("authorize endpoint is a valid base URL");

    Ok(url.into())
}

/// Handle the identity provider's callback for a session.
///
/// The `state` check runs before anything else: a mismatch means the code was
/// not issued for this session (or someone is trying to inject one), so the
/// exchange endpoint must never be called. On success the refresh token is
/// persisted and the session is authenticated from then on.
pub async fn handle_callback(
    app: &App,
    cookie: &SessionCookie,
    state: &str,
    code: &str,
) -> Result<(), AuthError> {
    if state != cookie.as_str() {
        warn!("OAuth: state mismatch for session {cookie}, rejecting callback");
        return Err(AuthError::StateMismatch);
    }

    let redirect = redirect_uri(&app.config.app.url)?;
    let refresh_token = match app.identity.exchange_code(code, &redirect).await {
        Ok(token) => token,
        Err(e) => {
            error!("OAuth: code exchange failed for session {cookie}: {e}");
            return Err(e);
        }
    };

    app.store.create_token(cookie, &refresh_token).await?;
    info!("OAuth: refresh token stored for session {cookie}");
    Ok(())
}
