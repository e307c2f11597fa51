use tracing::warn;

use crate::auth::broker::AuthError;

/// Build the OAuth2 redirect URI from the configured application base URL.
///
/// The identity provider requires the redirect URI of the authorization
/// request and the token exchange to match exactly, so both call sites go
/// through here. `http://` base URLs are rewritten to `https://`; any other
/// non-HTTPS scheme is a hard configuration error. Trailing slashes are
/// stripped before `/token` is appended, so the result is stable no matter
/// how the base URL was written.
pub fn redirect_uri(base_url: &str) -> Result<String, AuthError> {
    let trimmed = base_url.trim();

    let secured = if let Some(rest) = trimmed.strip_prefix("http://") {
        warn!("OAuth: forced application URL to HTTPS: https://{rest}");
        format!("https://{rest}")
    } else {
        trimmed.to_string()
    };

    if !secured.starts_with("https://") {
        return Err(AuthError::InvalidBaseUrl(trimmed.to_string()));
    }

    Ok(format!("{}/token", secured.trim_end_matches('/')))
}
