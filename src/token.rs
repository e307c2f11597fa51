use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::Rng;
use std::fmt::{self, Display, Formatter};

/// Opaque browser-session identifier.
///
/// The HTTP layer issues one of these per browser (as a cookie value) and the
/// same value doubles as the OAuth2 `state` parameter, which is how the
/// authorization callback is correlated back to the session that started it.
/// Keeping it as an explicit type means none of the orchestration code needs
/// to know anything about cookies or the HTTP framework.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SessionCookie(String);

impl SessionCookie {
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Generate a fresh session identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(generate_secure_token(32))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for SessionCookie {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Generate a public job identifier: 128 bits of entropy, URL-safe base64.
///
/// Job ids are handed straight back to the caller for status polling, so they
/// must be unguessable and safe to embed in a URL path. Collisions are treated
/// as negligible-probability; the store is deliberately not consulted.
#[must_use]
pub fn generate_job_id() -> String {
    let bytes: [u8; 16] = rand::thread_rng().gen();
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Generate a cryptographically secure random token.
///
/// Creates a random alphanumeric string of the specified length suitable for
/// use as session cookies or other security-sensitive identifiers.
#[must_use]
pub fn generate_secure_token(length: usize) -> String {
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| {
            let idx = rng.gen_range(0..62);
            CHARSET[idx] as char
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_secure_token_length() {
        let token = generate_secure_token(64);
        assert_eq!(token.len(), 64);
    }

    #[test]
    fn test_generate_secure_token_alphanumeric() {
        let token = generate_secure_token(64);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_generate_secure_token_randomness() {
        let token1 = generate_secure_token(64);
        let token2 = generate_secure_token(64);
        assert_ne!(token1, token2);
    }

    #[test]
    fn test_job_id_is_url_safe() {
        let id = generate_job_id();
        assert!(id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn test_job_id_carries_128_bits() {
        // 16 bytes in unpadded base64 is always 22 characters
        assert_eq!(generate_job_id().len(), 22);
    }

    #[test]
    fn test_job_ids_are_unique() {
        let ids: std::collections::HashSet<String> = (0..100).map(|_| generate_job_id()).collect();
        assert_eq!(ids.len(), 100);
    }
}
