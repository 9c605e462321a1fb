//! Owner credentials for owner-gated endpoints.
//!
//! Owner-gated requests must carry `Authorization: Bearer <key>` with the
//! key configured through `OWNER_API_KEY`. The `caller` field in the body
//! is still checked against the ledger owner afterwards.

use std::fmt;
use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use crate::app_state::AppState;
use crate::error::EscrowError;

/// Shortest accepted owner key, in bytes.
pub const MIN_OWNER_KEY_LEN: usize = 16;

/// Shared secret held by the ledger owner.
///
/// Never printed: [`fmt::Debug`] redacts the value.
#[derive(Clone)]
pub struct OwnerKey(Arc<str>);

impl OwnerKey {
    /// Wraps a key.
    ///
    /// # Errors
    ///
    /// Returns [`EscrowError::InvalidRequest`] if the key is shorter than
    /// [`MIN_OWNER_KEY_LEN`] bytes.
    pub fn new(key: &str) -> Result<Self, EscrowError> {
        let key = key.trim();
        if key.len() < MIN_OWNER_KEY_LEN {
            return Err(EscrowError::InvalidRequest(format!(
                "owner key must be at least {MIN_OWNER_KEY_LEN} bytes"
            )));
        }
        Ok(Self(Arc::from(key)))
    }

    /// Compares `candidate` with the key in time independent of where they
    /// differ.
    #[must_use]
    pub fn matches(&self, candidate: &str) -> bool {
        let expected = self.0.as_bytes();
        let given = candidate.as_bytes();
        if expected.len() != given.len() {
            return false;
        }
        expected
            .iter()
            .zip(given)
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
    }
}

impl fmt::Debug for OwnerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("OwnerKey(<redacted>)")
    }
}

/// Extractor that admits only requests bearing the owner key.
#[derive(Debug, Clone, Copy)]
pub struct OwnerAuth;

impl FromRequestParts<AppState> for OwnerAuth {
    type Rejection = EscrowError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "));

        match token {
            Some(token) if state.owner_key.matches(token.trim()) => Ok(Self),
            Some(_) => {
                tracing::warn!(path = %parts.uri.path(), "owner key mismatch");
                Err(EscrowError::Unauthorized)
            }
            None => {
                tracing::warn!(path = %parts.uri.path(), "owner-gated call without credentials");
                Err(EscrowError::Unauthorized)
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    const KEY: &str = "owner-secret-0123456789";

    fn key() -> OwnerKey {
        let Ok(key) = OwnerKey::new(KEY) else {
            panic!("valid key");
        };
        key
    }

    #[test]
    fn short_keys_are_rejected() {
        assert!(OwnerKey::new("").is_err());
        assert!(OwnerKey::new("too-short").is_err());
        assert!(OwnerKey::new(&"k".repeat(MIN_OWNER_KEY_LEN)).is_ok());
    }

    #[test]
    fn matches_only_the_exact_key() {
        let key = key();
        assert!(key.matches(KEY));
        assert!(!key.matches("owner-secret-0123456780"));
        assert!(!key.matches("owner-secret-012345678"));
        assert!(!key.matches(""));
    }

    #[test]
    fn debug_never_shows_the_key() {
        let rendered = format!("{:?}", key());
        assert!(!rendered.contains(KEY));
    }
}
