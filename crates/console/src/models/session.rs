//! Session-related types.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use tienda_core::UserId;

/// An authenticated session issued by the auth provider.
///
/// `Debug` output never includes the token (`SecretString` redacts itself).
#[derive(Debug, Clone)]
pub struct AuthSession {
    /// Auth user the session belongs to.
    pub user_id: UserId,
    /// Email registered with the auth provider.
    pub email: Option<String>,
    /// Bearer token for backend requests.
    pub access_token: SecretString,
    /// Expiry read from the token's `exp` claim, when present.
    pub expires_at: Option<DateTime<Utc>>,
}

impl AuthSession {
    /// Build a session, reading the expiry out of the token.
    #[must_use]
    pub fn new(user_id: UserId, email: Option<String>, access_token: SecretString) -> Self {
        let expires_at = token_expiry(access_token.expose_secret());
        Self {
            user_id,
            email,
            access_token,
            expires_at,
        }
    }
}

/// Read the `exp` claim from a JWT without verifying it.
///
/// The backend verifies tokens; this is only used to skip a request for a
/// token that is already known to be stale.
#[must_use]
pub fn token_expiry(token: &str) -> Option<DateTime<Utc>> {
    #[derive(Deserialize)]
    struct Claims {
        exp: Option<i64>,
    }

    let payload = token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .ok()?;
    let claims: Claims = serde_json::from_slice(&bytes).ok()?;
    DateTime::from_timestamp(claims.exp?, 0)
}

/// Persisted form of an externally supplied access token.
#[derive(Debug, Serialize, Deserialize)]
pub struct StoredToken {
    pub access_token: String,
}

/// Keys used in the local key-value store.
pub mod storage_keys {
    /// Key for the persisted cart snapshot.
    pub const CART: &str = "cart-storage";

    /// Key for the saved access token.
    pub const AUTH_SESSION: &str = "auth-session";
}
