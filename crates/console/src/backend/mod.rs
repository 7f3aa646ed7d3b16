//! Hosted backend: authentication and the users table.
//!
//! # Architecture
//!
//! - [`AuthProvider`] answers "who is signed in" and invalidates sessions.
//! - [`UserDirectory`] reads and updates rows of the `users` table.
//! - [`BackendClient`] implements both over HTTP with `reqwest`; profile
//!   lookups are cached in-process with `moka`.
//!
//! Every call is a single attempt. Callers decide whether a failure is shown
//! to the user or only logged.
//!
//! # Example
//!
//! ```rust,ignore
//! use tienda_console::backend::{AuthProvider, BackendClient, UserDirectory};
//!
//! let client = BackendClient::new(&config.backend, config.access_token.clone())?;
//! if let Some(session) = client.current_session().await? {
//!     let profile = client.fetch_profile(session.user_id).await?;
//!     println!("{} has roles {}", profile.display_name(), profile.roles);
//! }
//! ```

mod client;

pub use client::BackendClient;

use std::future::Future;

use thiserror::Error;
use tienda_core::{RoleSet, UserId};

use crate::models::{AuthSession, UserProfile};

/// Errors that can occur when talking to the hosted backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Endpoint URL could not be built.
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Backend answered with a non-success status.
    #[error("backend returned {status}: {body}")]
    Status { status: u16, body: String },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Requested row does not exist (or row-level security hides it).
    #[error("not found: {0}")]
    NotFound(String),

    /// Token missing, expired or rejected.
    #[error("unauthorized")]
    Unauthorized,
}

/// The auth half of the backend.
pub trait AuthProvider {
    /// The current session, or `None` when nobody is signed in.
    ///
    /// An expired or rejected token is reported as `None`, not as an error.
    fn current_session(
        &self,
    ) -> impl Future<Output = Result<Option<AuthSession>, BackendError>> + Send;

    /// Invalidate `session` on the backend.
    fn sign_out(
        &self,
        session: &AuthSession,
    ) -> impl Future<Output = Result<(), BackendError>> + Send;
}

/// The `users` table.
pub trait UserDirectory {
    /// Profile row for one user.
    fn fetch_profile(
        &self,
        id: UserId,
    ) -> impl Future<Output = Result<UserProfile, BackendError>> + Send;

    /// Every profile visible to the current session.
    fn list_users(&self) -> impl Future<Output = Result<Vec<UserProfile>, BackendError>> + Send;

    /// Replace a user's role set and return the updated profile.
    fn update_roles(
        &self,
        id: UserId,
        roles: &RoleSet,
    ) -> impl Future<Output = Result<UserProfile, BackendError>> + Send;
}
