//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type for everything the console surfaces to
//! a front end. Call [`AppError::report`] before showing an error to the user
//! so unexpected failures reach Sentry.

use thiserror::Error;

use crate::backend::BackendError;
use crate::config::ConfigError;
use crate::storage::StorageError;
use crate::team::TeamError;

/// Application-level error type for the console.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Local persistence failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Backend operation failed.
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    /// Team management operation failed.
    #[error("Team error: {0}")]
    Team(#[from] TeamError),

    /// User is not signed in.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Bad input from the user.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Whether this error is unexpected and worth a Sentry event.
    #[must_use]
    pub const fn is_reportable(&self) -> bool {
        match self {
            Self::Storage(_) | Self::Internal(_) => true,
            Self::Backend(err) | Self::Team(TeamError::Backend(err)) => {
                !matches!(err, BackendError::Unauthorized)
            }
            _ => false,
        }
    }

    /// Capture the error to Sentry if it is reportable, and log it.
    pub fn report(&self) {
        if self.is_reportable() {
            let event_id = sentry::capture_error(self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Console error"
            );
        } else {
            tracing::debug!(error = %self, "Console error");
        }
    }

    /// Message safe to show to the user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Backend(BackendError::Unauthorized) => {
                "Session expired, please sign in again".to_string()
            }
            Self::Backend(_) | Self::Team(TeamError::Backend(_)) => {
                "The backend is unavailable, please try again".to_string()
            }
            Self::Storage(_) => "Could not save local data".to_string(),
            Self::Team(err) => err.to_string(),
            _ => self.to_string(),
        }
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after a session resolves to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on sign-out to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added item", Some(&[("product_id", "123")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
