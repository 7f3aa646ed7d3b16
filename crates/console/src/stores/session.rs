//! Session store: who is signed in and with which roles.
//!
//! The store starts in the loading state. [`SessionStore::resolve`] asks the
//! auth provider for the current session and loads the matching profile;
//! until it finishes, consumers must not make access decisions.

use tracing::{info, instrument, warn};

use tienda_core::AccessContext;

use crate::backend::{AuthProvider, BackendError, UserDirectory};
use crate::models::{AuthSession, UserProfile};

/// Current identity and its roles.
#[derive(Debug, Clone)]
pub struct SessionStore {
    session: Option<AuthSession>,
    user: Option<UserProfile>,
    loading: bool,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self {
            session: None,
            user: None,
            loading: true,
        }
    }
}

impl SessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_session(&mut self, session: Option<AuthSession>) {
        self.session = session;
    }

    pub fn set_user(&mut self, user: Option<UserProfile>) {
        self.user = user;
    }

    pub const fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    #[must_use]
    pub const fn session(&self) -> Option<&AuthSession> {
        self.session.as_ref()
    }

    #[must_use]
    pub const fn user(&self) -> Option<&UserProfile> {
        self.user.as_ref()
    }

    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.loading
    }

    /// Logged in means both a session and a profile are present.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.session.is_some() && self.user.is_some()
    }

    /// The inputs the route guard needs.
    #[must_use]
    pub fn access_context(&self) -> AccessContext {
        AccessContext {
            loading: self.loading,
            has_session: self.session.is_some(),
            roles: self.user.as_ref().map(|user| user.roles.clone()),
        }
    }

    /// Resolve the current identity from the backend.
    ///
    /// Backend failures are logged and leave the store signed out; they are
    /// not returned, because an unresolved identity is simply "nobody".
    #[instrument(skip_all)]
    pub async fn resolve<A, D>(&mut self, auth: &A, directory: &D)
    where
        A: AuthProvider + Sync,
        D: UserDirectory + Sync,
    {
        self.loading = true;

        let resolved = match auth.current_session().await {
            Ok(Some(session)) => match directory.fetch_profile(session.user_id).await {
                Ok(profile) => Some((session, profile)),
                Err(e) => {
                    warn!(user_id = %session.user_id, "Failed to load profile: {e}");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!("Failed to resolve session: {e}");
                None
            }
        };

        match resolved {
            Some((session, profile)) => {
                info!(user_id = %session.user_id, roles = %profile.roles, "Session resolved");
                self.session = Some(session);
                self.user = Some(profile);
            }
            None => {
                self.session = None;
                self.user = None;
            }
        }
        self.loading = false;
    }

    /// Sign out.
    ///
    /// Local state is cleared before the backend is asked to invalidate the
    /// session, so the store is signed out even if that request fails. The
    /// backend result is returned for the caller to report or ignore.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` if the backend could not invalidate the session.
    #[instrument(skip_all)]
    pub async fn sign_out<A>(&mut self, auth: &A) -> Result<(), BackendError>
    where
        A: AuthProvider + Sync,
    {
        let session = self.session.take();
        self.user = None;

        let Some(session) = session else {
            return Ok(());
        };

        auth.sign_out(&session)
            .await
            .inspect(|_| info!(user_id = %session.user_id, "Signed out"))
            .inspect_err(|e| warn!(user_id = %session.user_id, "Remote sign-out failed: {e}"))
    }
}
