//! Application state shared by every front end.

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use tracing::{info, instrument, warn};

use tienda_core::{GuardDecision, GuardRedirects, NavItem, guard, visible_nav};

use crate::backend::{AuthProvider, BackendClient, UserDirectory};
use crate::config::ConsoleConfig;
use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::models::{StoredToken, storage_keys};
use crate::navigation::{ADMIN_NAV, route_requirements};
use crate::storage::{FileStore, KeyValueStore};
use crate::stores::{CartStore, SessionStore};
use crate::team::TeamService;

/// Application state: the cart and session stores plus the backend.
///
/// There is exactly one per process. Mutating operations take `&mut self`.
pub struct AppState<B = BackendClient, S = FileStore> {
    backend: B,
    storage: Arc<S>,
    cart: CartStore<Arc<S>>,
    session: SessionStore,
    redirects: GuardRedirects,
}

impl AppState {
    /// Build the state from configuration.
    ///
    /// The session token comes from the configuration if set, otherwise from
    /// a token saved by an earlier sign-in.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_config(config: &ConsoleConfig) -> Result<Self> {
        let storage = Arc::new(FileStore::new(&config.storage_dir));
        let token = config
            .access_token
            .clone()
            .or_else(|| stored_access_token(storage.as_ref()));
        let backend = BackendClient::new(&config.backend, token)?;
        Ok(Self::new(backend, storage, config.redirects.clone()))
    }
}

impl<B, S> AppState<B, S>
where
    B: AuthProvider + UserDirectory + Sync,
    S: KeyValueStore,
{
    /// Wire up the state. The cart is rehydrated from `storage`; the session
    /// starts loading until [`Self::resolve_session`] runs.
    pub fn new(backend: B, storage: Arc<S>, redirects: GuardRedirects) -> Self {
        let cart = CartStore::load(Arc::clone(&storage));
        Self {
            backend,
            storage,
            cart,
            session: SessionStore::new(),
            redirects,
        }
    }

    #[must_use]
    pub const fn cart(&self) -> &CartStore<Arc<S>> {
        &self.cart
    }

    pub const fn cart_mut(&mut self) -> &mut CartStore<Arc<S>> {
        &mut self.cart
    }

    #[must_use]
    pub const fn session(&self) -> &SessionStore {
        &self.session
    }

    #[must_use]
    pub const fn backend(&self) -> &B {
        &self.backend
    }

    #[must_use]
    pub const fn redirects(&self) -> &GuardRedirects {
        &self.redirects
    }

    /// Resolve the signed-in user and tag Sentry events with them.
    pub async fn resolve_session(&mut self) {
        self.session.resolve(&self.backend, &self.backend).await;
        match self.session.user() {
            Some(user) => set_sentry_user(&user.id, user.email.as_deref()),
            None => clear_sentry_user(),
        }
    }

    /// Sign out locally and remotely, and forget the saved token.
    ///
    /// # Errors
    ///
    /// Returns the first failure: the remote sign-out, then removing the
    /// saved token. Local state is cleared regardless.
    #[instrument(skip(self))]
    pub async fn sign_out(&mut self) -> Result<()> {
        let remote = self.session.sign_out(&self.backend).await;
        clear_sentry_user();
        let forget = self
            .storage
            .remove(storage_keys::AUTH_SESSION)
            .inspect_err(|e| warn!("Failed to remove saved token: {e}"));
        remote?;
        forget?;
        Ok(())
    }

    /// Save a session token for the next start.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` for a blank token, or a storage error.
    pub fn save_access_token(&self, token: &SecretString) -> Result<()> {
        let access_token = token.expose_secret().trim();
        if access_token.is_empty() {
            return Err(AppError::BadRequest("access token is empty".to_string()));
        }
        let raw = serde_json::to_string(&StoredToken {
            access_token: access_token.to_string(),
        })
        .map_err(|e| AppError::Internal(e.to_string()))?;
        self.storage.set(storage_keys::AUTH_SESSION, &raw)?;
        info!("Access token saved");
        Ok(())
    }

    /// Decide whether the current session may open `path`.
    ///
    /// Paths outside the admin area are always allowed.
    #[must_use]
    pub fn guard_route(&self, path: &str) -> GuardDecision<'_> {
        match route_requirements(path) {
            Some(required) => guard(
                &self.session.access_context(),
                Some(&required),
                &self.redirects,
            ),
            None => GuardDecision::Allow,
        }
    }

    /// Admin menu entries the current user may see.
    #[must_use]
    pub fn navigation(&self) -> Vec<&'static NavItem> {
        match self.session.user() {
            Some(user) => visible_nav(ADMIN_NAV, &user.roles),
            None => vec![],
        }
    }

    /// Team management bound to this state's backend.
    #[must_use]
    pub const fn team(&self) -> TeamService<'_, B> {
        TeamService::new(&self.backend)
    }
}

fn stored_access_token(storage: &impl KeyValueStore) -> Option<SecretString> {
    let raw = storage
        .get(storage_keys::AUTH_SESSION)
        .inspect_err(|e| warn!("Failed to read saved token: {e}"))
        .ok()??;
    match serde_json::from_str::<StoredToken>(&raw) {
        Ok(stored) => Some(SecretString::from(stored.access_token)),
        Err(e) => {
            warn!("Ignoring unreadable saved token: {e}");
            None
        }
    }
}
