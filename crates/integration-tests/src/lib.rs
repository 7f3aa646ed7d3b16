//! Integration tests for Tienda.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p tienda-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `cart_store` - Cart persistence across restarts on a real directory
//! - `session_flow` - Session resolution, sign-out and saved tokens
//! - `route_guard` - Guard decisions and menus through `AppState`
//! - `team_roles` - Team listing and role edits, including legacy rows
//!
//! The tests run against [`FakeBackend`], an in-memory stand-in for the hosted
//! auth and database API, so no network is needed.

#![allow(clippy::unwrap_used)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use secrecy::SecretString;
use tienda_console::AppState;
use tienda_console::backend::{AuthProvider, BackendError, UserDirectory};
use tienda_console::models::{AuthSession, UserProfile, UserRow};
use tienda_console::storage::FileStore;
use tienda_core::{GuardRedirects, RoleSet, UserId};

/// In-memory auth provider and user table.
///
/// Clones share the same state, so a test can keep a handle while an
/// `AppState` owns another.
#[derive(Clone, Default)]
pub struct FakeBackend {
    inner: Arc<Mutex<FakeInner>>,
}

#[derive(Default)]
struct FakeInner {
    signed_in: Option<UserId>,
    users: HashMap<UserId, UserProfile>,
    offline: bool,
    sign_outs: usize,
}

impl FakeBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, FakeInner> {
        self.inner.lock().unwrap()
    }

    /// Insert a user from a raw users-table row.
    pub fn insert_row(&self, row: serde_json::Value) -> UserId {
        let row: UserRow = serde_json::from_value(row).unwrap();
        let profile = UserProfile::from(row);
        let id = profile.id;
        self.lock().users.insert(id, profile);
        id
    }

    /// Insert a user with a fresh ID and the given roles.
    pub fn insert_user(&self, email: &str, roles: &[&str]) -> UserId {
        self.insert_row(serde_json::json!({
            "id": uuid::Uuid::new_v4(),
            "email": email,
            "roles": roles,
        }))
    }

    pub fn sign_in(&self, id: UserId) {
        self.lock().signed_in = Some(id);
    }

    /// Make every call fail as if the backend were unreachable.
    pub fn set_offline(&self, offline: bool) {
        self.lock().offline = offline;
    }

    #[must_use]
    pub fn sign_outs(&self) -> usize {
        self.lock().sign_outs
    }

    #[must_use]
    pub fn roles_of(&self, id: UserId) -> Option<RoleSet> {
        self.lock().users.get(&id).map(|user| user.roles.clone())
    }

    fn check_online(inner: &FakeInner) -> Result<(), BackendError> {
        if inner.offline {
            return Err(BackendError::Status {
                status: 503,
                body: "offline".to_string(),
            });
        }
        Ok(())
    }
}

impl AuthProvider for FakeBackend {
    async fn current_session(&self) -> Result<Option<AuthSession>, BackendError> {
        let inner = self.lock();
        Self::check_online(&inner)?;
        Ok(inner.signed_in.map(|id| {
            let email = inner.users.get(&id).and_then(|user| user.email.clone());
            AuthSession::new(id, email, SecretString::from("fake-token"))
        }))
    }

    async fn sign_out(&self, _session: &AuthSession) -> Result<(), BackendError> {
        let mut inner = self.lock();
        Self::check_online(&inner)?;
        inner.signed_in = None;
        inner.sign_outs += 1;
        Ok(())
    }
}

impl UserDirectory for FakeBackend {
    async fn fetch_profile(&self, id: UserId) -> Result<UserProfile, BackendError> {
        let inner = self.lock();
        Self::check_online(&inner)?;
        inner
            .users
            .get(&id)
            .cloned()
            .ok_or_else(|| BackendError::NotFound(format!("user {id}")))
    }

    async fn list_users(&self) -> Result<Vec<UserProfile>, BackendError> {
        let inner = self.lock();
        Self::check_online(&inner)?;
        let mut users: Vec<UserProfile> = inner.users.values().cloned().collect();
        users.sort_by(|a, b| a.email.cmp(&b.email));
        Ok(users)
    }

    async fn update_roles(&self, id: UserId, roles: &RoleSet) -> Result<UserProfile, BackendError> {
        let mut inner = self.lock();
        Self::check_online(&inner)?;
        let user = inner
            .users
            .get_mut(&id)
            .ok_or_else(|| BackendError::NotFound(format!("user {id}")))?;
        user.roles = roles.clone();
        Ok(user.clone())
    }
}

/// Storage directory under the system temp dir, removed on drop.
pub struct TempStorageDir(PathBuf);

impl TempStorageDir {
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.0
    }
}

impl Drop for TempStorageDir {
    fn drop(&mut self) {
        // The directory only exists once something was written.
        let _ = std::fs::remove_dir_all(&self.0);
    }
}

/// A fresh storage directory, deleted when the returned guard drops.
#[must_use]
pub fn temp_storage_dir() -> TempStorageDir {
    TempStorageDir(std::env::temp_dir().join(format!("tienda-it-{}", uuid::Uuid::new_v4())))
}

/// State over a handle to `backend` and a file store in `dir`.
#[must_use]
pub fn app_state(backend: &FakeBackend, dir: &Path) -> AppState<FakeBackend, FileStore> {
    AppState::new(
        backend.clone(),
        Arc::new(FileStore::new(dir)),
        GuardRedirects::default(),
    )
}
