//! HTTP implementation of the backend traits.

use std::sync::Arc;

use moka::future::Cache;
use reqwest::{Method, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use tienda_core::{RoleSet, UserId};

use super::{AuthProvider, BackendError, UserDirectory};
use crate::config::BackendConfig;
use crate::models::session::token_expiry;
use crate::models::{AuthSession, UserProfile, UserRow};

/// Columns requested from the `users` table.
const USER_COLUMNS: &str = "id,email,full_name,roles";

/// User object returned by `GET /auth/v1/user`.
#[derive(Debug, Deserialize)]
struct AuthUser {
    id: UserId,
    #[serde(default)]
    email: Option<String>,
}

// =============================================================================
// BackendClient
// =============================================================================

/// Client for the hosted auth and database API.
///
/// Cheap to clone; clones share the HTTP connection pool and profile cache.
#[derive(Clone)]
pub struct BackendClient {
    inner: Arc<BackendClientInner>,
}

struct BackendClientInner {
    client: reqwest::Client,
    base: Url,
    anon_key: SecretString,
    access_token: Option<SecretString>,
    profiles: Cache<UserId, UserProfile>,
}

impl BackendClient {
    /// Create a client. `access_token` is the externally obtained session token, if any.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Http` if the HTTP client cannot be built.
    pub fn new(
        config: &BackendConfig,
        access_token: Option<SecretString>,
    ) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()?;

        let profiles = Cache::builder()
            .max_capacity(500)
            .time_to_live(config.profile_cache_ttl)
            .build();

        // Url::join drops the last segment unless the base ends with '/'
        let mut base = config.url.clone();
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        Ok(Self {
            inner: Arc::new(BackendClientInner {
                client,
                base,
                anon_key: config.anon_key.clone(),
                access_token,
                profiles,
            }),
        })
    }

    fn endpoint(&self, path: &str, query: &[(&str, &str)]) -> Result<Url, BackendError> {
        let mut url = self.inner.base.join(path)?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    /// Start a request carrying the API key and a bearer token.
    ///
    /// Table requests use the session token when there is one so row-level
    /// security applies to the signed-in user; otherwise the anon key.
    fn request(&self, method: Method, url: Url, bearer: Option<&SecretString>) -> RequestBuilder {
        let token = bearer
            .or(self.inner.access_token.as_ref())
            .unwrap_or(&self.inner.anon_key);
        self.inner
            .client
            .request(method, url)
            .header("apikey", self.inner.anon_key.expose_secret())
            .bearer_auth(token.expose_secret())
    }

    /// Send a request and return the body, mapping error statuses.
    async fn send(&self, request: RequestBuilder) -> Result<String, BackendError> {
        let response = request.send().await?;
        let status = response.status();

        // Get response body as text first for better error diagnostics
        let body = response.text().await?;

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(BackendError::Unauthorized);
        }
        if !status.is_success() {
            return Err(BackendError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, BackendError> {
        let body = self.send(request).await?;
        Ok(serde_json::from_str(&body)?)
    }

    fn user_filter(id: UserId) -> String {
        format!("eq.{id}")
    }
}

impl AuthProvider for BackendClient {
    #[instrument(skip(self))]
    async fn current_session(&self) -> Result<Option<AuthSession>, BackendError> {
        let Some(token) = self.inner.access_token.as_ref() else {
            debug!("No access token configured");
            return Ok(None);
        };

        if let Some(expires_at) = token_expiry(token.expose_secret())
            && expires_at <= chrono::Utc::now()
        {
            debug!(%expires_at, "Access token expired");
            return Ok(None);
        }

        let url = self.endpoint("auth/v1/user", &[])?;
        match self
            .send_json::<AuthUser>(self.request(Method::GET, url, Some(token)))
            .await
        {
            Ok(user) => Ok(Some(AuthSession::new(user.id, user.email, token.clone()))),
            Err(BackendError::Unauthorized) => {
                debug!("Access token rejected by backend");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    #[instrument(skip(self, session), fields(user_id = %session.user_id))]
    async fn sign_out(&self, session: &AuthSession) -> Result<(), BackendError> {
        let url = self.endpoint("auth/v1/logout", &[])?;
        match self
            .send(self.request(Method::POST, url, Some(&session.access_token)))
            .await
        {
            // Already invalid on the backend
            Ok(_) | Err(BackendError::Unauthorized) => {
                self.inner.profiles.invalidate(&session.user_id).await;
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

impl UserDirectory for BackendClient {
    #[instrument(skip(self))]
    async fn fetch_profile(&self, id: UserId) -> Result<UserProfile, BackendError> {
        if let Some(profile) = self.inner.profiles.get(&id).await {
            debug!("Profile cache hit");
            return Ok(profile);
        }

        let filter = Self::user_filter(id);
        let url = self.endpoint(
            "rest/v1/users",
            &[("id", filter.as_str()), ("select", USER_COLUMNS)],
        )?;
        let rows: Vec<UserRow> = self
            .send_json(self.request(Method::GET, url, None))
            .await?;

        let profile: UserProfile = rows
            .into_iter()
            .next()
            .ok_or_else(|| BackendError::NotFound(format!("user {id}")))?
            .into();

        self.inner.profiles.insert(id, profile.clone()).await;
        Ok(profile)
    }

    #[instrument(skip(self))]
    async fn list_users(&self) -> Result<Vec<UserProfile>, BackendError> {
        let url = self.endpoint(
            "rest/v1/users",
            &[("select", USER_COLUMNS), ("order", "email.asc")],
        )?;
        let rows: Vec<UserRow> = self
            .send_json(self.request(Method::GET, url, None))
            .await?;

        debug!(count = rows.len(), "Fetched users");
        Ok(rows.into_iter().map(UserProfile::from).collect())
    }

    #[instrument(skip(self, roles), fields(roles = %roles))]
    async fn update_roles(&self, id: UserId, roles: &RoleSet) -> Result<UserProfile, BackendError> {
        let filter = Self::user_filter(id);
        let url = self.endpoint(
            "rest/v1/users",
            &[("id", filter.as_str()), ("select", USER_COLUMNS)],
        )?;
        let request = self
            .request(Method::PATCH, url, None)
            .header("Prefer", "return=representation")
            .json(&serde_json::json!({ "roles": roles }));

        let rows: Vec<UserRow> = self.send_json(request).await?;
        self.inner.profiles.invalidate(&id).await;

        let profile: UserProfile = rows
            .into_iter()
            .next()
            .ok_or_else(|| BackendError::NotFound(format!("user {id}")))?
            .into();

        self.inner.profiles.insert(id, profile.clone()).await;
        Ok(profile)
    }
}
