//! Console configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `TIENDA_BACKEND_URL` - Base URL of the hosted backend (e.g. `https://abc.example.co`)
//! - `TIENDA_BACKEND_ANON_KEY` - Public API key sent with every backend request
//!
//! ## Optional
//! - `TIENDA_ACCESS_TOKEN` - Session access token obtained from the auth provider;
//!   overrides a token saved with `tienda session login`
//! - `TIENDA_STORAGE_DIR` - Directory for durable local state (default: `.tienda`)
//! - `TIENDA_LOGIN_PATH` - Where the route guard sends anonymous users (default: `/login`)
//! - `TIENDA_FALLBACK_PATH` - Where the route guard sends users without the role (default: `/`)
//! - `TIENDA_PROFILE_CACHE_TTL_SECS` - Profile cache lifetime (default: 60)
//! - `TIENDA_HTTP_TIMEOUT_SECS` - Backend request timeout (default: 15)
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::path::PathBuf;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tienda_core::GuardRedirects;
use url::Url;

/// Values that show up when someone copies `.env.example` without editing it.
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "xxx",
    "todo",
    "insert",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Console application configuration.
#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    /// Hosted backend configuration
    pub backend: BackendConfig,
    /// Externally supplied session token, if any
    pub access_token: Option<SecretString>,
    /// Directory for the durable key-value store
    pub storage_dir: PathBuf,
    /// Route guard destinations
    pub redirects: GuardRedirects,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

/// Hosted backend configuration.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct BackendConfig {
    /// Base URL; auth lives under `/auth/v1`, tables under `/rest/v1`
    pub url: Url,
    /// Public API key
    pub anon_key: SecretString,
    /// Per-request timeout
    pub http_timeout: Duration,
    /// How long a fetched profile is reused before asking the backend again
    pub profile_cache_ttl: Duration,
}

impl std::fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendConfig")
            .field("url", &self.url.as_str())
            .field("anon_key", &"[REDACTED]")
            .field("http_timeout", &self.http_timeout)
            .field("profile_cache_ttl", &self.profile_cache_ttl)
            .finish()
    }
}

impl ConsoleConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid, or
    /// if the API key looks like a placeholder.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let backend = BackendConfig::from_env()?;
        let access_token = get_optional_env("TIENDA_ACCESS_TOKEN").map(SecretString::from);
        let storage_dir = PathBuf::from(get_env_or_default("TIENDA_STORAGE_DIR", ".tienda"));
        let redirects = GuardRedirects {
            login: get_path_env("TIENDA_LOGIN_PATH", "/login")?,
            fallback: get_path_env("TIENDA_FALLBACK_PATH", "/")?,
        };
        let sentry_dsn = get_optional_env("SENTRY_DSN");

        Ok(Self {
            backend,
            access_token,
            storage_dir,
            redirects,
            sentry_dsn,
        })
    }
}

impl BackendConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let raw_url = get_required_env("TIENDA_BACKEND_URL")?;
        let url = Url::parse(&raw_url).map_err(|e| {
            ConfigError::InvalidEnvVar("TIENDA_BACKEND_URL".to_string(), e.to_string())
        })?;
        if url.cannot_be_a_base() {
            return Err(ConfigError::InvalidEnvVar(
                "TIENDA_BACKEND_URL".to_string(),
                "must be an absolute http(s) URL".to_string(),
            ));
        }

        Ok(Self {
            url,
            anon_key: get_validated_secret("TIENDA_BACKEND_ANON_KEY")?,
            http_timeout: get_secs_env("TIENDA_HTTP_TIMEOUT_SECS", 15)?,
            profile_cache_ttl: get_secs_env("TIENDA_PROFILE_CACHE_TTL_SECS", 60)?,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable. Empty values count as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Get a duration in whole seconds.
fn get_secs_env(key: &str, default: u64) -> Result<Duration, ConfigError> {
    get_optional_env(key).map_or(Ok(Duration::from_secs(default)), |raw| {
        raw.parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    })
}

/// Get an app-relative path such as `/login`.
fn get_path_env(key: &str, default: &str) -> Result<String, ConfigError> {
    let value = get_env_or_default(key, default);
    validate_app_path(&value, key)?;
    Ok(value)
}

fn validate_app_path(value: &str, var_name: &str) -> Result<(), ConfigError> {
    if !value.starts_with('/') || value.starts_with("//") {
        return Err(ConfigError::InvalidEnvVar(
            var_name.to_string(),
            format!("must be an app-relative path starting with '/' (got {value:?})"),
        ));
    }
    Ok(())
}

/// Reject values that are obviously not a real key.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    if let Some(pattern) = PLACEHOLDER_PATTERNS.iter().find(|p| lower.contains(*p)) {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!("appears to be a placeholder (contains '{pattern}')"),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    let secret = SecretString::from(value);
    if secret.expose_secret().trim().is_empty() {
        return Err(ConfigError::MissingEnvVar(key.to_string()));
    }
    Ok(secret)
}
