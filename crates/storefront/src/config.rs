//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `PANTRY_API_BASE_URL` - REST service root (default: `http://localhost:3000/api`).
//!   A trailing slash is stripped and `/api` appended when missing.
//! - `PANTRY_SESSION_FILE` - Where the login session is persisted
//!   (default: `<config dir>/pantry/session.json`)
//! - `PANTRY_HTTP_TIMEOUT_SECS` - Per-request timeout (default: 30)
//! - `PANTRY_CATALOG_CACHE_TTL_SECS` - Product cache lifetime (default: 300)
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_API_BASE_URL: &str = "http://localhost:3000/api";
const DEFAULT_TIMEOUT_SECS: &str = "30";
const DEFAULT_CACHE_TTL_SECS: &str = "300";
const API_SUFFIX: &str = "/api";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Could not determine a default session file location; set PANTRY_SESSION_FILE")]
    NoSessionDir,
}

/// Client configuration.
#[derive(Debug, Clone)]
pub struct PantryConfig {
    /// REST service root, always ending in `/api`
    pub api_base_url: Url,
    /// File holding the persisted auth session
    pub session_file: PathBuf,
    /// Timeout applied to every request
    pub request_timeout: Duration,
    /// Lifetime of cached catalog responses
    pub catalog_cache_ttl: Duration,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

impl PantryConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but invalid, or if no
    /// session file location can be determined.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api_base_url = normalize_api_base_url(&get_env_or_default(
            "PANTRY_API_BASE_URL",
            DEFAULT_API_BASE_URL,
        ))
        .map_err(|e| ConfigError::InvalidEnvVar("PANTRY_API_BASE_URL".to_string(), e))?;

        let session_file = match get_optional_env("PANTRY_SESSION_FILE") {
            Some(path) => PathBuf::from(path),
            None => default_session_file().ok_or(ConfigError::NoSessionDir)?,
        };

        let request_timeout = get_secs("PANTRY_HTTP_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?;
        let catalog_cache_ttl = get_secs("PANTRY_CATALOG_CACHE_TTL_SECS", DEFAULT_CACHE_TTL_SECS)?;
        let sentry_dsn = get_optional_env("SENTRY_DSN");

        Ok(Self {
            api_base_url,
            session_file,
            request_timeout,
            catalog_cache_ttl,
            sentry_dsn,
        })
    }

    /// Configuration pointing at `api_base_url`, with defaults elsewhere.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the URL is not a usable http(s) URL.
    pub fn for_base_url(api_base_url: &str, session_file: PathBuf) -> Result<Self, ConfigError> {
        let api_base_url = normalize_api_base_url(api_base_url)
            .map_err(|e| ConfigError::InvalidEnvVar("api_base_url".to_string(), e))?;
        Ok(Self {
            api_base_url,
            session_file,
            request_timeout: Duration::from_secs(30),
            catalog_cache_ttl: Duration::from_secs(300),
            sentry_dsn: None,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Strip a trailing slash, ensure the `/api` suffix, and check the scheme.
fn normalize_api_base_url(raw: &str) -> Result<Url, String> {
    let trimmed = raw.trim().trim_end_matches('/');
    let with_suffix = if trimmed.ends_with(API_SUFFIX) {
        trimmed.to_string()
    } else {
        format!("{trimmed}{API_SUFFIX}")
    };

    let url = Url::parse(&with_suffix).map_err(|e| e.to_string())?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!("unsupported scheme '{}'", url.scheme()));
    }
    if url.host_str().is_none() {
        return Err("URL must have a host".to_string());
    }
    Ok(url)
}

/// `<config dir>/pantry/session.json`
fn default_session_file() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("pantry").join("session.json"))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Parse a whole number of seconds.
fn get_secs(key: &str, default: &str) -> Result<Duration, ConfigError> {
    get_env_or_default(key, default)
        .trim()
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}
