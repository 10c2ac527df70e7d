//! Engine configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `UPGROW_API_BASE_URL` - Panel backend base URL (e.g., `https://api.upgrow.example`)
//!
//! ## Optional
//! - `UPGROW_RECONCILE_INTERVAL_SECS` - Dashboard reconciliation cadence (default: 8)
//! - `UPGROW_MAINTENANCE_INTERVAL_SECS` - Maintenance probe cadence (default: 30)
//! - `UPGROW_REQUEST_TIMEOUT_SECS` - Per-request HTTP timeout (default: 15)
//!
//! Embedders that do not configure through the environment construct a
//! [`PanelConfig`] directly via [`PanelConfig::new`].

use std::time::Duration;

use thiserror::Error;

const DEFAULT_RECONCILE_SECS: u64 = 8;
const DEFAULT_MAINTENANCE_SECS: u64 = 30;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Panel engine configuration.
#[derive(Debug, Clone)]
pub struct PanelConfig {
    /// Backend base URL, without a trailing slash.
    pub api_base_url: String,
    /// How often the dashboard snapshot is reconciled while a session is
    /// active.
    pub reconcile_interval: Duration,
    /// How often the maintenance gate probes the backend.
    pub maintenance_interval: Duration,
    /// Per-request HTTP timeout.
    pub request_timeout: Duration,
}

impl PanelConfig {
    /// Create a configuration with default cadences.
    #[must_use]
    pub fn new(api_base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            reconcile_interval: Duration::from_secs(DEFAULT_RECONCILE_SECS),
            maintenance_interval: Duration::from_secs(DEFAULT_MAINTENANCE_SECS),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or numeric
    /// variables fail to parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Ok(Self {
            api_base_url: get_required_env("UPGROW_API_BASE_URL")?,
            reconcile_interval: get_secs_or_default(
                "UPGROW_RECONCILE_INTERVAL_SECS",
                DEFAULT_RECONCILE_SECS,
            )?,
            maintenance_interval: get_secs_or_default(
                "UPGROW_MAINTENANCE_INTERVAL_SECS",
                DEFAULT_MAINTENANCE_SECS,
            )?,
            request_timeout: get_secs_or_default(
                "UPGROW_REQUEST_TIMEOUT_SECS",
                DEFAULT_REQUEST_TIMEOUT_SECS,
            )?,
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

/// Get a duration in seconds from an environment variable, with a default.
fn get_secs_or_default(key: &str, default: u64) -> Result<Duration, ConfigError> {
    let secs = match std::env::var(key) {
        Ok(raw) => raw
            .parse::<u64>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?,
        Err(_) => default,
    };
    Ok(Duration::from_secs(secs))
}
