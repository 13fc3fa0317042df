//! Session configuration loaded from environment variables.
//!
//! A `.env` file is honored for local development.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Session configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the auth API (e.g. https://inventory.example.com/api)
    pub api_base_url: String,
    /// Directory holding the persisted token record
    pub storage_dir: PathBuf,
    /// Storage key of the persisted token record
    pub storage_key: String,
    /// Refresh this long before the access token expires
    pub refresh_lead: Duration,
    /// Only arm the refresh timer once this little lifetime is left
    pub refresh_guard: Duration,
    /// Role value meaning "signed in but not yet assigned a role"
    pub unassigned_role: String,
    /// Per-request timeout for auth API calls
    pub http_timeout: Duration,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8080/api".to_string(),
            storage_dir: PathBuf::from(".session"),
            storage_key: "auth_tokens".to_string(),
            refresh_lead: Duration::from_secs(30),
            refresh_guard: Duration::from_secs(5 * 60),
            unassigned_role: "Unassigned".to_string(),
            http_timeout: Duration::from_secs(30),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let defaults = Self::default();

        let api_base_url = env::var("API_BASE_URL")
            .map(|v| v.trim().trim_end_matches('/').to_string())
            .map_err(|_| ConfigError::Missing("API_BASE_URL"))?;
        if api_base_url.is_empty() {
            return Err(ConfigError::Missing("API_BASE_URL"));
        }

        let config = Self {
            api_base_url,
            storage_dir: env::var("SESSION_STORAGE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.storage_dir),
            storage_key: env::var("SESSION_STORAGE_KEY").unwrap_or(defaults.storage_key),
            refresh_lead: secs_var("REFRESH_LEAD_SECS")?.unwrap_or(defaults.refresh_lead),
            refresh_guard: secs_var("REFRESH_GUARD_SECS")?.unwrap_or(defaults.refresh_guard),
            unassigned_role: env::var("UNASSIGNED_ROLE").unwrap_or(defaults.unassigned_role),
            http_timeout: secs_var("HTTP_TIMEOUT_SECS")?.unwrap_or(defaults.http_timeout),
        };

        if config.refresh_guard < config.refresh_lead {
            return Err(ConfigError::Invalid {
                name: "REFRESH_GUARD_SECS",
                reason: "must not be shorter than REFRESH_LEAD_SECS".to_string(),
            });
        }

        Ok(config)
    }
}

fn secs_var(name: &'static str) -> Result<Option<Duration>, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .map(|secs| Some(Duration::from_secs(secs)))
            .map_err(|e| ConfigError::Invalid {
                name,
                reason: e.to_string(),
            }),
        Err(_) => Ok(None),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}
