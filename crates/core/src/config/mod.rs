//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (LINKPEEK_*)
//! 2. TOML config file (if LINKPEEK_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// What a batch fetch does when one of its URLs fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum BatchFailurePolicy {
    /// Abort the batch with the first failure.
    Propagate,
    /// Substitute an empty placeholder and keep going.
    #[default]
    Placeholder,
}

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (LINKPEEK_*)
/// 2. TOML config file (if LINKPEEK_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to SQLite preview database.
    ///
    /// Set via LINKPEEK_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Whether to back the in-process cache with the SQLite database.
    ///
    /// Set via LINKPEEK_PERSISTENT_CACHE environment variable.
    #[serde(default = "default_true")]
    pub persistent_cache: bool,

    /// Lifetime of in-process cache entries, in seconds.
    ///
    /// Set via LINKPEEK_CACHE_TTL_SECS environment variable.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Lifetime of persisted previews consulted by the extractor, in seconds.
    ///
    /// Set via LINKPEEK_PERSISTENT_TTL_SECS environment variable.
    #[serde(default = "default_persistent_ttl_secs")]
    pub persistent_ttl_secs: u64,

    /// User-Agent string for HTTP requests.
    ///
    /// Set via LINKPEEK_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// HTTP request timeout in milliseconds.
    ///
    /// Set via LINKPEEK_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Maximum bytes to read per page.
    ///
    /// Set via LINKPEEK_MAX_BYTES environment variable.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// Window size for batch fetches.
    ///
    /// Set via LINKPEEK_BATCH_CONCURRENCY environment variable.
    #[serde(default = "default_batch_concurrency")]
    pub batch_concurrency: usize,

    /// Failure handling for batch fetches.
    ///
    /// Set via LINKPEEK_BATCH_FAILURE_POLICY environment variable.
    #[serde(default)]
    pub batch_failure_policy: BatchFailurePolicy,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./linkpeek-cache.sqlite")
}

fn default_true() -> bool {
    true
}

fn default_cache_ttl_secs() -> u64 {
    15 * 60
}

fn default_persistent_ttl_secs() -> u64 {
    24 * 60 * 60
}

fn default_user_agent() -> String {
    "linkpeek/0.1".into()
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_max_bytes() -> usize {
    2 * 1024 * 1024
}

fn default_batch_concurrency() -> usize {
    3
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            persistent_cache: true,
            cache_ttl_secs: default_cache_ttl_secs(),
            persistent_ttl_secs: default_persistent_ttl_secs(),
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            max_bytes: default_max_bytes(),
            batch_concurrency: default_batch_concurrency(),
            batch_failure_policy: BatchFailurePolicy::default(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// In-process cache TTL.
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Persisted preview TTL.
    pub fn persistent_ttl(&self) -> Duration {
        Duration::from_secs(self.persistent_ttl_secs)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `LINKPEEK_`
    /// 2. TOML file from `LINKPEEK_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("LINKPEEK_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("LINKPEEK_")
                .ignore(&["config_file"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
