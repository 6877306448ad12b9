//! Application settings for `FundLedger`.
//!
//! Settings come from an optional `config.toml` next to the binary, with the
//! database URL overridable through the `DATABASE_URL` environment variable
//! (loaded via `dotenvy` in `main`). Cache sizing and migration pacing are
//! configured here so tests and deployments can tune them without code
//! changes.

use crate::errors::Result;
use serde::Deserialize;
use std::path::Path;
use tracing::info;

/// Cache sizing configuration for the relationship cache.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheSettings {
    /// Maximum combined entry count across both cache tables
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
    /// Time-to-live for cache entries, in seconds
    #[serde(default = "default_ttl_seconds")]
    pub ttl_seconds: u64,
}

fn default_max_entries() -> usize {
    200
}

fn default_ttl_seconds() -> u64 {
    300
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            max_entries: default_max_entries(),
            ttl_seconds: default_ttl_seconds(),
        }
    }
}

/// Migration pacing configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MigrationSettings {
    /// Number of expense rows examined per backfill batch
    #[serde(default = "default_batch_size")]
    pub batch_size: u64,
}

fn default_batch_size() -> u64 {
    500
}

impl Default for MigrationSettings {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
        }
    }
}

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Database URL; `DATABASE_URL` in the environment wins over this
    pub database_url: Option<String>,
    /// Relationship cache sizing
    #[serde(default)]
    pub cache: CacheSettings,
    /// Backfill pacing
    #[serde(default)]
    pub migration: MigrationSettings,
}

impl AppConfig {
    /// The database URL to connect to, preferring the environment.
    pub fn database_url(&self) -> String {
        self.resolve_database_url(std::env::var("DATABASE_URL").ok())
    }

    /// Precedence: `DATABASE_URL` from the environment, then the configured
    /// URL, then a local `SQLite` file.
    fn resolve_database_url(&self, env_override: Option<String>) -> String {
        env_override.unwrap_or_else(|| {
            self.database_url
                .clone()
                .unwrap_or_else(|| "sqlite://data/fund_ledger.sqlite".to_string())
        })
    }
}

/// Loads the application configuration from `config.toml` if present,
/// falling back to defaults otherwise.
pub fn load_app_configuration() -> Result<AppConfig> {
    load_from_path(Path::new("config.toml"))
}

fn load_from_path(path: &Path) -> Result<AppConfig> {
    if path.exists() {
        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    } else {
        info!(
            "No configuration file at {}, using defaults",
            path.display()
        );
        Ok(AppConfig::default())
    }
}
