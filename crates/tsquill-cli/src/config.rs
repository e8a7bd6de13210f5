//! Configuration for the tsquill CLI.
//!
//! Provides the [`TsquillConfig`] struct that loads from TOML files,
//! environment variables, and defaults using the `confyg` crate.
//!
//! # Loading Priority
//!
//! 1. Explicit `--config <path>` flag
//! 2. `TSQUILL_CONFIG` environment variable
//! 3. XDG default: `~/.config/tsquill/config.toml`
//! 4. Built-in defaults
//!
//! String values under `[database]` and `[search]` can be overridden with
//! `TSQUILL_DATABASE_URL`, `TSQUILL_SEARCH_TEXT_SEARCH_CONFIG` and so on.

use confyg::{env, Confygery};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use tsquill_core::{Error, Result, SearchStore};
use tsquill_index::{EntitySpec, PgSettings, VectorConfig, DEFAULT_TEXT_SEARCH_CONFIG};

// ============================================================================
// Configuration structs
// ============================================================================

/// Main configuration for the CLI.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TsquillConfig {
    /// Database connection.
    pub database: DatabaseConfig,

    /// Search defaults.
    pub search: SearchConfig,

    /// Searchable entities keyed by name.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub entities: BTreeMap<String, EntitySpec>,
}

/// Database connection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Connection URL.
    pub url: Option<String>,

    /// Pool size.
    pub max_connections: u32,

    /// Per-statement timeout in milliseconds.
    pub statement_timeout_ms: Option<u64>,
}

/// Search defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Text search configuration for `to_tsvector` / `to_tsquery`.
    pub text_search_config: String,

    /// Limit applied to `search` when `--limit` is not given.
    pub default_limit: Option<usize>,
}

// ============================================================================
// Default implementations
// ============================================================================

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: 5,
            statement_timeout_ms: None,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            text_search_config: DEFAULT_TEXT_SEARCH_CONFIG.to_string(),
            default_limit: Some(20),
        }
    }
}

// ============================================================================
// Config loading
// ============================================================================

impl TsquillConfig {
    /// Load configuration from file, environment, and defaults.
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut builder =
            Confygery::new().map_err(|e| Error::config(format!("config init: {e}")))?;

        if let Some(path) = Self::resolve_config_path(config_path) {
            if path.exists() {
                builder
                    .add_file(&path.to_string_lossy())
                    .map_err(|e| Error::config(format!("config file: {e}")))?;
            }
        }

        let mut env_opts = env::Options::with_top_level("TSQUILL");
        env_opts.add_section("database");
        env_opts.add_section("search");
        builder
            .add_env(env_opts)
            .map_err(|e| Error::config(format!("config env: {e}")))?;

        let config: Self = builder
            .build()
            .map_err(|e| Error::config(format!("config build: {e}")))?;

        Ok(config)
    }

    /// Resolve the config file path from explicit flag, env var, or XDG default.
    pub fn resolve_config_path(explicit: Option<&str>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(PathBuf::from(path));
        }
        if let Ok(path) = std::env::var("TSQUILL_CONFIG") {
            return Some(PathBuf::from(path));
        }
        Self::default_config_path()
    }

    /// Return the XDG default config path.
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("tsquill").join("config.toml"))
    }

    /// Serialize this config to a pretty-printed TOML string.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::config(e.to_string()))
    }

    /// Connection settings for the configured database.
    pub fn pg_settings(&self) -> Result<PgSettings> {
        let url = self.database.url.as_deref().ok_or_else(|| {
            Error::config("no database url; set [database] url or TSQUILL_DATABASE_URL")
        })?;
        let mut settings =
            PgSettings::new(url).with_max_connections(self.database.max_connections);
        if let Some(ms) = self.database.statement_timeout_ms {
            settings = settings.with_statement_timeout(Duration::from_millis(ms));
        }
        Ok(settings)
    }

    /// Build and validate the vector configuration against a store.
    pub async fn vector_config(&self, store: &dyn SearchStore) -> Result<VectorConfig> {
        let mut config =
            VectorConfig::new().with_text_search_config(&self.search.text_search_config)?;
        config.configure_all(&self.entities, store).await?;
        Ok(config)
    }
}

// ============================================================================
// Tests
// ============================================================================
