use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct CareerMatchConfig {
    pub server: ServerConfig,
    pub catalog: CatalogConfig,
    pub embedding: EmbeddingConfig,
    pub cache: CacheConfig,
    pub recommend: RecommendConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub transport: String,
    pub host: String,
    pub port: u16,
    pub log_level: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CatalogConfig {
    /// JSON file holding the ordered list of careers.
    pub path: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub provider: String,
    pub model: String,
    /// Directory holding `model.onnx` and `tokenizer.json`.
    pub cache_dir: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CacheConfig {
    /// SQLite file holding the persisted embedding matrix and title list.
    pub db_path: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RecommendConfig {
    /// Result count when a request gives none.
    pub default_top_n: usize,
    /// Upper bound the MCP tool and CLI apply to any requested count, so a
    /// request never returns more than this many careers even when the catalog
    /// is larger. Raise it to allow full-catalog listings.
    pub max_top_n: usize,
    pub query_timeout_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            transport: "stdio".into(),
            host: "127.0.0.1".into(),
            port: 8420,
            log_level: "info".into(),
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        let path = default_careermatch_dir()
            .join("careers.json")
            .to_string_lossy()
            .into_owned();
        Self { path }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        let cache_dir = default_careermatch_dir()
            .join("models")
            .to_string_lossy()
            .into_owned();
        Self {
            provider: "local".into(),
            model: "all-MiniLM-L6-v2".into(),
            cache_dir,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        let db_path = default_careermatch_dir()
            .join("cache")
            .join("career_embeddings.db")
            .to_string_lossy()
            .into_owned();
        Self { db_path }
    }
}

impl Default for RecommendConfig {
    fn default() -> Self {
        Self {
            default_top_n: 5,
            max_top_n: 50,
            query_timeout_ms: 10_000,
        }
    }
}

/// Returns `~/.careermatch/`
pub fn default_careermatch_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".careermatch")
}

/// Returns the default config file path: `~/.careermatch/config.toml`
pub fn default_config_path() -> PathBuf {
    default_careermatch_dir().join("config.toml")
}

impl CareerMatchConfig {
    /// Load config from TOML file (if it exists) then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            CareerMatchConfig::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides
    /// (CAREERMATCH_CATALOG, CAREERMATCH_CACHE_DB, CAREERMATCH_LOG_LEVEL).
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("CAREERMATCH_CATALOG") {
            self.catalog.path = val;
        }
        if let Ok(val) = std::env::var("CAREERMATCH_CACHE_DB") {
            self.cache.db_path = val;
        }
        if let Ok(val) = std::env::var("CAREERMATCH_LOG_LEVEL") {
            self.server.log_level = val;
        }
    }

    pub fn resolved_catalog_path(&self) -> PathBuf {
        expand_tilde(&self.catalog.path)
    }

    pub fn resolved_cache_db_path(&self) -> PathBuf {
        expand_tilde(&self.cache.db_path)
    }

    /// Clamp a requested result count to `recommend.max_top_n`, falling back to
    /// `recommend.default_top_n` when none was given. Negative requests map to 0.
    pub fn effective_top_n(&self, requested: Option<i64>) -> usize {
        match requested {
            None => self.recommend.default_top_n.min(self.recommend.max_top_n),
            Some(n) if n <= 0 => 0,
            Some(n) => usize::try_from(n)
                .unwrap_or(usize::MAX)
                .min(self.recommend.max_top_n),
        }
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}
