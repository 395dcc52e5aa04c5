// Reader Configuration
//
// Settings for the remote analyzer client, the memory model, storage
// location and the annotation service. Every section has defaults, so an
// empty file is a valid configuration.

use crate::annotation::batching::DEFAULT_BUDGET_CHARS;
use crate::error::{ReaderError, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    pub remote: RemoteConfig,
    pub memory: MemoryConfig,
    pub storage: StorageConfig,
    pub server: ServerConfig,
}

/// Remote morphological analyzer client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Analyzer endpoint; local analysis only when unset
    pub endpoint: Option<String>,

    /// Per-request text limit, in characters
    pub budget_chars: usize,

    /// Batches in flight at once
    pub max_concurrency: usize,

    /// Request timeout (in seconds)
    #[serde(with = "serde_duration")]
    pub timeout: Duration,

    /// Retries for rate-limited or timed-out requests
    pub max_retries: usize,

    /// First retry delay; doubles with every attempt
    pub backoff_base_ms: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            budget_chars: DEFAULT_BUDGET_CHARS,
            max_concurrency: 4,
            timeout: Duration::from_secs(30),
            max_retries: 3,
            backoff_base_ms: 1000,
        }
    }
}

/// Familiarity decay and reinforcement
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    pub half_life_days: f64,
    pub lookup_increment: f64,
    pub language_pair: String,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            half_life_days: 7.0,
            lookup_increment: 1.0,
            language_pair: "tt-ru".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub db_path: Option<PathBuf>,
}

/// Annotation HTTP service
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub addr: SocketAddr,

    /// Markup files backing the local analyzer, loaded in order
    pub markup_files: Vec<PathBuf>,

    /// Grammar metadata JSON describing POS and feature codes
    pub grammar_file: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            markup_files: Vec::new(),
            grammar_file: None,
        }
    }
}

// Durations are written as whole seconds
mod serde_duration {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

impl ReaderConfig {
    /// Load configuration from TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            ReaderError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml(&contents)
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: ReaderConfig = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.remote.budget_chars == 0 {
            return Err(ReaderError::Config(
                "remote: budget_chars must be positive".to_string(),
            ));
        }

        if self.remote.max_concurrency == 0 {
            return Err(ReaderError::Config(
                "remote: max_concurrency must be at least 1".to_string(),
            ));
        }

        if let Some(endpoint) = &self.remote.endpoint {
            if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
                return Err(ReaderError::Config(format!(
                    "remote: endpoint must be an http(s) URL, got {}",
                    endpoint
                )));
            }
        }

        // Non-positive half-lives are clamped at use, but NaN/inf never are
        if !self.memory.half_life_days.is_finite() {
            return Err(ReaderError::Config(
                "memory: half_life_days must be finite".to_string(),
            ));
        }

        if !self.memory.lookup_increment.is_finite() || self.memory.lookup_increment < 0.0 {
            return Err(ReaderError::Config(
                "memory: lookup_increment must be a non-negative number".to_string(),
            ));
        }

        if self.memory.language_pair.is_empty() {
            return Err(ReaderError::Config(
                "memory: language_pair cannot be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Save configuration to TOML file
    pub fn to_file(&self, path: &Path) -> Result<()> {
        let toml_str =
            toml::to_string_pretty(self).map_err(|e| ReaderError::Config(e.to_string()))?;
        std::fs::write(path, toml_str)?;
        Ok(())
    }
}
