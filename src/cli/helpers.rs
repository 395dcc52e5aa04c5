//! Shared helper functions for CLI commands
//!
//! Configuration loading, database path resolution and construction of the
//! annotator and ledger from configuration.

use anyhow::Context;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};
use uqureader_core::{
    annotation::{CorpusAnnotator, FallbackAnalyzer, RemoteAnalyzer},
    ReaderConfig, SqliteStore, UsageLedger,
};

/// Environment variable overriding the configured database path
pub const DB_PATH_ENV: &str = "UQUREADER_DB_PATH";

/// Get the default database path using XDG_DATA_HOME standard
pub fn get_default_db_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("uqureader")
        .join("uqureader.db")
}

/// Get the database path from CLI arg, env var, config, or default
pub fn get_db_path(cli_path: Option<String>, config: &ReaderConfig) -> PathBuf {
    cli_path
        .map(PathBuf::from)
        .or_else(|| std::env::var(DB_PATH_ENV).ok().map(PathBuf::from))
        .or_else(|| config.storage.db_path.clone())
        .unwrap_or_else(get_default_db_path)
}

/// Load the configuration file if one was given, defaults otherwise
pub fn load_config(path: Option<&Path>) -> anyhow::Result<ReaderConfig> {
    match path {
        Some(path) => {
            debug!("Loading configuration from {}", path.display());
            ReaderConfig::from_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))
        }
        None => Ok(ReaderConfig::default()),
    }
}

/// Annotator from configuration: remote analyzer when an endpoint is set,
/// local markup dictionaries as fallback
pub fn build_annotator(
    config: &ReaderConfig,
    markup_files: &[PathBuf],
) -> anyhow::Result<CorpusAnnotator> {
    let files: Vec<PathBuf> = if markup_files.is_empty() {
        config.server.markup_files.clone()
    } else {
        markup_files.to_vec()
    };
    let fallback = Arc::new(FallbackAnalyzer::from_files(files.as_slice())?);
    info!(
        "Local dictionary: {} surfaces from {} files",
        fallback.len(),
        files.len()
    );

    match RemoteAnalyzer::from_config(&config.remote)? {
        Some(remote) => {
            info!("Remote analyzer: {}", remote.endpoint());
            Ok(CorpusAnnotator::new(
                Arc::new(remote),
                fallback,
                config.remote.max_concurrency,
            )?)
        }
        None => {
            info!("No remote analyzer configured, annotating locally");
            Ok(CorpusAnnotator::local(fallback))
        }
    }
}

/// Ledger for `corpus_id` over the resolved database
pub async fn open_ledger(
    config: &ReaderConfig,
    db_path: Option<String>,
    corpus_id: &str,
) -> anyhow::Result<UsageLedger> {
    let path = get_db_path(db_path, config);
    let store = SqliteStore::open(&path)
        .await
        .with_context(|| format!("Failed to open database {}", path.display()))?;
    Ok(UsageLedger::new(
        Arc::new(store),
        config.memory.language_pair.clone(),
        corpus_id,
    ))
}

/// Render epoch milliseconds for terminal output
pub fn format_timestamp(timestamp_ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(timestamp_ms)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| timestamp_ms.to_string())
}
