//! Error types for the Uqureader corpus and reading pipeline
//!
//! This module provides error handling using thiserror for structured error
//! definitions and anyhow for propagation at the binary boundary.
//!
//! Soft failures (an unparsable analysis tag, a token the remote analyzer
//! stays silent on) are modelled as values, not as errors.

use thiserror::Error;

/// Main error type for Uqureader operations
#[derive(Error, Debug)]
pub enum ReaderError {
    /// Database operation failed
    #[error("Database error: {0}")]
    Database(String),

    /// Remote analyzer request failed
    #[error("Remote analyzer error: {0}")]
    RemoteAnalyzer(String),

    /// Remote analyzer asked us to slow down
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Bilingual dictionary missing or unreadable
    #[error("Dictionary unavailable: {0}")]
    DictionaryUnavailable(String),

    /// A corpus line could not be decoded
    #[error("Invalid corpus record at line {line}: {message}")]
    InvalidRecord { line: usize, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Input rejected before any work was done
    #[error("Validation error: {0}")]
    Validation(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP request error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

/// Result type alias for Uqureader operations
pub type Result<T> = std::result::Result<T, ReaderError>;

impl From<rusqlite::Error> for ReaderError {
    fn from(err: rusqlite::Error) -> Self {
        ReaderError::Database(err.to_string())
    }
}

impl From<anyhow::Error> for ReaderError {
    fn from(err: anyhow::Error) -> Self {
        ReaderError::Other(err.to_string())
    }
}

impl From<toml::de::Error> for ReaderError {
    fn from(err: toml::de::Error) -> Self {
        ReaderError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ReaderError::InvalidRecord {
            line: 3,
            message: "expected object".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid corpus record at line 3: expected object"
        );
    }

    #[test]
    fn test_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{ nope").unwrap_err();
        let err: ReaderError = json_err.into();
        assert!(matches!(err, ReaderError::Serialization(_)));

        let sql_err = rusqlite::Error::QueryReturnedNoRows;
        let err: ReaderError = sql_err.into();
        assert!(matches!(err, ReaderError::Database(_)));
    }
}
