//! Token analyzer capability shared by the remote and local analyzers

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Analyses returned for one surface token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordMarkup {
    pub word: String,
    pub analyses: Vec<String>,
}

impl WordMarkup {
    pub fn new(word: impl Into<String>, analyses: Vec<String>) -> Self {
        Self {
            word: word.into(),
            analyses,
        }
    }

    /// Analyses that are not blank
    pub fn usable_analyses(&self) -> impl Iterator<Item = &String> {
        self.analyses.iter().filter(|a| !a.trim().is_empty())
    }

    pub fn has_usable_analysis(&self) -> bool {
        self.usable_analyses().next().is_some()
    }
}

/// Anything that can analyse a batch of text into tokens
///
/// The result lists tokens in the order they occur in the batch.
#[async_trait]
pub trait TokenAnalyzer: Send + Sync {
    async fn analyze_batch(&self, batch: &str) -> Result<Vec<WordMarkup>>;

    /// Short name used in logs
    fn name(&self) -> &str;
}
