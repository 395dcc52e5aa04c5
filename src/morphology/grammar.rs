//! Grammar metadata for human-readable part-of-speech and feature names
//!
//! Loaded once from a language-pair JSON document and passed by handle to
//! whatever needs display names. Nothing here is process-global.

use crate::error::{ReaderError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// Display metadata for one feature code
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureMetadata {
    pub code: String,
    #[serde(default)]
    pub title_ru: String,
    #[serde(default)]
    pub title_tt: String,
    #[serde(default)]
    pub description_ru: String,
    #[serde(default)]
    pub phonetic_forms: Vec<String>,
    #[serde(default)]
    pub examples: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PosEntry {
    code: String,
    #[serde(default)]
    title_tt: String,
    #[serde(default)]
    title_ru: String,
}

#[derive(Debug, Default, Deserialize)]
struct GrammarDocument {
    #[serde(default)]
    pos: Vec<PosEntry>,
    #[serde(default)]
    features: Vec<FeatureMetadata>,
}

/// Read-only grammar lookup tables
#[derive(Debug, Clone, Default)]
pub struct GrammarResources {
    pos: HashMap<String, (String, String)>,
    features: HashMap<String, FeatureMetadata>,
}

/// Shared handle to grammar metadata
pub type GrammarHandle = Arc<GrammarResources>;

impl GrammarResources {
    /// Parse a grammar document
    pub fn from_json(json: &str) -> Result<Self> {
        let doc: GrammarDocument = serde_json::from_str(json)?;

        let pos = doc
            .pos
            .into_iter()
            .filter(|p| !p.code.is_empty() && !(p.title_tt.is_empty() && p.title_ru.is_empty()))
            .map(|p| (p.code, (p.title_tt, p.title_ru)))
            .collect();

        let features = doc
            .features
            .into_iter()
            .filter(|f| !f.code.is_empty())
            .map(|mut f| {
                f.phonetic_forms.retain(|s| !s.is_empty());
                f.examples.retain(|s| !s.is_empty());
                (f.code.clone(), f)
            })
            .collect();

        Ok(Self { pos, features })
    }

    /// Load a grammar document from disk
    pub fn from_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            ReaderError::Config(format!(
                "Failed to read grammar resources {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_json(&json)
    }

    pub fn into_handle(self) -> GrammarHandle {
        Arc::new(self)
    }

    /// `"tt / ru"` when both titles exist, else whichever exists, else the code
    pub fn format_pos(&self, code: &str) -> String {
        match self.pos.get(code) {
            Some((tt, ru)) if !tt.is_empty() && !ru.is_empty() => format!("{} / {}", tt, ru),
            Some((tt, _)) if !tt.is_empty() => tt.clone(),
            Some((_, ru)) if !ru.is_empty() => ru.clone(),
            _ => code.to_string(),
        }
    }

    pub fn feature(&self, code: &str) -> Option<&FeatureMetadata> {
        self.features.get(code)
    }

    /// Metadata for `code`, or a bare entry carrying only the code
    pub fn describe_feature(&self, code: &str) -> FeatureMetadata {
        self.feature(code).cloned().unwrap_or_else(|| FeatureMetadata {
            code: code.to_string(),
            ..Default::default()
        })
    }
}
