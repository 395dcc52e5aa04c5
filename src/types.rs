//! Core data types for the Uqureader corpus and reading pipeline
//!
//! This module defines the fundamental data structures:
//! - Morphology: a token's decomposition into stem and feature segments
//! - Token: one corpus entry with its analysis tag and translations
//! - UsageEvent / UsageStat: append-only exposure log and its rollup
//! - MemoryRecord: per lemma/feature familiarity strength

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One grammatical feature of an analysis, resolved against a surface form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feature {
    /// Feature code, e.g. `PL` or `Sg` (may be empty)
    pub code: String,

    /// Canonical surface realizations in tag order (may be empty)
    pub canonical_variants: Vec<String>,

    /// The slice of the surface this feature was attributed to
    pub resolved_text: String,
}

/// Structured decomposition of a token produced by the segmenter
///
/// Invariant: `segments.concat()` equals the surface text the morphology
/// was resolved against, byte for byte.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Morphology {
    pub lemma: String,
    pub pos: String,
    pub features: Vec<Feature>,
    pub segments: Vec<String>,
    pub feature_key: String,
    pub source_tag: String,
}

impl Morphology {
    /// Codes of all features with a non-empty code, in tag order
    pub fn feature_codes(&self) -> impl Iterator<Item = &str> {
        self.features
            .iter()
            .map(|f| f.code.as_str())
            .filter(|code| !code.is_empty())
    }
}

/// A single corpus token
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Token {
    /// Leading separator or whitespace, possibly empty
    pub prefix: String,
    pub surface: String,
    pub analysis_tag: Option<String>,
    pub morphology: Option<Morphology>,
    pub translations: Option<Vec<String>>,
}

impl Token {
    pub fn has_morphology(&self) -> bool {
        self.morphology.is_some()
    }
}

/// Usage event kinds recorded by the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Exposure,
    Lookup,
    Feature,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Exposure => "exposure",
            EventType::Lookup => "lookup",
            EventType::Feature => "feature",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "exposure" => Ok(EventType::Exposure),
            "lookup" => Ok(EventType::Lookup),
            "feature" => Ok(EventType::Feature),
            other => Err(format!("unknown event type: {}", other)),
        }
    }
}

/// Immutable usage event, as appended to `usage_event_log`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageEvent {
    pub language_pair: String,
    pub corpus_id: String,
    pub lemma: String,
    pub pos: String,
    /// Empty string when the event concerns the whole lemma
    pub feature_code: String,
    pub event_type: EventType,
    pub timestamp_ms: i64,
    /// Character offset in the corpus, -1 when unknown
    pub char_index: i64,
}

/// Rollup row of `usage_stats`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageStat {
    pub language_pair: String,
    /// Empty when the row aggregates across corpora
    pub corpus_id: String,
    pub lemma: String,
    pub pos: String,
    pub feature_code: String,
    pub event_type: EventType,
    pub count: u64,
    pub last_seen_ms: i64,
    pub last_position: i64,
}

/// Stored familiarity for one `(lemma, feature_key)` pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MemoryRecord {
    /// Stored strength in `[0, 10]`, before decay
    pub strength: f64,
    pub last_seen_ms: i64,
}

/// Which slice of the ledger a report covers
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StatsScope {
    pub language_pair: String,
    /// `None` aggregates across every corpus of the language pair
    pub corpus_id: Option<String>,
}

impl StatsScope {
    pub fn new(language_pair: impl Into<String>) -> Self {
        Self {
            language_pair: language_pair.into(),
            corpus_id: None,
        }
    }

    pub fn with_corpus(mut self, corpus_id: impl Into<String>) -> Self {
        let corpus_id = corpus_id.into();
        self.corpus_id = if corpus_id.is_empty() {
            None
        } else {
            Some(corpus_id)
        };
        self
    }
}

/// Which rollup rows a stats report covers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatKind {
    /// Whole-lemma rows (empty feature code)
    Lemma,
    /// Per-feature rows (non-empty feature code)
    Feature,
}

impl StatKind {
    pub fn matches(&self, feature_code: &str) -> bool {
        match self {
            StatKind::Lemma => feature_code.is_empty(),
            StatKind::Feature => !feature_code.is_empty(),
        }
    }
}

/// Inclusive range of character offsets in a corpus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionRange {
    pub first: i64,
    pub last: i64,
}

/// Key selecting one event series for timeline queries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineKey {
    pub lemma: String,
    pub pos: String,
    pub event_type: EventType,
}

/// Inclusive timestamp range in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start_ms: i64,
    pub end_ms: i64,
}

impl TimeRange {
    pub fn all() -> Self {
        Self {
            start_ms: i64::MIN,
            end_ms: i64::MAX,
        }
    }

    pub fn contains(&self, timestamp_ms: i64) -> bool {
        timestamp_ms >= self.start_ms && timestamp_ms <= self.end_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type_round_trip() {
        for ty in [EventType::Exposure, EventType::Lookup, EventType::Feature] {
            assert_eq!(ty.as_str().parse::<EventType>().unwrap(), ty);
        }
        assert!("click".parse::<EventType>().is_err());
    }

    #[test]
    fn test_scope_empty_corpus_means_aggregate() {
        let scope = StatsScope::new("tt-ru").with_corpus("");
        assert_eq!(scope.corpus_id, None);

        let scope = StatsScope::new("tt-ru").with_corpus("harri-potter");
        assert_eq!(scope.corpus_id.as_deref(), Some("harri-potter"));
    }

    #[test]
    fn test_time_range_inclusive() {
        let range = TimeRange {
            start_ms: 10,
            end_ms: 20,
        };
        assert!(range.contains(10));
        assert!(range.contains(20));
        assert!(!range.contains(21));
        assert!(TimeRange::all().contains(0));
    }
}
