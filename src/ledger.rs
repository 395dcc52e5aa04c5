//! Usage ledger
//!
//! Records exposure, lookup and feature events for one corpus of one
//! language pair, and reports on them. Every event is appended to the log
//! and folded into its rollup row in the same atomic store operation.

use crate::error::Result;
use crate::storage::UsageStore;
use crate::types::{
    EventType, PositionRange, StatKind, StatsScope, TimeRange, TimelineKey, UsageEvent,
    UsageStat,
};
use std::sync::Arc;
use tracing::debug;

/// Event recorder and reporting facade over a [`UsageStore`]
#[derive(Clone)]
pub struct UsageLedger {
    store: Arc<dyn UsageStore>,
    language_pair: String,
    corpus_id: String,
}

impl UsageLedger {
    pub fn new(
        store: Arc<dyn UsageStore>,
        language_pair: impl Into<String>,
        corpus_id: impl Into<String>,
    ) -> Self {
        Self {
            store,
            language_pair: language_pair.into(),
            corpus_id: corpus_id.into(),
        }
    }

    pub fn language_pair(&self) -> &str {
        &self.language_pair
    }

    pub fn corpus_id(&self) -> &str {
        &self.corpus_id
    }

    /// Scope covering this ledger's corpus only
    pub fn corpus_scope(&self) -> StatsScope {
        StatsScope::new(self.language_pair.clone()).with_corpus(self.corpus_id.clone())
    }

    /// Append one event and update its rollup row
    ///
    /// `feature_code` is `None` for whole-lemma events; `position` is the
    /// character offset in the corpus when known.
    pub async fn record_event(
        &self,
        lemma: &str,
        pos: &str,
        feature_code: Option<&str>,
        event_type: EventType,
        timestamp_ms: i64,
        position: Option<usize>,
    ) -> Result<UsageStat> {
        let event = UsageEvent {
            language_pair: self.language_pair.clone(),
            corpus_id: self.corpus_id.clone(),
            lemma: lemma.to_string(),
            pos: pos.to_string(),
            feature_code: feature_code.unwrap_or_default().to_string(),
            event_type,
            timestamp_ms,
            char_index: position.and_then(|p| i64::try_from(p).ok()).unwrap_or(-1),
        };

        let stat = self.store.append_event(&event).await?;
        debug!(
            "Recorded {} for {}/{} [{}] (count {})",
            event_type, lemma, pos, event.feature_code, stat.count
        );
        Ok(stat)
    }

    /// Rollup rows of one kind
    pub async fn query_stats(&self, scope: &StatsScope, kind: StatKind) -> Result<Vec<UsageStat>> {
        self.store.stats(scope, kind).await
    }

    /// Whole-lemma rollup rows
    pub async fn lemma_stats(&self, scope: &StatsScope) -> Result<Vec<UsageStat>> {
        self.query_stats(scope, StatKind::Lemma).await
    }

    /// Per-feature rollup rows
    pub async fn feature_stats(&self, scope: &StatsScope) -> Result<Vec<UsageStat>> {
        self.query_stats(scope, StatKind::Feature).await
    }

    /// Raw events of one series within `range`, oldest first
    pub async fn query_timeline(
        &self,
        scope: &StatsScope,
        key: &TimelineKey,
        range: TimeRange,
    ) -> Result<Vec<UsageEvent>> {
        self.store.events(scope, key, range).await
    }

    pub async fn time_bounds(&self, language_pair: &str) -> Result<Option<TimeRange>> {
        self.store.time_bounds(language_pair).await
    }

    pub async fn position_bounds(
        &self,
        language_pair: &str,
        corpus_id: &str,
    ) -> Result<Option<PositionRange>> {
        self.store.position_bounds(language_pair, corpus_id).await
    }
}
