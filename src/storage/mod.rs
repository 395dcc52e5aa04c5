//! Storage layer for familiarity and usage data
//!
//! Provides the store traits the memory model and usage ledger depend on,
//! a SQLite implementation for persistent state, an in-memory one for tests
//! and throwaway sessions, and the bilingual dictionary used by translation
//! augmentation.

pub mod dictionary;
pub mod memory;
pub mod sqlite;

pub use dictionary::{Dictionary, DictionaryEntry, MapDictionary, SqliteDictionary};
pub use memory::InMemoryStore;
pub use sqlite::SqliteStore;

use crate::error::Result;
use crate::types::{
    MemoryRecord, PositionRange, StatKind, StatsScope, TimeRange, TimelineKey, UsageEvent,
    UsageStat,
};
use async_trait::async_trait;

/// Computes the next stored record from the current one, if any
pub type MemoryUpdate = Box<dyn FnOnce(Option<MemoryRecord>) -> MemoryRecord + Send + 'static>;

/// Persistent `(lemma, feature_key)` familiarity records
#[async_trait]
pub trait MemoryStore: Send + Sync {
    /// Stored record, before any decay
    async fn load_memory(&self, lemma: &str, feature_key: &str) -> Result<Option<MemoryRecord>>;

    /// Read-modify-write of one record
    ///
    /// Implementations must serialise concurrent updates to the same key so
    /// that no update is lost.
    async fn update_memory(
        &self,
        lemma: &str,
        feature_key: &str,
        update: MemoryUpdate,
    ) -> Result<MemoryRecord>;
}

/// Append-only usage event log plus its per-key rollup
#[async_trait]
pub trait UsageStore: Send + Sync {
    /// Append `event` and fold it into its rollup row in one atomic step
    ///
    /// The row's count grows by one, `last_seen_ms` becomes the event's
    /// timestamp and `last_position` its char index when that is known.
    async fn append_event(&self, event: &UsageEvent) -> Result<UsageStat>;

    /// Rollup rows for a scope, summed across corpora when the scope has none
    async fn stats(&self, scope: &StatsScope, kind: StatKind) -> Result<Vec<UsageStat>>;

    /// Raw events of one series within `range`, oldest first
    async fn events(
        &self,
        scope: &StatsScope,
        key: &TimelineKey,
        range: TimeRange,
    ) -> Result<Vec<UsageEvent>>;

    /// Earliest and latest event timestamps for a language pair
    async fn time_bounds(&self, language_pair: &str) -> Result<Option<TimeRange>>;

    /// Lowest and highest known char index for one corpus
    async fn position_bounds(
        &self,
        language_pair: &str,
        corpus_id: &str,
    ) -> Result<Option<PositionRange>>;
}
