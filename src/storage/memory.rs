//! In-process store for tests and sessions that need no persistence

use super::{MemoryStore, MemoryUpdate, UsageStore};
use crate::error::Result;
use crate::types::{
    MemoryRecord, PositionRange, StatKind, StatsScope, TimeRange, TimelineKey, UsageEvent,
    UsageStat,
};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::Mutex;

type StatKey = (String, String, String, String, String, String);

#[derive(Default)]
struct UsageState {
    stats: HashMap<StatKey, UsageStat>,
    log: Vec<UsageEvent>,
}

/// Mutex-guarded maps implementing both store traits
#[derive(Default)]
pub struct InMemoryStore {
    memory: Mutex<HashMap<(String, String), MemoryRecord>>,
    usage: Mutex<UsageState>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of logged events
    pub async fn event_count(&self) -> usize {
        self.usage.lock().await.log.len()
    }
}

fn stat_key(event: &UsageEvent) -> StatKey {
    (
        event.language_pair.clone(),
        event.corpus_id.clone(),
        event.lemma.clone(),
        event.pos.clone(),
        event.feature_code.clone(),
        event.event_type.as_str().to_string(),
    )
}

#[async_trait]
impl MemoryStore for InMemoryStore {
    async fn load_memory(&self, lemma: &str, feature_key: &str) -> Result<Option<MemoryRecord>> {
        let memory = self.memory.lock().await;
        Ok(memory
            .get(&(lemma.to_string(), feature_key.to_string()))
            .copied())
    }

    async fn update_memory(
        &self,
        lemma: &str,
        feature_key: &str,
        update: MemoryUpdate,
    ) -> Result<MemoryRecord> {
        let mut memory = self.memory.lock().await;
        let key = (lemma.to_string(), feature_key.to_string());
        let next = update(memory.get(&key).copied());
        memory.insert(key, next);
        Ok(next)
    }
}

#[async_trait]
impl UsageStore for InMemoryStore {
    async fn append_event(&self, event: &UsageEvent) -> Result<UsageStat> {
        let mut usage = self.usage.lock().await;

        let stat = usage
            .stats
            .entry(stat_key(event))
            .or_insert_with(|| UsageStat {
                language_pair: event.language_pair.clone(),
                corpus_id: event.corpus_id.clone(),
                lemma: event.lemma.clone(),
                pos: event.pos.clone(),
                feature_code: event.feature_code.clone(),
                event_type: event.event_type,
                count: 0,
                last_seen_ms: 0,
                last_position: -1,
            });
        stat.count += 1;
        stat.last_seen_ms = event.timestamp_ms;
        if event.char_index >= 0 {
            stat.last_position = event.char_index;
        }
        let stat = stat.clone();

        usage.log.push(event.clone());
        Ok(stat)
    }

    async fn stats(&self, scope: &StatsScope, kind: StatKind) -> Result<Vec<UsageStat>> {
        let usage = self.usage.lock().await;

        let matching = usage.stats.values().filter(|s| {
            s.language_pair == scope.language_pair
                && kind.matches(&s.feature_code)
                && scope.corpus_id.as_ref().map_or(true, |c| &s.corpus_id == c)
        });

        let mut rows: Vec<UsageStat> = match &scope.corpus_id {
            Some(_) => matching.cloned().collect(),
            None => {
                let mut merged: BTreeMap<(String, String, String, String), UsageStat> =
                    BTreeMap::new();
                for stat in matching {
                    let key = (
                        stat.lemma.clone(),
                        stat.pos.clone(),
                        stat.feature_code.clone(),
                        stat.event_type.as_str().to_string(),
                    );
                    merged
                        .entry(key)
                        .and_modify(|row| {
                            row.count += stat.count;
                            row.last_seen_ms = row.last_seen_ms.max(stat.last_seen_ms);
                            row.last_position = row.last_position.max(stat.last_position);
                        })
                        .or_insert_with(|| UsageStat {
                            corpus_id: String::new(),
                            ..stat.clone()
                        });
                }
                merged.into_values().collect()
            }
        };

        rows.sort_by(|a, b| {
            let by_lemma = || {
                a.lemma
                    .to_lowercase()
                    .cmp(&b.lemma.to_lowercase())
                    .then_with(|| a.pos.cmp(&b.pos))
                    .then_with(|| a.event_type.as_str().cmp(b.event_type.as_str()))
            };
            match kind {
                StatKind::Lemma => by_lemma(),
                StatKind::Feature => a.feature_code.cmp(&b.feature_code).then_with(by_lemma),
            }
        });
        Ok(rows)
    }

    async fn events(
        &self,
        scope: &StatsScope,
        key: &TimelineKey,
        range: TimeRange,
    ) -> Result<Vec<UsageEvent>> {
        let usage = self.usage.lock().await;

        let mut events: Vec<UsageEvent> = usage
            .log
            .iter()
            .filter(|e| {
                e.language_pair == scope.language_pair
                    && scope.corpus_id.as_ref().map_or(true, |c| &e.corpus_id == c)
                    && e.lemma == key.lemma
                    && e.pos == key.pos
                    && e.event_type == key.event_type
                    && range.contains(e.timestamp_ms)
            })
            .cloned()
            .collect();
        // Stable sort keeps append order for equal timestamps
        events.sort_by_key(|e| e.timestamp_ms);
        Ok(events)
    }

    async fn time_bounds(&self, language_pair: &str) -> Result<Option<TimeRange>> {
        let usage = self.usage.lock().await;
        let stamps = usage
            .log
            .iter()
            .filter(|e| e.language_pair == language_pair)
            .map(|e| e.timestamp_ms);

        Ok(stamps.fold(None, |acc: Option<TimeRange>, ts| {
            Some(match acc {
                Some(r) => TimeRange {
                    start_ms: r.start_ms.min(ts),
                    end_ms: r.end_ms.max(ts),
                },
                None => TimeRange {
                    start_ms: ts,
                    end_ms: ts,
                },
            })
        }))
    }

    async fn position_bounds(
        &self,
        language_pair: &str,
        corpus_id: &str,
    ) -> Result<Option<PositionRange>> {
        let usage = self.usage.lock().await;
        let positions = usage
            .log
            .iter()
            .filter(|e| {
                e.language_pair == language_pair && e.corpus_id == corpus_id && e.char_index >= 0
            })
            .map(|e| e.char_index);

        Ok(positions.fold(None, |acc: Option<PositionRange>, pos| {
            Some(match acc {
                Some(r) => PositionRange {
                    first: r.first.min(pos),
                    last: r.last.max(pos),
                },
                None => PositionRange {
                    first: pos,
                    last: pos,
                },
            })
        }))
    }
}
