//! SQLite storage backend
//!
//! One database file holds the `memory` familiarity table, the
//! `usage_stats` rollup and the append-only `usage_event_log`. Connections
//! come from a deadpool-sqlite pool. Read-modify-write operations run inside
//! a single `BEGIN IMMEDIATE` transaction, so writers to the same key queue
//! up behind SQLite's write lock instead of losing increments.

use super::{MemoryStore, MemoryUpdate, UsageStore};
use crate::error::{ReaderError, Result};
use crate::types::{
    EventType, MemoryRecord, PositionRange, StatKind, StatsScope, TimeRange, TimelineKey,
    UsageEvent, UsageStat,
};
use async_trait::async_trait;
use deadpool_sqlite::{Config, Pool, PoolConfig, Runtime};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, Value, ValueRef};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, ToSql, TransactionBehavior};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Default connection pool size
const DEFAULT_POOL_SIZE: usize = 8;

/// How long a connection waits for another writer's lock
const BUSY_TIMEOUT: Duration = Duration::from_secs(10);

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS memory (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        lemma TEXT NOT NULL,
        feature_key TEXT NOT NULL DEFAULT '',
        strength REAL NOT NULL DEFAULT 0,
        last_seen_ms INTEGER NOT NULL DEFAULT 0
    );
    CREATE UNIQUE INDEX IF NOT EXISTS idx_memory_key ON memory(lemma, feature_key);

    CREATE TABLE IF NOT EXISTS usage_stats (
        language_pair TEXT NOT NULL,
        corpus_id TEXT NOT NULL,
        lemma TEXT NOT NULL,
        pos TEXT NOT NULL,
        feature_code TEXT NOT NULL DEFAULT '',
        event_type TEXT NOT NULL,
        count INTEGER NOT NULL DEFAULT 0,
        last_seen_ms INTEGER NOT NULL DEFAULT 0,
        last_position INTEGER NOT NULL DEFAULT -1,
        PRIMARY KEY (language_pair, corpus_id, lemma, pos, feature_code, event_type)
    );

    CREATE TABLE IF NOT EXISTS usage_event_log (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        language_pair TEXT NOT NULL,
        corpus_id TEXT NOT NULL,
        lemma TEXT NOT NULL,
        pos TEXT NOT NULL,
        feature_code TEXT NOT NULL DEFAULT '',
        event_type TEXT NOT NULL,
        timestamp_ms INTEGER NOT NULL,
        char_index INTEGER NOT NULL DEFAULT -1
    );
    CREATE INDEX IF NOT EXISTS idx_usage_event_range
        ON usage_event_log(language_pair, corpus_id, lemma, pos, event_type, timestamp_ms);
";

impl ToSql for EventType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for EventType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: String| FromSqlError::Other(e.into()))
    }
}

/// SQLite-backed memory and usage store
pub struct SqliteStore {
    pool: Pool,
    path: PathBuf,
}

impl SqliteStore {
    /// Open (creating if needed) the database at `db_path`
    pub async fn open<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        Self::with_pool_size(db_path, DEFAULT_POOL_SIZE).await
    }

    /// Open with a custom pool size
    pub async fn with_pool_size<P: AsRef<Path>>(db_path: P, pool_size: usize) -> Result<Self> {
        let path = db_path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        info!(
            "Opening store at: {} (pool_size: {})",
            path.display(),
            pool_size
        );

        let mut config = Config::new(path.clone());
        config.pool = Some(PoolConfig::new(pool_size));
        let pool = config.create_pool(Runtime::Tokio1).map_err(|e| {
            ReaderError::Database(format!("Failed to create connection pool: {}", e))
        })?;

        let store = Self { pool, path };
        store
            .interact(|conn| {
                conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
                    row.get::<_, String>(0)
                })?;
                conn.execute_batch(SCHEMA)?;
                Ok(())
            })
            .await?;

        debug!("Store schema ready");
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run `f` on a pooled connection
    async fn interact<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.pool.get().await.map_err(|e| {
            ReaderError::Database(format!("Failed to get connection from pool: {}", e))
        })?;

        conn.interact(move |conn| {
            conn.busy_timeout(BUSY_TIMEOUT)?;
            f(conn)
        })
        .await
        .map_err(|e| ReaderError::Database(format!("Pool interaction failed: {}", e)))?
    }
}

#[async_trait]
impl MemoryStore for SqliteStore {
    async fn load_memory(&self, lemma: &str, feature_key: &str) -> Result<Option<MemoryRecord>> {
        let lemma = lemma.to_string();
        let feature_key = feature_key.to_string();

        self.interact(move |conn| {
            let record = conn
                .query_row(
                    "SELECT strength, last_seen_ms FROM memory
                     WHERE lemma = ?1 AND feature_key = ?2",
                    params![lemma, feature_key],
                    |row| {
                        Ok(MemoryRecord {
                            strength: row.get(0)?,
                            last_seen_ms: row.get(1)?,
                        })
                    },
                )
                .optional()?;
            Ok(record)
        })
        .await
    }

    async fn update_memory(
        &self,
        lemma: &str,
        feature_key: &str,
        update: MemoryUpdate,
    ) -> Result<MemoryRecord> {
        let lemma = lemma.to_string();
        let feature_key = feature_key.to_string();

        self.interact(move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            let current = tx
                .query_row(
                    "SELECT strength, last_seen_ms FROM memory
                     WHERE lemma = ?1 AND feature_key = ?2",
                    params![lemma, feature_key],
                    |row| {
                        Ok(MemoryRecord {
                            strength: row.get(0)?,
                            last_seen_ms: row.get(1)?,
                        })
                    },
                )
                .optional()?;

            let next = update(current);

            tx.execute(
                "INSERT INTO memory (lemma, feature_key, strength, last_seen_ms)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(lemma, feature_key) DO UPDATE SET
                    strength = excluded.strength,
                    last_seen_ms = excluded.last_seen_ms",
                params![lemma, feature_key, next.strength, next.last_seen_ms],
            )?;
            tx.commit()?;

            Ok(next)
        })
        .await
    }
}

#[async_trait]
impl UsageStore for SqliteStore {
    async fn append_event(&self, event: &UsageEvent) -> Result<UsageStat> {
        let event = event.clone();

        self.interact(move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            let previous: Option<(i64, i64)> = tx
                .query_row(
                    "SELECT count, last_position FROM usage_stats
                     WHERE language_pair = ?1 AND corpus_id = ?2 AND lemma = ?3
                       AND pos = ?4 AND feature_code = ?5 AND event_type = ?6",
                    params![
                        event.language_pair,
                        event.corpus_id,
                        event.lemma,
                        event.pos,
                        event.feature_code,
                        event.event_type
                    ],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?;

            let count = previous.map(|(c, _)| c).unwrap_or(0) + 1;
            let last_position = if event.char_index >= 0 {
                event.char_index
            } else {
                previous.map(|(_, p)| p).unwrap_or(-1)
            };

            tx.execute(
                "INSERT OR REPLACE INTO usage_stats
                    (language_pair, corpus_id, lemma, pos, feature_code, event_type,
                     count, last_seen_ms, last_position)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    event.language_pair,
                    event.corpus_id,
                    event.lemma,
                    event.pos,
                    event.feature_code,
                    event.event_type,
                    count,
                    event.timestamp_ms,
                    last_position
                ],
            )?;

            tx.execute(
                "INSERT INTO usage_event_log
                    (language_pair, corpus_id, lemma, pos, feature_code, event_type,
                     timestamp_ms, char_index)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    event.language_pair,
                    event.corpus_id,
                    event.lemma,
                    event.pos,
                    event.feature_code,
                    event.event_type,
                    event.timestamp_ms,
                    event.char_index
                ],
            )?;
            tx.commit()?;

            Ok(UsageStat {
                language_pair: event.language_pair,
                corpus_id: event.corpus_id,
                lemma: event.lemma,
                pos: event.pos,
                feature_code: event.feature_code,
                event_type: event.event_type,
                count: count as u64,
                last_seen_ms: event.timestamp_ms,
                last_position,
            })
        })
        .await
    }

    async fn stats(&self, scope: &StatsScope, kind: StatKind) -> Result<Vec<UsageStat>> {
        let language_pair = scope.language_pair.clone();
        let corpus_id = scope.corpus_id.clone();

        let filter = match kind {
            StatKind::Lemma => "feature_code = ''",
            StatKind::Feature => "feature_code <> ''",
        };
        let order = match kind {
            StatKind::Lemma => "lemma COLLATE NOCASE, pos, event_type",
            StatKind::Feature => "feature_code, lemma COLLATE NOCASE, pos, event_type",
        };

        let (sql, args) = match &corpus_id {
            Some(corpus) => (
                format!(
                    "SELECT corpus_id, lemma, pos, feature_code, event_type,
                            count, last_seen_ms, last_position
                     FROM usage_stats
                     WHERE language_pair = ?1 AND corpus_id = ?2 AND {}
                     ORDER BY {}",
                    filter, order
                ),
                vec![language_pair.clone(), corpus.clone()],
            ),
            None => (
                format!(
                    "SELECT '' AS corpus_id, lemma, pos, feature_code, event_type,
                            SUM(count), MAX(last_seen_ms), MAX(last_position)
                     FROM usage_stats
                     WHERE language_pair = ?1 AND {}
                     GROUP BY lemma, pos, feature_code, event_type
                     ORDER BY {}",
                    filter, order
                ),
                vec![language_pair.clone()],
            ),
        };

        self.interact(move |conn| {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params_from_iter(args.iter()), |row| {
                Ok(UsageStat {
                    language_pair: language_pair.clone(),
                    corpus_id: row.get(0)?,
                    lemma: row.get(1)?,
                    pos: row.get(2)?,
                    feature_code: row.get(3)?,
                    event_type: row.get(4)?,
                    count: row.get::<_, i64>(5)?.max(0) as u64,
                    last_seen_ms: row.get(6)?,
                    last_position: row.get(7)?,
                })
            })?;

            let mut stats = Vec::new();
            for row in rows {
                stats.push(row?);
            }
            Ok(stats)
        })
        .await
    }

    async fn events(
        &self,
        scope: &StatsScope,
        key: &TimelineKey,
        range: TimeRange,
    ) -> Result<Vec<UsageEvent>> {
        let language_pair = scope.language_pair.clone();
        let key = key.clone();

        let mut sql = String::from(
            "SELECT corpus_id, feature_code, timestamp_ms, char_index
             FROM usage_event_log
             WHERE language_pair = ? AND lemma = ? AND pos = ? AND event_type = ?
               AND timestamp_ms >= ? AND timestamp_ms <= ?",
        );
        let mut args: Vec<Value> = vec![
            Value::Text(language_pair.clone()),
            Value::Text(key.lemma.clone()),
            Value::Text(key.pos.clone()),
            Value::Text(key.event_type.as_str().to_string()),
            Value::Integer(range.start_ms),
            Value::Integer(range.end_ms),
        ];
        if let Some(corpus) = &scope.corpus_id {
            sql.push_str(" AND corpus_id = ?");
            args.push(Value::Text(corpus.clone()));
        }
        sql.push_str(" ORDER BY timestamp_ms, id");

        self.interact(move |conn| {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params_from_iter(args.iter()), |row| {
                Ok(UsageEvent {
                    language_pair: language_pair.clone(),
                    corpus_id: row.get(0)?,
                    lemma: key.lemma.clone(),
                    pos: key.pos.clone(),
                    feature_code: row.get(1)?,
                    event_type: key.event_type,
                    timestamp_ms: row.get(2)?,
                    char_index: row.get(3)?,
                })
            })?;

            let mut events = Vec::new();
            for row in rows {
                events.push(row?);
            }
            Ok(events)
        })
        .await
    }

    async fn time_bounds(&self, language_pair: &str) -> Result<Option<TimeRange>> {
        let language_pair = language_pair.to_string();

        self.interact(move |conn| {
            let (min, max): (Option<i64>, Option<i64>) = conn.query_row(
                "SELECT MIN(timestamp_ms), MAX(timestamp_ms)
                 FROM usage_event_log WHERE language_pair = ?1",
                params![language_pair],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )?;
            Ok(min.zip(max).map(|(start_ms, end_ms)| TimeRange { start_ms, end_ms }))
        })
        .await
    }

    async fn position_bounds(
        &self,
        language_pair: &str,
        corpus_id: &str,
    ) -> Result<Option<PositionRange>> {
        let language_pair = language_pair.to_string();
        let corpus_id = corpus_id.to_string();

        self.interact(move |conn| {
            let (min, max): (Option<i64>, Option<i64>) = conn.query_row(
                "SELECT MIN(char_index), MAX(char_index)
                 FROM usage_event_log
                 WHERE language_pair = ?1 AND corpus_id = ?2 AND char_index >= 0",
                params![language_pair, corpus_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )?;
            Ok(min.zip(max).map(|(first, last)| PositionRange { first, last }))
        })
        .await
    }
}
