//! Raw event timeline for one lemma

use super::helpers::{format_timestamp, open_ledger};
use uqureader_core::{
    types::{TimeRange, TimelineKey},
    EventType, ReaderConfig, StatsScope,
};

/// Handle timeline command
#[allow(clippy::too_many_arguments)]
pub async fn handle(
    lemma: String,
    pos: String,
    event: String,
    corpus: Option<String>,
    from_ms: Option<i64>,
    to_ms: Option<i64>,
    format: String,
    config: &ReaderConfig,
    db_path: Option<String>,
) -> anyhow::Result<()> {
    let event_type: EventType = event.parse().map_err(|e: String| anyhow::anyhow!(e))?;
    let ledger = open_ledger(config, db_path, corpus.as_deref().unwrap_or_default()).await?;

    let mut scope = StatsScope::new(ledger.language_pair());
    if let Some(corpus) = corpus {
        scope = scope.with_corpus(corpus);
    }
    let all = TimeRange::all();
    let range = TimeRange {
        start_ms: from_ms.unwrap_or(all.start_ms),
        end_ms: to_ms.unwrap_or(all.end_ms),
    };
    if range.start_ms > range.end_ms {
        anyhow::bail!("--from must not be after --to");
    }

    let key = TimelineKey {
        lemma,
        pos,
        event_type,
    };
    let events = ledger.query_timeline(&scope, &key, range).await?;

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&events)?);
        return Ok(());
    }

    for event in &events {
        println!(
            "{}  {:<12} {:>7}  {}",
            format_timestamp(event.timestamp_ms),
            event.corpus_id,
            event.char_index,
            event.feature_code
        );
    }
    println!();
    println!("{} events for {}+{} ({})", events.len(), key.lemma, key.pos, key.event_type);
    Ok(())
}
