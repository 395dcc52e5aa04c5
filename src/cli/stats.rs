//! Usage statistics report

use super::helpers::{format_timestamp, open_ledger};
use uqureader_core::{types::StatKind, ReaderConfig, StatsScope};

/// Handle stats command
pub async fn handle(
    corpus: Option<String>,
    features: bool,
    format: String,
    config: &ReaderConfig,
    db_path: Option<String>,
) -> anyhow::Result<()> {
    let ledger = open_ledger(config, db_path, corpus.as_deref().unwrap_or_default()).await?;
    let mut scope = StatsScope::new(ledger.language_pair());
    if let Some(corpus) = corpus {
        scope = scope.with_corpus(corpus);
    }
    let kind = if features {
        StatKind::Feature
    } else {
        StatKind::Lemma
    };

    let stats = ledger.query_stats(&scope, kind).await?;

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    if stats.is_empty() {
        println!("No usage recorded for {}", scope.language_pair);
        return Ok(());
    }

    for stat in &stats {
        let feature = if stat.feature_code.is_empty() {
            String::new()
        } else {
            format!(" [{}]", stat.feature_code)
        };
        println!(
            "{:<20} {:<6}{} {:<9} {:>5}  last {} @ {}",
            stat.lemma,
            stat.pos,
            feature,
            stat.event_type,
            stat.count,
            format_timestamp(stat.last_seen_ms),
            stat.last_position
        );
    }
    println!();
    println!("{} rows", stats.len());
    Ok(())
}
