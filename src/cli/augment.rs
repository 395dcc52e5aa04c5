//! Add dictionary translations to a corpus directory

use anyhow::Context;
use std::path::PathBuf;
use tracing::debug;
use uqureader_core::{augment::augment, SqliteDictionary};

/// Handle augment command
pub async fn handle(corpus_dir: PathBuf, dictionary: PathBuf) -> anyhow::Result<()> {
    debug!(
        "Augmenting {} with {}",
        corpus_dir.display(),
        dictionary.display()
    );

    // Dictionary reads and file rewrites are blocking
    let report = tokio::task::spawn_blocking(move || {
        let dictionary = SqliteDictionary::open(&dictionary)?;
        augment(&corpus_dir, &dictionary)
    })
    .await
    .context("Augmentation task panicked")??;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
