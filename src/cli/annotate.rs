//! Annotate text files into markup

use super::helpers::build_annotator;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use uqureader_core::{augment::replace_atomically, ReaderConfig};

/// `<file>.morph.tsv` beside the input
pub fn output_path(input: &Path) -> PathBuf {
    let mut name = input.as_os_str().to_os_string();
    name.push(".morph.tsv");
    PathBuf::from(name)
}

/// Handle annotate command
pub async fn handle(
    files: Vec<PathBuf>,
    budget: Option<usize>,
    markup_files: Vec<PathBuf>,
    config: &ReaderConfig,
) -> anyhow::Result<()> {
    let annotator = build_annotator(config, &markup_files)?;
    let budget = budget.unwrap_or(config.remote.budget_chars);

    for file in &files {
        debug!("Annotating {}", file.display());
        let text = tokio::fs::read_to_string(file).await?;
        let markup = annotator.markup(&text, budget).await?;

        let output = output_path(file);
        replace_atomically(&output, &markup)?;
        info!("Wrote {}", output.display());
        println!("{}", output.display());
    }

    Ok(())
}
