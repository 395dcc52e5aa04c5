//! Translation augmentation of stored corpus files
//!
//! Adds a `translations` list to every token record (`*.jsonl`) that has
//! none, using the lemmas of all analysis candidates. Markup files
//! (`*.morph.tsv`) get a translation column instead, see [`markup`].
//! Entries that already carry translations are left byte-for-byte as they
//! are but still counted, so a second run over augmented files reports the
//! same numbers and writes nothing. Each file is rebuilt in memory and
//! swapped in with one atomic rename.

mod markup;

use crate::corpus::{parse_line, to_line};
use crate::error::{ReaderError, Result};
use crate::morphology::tag;
use crate::storage::{Dictionary, DictionaryEntry};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

const TRANSLATIONS_KEY: &str = "translations";
const ANALYSIS_KEY: &str = "analysis";
const RECORDS_EXTENSION: &str = "jsonl";
const MARKUP_SUFFIX: &str = ".morph.tsv";

/// Counts for one augmentation run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AugmentReport {
    /// Files with at least one token record
    pub files_processed: usize,
    pub tokens_processed: usize,
    /// Records that carry a non-empty translation list afterwards
    pub tokens_with_translations: usize,
    /// Total entries across those lists
    pub translations_written: usize,
}

impl AugmentReport {
    fn add(&mut self, other: &AugmentReport) {
        self.files_processed += other.files_processed;
        self.tokens_processed += other.tokens_processed;
        self.tokens_with_translations += other.tokens_with_translations;
        self.translations_written += other.translations_written;
    }
}

/// Augment every `*.jsonl` and `*.morph.tsv` file directly inside `corpus_dir`
pub fn augment(corpus_dir: &Path, dictionary: &dyn Dictionary) -> Result<AugmentReport> {
    TranslationAugmenter::new(dictionary).augment_dir(corpus_dir)
}

/// Stateful augmenter; caches dictionary answers for the whole run
pub struct TranslationAugmenter<'a> {
    dictionary: &'a dyn Dictionary,
    cache: HashMap<String, Vec<String>>,
    entry_cache: HashMap<String, Vec<DictionaryEntry>>,
}

struct FileOutcome {
    content: String,
    changed: bool,
    report: AugmentReport,
}

impl<'a> TranslationAugmenter<'a> {
    pub fn new(dictionary: &'a dyn Dictionary) -> Self {
        Self {
            dictionary,
            cache: HashMap::new(),
            entry_cache: HashMap::new(),
        }
    }

    pub fn augment_dir(&mut self, corpus_dir: &Path) -> Result<AugmentReport> {
        let files = corpus_files(corpus_dir)?;
        info!(
            "Augmenting {} corpus files in {}",
            files.len(),
            corpus_dir.display()
        );

        let mut report = AugmentReport::default();
        for path in files {
            let file_report = self.augment_file(&path)?;
            report.add(&file_report);
        }

        info!(
            "Augmentation finished: {} files, {} tokens, {} with translations, {} translations",
            report.files_processed,
            report.tokens_processed,
            report.tokens_with_translations,
            report.translations_written
        );
        Ok(report)
    }

    /// Augment one file, replacing it atomically when anything changed
    pub fn augment_file(&mut self, path: &Path) -> Result<AugmentReport> {
        let original = std::fs::read_to_string(path)?;
        let outcome = if is_markup(path) {
            self.augment_markup_text(&original)
        } else {
            self.augment_text(&original)
        }
        .map_err(|e| match e {
                ReaderError::InvalidRecord { line, message } => ReaderError::InvalidRecord {
                    line,
                    message: format!("{}: {}", path.display(), message),
                },
                other => other,
            })?;

        if outcome.changed {
            replace_atomically(path, &outcome.content)?;
            debug!("Rewrote {}", path.display());
        } else {
            debug!("{} already up to date", path.display());
        }
        Ok(outcome.report)
    }

    fn augment_text(&mut self, original: &str) -> Result<FileOutcome> {
        let mut report = AugmentReport::default();
        let mut changed = false;
        let mut lines = Vec::new();

        for (index, raw) in original.split('\n').enumerate() {
            let (line, carriage_return) = match raw.strip_suffix('\r') {
                Some(stripped) => (stripped, "\r"),
                None => (raw, ""),
            };
            if line.trim().is_empty() {
                lines.push(raw.to_string());
                continue;
            }

            let mut record = parse_line(line, index + 1)?;
            report.tokens_processed += 1;

            if let Some(existing) = record.get(TRANSLATIONS_KEY) {
                let count = existing.as_array().map_or(0, Vec::len);
                if count > 0 {
                    report.tokens_with_translations += 1;
                    report.translations_written += count;
                }
                lines.push(raw.to_string());
                continue;
            }

            let analysis = record
                .get(ANALYSIS_KEY)
                .and_then(Value::as_str)
                .unwrap_or_default();
            let translations = self.translations_for(analysis)?;
            if translations.is_empty() {
                lines.push(raw.to_string());
                continue;
            }

            report.tokens_with_translations += 1;
            report.translations_written += translations.len();
            record.insert(
                TRANSLATIONS_KEY.to_string(),
                Value::Array(translations.into_iter().map(Value::String).collect()),
            );
            lines.push(format!("{}{}", to_line(&record)?, carriage_return));
            changed = true;
        }

        if report.tokens_processed > 0 {
            report.files_processed = 1;
        }

        Ok(FileOutcome {
            content: lines.join("\n"),
            changed,
            report,
        })
    }

    /// Translations of every lemma in `analysis`, first seen first
    fn translations_for(&mut self, analysis: &str) -> Result<Vec<String>> {
        let mut translations: Vec<String> = Vec::new();
        for lemma in tag::distinct_lemmas(analysis) {
            if !self.cache.contains_key(&lemma) {
                let found = self.dictionary.translations(&lemma)?;
                self.cache.insert(lemma.clone(), found);
            }
            if let Some(found) = self.cache.get(&lemma) {
                for translation in found {
                    if !translations.contains(translation) {
                        translations.push(translation.clone());
                    }
                }
            }
        }
        Ok(translations)
    }
}

fn is_markup(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.ends_with(MARKUP_SUFFIX))
}

/// Record and markup files directly inside `dir`, sorted by name
fn corpus_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let records = path.extension().is_some_and(|ext| ext == RECORDS_EXTENSION);
        if path.is_file() && (records || is_markup(&path)) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Write `content` beside `path` and rename it over `path`
pub fn replace_atomically(path: &Path, content: &str) -> Result<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut temp = NamedTempFile::new_in(dir)?;
    temp.write_all(content.as_bytes())?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| ReaderError::Io(e.error))?;
    Ok(())
}
