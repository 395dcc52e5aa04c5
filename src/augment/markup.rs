//! Translation column for tab-separated markup files
//!
//! A `token\tanalysis` line gains a third column listing translations per
//! analysis lemma, filtered by the candidate's part of speech:
//!
//! ```text
//! бар\tбар+N+Sg+Nom;бар+V;\tбар[N]: наличие | бар[V]: идти
//! ```
//!
//! Lines that already have a third column are never touched, which keeps
//! reruns byte-identical.

use super::{AugmentReport, FileOutcome, TranslationAugmenter};
use crate::error::Result;
use crate::morphology::tag::{self, FIELD_SEPARATOR};
use crate::storage::DictionaryEntry;

const COLUMN_SEPARATOR: char = '\t';
const GROUP_SEPARATOR: &str = " | ";
const ITEM_SEPARATOR: &str = ", ";

const PART_OF_SPEECH_TAGS: &[&str] = &[
    "N", "V", "ADJ", "ADV", "NUM", "PN", "PART", "PCL", "POST", "POSTP", "PROP", "CNJ", "CONJ",
    "MOD", "INTRJ", "INTERJ", "DET", "AUX", "PRON",
];

/// Dictionary tags accepted for an analysis POS; a trailing `*` is a prefix match
fn pos_equivalents(pos: &str) -> &'static [&'static str] {
    match pos {
        "N" => &["n", "np"],
        "V" => &["v"],
        "ADJ" => &["adj*"],
        "ADV" => &["adv*"],
        "NUM" => &["num*"],
        "PN" | "PRON" => &["prn*"],
        "PART" | "PCL" => &["part*", "pcl*"],
        "POST" | "POSTP" => &["post*"],
        "PROP" => &["np*"],
        "CNJ" | "CONJ" => &["cnj*"],
        "MOD" => &["mod*", "adv*"],
        "INTRJ" | "INTERJ" => &["ij*"],
        "DET" => &["det*"],
        "AUX" => &["aux*", "vbser"],
        _ => &[],
    }
}

/// One lemma of an analysis with the first POS field found after it
#[derive(Debug, Clone, PartialEq, Eq)]
struct LemmaCandidate {
    lemma: String,
    lookup: String,
    /// POS as written in the tag
    pos: Option<String>,
}

impl LemmaCandidate {
    fn pos_key(&self) -> Option<String> {
        self.pos.as_ref().map(|p| p.to_uppercase())
    }
}

fn parse_candidate(candidate: &str) -> Option<LemmaCandidate> {
    let lemma = tag::candidate_lemma(candidate)?;
    let pos = candidate
        .split(FIELD_SEPARATOR)
        .skip(1)
        .map(|field| {
            let field = field.trim();
            match field.find('(') {
                Some(idx) if idx > 0 => &field[..idx],
                _ => field,
            }
        })
        .find(|field| PART_OF_SPEECH_TAGS.contains(&field.to_uppercase().as_str()))
        .map(str::to_string);

    Some(LemmaCandidate {
        lemma: lemma.to_string(),
        lookup: lemma.to_lowercase(),
        pos,
    })
}

/// Distinct lemma/POS candidates of an analysis, first seen first
///
/// Bare markers such as `NR` or `Error` have no lemma and yield nothing.
fn lemma_candidates(analysis: &str) -> Vec<LemmaCandidate> {
    let mut candidates: Vec<LemmaCandidate> = Vec::new();
    for candidate in tag::candidates(analysis).filter_map(parse_candidate) {
        let duplicate = candidates
            .iter()
            .any(|c| c.lookup == candidate.lookup && c.pos_key() == candidate.pos_key());
        if !duplicate {
            candidates.push(candidate);
        }
    }
    candidates
}

fn matches_pos(pos: &str, tags: &[String]) -> bool {
    if tags.is_empty() {
        return false;
    }
    let equivalents = pos_equivalents(pos);
    if equivalents.is_empty() {
        return true;
    }
    equivalents.iter().any(|expected| match expected.strip_suffix('*') {
        Some(prefix) => tags.iter().any(|t| t.starts_with(prefix)),
        None => tags.iter().any(|t| t == expected),
    })
}

/// Translations for one candidate
///
/// Without a POS every translation is kept. With one, entries tagged for
/// that POS win; if none match, untagged dictionaries still give all
/// translations while tagged ones give nothing.
fn select_translations(entries: &[DictionaryEntry], pos: Option<&str>) -> Vec<String> {
    let mut all: Vec<String> = Vec::new();
    let mut filtered: Vec<String> = Vec::new();
    for entry in entries {
        let translation = entry.translation.trim();
        if translation.is_empty() {
            continue;
        }
        if !all.iter().any(|t| t == translation) {
            all.push(translation.to_string());
        }
        if let Some(pos) = pos {
            if matches_pos(pos, &entry.tags) && !filtered.iter().any(|t| t == translation) {
                filtered.push(translation.to_string());
            }
        }
    }

    match pos {
        None => all,
        Some(_) if !filtered.is_empty() => filtered,
        Some(_) if entries.iter().all(|e| e.tags.is_empty()) => all,
        Some(_) => Vec::new(),
    }
}

/// Number of translations listed in an existing third column
fn written_translations(column: &str) -> usize {
    column
        .split(GROUP_SEPARATOR)
        .filter_map(|group| group.split_once(": "))
        .map(|(_, items)| {
            items
                .split(ITEM_SEPARATOR)
                .filter(|t| !t.trim().is_empty())
                .count()
        })
        .sum()
}

impl<'a> TranslationAugmenter<'a> {
    /// Augment the text of one markup file
    pub(super) fn augment_markup_text(&mut self, original: &str) -> Result<FileOutcome> {
        let mut report = AugmentReport::default();
        let mut changed = false;
        let mut lines = Vec::new();

        for raw in original.split('\n') {
            let (line, carriage_return) = match raw.strip_suffix('\r') {
                Some(stripped) => (stripped, "\r"),
                None => (raw, ""),
            };
            let columns: Vec<&str> = line.split(COLUMN_SEPARATOR).collect();
            if columns.len() < 2 {
                lines.push(raw.to_string());
                continue;
            }
            report.tokens_processed += 1;

            if columns.len() > 2 {
                let count = written_translations(columns[2]);
                if count > 0 {
                    report.tokens_with_translations += 1;
                    report.translations_written += count;
                }
                lines.push(raw.to_string());
                continue;
            }

            let (column, count) = self.translation_column(columns[1])?;
            if count == 0 {
                lines.push(raw.to_string());
                continue;
            }

            report.tokens_with_translations += 1;
            report.translations_written += count;
            lines.push(format!(
                "{}{}{}{}",
                line, COLUMN_SEPARATOR, column, carriage_return
            ));
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

    /// Third-column text for `analysis` and the number of translations in it
    fn translation_column(&mut self, analysis: &str) -> Result<(String, usize)> {
        let mut groups = Vec::new();
        let mut count = 0;

        for candidate in lemma_candidates(analysis) {
            let translations = {
                let entries = self.entries_for(&candidate.lookup)?;
                select_translations(entries, candidate.pos_key().as_deref())
            };
            if translations.is_empty() {
                continue;
            }
            count += translations.len();

            let head = match &candidate.pos {
                Some(pos) => format!("{}[{}]", candidate.lemma, pos),
                None => candidate.lemma.clone(),
            };
            groups.push(format!("{}: {}", head, translations.join(ITEM_SEPARATOR)));
        }

        Ok((groups.join(GROUP_SEPARATOR), count))
    }

    fn entries_for(&mut self, lookup: &str) -> Result<&[DictionaryEntry]> {
        if !self.entry_cache.contains_key(lookup) {
            let entries = self.dictionary.entries(lookup)?;
            self.entry_cache.insert(lookup.to_string(), entries);
        }
        Ok(self
            .entry_cache
            .get(lookup)
            .map(Vec::as_slice)
            .unwrap_or_default())
    }
}
