//! Local dictionary analyzer
//!
//! Backed by markup files of `surface\tanalysis` lines, keyed by the literal
//! surface form. Used when the remote analyzer is unreachable or returns
//! nothing usable for a token. Lookups are synchronous and read-only, so one
//! instance can be shared across tasks behind an `Arc`.

use super::analyzer::{TokenAnalyzer, WordMarkup};
use crate::error::{ReaderError, Result};
use crate::morphology::tag;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

static SEPARATOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"[\s.,!?“”„‘«»≪≫{}()\[\]:;'"+=*—_^…|/\\]|[0-9]+"#)
        .expect("separator pattern is valid")
});
static DIGITS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]+$").expect("digits pattern is valid"));
static LATIN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z]+$").expect("latin pattern is valid"));
static SINGLE_LETTER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[а-эА-ЭөүһңҗҺҮӨҖҢӘЁё]$").expect("letter pattern is valid")
});
static NON_CYRILLIC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^а-яА-ЯөүһңҗәҺҮӨҖҢӘЁё]+$").expect("non-cyrillic pattern is valid")
});

/// Dictionary-backed analyzer of last resort
#[derive(Debug, Clone, Default)]
pub struct FallbackAnalyzer {
    entries: HashMap<String, Vec<String>>,
}

impl FallbackAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from markup text
    pub fn from_markup(markup: &str) -> Result<Self> {
        let mut analyzer = Self::new();
        analyzer.load_markup(markup)?;
        Ok(analyzer)
    }

    /// Build from one or more markup files, in order
    pub fn from_files<P: AsRef<Path>>(paths: &[P]) -> Result<Self> {
        let mut analyzer = Self::new();
        for path in paths {
            let path = path.as_ref();
            let markup = std::fs::read_to_string(path).map_err(|e| {
                ReaderError::Config(format!(
                    "Failed to read markup dictionary {}: {}",
                    path.display(),
                    e
                ))
            })?;
            analyzer.load_markup(&markup)?;
            debug!(
                "Loaded markup dictionary {} ({} surfaces)",
                path.display(),
                analyzer.len()
            );
        }
        Ok(analyzer)
    }

    /// Add every `surface\tanalysis` line; repeated surfaces keep all
    /// candidates in file order
    pub fn load_markup(&mut self, markup: &str) -> Result<()> {
        for (index, line) in markup.lines().enumerate() {
            let line = line.trim_end_matches('\r');
            if line.is_empty() {
                continue;
            }
            let (surface, analysis) =
                line.split_once('\t')
                    .ok_or_else(|| ReaderError::InvalidRecord {
                        line: index + 1,
                        message: "expected surface<TAB>analysis".to_string(),
                    })?;
            self.insert(surface, analysis);
        }
        Ok(())
    }

    pub fn insert(&mut self, surface: impl Into<String>, analysis: impl Into<String>) {
        let analysis = analysis.into();
        if analysis.trim().is_empty() {
            return;
        }
        let candidates = self.entries.entry(surface.into()).or_default();
        if !candidates.contains(&analysis) {
            candidates.push(analysis);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Best analysis for `token`, or `None` when nothing is known about it
    ///
    /// Dictionary candidates carrying a translation gloss win over bare
    /// tags; otherwise the first candidate in dictionary order wins. Tokens
    /// missing from the dictionary are still classified when they are
    /// numbers, punctuation, or non-Cyrillic.
    pub fn lookup(&self, token: &str) -> Option<String> {
        if let Some(candidates) = self.entries.get(token) {
            let chosen = candidates
                .iter()
                .find(|c| has_gloss(c))
                .or_else(|| candidates.first());
            if let Some(chosen) = chosen {
                return Some(chosen.clone());
            }
        }
        classify(token).map(str::to_string)
    }

    /// Analyses for `token` as separate candidates, empty when unresolved
    pub fn lookup_analyses(&self, token: &str) -> Vec<String> {
        self.lookup(token)
            .map(|found| tag::candidates(&found).map(str::to_string).collect())
            .unwrap_or_default()
    }

    /// Analyse text entirely locally
    pub fn analyze_text(&self, text: &str) -> Vec<WordMarkup> {
        tokenize(text)
            .into_iter()
            .map(|token| WordMarkup::new(token, self.lookup_analyses(token)))
            .collect()
    }
}

#[async_trait]
impl TokenAnalyzer for FallbackAnalyzer {
    async fn analyze_batch(&self, batch: &str) -> Result<Vec<WordMarkup>> {
        Ok(self.analyze_text(batch))
    }

    fn name(&self) -> &str {
        "local"
    }
}

/// A gloss is attached as `lemma: translation` text
fn has_gloss(candidate: &str) -> bool {
    candidate.contains(':')
}

/// Split text into word tokens
///
/// Punctuation, symbols and digit runs become tokens of their own;
/// whitespace separates tokens but is never one.
pub fn tokenize(text: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut last = 0;
    for m in SEPARATOR.find_iter(text) {
        if m.start() > last {
            tokens.push(&text[last..m.start()]);
        }
        tokens.push(m.as_str());
        last = m.end();
    }
    if last < text.len() {
        tokens.push(&text[last..]);
    }
    tokens.retain(|t| !t.trim().is_empty());
    tokens
}

/// Class tag for tokens that are not dictionary words
pub fn classify(token: &str) -> Option<&'static str> {
    if token.is_empty() {
        return None;
    }
    if DIGITS.is_match(token) {
        return Some("Num");
    }
    let class = match token {
        "." | "!" | "?" | "…" => Some("Type1"),
        "," | ":" | ";" | "—" | "–" | "-" | "_" => Some("Type2"),
        "(" | ")" | "[" | "]" | "{" | "}" => Some("Type3"),
        "“" | "”" | "\"" | "'" | "»" | "«" | "≪" | "≫" | "„" | "‘" => Some("Type4"),
        _ => None,
    };
    if class.is_some() {
        return class;
    }
    if SINGLE_LETTER.is_match(token) {
        return Some("Letter");
    }
    if LATIN.is_match(token) {
        return Some("Latin");
    }
    if NON_CYRILLIC.is_match(token) {
        return Some("Sign");
    }
    None
}
