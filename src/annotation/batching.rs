//! Splitting text into remote-analyzer-safe batches
//!
//! Text is cut into sentence-like units, which are packed greedily into
//! batches no longer than the character budget. A unit that is longer than
//! the budget on its own is split at whitespace. Every cut happens at
//! whitespace, so the sequence of whitespace-delimited tokens across all
//! batches equals the sequence in the input.

use crate::error::{ReaderError, Result};

/// Default per-request limit of the remote analyzer, in characters
pub const DEFAULT_BUDGET_CHARS: usize = 500;

/// Batch size policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchPolicy {
    budget_chars: usize,
}

impl Default for BatchPolicy {
    fn default() -> Self {
        Self {
            budget_chars: DEFAULT_BUDGET_CHARS,
        }
    }
}

impl BatchPolicy {
    pub fn new(budget_chars: usize) -> Result<Self> {
        if budget_chars == 0 {
            return Err(ReaderError::Validation(
                "Batch budget must be positive".to_string(),
            ));
        }
        Ok(Self { budget_chars })
    }

    pub fn budget_chars(&self) -> usize {
        self.budget_chars
    }

    /// Split `text` into batches
    ///
    /// Whole units are joined with `\n`, pieces of an oversized unit with a
    /// single space. A single token longer than the budget becomes a batch of
    /// its own, since it cannot be cut without breaking it.
    pub fn split(&self, text: &str) -> Vec<String> {
        let mut batches = Vec::new();
        let mut current = String::new();
        let mut current_len = 0usize;

        for unit in split_sentences(text) {
            let unit = unit.trim();
            if unit.is_empty() {
                continue;
            }
            let unit_len = unit.chars().count();

            if unit_len > self.budget_chars {
                if !current.is_empty() {
                    batches.push(std::mem::take(&mut current));
                    current_len = 0;
                }
                batches.extend(self.split_oversized(unit));
                continue;
            }

            if current.is_empty() {
                current.push_str(unit);
                current_len = unit_len;
            } else if current_len + 1 + unit_len <= self.budget_chars {
                current.push('\n');
                current.push_str(unit);
                current_len += 1 + unit_len;
            } else {
                batches.push(std::mem::replace(&mut current, unit.to_string()));
                current_len = unit_len;
            }
        }

        if !current.is_empty() {
            batches.push(current);
        }
        batches
    }

    fn split_oversized(&self, unit: &str) -> Vec<String> {
        let mut pieces = Vec::new();
        let mut current = String::new();
        let mut current_len = 0usize;

        for word in unit.split_whitespace() {
            let word_len = word.chars().count();
            if current.is_empty() {
                current.push_str(word);
                current_len = word_len;
            } else if current_len + 1 + word_len <= self.budget_chars {
                current.push(' ');
                current.push_str(word);
                current_len += 1 + word_len;
            } else {
                pieces.push(std::mem::replace(&mut current, word.to_string()));
                current_len = word_len;
            }
        }

        if !current.is_empty() {
            pieces.push(current);
        }
        pieces
    }
}

fn is_terminal(c: char) -> bool {
    matches!(c, '.' | '!' | '?' | '…')
}

fn is_closer(c: char) -> bool {
    matches!(c, '»' | '"' | '”' | '’' | '\'' | ')' | ']' | '≫')
}

/// Cut text after sentence punctuation that is followed by whitespace, and
/// at every line break
fn split_sentences(text: &str) -> Vec<&str> {
    let mut units = Vec::new();
    let mut start = 0usize;
    let mut after_terminal = false;

    for (i, c) in text.char_indices() {
        if c == '\n' {
            units.push(&text[start..i]);
            start = i + c.len_utf8();
            after_terminal = false;
            continue;
        }
        if is_terminal(c) {
            after_terminal = true;
            continue;
        }
        if after_terminal && is_closer(c) {
            continue;
        }
        if after_terminal && c.is_whitespace() {
            units.push(&text[start..i]);
            start = i;
        }
        after_terminal = false;
    }

    if start < text.len() {
        units.push(&text[start..]);
    }
    units
}
