//! Read-time session over one corpus
//!
//! Ties parsed corpus tokens to the memory model and usage ledger: computes
//! where each token sits in the running text, how strongly it should be
//! highlighted, and records the reader's exposures, lookups and feature
//! views.

use crate::config::MemoryConfig;
use crate::error::{ReaderError, Result};
use crate::ledger::UsageLedger;
use crate::memory::{highlight_weight, MemoryModel};
use crate::types::{EventType, MemoryRecord, Morphology, Token};
use std::collections::HashSet;
use std::ops::Range;

/// Highlight state of one token
#[derive(Debug, Clone, PartialEq)]
pub struct Highlight {
    pub index: usize,
    /// Character range of the surface in the running text
    pub span: Range<usize>,
    /// `None` for tokens without morphology, which are never highlighted
    pub weight: Option<f64>,
}

/// One reader's pass over a corpus
pub struct ReadingSession {
    tokens: Vec<Token>,
    spans: Vec<Range<usize>>,
    memory: MemoryModel,
    ledger: UsageLedger,
    half_life_days: f64,
    lookup_increment: f64,
    exposed: HashSet<usize>,
}

impl ReadingSession {
    pub fn new(
        tokens: Vec<Token>,
        memory: MemoryModel,
        ledger: UsageLedger,
        settings: &MemoryConfig,
    ) -> Self {
        let mut spans = Vec::with_capacity(tokens.len());
        let mut offset = 0usize;
        for token in &tokens {
            offset += token.prefix.chars().count();
            let start = offset;
            offset += token.surface.chars().count();
            spans.push(start..offset);
        }

        Self {
            tokens,
            spans,
            memory,
            ledger,
            half_life_days: settings.half_life_days,
            lookup_increment: settings.lookup_increment,
            exposed: HashSet::new(),
        }
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Running text: every prefix followed by its surface
    pub fn text(&self) -> String {
        self.tokens
            .iter()
            .flat_map(|t| [t.prefix.as_str(), t.surface.as_str()])
            .collect()
    }

    pub fn span(&self, index: usize) -> Option<Range<usize>> {
        self.spans.get(index).cloned()
    }

    /// Token whose surface covers character offset `offset`
    pub fn token_at(&self, offset: usize) -> Option<usize> {
        let index = self.spans.partition_point(|span| span.end <= offset);
        self.spans
            .get(index)
            .filter(|span| span.contains(&offset))
            .map(|_| index)
    }

    /// Current highlight weight of every token
    pub async fn highlights(&self, now_ms: i64) -> Result<Vec<Highlight>> {
        let mut highlights = Vec::with_capacity(self.tokens.len());
        for (index, token) in self.tokens.iter().enumerate() {
            let weight = match &token.morphology {
                Some(morph) => {
                    let strength = self
                        .memory
                        .current_strength(
                            &morph.lemma,
                            &morph.feature_key,
                            now_ms,
                            self.half_life_days,
                        )
                        .await?;
                    Some(highlight_weight(strength))
                }
                None => None,
            };
            highlights.push(Highlight {
                index,
                span: self.spans[index].clone(),
                weight,
            });
        }
        Ok(highlights)
    }

    /// Log that the token at `index` was shown; once per session per token
    ///
    /// Returns whether an event was written.
    pub async fn record_exposure(&mut self, index: usize, now_ms: i64) -> Result<bool> {
        let (morph, start) = self.morphology_at(index)?;
        let Some(morph) = morph else {
            return Ok(false);
        };
        if self.exposed.contains(&index) {
            return Ok(false);
        }

        self.ledger
            .record_event(
                &morph.lemma,
                &morph.pos,
                None,
                EventType::Exposure,
                now_ms,
                Some(start),
            )
            .await?;
        self.exposed.insert(index);
        Ok(true)
    }

    /// Log a lookup of the token at `index` and reinforce its memory
    ///
    /// An exposure is logged first if the token has not been exposed yet.
    /// Returns the reinforced record, or `None` for tokens without
    /// morphology.
    pub async fn record_lookup(
        &mut self,
        index: usize,
        now_ms: i64,
    ) -> Result<Option<MemoryRecord>> {
        self.record_exposure(index, now_ms).await?;

        let (morph, start) = self.morphology_at(index)?;
        let Some(morph) = morph else {
            return Ok(None);
        };

        self.ledger
            .record_event(
                &morph.lemma,
                &morph.pos,
                None,
                EventType::Lookup,
                now_ms,
                Some(start),
            )
            .await?;

        let record = self
            .memory
            .reinforce(
                &morph.lemma,
                &morph.feature_key,
                now_ms,
                self.lookup_increment,
            )
            .await?;
        Ok(Some(record))
    }

    /// Log that the reader opened the details of one feature of a token
    pub async fn record_feature_view(
        &mut self,
        index: usize,
        feature_code: &str,
        now_ms: i64,
    ) -> Result<bool> {
        let (morph, start) = self.morphology_at(index)?;
        let Some(morph) = morph else {
            return Ok(false);
        };
        if !morph.feature_codes().any(|code| code == feature_code) {
            return Err(ReaderError::Validation(format!(
                "token {} has no feature {}",
                index, feature_code
            )));
        }

        self.ledger
            .record_event(
                &morph.lemma,
                &morph.pos,
                Some(feature_code),
                EventType::Feature,
                now_ms,
                Some(start),
            )
            .await?;
        Ok(true)
    }

    fn morphology_at(&self, index: usize) -> Result<(Option<Morphology>, usize)> {
        let token = self.tokens.get(index).ok_or_else(|| {
            ReaderError::Validation(format!(
                "token index {} out of range ({} tokens)",
                index,
                self.tokens.len()
            ))
        })?;
        Ok((token.morphology.clone(), self.spans[index].start))
    }
}
