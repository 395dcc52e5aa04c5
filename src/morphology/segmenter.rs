//! Analysis segmenter
//!
//! Turns an analysis tag plus the token's surface text into a [`Morphology`]
//! whose segments line up with the surface. Construction is two-phase: the
//! tag is parsed into a [`MorphologyBuilder`] holding unresolved
//! [`FeatureSpec`]s, and only [`MorphologyBuilder::resolve`] produces the
//! immutable morphology with every feature's resolved text filled in.
//!
//! Lengths are measured in Unicode scalar values, never bytes.

use super::tag::{self, FeatureSpec, FIELD_SEPARATOR};
use crate::types::{Feature, Morphology};

/// Parse `tag` against `surface`
///
/// Uses the first candidate with at least two `+`-delimited fields and
/// returns `None` when no candidate has them. Never panics on malformed input.
pub fn parse(surface: &str, tag: &str) -> Option<Morphology> {
    MorphologyBuilder::from_tag(tag).map(|builder| builder.resolve(surface))
}

/// Parsed but not yet surface-aligned analysis
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MorphologyBuilder {
    lemma: String,
    pos: String,
    specs: Vec<FeatureSpec>,
    source_tag: String,
}

impl MorphologyBuilder {
    /// Parse the first analysis candidate of `tag` that has a lemma and POS
    pub fn from_tag(tag: &str) -> Option<Self> {
        let parts = tag::candidates(tag).find_map(candidate_fields)?;

        Some(Self {
            lemma: parts[0].to_string(),
            pos: parts[1].to_string(),
            specs: parts[2..].iter().map(|p| FeatureSpec::parse(p)).collect(),
            source_tag: tag.to_string(),
        })
    }

    pub fn lemma(&self) -> &str {
        &self.lemma
    }

    pub fn feature_specs(&self) -> &[FeatureSpec] {
        &self.specs
    }

    /// Align the parsed features with `surface` and freeze the result
    pub fn resolve(self, surface: &str) -> Morphology {
        let chars: Vec<char> = surface.chars().collect();
        let total_estimate: usize = self.specs.iter().map(FeatureSpec::estimated_len).sum();
        let base_len = chars.len().saturating_sub(total_estimate);

        let mut segments = vec![collect(&chars[..base_len])];
        let mut idx = base_len;
        let mut features = Vec::with_capacity(self.specs.len());

        for spec in self.specs {
            let resolved = resolve_variant(&chars, idx, &spec.variants);
            idx += resolved.chars().count();
            if !resolved.is_empty() {
                segments.push(resolved.clone());
            }
            features.push(Feature {
                code: spec.code,
                canonical_variants: spec.variants,
                resolved_text: resolved,
            });
        }

        if idx < chars.len() {
            let tail = collect(&chars[idx..]);
            if let Some(last) = segments.last_mut() {
                last.push_str(&tail);
            }
        }

        let feature_key = build_feature_key(&self.pos, &features);

        Morphology {
            lemma: self.lemma,
            pos: self.pos,
            features,
            segments,
            feature_key,
            source_tag: self.source_tag,
        }
    }
}

/// Pick the surface text a feature occupies starting at `idx`
///
/// The first variant that fits and matches case-insensitively wins; failing
/// that, the first variant's length is taken from the surface as-is.
fn resolve_variant(chars: &[char], idx: usize, variants: &[String]) -> String {
    let remaining = chars.len().saturating_sub(idx);

    for variant in variants.iter().filter(|v| !v.is_empty()) {
        let len = variant.chars().count();
        if len > remaining {
            continue;
        }
        let candidate = collect(&chars[idx..idx + len]);
        if candidate.to_lowercase() == variant.to_lowercase() {
            return candidate;
        }
    }

    let Some(first) = variants.first() else {
        return String::new();
    };
    let len = first.chars().count().min(remaining);
    collect(&chars[idx..idx + len])
}

fn build_feature_key(pos: &str, features: &[Feature]) -> String {
    let mut key = pos.to_string();
    for feature in features.iter().filter(|f| !f.code.is_empty()) {
        key.push(FIELD_SEPARATOR);
        key.push_str(&feature.code);
    }
    key
}

/// Lemma, POS and feature fields of one candidate, or `None` when it
/// lacks a lemma/POS pair (`NR`, bare markers)
fn candidate_fields(analysis: &str) -> Option<Vec<&str>> {
    if !analysis.contains(FIELD_SEPARATOR) {
        return None;
    }
    let mut parts: Vec<&str> = analysis.split(FIELD_SEPARATOR).collect();
    while parts.last().is_some_and(|p| p.is_empty()) {
        parts.pop();
    }
    (parts.len() >= 2).then_some(parts)
}

fn collect(chars: &[char]) -> String {
    chars.iter().collect()
}
