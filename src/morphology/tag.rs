//! Analysis tag wire format
//!
//! A tag looks like `LEMMA+POS+FEATURE...`, where each feature is either a
//! bare code or `CODE(variant1/variant2/...)`. Several whole analyses for one
//! token may be joined with `;`, usually with a trailing `;`.

/// Candidate separator between whole analyses
pub const CANDIDATE_SEPARATOR: char = ';';

/// Field separator inside one analysis
pub const FIELD_SEPARATOR: char = '+';

/// Unresolved feature as written in the tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureSpec {
    pub code: String,
    pub variants: Vec<String>,
}

impl FeatureSpec {
    /// Parse `CODE(A/B/C)` or a bare `CODE`
    pub fn parse(spec: &str) -> Self {
        if let Some(paren) = spec.find('(') {
            if spec.ends_with(')') && paren < spec.len() - 1 {
                let code = &spec[..paren];
                let inner = &spec[paren + 1..spec.len() - 1];
                return Self {
                    code: code.to_string(),
                    variants: split_variants(inner),
                };
            }
        }

        Self {
            code: spec.to_string(),
            variants: Vec::new(),
        }
    }

    /// Length the feature is expected to occupy: its first variant, in chars
    pub fn estimated_len(&self) -> usize {
        self.variants
            .first()
            .map(|v| v.chars().count())
            .unwrap_or(0)
    }
}

fn split_variants(inner: &str) -> Vec<String> {
    if inner.is_empty() {
        return Vec::new();
    }
    let mut variants: Vec<String> = inner.split('/').map(str::to_string).collect();
    while variants.last().is_some_and(|v| v.is_empty()) {
        variants.pop();
    }
    variants
}

/// Non-blank analysis candidates of a tag, trimmed, in order
pub fn candidates(tag: &str) -> impl Iterator<Item = &str> {
    tag.split(CANDIDATE_SEPARATOR)
        .map(str::trim)
        .filter(|c| !c.is_empty())
}

/// Lemma field of one candidate, if the candidate has one
///
/// A candidate without a `+` (e.g. `NR`, `Type1`) is a bare classification
/// and carries no lemma.
pub fn candidate_lemma(candidate: &str) -> Option<&str> {
    let plus = candidate.find(FIELD_SEPARATOR)?;
    if plus == 0 {
        return None;
    }
    let lemma = candidate[..plus].trim();
    (!lemma.is_empty()).then_some(lemma)
}

/// Distinct lowercase lemmas across every candidate of a tag, first seen first
pub fn distinct_lemmas(tag: &str) -> Vec<String> {
    let mut lemmas: Vec<String> = Vec::new();
    for candidate in candidates(tag) {
        if let Some(lemma) = candidate_lemma(candidate) {
            let lemma = lemma.to_lowercase();
            if !lemmas.contains(&lemma) {
                lemmas.push(lemma);
            }
        }
    }
    lemmas
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_spec_with_variants() {
        let spec = FeatureSpec::parse("PL(лар/ләр/нар/нәр)");
        assert_eq!(spec.code, "PL");
        assert_eq!(spec.variants, vec!["лар", "ләр", "нар", "нәр"]);
        assert_eq!(spec.estimated_len(), 3);
    }

    #[test]
    fn test_feature_spec_bare_code() {
        let spec = FeatureSpec::parse("Sg");
        assert_eq!(spec.code, "Sg");
        assert!(spec.variants.is_empty());
        assert_eq!(spec.estimated_len(), 0);
    }

    #[test]
    fn test_feature_spec_unclosed_paren_is_bare() {
        let spec = FeatureSpec::parse("DIR(га");
        assert_eq!(spec.code, "DIR(га");
        assert!(spec.variants.is_empty());
    }

    #[test]
    fn test_feature_spec_empty_parens() {
        let spec = FeatureSpec::parse("POSS_3()");
        assert_eq!(spec.code, "POSS_3");
        assert!(spec.variants.is_empty());
    }

    #[test]
    fn test_candidates_skip_blanks() {
        let parts: Vec<&str> = candidates("бар+N+Sg+Nom; ;бар+PN;").collect();
        assert_eq!(parts, vec!["бар+N+Sg+Nom", "бар+PN"]);
    }

    #[test]
    fn test_distinct_lemmas() {
        assert_eq!(distinct_lemmas("бар+N+Sg+Nom;бар+PN;"), vec!["бар"]);
        assert_eq!(distinct_lemmas("Бу+PN;бу+Adv"), vec!["бу"]);
        assert!(distinct_lemmas("Rus").is_empty());
        assert!(distinct_lemmas("+N").is_empty());
    }
}
