//! Markup output format
//!
//! One line per token: `surface\tA;B;` when the token has usable analyses,
//! `surface\tError` when it has none. Lines are joined with `\n` and the
//! document has no trailing newline.

use super::analyzer::WordMarkup;
use serde::{Deserialize, Serialize};

/// Marker written in place of analyses for an unresolved token
pub const ERROR_MARKER: &str = "Error";

/// A token with the analyses the annotator settled on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotatedToken {
    pub surface: String,
    pub analyses: Vec<String>,
}

impl AnnotatedToken {
    pub fn new(surface: impl Into<String>, analyses: Vec<String>) -> Self {
        Self {
            surface: surface.into(),
            analyses,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.analyses.iter().any(|a| !a.trim().is_empty())
    }

    /// The `;`-joined analysis tag, or `None` for an unresolved token
    pub fn tag(&self) -> Option<String> {
        self.is_resolved()
            .then(|| render_analyses(self.analyses.iter().map(String::as_str)))
    }
}

impl From<WordMarkup> for AnnotatedToken {
    fn from(markup: WordMarkup) -> Self {
        Self::new(markup.word, markup.analyses)
    }
}

fn render_analyses<'a>(analyses: impl Iterator<Item = &'a str>) -> String {
    let mut out = String::new();
    for analysis in analyses.filter(|a| !a.trim().is_empty()) {
        out.push_str(analysis);
        out.push(';');
    }
    out
}

/// Format one token line
pub fn format_token(surface: &str, analyses: &[String]) -> String {
    let rendered = render_analyses(analyses.iter().map(String::as_str));
    if rendered.is_empty() {
        format!("{}\t{}", surface, ERROR_MARKER)
    } else {
        format!("{}\t{}", surface, rendered)
    }
}

/// Format a whole markup document
pub fn format_markup(tokens: &[AnnotatedToken]) -> String {
    tokens
        .iter()
        .map(|t| format_token(&t.surface, &t.analyses))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_two_analyses() {
        assert_eq!(
            format_token("token", &strings(&["комедия+N+Sg+Nom", "NR"])),
            "token\tкомедия+N+Sg+Nom;NR;"
        );
    }

    #[test]
    fn test_blank_analyses_format_as_error() {
        assert_eq!(format_token("token", &strings(&[" ", ""])), "token\tError");
        assert_eq!(format_token("token", &[]), "token\tError");
    }

    #[test]
    fn test_blank_candidates_dropped_between_usable_ones() {
        assert_eq!(
            format_token("иске", &strings(&["NR", "  ", "иске+Adj"])),
            "иске\tNR;иске+Adj;"
        );
    }

    #[test]
    fn test_document_lines() {
        let tokens = vec![
            AnnotatedToken::new("Комедия", strings(&["комедия+N+Sg+Nom"])),
            AnnotatedToken::new("1", strings(&["Num"])),
            AnnotatedToken::new("?", vec![]),
        ];
        assert_eq!(
            format_markup(&tokens),
            "Комедия\tкомедия+N+Sg+Nom;\n1\tNum;\n?\tError"
        );
    }

    #[test]
    fn test_tag_of_unresolved_token() {
        let token = AnnotatedToken::new("Рус", vec![" ".to_string()]);
        assert!(token.tag().is_none());

        let token = AnnotatedToken::new("бар", strings(&["бар+N+Sg+Nom", "бар+PN"]));
        assert_eq!(token.tag().as_deref(), Some("бар+N+Sg+Nom;бар+PN;"));
    }
}
