//! Corpus record files
//!
//! A corpus file is JSON Lines, one token per line:
//!
//! ```text
//! {"prefix": " ", "surface": "китап", "analysis": "китап+N+Sg+Nom;", "translations": ["книга"]}
//! ```
//!
//! Lines are written with `", "` between members and `": "` after keys,
//! keeping the record's key order.

use crate::error::{ReaderError, Result};
use crate::morphology;
use crate::types::Token;
use serde::{Deserialize, Serialize};
use serde_json::ser::Formatter;
use serde_json::Value;
use std::io;
use std::path::Path;

/// One stored token record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
    #[serde(default)]
    pub prefix: String,
    pub surface: String,
    #[serde(default)]
    pub analysis: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translations: Option<Vec<String>>,
}

impl TokenRecord {
    /// Token with its morphology parsed from the analysis tag
    pub fn into_token(self) -> Token {
        let analysis_tag = (!self.analysis.trim().is_empty()).then_some(self.analysis);
        let morphology = analysis_tag
            .as_deref()
            .and_then(|tag| morphology::parse(&self.surface, tag));
        Token {
            prefix: self.prefix,
            surface: self.surface,
            analysis_tag,
            morphology,
            translations: self.translations,
        }
    }
}

impl From<&Token> for TokenRecord {
    fn from(token: &Token) -> Self {
        Self {
            prefix: token.prefix.clone(),
            surface: token.surface.clone(),
            analysis: token.analysis_tag.clone().unwrap_or_default(),
            translations: token.translations.clone(),
        }
    }
}

/// JSON formatter writing `", "` and `": "` separators on one line
struct SpacedFormatter;

impl Formatter for SpacedFormatter {
    fn begin_array_value<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        writer.write_all(b": ")
    }
}

/// Render any serialisable value as one corpus line
pub fn to_line<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    let mut out = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, SpacedFormatter);
    value.serialize(&mut serializer)?;
    String::from_utf8(out).map_err(|e| ReaderError::Other(e.to_string()))
}

/// Parse one non-blank line into a JSON object
pub fn parse_line(line: &str, line_number: usize) -> Result<serde_json::Map<String, Value>> {
    match serde_json::from_str::<Value>(line) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(ReaderError::InvalidRecord {
            line: line_number,
            message: "record is not a JSON object".to_string(),
        }),
        Err(e) => Err(ReaderError::InvalidRecord {
            line: line_number,
            message: e.to_string(),
        }),
    }
}

/// Parse corpus text into tokens, skipping blank lines
pub fn parse_corpus(text: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    for (index, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let record: TokenRecord =
            serde_json::from_str(line).map_err(|e| ReaderError::InvalidRecord {
                line: index + 1,
                message: e.to_string(),
            })?;
        tokens.push(record.into_token());
    }
    Ok(tokens)
}

/// Read a corpus file into tokens
pub fn read_corpus(path: &Path) -> Result<Vec<Token>> {
    let text = std::fs::read_to_string(path)?;
    parse_corpus(&text)
}

/// Render tokens as corpus text, one line per token
pub fn write_corpus(tokens: &[Token]) -> Result<String> {
    let mut out = String::new();
    for token in tokens {
        out.push_str(&to_line(&TokenRecord::from(token))?);
        out.push('\n');
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_format() {
        let record = TokenRecord {
            prefix: String::new(),
            surface: "бар".to_string(),
            analysis: "бар+N+Sg+Nom;бар+PN;".to_string(),
            translations: Some(vec!["есть".to_string(), "каждый".to_string()]),
        };
        assert_eq!(
            to_line(&record).unwrap(),
            r#"{"prefix": "", "surface": "бар", "analysis": "бар+N+Sg+Nom;бар+PN;", "translations": ["есть", "каждый"]}"#
        );
    }

    #[test]
    fn test_line_escapes_quotes() {
        let record = TokenRecord {
            prefix: " ".to_string(),
            surface: "\"".to_string(),
            analysis: "Type4".to_string(),
            translations: None,
        };
        assert_eq!(
            to_line(&record).unwrap(),
            r#"{"prefix": " ", "surface": "\"", "analysis": "Type4"}"#
        );
    }

    #[test]
    fn test_parse_corpus_builds_morphology() {
        let text = concat!(
            r#"{"prefix": "", "surface": "Комедия", "analysis": "комедия+N+Sg+Nom;"}"#,
            "\n\n",
            r#"{"prefix": " ", "surface": "Рус", "analysis": "Rus"}"#,
            "\n"
        );
        let tokens = parse_corpus(text).unwrap();
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].morphology.as_ref().unwrap().feature_key, "N+Sg+Nom");
        assert_eq!(tokens[1].analysis_tag.as_deref(), Some("Rus"));
        assert!(!tokens[1].has_morphology());
    }

    #[test]
    fn test_parse_corpus_reports_line() {
        let text = "{\"surface\": \"a\"}\nnot json\n";
        let err = parse_corpus(text).unwrap_err();
        assert!(matches!(err, ReaderError::InvalidRecord { line: 2, .. }));
    }

    #[test]
    fn test_parse_line_requires_object() {
        assert!(parse_line("[1, 2]", 1).is_err());
        assert!(parse_line(r#"{"surface": "ул"}"#, 1).is_ok());
    }

    #[test]
    fn test_write_corpus() {
        let tokens = parse_corpus(r#"{"prefix": "", "surface": "ул", "analysis": "ул+PN;"}"#).unwrap();
        assert_eq!(
            write_corpus(&tokens).unwrap(),
            "{\"prefix\": \"\", \"surface\": \"ул\", \"analysis\": \"ул+PN;\"}\n"
        );
    }
}
