//! Bilingual lemma dictionary
//!
//! Read-only mapping from a source-language lemma to its target-language
//! translations, in the dictionary's ranking order. Entries may carry
//! part-of-speech tags (`n`, `v`, `adj`, ...) used to filter translations
//! by the analysis POS.

use crate::error::{ReaderError, Result};
use rusqlite::{params, Connection, OpenFlags};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use tracing::info;

const TRANSLATIONS_QUERY: &str = "SELECT DISTINCT rus_lemma FROM tat_rus_dictionary
     WHERE tat_lemma = ?1 COLLATE NOCASE
     ORDER BY rus_lemma COLLATE NOCASE";

const TAGGED_ENTRIES_QUERY: &str = "SELECT rus_lemma, tat_tags FROM tat_rus_dictionary
     WHERE tat_lemma = ?1 COLLATE NOCASE";

const UNTAGGED_ENTRIES_QUERY: &str = "SELECT rus_lemma, NULL FROM tat_rus_dictionary
     WHERE tat_lemma = ?1 COLLATE NOCASE";

/// One dictionary row: a translation and the lowercase tags it is filed under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictionaryEntry {
    pub translation: String,
    pub tags: Vec<String>,
}

impl DictionaryEntry {
    pub fn new(translation: impl Into<String>) -> Self {
        Self {
            translation: translation.into(),
            tags: Vec::new(),
        }
    }
}

/// Source of translations for a lemma
pub trait Dictionary: Send + Sync {
    /// Translations of `lemma`, empty when it is unknown
    fn translations(&self, lemma: &str) -> Result<Vec<String>>;

    /// Raw entries of `lemma` in storage order, tags included
    fn entries(&self, lemma: &str) -> Result<Vec<DictionaryEntry>> {
        Ok(self
            .translations(lemma)?
            .into_iter()
            .map(DictionaryEntry::new)
            .collect())
    }
}

/// Dictionary stored in a SQLite table `tat_rus_dictionary(tat_lemma, rus_lemma)`
///
/// An optional `tat_tags` column holds a JSON array of tags per row.
pub struct SqliteDictionary {
    conn: Mutex<Connection>,
    entries_query: &'static str,
}

impl SqliteDictionary {
    /// Open the dictionary read-only
    ///
    /// Fails with [`ReaderError::DictionaryUnavailable`] when the file is
    /// missing or does not contain the dictionary table.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(ReaderError::DictionaryUnavailable(format!(
                "{} does not exist",
                path.display()
            )));
        }

        let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY).map_err(
            |e| ReaderError::DictionaryUnavailable(format!("{}: {}", path.display(), e)),
        )?;

        // Fail now rather than on the first lookup
        conn.prepare(TRANSLATIONS_QUERY).map_err(|e| {
            ReaderError::DictionaryUnavailable(format!("{}: {}", path.display(), e))
        })?;

        let entries_query = if conn.prepare(TAGGED_ENTRIES_QUERY).is_ok() {
            TAGGED_ENTRIES_QUERY
        } else {
            UNTAGGED_ENTRIES_QUERY
        };

        info!(
            "Opened dictionary at: {} (tagged: {})",
            path.display(),
            entries_query == TAGGED_ENTRIES_QUERY
        );
        Ok(Self {
            conn: Mutex::new(conn),
            entries_query,
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| ReaderError::DictionaryUnavailable("connection lock poisoned".into()))
    }
}

/// Lowercase, trimmed, distinct tags from a JSON array; anything else is untagged
fn parse_tags(json: Option<&str>) -> Vec<String> {
    let Some(Value::Array(values)) = json.and_then(|j| serde_json::from_str::<Value>(j).ok()) else {
        return Vec::new();
    };

    let mut tags: Vec<String> = Vec::new();
    for tag in values.iter().filter_map(Value::as_str) {
        let tag = tag.trim().to_lowercase();
        if !tag.is_empty() && !tags.contains(&tag) {
            tags.push(tag);
        }
    }
    tags
}

impl Dictionary for SqliteDictionary {
    fn translations(&self, lemma: &str) -> Result<Vec<String>> {
        let conn = self.lock()?;

        let mut stmt = conn
            .prepare_cached(TRANSLATIONS_QUERY)
            .map_err(|e| ReaderError::DictionaryUnavailable(e.to_string()))?;
        let rows = stmt
            .query_map(params![lemma], |row| row.get::<_, String>(0))
            .map_err(|e| ReaderError::DictionaryUnavailable(e.to_string()))?;

        let mut translations = Vec::new();
        for row in rows {
            let translation = row.map_err(|e| ReaderError::DictionaryUnavailable(e.to_string()))?;
            if !translation.trim().is_empty() {
                translations.push(translation);
            }
        }
        Ok(translations)
    }

    fn entries(&self, lemma: &str) -> Result<Vec<DictionaryEntry>> {
        let conn = self.lock()?;

        let mut stmt = conn
            .prepare_cached(self.entries_query)
            .map_err(|e| ReaderError::DictionaryUnavailable(e.to_string()))?;
        let rows = stmt
            .query_map(params![lemma], |row| {
                Ok((
                    row.get::<_, Option<String>>(0)?,
                    row.get::<_, Option<String>>(1)?,
                ))
            })
            .map_err(|e| ReaderError::DictionaryUnavailable(e.to_string()))?;

        let mut entries = Vec::new();
        for row in rows {
            let (translation, tags) =
                row.map_err(|e| ReaderError::DictionaryUnavailable(e.to_string()))?;
            if let Some(translation) = translation {
                entries.push(DictionaryEntry {
                    translation,
                    tags: parse_tags(tags.as_deref()),
                });
            }
        }
        Ok(entries)
    }
}

/// In-memory dictionary keyed by lowercase lemma
#[derive(Debug, Clone, Default)]
pub struct MapDictionary {
    entries: HashMap<String, Vec<DictionaryEntry>>,
}

impl MapDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, lemma: &str, translation: impl Into<String>) {
        self.insert_tagged(lemma, translation, &[]);
    }

    /// Add a translation filed under `tags` (stored lowercase)
    pub fn insert_tagged(&mut self, lemma: &str, translation: impl Into<String>, tags: &[&str]) {
        let entry = DictionaryEntry {
            translation: translation.into(),
            tags: tags.iter().map(|t| t.trim().to_lowercase()).collect(),
        };
        let entries = self.entries.entry(lemma.to_lowercase()).or_default();
        if !entries.contains(&entry) {
            entries.push(entry);
        }
    }
}

impl<'a> FromIterator<(&'a str, &'a str)> for MapDictionary {
    fn from_iter<I: IntoIterator<Item = (&'a str, &'a str)>>(iter: I) -> Self {
        let mut dictionary = Self::new();
        for (lemma, translation) in iter {
            dictionary.insert(lemma, translation);
        }
        dictionary
    }
}

impl Dictionary for MapDictionary {
    fn translations(&self, lemma: &str) -> Result<Vec<String>> {
        let mut translations: Vec<String> = Vec::new();
        for entry in self.entries(lemma)? {
            if !translations.contains(&entry.translation) {
                translations.push(entry.translation);
            }
        }
        Ok(translations)
    }

    fn entries(&self, lemma: &str) -> Result<Vec<DictionaryEntry>> {
        Ok(self
            .entries
            .get(&lemma.to_lowercase())
            .cloned()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_dictionary(dir: &TempDir) -> std::path::PathBuf {
        let path = dir.path().join("dictionary.db");
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(
            "CREATE TABLE tat_rus_dictionary (tat_lemma TEXT, rus_lemma TEXT);
             INSERT INTO tat_rus_dictionary VALUES ('бар', 'каждый');
             INSERT INTO tat_rus_dictionary VALUES ('бар', 'есть');
             INSERT INTO tat_rus_dictionary VALUES ('бар', 'есть');
             INSERT INTO tat_rus_dictionary VALUES ('сүз', 'слово');",
        )
        .unwrap();
        path
    }

    #[test]
    fn test_sqlite_lookup_distinct_and_sorted() {
        let dir = TempDir::new().unwrap();
        let dictionary = SqliteDictionary::open(create_dictionary(&dir)).unwrap();

        assert_eq!(dictionary.translations("бар").unwrap(), vec!["есть", "каждый"]);
        assert_eq!(dictionary.translations("сүз").unwrap(), vec!["слово"]);
        assert!(dictionary.translations("юк").unwrap().is_empty());
    }

    #[test]
    fn test_missing_file_is_unavailable() {
        let dir = TempDir::new().unwrap();
        let err = SqliteDictionary::open(dir.path().join("absent.db"))
            .err()
            .unwrap();
        assert!(matches!(err, ReaderError::DictionaryUnavailable(_)));
    }

    #[test]
    fn test_missing_table_is_unavailable() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.db");
        Connection::open(&path)
            .unwrap()
            .execute_batch("CREATE TABLE other (x TEXT);")
            .unwrap();

        let err = SqliteDictionary::open(&path).err().unwrap();
        assert!(matches!(err, ReaderError::DictionaryUnavailable(_)));
    }

    #[test]
    fn test_sqlite_entries_carry_tags() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tagged.db");
        Connection::open(&path)
            .unwrap()
            .execute_batch(
                r#"CREATE TABLE tat_rus_dictionary (tat_lemma TEXT, rus_lemma TEXT, tat_tags TEXT);
                 INSERT INTO tat_rus_dictionary VALUES ('бар', 'есть', '["V", " v "]');
                 INSERT INTO tat_rus_dictionary VALUES ('бар', 'каждый', '["prn"]');
                 INSERT INTO tat_rus_dictionary VALUES ('бар', 'всё', 'not json');"#,
            )
            .unwrap();
        let dictionary = SqliteDictionary::open(&path).unwrap();

        let entries = dictionary.entries("бар").unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].translation, "есть");
        assert_eq!(entries[0].tags, vec!["v"]);
        assert_eq!(entries[1].tags, vec!["prn"]);
        assert!(entries[2].tags.is_empty());
    }

    #[test]
    fn test_sqlite_entries_without_tag_column() {
        let dir = TempDir::new().unwrap();
        let dictionary = SqliteDictionary::open(create_dictionary(&dir)).unwrap();

        let entries = dictionary.entries("сүз").unwrap();
        assert_eq!(entries, vec![DictionaryEntry::new("слово")]);
    }

    #[test]
    fn test_map_dictionary() {
        let dictionary: MapDictionary =
            [("бар", "есть"), ("бар", "каждый"), ("бар", "есть")].into_iter().collect();
        assert_eq!(dictionary.translations("Бар").unwrap(), vec!["есть", "каждый"]);
    }

    #[test]
    fn test_map_dictionary_tagged() {
        let mut dictionary = MapDictionary::new();
        dictionary.insert_tagged("бар", "есть", &["V"]);
        dictionary.insert_tagged("бар", "есть", &["n"]);

        assert_eq!(dictionary.entries("бар").unwrap()[0].tags, vec!["v"]);
        assert_eq!(dictionary.translations("бар").unwrap(), vec!["есть"]);
    }
}
