//! Translation augmentation over corpus directories

mod common;

use common::{create_corpus_dir, create_dictionary_db, sample_dictionary, SAMPLE_CORPUS};
use serde_json::Value;
use std::sync::Arc;
use tempfile::TempDir;
use uqureader_core::{
    annotation::{CorpusAnnotator, FallbackAnalyzer},
    augment, corpus,
    storage::MapDictionary,
    AugmentReport, SqliteDictionary,
};

fn expected_report() -> AugmentReport {
    AugmentReport {
        files_processed: 1,
        tokens_processed: 3,
        tokens_with_translations: 2,
        translations_written: 3,
    }
}

fn translations(line: &str) -> Option<Vec<String>> {
    let value: Value = serde_json::from_str(line).unwrap();
    value.get("translations").map(|t| {
        t.as_array()
            .unwrap()
            .iter()
            .map(|s| s.as_str().unwrap().to_string())
            .collect()
    })
}

#[test]
fn test_first_run_adds_translations() {
    let (dir, path) = create_corpus_dir(SAMPLE_CORPUS);

    let report = augment(dir.path(), &sample_dictionary()).unwrap();
    assert_eq!(report, expected_report());

    let content = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 3);

    assert_eq!(translations(lines[0]), Some(vec!["слово".to_string()]));
    let mut second = translations(lines[1]).unwrap();
    second.sort();
    assert_eq!(second, vec!["есть", "каждый"]);

    // Unmapped record is kept as it was
    assert_eq!(lines[2], SAMPLE_CORPUS.lines().nth(2).unwrap());
    assert!(content.ends_with('\n'));
}

#[test]
fn test_second_run_is_identical() {
    let (dir, path) = create_corpus_dir(SAMPLE_CORPUS);
    let dictionary = sample_dictionary();

    let first = augment(dir.path(), &dictionary).unwrap();
    let after_first = std::fs::read(&path).unwrap();
    let modified = std::fs::metadata(&path).unwrap().modified().unwrap();

    let second = augment(dir.path(), &dictionary).unwrap();
    let after_second = std::fs::read(&path).unwrap();

    assert_eq!(first, second);
    assert_eq!(after_first, after_second);
    // Nothing changed, so nothing was rewritten
    assert_eq!(std::fs::metadata(&path).unwrap().modified().unwrap(), modified);
}

#[test]
fn test_augmented_corpus_reads_back() {
    let (dir, path) = create_corpus_dir(SAMPLE_CORPUS);
    augment(dir.path(), &sample_dictionary()).unwrap();

    let tokens = corpus::read_corpus(&path).unwrap();
    assert_eq!(tokens.len(), 3);
    assert_eq!(tokens[0].translations, Some(vec!["слово".to_string()]));
    assert_eq!(tokens[0].morphology.as_ref().unwrap().lemma, "сүз");
    assert!(tokens[2].translations.is_none());
    assert!(!tokens[2].has_morphology());
}

#[test]
fn test_sqlite_dictionary_matches_map_dictionary() {
    let (dir, path) = create_corpus_dir(SAMPLE_CORPUS);
    let db = create_dictionary_db(
        dir.path(),
        &[("сүз", "слово"), ("бар", "есть"), ("бар", "каждый"), ("бар", "есть")],
    );
    let dictionary = SqliteDictionary::open(&db).unwrap();

    let report = augment(dir.path(), &dictionary).unwrap();
    assert_eq!(report, expected_report());

    let content = std::fs::read_to_string(&path).unwrap();
    let second_line = content.lines().nth(1).unwrap();
    assert_eq!(translations(second_line).unwrap().len(), 2);
}

#[tokio::test]
async fn test_annotated_markup_augments_idempotently() {
    let fallback =
        FallbackAnalyzer::from_markup("сүз\tсүз+N+Sg+Nom;\nбар\tбар+V+IMP;").unwrap();
    let annotator = CorpusAnnotator::local(Arc::new(fallback));
    let markup = annotator.markup("сүз бар уку", 500).await.unwrap();

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("book.txt.morph.tsv");
    augment::replace_atomically(&path, &markup).unwrap();

    let mut dictionary = MapDictionary::new();
    dictionary.insert_tagged("сүз", "слово", &["n"]);
    dictionary.insert_tagged("бар", "идти", &["v"]);
    dictionary.insert_tagged("бар", "каждый", &["prn"]);

    let first = augment(dir.path(), &dictionary).unwrap();
    let after_first = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = after_first.lines().collect();
    assert_eq!(
        lines,
        vec![
            "сүз\tсүз+N+Sg+Nom;\tсүз[N]: слово",
            "бар\tбар+V+IMP;\tбар[V]: идти",
            "уку\tError",
        ]
    );
    assert_eq!(
        first,
        AugmentReport {
            files_processed: 1,
            tokens_processed: 3,
            tokens_with_translations: 2,
            translations_written: 2,
        }
    );

    let second = augment(dir.path(), &dictionary).unwrap();
    assert_eq!(second, first);
    assert_eq!(std::fs::read_to_string(&path).unwrap(), after_first);
}

#[test]
fn test_missing_dictionary_is_reported() {
    let dir = tempfile::TempDir::new().unwrap();
    let err = SqliteDictionary::open(dir.path().join("absent.db")).err().unwrap();
    assert!(matches!(
        err,
        uqureader_core::ReaderError::DictionaryUnavailable(_)
    ));
}
