//! Corpus annotation pipeline
//!
//! Text is split into batches, each batch goes to the primary analyzer with
//! at most `max_concurrency` requests in flight, and results are put back
//! together in batch order. Tokens the primary analyzer leaves without a
//! usable analysis are looked up in the local dictionary; a batch that fails
//! outright is analysed entirely locally.

use super::analyzer::{TokenAnalyzer, WordMarkup};
use super::batching::BatchPolicy;
use super::fallback::FallbackAnalyzer;
use super::markup::{format_markup, AnnotatedToken};
use crate::error::{ReaderError, Result};
use crate::utils::string::preview;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Annotates raw text with morphological analyses
#[derive(Clone)]
pub struct CorpusAnnotator {
    primary: Option<Arc<dyn TokenAnalyzer>>,
    fallback: Arc<FallbackAnalyzer>,
    max_concurrency: usize,
}

impl CorpusAnnotator {
    /// Annotator that only uses the local dictionary
    pub fn local(fallback: Arc<FallbackAnalyzer>) -> Self {
        Self {
            primary: None,
            fallback,
            max_concurrency: 1,
        }
    }

    /// Annotator backed by a primary analyzer with local fallback
    pub fn new(
        primary: Arc<dyn TokenAnalyzer>,
        fallback: Arc<FallbackAnalyzer>,
        max_concurrency: usize,
    ) -> Result<Self> {
        if max_concurrency == 0 {
            return Err(ReaderError::Validation(
                "max_concurrency must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            primary: Some(primary),
            fallback,
            max_concurrency,
        })
    }

    pub fn fallback(&self) -> &FallbackAnalyzer {
        &self.fallback
    }

    /// Annotate `text`, keeping every batch within `budget_chars`
    pub async fn annotate(&self, text: &str, budget_chars: usize) -> Result<Vec<AnnotatedToken>> {
        let policy = BatchPolicy::new(budget_chars)?;
        let batches = policy.split(text);
        debug!(
            "Annotating {} chars in {} batches (budget {})",
            text.chars().count(),
            batches.len(),
            budget_chars
        );

        let results = match &self.primary {
            Some(primary) => self.dispatch(primary, &batches).await,
            None => batches.iter().map(|_| None).collect(),
        };

        let mut tokens = Vec::new();
        let mut unresolved = 0usize;
        for (batch, result) in batches.iter().zip(results) {
            let words = match result {
                Some(Ok(words)) => words,
                Some(Err(e)) => {
                    warn!(
                        "Analyzer failed for batch \"{}\", using local dictionary: {}",
                        preview(batch, 40),
                        e
                    );
                    self.fallback.analyze_text(batch)
                }
                None => self.fallback.analyze_text(batch),
            };

            for word in words {
                let token = self.resolve(word);
                if !token.is_resolved() {
                    unresolved += 1;
                }
                tokens.push(token);
            }
        }

        info!(
            "Annotated {} tokens ({} without analysis)",
            tokens.len(),
            unresolved
        );
        Ok(tokens)
    }

    /// Annotate `text` and render it as markup
    pub async fn markup(&self, text: &str, budget_chars: usize) -> Result<String> {
        let tokens = self.annotate(text, budget_chars).await?;
        Ok(format_markup(&tokens))
    }

    /// Send every batch to `primary`; slot `i` holds the outcome of batch `i`
    async fn dispatch(
        &self,
        primary: &Arc<dyn TokenAnalyzer>,
        batches: &[String],
    ) -> Vec<Option<Result<Vec<WordMarkup>>>> {
        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let mut tasks = JoinSet::new();

        for (index, batch) in batches.iter().enumerate() {
            let analyzer = Arc::clone(primary);
            let semaphore = Arc::clone(&semaphore);
            let batch = batch.clone();
            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok();
                (index, analyzer.analyze_batch(&batch).await)
            });
        }

        let mut results: Vec<Option<Result<Vec<WordMarkup>>>> =
            batches.iter().map(|_| None).collect();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, result)) => results[index] = Some(result),
                Err(e) => warn!("Analyzer task for a batch did not complete: {}", e),
            }
        }
        results
    }

    /// Keep the primary analyses when usable, otherwise ask the dictionary
    fn resolve(&self, word: WordMarkup) -> AnnotatedToken {
        if word.has_usable_analysis() {
            let analyses = word.usable_analyses().cloned().collect();
            return AnnotatedToken::new(word.word, analyses);
        }
        let analyses = self.fallback.lookup_analyses(&word.word);
        AnnotatedToken::new(word.word, analyses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Answers every word with `<word>+N`, slower for earlier batches
    struct ReversedLatencyAnalyzer {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl TokenAnalyzer for ReversedLatencyAnalyzer {
        async fn analyze_batch(&self, batch: &str) -> Result<Vec<WordMarkup>> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);

            let delay = if batch.starts_with("беренче") { 40 } else { 5 };
            tokio::time::sleep(Duration::from_millis(delay)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            Ok(batch
                .split_whitespace()
                .map(|w| WordMarkup::new(w, vec![format!("{}+N", w)]))
                .collect())
        }

        fn name(&self) -> &str {
            "reversed"
        }
    }

    struct FailingAnalyzer;

    #[async_trait]
    impl TokenAnalyzer for FailingAnalyzer {
        async fn analyze_batch(&self, _batch: &str) -> Result<Vec<WordMarkup>> {
            Err(ReaderError::RemoteAnalyzer("connection refused".to_string()))
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    /// Knows nothing about any word
    struct SilentAnalyzer;

    #[async_trait]
    impl TokenAnalyzer for SilentAnalyzer {
        async fn analyze_batch(&self, batch: &str) -> Result<Vec<WordMarkup>> {
            Ok(batch
                .split_whitespace()
                .map(|w| WordMarkup::new(w, vec!["  ".to_string()]))
                .collect())
        }

        fn name(&self) -> &str {
            "silent"
        }
    }

    fn fallback() -> Arc<FallbackAnalyzer> {
        let mut analyzer = FallbackAnalyzer::new();
        analyzer.insert("Комедия", "комедия+N+Sg+Nom;");
        analyzer.insert("бар", "бар+N+Sg+Nom;бар+PN;");
        Arc::new(analyzer)
    }

    #[tokio::test]
    async fn test_results_follow_batch_order() {
        let primary = Arc::new(ReversedLatencyAnalyzer {
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        });
        let annotator = CorpusAnnotator::new(primary.clone(), fallback(), 2).unwrap();

        let tokens = annotator
            .annotate("беренче сүз. икенче сүз. өченче сүз.", 14)
            .await
            .unwrap();

        let surfaces: Vec<&str> = tokens.iter().map(|t| t.surface.as_str()).collect();
        assert_eq!(
            surfaces,
            vec!["беренче", "сүз.", "икенче", "сүз.", "өченче", "сүз."]
        );
        assert!(primary.peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_failed_batch_uses_local_dictionary() {
        let annotator = CorpusAnnotator::new(Arc::new(FailingAnalyzer), fallback(), 4).unwrap();

        let markup = annotator.markup("Комедия 1 иске", 500).await.unwrap();

        assert_eq!(markup, "Комедия\tкомедия+N+Sg+Nom;\n1\tNum;\nиске\tError");
    }

    #[tokio::test]
    async fn test_blank_analyses_fall_back_per_token() {
        let annotator = CorpusAnnotator::new(Arc::new(SilentAnalyzer), fallback(), 1).unwrap();

        let tokens = annotator.annotate("бар урман", 500).await.unwrap();

        assert_eq!(tokens[0].tag().as_deref(), Some("бар+N+Sg+Nom;бар+PN;"));
        assert!(!tokens[1].is_resolved());
    }

    #[tokio::test]
    async fn test_local_only() {
        let annotator = CorpusAnnotator::local(fallback());
        let tokens = annotator.annotate("Комедия!", 500).await.unwrap();
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[1].analyses, vec!["Type1"]);
    }

    #[tokio::test]
    async fn test_zero_budget_is_error() {
        let annotator = CorpusAnnotator::local(fallback());
        assert!(annotator.annotate("сүз", 0).await.is_err());
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        assert!(CorpusAnnotator::new(Arc::new(SilentAnalyzer), fallback(), 0).is_err());
    }
}
