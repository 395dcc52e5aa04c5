//! Remote morphological analyzer client
//!
//! Sends one batch per request as a form-encoded `text` field and reads back
//! the analyses for each token. Several response shapes are accepted, since
//! deployments of the analyzer differ in how they wrap the token list.

use super::analyzer::{TokenAnalyzer, WordMarkup};
use crate::config::RemoteConfig;
use crate::error::{ReaderError, Result};
use crate::utils::string::preview;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Client for the remote analyzer
pub struct RemoteAnalyzer {
    client: Client,
    endpoint: String,
    max_retries: usize,
    backoff_base_ms: u64,
}

impl RemoteAnalyzer {
    /// Create a client for `endpoint`
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let endpoint = endpoint.into();
        if endpoint.is_empty() {
            return Err(ReaderError::Validation(
                "Analyzer endpoint cannot be empty".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ReaderError::RemoteAnalyzer(e.to_string()))?;

        Ok(Self {
            client,
            endpoint,
            max_retries: 3,
            backoff_base_ms: 1000,
        })
    }

    /// Create a client from configuration; `None` when no endpoint is set
    pub fn from_config(config: &RemoteConfig) -> Result<Option<Self>> {
        let Some(endpoint) = &config.endpoint else {
            return Ok(None);
        };
        let analyzer = Self::new(endpoint.clone(), config.timeout)?
            .with_retry(config.max_retries, config.backoff_base_ms);
        Ok(Some(analyzer))
    }

    pub fn with_retry(mut self, max_retries: usize, backoff_base_ms: u64) -> Self {
        self.max_retries = max_retries;
        self.backoff_base_ms = backoff_base_ms;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Call the analyzer with retry on rate limiting and timeouts
    async fn call_api_with_retry(&self, batch: &str) -> Result<Vec<WordMarkup>> {
        let mut retries = 0;

        loop {
            match self.call_api(batch).await {
                Ok(words) => return Ok(words),
                Err(e) => {
                    if retries >= self.max_retries {
                        return Err(e);
                    }

                    let should_retry = match &e {
                        ReaderError::RateLimitExceeded(_) => true,
                        ReaderError::RemoteAnalyzer(msg) => {
                            msg.contains("timeout") || msg.contains("unavailable")
                        }
                        _ => false,
                    };

                    if !should_retry {
                        return Err(e);
                    }

                    let backoff_ms = backoff_delay_ms(self.backoff_base_ms, retries);
                    warn!(
                        "Analyzer call failed, retrying after {}ms (attempt {}/{})",
                        backoff_ms,
                        retries + 1,
                        self.max_retries
                    );

                    sleep(Duration::from_millis(backoff_ms)).await;
                    retries += 1;
                }
            }
        }
    }

    /// Call the analyzer once (no retry)
    async fn call_api(&self, batch: &str) -> Result<Vec<WordMarkup>> {
        debug!(
            "Calling analyzer: {} chars, \"{}\"",
            batch.chars().count(),
            preview(batch, 40)
        );

        let response = self
            .client
            .post(&self.endpoint)
            .form(&[("text", batch)])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ReaderError::RemoteAnalyzer(format!("timeout: {}", e))
                } else {
                    ReaderError::RemoteAnalyzer(e.to_string())
                }
            })?;

        let status = response.status();

        match status {
            StatusCode::OK => {
                let body = response
                    .text()
                    .await
                    .map_err(|e| ReaderError::RemoteAnalyzer(e.to_string()))?;
                let words = parse_response(&body)?;
                debug!("Analyzer returned {} tokens", words.len());
                Ok(words)
            }
            StatusCode::TOO_MANY_REQUESTS => Err(ReaderError::RateLimitExceeded(
                "Analyzer rate limit exceeded".to_string(),
            )),
            StatusCode::SERVICE_UNAVAILABLE | StatusCode::GATEWAY_TIMEOUT => Err(
                ReaderError::RemoteAnalyzer(format!("Analyzer unavailable (status {})", status)),
            ),
            _ => {
                let error_text = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unknown error".to_string());

                Err(ReaderError::RemoteAnalyzer(format!(
                    "Analyzer error (status {}): {}",
                    status, error_text
                )))
            }
        }
    }
}

/// Exponential backoff for retry `attempt` (0-based), saturating at `u64::MAX`
fn backoff_delay_ms(base_ms: u64, attempt: usize) -> u64 {
    let factor = u32::try_from(attempt)
        .ok()
        .and_then(|exp| 2_u64.checked_pow(exp))
        .unwrap_or(u64::MAX);
    base_ms.saturating_mul(factor)
}

#[async_trait]
impl TokenAnalyzer for RemoteAnalyzer {
    async fn analyze_batch(&self, batch: &str) -> Result<Vec<WordMarkup>> {
        if batch.trim().is_empty() {
            return Ok(Vec::new());
        }
        self.call_api_with_retry(batch).await
    }

    fn name(&self) -> &str {
        "remote"
    }
}

/// Parse an analyzer response body
///
/// Accepts a bare array of token objects, an object wrapping one in
/// `tokens` or `results`, or a single token object.
pub fn parse_response(body: &str) -> Result<Vec<WordMarkup>> {
    let value: Value = serde_json::from_str(body)?;

    let items: Vec<&Value> = match &value {
        Value::Array(items) => items.iter().collect(),
        Value::Object(map) => match map.get("tokens").or_else(|| map.get("results")) {
            Some(Value::Array(items)) => items.iter().collect(),
            _ => vec![&value],
        },
        _ => {
            return Err(ReaderError::RemoteAnalyzer(
                "Unexpected analyzer response shape".to_string(),
            ))
        }
    };

    Ok(items.into_iter().filter_map(parse_word).collect())
}

fn first_str<'a>(item: &'a serde_json::Map<String, Value>, keys: &[&str]) -> Option<&'a str> {
    keys.iter().find_map(|k| item.get(*k).and_then(Value::as_str))
}

fn push_unique(analyses: &mut Vec<String>, analysis: &str) {
    if !analyses.iter().any(|a| a == analysis) {
        analyses.push(analysis.to_string());
    }
}

fn parse_word(item: &Value) -> Option<WordMarkup> {
    let item = item.as_object()?;
    let word = first_str(item, &["word", "token", "surface"])?;

    let mut analyses: Vec<String> = Vec::new();
    if let Some(Value::Array(list)) = item.get("analyses") {
        for entry in list {
            match entry {
                Value::String(s) => push_unique(&mut analyses, s),
                Value::Object(obj) => {
                    if let Some(s) = first_str(obj, &["analysis", "tag"]) {
                        push_unique(&mut analyses, s);
                    }
                }
                _ => {}
            }
        }
    }
    if analyses.is_empty() {
        if let Some(s) = first_str(item, &["analysis", "tag", "markup"]) {
            push_unique(&mut analyses, s);
        }
    }

    Some(WordMarkup::new(word, analyses))
}
