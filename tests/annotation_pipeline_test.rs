//! Annotation against a fake remote analyzer served over HTTP

mod common;

use axum::{extract::State, http::StatusCode, routing::post, Form, Json, Router};
use common::spawn_server;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uqureader_core::{
    annotation::{CorpusAnnotator, FallbackAnalyzer, RemoteAnalyzer, TokenAnalyzer},
    api::{ApiServer, ApiServerConfig},
};

#[derive(Clone, Default)]
struct FakeAnalyzer {
    known: Arc<HashMap<&'static str, Vec<&'static str>>>,
    requests: Arc<Mutex<Vec<String>>>,
    /// Leading requests answered with this status instead of results
    failures: Arc<AtomicUsize>,
    failure_status: Option<StatusCode>,
}

async fn analyze(
    State(fake): State<FakeAnalyzer>,
    Form(form): Form<HashMap<String, String>>,
) -> Result<Json<Value>, StatusCode> {
    let text = form.get("text").cloned().unwrap_or_default();
    fake.requests.lock().unwrap().push(text.clone());

    if let Some(status) = fake.failure_status {
        let remaining = fake.failures.load(Ordering::SeqCst);
        if remaining > 0 {
            fake.failures.store(remaining - 1, Ordering::SeqCst);
            return Err(status);
        }
    }

    let words: Vec<Value> = text
        .split_whitespace()
        .map(|word| {
            let analyses = fake.known.get(word).cloned().unwrap_or_default();
            json!({ "word": word, "analyses": analyses })
        })
        .collect();
    Ok(Json(Value::Array(words)))
}

async fn start(fake: FakeAnalyzer) -> String {
    let router = Router::new()
        .route("/analyze", post(analyze))
        .with_state(fake);
    format!("{}/analyze", spawn_server(router).await)
}

fn known() -> Arc<HashMap<&'static str, Vec<&'static str>>> {
    Arc::new(HashMap::from([
        ("Комедия", vec!["комедия+N+Sg+Nom"]),
        ("иске", vec![]),
        ("бар", vec!["бар+PN", "  "]),
    ]))
}

fn fallback() -> Arc<FallbackAnalyzer> {
    Arc::new(FallbackAnalyzer::from_markup("иске\tиске+Adj;\nкитап\tкитап+N;").unwrap())
}

#[tokio::test]
async fn test_remote_results_merged_with_fallback() {
    let fake = FakeAnalyzer {
        known: known(),
        ..Default::default()
    };
    let endpoint = start(fake.clone()).await;
    let remote = RemoteAnalyzer::new(endpoint, Duration::from_secs(5)).unwrap();
    let annotator = CorpusAnnotator::new(Arc::new(remote), fallback(), 2).unwrap();

    let markup = annotator.markup("Комедия иске\nбар", 8).await.unwrap();

    assert_eq!(
        markup,
        "Комедия\tкомедия+N+Sg+Nom;\nиске\tиске+Adj;\nбар\tбар+PN;"
    );

    let requests = fake.requests.lock().unwrap().clone();
    assert_eq!(requests.len(), 3);
    assert!(requests.iter().all(|r| r.chars().count() <= 8));
}

#[tokio::test]
async fn test_rate_limited_batch_is_retried() {
    let fake = FakeAnalyzer {
        known: known(),
        failures: Arc::new(AtomicUsize::new(1)),
        failure_status: Some(StatusCode::TOO_MANY_REQUESTS),
        ..Default::default()
    };
    let endpoint = start(fake.clone()).await;
    let remote = RemoteAnalyzer::new(endpoint, Duration::from_secs(5))
        .unwrap()
        .with_retry(3, 1);

    let words = remote.analyze_batch("Комедия").await.unwrap();

    assert_eq!(words.len(), 1);
    assert_eq!(words[0].analyses, vec!["комедия+N+Sg+Nom"]);
    assert_eq!(fake.requests.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn test_failed_batch_analysed_locally() {
    let fake = FakeAnalyzer {
        known: known(),
        failures: Arc::new(AtomicUsize::new(usize::MAX)),
        failure_status: Some(StatusCode::INTERNAL_SERVER_ERROR),
        ..Default::default()
    };
    let endpoint = start(fake.clone()).await;
    let remote = RemoteAnalyzer::new(endpoint, Duration::from_secs(5))
        .unwrap()
        .with_retry(3, 1);
    let annotator = CorpusAnnotator::new(Arc::new(remote), fallback(), 1).unwrap();

    let markup = annotator.markup("китап.", 500).await.unwrap();

    assert_eq!(markup, "китап\tкитап+N;\n.\tType1;");
    // Server errors other than 503/504 are not retried
    assert_eq!(fake.requests.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_unreachable_analyzer_falls_back() {
    // Nothing listens on the discard port
    let remote = RemoteAnalyzer::new("http://127.0.0.1:9/analyze", Duration::from_secs(2))
        .unwrap()
        .with_retry(0, 1);
    let annotator = CorpusAnnotator::new(Arc::new(remote), fallback(), 1).unwrap();

    let markup = annotator.markup("иске уку", 500).await.unwrap();
    assert_eq!(markup, "иске\tиске+Adj;\nуку\tError");
}

#[tokio::test]
async fn test_http_service_end_to_end() {
    let server = ApiServer::new(
        ApiServerConfig::default(),
        CorpusAnnotator::local(fallback()),
    );
    let base = spawn_server(server.router()).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/api/markup", base))
        .json(&json!({ "text": "иске китап, 12" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    assert_eq!(
        response.text().await.unwrap(),
        "иске\tиске+Adj;\nкитап\tкитап+N;\n,\tType2;\n12\tNum;"
    );

    let response = client
        .post(format!("{}/api/token", base))
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::FORBIDDEN);

    let health: Value = client
        .get(format!("{}/health", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["status"], "ok");
}
