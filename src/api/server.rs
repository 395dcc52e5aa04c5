//! HTTP annotation service

use crate::annotation::{CorpusAnnotator, ERROR_MARKER};
use crate::morphology::{self, FeatureMetadata, GrammarHandle};
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiServerConfig {
    /// Server address
    pub addr: SocketAddr,
    /// Batch budget passed to the annotator
    pub budget_chars: usize,
}

impl Default for ApiServerConfig {
    fn default() -> Self {
        Self {
            addr: ([127, 0, 0, 1], 3000).into(),
            budget_chars: crate::annotation::batching::DEFAULT_BUDGET_CHARS,
        }
    }
}

#[derive(Clone)]
struct AppState {
    annotator: CorpusAnnotator,
    budget_chars: usize,
    grammar: Option<GrammarHandle>,
}

/// API server
pub struct ApiServer {
    config: ApiServerConfig,
    annotator: CorpusAnnotator,
    grammar: Option<GrammarHandle>,
}

impl ApiServer {
    pub fn new(config: ApiServerConfig, annotator: CorpusAnnotator) -> Self {
        Self {
            config,
            annotator,
            grammar: None,
        }
    }

    /// Attach grammar metadata used to describe `/api/token` analyses
    pub fn with_grammar(mut self, grammar: GrammarHandle) -> Self {
        self.grammar = Some(grammar);
        self
    }

    /// Build router
    pub fn router(&self) -> Router {
        let state = AppState {
            annotator: self.annotator.clone(),
            budget_chars: self.config.budget_chars,
            grammar: self.grammar.clone(),
        };

        Router::new()
            .route("/api/markup", post(markup_handler))
            .route("/api/token", post(token_handler))
            // Health check
            .route("/health", get(health_handler))
            .with_state(state)
            .layer(CorsLayer::permissive())
            .layer(TraceLayer::new_for_http())
    }

    /// Bind the configured address and serve until the process stops
    pub async fn serve(self) -> anyhow::Result<()> {
        let router = self.router();
        let listener = tokio::net::TcpListener::bind(self.config.addr).await?;
        info!(
            "Annotation service listening on http://{}",
            listener.local_addr()?
        );
        axum::serve(listener, router).await?;
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct StatusResponse {
    status: String,
    message: String,
}

fn forbidden(message: &str) -> Response {
    (
        StatusCode::FORBIDDEN,
        Json(StatusResponse {
            status: "error".to_string(),
            message: message.to_string(),
        }),
    )
        .into_response()
}

#[derive(Debug, Deserialize)]
struct MarkupRequest {
    text: Option<String>,
}

async fn markup_handler(
    State(state): State<AppState>,
    Json(request): Json<MarkupRequest>,
) -> Response {
    let Some(text) = request.text else {
        return forbidden("Missing 'text' field");
    };

    match state.annotator.markup(&text, state.budget_chars).await {
        Ok(markup) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            markup,
        )
            .into_response(),
        Err(e) => {
            warn!("Markup request failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(StatusResponse {
                    status: "error".to_string(),
                    message: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenRequest {
    token: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenResponse {
    token: String,
    tag: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    lemma: Option<String>,
    /// Readable part of speech, present when grammar metadata is attached
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pos: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    features: Vec<FeatureMetadata>,
}

impl TokenResponse {
    fn new(token: String, tag: String, grammar: Option<&GrammarHandle>) -> Self {
        let mut response = Self {
            token,
            tag,
            lemma: None,
            pos: None,
            features: Vec::new(),
        };
        let Some(morph) = morphology::parse(&response.token, &response.tag) else {
            return response;
        };

        response.lemma = Some(morph.lemma.clone());
        if let Some(grammar) = grammar {
            response.pos = Some(grammar.format_pos(&morph.pos));
            response.features = morph
                .feature_codes()
                .map(|code| grammar.describe_feature(code))
                .collect();
        }
        response
    }
}

async fn token_handler(
    State(state): State<AppState>,
    Json(request): Json<TokenRequest>,
) -> Response {
    let Some(token) = request.token else {
        return forbidden("Missing 'token' field");
    };

    let tag = state
        .annotator
        .fallback()
        .lookup(&token)
        .unwrap_or_else(|| ERROR_MARKER.to_string());
    Json(TokenResponse::new(token, tag, state.grammar.as_ref())).into_response()
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
