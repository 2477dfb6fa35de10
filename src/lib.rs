//! Core library for the FairlyHuman backend. This module wires together the
//! HTTP surface, the admission-control gates and the analysis orchestration
//! around the external model provider.

mod config;
pub mod audit;
pub mod error;
pub mod prompt;
pub mod provider;
pub mod ratelimit;
pub mod schema;
pub mod scrub;

pub use config::AppConfig;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::extract::rejection::{BytesRejection, FailedToBufferBody, JsonRejection};
use axum::extract::{ConnectInfo, DefaultBodyLimit, State};
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use crate::audit::{AuditSink, StoryAudit};
use crate::error::ApiError;
use crate::prompt::FAIRNESS_PROMPT;
use crate::provider::{ModelProvider, OpenAiProvider};
use crate::ratelimit::RateLimiter;
use crate::schema::{
    parse_analysis_core, parse_analysis_request, AnalysisMetadata, FairlyHumanAnalysis,
};
use crate::scrub::scrub_story_text;

/// Shared application state. The rate limiter is the only mutable piece;
/// everything else is read-only after startup.
#[derive(Clone)]
pub struct AppState {
    pub limiter: Arc<RateLimiter>,
    pub provider: Arc<dyn ModelProvider>,
    pub audit: AuditSink,
    pub model: String,
    pub trust_forwarded: bool,
    pub max_request_bytes: usize,
}

impl AppState {
    pub fn new(config: &AppConfig, provider: Arc<dyn ModelProvider>) -> Self {
        let audit = AuditSink::new(
            config.privacy_mode,
            config.audit_log_file.as_deref(),
            &config.rotation,
        );
        Self {
            limiter: Arc::new(RateLimiter::new(config.rate)),
            provider,
            audit,
            model: config.model.clone(),
            trust_forwarded: config.trust_forwarded,
            max_request_bytes: config.max_request_bytes,
        }
    }
}

/// Build state from environment variables, wiring the real OpenAI-backed
/// provider.
pub fn build_state_from_env() -> anyhow::Result<AppState> {
    let config = AppConfig::from_env()?;
    let api_key = match &config.api_key {
        Some(key) => key.clone(),
        None => {
            tracing::warn!("OPENAI_API_KEY not set; model calls will fail upstream");
            String::new()
        }
    };
    let provider = OpenAiProvider::new(
        config.base_url.clone(),
        api_key,
        config.model.clone(),
        config.model_timeout_ms,
    )
    .context("failed to build model provider HTTP client")?;
    Ok(AppState::new(&config, Arc::new(provider)))
}

/// Build the Axum router. Serve it with
/// `into_make_service_with_connect_info::<SocketAddr>()` so per-client
/// identity derivation has a peer address to fall back on.
pub fn app(state: AppState) -> Router {
    let max_request_bytes = state.max_request_bytes;
    Router::new()
        .route("/", get(root_handler))
        .route("/api/health", get(health_handler))
        .route("/api/stories/analyze", post(analyze_handler))
        .fallback(fallback_handler)
        .layer(DefaultBodyLimit::max(max_request_bytes))
        .with_state(state)
}

async fn root_handler() -> Response {
    let body = json!({
        "status": "ok",
        "message": "FairlyHuman API root. Try GET /api/health",
    });
    (StatusCode::OK, Json(body)).into_response()
}

async fn health_handler() -> Response {
    let body = json!({
        "status": "ok",
        "message": "FairlyHuman backend alive",
    });
    (StatusCode::OK, Json(body)).into_response()
}

async fn fallback_handler(method: Method, uri: Uri) -> Response {
    let body = json!({
        "error": "Route not found",
        "path": uri.path(),
        "method": method.as_str(),
    });
    (StatusCode::NOT_FOUND, Json(body)).into_response()
}

/// Derive the rate-limit client identity. Behind a trusted proxy the first
/// `X-Forwarded-For` hop is the client; otherwise the peer address is used
/// so a spoofed header cannot reset someone's window.
fn client_identity(headers: &HeaderMap, peer: SocketAddr, trust_forwarded: bool) -> String {
    if trust_forwarded {
        if let Some(forwarded) = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty())
        {
            return forwarded.to_string();
        }
    }
    peer.ip().to_string()
}

/// Handler for `POST /api/stories/analyze`. Admission gates run first and
/// inspect only timing and identity; the body is parsed and validated only
/// for admitted requests, then scrubbed, sent to the model, and the model's
/// output is re-validated before enrichment.
async fn analyze_handler(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    payload: Result<Json<Value>, JsonRejection>,
) -> Response {
    // Gate 1: per-client sliding window (cheaper, narrower check first).
    let client = client_identity(&headers, peer, state.trust_forwarded);
    let decision = state.limiter.check_client(&client);
    if !decision.admitted {
        return ApiError::ClientRateLimited(decision).into_response();
    }
    // Gate 2: global hourly failsafe across all clients.
    if !state.limiter.check_global() {
        return ApiError::GlobalRateLimited.into_response();
    }

    let body = match payload {
        Ok(Json(inner)) => inner,
        Err(rejection) => return handle_json_rejection(&state, rejection),
    };

    let request = match parse_analysis_request(&body) {
        Ok(request) => request,
        Err(details) => return ApiError::InvalidRequest(details).into_response(),
    };

    // Only the free-text story is scrubbed; context fields are structured
    // and pass through as-is.
    let scrubbed = scrub_story_text(&request.story_text);
    let user_payload = json!({
        "storyText": scrubbed,
        "context": &request.context,
    });

    // Exactly one attempt; no retries.
    let output = match state.provider.complete(FAIRNESS_PROMPT, &user_payload).await {
        Ok(output) => output,
        Err(err) => {
            return ApiError::Upstream(anyhow::Error::new(err).context("model call failed"))
                .into_response();
        }
    };

    // The model must never be trusted to stay inside declared bounds.
    let core = match parse_analysis_core(&output) {
        Ok(core) => core,
        Err(details) => {
            let fields: Vec<String> = details
                .iter()
                .map(|e| format!("{}: {}", e.field, e.message))
                .collect();
            return ApiError::Upstream(anyhow::anyhow!(
                "model output failed schema validation: {}",
                fields.join("; ")
            ))
            .into_response();
        }
    };

    let received_at = chrono::Utc::now().to_rfc3339();
    let story_length = request.story_text.chars().count();
    state.audit.record(&StoryAudit {
        story_length,
        received_at: received_at.clone(),
        unfairness_score: core.unfairness_score,
        model: state.model.clone(),
    });

    let analysis = FairlyHumanAnalysis {
        core,
        metadata: AnalysisMetadata {
            story_length,
            received_at,
            context: request.context,
            model: state.model.clone(),
        },
    };
    (StatusCode::OK, decision.headers(), Json(analysis)).into_response()
}

fn handle_json_rejection(state: &AppState, rejection: JsonRejection) -> Response {
    match rejection {
        JsonRejection::BytesRejection(BytesRejection::FailedToBufferBody(
            FailedToBufferBody::LengthLimitError(_),
        )) => {
            tracing::warn!(
                limit = state.max_request_bytes,
                "request body exceeded configured limit"
            );
            let body = json!({
                "error": format!(
                    "Request too large (body exceeded limit {} bytes)",
                    state.max_request_bytes
                ),
            });
            (StatusCode::PAYLOAD_TOO_LARGE, Json(body)).into_response()
        }
        JsonRejection::BytesRejection(bytes) => bytes.into_response(),
        other => other.into_response(),
    }
}
