//! API error taxonomy and response mapping.
//!
//! Three classes leave the analyze handler: invalid input (user-correctable,
//! reported with field-level detail), rate-limit rejections (retry-later
//! messages, not application errors) and upstream failures (logged with full
//! detail server-side, surfaced to the client only as a generic message plus
//! a static fallback payload so the UI always has something renderable).

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::ratelimit::ClientDecision;
use crate::schema::FieldError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("invalid request body")]
    InvalidRequest(Vec<FieldError>),
    #[error("per-client rate limit exceeded")]
    ClientRateLimited(ClientDecision),
    #[error("global rate limit exceeded")]
    GlobalRateLimited,
    #[error("upstream analysis failure: {0}")]
    Upstream(#[from] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::InvalidRequest(details) => (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "error": "Invalid request body",
                    "details": details,
                })),
            )
                .into_response(),
            ApiError::ClientRateLimited(decision) => {
                tracing::debug!(
                    limit = decision.limit,
                    reset_secs = decision.reset_secs,
                    "per-client rate limit exceeded"
                );
                let body = Json(json!({
                    "error": "Too many analysis requests from this client. \
                              Please wait a few minutes and try again.",
                }));
                (
                    StatusCode::TOO_MANY_REQUESTS,
                    decision.headers(),
                    body,
                )
                    .into_response()
            }
            ApiError::GlobalRateLimited => {
                tracing::info!("global analyze cap reached, shedding request");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    Json(json!({
                        "error": "Analysis temporarily unavailable due to high usage. \
                                  Please try again later.",
                    })),
                )
                    .into_response()
            }
            ApiError::Upstream(cause) => {
                // Full detail stays server-side; the client gets a static
                // fallback it can always render.
                tracing::error!(error = ?cause, "analysis failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "error": "Failed to analyze story at this time.",
                        "fallback": {
                            "analysisSummary":
                                "Something went wrong while generating your analysis. \
                                 You can try again in a little while.",
                            "suggestions": [
                                "If this situation feels urgent or unsafe, consider reaching \
                                 out to a trusted person, HR, or a qualified professional \
                                 for support."
                            ],
                        },
                    })),
                )
                    .into_response()
            }
        }
    }
}
