//! Request handlers for the admission endpoint and health check.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::ratelimit::RateLimiterBackend;

/// Query string accepted by the admission endpoint.
#[derive(Debug, Deserialize)]
pub struct AdmissionQuery {
    #[serde(rename = "clientId")]
    pub client_id: Option<String>,
}

/// JSON body returned with every rejection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

pub const MISSING_CLIENT_ID: &str = "clientId is required";
pub const RATE_LIMIT_EXCEEDED: &str = "rate limit exceeded";

/// Decide whether the request identified by `clientId` may proceed.
///
/// A missing or empty id is rejected with `400` before the limiter is
/// consulted. Otherwise the limiter's answer maps to `429` (limited) or an
/// empty `204` (admitted).
pub async fn handle_request<R: RateLimiterBackend>(
    State(limiter): State<Arc<R>>,
    Query(query): Query<AdmissionQuery>,
) -> Response {
    let client_id = match query.client_id.as_deref() {
        Some(id) if !id.is_empty() => id,
        _ => {
            warn!("Received request without clientId");
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::new(MISSING_CLIENT_ID)),
            )
                .into_response();
        }
    };

    if limiter.is_limited(client_id) {
        debug!(client_id, "Rate limit exceeded");
        (
            StatusCode::TOO_MANY_REQUESTS,
            Json(ErrorResponse::new(RATE_LIMIT_EXCEEDED)),
        )
            .into_response()
    } else {
        StatusCode::NO_CONTENT.into_response()
    }
}

/// Liveness probe.
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
