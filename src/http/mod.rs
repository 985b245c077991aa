//! HTTP front end: one admission endpoint plus a health check.

mod handler;
mod server;

use axum::routing::get;
use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::ratelimit::RateLimiterBackend;

pub use handler::{
    handle_request, health, AdmissionQuery, ErrorResponse, MISSING_CLIENT_ID, RATE_LIMIT_EXCEEDED,
};
pub use server::{HttpServer, DEFAULT_SHUTDOWN_TIMEOUT};

/// Build the router for the admission endpoint.
///
/// `GET /?clientId=<id>` asks the limiter; `GET /healthz` reports liveness.
pub fn router<R: RateLimiterBackend + 'static>(rate_limiter: Arc<R>) -> Router {
    Router::new()
        .route("/", get(handle_request::<R>))
        .route("/healthz", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(rate_limiter)
}
