//! Local admission endpoint stub for client tests.

use axum::extract::Query;
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use reqwest::Url;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::net::TcpListener;

pub(crate) struct Stub {
    pub url: Url,
    /// Requests that carried the expected client id
    pub hits: Arc<AtomicUsize>,
}

/// Serve `status` for every request on an ephemeral local port.
///
/// Only requests whose `clientId` equals `expected_id` are counted; any
/// other request gets a `400`.
pub(crate) async fn spawn_stub(status: StatusCode, expected_id: &'static str) -> Stub {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&hits);

    let app = Router::new().route(
        "/",
        get(move |Query(params): Query<HashMap<String, String>>| {
            let counter = Arc::clone(&counter);
            async move {
                if params.get("clientId").map(String::as_str) != Some(expected_id) {
                    return StatusCode::BAD_REQUEST;
                }
                counter.fetch_add(1, Ordering::SeqCst);
                status
            }
        }),
    );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    Stub {
        url: Url::parse(&format!("http://{addr}/")).unwrap(),
        hits,
    }
}
