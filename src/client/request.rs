//! HTTP client that issues admission requests for a single client id.

use reqwest::{StatusCode, Url};
use thiserror::Error;
use tracing::debug;

/// Errors a single admission request can end in.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request limit exceeded")]
    RateLimited,
    #[error("unexpected status code: {0}")]
    UnexpectedStatus(u16),
    #[error("failed to send request: {0}")]
    Request(#[from] reqwest::Error),
    #[error("request timed out")]
    Timeout,
}

/// Sends `GET <base>?clientId=<id>` to the admission endpoint.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    client_id: String,
    url: Url,
}

impl HttpClient {
    /// Create a client for `client_id` against `base_url`.
    pub fn new(base_url: &Url, client_id: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url, client_id)
    }

    /// Create a client that shares an existing connection pool.
    pub fn with_client(
        client: reqwest::Client,
        base_url: &Url,
        client_id: impl Into<String>,
    ) -> Self {
        let client_id = client_id.into();
        let mut url = base_url.clone();
        url.query_pairs_mut().append_pair("clientId", &client_id);

        Self {
            client,
            client_id,
            url,
        }
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// The full request URL, including the `clientId` query parameter.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Send one request and map the response status.
    pub async fn send_request(&self) -> Result<(), ClientError> {
        debug!(client_id = %self.client_id, url = %self.url, "Sending request");

        let response = self.client.get(self.url.clone()).send().await?;

        match response.status() {
            StatusCode::OK | StatusCode::NO_CONTENT => Ok(()),
            StatusCode::TOO_MANY_REQUESTS => Err(ClientError::RateLimited),
            status => Err(ClientError::UnexpectedStatus(status.as_u16())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::stub::spawn_stub;
    use axum::http::StatusCode as StubStatus;
    use std::sync::atomic::Ordering;

    #[test]
    fn test_client_id_appended_to_url() {
        let base = Url::parse("http://localhost:8080/").unwrap();
        let client = HttpClient::new(&base, "1");

        assert_eq!(client.url().as_str(), "http://localhost:8080/?clientId=1");
        assert_eq!(client.client_id(), "1");
    }

    #[test]
    fn test_client_id_is_escaped() {
        let base = Url::parse("http://localhost:8080/limit?x=y").unwrap();
        let client = HttpClient::new(&base, "a b&c");

        assert_eq!(
            client.url().as_str(),
            "http://localhost:8080/limit?x=y&clientId=a+b%26c"
        );
    }

    #[tokio::test]
    async fn test_send_request_success() {
        let stub = spawn_stub(StubStatus::OK, "test").await;

        tokio_test::assert_ok!(HttpClient::new(&stub.url, "test").send_request().await);
        assert_eq!(stub.hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_send_request_no_content() {
        let stub = spawn_stub(StubStatus::NO_CONTENT, "test").await;

        tokio_test::assert_ok!(HttpClient::new(&stub.url, "test").send_request().await);
    }

    #[tokio::test]
    async fn test_send_request_rate_limited() {
        let stub = spawn_stub(StubStatus::TOO_MANY_REQUESTS, "test").await;

        let err = HttpClient::new(&stub.url, "test")
            .send_request()
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::RateLimited));
        assert_eq!(err.to_string(), "request limit exceeded");
    }

    #[tokio::test]
    async fn test_send_request_unexpected_status() {
        let stub = spawn_stub(StubStatus::CONFLICT, "test").await;

        let err = HttpClient::new(&stub.url, "test")
            .send_request()
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::UnexpectedStatus(409)));
        assert_eq!(err.to_string(), "unexpected status code: 409");
    }

    #[tokio::test]
    async fn test_send_request_unreachable() {
        let base = Url::parse("http://127.0.0.1:1/").unwrap();

        let err = HttpClient::new(&base, "test").send_request().await.unwrap_err();
        assert!(matches!(err, ClientError::Request(_)));
    }
}
