//! HTTP transport abstraction.
//!
//! The client only needs "GET this path, give me status + body". Keeping that
//! behind a trait lets tests script responses and count network calls.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::Client;
use thiserror::Error;
use tracing::debug;
use url::Url;

/// Raw response handed back by a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
    /// Parsed `Retry-After` header, in seconds.
    pub retry_after_secs: Option<u64>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            retry_after_secs: None,
        }
    }

    pub fn with_retry_after(mut self, secs: u64) -> Self {
        self.retry_after_secs = Some(secs);
        self
    }
}

/// The request never produced a response (DNS, TLS, connect, timeout).
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct TransportError {
    pub message: String,
    pub timed_out: bool,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            timed_out: false,
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        Self {
            timed_out: e.is_timeout(),
            message: e.to_string(),
        }
    }
}

/// Issues GET requests relative to the API base URL.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Transport name for logging.
    fn name(&self) -> &'static str;

    /// GET `path` (already percent-encoded, starting with `/`).
    async fn get(&self, path: &str) -> Result<HttpResponse, TransportError>;
}

/// reqwest-backed transport with bearer authentication.
pub struct ReqwestTransport {
    client: Client,
    base_url: String,
}

impl ReqwestTransport {
    pub fn new(base_url: &Url, api_key: &str, timeout: Duration) -> Result<Self, TransportError> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", api_key))
            .map_err(|_| TransportError::new("API key contains characters not allowed in a header"))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("brawl-insight/", env!("CARGO_PKG_VERSION"))),
        );

        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.as_str().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    fn name(&self) -> &'static str {
        "reqwest"
    }

    async fn get(&self, path: &str) -> Result<HttpResponse, TransportError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {}", url);

        let response = self.client.get(&url).send().await?;
        let status = response.status().as_u16();
        let retry_after_secs = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse().ok());
        let body = response.text().await?;

        Ok(HttpResponse {
            status,
            body,
            retry_after_secs,
        })
    }
}

/// Scripted transport for tests.
///
/// Each path has a queue of outcomes; the last outcome repeats once the
/// queue is drained. Unknown paths answer 404.
#[cfg(test)]
pub struct MockTransport {
    routes: std::sync::Mutex<
        std::collections::HashMap<String, std::collections::VecDeque<Result<HttpResponse, TransportError>>>,
    >,
    calls: std::sync::Mutex<Vec<String>>,
    delay: Duration,
}

#[cfg(test)]
impl MockTransport {
    pub fn new() -> Self {
        Self {
            routes: Default::default(),
            calls: Default::default(),
            delay: Duration::ZERO,
        }
    }

    /// Delay every response, to widen race windows in concurrency tests.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn respond(self, path: &str, status: u16, body: &str) -> Self {
        self.push(path, Ok(HttpResponse::new(status, body)))
    }

    pub fn push(self, path: &str, outcome: Result<HttpResponse, TransportError>) -> Self {
        self.routes
            .lock()
            .unwrap()
            .entry(path.to_string())
            .or_default()
            .push_back(outcome);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[cfg(test)]
#[async_trait]
impl Transport for MockTransport {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn get(&self, path: &str) -> Result<HttpResponse, TransportError> {
        self.calls.lock().unwrap().push(path.to_string());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let mut routes = self.routes.lock().unwrap();
        match routes.get_mut(path) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
            Some(queue) => queue.front().cloned().unwrap(),
            None => Ok(HttpResponse::new(
                404,
                r#"{"reason": "notFound", "message": "Not found"}"#,
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn transport_for(server: &mockito::ServerGuard) -> ReqwestTransport {
        let base = Url::parse(&server.url()).unwrap();
        ReqwestTransport::new(&base, "test-key", Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_reqwest_transport_sends_bearer_and_returns_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", Matcher::Regex(r"^/players/(%23|#)ABC123$".to_string()))
            .match_header("authorization", "Bearer test-key")
            .match_header("accept", "application/json")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r##"{"tag": "#ABC123"}"##)
            .create_async()
            .await;

        let transport = transport_for(&server);
        let response = transport.get("/players/%23ABC123").await.unwrap();

        assert_eq!(response.status, 200);
        assert!(response.body.contains("#ABC123"));
        assert_eq!(response.retry_after_secs, None);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_reqwest_transport_reports_status_and_retry_after() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/brawlers")
            .with_status(429)
            .with_header("retry-after", "12")
            .with_body(r#"{"reason": "tooManyRequests"}"#)
            .create_async()
            .await;

        let transport = transport_for(&server);
        let response = transport.get("/brawlers").await.unwrap();

        assert_eq!(response.status, 429);
        assert_eq!(response.retry_after_secs, Some(12));
    }

    #[tokio::test]
    async fn test_reqwest_transport_connection_failure() {
        let base = Url::parse("http://127.0.0.1:1").unwrap();
        let transport = ReqwestTransport::new(&base, "k", Duration::from_secs(2)).unwrap();

        assert!(transport.get("/brawlers").await.is_err());
    }

    #[test]
    fn test_rejects_api_key_with_newline() {
        let base = Url::parse("https://api.example.com/v1").unwrap();
        assert!(ReqwestTransport::new(&base, "bad\nkey", Duration::from_secs(1)).is_err());
    }

    #[tokio::test]
    async fn test_mock_transport_queue_and_repeat() {
        let mock = MockTransport::new()
            .respond("/a", 500, "")
            .respond("/a", 200, "{}");

        assert_eq!(mock.get("/a").await.unwrap().status, 500);
        assert_eq!(mock.get("/a").await.unwrap().status, 200);
        assert_eq!(mock.get("/a").await.unwrap().status, 200);
        assert_eq!(mock.get("/missing").await.unwrap().status, 404);
        assert_eq!(mock.call_count(), 4);
    }
}
