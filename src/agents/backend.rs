//! AI backend abstraction.
//!
//! The dashboard talks to any OpenAI-compatible chat completions endpoint.
//! Tests use `MockBackend`.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::AgentError;
use crate::config::AiConfig;

/// A message in a conversation with the AI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }
}

/// Request to the AI backend.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl ChatRequest {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn with_temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// Response from the AI backend.
#[derive(Debug, Clone)]
pub struct ChatResponse {
    pub content: String,
    pub model: String,
    pub tokens_used: Option<TokenUsage>,
}

#[derive(Debug, Clone, Default)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Trait for AI backends.
#[async_trait]
pub trait AiBackend: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &'static str;

    /// Send a chat completion request.
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, AgentError>;
}

/// OpenAI-compatible chat completions backend.
pub struct OpenAiBackend {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
    timeout_seconds: u64,
}

impl OpenAiBackend {
    pub fn new(
        base_url: &str,
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout_seconds: u64,
    ) -> Result<Self, AgentError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .map_err(|e| AgentError::BackendUnavailable(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.into(),
            api_key: api_key.into(),
            timeout_seconds,
        })
    }

    pub fn from_config(config: &AiConfig, api_key: &str) -> Result<Self, AgentError> {
        Self::new(
            &config.base_url,
            api_key,
            config.model.clone(),
            config.timeout_seconds,
        )
    }

    fn map_send_error(&self, e: reqwest::Error) -> AgentError {
        if e.is_timeout() {
            AgentError::Timeout(Duration::from_secs(self.timeout_seconds))
        } else {
            AgentError::BackendUnavailable(e.to_string())
        }
    }
}

/// OpenAI API request format.
#[derive(Debug, Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

/// OpenAI API response format.
#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    #[serde(default)]
    model: String,
    choices: Vec<OpenAiChoice>,
    #[serde(default)]
    usage: Option<OpenAiUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiResponseMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

#[async_trait]
impl AiBackend for OpenAiBackend {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, AgentError> {
        let url = format!("{}/chat/completions", self.base_url);

        let body = OpenAiRequest {
            model: &self.model,
            messages: &request.messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        debug!("Sending request to {}", url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let wait_secs = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(30);
            warn!("Chat completions rate limited, retry after {}s", wait_secs);
            return Err(AgentError::RateLimited(wait_secs));
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AgentError::BackendUnavailable(format!(
                "OpenAI API returned {}: {}",
                status,
                preview(&body)
            )));
        }

        let body_text = response.text().await.map_err(|e| self.map_send_error(e))?;
        let parsed: OpenAiResponse = serde_json::from_str(&body_text).map_err(|e| {
            warn!(
                "Failed to parse chat completion. Body: {}",
                preview(&body_text)
            );
            AgentError::ResponseParseError(format!("Invalid JSON: {}", e))
        })?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| AgentError::ResponseParseError("no completion choices".to_string()))?;

        Ok(ChatResponse {
            content,
            model: parsed.model,
            tokens_used: parsed.usage.map(|u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            }),
        })
    }
}

/// First 500 characters of a response body, for logs and errors.
fn preview(body: &str) -> &str {
    match body.char_indices().nth(500) {
        Some((end, _)) => &body[..end],
        None => body,
    }
}

/// Mock backend for testing.
#[cfg(test)]
pub struct MockBackend {
    response: Result<String, AgentError>,
    delay: Duration,
    requests: std::sync::Mutex<Vec<ChatRequest>>,
}

#[cfg(test)]
impl MockBackend {
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: Ok(response.into()),
            delay: Duration::ZERO,
            requests: Default::default(),
        }
    }

    pub fn failing(error: AgentError) -> Self {
        Self {
            response: Err(error),
            delay: Duration::ZERO,
            requests: Default::default(),
        }
    }

    /// Answer only after `delay`, to exercise caller timeouts.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[cfg(test)]
#[async_trait]
impl AiBackend for MockBackend {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, AgentError> {
        self.requests.lock().unwrap().push(request);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.response.clone().map(|content| ChatResponse {
            content,
            model: "mock".to_string(),
            tokens_used: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    fn backend_for(server: &mockito::ServerGuard) -> OpenAiBackend {
        OpenAiBackend::new(&server.url(), "sk-test", "gpt-4o", 5).unwrap()
    }

    #[test]
    fn test_chat_message_constructors() {
        let system = ChatMessage::system("You are helpful");
        assert_eq!(system.role, MessageRole::System);

        let user = ChatMessage::user("Hello");
        assert_eq!(user.role, MessageRole::User);
        assert_eq!(
            serde_json::to_value(&user).unwrap(),
            json!({"role": "user", "content": "Hello"})
        );
    }

    #[test]
    fn test_chat_request_builder() {
        let request = ChatRequest::new(vec![ChatMessage::user("Test")])
            .with_temperature(0.7)
            .with_max_tokens(300);

        assert_eq!(request.temperature, Some(0.7));
        assert_eq!(request.max_tokens, Some(300));
    }

    #[tokio::test]
    async fn test_openai_chat_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_header("authorization", "Bearer sk-test")
            .match_body(Matcher::PartialJson(json!({
                "model": "gpt-4o",
                "max_tokens": 300,
                "messages": [{"role": "user", "content": "Compare"}]
            })))
            .with_status(200)
            .with_body(
                json!({
                    "model": "gpt-4o-2024-08-06",
                    "choices": [{"index": 0, "message": {"role": "assistant", "content": "Player A leads."}}],
                    "usage": {"prompt_tokens": 120, "completion_tokens": 8, "total_tokens": 128}
                })
                .to_string(),
            )
            .create_async()
            .await;

        let request = ChatRequest::new(vec![ChatMessage::user("Compare")]).with_max_tokens(300);
        let response = backend_for(&server).chat(request).await.unwrap();

        assert_eq!(response.content, "Player A leads.");
        assert_eq!(response.model, "gpt-4o-2024-08-06");
        assert_eq!(response.tokens_used.unwrap().total_tokens, 128);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_openai_rate_limited() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(429)
            .with_header("retry-after", "7")
            .create_async()
            .await;

        let err = backend_for(&server)
            .chat(ChatRequest::new(vec![ChatMessage::user("x")]))
            .await
            .unwrap_err();
        assert_eq!(err, AgentError::RateLimited(7));
    }

    #[tokio::test]
    async fn test_openai_server_error_is_unavailable() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(503)
            .with_body("overloaded")
            .create_async()
            .await;

        let err = backend_for(&server)
            .chat(ChatRequest::new(vec![ChatMessage::user("x")]))
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::BackendUnavailable(ref m) if m.contains("overloaded")));
    }

    #[tokio::test]
    async fn test_openai_empty_choices_is_parse_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_body(r#"{"model": "gpt-4o", "choices": []}"#)
            .create_async()
            .await;

        let err = backend_for(&server)
            .chat(ChatRequest::new(vec![ChatMessage::user("x")]))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "AI_BAD_RESPONSE");
    }

    #[tokio::test]
    async fn test_mock_backend() {
        let backend = MockBackend::new("summary");
        let response = backend
            .chat(ChatRequest::new(vec![ChatMessage::user("Test")]))
            .await
            .unwrap();

        assert_eq!(response.content, "summary");
        assert_eq!(backend.requests().len(), 1);

        let failing = MockBackend::failing(AgentError::BackendUnavailable("down".into()));
        let err = failing
            .chat(ChatRequest::new(vec![ChatMessage::user("Test")]))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "AI_UNAVAILABLE");
    }
}
