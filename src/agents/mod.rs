//! AI-powered summary agents.
//!
//! Agents turn processed statistics into prose using a hosted chat model.
//! All agents implement the `Agent` trait; a failing agent never takes the
//! rest of a view down with it.

pub mod backend;
pub mod comparison;

pub use backend::{AiBackend, ChatMessage, ChatRequest, ChatResponse, OpenAiBackend};
pub use comparison::{ComparisonAgent, ComparisonInput, PlayerSummary};

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur during agent execution.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AgentError {
    #[error("AI backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("AI response unparseable: {0}")]
    ResponseParseError(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),
}

impl AgentError {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            AgentError::BackendUnavailable(_) => "AI_UNAVAILABLE",
            AgentError::ResponseParseError(_) => "AI_BAD_RESPONSE",
            AgentError::Timeout(_) => "AI_TIMEOUT",
            AgentError::RateLimited(_) => "AI_RATE_LIMITED",
        }
    }
}

/// Core trait for all AI agents.
#[async_trait]
pub trait Agent {
    type Input;
    type Output;

    /// Agent identifier for logging.
    fn name(&self) -> &'static str;

    /// Execute the agent's task.
    async fn execute(&self, input: Self::Input) -> Result<Self::Output, AgentError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_error_codes_and_messages() {
        let timeout = AgentError::Timeout(Duration::from_secs(30));
        assert_eq!(timeout.code(), "AI_TIMEOUT");
        assert_eq!(timeout.to_string(), "Timeout after 30s");
        assert_eq!(
            AgentError::Timeout(Duration::from_millis(20)).to_string(),
            "Timeout after 20ms"
        );
        assert_eq!(
            AgentError::BackendUnavailable("down".into()).to_string(),
            "AI backend unavailable: down"
        );
    }
}
