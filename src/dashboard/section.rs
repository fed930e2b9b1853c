//! Independently failing view sections.

use serde::{Deserialize, Serialize};

use crate::agents::AgentError;
use crate::fetch::FetchError;

/// One part of a view: either its data or the reason it could not be built.
///
/// Serialized as `{"status": "ready", "data": ...}` or
/// `{"status": "unavailable", "message": ..., "code": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Section<T> {
    Ready { data: T },
    Unavailable { message: String, code: String },
}

impl<T> Section<T> {
    pub fn ready(data: T) -> Self {
        Section::Ready { data }
    }

    pub fn unavailable(message: impl Into<String>, code: impl Into<String>) -> Self {
        Section::Unavailable {
            message: message.into(),
            code: code.into(),
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Section::Ready { .. })
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            Section::Ready { data } => Some(data),
            Section::Unavailable { .. } => None,
        }
    }

    pub fn code(&self) -> Option<&str> {
        match self {
            Section::Ready { .. } => None,
            Section::Unavailable { code, .. } => Some(code),
        }
    }
}

impl<T> From<Result<T, FetchError>> for Section<T> {
    fn from(result: Result<T, FetchError>) -> Self {
        match result {
            Ok(data) => Section::ready(data),
            Err(e) => Section::unavailable(e.user_message(), e.code()),
        }
    }
}

impl<T> From<Result<T, AgentError>> for Section<T> {
    fn from(result: Result<T, AgentError>) -> Self {
        match result {
            Ok(data) => Section::ready(data),
            Err(e) => Section::unavailable(
                format!("AI analysis is unavailable right now ({}).", e),
                e.code(),
            ),
        }
    }
}
