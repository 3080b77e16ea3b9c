//! AI assistant: prompt templating and relaying to a hosted chat-completion API.

pub mod backend;
pub mod openai;
pub mod prompt;
pub mod relay;

use serde::{Deserialize, Serialize};

pub use backend::{ChatBackend, CompletionRequest, DeltaStream, MockChatBackend};
pub use openai::OpenAiCompatibleClient;
pub use prompt::Panel;
pub use relay::{spawn_relay, StreamEvent};

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("Cannot reach AI service at {0}")]
    Connection(String),

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("AI service returned HTTP {status}: {message}")]
    Upstream { status: u16, message: String },

    #[error("Failed to parse AI service response: {0}")]
    ResponseParsing(String),

    #[error("AI service returned an empty response")]
    EmptyResponse,

    #[error("Stream interrupted: {0}")]
    Stream(String),

    #[error("Unsupported message role: {0}")]
    InvalidRole(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Client-supplied history may only carry user and assistant turns; the
/// system prompt is always added server-side.
pub fn validate_history(messages: &[ChatMessage]) -> Result<(), ChatError> {
    match messages.iter().find(|m| m.role == Role::System) {
        Some(_) => Err(ChatError::InvalidRole("system".into())),
        None => Ok(()),
    }
}
