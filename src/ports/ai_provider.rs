//! Conversational service port.
//!
//! One request per user turn: the instruction text, the reference documents,
//! and a single content string holding the serialized transcript followed by
//! the new user input. The service answers with free text.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::ConversationId;
use crate::ports::ReferenceDocument;

/// A hosted language model that answers conversational turns.
#[async_trait]
pub trait AIProvider: Send + Sync {
    /// Sends one turn and waits for the whole reply.
    async fn complete(&self, request: TurnRequest) -> Result<TurnReply, AIError>;

    fn provider_info(&self) -> ProviderInfo;
}

/// Everything the service sees for one turn.
#[derive(Debug, Clone)]
pub struct TurnRequest {
    /// Instruction text, gating clause included.
    pub system_instruction: String,
    pub documents: Vec<ReferenceDocument>,
    /// `[chat history start]: ...[chat history end]\nUser: ...`
    pub contents: String,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub metadata: RequestMetadata,
}

impl TurnRequest {
    pub fn new(metadata: RequestMetadata, contents: impl Into<String>) -> Self {
        Self {
            system_instruction: String::new(),
            documents: Vec::new(),
            contents: contents.into(),
            max_tokens: None,
            temperature: None,
            metadata,
        }
    }

    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = instruction.into();
        self
    }

    pub fn with_documents(mut self, documents: Vec<ReferenceDocument>) -> Self {
        self.documents = documents;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// Correlation data carried into provider logs.
#[derive(Debug, Clone)]
pub struct RequestMetadata {
    pub conversation_id: ConversationId,
    pub trace_id: String,
}

impl RequestMetadata {
    pub fn new(conversation_id: ConversationId, trace_id: impl Into<String>) -> Self {
        Self {
            conversation_id,
            trace_id: trace_id.into(),
        }
    }
}

/// The service's answer to one turn.
#[derive(Debug, Clone)]
pub struct TurnReply {
    pub content: String,
    pub usage: TokenUsage,
    /// Model version reported by the service.
    pub model: String,
    pub stop_reason: StopReason,
}

/// Tokens billed for one turn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl TokenUsage {
    pub fn new(input_tokens: u32, output_tokens: u32) -> Self {
        Self {
            input_tokens,
            output_tokens,
        }
    }

    pub fn zero() -> Self {
        Self::default()
    }

    pub fn total(&self) -> u32 {
        self.input_tokens.saturating_add(self.output_tokens)
    }
}

/// Why the reply ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    Complete,
    /// Cut off by the output token cap.
    Truncated,
    /// Withheld or cut short by the service's safety filter.
    Blocked,
}

/// Which service and model answered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderInfo {
    pub name: String,
    pub model: String,
}

impl ProviderInfo {
    pub fn new(name: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
        }
    }
}

/// Conversational service failures.
///
/// All of them are shown to the user as recoverable; the session goes on.
#[derive(Debug, thiserror::Error)]
pub enum AIError {
    #[error("the service is rate limiting requests, retry in {retry_after_secs}s")]
    RateLimited { retry_after_secs: u32 },

    #[error("the reply was blocked: {reason}")]
    ContentFiltered { reason: String },

    #[error("the service is unavailable: {message}")]
    Unavailable { message: String },

    #[error("the API key was rejected")]
    AuthenticationFailed,

    #[error("network failure: {0}")]
    Network(String),

    /// The service answered with something we could not read.
    #[error("unreadable reply: {0}")]
    Parse(String),

    #[error("request rejected: {0}")]
    InvalidRequest(String),

    #[error("no reply within {timeout_secs}s")]
    Timeout { timeout_secs: u32 },
}

impl AIError {
    pub fn rate_limited(retry_after_secs: u32) -> Self {
        Self::RateLimited { retry_after_secs }
    }

    pub fn content_filtered(reason: impl Into<String>) -> Self {
        Self::ContentFiltered {
            reason: reason.into(),
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// Worth another attempt after a pause.
    pub fn is_retryable(&self) -> bool {
        match self {
            AIError::RateLimited { .. }
            | AIError::Unavailable { .. }
            | AIError::Network(_)
            | AIError::Timeout { .. } => true,
            AIError::ContentFiltered { .. }
            | AIError::AuthenticationFailed
            | AIError::Parse(_)
            | AIError::InvalidRequest(_) => false,
        }
    }
}
