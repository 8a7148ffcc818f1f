//! Scripted conversational service for tests and offline runs.
//!
//! Replies are taken from a queue in order; when it runs dry every turn gets
//! the fallback text. Each request is kept so tests can inspect what the
//! turn handler actually sent.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::sleep;

use crate::ports::{AIError, AIProvider, ProviderInfo, StopReason, TokenUsage, TurnReply, TurnRequest};

/// Reply once the script is exhausted.
pub const DEFAULT_FALLBACK: &str =
    "I am running without a language model. Please state your BOIN design parameters.";

/// A failure the mock can be told to return.
///
/// `AIError` is not `Clone`, so scripts hold this instead.
#[derive(Debug, Clone)]
pub enum MockError {
    RateLimited { retry_after_secs: u32 },
    ContentFiltered { reason: String },
    Unavailable { message: String },
    AuthenticationFailed,
    Network { message: String },
    Timeout { timeout_secs: u32 },
}

impl From<MockError> for AIError {
    fn from(err: MockError) -> Self {
        match err {
            MockError::RateLimited { retry_after_secs } => AIError::rate_limited(retry_after_secs),
            MockError::ContentFiltered { reason } => AIError::content_filtered(reason),
            MockError::Unavailable { message } => AIError::unavailable(message),
            MockError::AuthenticationFailed => AIError::AuthenticationFailed,
            MockError::Network { message } => AIError::network(message),
            MockError::Timeout { timeout_secs } => AIError::Timeout { timeout_secs },
        }
    }
}

type Scripted = Result<(String, StopReason), MockError>;

#[derive(Debug, Clone)]
pub struct MockAIProvider {
    script: Arc<Mutex<VecDeque<Scripted>>>,
    requests: Arc<Mutex<Vec<TurnRequest>>>,
    fallback: String,
    delay: Duration,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Default for MockAIProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockAIProvider {
    pub fn new() -> Self {
        Self {
            script: Arc::default(),
            requests: Arc::default(),
            fallback: DEFAULT_FALLBACK.to_string(),
            delay: Duration::ZERO,
        }
    }

    pub fn with_response(self, content: impl Into<String>) -> Self {
        self.with_stopped_response(content, StopReason::Complete)
    }

    pub fn with_stopped_response(self, content: impl Into<String>, stop: StopReason) -> Self {
        lock(&self.script).push_back(Ok((content.into(), stop)));
        self
    }

    pub fn with_error(self, error: MockError) -> Self {
        lock(&self.script).push_back(Err(error));
        self
    }

    pub fn with_fallback(mut self, content: impl Into<String>) -> Self {
        self.fallback = content.into();
        self
    }

    /// Simulated latency per turn.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn call_count(&self) -> usize {
        lock(&self.requests).len()
    }

    pub fn get_calls(&self) -> Vec<TurnRequest> {
        lock(&self.requests).clone()
    }

    pub fn last_call(&self) -> Option<TurnRequest> {
        lock(&self.requests).last().cloned()
    }
}

#[async_trait]
impl AIProvider for MockAIProvider {
    async fn complete(&self, request: TurnRequest) -> Result<TurnReply, AIError> {
        // Rough four-characters-per-token estimate.
        let input_tokens = (request.contents.len() / 4) as u32;
        lock(&self.requests).push(request);

        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }

        let next = lock(&self.script).pop_front();
        let (content, stop_reason) = match next {
            Some(scripted) => scripted?,
            None => (self.fallback.clone(), StopReason::Complete),
        };

        Ok(TurnReply {
            usage: TokenUsage::new(input_tokens, (content.len() / 4) as u32),
            content,
            model: "mock-model-1".to_string(),
            stop_reason,
        })
    }

    fn provider_info(&self) -> ProviderInfo {
        ProviderInfo::new("mock", "mock-model-1")
    }
}
