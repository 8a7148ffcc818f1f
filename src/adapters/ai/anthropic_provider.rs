//! Anthropic Messages API provider.
//!
//! A turn becomes one `user` message whose content is the reference
//! documents as `document` blocks followed by a single text block. PDFs go
//! as base64 sources, text documents as plain-text sources; the API takes
//! no other document kinds. The instruction goes in `system`.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::{header::HeaderMap, Client};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::http::{build_client, status_error, transport_error, with_backoff};
use crate::ports::{
    AIError, AIProvider, ProviderInfo, ReferenceDocument, StopReason, TokenUsage, TurnReply,
    TurnRequest,
};

pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

const API_VERSION: &str = "2023-06-01";
const DEFAULT_RETRY_AFTER_SECS: u32 = 60;

/// Connection settings for the Messages API.
#[derive(Debug, Clone)]
pub struct AnthropicConfig {
    api_key: Secret<String>,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
    pub max_retries: u32,
    /// The API requires a cap; used when the turn does not set one.
    pub max_tokens: u32,
}

impl AnthropicConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Secret::new(api_key.into()),
            model: DEFAULT_MODEL.to_string(),
            base_url: "https://api.anthropic.com".to_string(),
            timeout: Duration::from_secs(120),
            max_retries: 3,
            max_tokens: 4096,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

pub struct AnthropicProvider {
    config: AnthropicConfig,
    client: Client,
}

impl AnthropicProvider {
    pub fn new(config: AnthropicConfig) -> Result<Self, AIError> {
        let client = build_client(config.timeout)?;
        Ok(Self { config, client })
    }

    fn messages_body(&self, request: &TurnRequest) -> MessagesBody {
        let mut content: Vec<Block> = request
            .documents
            .iter()
            .filter_map(|doc| {
                let source = document_source(doc);
                if source.is_none() {
                    tracing::warn!(
                        document = %doc.name,
                        media_type = %doc.media_type,
                        trace_id = %request.metadata.trace_id,
                        "Leaving out a document the Messages API cannot take"
                    );
                }
                source.map(|source| Block::Document {
                    title: doc.name.clone(),
                    source,
                })
            })
            .collect();
        content.push(Block::Text {
            text: request.contents.clone(),
        });

        MessagesBody {
            model: self.config.model.clone(),
            system: Some(request.system_instruction.clone()).filter(|s| !s.is_empty()),
            max_tokens: request.max_tokens.unwrap_or(self.config.max_tokens),
            temperature: request.temperature,
            messages: vec![UserMessage {
                role: "user",
                content,
            }],
        }
    }

    async fn post(&self, body: &MessagesBody) -> Result<TurnReply, AIError> {
        let response = self
            .client
            .post(format!("{}/v1/messages", self.config.base_url))
            .header("x-api-key", self.config.api_key.expose_secret())
            .header("anthropic-version", API_VERSION)
            .json(body)
            .send()
            .await
            .map_err(|e| transport_error(e, self.config.timeout))?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = retry_after_header(response.headers());
            let text = response.text().await.unwrap_or_default();
            return Err(status_error(status, text, retry_after));
        }

        let parsed: MessagesResponse = response
            .json()
            .await
            .map_err(|e| AIError::parse(format!("messages response: {}", e)))?;
        Ok(parsed.into_reply())
    }
}

fn document_source(doc: &ReferenceDocument) -> Option<DocumentSource> {
    if doc.is_pdf() {
        return Some(DocumentSource::Base64 {
            media_type: "application/pdf",
            data: STANDARD.encode(&doc.bytes),
        });
    }
    doc.text().map(|text| DocumentSource::Text {
        media_type: "text/plain",
        data: text.to_string(),
    })
}

fn retry_after_header(headers: &HeaderMap) -> u32 {
    headers
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(DEFAULT_RETRY_AFTER_SECS)
}

#[async_trait]
impl AIProvider for AnthropicProvider {
    async fn complete(&self, request: TurnRequest) -> Result<TurnReply, AIError> {
        let body = self.messages_body(&request);
        with_backoff(
            "anthropic",
            self.config.max_retries,
            &request.metadata.trace_id,
            || self.post(&body),
        )
        .await
    }

    fn provider_info(&self) -> ProviderInfo {
        ProviderInfo::new("anthropic", &self.config.model)
    }
}

// Wire format

#[derive(Debug, Serialize)]
struct MessagesBody {
    model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    messages: Vec<UserMessage>,
}

#[derive(Debug, Serialize)]
struct UserMessage {
    role: &'static str,
    content: Vec<Block>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Block {
    Document { title: String, source: DocumentSource },
    Text { text: String },
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum DocumentSource {
    Base64 {
        media_type: &'static str,
        data: String,
    },
    Text {
        media_type: &'static str,
        data: String,
    },
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    model: String,
    content: Vec<ReplyBlock>,
    stop_reason: Option<String>,
    usage: Usage,
}

#[derive(Debug, Deserialize)]
struct ReplyBlock {
    #[serde(rename = "type")]
    kind: String,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    input_tokens: u32,
    output_tokens: u32,
}

impl MessagesResponse {
    fn into_reply(self) -> TurnReply {
        let content: String = self
            .content
            .into_iter()
            .filter(|block| block.kind == "text")
            .filter_map(|block| block.text)
            .collect();

        let stop_reason = match self.stop_reason.as_deref() {
            Some("max_tokens") => StopReason::Truncated,
            Some("refusal") => StopReason::Blocked,
            _ => StopReason::Complete,
        };

        TurnReply {
            content,
            usage: TokenUsage::new(self.usage.input_tokens, self.usage.output_tokens),
            model: self.model,
            stop_reason,
        }
    }
}
