//! AI Provider Adapters.
//!
//! Implementations of the AIProvider port.
//!
//! ## Available Adapters
//!
//! - `GeminiProvider` - Google Gemini models via `generateContent`
//! - `AnthropicProvider` - Anthropic Claude models via the Messages API
//! - `MockAIProvider` - Scripted replies for tests and offline runs

mod anthropic_provider;
mod gemini_provider;
mod http;
mod mock_provider;

pub use anthropic_provider::{
    AnthropicConfig, AnthropicProvider, DEFAULT_MODEL as ANTHROPIC_DEFAULT_MODEL,
};
pub use gemini_provider::{GeminiConfig, GeminiProvider, DEFAULT_MODEL as GEMINI_DEFAULT_MODEL};
pub use mock_provider::{MockAIProvider, MockError, DEFAULT_FALLBACK};
