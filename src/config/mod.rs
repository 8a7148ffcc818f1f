//! Application configuration.
//!
//! Type-safe configuration loading from environment variables using the
//! `config` and `dotenvy` crates. Variables carry the `BOIN_ASSISTANT` prefix
//! and nested values are separated by double underscores.
//!
//! # Example
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use boin_assistant::config::AppConfig;
//!
//! // BOIN_ASSISTANT__AI__PROVIDER=anthropic, BOIN_ASSISTANT__ENGINE__TIMEOUT_SECS=30, ...
//! let config = AppConfig::load()?;
//! config.validate()?;
//! println!("Using {:?}", config.ai.provider);
//! # Ok(())
//! # }
//! ```

mod ai;
mod engine;
mod error;
mod session;

pub use ai::{AiConfig, AiProvider};
pub use engine::EngineConfig;
pub use error::{ConfigError, ValidationError};
pub use session::{SessionConfig, DEFAULT_REFERENCE_DOCUMENT};

use serde::Deserialize;

/// Root application configuration
///
/// Every section has defaults, so an empty environment yields a usable
/// configuration apart from the provider API key checked by [`AppConfig::validate`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Conversational service (Gemini/Anthropic/mock)
    #[serde(default)]
    pub ai: AiConfig,

    /// Statistics engine (Rscript/mock)
    #[serde(default)]
    pub engine: EngineConfig,

    /// Reference documents, instruction profile, gating and logging
    #[serde(default)]
    pub session: SessionConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present
    /// 2. Reads environment variables with `BOIN_ASSISTANT` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `BOIN_ASSISTANT__AI__PROVIDER=anthropic` -> `ai.provider = anthropic`
    /// - `BOIN_ASSISTANT__ENGINE__RSCRIPT_PATH=/usr/bin/Rscript` -> `engine.rscript_path`
    /// - `BOIN_ASSISTANT__SESSION__GATING_POLICY=enforced` -> `session.gating_policy`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("BOIN_ASSISTANT")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.ai.validate()?;
        self.engine.validate()?;
        self.session.validate()?;
        Ok(())
    }
}
