//! Conversation session configuration

use serde::Deserialize;
use std::path::PathBuf;

use super::error::ValidationError;
use crate::application::{EngineErrorDisplay, GatingPolicy};
use crate::domain::conversation::{InstructionProfile, TranscriptScope};

/// Guideline document shipped alongside the assistant.
pub const DEFAULT_REFERENCE_DOCUMENT: &str = "Real Guidelines for BOIN api LLM_.pdf";

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Conversation session configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Comma-separated reference document paths
    #[serde(default = "default_reference_documents")]
    pub reference_documents: String,

    #[serde(default)]
    pub instruction_profile: InstructionProfile,

    #[serde(default)]
    pub transcript_scope: TranscriptScope,

    #[serde(default)]
    pub gating_policy: GatingPolicy,

    #[serde(default)]
    pub engine_errors: EngineErrorDisplay,

    /// Log level used when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl SessionConfig {
    /// Reference document paths, skipping blank entries.
    pub fn reference_paths(&self) -> Vec<PathBuf> {
        self.reference_documents
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(PathBuf::from)
            .collect()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let level = self.log_level.trim().to_ascii_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            return Err(ValidationError::InvalidLogLevel(self.log_level.clone()));
        }
        Ok(())
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            reference_documents: default_reference_documents(),
            instruction_profile: InstructionProfile::default(),
            transcript_scope: TranscriptScope::default(),
            gating_policy: GatingPolicy::default(),
            engine_errors: EngineErrorDisplay::default(),
            log_level: default_log_level(),
        }
    }
}

fn default_reference_documents() -> String {
    DEFAULT_REFERENCE_DOCUMENT.to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}
