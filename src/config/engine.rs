//! Statistics engine configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Statistics engine configuration.
///
/// The R `BOIN` package is the only engine a session can run against.
/// Unknown keys are rejected so a stale engine selection fails at startup.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Interpreter used to run the R package
    #[serde(default = "default_rscript_path")]
    pub rscript_path: String,

    /// Limit for a single engine call, in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Extra attempts after a transient failure
    #[serde(default = "default_retries")]
    pub max_retries: u32,
}

impl EngineConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.rscript_path.trim().is_empty() {
            return Err(ValidationError::EmptyRscriptPath);
        }
        if self.timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout("engine"));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            rscript_path: default_rscript_path(),
            timeout_secs: default_timeout(),
            max_retries: default_retries(),
        }
    }
}

fn default_rscript_path() -> String {
    "Rscript".to_string()
}

fn default_timeout() -> u64 {
    60
}

fn default_retries() -> u32 {
    1
}
