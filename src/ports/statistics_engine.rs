//! Statistics Engine Port - Interface to the BOIN package.
//!
//! The dose-finding computations live in an external statistics package.
//! This port fixes the call contract for its three operations and returns
//! structured results; rendering them as text is the caller's business.
//!
//! Arguments are validated before they reach an engine.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::boin::{
    BoundaryRequest, BoundaryTable, MtdSelection, MtdSelectionRequest, OperatingCharacteristics,
    OperatingCharacteristicsRequest,
};

/// Port for the external statistics package.
#[async_trait]
pub trait StatisticsEngine: Send + Sync {
    /// `get.boundary`: escalation and de-escalation boundaries per sample size.
    async fn boundary_table(&self, request: &BoundaryRequest) -> Result<BoundaryTable, EngineError>;

    /// `get.oc`: simulated operating characteristics for the true toxicity rates.
    async fn operating_characteristics(
        &self,
        request: &OperatingCharacteristicsRequest,
    ) -> Result<OperatingCharacteristics, EngineError>;

    /// `select.mtd`: isotonic-regression MTD selection from observed counts.
    async fn select_mtd(&self, request: &MtdSelectionRequest) -> Result<MtdSelection, EngineError>;

    /// Engine name for logs.
    fn name(&self) -> &str;
}

/// Statistics engine errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// The engine process could not be started.
    #[error("failed to start statistics engine: {0}")]
    Spawn(String),

    /// The engine did not finish in time.
    #[error("statistics engine timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// The engine was killed before reporting a result.
    #[error("statistics engine terminated abnormally: {0}")]
    Crashed(String),

    /// The engine ran and reported an error.
    #[error("statistics engine reported an error: {0}")]
    Failed(String),

    /// The engine's output could not be read.
    #[error("unexpected statistics engine output: {0}")]
    Output(String),
}

impl EngineError {
    pub fn spawn(message: impl Into<String>) -> Self {
        Self::Spawn(message.into())
    }

    pub fn crashed(message: impl Into<String>) -> Self {
        Self::Crashed(message.into())
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }

    pub fn output(message: impl Into<String>) -> Self {
        Self::Output(message.into())
    }

    /// Returns true if a retry may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            EngineError::Spawn(_) | EngineError::Timeout { .. } | EngineError::Crashed(_)
        )
    }
}
