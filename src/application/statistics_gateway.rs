//! Statistics gateway.
//!
//! Validates extracted arguments, calls the statistics engine under a time
//! limit with one retry on transient failures, and renders the result as
//! the text block shown to the user.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::{sleep, timeout};

use crate::domain::boin::{BoundaryRequest, MtdSelectionRequest, OperatingCharacteristicsRequest};
use crate::domain::conversation::{CallShape, ExtractedCall};
use crate::domain::foundation::ValidationError;
use crate::ports::{EngineError, StatisticsEngine};

/// Gateway errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GatewayError {
    /// Arguments rejected before reaching the engine.
    #[error("invalid {shape} arguments: {source}")]
    InvalidInput {
        shape: CallShape,
        #[source]
        source: ValidationError,
    },

    /// The engine failed after all attempts.
    #[error("{shape} failed: {source}")]
    Engine {
        shape: CallShape,
        #[source]
        source: EngineError,
    },
}

impl GatewayError {
    pub fn shape(&self) -> CallShape {
        match self {
            GatewayError::InvalidInput { shape, .. } | GatewayError::Engine { shape, .. } => *shape,
        }
    }
}

/// Time limit and retry settings.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Limit for a single engine call.
    pub timeout: Duration,
    /// Extra attempts after a transient failure.
    pub max_retries: u32,
    /// Pause before a retry.
    pub retry_delay: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            max_retries: 1,
            retry_delay: Duration::from_millis(500),
        }
    }
}

impl GatewayConfig {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }
}

/// Front door to the statistics engine.
#[derive(Clone)]
pub struct StatisticsGateway {
    engine: Arc<dyn StatisticsEngine>,
    config: GatewayConfig,
}

impl StatisticsGateway {
    pub fn new(engine: Arc<dyn StatisticsEngine>, config: GatewayConfig) -> Self {
        Self { engine, config }
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Runs whichever operation an extracted call names.
    pub async fn run(&self, call: &ExtractedCall) -> Result<String, GatewayError> {
        match call {
            ExtractedCall::Boundary(req) => self.compute_boundary_table(req).await,
            ExtractedCall::OperatingCharacteristics(req) => {
                self.compute_operating_characteristics(req).await
            }
            ExtractedCall::MtdSelection(req) => self.select_mtd(req).await,
        }
    }

    /// Decision boundary table, one row per number of patients treated.
    pub async fn compute_boundary_table(
        &self,
        request: &BoundaryRequest,
    ) -> Result<String, GatewayError> {
        let shape = CallShape::Boundary;
        request
            .validate()
            .map_err(|source| GatewayError::InvalidInput { shape, source })?;
        let table = self
            .with_retry(shape, || self.engine.boundary_table(request))
            .await?;
        Ok(table.to_string())
    }

    /// Selection, allocation and toxicity percentages per dose.
    pub async fn compute_operating_characteristics(
        &self,
        request: &OperatingCharacteristicsRequest,
    ) -> Result<String, GatewayError> {
        let shape = CallShape::OperatingCharacteristics;
        request
            .validate()
            .map_err(|source| GatewayError::InvalidInput { shape, source })?;
        let oc = self
            .with_retry(shape, || self.engine.operating_characteristics(request))
            .await?;
        Ok(oc.to_string())
    }

    /// The selected maximum tolerated dose.
    pub async fn select_mtd(&self, request: &MtdSelectionRequest) -> Result<String, GatewayError> {
        let shape = CallShape::MtdSelection;
        request
            .validate()
            .map_err(|source| GatewayError::InvalidInput { shape, source })?;
        let mtd = self
            .with_retry(shape, || self.engine.select_mtd(request))
            .await?;
        Ok(mtd.to_string())
    }

    async fn with_retry<T, F, Fut>(&self, shape: CallShape, op: F) -> Result<T, GatewayError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, EngineError>>,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            tracing::info!(
                engine = self.engine.name(),
                function = shape.function_name(),
                attempt,
                "Calling statistics engine"
            );

            let result = match timeout(self.config.timeout, op()).await {
                Ok(result) => result,
                Err(_) => Err(EngineError::Timeout {
                    timeout_secs: self.config.timeout.as_secs(),
                }),
            };

            match result {
                Ok(value) => return Ok(value),
                Err(err) if err.is_transient() && attempt <= self.config.max_retries => {
                    tracing::warn!(
                        function = shape.function_name(),
                        attempt,
                        error = %err,
                        "Transient statistics engine failure, retrying"
                    );
                    if !self.config.retry_delay.is_zero() {
                        sleep(self.config.retry_delay).await;
                    }
                }
                Err(source) => return Err(GatewayError::Engine { shape, source }),
            }
        }
    }
}
