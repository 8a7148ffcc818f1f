//! Mock statistics engine for tests and offline runs.
//!
//! Returns scripted results, falling back to fixed canned values, and
//! records every call. Errors can be queued per operation to exercise the
//! gateway's retry and error display paths.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::sleep;

use crate::domain::boin::{
    BoundaryRequest, BoundaryRow, BoundaryTable, DecisionThresholds, MtdSelection,
    MtdSelectionRequest, OperatingCharacteristics, OperatingCharacteristicsRequest,
};
use crate::domain::conversation::CallShape;
use crate::ports::{EngineError, StatisticsEngine};

/// A recorded engine call.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    Boundary(BoundaryRequest),
    OperatingCharacteristics(OperatingCharacteristicsRequest),
    MtdSelection(MtdSelectionRequest),
}

impl EngineCall {
    pub fn shape(&self) -> CallShape {
        match self {
            EngineCall::Boundary(_) => CallShape::Boundary,
            EngineCall::OperatingCharacteristics(_) => CallShape::OperatingCharacteristics,
            EngineCall::MtdSelection(_) => CallShape::MtdSelection,
        }
    }
}

/// Mock statistics engine.
#[derive(Debug, Clone, Default)]
pub struct MockStatisticsEngine {
    boundary: Option<BoundaryTable>,
    oc: Option<OperatingCharacteristics>,
    mtd: Option<MtdSelection>,
    errors: Arc<Mutex<VecDeque<EngineError>>>,
    delay: Duration,
    calls: Arc<Mutex<Vec<EngineCall>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockStatisticsEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_boundary_table(mut self, table: BoundaryTable) -> Self {
        self.boundary = Some(table);
        self
    }

    pub fn with_operating_characteristics(mut self, oc: OperatingCharacteristics) -> Self {
        self.oc = Some(oc);
        self
    }

    pub fn with_mtd(mut self, mtd: MtdSelection) -> Self {
        self.mtd = Some(mtd);
        self
    }

    /// Queues an error returned by the next call, whatever its operation.
    pub fn with_error(self, error: EngineError) -> Self {
        lock(&self.errors).push_back(error);
        self
    }

    /// Sets simulated latency per call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    pub fn get_calls(&self) -> Vec<EngineCall> {
        lock(&self.calls).clone()
    }

    async fn record(&self, call: EngineCall) -> Result<(), EngineError> {
        lock(&self.calls).push(call);
        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }
        match lock(&self.errors).pop_front() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Boundaries of the standard design (target 0.3, cohorts of 3).
pub fn canned_boundary_table(request: &BoundaryRequest) -> BoundaryTable {
    const ROWS: [(u32, u32, u32, Option<u32>); 4] = [
        (3, 0, 2, None),
        (6, 1, 3, Some(4)),
        (9, 2, 4, Some(5)),
        (12, 2, 5, Some(7)),
    ];
    let max = request.max_sample_size();
    let rows = ROWS
        .iter()
        .filter(|(n, ..)| *n <= max.max(3))
        .map(|&(n, e, d, elim)| BoundaryRow {
            patients_treated: n,
            escalate_at_most: e,
            deescalate_at_least: d,
            eliminate_at_least: elim,
        })
        .collect();
    BoundaryTable::new(rows).with_thresholds(DecisionThresholds {
        escalation: 0.236,
        deescalation: 0.359,
    })
}

/// Operating characteristics with an even split across doses.
pub fn canned_operating_characteristics(dose_count: usize) -> OperatingCharacteristics {
    let share = if dose_count == 0 {
        0.0
    } else {
        100.0 / dose_count as f64
    };
    OperatingCharacteristics {
        selection_percent: vec![share; dose_count],
        patients_percent: vec![share; dose_count],
        toxicity_percent: vec![share; dose_count],
    }
}

#[async_trait]
impl StatisticsEngine for MockStatisticsEngine {
    async fn boundary_table(&self, request: &BoundaryRequest) -> Result<BoundaryTable, EngineError> {
        self.record(EngineCall::Boundary(request.clone())).await?;
        Ok(self
            .boundary
            .clone()
            .unwrap_or_else(|| canned_boundary_table(request)))
    }

    async fn operating_characteristics(
        &self,
        request: &OperatingCharacteristicsRequest,
    ) -> Result<OperatingCharacteristics, EngineError> {
        self.record(EngineCall::OperatingCharacteristics(request.clone()))
            .await?;
        Ok(self
            .oc
            .clone()
            .unwrap_or_else(|| canned_operating_characteristics(request.dose_count())))
    }

    async fn select_mtd(&self, request: &MtdSelectionRequest) -> Result<MtdSelection, EngineError> {
        self.record(EngineCall::MtdSelection(request.clone())).await?;
        Ok(self.mtd.unwrap_or_else(|| MtdSelection::dose(1)))
    }

    fn name(&self) -> &str {
        "mock"
    }
}
