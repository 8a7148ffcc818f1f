//! Structured results returned by a statistics engine.

use serde::{Deserialize, Serialize};

/// Dose level the BOIN package reports when every dose is too toxic.
pub const NO_MTD_SENTINEL: u32 = 99;

/// One row of the decision boundary table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundaryRow {
    /// Number of patients treated at the current dose.
    pub patients_treated: u32,
    /// Escalate when the DLT count is at most this value.
    pub escalate_at_most: u32,
    /// De-escalate when the DLT count is at least this value.
    pub deescalate_at_least: u32,
    /// Eliminate the dose when the DLT count is at least this value.
    /// `None` when too few patients have been treated to eliminate.
    pub eliminate_at_least: Option<u32>,
}

impl BoundaryRow {
    /// DLT counts for which the trial stays at the current dose.
    ///
    /// These are the counts strictly between the escalation and
    /// de-escalation boundaries; `None` when there are none.
    pub fn stay_range(&self) -> Option<(u32, u32)> {
        let low = self.escalate_at_most.checked_add(1)?;
        let high = self.deescalate_at_least.checked_sub(1)?;
        (low <= high).then_some((low, high))
    }
}

/// Rate-scale thresholds behind the count boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DecisionThresholds {
    /// Escalate when the observed DLT rate is at most this value.
    pub escalation: f64,
    /// De-escalate when the observed DLT rate is at least this value.
    pub deescalation: f64,
}

/// Decision boundary table for one design.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundaryTable {
    pub rows: Vec<BoundaryRow>,
    pub thresholds: Option<DecisionThresholds>,
}

impl BoundaryTable {
    pub fn new(rows: Vec<BoundaryRow>) -> Self {
        Self {
            rows,
            thresholds: None,
        }
    }

    pub fn with_thresholds(mut self, thresholds: DecisionThresholds) -> Self {
        self.thresholds = Some(thresholds);
        self
    }
}

/// Simulated operating characteristics, one entry per dose level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperatingCharacteristics {
    pub selection_percent: Vec<f64>,
    pub patients_percent: Vec<f64>,
    pub toxicity_percent: Vec<f64>,
}

/// Outcome of MTD selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MtdSelection {
    /// Selected dose level (1-based), or `None` when all doses are too toxic.
    pub dose_level: Option<u32>,
}

impl MtdSelection {
    pub fn dose(level: u32) -> Self {
        Self {
            dose_level: Some(level),
        }
    }

    pub fn none() -> Self {
        Self { dose_level: None }
    }

    /// Interprets the raw dose level printed by the package.
    pub fn from_engine_level(level: u32) -> Self {
        if level == NO_MTD_SENTINEL {
            Self::none()
        } else {
            Self::dose(level)
        }
    }
}
