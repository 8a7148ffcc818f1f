//! Argument records for the three BOIN operations.
//!
//! These are produced by the reply extractor and consumed by the statistics
//! gateway. Each record validates its own ranges before an engine sees it.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::ValidationError;

/// Target toxicity rate used when a request does not carry one.
pub const DEFAULT_TARGET: f64 = 0.3;

/// Number of cohorts used when a request does not carry one.
pub const DEFAULT_COHORT_COUNT: u32 = 10;

/// Patients per cohort used when a request does not carry one.
pub const DEFAULT_COHORT_SIZE: u32 = 3;

/// Arguments for the decision boundary table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundaryRequest {
    pub target: f64,
    pub cohort_count: u32,
    pub cohort_size: u32,
}

impl BoundaryRequest {
    pub fn new(target: f64, cohort_count: u32, cohort_size: u32) -> Self {
        Self {
            target,
            cohort_count,
            cohort_size,
        }
    }

    /// Checks the target is a proper rate and both cohort figures are positive.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_target(self.target)?;
        validate_positive("ncohort", self.cohort_count)?;
        validate_positive("cohortsize", self.cohort_size)
    }

    /// Largest number of patients the design can enrol.
    pub fn max_sample_size(&self) -> u32 {
        self.cohort_count.saturating_mul(self.cohort_size)
    }
}

/// Arguments for simulating operating characteristics.
///
/// Only the true toxicity probabilities come from the conversation; the
/// design figures take the package defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperatingCharacteristicsRequest {
    pub true_probabilities: Vec<f64>,
    pub target: f64,
    pub cohort_count: u32,
    pub cohort_size: u32,
}

impl OperatingCharacteristicsRequest {
    pub fn new(true_probabilities: Vec<f64>) -> Self {
        Self {
            true_probabilities,
            target: DEFAULT_TARGET,
            cohort_count: DEFAULT_COHORT_COUNT,
            cohort_size: DEFAULT_COHORT_SIZE,
        }
    }

    /// Number of dose levels in the scenario.
    pub fn dose_count(&self) -> usize {
        self.true_probabilities.len()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.true_probabilities.is_empty() {
            return Err(ValidationError::empty_field("ptrue"));
        }
        for &p in &self.true_probabilities {
            if !(0.0..=1.0).contains(&p) {
                return Err(ValidationError::out_of_range("ptrue", 0.0, 1.0, p));
            }
        }
        validate_target(self.target)?;
        validate_positive("ncohort", self.cohort_count)?;
        validate_positive("cohortsize", self.cohort_size)
    }
}

/// Arguments for selecting the maximum tolerated dose from trial data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MtdSelectionRequest {
    pub toxicity_counts: Vec<u32>,
    pub patient_counts: Vec<u32>,
    pub target: f64,
}

impl MtdSelectionRequest {
    pub fn new(toxicity_counts: Vec<u32>, patient_counts: Vec<u32>) -> Self {
        Self {
            toxicity_counts,
            patient_counts,
            target: DEFAULT_TARGET,
        }
    }

    /// Checks both vectors describe the same doses and no dose has more
    /// toxicities than patients.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.toxicity_counts.is_empty() {
            return Err(ValidationError::empty_field("ntox"));
        }
        if self.patient_counts.is_empty() {
            return Err(ValidationError::empty_field("npts"));
        }
        if self.toxicity_counts.len() != self.patient_counts.len() {
            return Err(ValidationError::invalid_format(
                "ntox",
                format!(
                    "{} dose levels but npts has {}",
                    self.toxicity_counts.len(),
                    self.patient_counts.len()
                ),
            ));
        }
        for (level, (&tox, &pts)) in self
            .toxicity_counts
            .iter()
            .zip(&self.patient_counts)
            .enumerate()
        {
            if tox > pts {
                return Err(ValidationError::invalid_format(
                    "ntox",
                    format!(
                        "dose level {} has {} toxicities among {} patients",
                        level + 1,
                        tox,
                        pts
                    ),
                ));
            }
        }
        validate_target(self.target)
    }
}

fn validate_target(target: f64) -> Result<(), ValidationError> {
    // Rejects NaN as well as the closed endpoints.
    if !(target > 0.0 && target < 1.0) {
        return Err(ValidationError::out_of_range("target", 0.0, 1.0, target));
    }
    Ok(())
}

fn validate_positive(field: &str, value: u32) -> Result<(), ValidationError> {
    if value == 0 {
        return Err(ValidationError::out_of_range(
            field,
            1.0,
            f64::from(u32::MAX),
            0.0,
        ));
    }
    Ok(())
}
