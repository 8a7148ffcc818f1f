//! BOIN design vocabulary.
//!
//! Argument records for the three package operations, the structured
//! results an engine returns, and their text rendering. No dose-finding
//! mathematics lives here; that belongs to the statistics engine.

mod params;
mod report;
mod results;

pub use params::{
    BoundaryRequest, MtdSelectionRequest, OperatingCharacteristicsRequest, DEFAULT_COHORT_COUNT,
    DEFAULT_COHORT_SIZE, DEFAULT_TARGET,
};
pub use report::{round1, BOUNDARY_COLUMNS, PATIENTS_HEADING, SELECTION_HEADING, TOXICITY_HEADING};
pub use results::{
    BoundaryRow, BoundaryTable, DecisionThresholds, MtdSelection, OperatingCharacteristics,
    NO_MTD_SENTINEL,
};
