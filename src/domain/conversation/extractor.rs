//! Best-effort extraction of BOIN call arguments from model replies.
//!
//! The model is asked to restate parameters in a fixed textual form; this
//! module recognises those forms with regular expressions. It is not a
//! parser for free text and never fails loudly: a reply either yields one
//! call or nothing.
//!
//! Precedence is decided by trigger keywords alone. The first shape whose
//! keywords appear in the reply is the only one attempted.
//!
//! 1. `target` + `ncohort` + `cohortsize` → boundary table
//! 2. `ptrue` → operating characteristics
//! 3. `ntox` + `npts` → MTD selection
//!
//! Known limitation: the operating characteristics shape takes *every*
//! numeral in the reply as a probability, including ones that are not part
//! of the intended vector.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::domain::boin::{BoundaryRequest, MtdSelectionRequest, OperatingCharacteristicsRequest};

static BOUNDARY_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)target\s*=\s*([0-9.]+).*?ncohort\s*=\s*(\d+).*?cohortsize\s*=\s*(\d+)")
        .expect("boundary pattern compiles")
});

static NUMERAL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[0-9]*\.?[0-9]+").expect("numeral pattern compiles"));

static NTOX_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"ntox\s*=\s*\[(.*?)\]").expect("ntox pattern compiles"));

static NPTS_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"npts\s*=\s*\[(.*?)\]").expect("npts pattern compiles"));

/// Minimum number of numerals a `ptrue` reply must contain.
pub const MIN_PROBABILITY_COUNT: usize = 3;

/// The three argument shapes the extractor knows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallShape {
    Boundary,
    OperatingCharacteristics,
    MtdSelection,
}

impl CallShape {
    /// Name of the package function this shape feeds.
    pub fn function_name(&self) -> &'static str {
        match self {
            CallShape::Boundary => "get.boundary",
            CallShape::OperatingCharacteristics => "get.oc",
            CallShape::MtdSelection => "select.mtd",
        }
    }
}

impl fmt::Display for CallShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.function_name())
    }
}

/// A structured call recognised in one assistant reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum ExtractedCall {
    Boundary(BoundaryRequest),
    OperatingCharacteristics(OperatingCharacteristicsRequest),
    MtdSelection(MtdSelectionRequest),
}

impl ExtractedCall {
    pub fn shape(&self) -> CallShape {
        match self {
            ExtractedCall::Boundary(_) => CallShape::Boundary,
            ExtractedCall::OperatingCharacteristics(_) => CallShape::OperatingCharacteristics,
            ExtractedCall::MtdSelection(_) => CallShape::MtdSelection,
        }
    }
}

/// Why a reply produced no call. Only ever logged.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExtractionMiss {
    #[error("no trigger keywords present")]
    NoTrigger,

    #[error("{0} keywords present but the parameter pattern did not match")]
    PatternNotFound(CallShape),

    #[error("{shape}: could not parse value '{value}'")]
    Unparsable { shape: CallShape, value: String },

    #[error("get.oc: found {found} numerals, need at least {}", MIN_PROBABILITY_COUNT)]
    TooFewNumerals { found: usize },
}

/// Recognises BOIN call arguments in model replies.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParameterExtractor;

impl ParameterExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Returns the call carried by `reply`, if any.
    pub fn extract(&self, reply: &str) -> Option<ExtractedCall> {
        match self.try_extract(reply) {
            Ok(call) => {
                tracing::debug!(shape = %call.shape(), "extracted call from reply");
                Some(call)
            }
            Err(ExtractionMiss::NoTrigger) => None,
            Err(miss) => {
                tracing::debug!(reason = %miss, "reply triggered extraction but yielded no call");
                None
            }
        }
    }

    /// Like [`extract`](Self::extract) but reports why nothing was found.
    pub fn try_extract(&self, reply: &str) -> Result<ExtractedCall, ExtractionMiss> {
        if reply.contains("target") && reply.contains("ncohort") && reply.contains("cohortsize") {
            return extract_boundary(reply);
        }
        if reply.contains("ptrue") {
            return extract_probabilities(reply);
        }
        if reply.contains("ntox") && reply.contains("npts") {
            return extract_mtd(reply);
        }
        Err(ExtractionMiss::NoTrigger)
    }
}

fn extract_boundary(reply: &str) -> Result<ExtractedCall, ExtractionMiss> {
    let shape = CallShape::Boundary;
    let caps = BOUNDARY_PATTERN
        .captures(reply)
        .ok_or(ExtractionMiss::PatternNotFound(shape))?;

    let target = parse_capture::<f64>(shape, &caps[1])?;
    let cohort_count = parse_capture::<u32>(shape, &caps[2])?;
    let cohort_size = parse_capture::<u32>(shape, &caps[3])?;

    Ok(ExtractedCall::Boundary(BoundaryRequest::new(
        target,
        cohort_count,
        cohort_size,
    )))
}

fn extract_probabilities(reply: &str) -> Result<ExtractedCall, ExtractionMiss> {
    let shape = CallShape::OperatingCharacteristics;
    let numerals: Vec<&str> = NUMERAL_PATTERN.find_iter(reply).map(|m| m.as_str()).collect();
    if numerals.len() < MIN_PROBABILITY_COUNT {
        return Err(ExtractionMiss::TooFewNumerals {
            found: numerals.len(),
        });
    }

    let probabilities = numerals
        .into_iter()
        .map(|n| parse_capture::<f64>(shape, n))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ExtractedCall::OperatingCharacteristics(
        OperatingCharacteristicsRequest::new(probabilities),
    ))
}

fn extract_mtd(reply: &str) -> Result<ExtractedCall, ExtractionMiss> {
    let shape = CallShape::MtdSelection;
    let ntox = NTOX_PATTERN
        .captures(reply)
        .ok_or(ExtractionMiss::PatternNotFound(shape))?;
    let npts = NPTS_PATTERN
        .captures(reply)
        .ok_or(ExtractionMiss::PatternNotFound(shape))?;

    let toxicity_counts = parse_int_list(shape, &ntox[1])?;
    let patient_counts = parse_int_list(shape, &npts[1])?;

    Ok(ExtractedCall::MtdSelection(MtdSelectionRequest::new(
        toxicity_counts,
        patient_counts,
    )))
}

fn parse_int_list(shape: CallShape, list: &str) -> Result<Vec<u32>, ExtractionMiss> {
    list.split(',')
        .map(|item| parse_capture::<u32>(shape, item.trim()))
        .collect()
}

fn parse_capture<T: std::str::FromStr>(shape: CallShape, value: &str) -> Result<T, ExtractionMiss> {
    value.parse::<T>().map_err(|_| ExtractionMiss::Unparsable {
        shape,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn extract(reply: &str) -> Option<ExtractedCall> {
        ParameterExtractor::new().extract(reply)
    }

    mod boundary {
        use super::*;

        #[test]
        fn compact_assignment() {
            assert_eq!(
                extract("target=0.3, ncohort=10, cohortsize=3"),
                Some(ExtractedCall::Boundary(BoundaryRequest::new(0.3, 10, 3)))
            );
        }

        #[test]
        fn spread_over_lines_with_prose() {
            let reply = "Here is the design.\n\n| Parameter | Value |\n\
                         | target = 0.25 | toxicity |\n\
                         Number of cohorts: ncohort = 12\n\
                         and finally cohortsize = 3 patients each.";
            assert_eq!(
                extract(reply),
                Some(ExtractedCall::Boundary(BoundaryRequest::new(0.25, 12, 3)))
            );
        }

        #[test]
        fn first_match_wins() {
            let reply = "target = 0.3 ncohort = 10 cohortsize = 3; alt target = 0.25 ncohort = 8 cohortsize = 2";
            assert_eq!(
                extract(reply),
                Some(ExtractedCall::Boundary(BoundaryRequest::new(0.3, 10, 3)))
            );
        }

        #[test]
        fn keywords_without_pattern_yield_nothing() {
            let reply = "What target rate, ncohort and cohortsize would you like?";
            assert_eq!(extract(reply), None);
            assert_eq!(
                ParameterExtractor::new().try_extract(reply),
                Err(ExtractionMiss::PatternNotFound(CallShape::Boundary))
            );
        }

        #[test]
        fn malformed_target_yields_nothing() {
            let reply = "target = 0.3.1 ncohort = 10 cohortsize = 3";
            assert!(matches!(
                ParameterExtractor::new().try_extract(reply),
                Err(ExtractionMiss::Unparsable { shape: CallShape::Boundary, .. })
            ));
        }

        #[test]
        fn fields_must_appear_in_order() {
            let reply = "cohortsize=3, ncohort=10, target=0.3";
            assert_eq!(extract(reply), None);
            assert_eq!(
                ParameterExtractor::new().try_extract(reply),
                Err(ExtractionMiss::PatternNotFound(CallShape::Boundary))
            );
        }

        #[test]
        fn keywords_are_case_sensitive() {
            assert_eq!(extract("Target = 0.3, NCOHORT = 10, Cohortsize = 3"), None);
        }

        #[test]
        fn boundary_trigger_shadows_later_shapes() {
            // Boundary keywords present but malformed: ptrue is not tried.
            let reply = "target ncohort cohortsize ptrue = 0.1, 0.2, 0.3";
            assert_eq!(extract(reply), None);
        }
    }

    mod operating_characteristics {
        use super::*;

        #[test]
        fn collects_listed_probabilities() {
            assert_eq!(
                extract("ptrue = 0.1, 0.2, 0.3, 0.4"),
                Some(ExtractedCall::OperatingCharacteristics(
                    OperatingCharacteristicsRequest::new(vec![0.1, 0.2, 0.3, 0.4])
                ))
            );
        }

        #[test]
        fn sweeps_in_every_numeral() {
            assert_eq!(
                extract("use ptrue 0.1,0.2,0.3 with 5 doses"),
                Some(ExtractedCall::OperatingCharacteristics(
                    OperatingCharacteristicsRequest::new(vec![0.1, 0.2, 0.3, 5.0])
                ))
            );
        }

        #[test]
        fn leading_dot_numerals_are_read() {
            assert_eq!(
                extract("ptrue: .05 .1 .2"),
                Some(ExtractedCall::OperatingCharacteristics(
                    OperatingCharacteristicsRequest::new(vec![0.05, 0.1, 0.2])
                ))
            );
        }

        #[test]
        fn fewer_than_three_numerals_yield_nothing() {
            assert_eq!(
                ParameterExtractor::new().try_extract("ptrue = 0.1, 0.2"),
                Err(ExtractionMiss::TooFewNumerals { found: 2 })
            );
        }

        #[test]
        fn ptrue_shadows_mtd_shape() {
            let reply = "ptrue ntox = [1,2,3] npts = [6,6,6]";
            assert!(matches!(
                extract(reply),
                Some(ExtractedCall::OperatingCharacteristics(_))
            ));
        }
    }

    mod mtd_selection {
        use super::*;

        #[test]
        fn reads_both_lists() {
            assert_eq!(
                extract("ntox = [1,2,3] and npts = [6,6,6]"),
                Some(ExtractedCall::MtdSelection(MtdSelectionRequest::new(
                    vec![1, 2, 3],
                    vec![6, 6, 6]
                )))
            );
        }

        #[test]
        fn tolerates_spaces_inside_lists() {
            assert_eq!(
                extract("Data:\nntox=[0, 1, 3]\nnpts=[3, 6, 9]"),
                Some(ExtractedCall::MtdSelection(MtdSelectionRequest::new(
                    vec![0, 1, 3],
                    vec![3, 6, 9]
                )))
            );
        }

        #[test]
        fn missing_list_yields_nothing() {
            assert_eq!(extract("ntox = [1,2,3] but npts unknown"), None);
        }

        #[test]
        fn non_integer_entry_yields_nothing() {
            assert_eq!(extract("ntox = [1,2.5,3] npts = [6,6,6]"), None);
        }

        #[test]
        fn empty_list_yields_nothing() {
            assert_eq!(extract("ntox = [] npts = [6]"), None);
        }
    }

    #[test]
    fn reply_without_keywords_yields_nothing() {
        assert_eq!(
            ParameterExtractor::new().try_extract("A BOIN design needs a target rate."),
            Err(ExtractionMiss::NoTrigger)
        );
    }

    #[test]
    fn shape_names_match_package_functions() {
        assert_eq!(CallShape::Boundary.to_string(), "get.boundary");
        assert_eq!(CallShape::OperatingCharacteristics.to_string(), "get.oc");
        assert_eq!(CallShape::MtdSelection.to_string(), "select.mtd");
    }

    proptest! {
        #[test]
        fn boundary_found_through_arbitrary_filler(
            a in "[a-z ,.\n]{0,40}",
            b in "[a-z ,\n]{0,40}",
            c in "[a-z ,\n]{0,40}",
        ) {
            let reply = format!("{a}target=0.3{b}ncohort=10{c}cohortsize=3");
            prop_assert_eq!(
                extract(&reply),
                Some(ExtractedCall::Boundary(BoundaryRequest::new(0.3, 10, 3)))
            );
        }

        #[test]
        fn text_without_trigger_words_never_yields(reply in "[A-Zb-df-hj-np-z0-9 ,.=\\[\\]\n]{0,120}") {
            prop_assert_eq!(extract(&reply), None);
        }
    }
}
