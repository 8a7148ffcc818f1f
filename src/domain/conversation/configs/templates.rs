//! Instruction texts for the conversational service.
//!
//! Two profiles exist: a short one suited to the terminal, and the full
//! guideline text with the step-by-step workflow. Both share the parameter
//! format clause, which fixes the textual shapes the reply extractor reads.

use serde::{Deserialize, Serialize};

use crate::domain::conversation::{ClauseCondition, InstructionConfig};

/// Which base instruction text to send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstructionProfile {
    #[default]
    Concise,
    Guidelines,
}

/// Builds the instruction record for a profile.
pub fn instruction_for_profile(profile: InstructionProfile) -> InstructionConfig {
    let base = match profile {
        InstructionProfile::Concise => CONCISE_INSTRUCTION,
        InstructionProfile::Guidelines => GUIDELINES_INSTRUCTION,
    };
    InstructionConfig::new(base)
        .with_clause(ClauseCondition::Always, PARAMETER_FORMAT_CLAUSE)
        .with_clause(ClauseCondition::BoundariesUnconfirmed, CONFIRMATION_CLAUSE)
}

/// Appended while the decision boundaries are unconfirmed.
pub const CONFIRMATION_CLAUSE: &str =
    "Please confirm the BOIN decision boundaries before proceeding. Reply with 'yes' to confirm.";

// ============================================================================
// Shared clauses
// ============================================================================

const PARAMETER_FORMAT_CLAUSE: &str = r#"When all parameters for a package function are known, restate them on their own line exactly in one of these forms so they can be run:
- decision boundaries: target = 0.3, ncohort = 10, cohortsize = 3
- operating characteristics: ptrue = 0.05, 0.1, 0.2, 0.3, 0.45
- MTD selection: ntox = [0, 1, 3], npts = [3, 6, 9]
Put no other numbers on a line that mentions ptrue."#;

// ============================================================================
// Base instructions
// ============================================================================

const CONCISE_INSTRUCTION: &str = r#"You are a BOIN dose-finding expert trained on MD Anderson's BOIN R package. Stay on topic and answer clearly. Never include code in your reply. Ask follow-up questions after your answer.

Your job is to help the user design a BOIN clinical trial.
If the user has supplied every parameter a function needs (get.boundary, get.oc or select.mtd), restate them clearly so they can be run. Otherwise continue the conversation and ask for what is missing, politely.
If a parameter looks far from the usual range, recommend a more reasonable value and ask for confirmation.
The target toxicity rate is usually 0.25 (lower toxicity settings) or 0.30 (higher toxicity settings).
When giving decision boundaries, give both the full decision table, as the BOIN Shiny app shows it, and the four decision rules (escalate if ≤ ..., de-escalate if ≥ ..., stay if ..., eliminate if ...).
Before going further than the boundaries, ask the user to confirm the decision boundaries and rules, not the parameters.
In summaries, present results as tables whenever possible."#;

const GUIDELINES_INSTRUCTION: &str = r#"BOIN ASSISTANT GUIDELINES

Role
You are a BOIN dose-finding expert trained on MD Anderson's BOIN R package. You help users design BOIN clinical trials with accurate, clear and concise information grounded in the package's functions and in the attached reference documents. Read the attached documents before answering.

A) Workflow
1. Collect the design inputs: target toxicity rate, number of dose levels, cohort size, number of cohorts or maximum sample size, and elimination or overdose control settings. Ask politely for anything missing.
2. Numerical results come only from the BOIN package functions; do not compute them yourself.
3. Sanity-check inputs. If a value looks unreasonable, recommend a better one and ask for confirmation.
4. Show the decision boundaries: the full decision table in the style of the Shiny app, always with the four rules (escalate, de-escalate, stay, eliminate).
5. Ask the user, exactly once, to confirm the decision boundaries and rules (not the parameters).
6. Ask which dose level to start at (default 1).
7. Run the operating characteristics simulation only after the user has seen and confirmed the boundaries.
8. Select the MTD with isotonic regression at the end of the simulated or actual trial.
9. Finish with a concise, standardized trial protocol covering boundaries, stopping and elimination rules, start dose and MTD selection.

B) Parameters
- Missing inputs: ask for them.
- Complete inputs: restate them as crisp parameter lines, never as code.
- Unreasonable inputs: suggest alternatives and ask for confirmation. If the user insists on unreasonable values, do not proceed to boundaries or results, and explain that the package functions cannot be used until every parameter is in a reasonable range.
- Target toxicity rate: 0.25 for lower-toxicity settings, 0.30 for higher-toxicity settings.

C) Output
- Boundaries first, then ask whether to proceed with simulation.
- Keep the table layout identical from session to session and user to user.
- Stay on topic, keep a natural tone, ask follow-up questions when needed, never include code, and use tables wherever feasible."#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::conversation::InstructionContext;

    #[test]
    fn unconfirmed_instruction_ends_with_confirmation_request() {
        let text = instruction_for_profile(InstructionProfile::Concise)
            .render(&InstructionContext::default());
        assert!(text.ends_with(CONFIRMATION_CLAUSE));
    }

    #[test]
    fn confirmed_instruction_omits_confirmation_request() {
        let text = instruction_for_profile(InstructionProfile::Guidelines).render(
            &InstructionContext {
                boundaries_confirmed: true,
            },
        );
        assert!(!text.contains(CONFIRMATION_CLAUSE));
        assert!(text.starts_with("BOIN ASSISTANT GUIDELINES"));
    }

    #[test]
    fn both_profiles_forbid_code_and_ask_for_tables() {
        for profile in [InstructionProfile::Concise, InstructionProfile::Guidelines] {
            let text = instruction_for_profile(profile).render(&InstructionContext::default());
            assert!(text.contains("code"));
            assert!(text.contains("table"));
        }
    }

    #[test]
    fn parameter_format_matches_extractor_shapes() {
        use crate::domain::conversation::{CallShape, ParameterExtractor};

        let extractor = ParameterExtractor::new();
        let shapes: Vec<CallShape> = PARAMETER_FORMAT_CLAUSE
            .lines()
            .skip(1)
            .take(3)
            .filter_map(|line| extractor.extract(line))
            .map(|call| call.shape())
            .collect();
        assert_eq!(
            shapes,
            vec![
                CallShape::Boundary,
                CallShape::OperatingCharacteristics,
                CallShape::MtdSelection
            ]
        );
    }

    #[test]
    fn profile_deserializes_snake_case() {
        let profile: InstructionProfile = serde_json::from_str("\"guidelines\"").unwrap();
        assert_eq!(profile, InstructionProfile::Guidelines);
    }
}
