//! Boundary confirmation gate.
//!
//! Each conversation starts with its decision boundaries unconfirmed. The
//! first user message that reads as an affirmation confirms them, and they
//! stay confirmed for the rest of the conversation.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::StateMachine;

/// Single words that count as an affirmation.
pub const AFFIRMATIVE_TOKENS: &[&str] = &[
    "yes",
    "y",
    "confirmed",
    "confirm",
    "proceed",
    "yea",
    "ye",
    "yeah",
    "agree",
    "continue",
];

/// Multi-word affirmations, matched as contiguous word sequences.
pub const AFFIRMATIVE_PHRASES: &[&str] = &[
    "go ahead",
    "u can go",
    "u can proceed",
    "u can continue",
    "proceed with the boundaries",
    "proceed with the rules",
];

/// Whether the user has accepted the decision boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryConfirmation {
    #[default]
    Pending,
    Confirmed,
}

impl StateMachine for BoundaryConfirmation {
    fn can_transition_to(&self, target: &Self) -> bool {
        matches!(
            (self, target),
            (BoundaryConfirmation::Pending, BoundaryConfirmation::Confirmed)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        match self {
            BoundaryConfirmation::Pending => vec![BoundaryConfirmation::Confirmed],
            BoundaryConfirmation::Confirmed => vec![],
        }
    }
}

/// Per-conversation confirmation state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConfirmationGate {
    state: BoundaryConfirmation,
}

impl ConfirmationGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> BoundaryConfirmation {
        self.state
    }

    pub fn is_confirmed(&self) -> bool {
        self.state == BoundaryConfirmation::Confirmed
    }

    /// Feeds a user message through the gate.
    ///
    /// Returns true only when this message moved the gate to confirmed.
    pub fn observe(&mut self, user_message: &str) -> bool {
        if self.is_confirmed() || !is_affirmative(user_message) {
            return false;
        }
        match self.state.transition_to(BoundaryConfirmation::Confirmed) {
            Ok(next) => {
                self.state = next;
                true
            }
            Err(_) => false,
        }
    }
}

/// Lowercases and strips ASCII punctuation.
pub fn normalize(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .filter(|c| !c.is_ascii_punctuation())
        .collect()
}

/// True when the message contains an affirmative word or phrase.
pub fn is_affirmative(message: &str) -> bool {
    let normalized = normalize(message.trim());
    let tokens: Vec<&str> = normalized.split_whitespace().collect();

    if tokens.iter().any(|t| AFFIRMATIVE_TOKENS.contains(t)) {
        return true;
    }

    AFFIRMATIVE_PHRASES.iter().any(|phrase| {
        let words: Vec<&str> = phrase.split_whitespace().collect();
        tokens.windows(words.len()).any(|w| w == words.as_slice())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    mod normalization {
        use super::*;

        #[test]
        fn lowercases_and_strips_punctuation() {
            assert_eq!(normalize("Yes!"), "yes");
            assert_eq!(normalize("O.K., Go-Ahead?"), "ok goahead");
        }

        #[test]
        fn keeps_non_ascii_letters() {
            assert_eq!(normalize("Sí, ¡claro!"), "sí ¡claro");
        }
    }

    mod affirmation {
        use super::*;

        #[test]
        fn single_tokens_affirm() {
            for msg in ["Yes!", "y", "CONFIRM.", "ok, proceed", "yeah sure", "I agree"] {
                assert!(is_affirmative(msg), "{msg:?} should affirm");
            }
        }

        #[test]
        fn phrases_affirm() {
            assert!(is_affirmative("Go ahead."));
            assert!(is_affirmative("u can continue please"));
        }

        #[test]
        fn refusals_do_not_affirm() {
            for msg in ["no thanks", "not yet", "change the target to 0.25", "yesterday"] {
                assert!(!is_affirmative(msg), "{msg:?} should not affirm");
            }
        }

        #[test]
        fn phrase_words_must_be_contiguous() {
            assert!(!is_affirmative("go on ahead"));
        }
    }

    mod gate {
        use super::*;

        #[test]
        fn starts_pending() {
            let gate = ConfirmationGate::new();
            assert_eq!(gate.state(), BoundaryConfirmation::Pending);
            assert!(!gate.is_confirmed());
        }

        #[test]
        fn affirmation_confirms() {
            let mut gate = ConfirmationGate::new();
            assert!(gate.observe("Yes!"));
            assert!(gate.is_confirmed());
        }

        #[test]
        fn refusal_keeps_pending() {
            let mut gate = ConfirmationGate::new();
            assert!(!gate.observe("no thanks"));
            assert!(!gate.is_confirmed());
        }

        #[test]
        fn second_affirmation_reports_no_transition() {
            let mut gate = ConfirmationGate::new();
            gate.observe("yes");
            assert!(!gate.observe("yes again"));
            assert!(gate.is_confirmed());
        }

        #[test]
        fn confirmed_is_terminal() {
            assert!(BoundaryConfirmation::Confirmed.is_terminal());
            assert!(BoundaryConfirmation::Confirmed
                .transition_to(BoundaryConfirmation::Pending)
                .is_err());
        }
    }

    proptest! {
        #[test]
        fn confirmation_survives_any_later_message(later in proptest::collection::vec(".{0,40}", 0..8)) {
            let mut gate = ConfirmationGate::new();
            gate.observe("confirm");
            for msg in &later {
                gate.observe(msg);
            }
            prop_assert!(gate.is_confirmed());
        }
    }
}
