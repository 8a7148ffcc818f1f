//! State machine trait for status enums.
//!
//! Gives lifecycle enums (such as the boundary confirmation gate) one way to
//! declare their legal transitions and get checked transitions for free.

use super::ValidationError;

/// Trait for status enums that represent state machines.
///
/// # Example
///
/// ```ignore
/// impl StateMachine for BoundaryConfirmation {
///     fn can_transition_to(&self, target: &Self) -> bool {
///         matches!((self, target), (Pending, Confirmed))
///     }
///
///     fn valid_transitions(&self) -> Vec<Self> {
///         match self {
///             Pending => vec![Confirmed],
///             Confirmed => vec![],
///         }
///     }
/// }
///
/// let next = current.transition_to(BoundaryConfirmation::Confirmed)?;
/// ```
pub trait StateMachine: Sized + Copy + PartialEq + std::fmt::Debug {
    /// Returns true if transition from self to target is valid.
    fn can_transition_to(&self, target: &Self) -> bool;

    /// Returns all valid target states from current state.
    fn valid_transitions(&self) -> Vec<Self>;

    /// Performs transition with validation, returning error if invalid.
    fn transition_to(&self, target: Self) -> Result<Self, ValidationError> {
        if self.can_transition_to(&target) {
            Ok(target)
        } else {
            Err(ValidationError::invalid_format(
                "state_transition",
                format!("Cannot transition from {:?} to {:?}", self, target),
            ))
        }
    }

    /// Checks if current state is terminal (no valid outgoing transitions).
    fn is_terminal(&self) -> bool {
        self.valid_transitions().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Turn {
        AwaitingInput,
        AwaitingReply,
        Finished,
    }

    impl StateMachine for Turn {
        fn can_transition_to(&self, target: &Self) -> bool {
            use Turn::*;
            matches!(
                (self, target),
                (AwaitingInput, AwaitingReply)
                    | (AwaitingReply, AwaitingInput)
                    | (AwaitingInput, Finished)
            )
        }

        fn valid_transitions(&self) -> Vec<Self> {
            use Turn::*;
            match self {
                AwaitingInput => vec![AwaitingReply, Finished],
                AwaitingReply => vec![AwaitingInput],
                Finished => vec![],
            }
        }
    }

    #[test]
    fn transition_to_accepts_declared_edge() {
        assert_eq!(
            Turn::AwaitingInput.transition_to(Turn::AwaitingReply),
            Ok(Turn::AwaitingReply)
        );
    }

    #[test]
    fn transition_to_rejects_undeclared_edge() {
        let err = Turn::AwaitingReply.transition_to(Turn::Finished).unwrap_err();
        assert_eq!(err.field(), "state_transition");
        assert!(err.to_string().contains("AwaitingReply"));
    }

    #[test]
    fn terminal_state_has_no_exits() {
        assert!(Turn::Finished.is_terminal());
        assert!(!Turn::AwaitingInput.is_terminal());
    }

    #[test]
    fn valid_transitions_agree_with_can_transition_to() {
        for state in [Turn::AwaitingInput, Turn::AwaitingReply, Turn::Finished] {
            for target in state.valid_transitions() {
                assert!(
                    state.can_transition_to(&target),
                    "{:?} -> {:?} should be allowed",
                    state,
                    target
                );
            }
        }
    }
}
