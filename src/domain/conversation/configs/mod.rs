//! Instruction profiles.
//!
//! Defines the base instruction texts and the clauses layered on top of
//! them for each turn.

mod templates;

pub use templates::{instruction_for_profile, InstructionProfile, CONFIRMATION_CLAUSE};
