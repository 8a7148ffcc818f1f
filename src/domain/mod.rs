//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared primitives (IDs, timestamps, errors, state machine)
//! - `boin` - BOIN call arguments, engine results and their rendering
//! - `conversation` - Transcripts, confirmation gate, instructions, extraction

pub mod boin;
pub mod conversation;
pub mod foundation;
