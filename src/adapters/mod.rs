//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `ai` - Conversational service providers (Gemini, Anthropic, mock)
//! - `statistics` - BOIN statistics engines (Rscript, mock)
//! - `documents` - Reference documents read from disk
//! - `cli` - The interactive prompt loop

pub mod ai;
pub mod cli;
pub mod documents;
pub mod statistics;
