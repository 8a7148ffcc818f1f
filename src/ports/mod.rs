//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! - `AIProvider` - The hosted conversational service
//! - `StatisticsEngine` - The BOIN statistics package
//! - `ReferenceLibrary` - Documents attached to every turn

mod ai_provider;
mod reference_library;
mod statistics_engine;

pub use ai_provider::{
    AIError, AIProvider, ProviderInfo, RequestMetadata, StopReason, TokenUsage, TurnReply,
    TurnRequest,
};
pub use reference_library::{DocumentError, LoadedDocuments, ReferenceDocument, ReferenceLibrary};
pub use statistics_engine::{EngineError, StatisticsEngine};
