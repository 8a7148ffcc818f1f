//! Conversation domain module.
//!
//! Transcript management, the boundary confirmation gate, instruction
//! assembly and the best-effort parameter extractor that reads the
//! conversational service's replies.

mod conversation;
mod extractor;
mod gate;
mod instruction;
mod message;
mod registry;
pub mod configs;

pub use configs::{instruction_for_profile, InstructionProfile, CONFIRMATION_CLAUSE};
pub use conversation::{Conversation, TranscriptScope};
pub use extractor::{
    CallShape, ExtractedCall, ExtractionMiss, ParameterExtractor, MIN_PROBABILITY_COUNT,
};
pub use gate::{
    is_affirmative, normalize, BoundaryConfirmation, ConfirmationGate, AFFIRMATIVE_PHRASES,
    AFFIRMATIVE_TOKENS,
};
pub use instruction::{ClauseCondition, ConditionalClause, InstructionConfig, InstructionContext};
pub use message::{Turn, TurnRole};
pub use registry::{ConversationRegistry, RegistryError};
