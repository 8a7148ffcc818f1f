//! Conversation entity - transcript plus confirmation state.

use serde::{Deserialize, Serialize};

use crate::domain::conversation::{ConfirmationGate, InstructionContext, Turn, TurnRole};
use crate::domain::foundation::{ConversationId, Timestamp};

/// Which prior turns are serialized into the outbound contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TranscriptScope {
    /// Every prior turn, labelled by speaker.
    #[default]
    Full,
    /// User turns only, concatenated with no separator or labels.
    UserOnly,
}

/// A named chat with its transcript and gate.
///
/// Turns are only ever appended in user/assistant pairs, so a failed call to
/// the conversational service leaves the transcript untouched.
#[derive(Debug, Clone)]
pub struct Conversation {
    id: ConversationId,
    name: String,
    turns: Vec<Turn>,
    gate: ConfirmationGate,
    created_at: Timestamp,
}

impl Conversation {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: ConversationId::new(),
            name: name.into(),
            turns: Vec::new(),
            gate: ConfirmationGate::new(),
            created_at: Timestamp::now(),
        }
    }

    // === Accessors ===

    pub fn id(&self) -> ConversationId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn gate(&self) -> &ConfirmationGate {
        &self.gate
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub fn boundaries_confirmed(&self) -> bool {
        self.gate.is_confirmed()
    }

    pub fn instruction_context(&self) -> InstructionContext {
        InstructionContext {
            boundaries_confirmed: self.boundaries_confirmed(),
        }
    }

    // === Mutations ===

    /// Runs the user's message through the confirmation gate.
    ///
    /// Must be called before the turn's instruction is assembled. Returns true
    /// when this message confirmed the boundaries.
    pub fn observe_user_message(&mut self, message: &str) -> bool {
        self.gate.observe(message)
    }

    /// Appends a completed user/assistant exchange.
    pub fn record_exchange(&mut self, user: impl Into<String>, assistant: impl Into<String>) {
        self.turns.push(Turn::user(user));
        self.turns.push(Turn::assistant(assistant));
    }

    // === Serialization ===

    /// Renders prior turns for the outbound contents.
    pub fn render_history(&self, scope: TranscriptScope) -> String {
        match scope {
            TranscriptScope::Full => self
                .turns
                .iter()
                .map(|turn| format!("{}: {}\n", turn.role.label(), turn.content))
                .collect(),
            TranscriptScope::UserOnly => self
                .turns
                .iter()
                .filter(|turn| turn.role == TurnRole::User)
                .map(|turn| turn.content.as_str())
                .collect(),
        }
    }

    /// Builds the text sent to the conversational service for a new input.
    ///
    /// Under `UserOnly` the new input is already part of the history block,
    /// then repeated after it.
    pub fn outbound_contents(&self, scope: TranscriptScope, input: &str) -> String {
        let mut history = self.render_history(scope);
        if scope == TranscriptScope::UserOnly {
            history.push_str(input);
        }
        format!("[chat history start]: {history}[chat history end]\nUser: {input}")
    }
}
