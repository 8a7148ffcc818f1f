//! Conversation command handlers.

mod send_turn;

pub use send_turn::{
    EngineErrorDisplay, GatingPolicy, SendTurnError, SendTurnHandler, TurnOutcome, TurnSettings,
};
