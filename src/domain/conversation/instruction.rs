//! Composable system instruction.
//!
//! The instruction sent with each turn is a fixed base text plus clauses
//! that apply only in certain conversation states. Assembling it from a
//! record keeps the gating text independent of the base wording.

use serde::{Deserialize, Serialize};

/// When a clause is included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClauseCondition {
    Always,
    BoundariesUnconfirmed,
    BoundariesConfirmed,
}

impl ClauseCondition {
    pub fn applies(&self, ctx: &InstructionContext) -> bool {
        match self {
            ClauseCondition::Always => true,
            ClauseCondition::BoundariesUnconfirmed => !ctx.boundaries_confirmed,
            ClauseCondition::BoundariesConfirmed => ctx.boundaries_confirmed,
        }
    }
}

/// Conversation facts the clauses are evaluated against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InstructionContext {
    pub boundaries_confirmed: bool,
}

/// A piece of instruction text guarded by a condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionalClause {
    pub condition: ClauseCondition,
    pub text: String,
}

/// Base instruction plus conditional clauses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstructionConfig {
    base: String,
    clauses: Vec<ConditionalClause>,
}

impl InstructionConfig {
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            clauses: Vec::new(),
        }
    }

    pub fn with_clause(mut self, condition: ClauseCondition, text: impl Into<String>) -> Self {
        self.clauses.push(ConditionalClause {
            condition,
            text: text.into(),
        });
        self
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn clauses(&self) -> &[ConditionalClause] {
        &self.clauses
    }

    /// Renders the instruction for one turn.
    ///
    /// Applicable clauses follow the base, one per line, in insertion order.
    pub fn render(&self, ctx: &InstructionContext) -> String {
        let mut out = self.base.trim().to_string();
        for clause in self.clauses.iter().filter(|c| c.condition.applies(ctx)) {
            out.push('\n');
            out.push_str(clause.text.trim());
        }
        out
    }
}
