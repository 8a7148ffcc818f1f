//! The set of chats in one session.

use thiserror::Error;

use crate::domain::conversation::Conversation;

/// Registry errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("No chat named '{0}'")]
    NotFound(String),
}

/// Named conversations plus the currently selected one.
///
/// Never empty: it starts with `Chat 1` selected.
#[derive(Debug, Clone)]
pub struct ConversationRegistry {
    conversations: Vec<Conversation>,
    current: usize,
}

impl ConversationRegistry {
    pub fn new() -> Self {
        Self {
            conversations: vec![Conversation::new(chat_name(1))],
            current: 0,
        }
    }

    /// Creates `Chat N+1` and selects it.
    pub fn create(&mut self) -> &mut Conversation {
        let name = chat_name(self.conversations.len() + 1);
        tracing::info!(chat = %name, "Created chat");
        self.conversations.push(Conversation::new(name));
        self.current = self.conversations.len() - 1;
        &mut self.conversations[self.current]
    }

    /// Selects a chat by name.
    pub fn select(&mut self, name: &str) -> Result<&mut Conversation, RegistryError> {
        let index = self
            .conversations
            .iter()
            .position(|c| c.name() == name)
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))?;
        self.current = index;
        Ok(&mut self.conversations[index])
    }

    pub fn current(&self) -> &Conversation {
        &self.conversations[self.current]
    }

    pub fn current_mut(&mut self) -> &mut Conversation {
        &mut self.conversations[self.current]
    }

    /// Chat names in creation order.
    pub fn names(&self) -> Vec<&str> {
        self.conversations.iter().map(|c| c.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.conversations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conversations.is_empty()
    }
}

impl Default for ConversationRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn chat_name(n: usize) -> String {
    format!("Chat {}", n)
}
