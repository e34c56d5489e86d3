//! Conversation history with a sliding-window cap
//!
//! History stores only user and assistant turns. The compiled instruction is
//! rebuilt from persona state every turn, so system entries are never
//! persisted; any that arrive from a caller are stripped during
//! normalization, and the legacy `model` role is mapped back to `assistant`.

use crate::message::{ChatMessage, Role};
use serde::{Deserialize, Serialize};

/// Entries kept after each append (5 exchanges)
pub const DEFAULT_WINDOW: usize = 10;

/// Ordered sequence of conversation turns, bounded to the most recent
/// [`DEFAULT_WINDOW`] entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationHistory {
    entries: Vec<ChatMessage>,
    max_entries: usize,
}

impl Default for ConversationHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversationHistory {
    /// Create an empty history with the default window
    pub fn new() -> Self {
        Self::with_window(DEFAULT_WINDOW)
    }

    /// Create an empty history with a custom window size
    pub fn with_window(max_entries: usize) -> Self {
        Self {
            entries: Vec::new(),
            max_entries,
        }
    }

    /// The stored entries, oldest first
    pub fn entries(&self) -> &[ChatMessage] {
        &self.entries
    }

    /// Number of stored entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the history is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append one entry, then drop the oldest entries beyond the window
    pub fn push(&mut self, message: ChatMessage) {
        self.entries.push(message);
        if self.entries.len() > self.max_entries {
            let excess = self.entries.len() - self.max_entries;
            self.entries.drain(..excess);
        }
    }

    /// Normalized view for prompt construction: system entries dropped,
    /// legacy `model` role mapped to `assistant`. Order is preserved.
    pub fn normalized(&self) -> Vec<ChatMessage> {
        self.entries
            .iter()
            .filter(|message| message.role != Role::System)
            .map(|message| {
                let mut message = message.clone();
                if message.role == Role::Model {
                    message.role = Role::Assistant;
                }
                message
            })
            .collect()
    }
}
