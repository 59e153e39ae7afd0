//! Bounded per-conversation history used as model context.
//!
//! Keyed by chat id, each conversation holds at most `max_len` turns;
//! appending past the bound evicts the oldest entries (FIFO, regardless of
//! role). The system prompt is supplied fresh on every request and is never
//! stored here.
//!
//! The store itself does no locking. Callers serialize mutations per chat id
//! (the gateway processes one message per chat at a time) and wrap the whole
//! store in a mutex for cross-chat sharing.

use std::collections::{HashMap, VecDeque};

use crate::context::Turn;

/// In-memory bounded history, one FIFO buffer per conversation id.
pub struct HistoryStore {
    conversations: HashMap<i64, VecDeque<Turn>>,
    max_len: usize,
}

impl HistoryStore {
    /// Create a store whose per-conversation buffers hold at most `max_len` turns.
    pub fn new(max_len: usize) -> Self {
        Self {
            conversations: HashMap::new(),
            max_len,
        }
    }

    /// Current turns for a conversation, oldest first. Empty if none exist yet.
    pub fn get(&self, chat_id: i64) -> Vec<Turn> {
        self.conversations
            .get(&chat_id)
            .map(|turns| turns.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Append turns in order, evicting the oldest entries beyond the bound.
    pub fn append(&mut self, chat_id: i64, turns: Vec<Turn>) {
        let buffer = self.conversations.entry(chat_id).or_default();
        for turn in turns {
            if buffer.len() == self.max_len {
                buffer.pop_front();
            }
            buffer.push_back(turn);
        }
    }

    /// Reset a conversation to empty, independent of prior content.
    pub fn clear(&mut self, chat_id: i64) {
        self.conversations.remove(&chat_id);
    }
}
