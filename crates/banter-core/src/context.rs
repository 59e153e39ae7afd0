use serde::{Deserialize, Serialize};

use crate::prompts::DEFAULT_PROMPT;

/// A single role-tagged turn of conversation, used as model context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    /// "user" or "assistant". The system turn is never stored as a `Turn`;
    /// it travels separately in [`Context::system_prompt`].
    pub role: String,
    /// The message content.
    pub content: String,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// Conversation context passed to a language-model provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Context {
    /// System prompt prepended to every request.
    pub system_prompt: String,
    /// Prior turns (oldest first).
    pub history: Vec<Turn>,
    /// The current user message.
    pub current_message: String,
}

impl Context {
    /// Create a context with just a current message and the default prompt.
    pub fn new(message: &str) -> Self {
        Self {
            system_prompt: DEFAULT_PROMPT.to_string(),
            history: Vec::new(),
            current_message: message.to_string(),
        }
    }

    /// Flatten the context into the ordered turn list an API-style provider
    /// sends on the wire: system prompt separate, then history, then the
    /// current user message.
    pub fn to_api_messages(&self) -> (String, Vec<Turn>) {
        let mut messages = Vec::with_capacity(self.history.len() + 1);
        messages.extend(self.history.iter().cloned());
        messages.push(Turn::user(self.current_message.clone()));
        (self.system_prompt.clone(), messages)
    }
}
