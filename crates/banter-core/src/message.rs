use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An incoming message from the messaging transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomingMessage {
    /// Conversation identifier (Telegram chat id).
    pub chat_id: i64,
    /// Transport-assigned message id within the chat.
    pub message_id: i64,
    /// Platform user id of the author.
    pub sender_id: i64,
    /// Human-readable sender name.
    pub sender_name: Option<String>,
    /// Message text content.
    pub text: String,
    pub timestamp: DateTime<Utc>,
    /// If this is a reply, the id of the original message.
    pub reply_to: Option<i64>,
}
