//! Raw inbound message log.
//!
//! Every inbound message is recorded here, unbounded. Only the /tldr
//! summarization flow reads it, through the ordered range query below —
//! the bounded conversation history never touches this table.

use super::Store;
use banter_core::{error::BanterError, message::IncomingMessage};

/// One logged inbound message.
#[derive(Debug, Clone)]
pub struct LoggedMessage {
    pub message_id: i64,
    pub sender_id: i64,
    pub sender_name: Option<String>,
    pub text: String,
    pub reply_to: Option<i64>,
    pub created_at: String,
}

impl Store {
    /// Record an inbound message.
    pub async fn log_message(&self, incoming: &IncomingMessage) -> Result<(), BanterError> {
        sqlx::query(
            "INSERT INTO message_log (chat_id, message_id, sender_id, sender_name, text, reply_to) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(incoming.chat_id)
        .bind(incoming.message_id)
        .bind(incoming.sender_id)
        .bind(&incoming.sender_name)
        .bind(&incoming.text)
        .bind(incoming.reply_to)
        .execute(&self.pool)
        .await
        .map_err(|e| BanterError::Store(format!("insert failed: {e}")))?;

        Ok(())
    }

    /// The last `limit` logged messages for a chat, oldest first.
    pub async fn recent_messages(
        &self,
        chat_id: i64,
        limit: i64,
    ) -> Result<Vec<LoggedMessage>, BanterError> {
        let rows: Vec<(i64, i64, Option<String>, String, Option<i64>, String)> = sqlx::query_as(
            "SELECT message_id, sender_id, sender_name, text, reply_to, created_at \
             FROM message_log WHERE chat_id = ? \
             ORDER BY id DESC LIMIT ?",
        )
        .bind(chat_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| BanterError::Store(format!("query failed: {e}")))?;

        let mut messages: Vec<LoggedMessage> = rows
            .into_iter()
            .map(
                |(message_id, sender_id, sender_name, text, reply_to, created_at)| LoggedMessage {
                    message_id,
                    sender_id,
                    sender_name,
                    text,
                    reply_to,
                    created_at,
                },
            )
            .collect();
        messages.reverse();

        Ok(messages)
    }
}
