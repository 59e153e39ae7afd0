//! /tldr — summarize recent chat messages from the raw message log.
//!
//! Reads the unbounded message log through its ordered range query; the
//! bounded conversation history is never involved, and the model call is
//! one-shot (no conversation id).

use super::Gateway;
use crate::commands::strip_command;
use banter_core::{message::IncomingMessage, prompts::SUMMARIZE_PROMPT};
use tracing::{error, info};

/// Messages summarized when no count is given.
const DEFAULT_TLDR_COUNT: i64 = 200;

impl Gateway {
    /// /tldr [count] [chat_id] — the chat override is admin-only.
    pub(super) async fn handle_tldr(&self, incoming: &IncomingMessage) {
        if !self
            .check_access(incoming.sender_id, incoming.chat_id, false)
            .await
        {
            return;
        }

        let args = strip_command(&incoming.text);
        let mut tokens = args.split_whitespace();

        let count: i64 = tokens
            .next()
            .and_then(|t| t.parse().ok())
            .unwrap_or(DEFAULT_TLDR_COUNT);

        // Summarizing another chat's log exposes its content, so the
        // override is held to the admin gate.
        let mut chat_id = incoming.chat_id;
        if let Some(other) = tokens.next().and_then(|t| t.parse::<i64>().ok()) {
            if self
                .check_access(incoming.sender_id, incoming.chat_id, true)
                .await
            {
                chat_id = other;
            }
        }

        info!("tldr chat_id={chat_id} count={count}");

        let messages = match self.store.recent_messages(chat_id, count).await {
            Ok(m) => m,
            Err(e) => {
                error!("tldr query failed: {e}");
                return;
            }
        };

        if messages.is_empty() {
            self.send_text(incoming.chat_id, "Nothing to summarize yet.")
                .await;
            return;
        }

        let mut rows = vec!["id | reply_to | sender | timestamp | text".to_string()];
        for m in &messages {
            let sender = m
                .sender_name
                .clone()
                .unwrap_or_else(|| m.sender_id.to_string());
            let reply_to = m.reply_to.map(|id| id.to_string()).unwrap_or_default();
            rows.push(format!(
                "{} | {} | {} | {} | {}",
                m.message_id, reply_to, sender, m.created_at, m.text
            ));
        }

        let answer = self
            .get_answer(SUMMARIZE_PROMPT, &rows.join("\n"), None)
            .await;
        self.send_text(incoming.chat_id, &answer).await;
    }
}
