//! The answer pipeline — from inbound message to delivered reply.

use super::Gateway;
use crate::commands::{strip_command, Command};
use banter_core::{
    context::{Context, Turn},
    message::IncomingMessage,
};
use banter_store::ChatMode;
use tracing::{error, info, warn};

/// Sentinel reply when the language-model backend fails.
pub(super) const ERROR_MESSAGE: &str = "Something went wrong, retry";

/// Replies shorter than this that contain [`NO_CONTENT_MARKER`] are
/// suppressed entirely rather than delivered near-empty.
pub(super) const MIN_ANSWER_LEN: usize = 15;
pub(super) const NO_CONTENT_MARKER: &str = "No content";

impl Gateway {
    /// Process one inbound message: log it, dispatch commands, or run the
    /// conversational path.
    pub(super) async fn handle_message(&self, incoming: IncomingMessage) {
        let preview = if incoming.text.chars().count() > 60 {
            let truncated: String = incoming.text.chars().take(60).collect();
            format!("{truncated}...")
        } else {
            incoming.text.clone()
        };
        info!(
            "[{}] {} says: {}",
            incoming.chat_id,
            incoming.sender_name.as_deref().unwrap_or("unknown"),
            preview
        );

        // Record every inbound message for /tldr. Best-effort.
        if let Err(e) = self.store.log_message(&incoming).await {
            warn!("failed to log message: {e}");
        }

        if let Some(cmd) = Command::parse(&incoming.text) {
            self.handle_command(cmd, &incoming).await;
            return;
        }

        self.on_message(&incoming).await;
    }

    /// Conversational path for plain text: answers only in `member` mode.
    async fn on_message(&self, incoming: &IncomingMessage) {
        if !self
            .check_access(incoming.sender_id, incoming.chat_id, false)
            .await
        {
            return;
        }

        let chat = match self.store.get_chat(incoming.chat_id).await {
            Ok(Some(chat)) => chat,
            Ok(None) => {
                error!("chat {} passed the gate but has no config", incoming.chat_id);
                return;
            }
            Err(e) => {
                error!("failed to load chat {}: {e}", incoming.chat_id);
                return;
            }
        };

        if chat.mode != ChatMode::Member {
            return;
        }

        let _ = self.channel.send_typing(incoming.chat_id).await;

        let answer = self
            .get_answer(&chat.prompt, &incoming.text, Some(incoming.chat_id))
            .await;
        self.send_text(incoming.chat_id, &answer).await;

        self.maybe_send_image(&chat, Some(&incoming.text)).await;
    }

    /// The /request path: answers regardless of mode.
    pub(super) async fn handle_request(&self, incoming: &IncomingMessage) {
        if !self
            .check_access(incoming.sender_id, incoming.chat_id, false)
            .await
        {
            return;
        }

        let chat = match self.store.get_chat(incoming.chat_id).await {
            Ok(Some(chat)) => chat,
            _ => {
                error!("chat {} passed the gate but has no config", incoming.chat_id);
                return;
            }
        };

        let message = strip_command(&incoming.text);
        if message.is_empty() {
            self.send_text(incoming.chat_id, "Usage: /request <your question>")
                .await;
            return;
        }

        let _ = self.channel.send_typing(incoming.chat_id).await;

        let answer = self
            .get_answer(&chat.prompt, message, Some(incoming.chat_id))
            .await;
        self.send_text(incoming.chat_id, &answer).await;

        self.maybe_send_image(&chat, Some(message)).await;
    }

    /// Ask the model for an answer, fail-soft.
    ///
    /// Builds the request as system prompt + stored history (when a
    /// conversation id is supplied) + the new user turn. A backend failure
    /// becomes the fixed [`ERROR_MESSAGE`] sentinel — never an error to the
    /// caller. Near-empty "No content" replies are suppressed to an empty
    /// string. On success with a conversation id, exactly the user turn and
    /// the assistant turn are appended to history, in that order.
    pub(super) async fn get_answer(
        &self,
        prompt: &str,
        message: &str,
        conversation_id: Option<i64>,
    ) -> String {
        let history = match conversation_id {
            Some(id) => self.history.lock().unwrap().get(id),
            None => Vec::new(),
        };

        let context = Context {
            system_prompt: prompt.to_string(),
            history,
            current_message: message.to_string(),
        };

        let result = match self.provider.complete(&context).await {
            Ok(text) => text,
            Err(e) => {
                error!("provider call failed: {e}");
                return ERROR_MESSAGE.to_string();
            }
        };

        let result = result.trim().to_string();

        if result.chars().count() < MIN_ANSWER_LEN && result.contains(NO_CONTENT_MARKER) {
            return String::new();
        }

        if let Some(id) = conversation_id {
            self.history.lock().unwrap().append(
                id,
                vec![Turn::user(message), Turn::assistant(result.clone())],
            );
        }

        result
    }
}
