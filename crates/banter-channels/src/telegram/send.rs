//! Message sending: text, photos, chat actions, and command registration.

use super::TelegramChannel;
use crate::utils::split_message;
use banter_core::error::BanterError;
use tracing::{info, warn};

impl TelegramChannel {
    /// Send a text message, segmented to the transport limit.
    ///
    /// Empty text produces zero chunks and therefore zero API calls — a
    /// suppressed answer is simply not delivered. Each part is sent
    /// independently: a failed part is logged and the rest still go out,
    /// without retry.
    pub(crate) async fn send_text_chunks(
        &self,
        chat_id: i64,
        text: &str,
    ) -> Result<(), BanterError> {
        for (i, chunk) in split_message(text, false).into_iter().enumerate() {
            if let Err(e) = self.send_message(chat_id, chunk).await {
                warn!("dropping part {i} for chat {chat_id}: {e}");
            }
        }
        Ok(())
    }

    /// Send one already-sized message, with a plain-text retry when
    /// Telegram rejects the Markdown.
    async fn send_message(&self, chat_id: i64, chunk: &str) -> Result<(), BanterError> {
        let url = format!("{}/sendMessage", self.base_url);
        let body = serde_json::json!({
            "chat_id": chat_id,
            "text": chunk,
            "parse_mode": "Markdown",
        });

        let resp = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| BanterError::Channel(format!("telegram send failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let error_text = resp.text().await.unwrap_or_default();
            if error_text.contains("can't parse entities") {
                warn!("Markdown parse failed, retrying as plain text: {error_text}");
                let plain_body = serde_json::json!({
                    "chat_id": chat_id,
                    "text": chunk,
                });
                let plain_resp = self
                    .client
                    .post(format!("{}/sendMessage", self.base_url))
                    .json(&plain_body)
                    .send()
                    .await
                    .map_err(|e| {
                        BanterError::Channel(format!("telegram send (plain) failed: {e}"))
                    })?;
                if !plain_resp.status().is_success() {
                    let plain_err = plain_resp.text().await.unwrap_or_default();
                    return Err(BanterError::Channel(format!(
                        "telegram send (plain fallback) failed: {plain_err}"
                    )));
                }
            } else {
                return Err(BanterError::Channel(format!(
                    "telegram send failed ({status}): {error_text}"
                )));
            }
        }

        Ok(())
    }

    /// Send a photo with a caption to a chat.
    ///
    /// Captions over the caption limit are segmented: the first chunk rides
    /// on the photo, the rest follow as ordinary messages.
    pub(crate) async fn send_photo_bytes(
        &self,
        chat_id: i64,
        image: &[u8],
        caption: &str,
    ) -> Result<(), BanterError> {
        let mut chunks = split_message(caption, true).into_iter();
        let leading = chunks.next().unwrap_or("");

        let url = format!("{}/sendPhoto", self.base_url);

        let part = reqwest::multipart::Part::bytes(image.to_vec())
            .file_name("photo.png")
            .mime_str("image/png")
            .map_err(|e| BanterError::Channel(format!("mime error: {e}")))?;

        let form = reqwest::multipart::Form::new()
            .text("chat_id", chat_id.to_string())
            .text("caption", leading.to_string())
            .part("photo", part);

        let resp = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| BanterError::Channel(format!("telegram sendPhoto failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let error_text = resp.text().await.unwrap_or_default();
            return Err(BanterError::Channel(format!(
                "telegram sendPhoto failed ({status}): {error_text}"
            )));
        }

        for chunk in chunks {
            if let Err(e) = self.send_message(chat_id, chunk).await {
                warn!("dropping caption overflow for chat {chat_id}: {e}");
            }
        }

        Ok(())
    }

    /// Register bot commands with Telegram so users see an autocomplete menu.
    /// Best-effort: logs failures but does not propagate errors.
    pub(crate) async fn register_commands(&self) {
        let commands = serde_json::json!({
            "commands": [
                { "command": "request", "description": "Ask the bot a question" },
                { "command": "set_prompt", "description": "Set the chat's system prompt" },
                { "command": "default_prompt", "description": "Reset the prompt to default" },
                { "command": "set_mode", "description": "member answers everything, request only /request" },
                { "command": "status", "description": "Current chat settings" },
                { "command": "clear", "description": "Clear conversation history" },
                { "command": "tldr", "description": "Summarize recent chat messages" },
                { "command": "help", "description": "Show available commands" },
                // /generate_image stays unlisted -- for those in the know.
            ]
        });

        let url = format!("{}/setMyCommands", self.base_url);
        match self.client.post(&url).json(&commands).send().await {
            Ok(resp) if resp.status().is_success() => {
                info!("registered Telegram bot commands");
            }
            Ok(resp) => {
                let body = resp.text().await.unwrap_or_default();
                warn!("failed to register Telegram bot commands: {body}");
            }
            Err(e) => {
                warn!("failed to register Telegram bot commands: {e}");
            }
        }
    }

    /// Send a chat action (e.g. "typing") to a chat.
    pub(crate) async fn send_chat_action(
        &self,
        chat_id: i64,
        action: &str,
    ) -> Result<(), BanterError> {
        let url = format!("{}/sendChatAction", self.base_url);
        let body = serde_json::json!({
            "chat_id": chat_id,
            "action": action,
        });

        self.client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| BanterError::Channel(format!("telegram sendChatAction failed: {e}")))?;

        Ok(())
    }
}
