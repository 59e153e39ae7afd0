//! Command dispatch and the configuration command handlers.

use super::Gateway;
use crate::commands::{help_text, strip_command, Command};
use banter_core::{message::IncomingMessage, prompts::DEFAULT_PROMPT};
use banter_store::ChatMode;
use tracing::{debug, error};

impl Gateway {
    /// Route a parsed command to its handler. Each handler applies its own
    /// gate; denial is always silent.
    pub(super) async fn handle_command(&self, cmd: Command, incoming: &IncomingMessage) {
        debug!("command {:?} in chat {}", cmd, incoming.chat_id);
        match cmd {
            Command::Enable => self.handle_enable(incoming).await,
            Command::Disable => self.handle_disable(incoming).await,
            Command::SetPrompt => self.handle_set_prompt(incoming).await,
            Command::DefaultPrompt => self.handle_default_prompt(incoming).await,
            Command::Clear => self.handle_clear(incoming).await,
            Command::SetMode => self.handle_set_mode(incoming).await,
            Command::SetImageChance => self.handle_set_image_chance(incoming).await,
            Command::Status => self.handle_status(incoming).await,
            Command::Request => self.handle_request(incoming).await,
            Command::GenerateImage => self.handle_generate_image(incoming).await,
            Command::Tldr => self.handle_tldr(incoming).await,
            Command::Help => self.send_text(incoming.chat_id, &help_text()).await,
        }
    }

    /// /enable — admin only. Activates the bot in this chat.
    async fn handle_enable(&self, incoming: &IncomingMessage) {
        if !self
            .check_access(incoming.sender_id, incoming.chat_id, true)
            .await
        {
            return;
        }

        let changed_by = incoming.sender_id.to_string();
        if let Err(e) = self
            .store
            .set_enabled(incoming.chat_id, true, &changed_by)
            .await
        {
            error!("enable failed for chat {}: {e}", incoming.chat_id);
            return;
        }

        let prompt = match self.store.get_chat(incoming.chat_id).await {
            Ok(Some(chat)) => chat.prompt,
            _ => DEFAULT_PROMPT.to_string(),
        };
        self.send_text(
            incoming.chat_id,
            &format!("Hi! I'm a bot that generates replies with a language model.\nprompt: {prompt}"),
        )
        .await;
    }

    /// /disable — deactivates the bot in this chat.
    async fn handle_disable(&self, incoming: &IncomingMessage) {
        if !self
            .check_access(incoming.sender_id, incoming.chat_id, false)
            .await
        {
            return;
        }

        let changed_by = incoming.sender_id.to_string();
        if let Err(e) = self
            .store
            .set_enabled(incoming.chat_id, false, &changed_by)
            .await
        {
            error!("disable failed for chat {}: {e}", incoming.chat_id);
            return;
        }

        self.send_text(incoming.chat_id, "I'm out. Bye, everyone.")
            .await;
    }

    /// /set_prompt — set the chat's system prompt and start a fresh
    /// conversation. Blank input resets to the default prompt.
    async fn handle_set_prompt(&self, incoming: &IncomingMessage) {
        if !self
            .check_access(incoming.sender_id, incoming.chat_id, false)
            .await
        {
            return;
        }

        let text = strip_command(&incoming.text);
        let new_prompt = match self.store.set_prompt(incoming.chat_id, text).await {
            Ok(p) => p,
            Err(e) => {
                error!("set_prompt failed for chat {}: {e}", incoming.chat_id);
                return;
            }
        };

        // The prompt changed, so the accumulated context no longer applies.
        self.history.lock().unwrap().clear(incoming.chat_id);

        self.send_text(
            incoming.chat_id,
            &format!("My prompt is now:\n```{new_prompt}```"),
        )
        .await;
    }

    /// /default_prompt — reset to the default prompt, clearing history.
    async fn handle_default_prompt(&self, incoming: &IncomingMessage) {
        if !self
            .check_access(incoming.sender_id, incoming.chat_id, false)
            .await
        {
            return;
        }

        let new_prompt = match self.store.set_prompt(incoming.chat_id, DEFAULT_PROMPT).await {
            Ok(p) => p,
            Err(e) => {
                error!("default_prompt failed for chat {}: {e}", incoming.chat_id);
                return;
            }
        };

        self.history.lock().unwrap().clear(incoming.chat_id);

        self.send_text(
            incoming.chat_id,
            &format!("My prompt is now:\n```{new_prompt}```"),
        )
        .await;
    }

    /// /clear — reset the conversation history.
    async fn handle_clear(&self, incoming: &IncomingMessage) {
        if !self
            .check_access(incoming.sender_id, incoming.chat_id, false)
            .await
        {
            return;
        }

        self.history.lock().unwrap().clear(incoming.chat_id);
        self.send_text(incoming.chat_id, "Ok.").await;
    }

    /// /set_mode — member answers everything, request only /request.
    async fn handle_set_mode(&self, incoming: &IncomingMessage) {
        if !self
            .check_access(incoming.sender_id, incoming.chat_id, false)
            .await
        {
            return;
        }

        let arg = strip_command(&incoming.text);
        let mode: ChatMode = match arg.parse() {
            Ok(mode) => mode,
            Err(()) => {
                self.send_text(incoming.chat_id, "Only `member` or `request`")
                    .await;
                return;
            }
        };

        match self.store.set_mode(incoming.chat_id, mode).await {
            Ok(new_mode) => {
                self.send_text(incoming.chat_id, &format!("Ok. {new_mode}"))
                    .await;
            }
            Err(e) => error!("set_mode failed for chat {}: {e}", incoming.chat_id),
        }
    }

    /// /set_image_chance — probability of attaching an image to replies.
    async fn handle_set_image_chance(&self, incoming: &IncomingMessage) {
        if !self
            .check_access(incoming.sender_id, incoming.chat_id, false)
            .await
        {
            return;
        }

        let arg = strip_command(&incoming.text);
        let chance: f64 = match arg.parse() {
            Ok(c) => c,
            Err(_) => {
                self.send_text(incoming.chat_id, "Usage: /set_image_chance <0..1>")
                    .await;
                return;
            }
        };

        match self.store.set_image_chance(incoming.chat_id, chance).await {
            Ok(stored) => {
                self.send_text(incoming.chat_id, &format!("Image chance set to {stored}"))
                    .await;
            }
            Err(e) => error!("set_image_chance failed for chat {}: {e}", incoming.chat_id),
        }
    }

    /// /status — JSON snapshot of the chat's settings.
    async fn handle_status(&self, incoming: &IncomingMessage) {
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

        let snapshot = serde_json::json!({
            "enable": chat.enabled,
            "mode": chat.mode.as_str(),
            "prompt": chat.prompt,
            "model": self.provider.model(),
            "chat_id": chat.id,
        });
        let json = serde_json::to_string_pretty(&snapshot).unwrap_or_default();

        self.send_text(incoming.chat_id, &format!("```{json}```"))
            .await;
    }
}
