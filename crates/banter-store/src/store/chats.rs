//! The per-chat configuration registry.
//!
//! Rows are created lazily: every setter is a single atomic upsert
//! (`INSERT ... ON CONFLICT DO UPDATE ... RETURNING`), so a never-seen chat
//! id gets a fully-defaulted row in the same statement that applies the
//! change. There is no separate registration step, and no exists-check race.

use super::Store;
use banter_core::{error::BanterError, prompts::DEFAULT_PROMPT};
use std::fmt;
use std::str::FromStr;

/// How the bot participates in a chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatMode {
    /// Answers every inbound message.
    Member,
    /// Answers only explicit /request queries.
    Request,
}

impl ChatMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Member => "member",
            Self::Request => "request",
        }
    }
}

impl fmt::Display for ChatMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChatMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "member" => Ok(Self::Member),
            "request" => Ok(Self::Request),
            _ => Err(()),
        }
    }
}

/// Snapshot of one chat's configuration.
#[derive(Debug, Clone)]
pub struct ChatConfig {
    pub id: i64,
    pub enabled: bool,
    pub mode: ChatMode,
    pub prompt: String,
    pub image_chance: f64,
    /// Who last toggled `enabled`. Advisory only.
    pub last_user_changed: Option<String>,
}

impl Store {
    /// Whether the bot is enabled in a chat. Unknown chats count as disabled.
    pub async fn is_enabled(&self, chat_id: i64) -> Result<bool, BanterError> {
        let row: Option<(bool,)> = sqlx::query_as("SELECT enabled FROM chats WHERE id = ?")
            .bind(chat_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| BanterError::Store(format!("query failed: {e}")))?;

        Ok(row.map(|(enabled,)| enabled).unwrap_or(false))
    }

    /// Fetch a chat's configuration, if one exists.
    pub async fn get_chat(&self, chat_id: i64) -> Result<Option<ChatConfig>, BanterError> {
        let row: Option<(i64, bool, String, String, f64, Option<String>)> = sqlx::query_as(
            "SELECT id, enabled, mode, prompt, image_chance, last_user_changed \
             FROM chats WHERE id = ?",
        )
        .bind(chat_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| BanterError::Store(format!("query failed: {e}")))?;

        Ok(row.map(|(id, enabled, mode, prompt, image_chance, last_user_changed)| {
            ChatConfig {
                id,
                enabled,
                // Unknown mode strings can only come from out-of-band edits;
                // fall back to the default rather than refusing to load.
                mode: mode.parse().unwrap_or(ChatMode::Member),
                prompt,
                image_chance,
                last_user_changed,
            }
        }))
    }

    /// Enable or disable the bot in a chat. Returns the resulting state.
    ///
    /// Creates the chat row with the default prompt if absent; the default is
    /// applied only on creation.
    pub async fn set_enabled(
        &self,
        chat_id: i64,
        enabled: bool,
        changed_by: &str,
    ) -> Result<bool, BanterError> {
        let (result,): (bool,) = sqlx::query_as(
            "INSERT INTO chats (id, enabled, prompt, last_user_changed) VALUES (?, ?, ?, ?) \
             ON CONFLICT(id) DO UPDATE SET \
                 enabled = excluded.enabled, \
                 last_user_changed = excluded.last_user_changed, \
                 updated_at = datetime('now') \
             RETURNING enabled",
        )
        .bind(chat_id)
        .bind(enabled)
        .bind(DEFAULT_PROMPT)
        .bind(changed_by)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| BanterError::Store(format!("upsert failed: {e}")))?;

        Ok(result)
    }

    /// Set a chat's interaction mode. Returns the resulting mode.
    ///
    /// Callers validate the mode before reaching here; this takes the enum.
    pub async fn set_mode(&self, chat_id: i64, mode: ChatMode) -> Result<ChatMode, BanterError> {
        let (result,): (String,) = sqlx::query_as(
            "INSERT INTO chats (id, mode, prompt) VALUES (?, ?, ?) \
             ON CONFLICT(id) DO UPDATE SET \
                 mode = excluded.mode, \
                 updated_at = datetime('now') \
             RETURNING mode",
        )
        .bind(chat_id)
        .bind(mode.as_str())
        .bind(DEFAULT_PROMPT)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| BanterError::Store(format!("upsert failed: {e}")))?;

        Ok(result.parse().unwrap_or(ChatMode::Member))
    }

    /// Set a chat's system prompt. Blank input normalizes to the default
    /// prompt. Returns the stored prompt, which is what the bot will use —
    /// not necessarily the caller's literal input.
    pub async fn set_prompt(&self, chat_id: i64, prompt: &str) -> Result<String, BanterError> {
        let prompt = prompt.trim();
        let effective = if prompt.is_empty() {
            DEFAULT_PROMPT
        } else {
            prompt
        };

        let (result,): (String,) = sqlx::query_as(
            "INSERT INTO chats (id, prompt) VALUES (?, ?) \
             ON CONFLICT(id) DO UPDATE SET \
                 prompt = excluded.prompt, \
                 updated_at = datetime('now') \
             RETURNING prompt",
        )
        .bind(chat_id)
        .bind(effective)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| BanterError::Store(format!("upsert failed: {e}")))?;

        Ok(result)
    }

    /// Set the probability of attaching a generated image to a response.
    /// Clamped to [0, 1]. Returns the stored value.
    pub async fn set_image_chance(&self, chat_id: i64, chance: f64) -> Result<f64, BanterError> {
        let chance = chance.clamp(0.0, 1.0);

        let (result,): (f64,) = sqlx::query_as(
            "INSERT INTO chats (id, image_chance, prompt) VALUES (?, ?, ?) \
             ON CONFLICT(id) DO UPDATE SET \
                 image_chance = excluded.image_chance, \
                 updated_at = datetime('now') \
             RETURNING image_chance",
        )
        .bind(chat_id)
        .bind(chance)
        .bind(DEFAULT_PROMPT)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| BanterError::Store(format!("upsert failed: {e}")))?;

        Ok(result)
    }
}
