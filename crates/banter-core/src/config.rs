//! TOML configuration with per-field defaults.
//!
//! A missing config file is not an error: every section falls back to
//! defaults so the binary can start (and immediately complain about the
//! missing bot token instead of a missing file).

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::BanterError;

/// Top-level Banter configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub bot: BotConfig,
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub openai: OpenAiConfig,
    #[serde(default)]
    pub image: ImageConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

/// General bot settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Maximum turns retained per conversation as model context.
    #[serde(default = "default_history_len")]
    pub history_len: usize,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            log_level: default_log_level(),
            history_len: default_history_len(),
        }
    }
}

/// Telegram transport config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TelegramConfig {
    #[serde(default)]
    pub bot_token: String,
    /// Super-admin user id. Passes the admin gate without an admins-table row.
    #[serde(default)]
    pub admin_user_id: i64,
}

/// Language-model backend config (OpenAI-compatible API).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,
    #[serde(default = "default_openai_model")]
    pub model: String,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_openai_base_url(),
            model: default_openai_model(),
        }
    }
}

/// Image-generation backend config (Replicate).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub api_token: String,
    #[serde(default = "default_image_model")]
    pub model: String,
    /// Generator failures tolerated per calendar day before the trigger
    /// short-circuits. Best-effort, in-memory.
    #[serde(default = "default_daily_fail_limit")]
    pub daily_fail_limit: u32,
    /// Successful generations allowed per chat per calendar day.
    #[serde(default = "default_daily_generation_limit")]
    pub daily_generation_limit: u32,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_token: String::new(),
            model: default_image_model(),
            daily_fail_limit: default_daily_fail_limit(),
            daily_generation_limit: default_daily_generation_limit(),
        }
    }
}

/// Persistent store config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// SQLite database path. `:memory:` gives an in-process database.
    #[serde(default = "default_db_path")]
    pub db_path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
        }
    }
}

fn default_name() -> String {
    "banter".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_history_len() -> usize {
    5
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_openai_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_image_model() -> String {
    "black-forest-labs/flux-schnell".to_string()
}

fn default_daily_fail_limit() -> u32 {
    3
}

fn default_daily_generation_limit() -> u32 {
    100
}

fn default_db_path() -> String {
    "data/banter.db".to_string()
}

/// Load configuration from a TOML file.
///
/// Falls back to defaults if the file does not exist.
pub fn load(path: &str) -> Result<Config, BanterError> {
    let path = Path::new(path);
    if !path.exists() {
        tracing::info!("config file not found at {}, using defaults", path.display());
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| BanterError::Config(format!("failed to read {}: {e}", path.display())))?;

    let config: Config = toml::from_str(&content)
        .map_err(|e| BanterError::Config(format!("failed to parse config: {e}")))?;

    Ok(config)
}
