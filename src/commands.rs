//! Bot command parsing.
//!
//! Command routing is string-prefix based; argument extraction and gating
//! happen in the gateway handlers. Unknown `/` prefixes are ignored so the
//! conversational path never sees half-typed commands.

/// Known bot commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Enable,
    Disable,
    SetPrompt,
    DefaultPrompt,
    Clear,
    SetMode,
    SetImageChance,
    Status,
    Request,
    GenerateImage,
    Tldr,
    Help,
}

impl Command {
    /// Parse a command from message text. Accepts the `@botname` suffix
    /// Telegram appends in group chats. Returns `None` for plain text and
    /// unknown commands.
    pub fn parse(text: &str) -> Option<Self> {
        let first = text.split_whitespace().next()?;
        if !first.starts_with('/') {
            return None;
        }
        let cmd = first.split('@').next().unwrap_or(first);
        match cmd {
            "/enable" => Some(Self::Enable),
            "/disable" => Some(Self::Disable),
            "/set_prompt" => Some(Self::SetPrompt),
            "/default_prompt" => Some(Self::DefaultPrompt),
            "/clear" => Some(Self::Clear),
            "/set_mode" => Some(Self::SetMode),
            "/set_image_chance" => Some(Self::SetImageChance),
            "/status" => Some(Self::Status),
            "/request" => Some(Self::Request),
            "/generate_image" => Some(Self::GenerateImage),
            "/tldr" => Some(Self::Tldr),
            "/help" => Some(Self::Help),
            _ => None,
        }
    }
}

/// Message text with the leading command token removed.
pub fn strip_command(text: &str) -> &str {
    match text.split_once(char::is_whitespace) {
        Some((_, rest)) => rest.trim(),
        None => "",
    }
}

/// The /help reply.
pub fn help_text() -> String {
    "\
*Banter* commands\n\n\
/request <text> — Ask the bot a question\n\
/set_prompt <text> — Set the chat's system prompt\n\
/default_prompt — Reset the prompt to default\n\
/set_mode <member|request> — How eagerly I join in\n\
/set_image_chance <0..1> — Chance of an image with replies\n\
/status — Current chat settings\n\
/clear — Clear conversation history\n\
/tldr [count] — Summarize recent messages\n\
/help — This message"
        .to_string()
}
