//! # banter-channels
//!
//! Messaging platform integration: the Telegram Bot API channel and the
//! message segmenter shared by its send paths.

pub mod telegram;
pub mod utils;
