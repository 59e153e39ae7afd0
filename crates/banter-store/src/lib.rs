//! # banter-store
//!
//! Persistent storage for Banter: the per-chat configuration registry,
//! the admin whitelist, the image-prompt pool, and the raw message log.

mod store;

pub use store::chats::{ChatConfig, ChatMode};
pub use store::log::LoggedMessage;
pub use store::Store;
