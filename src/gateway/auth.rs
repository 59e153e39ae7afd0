//! The access gate.
//!
//! A pure predicate over registry state: no side effects, and denial is
//! silent at every call site — to a non-whitelisted chat the bot is
//! indistinguishable from absent.

use super::Gateway;
use tracing::{info, warn};

impl Gateway {
    /// Check whether an actor may proceed.
    ///
    /// Non-admin path: the chat must have an existing, enabled config row;
    /// unknown or disabled chats fail closed. Admin path: the actor must be
    /// in the admins table or match the configured super-admin id; chat
    /// enablement is irrelevant.
    pub(super) async fn check_access(
        &self,
        sender_id: i64,
        chat_id: i64,
        require_admin: bool,
    ) -> bool {
        if require_admin {
            if sender_id == self.admin_user_id {
                return true;
            }
            return match self.store.is_admin(sender_id).await {
                Ok(admin) => admin,
                Err(e) => {
                    warn!("admin check failed: {e}");
                    false
                }
            };
        }

        match self.store.is_enabled(chat_id).await {
            Ok(true) => true,
            Ok(false) => {
                info!("no access chat_id: {chat_id} user_id: {sender_id}");
                false
            }
            Err(e) => {
                warn!("access check failed: {e}");
                false
            }
        }
    }
}
