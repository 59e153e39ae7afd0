//! Gateway — the event loop connecting the channel, the store, and the
//! backends.
//!
//! Includes: the access gate, the answer pipeline, command handlers, the
//! probabilistic image trigger, and graceful shutdown. Messages are
//! serialized per chat id: while a chat has a reply in flight, further
//! messages from that chat are buffered and processed in arrival order,
//! so history reads and appends for one conversation never interleave.

mod admin;
mod auth;
mod image;
mod pipeline;
mod summary;

#[cfg(test)]
mod tests;

use banter_core::{
    config::{Config, ImageConfig},
    history::HistoryStore,
    message::IncomingMessage,
    traits::{Channel, ImageBackend, Provider},
};
use banter_store::Store;
use image::DayCounters;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info};

/// Random source for the image-reply trigger. Returns a draw in [0, 1).
type Roll = Box<dyn Fn() -> f64 + Send + Sync>;

/// The central gateway that turns inbound messages into replies.
pub struct Gateway {
    provider: Arc<dyn Provider>,
    channel: Arc<dyn Channel>,
    store: Store,
    image: Option<Arc<dyn ImageBackend>>,
    image_config: ImageConfig,
    /// Bounded per-chat conversation history. Short critical sections only;
    /// never held across an await.
    history: std::sync::Mutex<HistoryStore>,
    /// Best-effort day-keyed counters for the image trigger.
    counters: std::sync::Mutex<DayCounters>,
    /// Super-admin user id from config. Passes the admin gate unconditionally.
    admin_user_id: i64,
    /// Bernoulli source for the image trigger; swappable for tests.
    roll: Roll,
    /// Chats with a message in flight. New messages are buffered here.
    active_chats: Mutex<HashMap<i64, Vec<IncomingMessage>>>,
}

impl Gateway {
    /// Create a new gateway.
    pub fn new(
        provider: Arc<dyn Provider>,
        channel: Arc<dyn Channel>,
        store: Store,
        image: Option<Arc<dyn ImageBackend>>,
        config: &Config,
    ) -> Self {
        Self {
            provider,
            channel,
            store,
            image,
            image_config: config.image.clone(),
            history: std::sync::Mutex::new(HistoryStore::new(config.bot.history_len)),
            counters: std::sync::Mutex::new(DayCounters::new()),
            admin_user_id: config.telegram.admin_user_id,
            roll: Box::new(|| rand::random::<f64>()),
            active_chats: Mutex::new(HashMap::new()),
        }
    }

    /// Replace the random source for the image trigger with a deterministic
    /// one. Used by tests.
    pub fn with_roll(mut self, roll: impl Fn() -> f64 + Send + Sync + 'static) -> Self {
        self.roll = Box::new(roll);
        self
    }

    /// Run the main event loop until interrupted.
    pub async fn run(self: Arc<Self>) -> anyhow::Result<()> {
        info!(
            "banter gateway running | provider: {} | channel: {} | image: {}",
            self.provider.name(),
            self.channel.name(),
            self.image
                .as_ref()
                .map(|b| b.name())
                .unwrap_or("disabled"),
        );

        let mut rx = self
            .channel
            .start()
            .await
            .map_err(|e| anyhow::anyhow!("failed to start channel: {e}"))?;

        loop {
            tokio::select! {
                Some(incoming) = rx.recv() => {
                    let gw = self.clone();
                    tokio::spawn(async move {
                        gw.dispatch_message(incoming).await;
                    });
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("received shutdown signal");
                    break;
                }
            }
        }

        if let Err(e) = self.channel.stop().await {
            error!("channel shutdown failed: {e}");
        }
        Ok(())
    }

    /// Dispatch a message: buffer if its chat is busy, otherwise process.
    ///
    /// This is the per-conversation serialization discipline: one message per
    /// chat id in flight, later ones queued in arrival order. Messages from
    /// different chats run concurrently.
    async fn dispatch_message(self: Arc<Self>, incoming: IncomingMessage) {
        let chat_id = incoming.chat_id;

        {
            let mut active = self.active_chats.lock().await;
            if let Some(buffer) = active.get_mut(&chat_id) {
                buffer.push(incoming);
                info!("buffered message for chat {chat_id} (reply in progress)");
                return;
            }
            active.insert(chat_id, Vec::new());
        }

        self.handle_message(incoming).await;

        // Drain any messages buffered while we were busy.
        loop {
            let next = {
                let mut active = self.active_chats.lock().await;
                match active.get_mut(&chat_id) {
                    Some(buf) if !buf.is_empty() => Some(buf.remove(0)),
                    _ => {
                        active.remove(&chat_id);
                        None
                    }
                }
            };

            match next {
                Some(buffered) => {
                    info!("processing buffered message for chat {chat_id}");
                    self.handle_message(buffered).await;
                }
                None => break,
            }
        }
    }

    /// Send reply text, logging delivery failures instead of propagating
    /// them — one lost part never takes down the pipeline.
    pub(super) async fn send_text(&self, chat_id: i64, text: &str) {
        if let Err(e) = self.channel.send_text(chat_id, text).await {
            error!("failed to send reply to chat {chat_id}: {e}");
        }
    }
}
