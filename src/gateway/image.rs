//! The image-reply trigger and its day-keyed budget counters.

use super::Gateway;
use crate::commands::strip_command;
use banter_core::{message::IncomingMessage, prompts::IMAGE_PROMPT};
use banter_store::ChatConfig;
use chrono::NaiveDate;
use std::collections::HashMap;
use tracing::{debug, error, info, warn};

/// Caption sent with every generated image.
const IMAGE_CAPTION: &str = "\u{1f3a8} Something interesting";

/// In-memory, process-lifetime counters keyed by calendar date.
///
/// Best-effort by contract: no persistence, no day-rollover cleanup, reset
/// on restart. Entries for past days simply stop being read.
pub(super) struct DayCounters {
    failures: HashMap<NaiveDate, u32>,
    generations: HashMap<(i64, NaiveDate), u32>,
}

impl DayCounters {
    pub(super) fn new() -> Self {
        Self {
            failures: HashMap::new(),
            generations: HashMap::new(),
        }
    }

    /// Record one generator failure for the given day.
    pub(super) fn record_failure(&mut self, day: NaiveDate) {
        *self.failures.entry(day).or_insert(0) += 1;
    }

    /// Failures recorded for the given day.
    pub(super) fn failures(&self, day: NaiveDate) -> u32 {
        self.failures.get(&day).copied().unwrap_or(0)
    }

    /// Record one successful generation for a chat on the given day.
    pub(super) fn record_generation(&mut self, chat_id: i64, day: NaiveDate) {
        *self.generations.entry((chat_id, day)).or_insert(0) += 1;
    }

    /// Successful generations for a chat on the given day.
    pub(super) fn generations(&self, chat_id: i64, day: NaiveDate) -> u32 {
        self.generations.get(&(chat_id, day)).copied().unwrap_or(0)
    }
}

impl Gateway {
    /// /generate_image — explicit image generation.
    pub(super) async fn handle_generate_image(&self, incoming: &IncomingMessage) {
        if !self
            .check_access(incoming.sender_id, incoming.chat_id, false)
            .await
        {
            return;
        }

        let text = strip_command(&incoming.text);
        let text = (!text.is_empty()).then_some(text);
        self.trigger_image(incoming.chat_id, text, true).await;
    }

    /// Bernoulli trial on the chat's configured rate; fires the trigger
    /// implicitly when the draw lands.
    pub(super) async fn maybe_send_image(&self, chat: &ChatConfig, text: Option<&str>) {
        if chat.image_chance <= 0.0 {
            return;
        }
        if (self.roll)() < chat.image_chance {
            self.trigger_image(chat.id, text, false).await;
        }
    }

    /// Generate and deliver one image.
    ///
    /// `text`, when present, is rewritten into an image prompt by the
    /// language model; otherwise a pooled prompt is drawn at random. A
    /// `None` from the backend counts against the day's failure budget; once
    /// the budget is exhausted the backend is not called again that day.
    /// Failure is silent unless the caller asked explicitly.
    pub(super) async fn trigger_image(&self, chat_id: i64, text: Option<&str>, explicit: bool) {
        let backend = match &self.image {
            Some(b) => b.clone(),
            None => {
                debug!("image trigger fired but no backend is configured");
                return;
            }
        };

        let today = chrono::Local::now().date_naive();

        if self.counters.lock().unwrap().failures(today) > self.image_config.daily_fail_limit {
            info!("image failure budget exhausted for today");
            return;
        }

        if explicit
            && self.counters.lock().unwrap().generations(chat_id, today)
                > self.image_config.daily_generation_limit
        {
            self.send_text(chat_id, "That's plenty of pictures for today. Tomorrow.")
                .await;
            return;
        }

        let prompt = match text {
            Some(text) => self.get_answer(IMAGE_PROMPT, text, None).await,
            None => match self.store.random_image_prompt().await {
                Ok(Some(prompt)) => prompt,
                Ok(None) => {
                    self.send_text(chat_id, "\u{274c} No image prompts available.")
                        .await;
                    return;
                }
                Err(e) => {
                    warn!("image prompt lookup failed: {e}");
                    return;
                }
            },
        };

        debug!("image prompt for chat {chat_id}: {prompt}");

        match backend.generate(&prompt).await {
            Some(bytes) => {
                self.counters
                    .lock()
                    .unwrap()
                    .record_generation(chat_id, today);
                if let Err(e) = self.channel.send_photo(chat_id, &bytes, IMAGE_CAPTION).await {
                    error!("failed to send photo to chat {chat_id}: {e}");
                }
            }
            None => {
                self.counters.lock().unwrap().record_failure(today);
                debug!("image generation failed for chat {chat_id}");
                if explicit {
                    self.send_text(chat_id, "Oof. The free generator can't always deliver.")
                        .await;
                }
            }
        }
    }
}
