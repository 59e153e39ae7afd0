//! Gateway pipeline tests against stub backends.

use super::pipeline::ERROR_MESSAGE;
use super::Gateway;
use async_trait::async_trait;
use banter_channels::utils::split_message;
use banter_core::{
    config::Config,
    context::Context,
    error::BanterError,
    message::IncomingMessage,
    prompts::{DEFAULT_PROMPT, SUMMARIZE_PROMPT},
    traits::{Channel, ImageBackend, Provider},
};
use banter_store::{ChatMode, Store};
use chrono::Utc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

const ADMIN_ID: i64 = 7;
const USER_ID: i64 = 100;
const CHAT_ID: i64 = 42;

/// Provider stub: fixed reply, or an error when `reply` is `None`.
/// Records every context it was called with.
struct StubProvider {
    reply: Option<String>,
    calls: Mutex<Vec<Context>>,
}

impl StubProvider {
    fn new(reply: Option<&str>) -> Self {
        Self {
            reply: reply.map(|s| s.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Provider for StubProvider {
    fn name(&self) -> &str {
        "stub"
    }

    fn model(&self) -> &str {
        "stub-model"
    }

    async fn complete(&self, context: &Context) -> Result<String, BanterError> {
        self.calls.lock().unwrap().push(context.clone());
        match &self.reply {
            Some(text) => Ok(text.clone()),
            None => Err(BanterError::Provider("backend exploded".into())),
        }
    }

    async fn is_available(&self) -> bool {
        true
    }
}

/// Channel stub: records outbound chunks exactly as the real channel would
/// produce them (empty text yields zero sends).
struct RecordingChannel {
    sent: Mutex<Vec<(i64, String)>>,
    photos: Mutex<Vec<(i64, String)>>,
}

impl RecordingChannel {
    fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            photos: Mutex::new(Vec::new()),
        }
    }

    fn sent(&self) -> Vec<(i64, String)> {
        self.sent.lock().unwrap().clone()
    }

    fn photos(&self) -> Vec<(i64, String)> {
        self.photos.lock().unwrap().clone()
    }
}

#[async_trait]
impl Channel for RecordingChannel {
    fn name(&self) -> &str {
        "recording"
    }

    async fn start(&self) -> Result<mpsc::Receiver<IncomingMessage>, BanterError> {
        let (_tx, rx) = mpsc::channel(1);
        Ok(rx)
    }

    async fn send_text(&self, chat_id: i64, text: &str) -> Result<(), BanterError> {
        for chunk in split_message(text, false) {
            self.sent.lock().unwrap().push((chat_id, chunk.to_string()));
        }
        Ok(())
    }

    async fn send_photo(
        &self,
        chat_id: i64,
        _image: &[u8],
        caption: &str,
    ) -> Result<(), BanterError> {
        self.photos
            .lock()
            .unwrap()
            .push((chat_id, caption.to_string()));
        Ok(())
    }

    async fn stop(&self) -> Result<(), BanterError> {
        Ok(())
    }
}

/// Image backend stub: counts calls, returns a fixed outcome.
struct StubImage {
    result: Option<Vec<u8>>,
    calls: AtomicUsize,
}

impl StubImage {
    fn failing() -> Self {
        Self {
            result: None,
            calls: AtomicUsize::new(0),
        }
    }

    fn succeeding() -> Self {
        Self {
            result: Some(vec![0x89, 0x50, 0x4e, 0x47]),
            calls: AtomicUsize::new(0),
        }
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageBackend for StubImage {
    fn name(&self) -> &str {
        "stub-image"
    }

    async fn generate(&self, _prompt: &str) -> Option<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result.clone()
    }
}

struct Harness {
    gateway: Gateway,
    provider: Arc<StubProvider>,
    channel: Arc<RecordingChannel>,
    image: Option<Arc<StubImage>>,
}

/// Build a gateway over an in-memory store and the given stubs.
/// `roll` is the fixed Bernoulli draw for the image trigger.
async fn harness(reply: Option<&str>, image: Option<StubImage>, roll: f64) -> Harness {
    let provider = Arc::new(StubProvider::new(reply));
    let channel = Arc::new(RecordingChannel::new());
    let image = image.map(Arc::new);

    let mut config = Config::default();
    config.telegram.admin_user_id = ADMIN_ID;
    config.store.db_path = ":memory:".to_string();

    let store = Store::new(&config.store).await.unwrap();

    let gateway = Gateway::new(
        provider.clone(),
        channel.clone(),
        store,
        image
            .clone()
            .map(|i| i as Arc<dyn ImageBackend>),
        &config,
    )
    .with_roll(move || roll);

    Harness {
        gateway,
        provider,
        channel,
        image,
    }
}

fn incoming_from(sender_id: i64, text: &str) -> IncomingMessage {
    IncomingMessage {
        chat_id: CHAT_ID,
        message_id: 1,
        sender_id,
        sender_name: Some("@tester".to_string()),
        text: text.to_string(),
        timestamp: Utc::now(),
        reply_to: None,
    }
}

fn incoming(text: &str) -> IncomingMessage {
    incoming_from(USER_ID, text)
}

async fn enable_chat(h: &Harness) {
    h.gateway
        .store
        .set_enabled(CHAT_ID, true, &ADMIN_ID.to_string())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_member_mode_end_to_end() {
    let h = harness(Some("hello there"), None, 1.0).await;
    enable_chat(&h).await;

    h.gateway.handle_message(incoming("hi")).await;

    assert_eq!(h.channel.sent(), vec![(CHAT_ID, "hello there".to_string())]);

    // History now holds exactly the user turn and the assistant turn.
    let history = h.gateway.history.lock().unwrap().get(CHAT_ID);
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].role, "user");
    assert_eq!(history[0].content, "hi");
    assert_eq!(history[1].role, "assistant");
    assert_eq!(history[1].content, "hello there");

    // The model saw the chat's prompt as the system turn.
    let calls = h.provider.calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].system_prompt, DEFAULT_PROMPT);
    assert_eq!(calls[0].current_message, "hi");
}

#[tokio::test]
async fn test_request_mode_ignores_plain_text() {
    let h = harness(Some("hello there"), None, 1.0).await;
    enable_chat(&h).await;
    h.gateway
        .store
        .set_mode(CHAT_ID, ChatMode::Request)
        .await
        .unwrap();

    h.gateway.handle_message(incoming("hi")).await;

    assert!(h.channel.sent().is_empty());
    assert_eq!(h.provider.call_count(), 0);
}

#[tokio::test]
async fn test_request_command_answers_in_request_mode() {
    let h = harness(Some("42."), None, 1.0).await;
    enable_chat(&h).await;
    h.gateway
        .store
        .set_mode(CHAT_ID, ChatMode::Request)
        .await
        .unwrap();

    h.gateway
        .handle_message(incoming("/request what is the answer"))
        .await;

    assert_eq!(h.channel.sent(), vec![(CHAT_ID, "42.".to_string())]);
    // The command token is stripped before the model sees the message.
    let history = h.gateway.history.lock().unwrap().get(CHAT_ID);
    assert_eq!(history[0].content, "what is the answer");
}

#[tokio::test]
async fn test_unknown_chat_is_silent() {
    let h = harness(Some("hello"), None, 1.0).await;

    h.gateway.handle_message(incoming("hi")).await;

    assert!(h.channel.sent().is_empty());
    assert_eq!(h.provider.call_count(), 0);
}

#[tokio::test]
async fn test_disabled_chat_is_silent() {
    let h = harness(Some("hello"), None, 1.0).await;
    h.gateway
        .store
        .set_enabled(CHAT_ID, false, "7")
        .await
        .unwrap();

    h.gateway.handle_message(incoming("hi")).await;

    assert!(h.channel.sent().is_empty());
}

#[tokio::test]
async fn test_backend_failure_becomes_sentinel() {
    let h = harness(None, None, 1.0).await;
    enable_chat(&h).await;

    h.gateway.handle_message(incoming("hi")).await;

    assert_eq!(h.channel.sent(), vec![(CHAT_ID, ERROR_MESSAGE.to_string())]);
    // A failed call must not touch history.
    assert!(h.gateway.history.lock().unwrap().get(CHAT_ID).is_empty());
}

#[tokio::test]
async fn test_no_content_reply_is_suppressed() {
    let h = harness(Some("No content"), None, 1.0).await;
    enable_chat(&h).await;

    h.gateway.handle_message(incoming("hi")).await;

    // Suppressed answers produce zero outbound messages and no history.
    assert!(h.channel.sent().is_empty());
    assert!(h.gateway.history.lock().unwrap().get(CHAT_ID).is_empty());
}

#[tokio::test]
async fn test_long_no_content_reply_is_delivered() {
    let reply = "No content today, but here is a long explanation why.";
    let h = harness(Some(reply), None, 1.0).await;
    enable_chat(&h).await;

    h.gateway.handle_message(incoming("hi")).await;

    // Above the length threshold the marker is an ordinary answer.
    assert_eq!(h.channel.sent(), vec![(CHAT_ID, reply.to_string())]);
}

#[tokio::test]
async fn test_history_feeds_next_request() {
    let h = harness(Some("reply"), None, 1.0).await;
    enable_chat(&h).await;

    h.gateway.handle_message(incoming("first")).await;
    h.gateway.handle_message(incoming("second")).await;

    let calls = h.provider.calls.lock().unwrap();
    assert_eq!(calls.len(), 2);
    assert!(calls[0].history.is_empty());
    // The second call carries the first exchange as context.
    assert_eq!(calls[1].history.len(), 2);
    assert_eq!(calls[1].history[0].content, "first");
    assert_eq!(calls[1].history[1].content, "reply");
}

#[tokio::test]
async fn test_enable_requires_admin() {
    let h = harness(Some("hello"), None, 1.0).await;

    // A regular user cannot enable an unknown chat.
    h.gateway
        .handle_message(incoming_from(USER_ID, "/enable"))
        .await;
    assert!(h.channel.sent().is_empty());
    assert!(h.gateway.store.get_chat(CHAT_ID).await.unwrap().is_none());

    // The super-admin can.
    h.gateway
        .handle_message(incoming_from(ADMIN_ID, "/enable"))
        .await;
    assert!(h.gateway.store.is_enabled(CHAT_ID).await.unwrap());
    let sent = h.channel.sent();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].1.contains("prompt:"));
}

#[tokio::test]
async fn test_whitelisted_admin_can_enable() {
    let h = harness(Some("hello"), None, 1.0).await;
    h.gateway.store.add_admin(555, "helper").await.unwrap();

    h.gateway
        .handle_message(incoming_from(555, "/enable"))
        .await;

    assert!(h.gateway.store.is_enabled(CHAT_ID).await.unwrap());
}

#[tokio::test]
async fn test_set_prompt_clears_history() {
    let h = harness(Some("reply"), None, 1.0).await;
    enable_chat(&h).await;

    h.gateway.handle_message(incoming("hi")).await;
    assert_eq!(h.gateway.history.lock().unwrap().get(CHAT_ID).len(), 2);

    h.gateway
        .handle_message(incoming("/set_prompt be terse"))
        .await;

    assert!(h.gateway.history.lock().unwrap().get(CHAT_ID).is_empty());
    let chat = h.gateway.store.get_chat(CHAT_ID).await.unwrap().unwrap();
    assert_eq!(chat.prompt, "be terse");
    let sent = h.channel.sent();
    assert!(sent.last().unwrap().1.contains("be terse"));
}

#[tokio::test]
async fn test_set_prompt_blank_resets_to_default() {
    let h = harness(Some("reply"), None, 1.0).await;
    enable_chat(&h).await;
    h.gateway.store.set_prompt(CHAT_ID, "custom").await.unwrap();

    h.gateway.handle_message(incoming("/set_prompt")).await;

    let chat = h.gateway.store.get_chat(CHAT_ID).await.unwrap().unwrap();
    assert_eq!(chat.prompt, DEFAULT_PROMPT);
}

#[tokio::test]
async fn test_set_mode_invalid_gets_corrective_reply() {
    let h = harness(Some("reply"), None, 1.0).await;
    enable_chat(&h).await;

    h.gateway.handle_message(incoming("/set_mode banana")).await;

    assert_eq!(
        h.channel.sent(),
        vec![(CHAT_ID, "Only `member` or `request`".to_string())]
    );
    // Mode is unchanged.
    let chat = h.gateway.store.get_chat(CHAT_ID).await.unwrap().unwrap();
    assert_eq!(chat.mode, ChatMode::Member);
}

#[tokio::test]
async fn test_clear_command() {
    let h = harness(Some("reply"), None, 1.0).await;
    enable_chat(&h).await;

    h.gateway.handle_message(incoming("hi")).await;
    h.gateway.handle_message(incoming("/clear")).await;

    assert!(h.gateway.history.lock().unwrap().get(CHAT_ID).is_empty());
    assert_eq!(h.channel.sent().last().unwrap().1, "Ok.");
}

#[tokio::test]
async fn test_status_snapshot() {
    let h = harness(Some("reply"), None, 1.0).await;
    enable_chat(&h).await;

    h.gateway.handle_message(incoming("/status")).await;

    let sent = h.channel.sent();
    assert_eq!(sent.len(), 1);
    let body = &sent[0].1;
    assert!(body.contains("\"enable\": true"));
    assert!(body.contains("\"mode\": \"member\""));
    assert!(body.contains("\"model\": \"stub-model\""));
    assert!(body.contains("\"chat_id\": 42"));
}

#[tokio::test]
async fn test_image_failure_budget_short_circuits() {
    let h = harness(Some("a painted fox"), Some(StubImage::failing()), 1.0).await;
    enable_chat(&h).await;
    let image = h.image.as_ref().unwrap();

    // Four explicit attempts, each failing and burning budget.
    for _ in 0..4 {
        h.gateway
            .trigger_image(CHAT_ID, Some("a fox"), true)
            .await;
    }
    assert_eq!(image.call_count(), 4);

    // The fifth attempt must not reach the backend at all.
    h.gateway
        .trigger_image(CHAT_ID, Some("a fox"), true)
        .await;
    assert_eq!(image.call_count(), 4);
}

#[tokio::test]
async fn test_explicit_image_failure_apologizes() {
    let h = harness(Some("a painted fox"), Some(StubImage::failing()), 1.0).await;
    enable_chat(&h).await;

    h.gateway
        .handle_message(incoming("/generate_image a fox"))
        .await;

    let sent = h.channel.sent();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].1.contains("generator"));
}

#[tokio::test]
async fn test_implicit_image_failure_is_silent() {
    // roll 0.0 < chance 1.0 — the trigger always fires.
    let h = harness(Some("reply"), Some(StubImage::failing()), 0.0).await;
    enable_chat(&h).await;
    h.gateway
        .store
        .set_image_chance(CHAT_ID, 1.0)
        .await
        .unwrap();

    h.gateway.handle_message(incoming("hi")).await;

    // Only the text answer went out; the failed image stayed silent.
    assert_eq!(h.channel.sent(), vec![(CHAT_ID, "reply".to_string())]);
    assert!(h.channel.photos().is_empty());
    assert_eq!(h.image.as_ref().unwrap().call_count(), 1);
}

#[tokio::test]
async fn test_image_success_sends_photo() {
    let h = harness(Some("reply"), Some(StubImage::succeeding()), 0.0).await;
    enable_chat(&h).await;
    h.gateway
        .store
        .set_image_chance(CHAT_ID, 1.0)
        .await
        .unwrap();

    h.gateway.handle_message(incoming("hi")).await;

    let photos = h.channel.photos();
    assert_eq!(photos.len(), 1);
    assert_eq!(photos[0].0, CHAT_ID);
    assert!(photos[0].1.contains("Something interesting"));
}

#[tokio::test]
async fn test_roll_above_chance_skips_trigger() {
    let h = harness(Some("reply"), Some(StubImage::succeeding()), 0.99).await;
    enable_chat(&h).await;
    h.gateway
        .store
        .set_image_chance(CHAT_ID, 0.5)
        .await
        .unwrap();

    h.gateway.handle_message(incoming("hi")).await;

    assert_eq!(h.image.as_ref().unwrap().call_count(), 0);
    assert!(h.channel.photos().is_empty());
}

#[tokio::test]
async fn test_explicit_image_with_empty_pool() {
    let h = harness(Some("reply"), Some(StubImage::succeeding()), 1.0).await;
    enable_chat(&h).await;

    // No text supplied and nothing in the pool: a visible notice, no call.
    h.gateway.handle_message(incoming("/generate_image")).await;

    let sent = h.channel.sent();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].1.contains("No image prompts"));
    assert_eq!(h.image.as_ref().unwrap().call_count(), 0);
}

#[tokio::test]
async fn test_explicit_image_uses_pool_prompt() {
    let h = harness(Some("reply"), Some(StubImage::succeeding()), 1.0).await;
    enable_chat(&h).await;
    h.gateway
        .store
        .add_image_prompt("a fox in the rain")
        .await
        .unwrap();

    h.gateway.handle_message(incoming("/generate_image")).await;

    // Pool prompts go straight to the backend — no model rewrite.
    assert_eq!(h.provider.call_count(), 0);
    assert_eq!(h.image.as_ref().unwrap().call_count(), 1);
    assert_eq!(h.channel.photos().len(), 1);
}

#[tokio::test]
async fn test_explicit_image_rewrites_user_text() {
    let h = harness(Some("a painted fox"), Some(StubImage::succeeding()), 1.0).await;
    enable_chat(&h).await;

    h.gateway
        .handle_message(incoming("/generate_image нарисуй лису"))
        .await;

    // The user text went through the model with the image instruction.
    let calls = h.provider.calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].system_prompt.contains("image generation model"));
    assert_eq!(calls[0].current_message, "нарисуй лису");
    // And the rewrite never lands in conversation history.
    assert!(h.gateway.history.lock().unwrap().get(CHAT_ID).is_empty());
    drop(calls);

    assert_eq!(h.image.as_ref().unwrap().call_count(), 1);
}

#[tokio::test]
async fn test_tldr_summarizes_log() {
    let h = harness(Some("they argued about foxes"), None, 1.0).await;
    enable_chat(&h).await;

    h.gateway.handle_message(incoming("the fox is red")).await;
    h.gateway.handle_message(incoming("no, it is orange")).await;
    h.channel.sent.lock().unwrap().clear();
    h.provider.calls.lock().unwrap().clear();

    h.gateway.handle_message(incoming("/tldr 50")).await;

    let calls = h.provider.calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].system_prompt, SUMMARIZE_PROMPT);
    assert!(calls[0].current_message.contains("the fox is red"));
    // One-shot: the summary call carries no conversation history.
    assert!(calls[0].history.is_empty());
    drop(calls);

    let sent = h.channel.sent();
    assert_eq!(
        sent.last().unwrap().1,
        "they argued about foxes".to_string()
    );
}

#[tokio::test]
async fn test_help_needs_no_gate() {
    let h = harness(Some("reply"), None, 1.0).await;

    h.gateway.handle_message(incoming("/help")).await;

    let sent = h.channel.sent();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].1.contains("/request"));
}
