use crate::{context::Context, error::BanterError, message::IncomingMessage};
use async_trait::async_trait;

/// Language-model backend — the brain.
///
/// Failures are returned as errors here; the answer pipeline converts them
/// to a fixed sentinel reply so they never propagate further.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Human-readable provider name.
    fn name(&self) -> &str;

    /// Model identifier, for the status snapshot.
    fn model(&self) -> &str;

    /// Send a conversation context to the backend and get the reply text.
    async fn complete(&self, context: &Context) -> Result<String, BanterError>;

    /// Check if the backend is reachable and ready.
    async fn is_available(&self) -> bool;
}

/// Image-generation backend.
///
/// `None` signals failure; no error ever escapes to the caller. The trigger
/// layer turns `None` into budget accounting and an optional apology.
#[async_trait]
pub trait ImageBackend: Send + Sync {
    /// Human-readable backend name.
    fn name(&self) -> &str;

    /// Generate an image for a prompt. Returns the image bytes, or `None`.
    async fn generate(&self, prompt: &str) -> Option<Vec<u8>>;
}

/// Messaging transport — the nervous system.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Human-readable channel name.
    fn name(&self) -> &str;

    /// Start listening for incoming messages.
    /// Returns a receiver that yields incoming messages.
    async fn start(&self) -> Result<tokio::sync::mpsc::Receiver<IncomingMessage>, BanterError>;

    /// Send a text message, segmented to the transport's limits.
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<(), BanterError>;

    /// Send a photo with a caption.
    async fn send_photo(
        &self,
        chat_id: i64,
        image: &[u8],
        caption: &str,
    ) -> Result<(), BanterError>;

    /// Show a typing indicator while a reply is being produced.
    async fn send_typing(&self, _chat_id: i64) -> Result<(), BanterError> {
        Ok(())
    }

    /// Graceful shutdown.
    async fn stop(&self) -> Result<(), BanterError>;
}
