//! # banter-providers
//!
//! Backend implementations: an OpenAI-compatible chat-completions provider
//! and a Replicate image generator.

pub mod openai;
pub mod replicate;

pub use openai::OpenAiProvider;
pub use replicate::ReplicateBackend;
