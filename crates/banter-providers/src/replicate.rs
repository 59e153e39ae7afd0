//! Replicate image-generation backend.
//!
//! Uses the synchronous prediction endpoint (`Prefer: wait`) and downloads
//! the first output file. Every failure path returns `None` — the trigger
//! layer decides whether that becomes an apology or silence.

use async_trait::async_trait;
use banter_core::traits::ImageBackend;
use serde::Deserialize;
use tracing::{debug, warn};

const API_BASE: &str = "https://api.replicate.com/v1";

/// Image generator backed by a Replicate-hosted model.
pub struct ReplicateBackend {
    client: reqwest::Client,
    api_token: String,
    /// Model slug, e.g. "black-forest-labs/flux-schnell".
    model: String,
}

impl ReplicateBackend {
    /// Create from config values.
    pub fn from_config(api_token: String, model: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_token,
            model,
        }
    }
}

#[derive(Deserialize)]
struct Prediction {
    status: Option<String>,
    output: Option<serde_json::Value>,
}

/// Pull the first output URL out of a prediction. Models return either a
/// single URL string or an array of URL strings.
fn first_output_url(output: &serde_json::Value) -> Option<String> {
    match output {
        serde_json::Value::String(url) => Some(url.clone()),
        serde_json::Value::Array(items) => items
            .first()
            .and_then(|v| v.as_str())
            .map(|s| s.to_string()),
        _ => None,
    }
}

#[async_trait]
impl ImageBackend for ReplicateBackend {
    fn name(&self) -> &str {
        "replicate"
    }

    async fn generate(&self, prompt: &str) -> Option<Vec<u8>> {
        debug!("replicate: generating image for prompt: {prompt}");

        let url = format!("{API_BASE}/models/{}/predictions", self.model);
        let body = serde_json::json!({ "input": { "prompt": prompt } });

        let resp = match self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_token))
            .header("Prefer", "wait")
            .json(&body)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                warn!("replicate request failed: {e}");
                return None;
            }
        };

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            warn!("replicate returned {status}: {text}");
            return None;
        }

        let prediction: Prediction = match resp.json().await {
            Ok(p) => p,
            Err(e) => {
                warn!("replicate: failed to parse prediction: {e}");
                return None;
            }
        };

        if let Some(status) = prediction.status.as_deref() {
            if status == "failed" || status == "canceled" {
                warn!("replicate: prediction ended as {status}");
                return None;
            }
        }

        let output_url = match prediction.output.as_ref().and_then(first_output_url) {
            Some(u) => u,
            None => {
                warn!("replicate: prediction has no output");
                return None;
            }
        };

        match self.client.get(&output_url).send().await {
            Ok(r) if r.status().is_success() => match r.bytes().await {
                Ok(bytes) => Some(bytes.to_vec()),
                Err(e) => {
                    warn!("replicate: failed to read image bytes: {e}");
                    None
                }
            },
            Ok(r) => {
                warn!("replicate: image download returned {}", r.status());
                None
            }
            Err(e) => {
                warn!("replicate: image download failed: {e}");
                None
            }
        }
    }
}
