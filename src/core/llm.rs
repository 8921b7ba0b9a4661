//! Blocking client for an OpenAI-compatible chat-completions endpoint, used only
//! to caption images.

use crate::error::ConversionError;
use crate::utils::constants::CAPTION_PROMPT;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::Path;
use std::time::Duration;

#[derive(Clone)]
pub struct LlmClient {
    api_key: String,
    base_url: String,
    timeout: Duration,
}

impl std::fmt::Debug for LlmClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmClient")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<serde_json::Value>,
}

impl LlmClient {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
        }
    }

    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    /// Asks `model` to describe the image at `path`.
    pub fn caption(&self, path: &Path, model: &str) -> Result<String, ConversionError> {
        let data_url = image_data_url(path)?;
        let request = ChatRequest {
            model,
            messages: vec![json!({
                "role": "user",
                "content": [
                    { "type": "text", "text": CAPTION_PROMPT },
                    { "type": "image_url", "image_url": { "url": data_url } }
                ]
            })],
        };

        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(self.timeout))
            .build()
            .into();

        let mut response = agent
            .post(&self.completions_url())
            .header("Authorization", &format!("Bearer {}", self.api_key))
            .send_json(&request)
            .map_err(|e| ConversionError::Captioning(e.to_string()))?;

        let completion: ChatCompletion = response
            .body_mut()
            .read_json()
            .map_err(|e| ConversionError::Captioning(e.to_string()))?;

        let caption = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();
        tracing::debug!(model, chars = caption.len(), "image caption received");
        Ok(caption.trim().to_string())
    }
}

fn image_data_url(path: &Path) -> Result<String, ConversionError> {
    let bytes = std::fs::read(path).map_err(|e| ConversionError::Captioning(e.to_string()))?;
    let mime = mime_guess::from_path(path).first_or_octet_stream();
    Ok(format!("data:{};base64,{}", mime, STANDARD.encode(bytes)))
}
