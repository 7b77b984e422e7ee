//! Gemini-backed caption oracle.

use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use tracing::debug;

use crate::error::CaptionError;

use super::CaptionOracle;

/// Prompt sent alongside every image.
const CAPTION_PROMPT: &str = "Please provide a title and a short description for the image.";

/// Caption oracle backed by the Gemini `generateContent` endpoint.
///
/// The image is submitted inline as base64; the first candidate's text is
/// returned verbatim.
#[derive(Clone)]
pub struct GeminiCaptioner {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiCaptioner {
    /// Create a captioner for the given API key and model name.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            model: model.into(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
        }
    }

    /// Override the API base URL (for tests against a stub server).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Get the configured model name.
    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        )
    }
}

#[async_trait]
impl CaptionOracle for GeminiCaptioner {
    async fn describe(&self, image: &[u8]) -> Result<String, CaptionError> {
        let image_base64 = general_purpose::STANDARD.encode(image);

        let payload = serde_json::json!({
            "contents": [{
                "parts": [
                    { "text": CAPTION_PROMPT },
                    {
                        "inline_data": {
                            "mime_type": "image/jpeg",
                            "data": image_base64
                        }
                    }
                ]
            }]
        });

        debug!(model = %self.model, bytes = image.len(), "submitting image to caption service");

        let response = self
            .client
            .post(self.endpoint())
            .json(&payload)
            .send()
            .await
            .map_err(|e| CaptionError::Http(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| CaptionError::Http(e.to_string()))?;

        if !status.is_success() {
            return Err(CaptionError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let result: serde_json::Value =
            serde_json::from_str(&body).map_err(|_| CaptionError::MalformedResponse)?;

        let caption = result["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .ok_or(CaptionError::MalformedResponse)?
            .to_string();

        Ok(caption)
    }
}
