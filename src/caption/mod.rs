//! Caption oracle abstraction.
//!
//! The oracle turns image bytes into free-text descriptions. It is an
//! external service with no retry policy: one request, one answer or one
//! failure.

mod gemini;

pub use gemini::GeminiCaptioner;

use async_trait::async_trait;

use crate::error::CaptionError;

/// External text-generation oracle for image descriptions.
#[async_trait]
pub trait CaptionOracle: Send + Sync {
    /// Submit JPEG bytes and get back a free-text title/description.
    async fn describe(&self, image: &[u8]) -> Result<String, CaptionError>;
}
