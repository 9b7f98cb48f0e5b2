//! Image Generation Abstraction
//!
//! A single-method capability: take source image bytes plus a text prompt and
//! a strength, return transformed image bytes. Each AI provider ships one
//! implementation; the variant is picked from configuration.

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

use crate::error::BridgeError;

/// Errors surfaced by image generation providers
///
/// Every variant renders the provider's distinguishing message so a failed
/// task can be diagnosed from the sync result alone.
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("Generator not configured: {0}")]
    NotConfigured(String),

    #[error("Provider API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Blocked by provider content filter")]
    ContentFiltered,

    #[error("Provider returned no image: {0}")]
    EmptyResponse(String),

    #[error("Provider returned data that is not a recognizable image: {0}")]
    InvalidImage(String),

    #[error("Generation timed out after {0} seconds")]
    Timeout(u64),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Transport error: {0}")]
    Transport(#[from] BridgeError),
}

pub type GenerationResult<T> = std::result::Result<T, GenerationError>;

/// Image generation provider
///
/// # Example
///
/// ```ignore
/// use bridge_traits::generation::ImageGenerator;
///
/// async fn stylize(generator: &dyn ImageGenerator, source: Bytes) -> GenerationResult<Bytes> {
///     generator
///         .process_image_bytes(source, "cat.png", "as a watercolor painting", 0.7)
///         .await
/// }
/// ```
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Provider name used in logs and configuration (e.g. `"azure"`)
    fn name(&self) -> &'static str;

    /// Transform an image
    ///
    /// # Arguments
    ///
    /// * `image` - Source image bytes
    /// * `file_name` - Source file name, used to label the upload and pick a MIME type
    /// * `prompt` - Style transformation prompt
    /// * `strength` - Style intensity in `[0.0, 1.0]`
    async fn process_image_bytes(
        &self,
        image: Bytes,
        file_name: &str,
        prompt: &str,
        strength: f32,
    ) -> GenerationResult<Bytes>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_carry_provider_detail() {
        let error = GenerationError::Api {
            status: 401,
            message: "invalid api key".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Provider API error (status 401): invalid api key"
        );

        let error: GenerationError = BridgeError::OperationFailed("Request timed out".into()).into();
        assert!(error.to_string().contains("Request timed out"));
    }
}
