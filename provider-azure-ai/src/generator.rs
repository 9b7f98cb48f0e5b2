//! Azure AI image edit generator
//!
//! Implements the `ImageGenerator` trait against an Azure AI Foundry image
//! edit deployment (e.g. FLUX.1 Kontext).

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bridge_traits::generation::{GenerationResult, ImageGenerator};
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest, MultipartForm};
use bridge_traits::storage::guess_mime_type;
use bytes::Bytes;
use core_runtime::config::AzureConfig;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use crate::error::{AzureAiError, Result};
use crate::types::ImageEditResponse;

/// MIME type used when the file name has no recognizable image extension
const FALLBACK_MIME_TYPE: &str = "image/png";

/// Azure AI image edit generator
///
/// Sends one multipart request per image with fields `image`, `model` and
/// `prompt`. The deployment has no strength control, so `strength` is not
/// forwarded.
///
/// # Example
///
/// ```ignore
/// use provider_azure_ai::AzureAiGenerator;
/// use bridge_traits::ImageGenerator;
///
/// let generator = AzureAiGenerator::new(http_client, config, Duration::from_secs(120))?;
/// let styled = generator.process_image_bytes(bytes, "cat.png", "as a watercolor", 0.7).await?;
/// ```
pub struct AzureAiGenerator {
    /// HTTP client for API requests
    http_client: Arc<dyn HttpClient>,

    config: AzureConfig,

    /// Per-request timeout
    timeout: Duration,
}

impl AzureAiGenerator {
    /// Create a new Azure AI generator
    ///
    /// # Errors
    ///
    /// Returns `AzureAiError::NotConfigured` when the endpoint or key is blank.
    pub fn new(
        http_client: Arc<dyn HttpClient>,
        config: AzureConfig,
        timeout: Duration,
    ) -> Result<Self> {
        if config.endpoint.trim().is_empty() || config.api_key.trim().is_empty() {
            return Err(AzureAiError::NotConfigured(
                "AZURE_ENDPOINT_URL and AZURE_API_KEY must be set".to_string(),
            ));
        }

        Ok(Self {
            http_client,
            config,
            timeout,
        })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn build_request(&self, image: Bytes, file_name: &str, prompt: &str) -> HttpRequest {
        let mime_type = match guess_mime_type(file_name) {
            mime if mime.starts_with("image/") => mime,
            _ => FALLBACK_MIME_TYPE,
        };

        let form = MultipartForm::new()
            .file("image", file_name, mime_type, image)
            .text("model", self.config.model.as_str())
            .text("prompt", prompt);

        HttpRequest::new(HttpMethod::Post, self.config.endpoint.as_str())
            .bearer_token(self.config.api_key.as_str())
            .multipart(form)
            .timeout(self.timeout)
    }

    /// Submit an edit request and extract the first image
    #[instrument(skip(self, image, prompt), fields(model = %self.config.model))]
    async fn edit_image(&self, image: Bytes, file_name: &str, prompt: &str) -> Result<Bytes> {
        info!("Submitting Azure AI request for {}", file_name);

        let request = self.build_request(image, file_name, prompt);
        let response = self.http_client.execute(request).await?;

        if !response.is_success() {
            warn!("Azure AI request failed: status={}", response.status);
            return Err(AzureAiError::ApiError {
                status_code: response.status,
                message: response.body_text(),
            });
        }

        let edit: ImageEditResponse = serde_json::from_slice(&response.body).map_err(|e| {
            AzureAiError::ParseError(format!("Failed to parse image edit response: {}", e))
        })?;

        let Some(item) = edit.data.first() else {
            return Err(AzureAiError::NoImageData(
                "response contains no data entries".to_string(),
            ));
        };

        if let Some(payload) = item.inline_payload() {
            debug!("Decoding inline image payload");
            return STANDARD
                .decode(payload)
                .map(Bytes::from)
                .map_err(|e| AzureAiError::InvalidPayload(e.to_string()));
        }

        if let Some(url) = item.download_url() {
            return self.download(url).await;
        }

        Err(AzureAiError::NoImageData(
            "first data entry has neither b64_json nor url".to_string(),
        ))
    }

    #[instrument(skip(self))]
    async fn download(&self, url: &str) -> Result<Bytes> {
        info!("Result is a URL, downloading");

        let request = HttpRequest::new(HttpMethod::Get, url).timeout(self.timeout);
        let response = self.http_client.execute(request).await?;

        if !response.is_success() {
            return Err(AzureAiError::DownloadFailed {
                status_code: response.status,
                message: response.body_text(),
            });
        }

        Ok(response.body)
    }
}

#[async_trait]
impl ImageGenerator for AzureAiGenerator {
    fn name(&self) -> &'static str {
        "azure"
    }

    async fn process_image_bytes(
        &self,
        image: Bytes,
        file_name: &str,
        prompt: &str,
        _strength: f32,
    ) -> GenerationResult<Bytes> {
        Ok(self.edit_image(image, file_name, prompt).await?)
    }
}
