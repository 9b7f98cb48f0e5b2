//! Stability AI image-to-image generator

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bridge_traits::generation::{GenerationResult, ImageGenerator};
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest, MultipartForm};
use bridge_traits::storage::guess_mime_type;
use bytes::Bytes;
use core_runtime::config::StabilityConfig;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};

use crate::error::{Result, StabilityError};
use crate::types::GenerationResponse;

/// Lower bound accepted for `image_strength`
const MIN_IMAGE_STRENGTH: f32 = 0.01;

/// Upper bound accepted for `image_strength`
const MAX_IMAGE_STRENGTH: f32 = 0.99;

const CFG_SCALE: u32 = 7;
const SAMPLES: u32 = 1;
const STEPS: u32 = 30;

/// How strongly the API should keep the source image
///
/// Style strength and `image_strength` point in opposite directions: a strong
/// style keeps little of the source.
pub fn image_strength(strength: f32) -> f32 {
    (1.0 - strength).clamp(MIN_IMAGE_STRENGTH, MAX_IMAGE_STRENGTH)
}

/// Stability AI generator
///
/// One multipart request per image; the first artifact is the result.
pub struct StabilityGenerator {
    http_client: Arc<dyn HttpClient>,
    config: StabilityConfig,
    timeout: Duration,
}

impl StabilityGenerator {
    /// Create a new Stability AI generator
    ///
    /// # Errors
    ///
    /// Returns `StabilityError::NotConfigured` when the API key is blank.
    pub fn new(
        http_client: Arc<dyn HttpClient>,
        config: StabilityConfig,
        timeout: Duration,
    ) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(StabilityError::NotConfigured(
                "STABILITY_API_KEY must be set".to_string(),
            ));
        }

        Ok(Self {
            http_client,
            config,
            timeout,
        })
    }

    fn build_request(
        &self,
        image: Bytes,
        file_name: &str,
        prompt: &str,
        strength: f32,
    ) -> HttpRequest {
        let mime_type = match guess_mime_type(file_name) {
            mime if mime.starts_with("image/") => mime,
            _ => "image/png",
        };

        let form = MultipartForm::new()
            .file("init_image", file_name, mime_type, image)
            .text("image_strength", format!("{:.2}", image_strength(strength)))
            .text("init_image_mode", "IMAGE_STRENGTH")
            .text("text_prompts[0][text]", prompt)
            .text("text_prompts[0][weight]", "1")
            .text("cfg_scale", CFG_SCALE.to_string())
            .text("samples", SAMPLES.to_string())
            .text("steps", STEPS.to_string());

        HttpRequest::new(HttpMethod::Post, self.config.api_url.as_str())
            .header("Accept", "application/json")
            .bearer_token(self.config.api_key.as_str())
            .multipart(form)
            .timeout(self.timeout)
    }

    #[instrument(skip(self, image, prompt))]
    async fn image_to_image(
        &self,
        image: Bytes,
        file_name: &str,
        prompt: &str,
        strength: f32,
    ) -> Result<Bytes> {
        info!("Submitting Stability AI request for {}", file_name);

        let request = self.build_request(image, file_name, prompt, strength);
        let response = self.http_client.execute(request).await?;

        if !response.is_success() {
            warn!("Stability AI request failed: status={}", response.status);
            return Err(StabilityError::ApiError {
                status_code: response.status,
                message: response.body_text(),
            });
        }

        let generation: GenerationResponse =
            serde_json::from_slice(&response.body).map_err(|e| {
                StabilityError::ParseError(format!("Failed to parse generation response: {}", e))
            })?;

        let artifact = generation
            .artifacts
            .into_iter()
            .next()
            .ok_or(StabilityError::NoArtifacts)?;

        if artifact.is_content_filtered() {
            warn!("Stability AI: content filtered for {}", file_name);
            return Err(StabilityError::ContentFiltered);
        }

        let payload = artifact.base64.ok_or_else(|| {
            StabilityError::ParseError("artifact has no base64 payload".to_string())
        })?;

        STANDARD
            .decode(payload)
            .map(Bytes::from)
            .map_err(|e| StabilityError::InvalidPayload(e.to_string()))
    }
}

#[async_trait]
impl ImageGenerator for StabilityGenerator {
    fn name(&self) -> &'static str {
        "stability"
    }

    async fn process_image_bytes(
        &self,
        image: Bytes,
        file_name: &str,
        prompt: &str,
        strength: f32,
    ) -> GenerationResult<Bytes> {
        Ok(self.image_to_image(image, file_name, prompt, strength).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::error::Result as BridgeResult;
    use bridge_traits::http::HttpResponse;
    use bridge_traits::GenerationError;
    use mockall::mock;
    use std::collections::HashMap;

    mock! {
        HttpClient {}

        #[async_trait]
        impl HttpClient for HttpClient {
            async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse>;
        }
    }

    fn config() -> StabilityConfig {
        StabilityConfig {
            api_key: "sk-test".to_string(),
            api_url: "https://api.stability.ai/v1/generation/sd/image-to-image".to_string(),
        }
    }

    fn ok_response(body: &str) -> HttpResponse {
        HttpResponse {
            status: 200,
            headers: HashMap::new(),
            body: Bytes::from(body.to_string()),
        }
    }

    fn generator(mock_http: MockHttpClient) -> StabilityGenerator {
        StabilityGenerator::new(Arc::new(mock_http), config(), Duration::from_secs(60)).unwrap()
    }

    #[test]
    fn test_image_strength_is_inverted_and_clamped() {
        assert!((image_strength(0.7) - 0.3).abs() < 1e-6);
        assert_eq!(image_strength(0.0), 0.99);
        assert_eq!(image_strength(1.0), 0.01);
    }

    #[test]
    fn test_requires_api_key() {
        let result = StabilityGenerator::new(
            Arc::new(MockHttpClient::new()),
            StabilityConfig {
                api_key: String::new(),
                ..config()
            },
            Duration::from_secs(60),
        );
        assert!(matches!(result, Err(StabilityError::NotConfigured(_))));
    }

    #[tokio::test]
    async fn test_request_fields() {
        let mut mock_http = MockHttpClient::new();

        mock_http
            .expect_execute()
            .times(1)
            .withf(|request: &HttpRequest| {
                let Some(form) = &request.multipart else {
                    return false;
                };

                request.url.ends_with("/image-to-image")
                    && request.headers.get("Authorization") == Some(&"Bearer sk-test".to_string())
                    && request.headers.get("Accept") == Some(&"application/json".to_string())
                    && request.timeout == Some(Duration::from_secs(60))
                    && form.text_value("image_strength") == Some("0.30")
                    && form.text_value("init_image_mode") == Some("IMAGE_STRENGTH")
                    && form.text_value("text_prompts[0][text]") == Some("as a pencil sketch")
                    && form.text_value("text_prompts[0][weight]") == Some("1")
                    && form.text_value("cfg_scale") == Some("7")
                    && form.text_value("samples") == Some("1")
                    && form.text_value("steps") == Some("30")
                    && form.parts.iter().any(|part| part.name() == "init_image")
            })
            .returning(|_| {
                Ok(ok_response(
                    r#"{ "artifacts": [{ "base64": "iVBORw0KGgo=", "finishReason": "SUCCESS" }] }"#,
                ))
            });

        let generator = generator(mock_http);
        let bytes = generator
            .process_image_bytes(Bytes::from_static(b"x"), "dog.png", "as a pencil sketch", 0.7)
            .await
            .unwrap();

        assert_eq!(bytes.len(), 8);
    }

    #[tokio::test]
    async fn test_content_filtered() {
        let mut mock_http = MockHttpClient::new();

        mock_http.expect_execute().returning(|_| {
            Ok(ok_response(
                r#"{ "artifacts": [{ "base64": "", "finishReason": "CONTENT_FILTERED" }] }"#,
            ))
        });

        let error = generator(mock_http)
            .process_image_bytes(Bytes::from_static(b"x"), "dog.png", "prompt", 0.5)
            .await
            .unwrap_err();

        assert!(matches!(error, GenerationError::ContentFiltered));
    }

    #[tokio::test]
    async fn test_no_artifacts() {
        let mut mock_http = MockHttpClient::new();

        mock_http
            .expect_execute()
            .returning(|_| Ok(ok_response(r#"{ "artifacts": [] }"#)));

        let error = generator(mock_http)
            .process_image_bytes(Bytes::from_static(b"x"), "dog.png", "prompt", 0.5)
            .await
            .unwrap_err();

        assert!(matches!(error, GenerationError::EmptyResponse(_)));
    }

    #[tokio::test]
    async fn test_api_error_is_not_retried() {
        let mut mock_http = MockHttpClient::new();

        mock_http.expect_execute().times(1).returning(|_| {
            Ok(HttpResponse {
                status: 503,
                headers: HashMap::new(),
                body: Bytes::from_static(b"service unavailable"),
            })
        });

        let error = generator(mock_http)
            .process_image_bytes(Bytes::from_static(b"x"), "dog.png", "prompt", 0.5)
            .await
            .unwrap_err();

        match error {
            GenerationError::Api { status, message } => {
                assert_eq!(status, 503);
                assert_eq!(message, "service unavailable");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
