//! Error types for the Azure AI provider

use bridge_traits::{BridgeError, GenerationError};
use thiserror::Error;

/// Azure AI provider errors
#[derive(Error, Debug)]
pub enum AzureAiError {
    /// Endpoint or key missing
    #[error("Azure AI not configured: {0}")]
    NotConfigured(String),

    /// API request returned a non-success status
    #[error("Azure AI API error (status {status_code}): {message}")]
    ApiError { status_code: u16, message: String },

    /// Downloading a result URL returned a non-success status
    #[error("Result download failed (status {status_code}): {message}")]
    DownloadFailed { status_code: u16, message: String },

    /// Response body did not match the expected structure
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Response carried no usable image
    #[error("Unexpected response structure: {0}")]
    NoImageData(String),

    /// Inline payload was not valid base64
    #[error("Invalid base64 payload: {0}")]
    InvalidPayload(String),

    /// Transport failure
    #[error(transparent)]
    BridgeError(#[from] BridgeError),
}

/// Result type for Azure AI operations
pub type Result<T> = std::result::Result<T, AzureAiError>;

impl From<AzureAiError> for GenerationError {
    fn from(error: AzureAiError) -> Self {
        match error {
            AzureAiError::NotConfigured(msg) => GenerationError::NotConfigured(msg),
            AzureAiError::ApiError {
                status_code,
                message,
            }
            | AzureAiError::DownloadFailed {
                status_code,
                message,
            } => GenerationError::Api {
                status: status_code,
                message,
            },
            AzureAiError::ParseError(msg) | AzureAiError::NoImageData(msg) => {
                GenerationError::EmptyResponse(msg)
            }
            AzureAiError::InvalidPayload(msg) => GenerationError::InvalidImage(msg),
            AzureAiError::BridgeError(e) => GenerationError::Transport(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = AzureAiError::ApiError {
            status_code: 401,
            message: "Access denied due to invalid subscription key".to_string(),
        };

        assert_eq!(
            error.to_string(),
            "Azure AI API error (status 401): Access denied due to invalid subscription key"
        );
    }

    #[test]
    fn test_error_conversion() {
        let error: GenerationError = AzureAiError::ApiError {
            status_code: 429,
            message: "Too many requests".to_string(),
        }
        .into();
        assert!(matches!(error, GenerationError::Api { status: 429, .. }));

        let error: GenerationError = AzureAiError::NoImageData("keys: [error]".to_string()).into();
        assert!(matches!(error, GenerationError::EmptyResponse(_)));

        let error: GenerationError =
            AzureAiError::BridgeError(BridgeError::OperationFailed("Request timed out".into()))
                .into();
        assert!(matches!(error, GenerationError::Transport(_)));
    }
}
