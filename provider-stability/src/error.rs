//! Error types for the Stability AI provider

use bridge_traits::{BridgeError, GenerationError};
use thiserror::Error;

/// Stability AI provider errors
#[derive(Error, Debug)]
pub enum StabilityError {
    /// API key missing
    #[error("Stability AI not configured: {0}")]
    NotConfigured(String),

    /// API request returned a non-success status
    #[error("Stability AI API error (status {status_code}): {message}")]
    ApiError { status_code: u16, message: String },

    /// Failed to parse API response
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// The request was blocked by the content filter
    #[error("Blocked by content filter")]
    ContentFiltered,

    /// Response carried no artifacts
    #[error("No artifacts returned")]
    NoArtifacts,

    /// Artifact payload was not valid base64
    #[error("Invalid base64 payload: {0}")]
    InvalidPayload(String),

    /// Transport failure
    #[error(transparent)]
    BridgeError(#[from] BridgeError),
}

/// Result type for Stability AI operations
pub type Result<T> = std::result::Result<T, StabilityError>;

impl From<StabilityError> for GenerationError {
    fn from(error: StabilityError) -> Self {
        match error {
            StabilityError::NotConfigured(msg) => GenerationError::NotConfigured(msg),
            StabilityError::ApiError {
                status_code,
                message,
            } => GenerationError::Api {
                status: status_code,
                message,
            },
            StabilityError::ParseError(msg) => GenerationError::EmptyResponse(msg),
            StabilityError::ContentFiltered => GenerationError::ContentFiltered,
            StabilityError::NoArtifacts => {
                GenerationError::EmptyResponse("no artifacts returned".to_string())
            }
            StabilityError::InvalidPayload(msg) => GenerationError::InvalidImage(msg),
            StabilityError::BridgeError(e) => GenerationError::Transport(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = StabilityError::ApiError {
            status_code: 400,
            message: "init_image: invalid dimensions".to_string(),
        };

        assert_eq!(
            error.to_string(),
            "Stability AI API error (status 400): init_image: invalid dimensions"
        );
    }

    #[test]
    fn test_error_conversion() {
        let error: GenerationError = StabilityError::ContentFiltered.into();
        assert!(matches!(error, GenerationError::ContentFiltered));

        let error: GenerationError = StabilityError::NoArtifacts.into();
        assert!(matches!(error, GenerationError::EmptyResponse(_)));
    }
}
