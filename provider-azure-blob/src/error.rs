//! Error types for the Azure Blob provider

use bridge_traits::BridgeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AzureBlobError {
    /// Connection string is missing fields or carries an unusable key
    #[error("Invalid Azure Storage connection string: {0}")]
    InvalidConnectionString(String),

    #[error("Blob not found: {0}")]
    NotFound(String),

    /// REST call returned a non-success status
    #[error("Azure Blob API error (status {status_code}) during {operation}: {message}")]
    ApiError {
        operation: String,
        status_code: u16,
        message: String,
    },

    /// Listing body was not the expected XML
    #[error("Failed to parse blob listing: {0}")]
    ParseError(String),

    #[error(transparent)]
    BridgeError(#[from] BridgeError),
}

pub type Result<T> = std::result::Result<T, AzureBlobError>;

impl From<AzureBlobError> for BridgeError {
    fn from(error: AzureBlobError) -> Self {
        match error {
            AzureBlobError::InvalidConnectionString(_) => {
                BridgeError::NotAvailable(error.to_string())
            }
            AzureBlobError::NotFound(path) => BridgeError::NotFound(path),
            AzureBlobError::BridgeError(e) => e,
            other => BridgeError::OperationFailed(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion() {
        let error: BridgeError = AzureBlobError::NotFound("styled/a.png".to_string()).into();
        assert!(error.is_not_found());

        let error: BridgeError = AzureBlobError::ApiError {
            operation: "write styled/a.png".to_string(),
            status_code: 403,
            message: "AuthenticationFailed".to_string(),
        }
        .into();
        assert!(matches!(error, BridgeError::OperationFailed(ref m) if m.contains("403")));

        let error: BridgeError =
            AzureBlobError::InvalidConnectionString("AccountName missing".to_string()).into();
        assert!(matches!(error, BridgeError::NotAvailable(_)));
    }
}
