//! Azure AI image edit response types

use serde::{Deserialize, Serialize};

/// Image edit response envelope
///
/// Only `data` is read; any other fields are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImageEditResponse {
    #[serde(default)]
    pub data: Vec<ImageData>,
}

/// One generated image
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImageData {
    /// Base64-encoded image bytes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub b64_json: Option<String>,

    /// Download location when the deployment returns URLs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub revised_prompt: Option<String>,
}

impl ImageData {
    /// Inline payload, ignoring empty strings
    pub fn inline_payload(&self) -> Option<&str> {
        self.b64_json.as_deref().filter(|value| !value.is_empty())
    }

    pub fn download_url(&self) -> Option<&str> {
        self.url.as_deref().filter(|value| !value.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_inline_response() {
        let json = r#"{ "created": 1700000000, "data": [{ "b64_json": "iVBORw0KGgo=" }] }"#;
        let response: ImageEditResponse = serde_json::from_str(json).unwrap();

        assert_eq!(response.data.len(), 1);
        assert_eq!(response.data[0].inline_payload(), Some("iVBORw0KGgo="));
        assert!(response.data[0].download_url().is_none());
    }

    #[test]
    fn test_parse_response_without_data() {
        let response: ImageEditResponse = serde_json::from_str(r#"{ "error": null }"#).unwrap();
        assert!(response.data.is_empty());
    }

    #[test]
    fn test_empty_payload_is_ignored() {
        let item = ImageData {
            b64_json: Some(String::new()),
            url: Some("https://cdn.example.com/out.png".to_string()),
            revised_prompt: None,
        };

        assert!(item.inline_payload().is_none());
        assert_eq!(item.download_url(), Some("https://cdn.example.com/out.png"));
    }
}
