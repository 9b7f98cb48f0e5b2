//! Stability AI response types

use serde::{Deserialize, Serialize};

/// Finish reason reported for blocked generations
pub const CONTENT_FILTERED: &str = "CONTENT_FILTERED";

/// Image-to-image response envelope
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationResponse {
    #[serde(default)]
    pub artifacts: Vec<Artifact>,
}

/// One generated image
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    /// Base64-encoded image bytes
    #[serde(default)]
    pub base64: Option<String>,

    /// `SUCCESS`, `ERROR` or `CONTENT_FILTERED`
    #[serde(default)]
    pub finish_reason: Option<String>,

    #[serde(default)]
    pub seed: Option<u64>,
}

impl Artifact {
    pub fn is_content_filtered(&self) -> bool {
        self.finish_reason.as_deref() == Some(CONTENT_FILTERED)
    }
}
