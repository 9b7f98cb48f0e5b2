//! List Blobs response body
//!
//! Only blob names and the continuation marker are read; every other element
//! and attribute is ignored.

use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EnumerationResults {
    #[serde(default)]
    pub blobs: BlobList,

    /// Empty or absent on the last page
    #[serde(default)]
    pub next_marker: Option<String>,
}

impl EnumerationResults {
    pub fn continuation(&self) -> Option<&str> {
        self.next_marker.as_deref().filter(|marker| !marker.is_empty())
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct BlobList {
    #[serde(rename = "Blob", default)]
    pub items: Vec<BlobItem>,
}

#[derive(Debug, Deserialize)]
pub struct BlobItem {
    #[serde(rename = "Name")]
    pub name: String,
}
