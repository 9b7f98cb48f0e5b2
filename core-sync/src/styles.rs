//! # Style Catalog
//!
//! The ordered list of style definitions a sync run materializes, loaded once
//! per process from a JSON or YAML file.
//!
//! ## File format
//!
//! Either a bare list of records or an object with a `styles` list:
//!
//! ```json
//! [
//!   { "index": 1, "name": "Vintage", "prompt_text": "as a 1970s photo", "strength": 0.6 },
//!   { "name": "Geometric 3D", "folder_name": "geo", "prompt_text": "low-poly render" }
//! ]
//! ```
//!
//! `name` and `prompt_text` are required. `strength` defaults to `0.7`,
//! `index` to the 1-based record position and the folder token to the
//! sanitized name.

use crate::{Result, SyncError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info};

/// Folder holding unmodified copies of source images
pub const ORIGINAL_FOLDER: &str = "original";

/// Strength applied when a record leaves it out
pub const DEFAULT_STRENGTH: f32 = 0.7;

/// One configured style
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StyleDefinition {
    /// Display position, informational only
    pub index: u32,
    pub name: String,
    /// Output folder name under the output prefix
    pub folder_token: String,
    pub prompt_text: String,
    /// Style intensity in `[0.0, 1.0]`
    pub strength: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

impl StyleDefinition {
    /// Build a definition with the default strength and a derived folder token
    pub fn new(index: u32, name: impl Into<String>, prompt_text: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            index,
            folder_token: sanitize_folder_token(&name),
            name,
            prompt_text: prompt_text.into(),
            strength: DEFAULT_STRENGTH,
            icon: None,
        }
    }

    pub fn with_strength(mut self, strength: f32) -> Self {
        self.strength = strength;
        self
    }

    pub fn with_folder_token(mut self, token: impl Into<String>) -> Self {
        self.folder_token = token.into();
        self
    }
}

/// Raw record as it appears in the catalog file
#[derive(Debug, Deserialize)]
struct StyleRecord {
    index: Option<u32>,
    name: Option<String>,
    #[serde(alias = "folder_token")]
    folder_name: Option<String>,
    #[serde(alias = "prompt")]
    prompt_text: Option<String>,
    strength: Option<f32>,
    icon: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CatalogDocument {
    List(Vec<StyleRecord>),
    Wrapped { styles: Vec<StyleRecord> },
}

impl CatalogDocument {
    fn into_records(self) -> Vec<StyleRecord> {
        match self {
            CatalogDocument::List(records) => records,
            CatalogDocument::Wrapped { styles } => styles,
        }
    }
}

/// Validated, immutable list of styles in catalog order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StyleCatalog {
    styles: Vec<StyleDefinition>,
}

impl StyleCatalog {
    /// Build a catalog from definitions, validating tokens and strengths
    ///
    /// # Errors
    ///
    /// Returns `SyncError::Config` if a name or prompt is blank, a strength
    /// lies outside `[0.0, 1.0]`, or folder tokens are empty, reserved or
    /// duplicated.
    pub fn new(styles: Vec<StyleDefinition>) -> Result<Self> {
        let mut tokens = HashSet::new();

        for style in &styles {
            if style.name.trim().is_empty() {
                return Err(SyncError::Config(format!(
                    "Style #{} has an empty name",
                    style.index
                )));
            }
            if style.prompt_text.trim().is_empty() {
                return Err(SyncError::Config(format!(
                    "Style '{}' has an empty prompt_text",
                    style.name
                )));
            }
            if !style.strength.is_finite() || !(0.0..=1.0).contains(&style.strength) {
                return Err(SyncError::Config(format!(
                    "Style '{}' has strength {} outside [0.0, 1.0]",
                    style.name, style.strength
                )));
            }
            if style.folder_token.is_empty() {
                return Err(SyncError::Config(format!(
                    "Style '{}' produces an empty folder name; set folder_name explicitly",
                    style.name
                )));
            }
            if style.folder_token == ORIGINAL_FOLDER {
                return Err(SyncError::Config(format!(
                    "Style '{}' uses the reserved folder name '{}'",
                    style.name, ORIGINAL_FOLDER
                )));
            }
            if !tokens.insert(style.folder_token.as_str()) {
                return Err(SyncError::Config(format!(
                    "Duplicate style folder '{}' (style '{}')",
                    style.folder_token, style.name
                )));
            }
        }

        Ok(Self { styles })
    }

    /// Catalog with no styles; only original copies are maintained
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse a JSON catalog
    pub fn from_json_str(content: &str) -> Result<Self> {
        let document: CatalogDocument = serde_json::from_str(content)
            .map_err(|e| SyncError::Config(format!("Invalid style catalog JSON: {}", e)))?;
        Self::from_records(document.into_records())
    }

    /// Parse a YAML catalog
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let document: CatalogDocument = serde_yaml::from_str(content)
            .map_err(|e| SyncError::Config(format!("Invalid style catalog YAML: {}", e)))?;
        Self::from_records(document.into_records())
    }

    /// Load a catalog file, picking the parser from the extension
    ///
    /// `.yaml` and `.yml` are parsed as YAML, everything else as JSON.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            SyncError::Config(format!(
                "Failed to read style catalog {}: {}",
                path.display(),
                e
            ))
        })?;

        let is_yaml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"))
            .unwrap_or(false);

        let catalog = if is_yaml {
            Self::from_yaml_str(&content)?
        } else {
            Self::from_json_str(&content)?
        };

        info!(
            path = %path.display(),
            styles = catalog.len(),
            "Loaded style catalog"
        );
        Ok(catalog)
    }

    fn from_records(records: Vec<StyleRecord>) -> Result<Self> {
        let mut styles = Vec::with_capacity(records.len());

        for (position, record) in records.into_iter().enumerate() {
            let index = record.index.unwrap_or(position as u32 + 1);

            let name = record
                .name
                .filter(|n| !n.trim().is_empty())
                .ok_or_else(|| {
                    SyncError::Config(format!(
                        "Style record {} is missing required field 'name'",
                        position + 1
                    ))
                })?;

            let prompt_text = record
                .prompt_text
                .filter(|p| !p.trim().is_empty())
                .ok_or_else(|| {
                    SyncError::Config(format!(
                        "Style '{}' is missing required field 'prompt_text'",
                        name
                    ))
                })?;

            let folder_token = match record.folder_name {
                Some(folder) => sanitize_folder_token(&folder),
                None => sanitize_folder_token(&name),
            };

            debug!(name = %name, folder = %folder_token, "Parsed style");

            styles.push(StyleDefinition {
                index,
                name,
                folder_token,
                prompt_text,
                strength: record.strength.unwrap_or(DEFAULT_STRENGTH),
                icon: record.icon,
            });
        }

        Self::new(styles)
    }

    pub fn styles(&self) -> &[StyleDefinition] {
        &self.styles
    }

    pub fn iter(&self) -> impl Iterator<Item = &StyleDefinition> {
        self.styles.iter()
    }

    pub fn len(&self) -> usize {
        self.styles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }

    /// Look a style up by display name or folder token
    ///
    /// Matching ignores case, spaces, underscores and hyphens, so
    /// `"Geometric 3D"`, `"geometric_3d"` and `"geometric-3d"` are the same key.
    pub fn find_by_name(&self, query: &str) -> Option<&StyleDefinition> {
        let key = normalize_style_key(query);
        if key.is_empty() {
            return None;
        }
        self.styles.iter().find(|style| {
            normalize_style_key(&style.name) == key || normalize_style_key(&style.folder_token) == key
        })
    }

    /// Folder names the engine owns under an output prefix, `original` first
    pub fn managed_folders(&self) -> Vec<&str> {
        std::iter::once(ORIGINAL_FOLDER)
            .chain(self.styles.iter().map(|s| s.folder_token.as_str()))
            .collect()
    }
}

/// Turn a display name into a filesystem-safe folder token
///
/// Lowercases, maps spaces to underscores and drops everything that is not
/// an ASCII letter, digit or underscore.
pub fn sanitize_folder_token(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .chars()
        .filter_map(|c| match c {
            ' ' => Some('_'),
            c if c.is_ascii_alphanumeric() || c == '_' => Some(c),
            _ => None,
        })
        .collect()
}

/// Comparison key for style lookups
pub fn normalize_style_key(value: &str) -> String {
    value
        .chars()
        .filter(|c| !matches!(c, ' ' | '_' | '-'))
        .flat_map(char::to_lowercase)
        .collect()
}
