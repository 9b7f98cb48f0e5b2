//! # Application Configuration
//!
//! Provides the validated configuration for a StyleSync process.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct an `AppConfig`.
//! Every field has a default, so an empty builder yields a usable local setup
//! except for provider credentials. `build()` validates eagerly and returns
//! actionable `Error::Config` messages so misconfiguration fails at startup
//! rather than on the first sync.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::{AppConfig, ProviderKind, StorageMode};
//!
//! let config = AppConfig::builder()
//!     .storage(StorageMode::Local { root: "local_storage".into() })
//!     .provider(ProviderKind::Stability)
//!     .stability_api_key("sk-...")
//!     .max_concurrent_generations(2)
//!     .build()?;
//! ```

use crate::error::{Error, Result};
use crate::logging::{redact_if_sensitive, LoggingConfig};
use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8000";
pub const DEFAULT_LOCAL_ROOT: &str = "local_storage";
pub const DEFAULT_BLOB_CONTAINER: &str = "file-container";
pub const DEFAULT_STYLES_PATH: &str = "styles.json";
pub const DEFAULT_OUTPUT_PATH: &str = "styled/";
pub const DEFAULT_AZURE_MODEL: &str = "flux.1-kontext-pro";
pub const DEFAULT_STABILITY_URL: &str =
    "https://api.stability.ai/v1/generation/stable-diffusion-v1-6/image-to-image";
pub const DEFAULT_MAX_CONCURRENT: usize = 4;
pub const MAX_CONCURRENT_LIMIT: usize = 64;
pub const DEFAULT_GENERATION_TIMEOUT_SECS: u64 = 120;

/// Where stored objects live
#[derive(Clone, PartialEq, Eq)]
pub enum StorageMode {
    /// A directory on the local filesystem
    Local { root: PathBuf },
    /// Process memory; contents vanish on restart
    Memory,
    /// One Azure Blob container, created on startup when missing
    AzureBlob {
        connection_string: String,
        container: String,
    },
}

impl fmt::Debug for StorageMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageMode::Local { root } => f.debug_struct("Local").field("root", root).finish(),
            StorageMode::Memory => f.write_str("Memory"),
            StorageMode::AzureBlob {
                connection_string,
                container,
            } => f
                .debug_struct("AzureBlob")
                .field(
                    "connection_string",
                    &redact_if_sensitive("connection_string", connection_string),
                )
                .field("container", container)
                .finish(),
        }
    }
}

impl Default for StorageMode {
    fn default() -> Self {
        StorageMode::Local {
            root: PathBuf::from(DEFAULT_LOCAL_ROOT),
        }
    }
}

/// Image generation backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProviderKind {
    #[default]
    Azure,
    Stability,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Azure => "azure",
            ProviderKind::Stability => "stability",
        }
    }
}

impl FromStr for ProviderKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "azure" => Ok(ProviderKind::Azure),
            "stability" => Ok(ProviderKind::Stability),
            other => Err(Error::Config(format!(
                "Unknown image provider '{}'. Supported providers: azure, stability",
                other
            ))),
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Azure AI Foundry image edit settings
#[derive(Clone, PartialEq, Eq)]
pub struct AzureConfig {
    /// Full image edit endpoint URL
    pub endpoint: String,
    pub api_key: String,
    pub model: String,
}

impl Default for AzureConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            api_key: String::new(),
            model: DEFAULT_AZURE_MODEL.to_string(),
        }
    }
}

impl fmt::Debug for AzureConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AzureConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &redact_if_sensitive("api_key", &self.api_key))
            .field("model", &self.model)
            .finish()
    }
}

/// Stability AI image-to-image settings
#[derive(Clone, PartialEq, Eq)]
pub struct StabilityConfig {
    pub api_key: String,
    pub api_url: String,
}

impl Default for StabilityConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_url: DEFAULT_STABILITY_URL.to_string(),
        }
    }
}

impl fmt::Debug for StabilityConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StabilityConfig")
            .field("api_key", &redact_if_sensitive("api_key", &self.api_key))
            .field("api_url", &self.api_url)
            .finish()
    }
}

/// Validated configuration for one StyleSync process.
///
/// Use [`AppConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct AppConfig {
    /// HTTP listener address
    pub bind_address: SocketAddr,

    /// Storage backend
    pub storage: StorageMode,

    /// Style catalog file (JSON or YAML, chosen by extension)
    pub styles_path: PathBuf,

    /// Source prefix used when a sync request omits one
    pub default_source_path: String,

    /// Output prefix used when a sync request omits one
    pub default_output_path: String,

    /// Selected image generation backend
    pub provider: ProviderKind,

    pub azure: AzureConfig,

    pub stability: StabilityConfig,

    /// Upper bound on in-flight generation calls within one sync run
    pub max_concurrent_generations: usize,

    /// Per-call timeout for the image provider
    pub generation_timeout_secs: u64,

    /// When set, every route except `GET /` requires a matching `X-API-Key`
    pub api_key: Option<String>,

    pub logging: LoggingConfig,
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("bind_address", &self.bind_address)
            .field("storage", &self.storage)
            .field("styles_path", &self.styles_path)
            .field("default_source_path", &self.default_source_path)
            .field("default_output_path", &self.default_output_path)
            .field("provider", &self.provider)
            .field("azure", &self.azure)
            .field("stability", &self.stability)
            .field("max_concurrent_generations", &self.max_concurrent_generations)
            .field("generation_timeout_secs", &self.generation_timeout_secs)
            .field(
                "api_key",
                &self
                    .api_key
                    .as_deref()
                    .map(|key| redact_if_sensitive("api_key", key)),
            )
            .field("logging", &self.logging)
            .finish()
    }
}

impl AppConfig {
    /// Creates a new builder for constructing an `AppConfig`.
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::default()
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// This checks:
    /// - Concurrency bound lies in `1..=64`
    /// - Generation timeout is non-zero
    /// - The selected provider has its credentials
    /// - Local storage root and styles path are not empty
    /// - The API key, when set, is not blank
    pub fn validate(&self) -> Result<()> {
        if self.max_concurrent_generations == 0 {
            return Err(Error::Config(
                "max_concurrent_generations must be at least 1".to_string(),
            ));
        }

        if self.max_concurrent_generations > MAX_CONCURRENT_LIMIT {
            return Err(Error::Config(format!(
                "max_concurrent_generations exceeds maximum of {}",
                MAX_CONCURRENT_LIMIT
            )));
        }

        if self.generation_timeout_secs == 0 {
            return Err(Error::Config(
                "generation_timeout_secs must be greater than 0".to_string(),
            ));
        }

        match &self.storage {
            StorageMode::Local { root } if root.as_os_str().is_empty() => {
                return Err(Error::Config(
                    "Local storage root cannot be empty. Set LOCAL_STORAGE_PATH or use memory storage."
                        .to_string(),
                ));
            }
            StorageMode::AzureBlob {
                connection_string,
                container,
            } => {
                if connection_string.trim().is_empty() {
                    return Err(Error::Config(
                        "AZURE_STORAGE_CONNECTION_STRING cannot be blank".to_string(),
                    ));
                }
                if container.trim().is_empty() {
                    return Err(Error::Config("CONTAINER_NAME cannot be blank".to_string()));
                }
            }
            _ => {}
        }

        if self.styles_path.as_os_str().is_empty() {
            return Err(Error::Config("Styles path cannot be empty".to_string()));
        }

        match self.provider {
            ProviderKind::Azure => {
                if self.azure.endpoint.trim().is_empty() || self.azure.api_key.trim().is_empty() {
                    return Err(Error::Config(
                        "Azure provider selected but endpoint or API key is missing. \
                         Set AZURE_ENDPOINT_URL and AZURE_API_KEY, or choose another provider."
                            .to_string(),
                    ));
                }
                if self.azure.model.trim().is_empty() {
                    return Err(Error::Config("Azure model name cannot be empty".to_string()));
                }
            }
            ProviderKind::Stability => {
                if self.stability.api_key.trim().is_empty() {
                    return Err(Error::Config(
                        "Stability provider selected but STABILITY_API_KEY is missing".to_string(),
                    ));
                }
                if self.stability.api_url.trim().is_empty() {
                    return Err(Error::Config("Stability API URL cannot be empty".to_string()));
                }
            }
        }

        if matches!(&self.api_key, Some(key) if key.trim().is_empty()) {
            return Err(Error::Config(
                "API key is set but blank. Unset it to disable authentication.".to_string(),
            ));
        }

        Ok(())
    }
}

/// Builder for constructing [`AppConfig`] instances.
#[derive(Default)]
pub struct AppConfigBuilder {
    bind_address: Option<String>,
    storage: Option<StorageMode>,
    styles_path: Option<PathBuf>,
    default_source_path: Option<String>,
    default_output_path: Option<String>,
    provider: Option<ProviderKind>,
    azure: AzureConfig,
    stability: StabilityConfig,
    max_concurrent_generations: Option<usize>,
    generation_timeout_secs: Option<u64>,
    api_key: Option<String>,
    logging: Option<LoggingConfig>,
}

impl AppConfigBuilder {
    /// Sets the HTTP listener address (e.g. `"127.0.0.1:8080"`).
    pub fn bind_address(mut self, addr: impl Into<String>) -> Self {
        self.bind_address = Some(addr.into());
        self
    }

    pub fn storage(mut self, mode: StorageMode) -> Self {
        self.storage = Some(mode);
        self
    }

    pub fn styles_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.styles_path = Some(path.into());
        self
    }

    pub fn default_source_path(mut self, path: impl Into<String>) -> Self {
        self.default_source_path = Some(path.into());
        self
    }

    pub fn default_output_path(mut self, path: impl Into<String>) -> Self {
        self.default_output_path = Some(path.into());
        self
    }

    pub fn provider(mut self, provider: ProviderKind) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn azure_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.azure.endpoint = endpoint.into();
        self
    }

    pub fn azure_api_key(mut self, key: impl Into<String>) -> Self {
        self.azure.api_key = key.into();
        self
    }

    pub fn azure_model(mut self, model: impl Into<String>) -> Self {
        self.azure.model = model.into();
        self
    }

    pub fn stability_api_key(mut self, key: impl Into<String>) -> Self {
        self.stability.api_key = key.into();
        self
    }

    pub fn stability_api_url(mut self, url: impl Into<String>) -> Self {
        self.stability.api_url = url.into();
        self
    }

    /// Bounds concurrent generation calls within one sync run.
    pub fn max_concurrent_generations(mut self, limit: usize) -> Self {
        self.max_concurrent_generations = Some(limit);
        self
    }

    pub fn generation_timeout_secs(mut self, secs: u64) -> Self {
        self.generation_timeout_secs = Some(secs);
        self
    }

    /// Requires clients to send this value in `X-API-Key`.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn logging(mut self, logging: LoggingConfig) -> Self {
        self.logging = Some(logging);
        self
    }

    /// Builds and validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` when the bind address does not parse or any
    /// check in [`AppConfig::validate`] fails.
    pub fn build(self) -> Result<AppConfig> {
        let bind_address = self
            .bind_address
            .as_deref()
            .unwrap_or(DEFAULT_BIND_ADDRESS)
            .parse::<SocketAddr>()
            .map_err(|e| Error::Config(format!("Invalid bind address: {}", e)))?;

        let config = AppConfig {
            bind_address,
            storage: self.storage.unwrap_or_default(),
            styles_path: self
                .styles_path
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STYLES_PATH)),
            default_source_path: self.default_source_path.unwrap_or_default(),
            default_output_path: self
                .default_output_path
                .unwrap_or_else(|| DEFAULT_OUTPUT_PATH.to_string()),
            provider: self.provider.unwrap_or_default(),
            azure: self.azure,
            stability: self.stability,
            max_concurrent_generations: self
                .max_concurrent_generations
                .unwrap_or(DEFAULT_MAX_CONCURRENT),
            generation_timeout_secs: self
                .generation_timeout_secs
                .unwrap_or(DEFAULT_GENERATION_TIMEOUT_SECS),
            api_key: self.api_key,
            logging: self.logging.unwrap_or_default(),
        };

        config.validate()?;

        Ok(config)
    }
}
