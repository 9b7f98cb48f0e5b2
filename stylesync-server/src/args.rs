use std::path::PathBuf;

use bridge_traits::LogLevel;
use clap::Parser;
use core_runtime::config::{
    DEFAULT_AZURE_MODEL, DEFAULT_BIND_ADDRESS, DEFAULT_BLOB_CONTAINER, DEFAULT_GENERATION_TIMEOUT_SECS,
    DEFAULT_LOCAL_ROOT, DEFAULT_MAX_CONCURRENT, DEFAULT_OUTPUT_PATH, DEFAULT_STABILITY_URL,
    DEFAULT_STYLES_PATH,
};
use core_runtime::{AppConfig, LogFormat, LoggingConfig, ProviderKind, StorageMode};

/// StyleSync server: keeps a tree of AI-styled images in step with its sources.
#[derive(Parser, Debug)]
#[command(name = "stylesync-server")]
pub struct Args {
    /// Address to bind the HTTP server to.
    #[arg(long, default_value = DEFAULT_BIND_ADDRESS, env = "STYLESYNC_BIND")]
    pub bind: String,

    /// Root directory for local storage.
    #[arg(long, default_value = DEFAULT_LOCAL_ROOT, env = "LOCAL_STORAGE_PATH")]
    pub storage_path: PathBuf,

    /// Keep files in memory instead of on disk.
    #[arg(long, env = "STYLESYNC_MEMORY_STORAGE")]
    pub memory_storage: bool,

    /// Store files in Azure Blob Storage; takes precedence over the other
    /// storage flags.
    #[arg(long, env = "AZURE_STORAGE_CONNECTION_STRING", hide_env_values = true)]
    pub azure_storage_connection_string: Option<String>,

    /// Blob container, created on startup when missing.
    #[arg(long, default_value = DEFAULT_BLOB_CONTAINER, env = "CONTAINER_NAME")]
    pub container_name: String,

    /// Style catalog file (JSON or YAML).
    #[arg(long, default_value = DEFAULT_STYLES_PATH, env = "STYLESYNC_STYLES_PATH")]
    pub styles_path: PathBuf,

    /// Source prefix used when a request omits `source_path`.
    #[arg(long, default_value = "", env = "STYLESYNC_SOURCE_PATH")]
    pub source_path: String,

    /// Output prefix used when a request omits `output_path`.
    #[arg(long, default_value = DEFAULT_OUTPUT_PATH, env = "STYLESYNC_OUTPUT_PATH")]
    pub output_path: String,

    /// Image generation backend: `azure` or `stability`.
    #[arg(long, default_value = "azure", env = "STYLESYNC_PROVIDER")]
    pub provider: ProviderKind,

    /// Azure AI image edit endpoint URL.
    #[arg(long, env = "AZURE_ENDPOINT_URL")]
    pub azure_endpoint: Option<String>,

    /// Azure AI API key.
    #[arg(long, env = "AZURE_API_KEY", hide_env_values = true)]
    pub azure_api_key: Option<String>,

    /// Azure AI model name.
    #[arg(long, default_value = DEFAULT_AZURE_MODEL, env = "AZURE_MODEL")]
    pub azure_model: String,

    /// Stability AI API key.
    #[arg(long, env = "STABILITY_API_KEY", hide_env_values = true)]
    pub stability_api_key: Option<String>,

    /// Stability AI image-to-image URL.
    #[arg(long, default_value = DEFAULT_STABILITY_URL, env = "STABILITY_API_URL")]
    pub stability_api_url: String,

    /// Maximum concurrent generation calls per sync run.
    #[arg(long, default_value_t = DEFAULT_MAX_CONCURRENT, env = "STYLESYNC_MAX_CONCURRENT")]
    pub max_concurrent: usize,

    /// Per-call generation timeout in seconds.
    #[arg(long, default_value_t = DEFAULT_GENERATION_TIMEOUT_SECS, env = "STYLESYNC_GENERATION_TIMEOUT")]
    pub generation_timeout: u64,

    /// Require this value in the `X-API-Key` header.
    #[arg(long, env = "STYLESYNC_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Log output format: `pretty`, `json` or `compact`.
    #[arg(long, env = "STYLESYNC_LOG_FORMAT")]
    pub log_format: Option<LogFormat>,

    /// Minimum log level.
    #[arg(long, default_value = "info", env = "STYLESYNC_LOG_LEVEL")]
    pub log_level: LogLevel,

    /// Raw `tracing` filter, overriding the level.
    #[arg(long, env = "STYLESYNC_LOG_FILTER")]
    pub log_filter: Option<String>,
}

impl Args {
    pub fn logging(&self) -> LoggingConfig {
        let mut logging = LoggingConfig::default().with_level(self.log_level);
        if let Some(format) = self.log_format {
            logging = logging.with_format(format);
        }
        if let Some(filter) = &self.log_filter {
            logging = logging.with_filter(filter.clone());
        }
        logging
    }

    /// Validated configuration for these arguments
    pub fn into_config(self) -> core_runtime::Result<AppConfig> {
        let storage = match (&self.azure_storage_connection_string, self.memory_storage) {
            (Some(connection_string), _) => StorageMode::AzureBlob {
                connection_string: connection_string.clone(),
                container: self.container_name.clone(),
            },
            (None, true) => StorageMode::Memory,
            (None, false) => StorageMode::Local {
                root: self.storage_path.clone(),
            },
        };

        let mut builder = AppConfig::builder()
            .bind_address(self.bind.clone())
            .storage(storage)
            .styles_path(self.styles_path.clone())
            .default_source_path(self.source_path.clone())
            .default_output_path(self.output_path.clone())
            .provider(self.provider)
            .azure_model(self.azure_model.clone())
            .stability_api_url(self.stability_api_url.clone())
            .max_concurrent_generations(self.max_concurrent)
            .generation_timeout_secs(self.generation_timeout)
            .logging(self.logging());

        if let Some(endpoint) = self.azure_endpoint {
            builder = builder.azure_endpoint(endpoint);
        }
        if let Some(key) = self.azure_api_key {
            builder = builder.azure_api_key(key);
        }
        if let Some(key) = self.stability_api_key {
            builder = builder.stability_api_key(key);
        }
        if let Some(key) = self.api_key {
            builder = builder.api_key(key);
        }

        builder.build()
    }
}
