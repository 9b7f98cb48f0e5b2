//! Core service façade and bootstrap helpers.
//!
//! This crate wires the storage and image generation adapters into the
//! reconciliation core. Native builds enable the `local-shims` feature (which
//! depends on `bridge-desktop`) and pick generator backends with the `azure`
//! and `stability` features. The `azure-blob` feature adds the blob container
//! storage backend.

pub mod error;

pub use error::{Result, ServiceError};

use std::sync::Arc;
use std::time::Duration;

use bridge_traits::{ImageGenerator, StorageProvider};
use core_runtime::AppConfig;
use core_sync::{
    EngineConfig, JobRegistry, ReconciliationEngine, StyleCatalog, SyncRequestHandler,
};

#[cfg(feature = "local-shims")]
use bridge_traits::HttpClient;
#[cfg(feature = "local-shims")]
use core_runtime::{ProviderKind, StorageMode};
#[cfg(feature = "local-shims")]
use tracing::info;

/// Primary façade exposed to the HTTP layer.
#[derive(Clone)]
pub struct StyleSyncService {
    storage: Arc<dyn StorageProvider>,
    generator: Arc<dyn ImageGenerator>,
    catalog: Arc<StyleCatalog>,
    handler: Arc<SyncRequestHandler>,
}

impl StyleSyncService {
    /// Create a new service from explicit adapters.
    pub fn new(
        config: &AppConfig,
        storage: Arc<dyn StorageProvider>,
        generator: Arc<dyn ImageGenerator>,
        catalog: StyleCatalog,
    ) -> Self {
        let catalog = Arc::new(catalog);
        let engine = ReconciliationEngine::new(
            Arc::clone(&storage),
            Arc::clone(&generator),
            Arc::clone(&catalog),
            EngineConfig {
                max_concurrent: config.max_concurrent_generations,
                generation_timeout: Duration::from_secs(config.generation_timeout_secs),
            },
        );
        let handler = SyncRequestHandler::new(
            Arc::new(engine),
            JobRegistry::new(),
            config.default_source_path.clone(),
            config.default_output_path.clone(),
        );

        Self {
            storage,
            generator,
            catalog,
            handler: Arc::new(handler),
        }
    }

    pub fn storage(&self) -> Arc<dyn StorageProvider> {
        Arc::clone(&self.storage)
    }

    pub fn generator(&self) -> Arc<dyn ImageGenerator> {
        Arc::clone(&self.generator)
    }

    pub fn catalog(&self) -> Arc<StyleCatalog> {
        Arc::clone(&self.catalog)
    }

    /// Entry point for sync requests and job polling.
    pub fn handler(&self) -> Arc<SyncRequestHandler> {
        Arc::clone(&self.handler)
    }
}

/// Build the service described by a validated configuration.
///
/// Opens storage, constructs the configured generator and loads the style
/// catalog once for the life of the process.
///
/// ```no_run
/// # async fn example(config: core_runtime::AppConfig) -> core_service::Result<()> {
/// let service = core_service::bootstrap(config).await?;
/// let styles = service.catalog().len();
/// # Ok(())
/// # }
/// ```
#[cfg(feature = "local-shims")]
pub async fn bootstrap(config: AppConfig) -> Result<StyleSyncService> {
    config.validate()?;

    let http_client: Arc<dyn HttpClient> = Arc::new(bridge_desktop::ReqwestHttpClient::new(
        Duration::from_secs(config.generation_timeout_secs),
    )?);
    let storage = build_storage(&config.storage, Arc::clone(&http_client)).await?;
    let generator = build_generator(&config, http_client)?;
    let catalog = StyleCatalog::load(&config.styles_path).await?;

    info!(
        storage = storage.mode(),
        provider = generator.name(),
        styles = catalog.len(),
        "StyleSync service ready"
    );

    Ok(StyleSyncService::new(&config, storage, generator, catalog))
}

#[cfg(feature = "local-shims")]
#[cfg_attr(not(feature = "azure-blob"), allow(unused_variables))]
async fn build_storage(
    mode: &StorageMode,
    http_client: Arc<dyn HttpClient>,
) -> Result<Arc<dyn StorageProvider>> {
    match mode {
        StorageMode::Local { root } => {
            let storage = bridge_desktop::LocalFileStorage::new(root.clone()).await?;
            Ok(Arc::new(storage))
        }
        StorageMode::Memory => Ok(Arc::new(bridge_desktop::InMemoryStorage::new())),
        #[cfg(feature = "azure-blob")]
        StorageMode::AzureBlob {
            connection_string,
            container,
        } => {
            let storage = provider_azure_blob::AzureBlobStorage::from_connection_string(
                http_client,
                connection_string,
                container.as_str(),
            )
            .map_err(bridge_traits::BridgeError::from)?;
            storage
                .ensure_container()
                .await
                .map_err(bridge_traits::BridgeError::from)?;
            Ok(Arc::new(storage))
        }
        #[cfg(not(feature = "azure-blob"))]
        StorageMode::AzureBlob { .. } => Err(ServiceError::CapabilityMissing {
            capability: "storage:azure-blob".to_string(),
            message: "Azure Blob storage is not compiled in; enable the 'azure-blob' feature"
                .to_string(),
        }),
    }
}

#[cfg(feature = "local-shims")]
#[cfg_attr(
    not(any(feature = "azure", feature = "stability")),
    allow(unused_variables)
)]
fn build_generator(
    config: &AppConfig,
    http_client: Arc<dyn HttpClient>,
) -> Result<Arc<dyn ImageGenerator>> {
    #[cfg(any(feature = "azure", feature = "stability"))]
    let timeout = Duration::from_secs(config.generation_timeout_secs);

    match config.provider {
        #[cfg(feature = "azure")]
        ProviderKind::Azure => {
            let generator = provider_azure_ai::AzureAiGenerator::new(
                http_client,
                config.azure.clone(),
                timeout,
            )
            .map_err(bridge_traits::GenerationError::from)?;
            Ok(Arc::new(generator))
        }
        #[cfg(feature = "stability")]
        ProviderKind::Stability => {
            let generator = provider_stability::StabilityGenerator::new(
                http_client,
                config.stability.clone(),
                timeout,
            )
            .map_err(bridge_traits::GenerationError::from)?;
            Ok(Arc::new(generator))
        }
        #[allow(unreachable_patterns)]
        other => Err(ServiceError::CapabilityMissing {
            capability: format!("generator:{}", other),
            message: format!(
                "provider '{}' is not compiled in; enable the '{}' feature",
                other,
                other.as_str()
            ),
        }),
    }
}

#[cfg(all(test, feature = "local-shims"))]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_catalog(dir: &tempfile::TempDir) -> std::path::PathBuf {
        let path = dir.path().join("styles.json");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(
            br#"[
                { "name": "Vintage", "prompt_text": "as a 1970s photo", "strength": 0.6 },
                { "name": "Watercolor", "prompt_text": "as a watercolor painting" }
            ]"#,
        )
        .unwrap();
        path
    }

    fn http_client() -> Arc<dyn HttpClient> {
        Arc::new(bridge_desktop::ReqwestHttpClient::new(Duration::from_secs(5)).unwrap())
    }

    fn config(styles_path: std::path::PathBuf, provider: ProviderKind) -> AppConfig {
        AppConfig::builder()
            .storage(StorageMode::Memory)
            .styles_path(styles_path)
            .provider(provider)
            .azure_endpoint("https://example.services.ai.azure.com/images/edits")
            .azure_api_key("azure-key")
            .stability_api_key("sk-key")
            .max_concurrent_generations(2)
            .build()
            .unwrap()
    }

    #[cfg(feature = "azure")]
    #[tokio::test]
    async fn test_bootstrap_with_azure() {
        let dir = tempfile::tempdir().unwrap();
        let service = bootstrap(config(write_catalog(&dir), ProviderKind::Azure))
            .await
            .unwrap();

        assert_eq!(service.storage().mode(), "MEMORY");
        assert_eq!(service.generator().name(), "azure");
        assert_eq!(service.catalog().len(), 2);
        assert_eq!(service.handler().engine().config().max_concurrent, 2);
    }

    #[cfg(feature = "stability")]
    #[tokio::test]
    async fn test_bootstrap_with_stability() {
        let dir = tempfile::tempdir().unwrap();
        let service = bootstrap(config(write_catalog(&dir), ProviderKind::Stability))
            .await
            .unwrap();

        assert_eq!(service.generator().name(), "stability");
    }

    #[tokio::test]
    async fn test_local_storage_creates_root() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("data");
        let mut config = config(write_catalog(&dir), ProviderKind::Stability);
        config.storage = StorageMode::Local { root: root.clone() };

        let storage = build_storage(&config.storage, http_client()).await.unwrap();

        assert_eq!(storage.mode(), "LOCAL");
        assert!(root.is_dir());
    }

    #[cfg(feature = "azure-blob")]
    #[tokio::test]
    async fn test_blob_storage_rejects_bad_connection_string() {
        let mode = StorageMode::AzureBlob {
            connection_string: "AccountName=stylesync".to_string(),
            container: "file-container".to_string(),
        };

        let error = match build_storage(&mode, http_client()).await {
            Ok(_) => panic!("connection string without a credential was accepted"),
            Err(e) => e,
        };

        assert!(matches!(
            error,
            ServiceError::Bridge(bridge_traits::BridgeError::NotAvailable(_))
        ));
    }

    #[cfg(feature = "stability")]
    #[tokio::test]
    async fn test_bootstrap_fails_on_missing_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.yaml");

        let error = match bootstrap(config(missing, ProviderKind::Stability)).await {
            Ok(_) => panic!("bootstrap should fail without a catalog"),
            Err(e) => e,
        };

        assert!(matches!(
            error,
            ServiceError::Sync(core_sync::SyncError::Config(_))
        ));
    }
}
