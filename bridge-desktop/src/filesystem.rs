//! Local Storage Implementation using Tokio

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    storage::{folder_prefix, trim_path, StorageProvider},
};
use bytes::Bytes;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

/// Tokio-based storage rooted at a directory on disk
///
/// Object paths map onto files beneath `root`, so `styled/vintage/a.jpg` is
/// stored at `<root>/styled/vintage/a.jpg`. Listing walks the tree recursively
/// and reports `/`-separated paths relative to the root.
pub struct LocalFileStorage {
    root: PathBuf,
}

impl LocalFileStorage {
    /// Create a storage rooted at `root`, creating the directory if needed
    pub async fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root).await.map_err(Self::map_io_error)?;
        debug!(root = ?root, "Initialized local storage");
        Ok(Self { root })
    }

    /// Directory this storage is rooted at
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Convert std::io::Error to BridgeError
    fn map_io_error(e: std::io::Error) -> BridgeError {
        BridgeError::Io(e)
    }

    /// Resolve an object path to a location under the root
    ///
    /// Rejects anything that could escape the root (`..`, absolute paths).
    fn resolve(&self, path: &str) -> Result<PathBuf> {
        let relative = Path::new(trim_path(path));
        let mut resolved = self.root.clone();
        for component in relative.components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                Component::CurDir => {}
                _ => {
                    return Err(BridgeError::OperationFailed(format!(
                        "Invalid storage path: {}",
                        path
                    )))
                }
            }
        }
        Ok(resolved)
    }

    /// Object path for a file under the root
    fn relative_path(&self, file: &Path) -> Option<String> {
        let relative = file.strip_prefix(&self.root).ok()?;
        let parts: Vec<String> = relative
            .components()
            .filter_map(|c| match c {
                Component::Normal(s) => s.to_str().map(str::to_string),
                _ => None,
            })
            .collect();
        Some(parts.join("/"))
    }

    /// Every file beneath `dir`, depth-first
    async fn walk(&self, dir: PathBuf) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        let mut pending = vec![dir];

        while let Some(current) = pending.pop() {
            let mut read_dir = match fs::read_dir(&current).await {
                Ok(read_dir) => read_dir,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(Self::map_io_error(e)),
            };

            while let Some(entry) = read_dir.next_entry().await.map_err(Self::map_io_error)? {
                let file_type = entry.file_type().await.map_err(Self::map_io_error)?;
                if file_type.is_dir() {
                    pending.push(entry.path());
                } else if file_type.is_file() {
                    files.push(entry.path());
                }
            }
        }

        Ok(files)
    }
}

#[async_trait]
impl StorageProvider for LocalFileStorage {
    fn mode(&self) -> &'static str {
        "LOCAL"
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        // Start the walk at the deepest folder the prefix names
        let start = match prefix.rfind('/') {
            Some(idx) => self.resolve(&prefix[..idx])?,
            None => self.root.clone(),
        };

        let mut paths: Vec<String> = self
            .walk(start)
            .await?
            .iter()
            .filter_map(|file| self.relative_path(file))
            .filter(|path| path.starts_with(prefix))
            .collect();
        paths.sort();

        debug!(prefix = %prefix, count = paths.len(), "Listed local storage");
        Ok(paths)
    }

    async fn read(&self, path: &str) -> Result<Bytes> {
        let file = self.resolve(path)?;
        match fs::read(&file).await {
            Ok(data) => {
                debug!(path = %path, size = data.len(), "Read object");
                Ok(Bytes::from(data))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(BridgeError::NotFound(path.to_string()))
            }
            Err(e) => Err(Self::map_io_error(e)),
        }
    }

    async fn write(&self, path: &str, data: Bytes) -> Result<()> {
        let file = self.resolve(path)?;
        if file == self.root {
            return Err(BridgeError::OperationFailed(
                "Cannot write to the storage root".to_string(),
            ));
        }

        // Ensure parent directory exists
        if let Some(parent) = file.parent() {
            fs::create_dir_all(parent).await.map_err(Self::map_io_error)?;
        }

        fs::write(&file, data.as_ref())
            .await
            .map_err(Self::map_io_error)?;
        debug!(path = %path, size = data.len(), "Wrote object");
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let file = self.resolve(path)?;
        match fs::remove_file(&file).await {
            Ok(()) => {
                debug!(path = %path, "Deleted object");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Self::map_io_error(e)),
        }
    }

    async fn exists(&self, path: &str) -> Result<bool> {
        let file = self.resolve(path)?;
        match fs::metadata(&file).await {
            Ok(metadata) => Ok(metadata.is_file()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(Self::map_io_error(e)),
        }
    }

    async fn delete_prefix(&self, folder: &str) -> Result<Vec<String>> {
        let prefix = folder_prefix(folder);
        let mut deleted = Vec::new();

        for path in self.list(&prefix).await? {
            match self.delete(&path).await {
                Ok(()) => deleted.push(path),
                Err(e) => warn!(path = %path, error = %e, "Failed to delete object"),
            }
        }

        // Remove the emptied directory tree as well
        if !prefix.is_empty() {
            let dir = self.resolve(&prefix)?;
            if let Err(e) = fs::remove_dir_all(&dir).await {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!(folder = %folder, error = %e, "Failed to remove folder");
                }
            }
        }

        debug!(folder = %folder, count = deleted.len(), "Deleted folder");
        Ok(deleted)
    }
}
