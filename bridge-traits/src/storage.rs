//! Storage Abstractions
//!
//! Provides the byte-addressable object store contract used by the sync engine
//! and the HTTP layer, plus the path helpers shared by every implementation.
//!
//! Paths are plain strings using `/` as the folder separator. Folders are not
//! first-class objects: a "folder" is simply the common prefix of the paths
//! stored beneath it.

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::Result;

/// Object store trait
///
/// Abstracts the storage backend the application runs against:
/// - Local: a directory on disk
/// - Memory: a process-local map (development and tests)
/// - Azure: one blob container
///
/// # Example
///
/// ```ignore
/// use bridge_traits::storage::StorageProvider;
///
/// async fn copy(store: &dyn StorageProvider, from: &str, to: &str) -> Result<()> {
///     let data = store.read(from).await?;
///     store.write(to, data).await
/// }
/// ```
#[async_trait]
pub trait StorageProvider: Send + Sync {
    /// Short label for the backend (e.g. `"LOCAL"`)
    fn mode(&self) -> &'static str;

    /// List every object path that starts with `prefix`
    ///
    /// An empty prefix lists the whole store. The returned paths are sorted.
    async fn list(&self, prefix: &str) -> Result<Vec<String>>;

    /// Read an object
    ///
    /// # Errors
    ///
    /// Returns `BridgeError::NotFound` when no object exists at `path`.
    async fn read(&self, path: &str) -> Result<Bytes>;

    /// Write an object, replacing any existing content
    async fn write(&self, path: &str, data: Bytes) -> Result<()>;

    /// Delete an object
    ///
    /// Deleting a path that does not exist is not an error.
    async fn delete(&self, path: &str) -> Result<()>;

    /// Check whether an object exists
    async fn exists(&self, path: &str) -> Result<bool> {
        match self.read(path).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Delete every object beneath a folder and return the deleted paths
    ///
    /// Individual delete failures are skipped so one stuck object does not
    /// keep the rest of the folder alive.
    async fn delete_prefix(&self, folder: &str) -> Result<Vec<String>> {
        let prefix = folder_prefix(folder);
        let mut deleted = Vec::new();
        for path in self.list(&prefix).await? {
            if self.delete(&path).await.is_ok() {
                deleted.push(path);
            }
        }
        Ok(deleted)
    }
}

/// Strip leading and trailing separators from a path or prefix
pub fn trim_path(path: &str) -> &str {
    path.trim_matches('/')
}

/// Turn a folder name into a listing prefix (`"a/b"` → `"a/b/"`, `""` → `""`)
pub fn folder_prefix(folder: &str) -> String {
    let trimmed = trim_path(folder);
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{}/", trimmed)
    }
}

/// Join path segments with `/`, skipping empty segments
pub fn join_path(segments: &[&str]) -> String {
    segments
        .iter()
        .map(|s| trim_path(s))
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

/// Final segment of a path
pub fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Folder containing a path (`""` for top-level objects)
pub fn parent_folder(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[..idx],
        None => "",
    }
}

/// Lowercased extension of a path, without the dot
pub fn extension(path: &str) -> Option<String> {
    let name = file_name(path);
    match name.rfind('.') {
        Some(idx) if idx > 0 && idx + 1 < name.len() => Some(name[idx + 1..].to_lowercase()),
        _ => None,
    }
}

/// Guess a MIME type from a path's extension
pub fn guess_mime_type(path: &str) -> &'static str {
    match extension(path).as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("json") => "application/json",
        Some("txt") => "text/plain",
        Some("html") => "text/html",
        Some("css") => "text/css",
        Some("js") => "application/javascript",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_folder_prefix() {
        assert_eq!(folder_prefix(""), "");
        assert_eq!(folder_prefix("/"), "");
        assert_eq!(folder_prefix("src"), "src/");
        assert_eq!(folder_prefix("/src/"), "src/");
        assert_eq!(folder_prefix("a/b"), "a/b/");
    }

    #[test]
    fn test_join_path() {
        assert_eq!(join_path(&["out/", "vintage", "a.jpg"]), "out/vintage/a.jpg");
        assert_eq!(join_path(&["", "original", "a.jpg"]), "original/a.jpg");
        assert_eq!(join_path(&["/out/", "/x/"]), "out/x");
    }

    #[test]
    fn test_file_name_and_parent() {
        assert_eq!(file_name("src/nested/a.jpg"), "a.jpg");
        assert_eq!(file_name("a.jpg"), "a.jpg");
        assert_eq!(parent_folder("out/vintage/a.jpg"), "out/vintage");
        assert_eq!(parent_folder("a.jpg"), "");
    }

    #[test]
    fn test_extension() {
        assert_eq!(extension("a.JPG"), Some("jpg".to_string()));
        assert_eq!(extension("dir.v2/file"), None);
        assert_eq!(extension(".hidden"), None);
        assert_eq!(extension("trailing."), None);
    }

    #[test]
    fn test_guess_mime_type() {
        assert_eq!(guess_mime_type("x/a.jpeg"), "image/jpeg");
        assert_eq!(guess_mime_type("a.PNG"), "image/png");
        assert_eq!(guess_mime_type("a.bin"), "application/octet-stream");
    }
}
