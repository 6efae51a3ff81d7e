//! File store implementations
//!
//! - [`LocalFileStore`]: files under a root directory on local disk
//! - [`InMemoryFileStore`]: map-backed store for tests

use crate::core::error::{EstateResult, StorageError};
use crate::core::files::FileStore;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, RwLock};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

/// Normalize a caller-supplied path to a relative, `/`-separated path.
///
/// A leading `/` is dropped (`/uploads/a.jpg` becomes `uploads/a.jpg`).
/// Parent references, absolute prefixes and empty paths are rejected.
pub fn normalize_path(path: &str) -> EstateResult<String> {
    let trimmed = path.trim().trim_start_matches('/');
    let mut parts = Vec::new();
    for component in Path::new(trimmed).components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy().to_string()),
            Component::CurDir => {}
            _ => {
                return Err(StorageError::File {
                    path: path.to_string(),
                    message: "path escapes the file store root".to_string(),
                }
                .into());
            }
        }
    }
    if parts.is_empty() {
        return Err(StorageError::File {
            path: path.to_string(),
            message: "empty path".to_string(),
        }
        .into());
    }
    Ok(parts.join("/"))
}

/// `dir/stem_suffix.ext` alternative for a taken name
fn with_suffix(path: &str) -> String {
    let suffix = &Uuid::new_v4().simple().to_string()[..8];
    let p = Path::new(path);
    let stem = p.file_stem().and_then(|s| s.to_str()).unwrap_or("file");
    let name = match p.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{}_{}.{}", stem, suffix, ext),
        None => format!("{}_{}", stem, suffix),
    };
    match p.parent().and_then(|d| d.to_str()).filter(|d| !d.is_empty()) {
        Some(dir) => format!("{}/{}", dir, name),
        None => name,
    }
}

fn file_error(path: &str, e: impl ToString) -> StorageError {
    StorageError::File {
        path: path.to_string(),
        message: e.to_string(),
    }
}

// ---------------------------------------------------------------------------
// LocalFileStore
// ---------------------------------------------------------------------------

/// Files stored below a root directory (e.g. `public/`)
#[derive(Clone, Debug)]
pub struct LocalFileStore {
    root: PathBuf,
}

impl LocalFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the root and the given subdirectories
    pub async fn initialize(&self, subdirs: &[&str]) -> EstateResult<()> {
        for dir in subdirs {
            let dir_path = self.root.join(dir);
            fs::create_dir_all(&dir_path)
                .await
                .map_err(|e| file_error(&dir_path.to_string_lossy(), e))?;
            tracing::info!("Ensured directory exists: {}", dir_path.display());
        }
        Ok(())
    }

    fn resolve(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }
}

#[async_trait]
impl FileStore for LocalFileStore {
    async fn save(&self, bytes: &[u8], suggested_name: &str) -> EstateResult<String> {
        let mut relative = normalize_path(suggested_name)?;
        let target = self.resolve(&relative);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| file_error(&relative, e))?;
        }

        // one retry with a random suffix if the name is taken
        let mut file = match fs::OpenOptions::new().write(true).create_new(true).open(&target).await {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                relative = with_suffix(&relative);
                fs::OpenOptions::new()
                    .write(true)
                    .create_new(true)
                    .open(self.resolve(&relative))
                    .await
                    .map_err(|e| file_error(&relative, e))?
            }
            Err(e) => return Err(file_error(&relative, e).into()),
        };

        file.write_all(bytes).await.map_err(|e| file_error(&relative, e))?;
        file.flush().await.map_err(|e| file_error(&relative, e))?;

        tracing::debug!(path = %relative, bytes = bytes.len(), "saved file");
        Ok(relative)
    }

    async fn read(&self, path: &str) -> EstateResult<Vec<u8>> {
        let relative = normalize_path(path)?;
        fs::read(self.resolve(&relative))
            .await
            .map_err(|e| file_error(&relative, e).into())
    }

    async fn delete(&self, path: &str) -> EstateResult<bool> {
        let relative = normalize_path(path)?;
        match fs::remove_file(self.resolve(&relative)).await {
            Ok(()) => {
                tracing::info!("Deleted file: {}", relative);
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(file_error(&relative, e).into()),
        }
    }
}

// ---------------------------------------------------------------------------
// InMemoryFileStore
// ---------------------------------------------------------------------------

/// Map-backed file store. Cloning shares the contents.
#[derive(Clone, Default)]
pub struct InMemoryFileStore {
    files: Arc<RwLock<HashMap<String, Vec<u8>>>>,
}

impl InMemoryFileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a file exists at `path`
    pub fn contains(&self, path: &str) -> bool {
        let Ok(relative) = normalize_path(path) else {
            return false;
        };
        self.files
            .read()
            .map(|files| files.contains_key(&relative))
            .unwrap_or(false)
    }

    /// Stored paths, sorted
    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self
            .files
            .read()
            .map(|files| files.keys().cloned().collect())
            .unwrap_or_default();
        paths.sort();
        paths
    }
}

#[async_trait]
impl FileStore for InMemoryFileStore {
    async fn save(&self, bytes: &[u8], suggested_name: &str) -> EstateResult<String> {
        let mut relative = normalize_path(suggested_name)?;
        let mut files = self
            .files
            .write()
            .map_err(|e| file_error(&relative, format!("Failed to acquire write lock: {}", e)))?;
        while files.contains_key(&relative) {
            relative = with_suffix(&relative);
        }
        files.insert(relative.clone(), bytes.to_vec());
        Ok(relative)
    }

    async fn read(&self, path: &str) -> EstateResult<Vec<u8>> {
        let relative = normalize_path(path)?;
        let files = self
            .files
            .read()
            .map_err(|e| file_error(&relative, format!("Failed to acquire read lock: {}", e)))?;
        files
            .get(&relative)
            .cloned()
            .ok_or_else(|| file_error(&relative, "file not found").into())
    }

    async fn delete(&self, path: &str) -> EstateResult<bool> {
        let relative = normalize_path(path)?;
        let mut files = self
            .files
            .write()
            .map_err(|e| file_error(&relative, format!("Failed to acquire write lock: {}", e)))?;
        Ok(files.remove(&relative).is_some())
    }
}
