use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::fs;

use super::error::StorageError;
use super::traits::FileStore;

/// Monotonic suffix for in-flight temp files.
static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Filesystem-backed file store.
///
/// Press contexts are laid out as `{root}/presses/{context_id}/...`; the
/// path below the context root is entirely the caller's concern.
pub struct FilesystemFileStore {
    root: PathBuf,
}

impl FilesystemFileStore {
    /// Create a new filesystem file store rooted at `root`.
    pub async fn new(root: PathBuf) -> Result<Self, StorageError> {
        fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    /// Temp path next to `dest` so the final rename stays on one filesystem.
    fn temp_path(dest: &Path) -> Result<PathBuf, StorageError> {
        let parent = dest
            .parent()
            .ok_or_else(|| StorageError::InvalidPath(format!("{} has no parent", dest.display())))?;
        let n = TMP_COUNTER.fetch_add(1, Ordering::Relaxed);
        Ok(parent.join(format!(".tmp-{}-{n}", std::process::id())))
    }
}

#[async_trait]
impl FileStore for FilesystemFileStore {
    fn base_path(&self, context_id: i32) -> PathBuf {
        self.root.join("presses").join(context_id.to_string())
    }

    async fn copy(&self, src: &Path, dest: &Path) -> Result<u64, StorageError> {
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).await?;
        }

        let temp_path = Self::temp_path(dest)?;
        let size = match fs::copy(src, &temp_path).await {
            Ok(size) => size,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let _ = fs::remove_file(&temp_path).await;
                return Err(StorageError::NotFound(src.display().to_string()));
            }
            Err(e) => {
                let _ = fs::remove_file(&temp_path).await;
                return Err(e.into());
            }
        };

        if let Err(e) = fs::rename(&temp_path, dest).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        Ok(size)
    }

    async fn rename(&self, from: &Path, to: &Path) -> Result<(), StorageError> {
        if let Some(parent) = to.parent() {
            fs::create_dir_all(parent).await?;
        }
        match fs::rename(from, to).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(from.display().to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, path: &Path) -> Result<bool, StorageError> {
        match fs::remove_file(path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, path: &Path) -> Result<bool, StorageError> {
        Ok(fs::try_exists(path).await?)
    }

    async fn read(&self, path: &Path) -> Result<Vec<u8>, StorageError> {
        match fs::read(path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(path.display().to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}
