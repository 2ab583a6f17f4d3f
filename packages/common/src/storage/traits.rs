use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::error::StorageError;

/// Path-addressed byte storage for submission files.
///
/// Callers compute canonical destination paths themselves; the store only
/// moves bytes around. All paths are absolute.
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Root directory holding all files of one press context.
    fn base_path(&self, context_id: i32) -> PathBuf;

    /// Copy `src` to `dest`, creating parent directories as needed.
    ///
    /// Returns the number of bytes copied. The destination becomes visible
    /// only once it is fully written.
    async fn copy(&self, src: &Path, dest: &Path) -> Result<u64, StorageError>;

    /// Move a file from `from` to `to`, creating parent directories as needed.
    async fn rename(&self, from: &Path, to: &Path) -> Result<(), StorageError>;

    /// Delete a file.
    ///
    /// Returns `true` if the file was deleted, `false` if it did not exist.
    async fn delete(&self, path: &Path) -> Result<bool, StorageError>;

    /// Check whether a file exists.
    async fn exists(&self, path: &Path) -> Result<bool, StorageError>;

    /// Read a file's full contents.
    async fn read(&self, path: &Path) -> Result<Vec<u8>, StorageError>;
}
