pub mod config;
pub mod storage;

pub use storage::{FileStore, FilesystemFileStore, StorageError};
