//! The [`Storage`] trait and its backends.
//!
//! Every piece of persisted state (context documents, the active document,
//! the state file, history files) goes through one `Storage`, addressed by
//! path. The filesystem backend is used in production; the in-memory backend
//! stands in for it in tests.

pub mod fs;
pub mod memory;

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub use fs::FsStorage;
pub use memory::InMemoryStorage;

/// Errors from a storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An underlying I/O call failed.
    #[error("failed to {op} {}: {source}", path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        source: io::Error,
    },

    /// An in-memory backend's lock was poisoned by a panicking writer.
    #[error("storage lock poisoned: {0}")]
    LockPoisoned(String),
}

impl StorageError {
    pub(crate) fn io(op: &'static str, path: &Path, source: io::Error) -> Self {
        StorageError::Io {
            op,
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Path-addressed byte storage.
///
/// Implementations must replace file contents wholesale: a reader sees
/// either the old bytes or the new bytes of a `write`, never a mix.
pub trait Storage: Send + Sync + std::fmt::Debug {
    /// Read a file. Returns `Ok(None)` if it does not exist.
    fn read(&self, path: &Path) -> StorageResult<Option<Vec<u8>>>;

    /// Create or replace a file, creating parent directories as needed.
    fn write(&self, path: &Path, data: &[u8]) -> StorageResult<()>;

    /// Delete a file. Returns `Ok(true)` if it existed.
    fn remove(&self, path: &Path) -> StorageResult<bool>;

    /// Move a file. The destination is replaced if it exists.
    fn rename(&self, from: &Path, to: &Path) -> StorageResult<()>;

    /// Names of the regular files directly inside `dir`, in no particular
    /// order. An absent directory has no files.
    fn list(&self, dir: &Path) -> StorageResult<Vec<String>>;

    /// Check whether a file exists.
    fn exists(&self, path: &Path) -> StorageResult<bool> {
        Ok(self.read(path)?.is_some())
    }
}
