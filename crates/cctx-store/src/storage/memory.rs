//! In-memory storage for tests and ephemeral use.
//!
//! [`InMemoryStorage`] keeps every file in a `BTreeMap` behind a `RwLock`.
//! Directories are implicit: a directory exists as long as some file lives
//! under it.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use super::{Storage, StorageError, StorageResult};

/// An in-memory implementation of [`Storage`].
#[derive(Debug, Default)]
pub struct InMemoryStorage {
    files: RwLock<BTreeMap<PathBuf, Vec<u8>>>,
}

impl InMemoryStorage {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of files held.
    pub fn len(&self) -> StorageResult<usize> {
        Ok(self.files.read().map_err(poisoned)?.len())
    }

    /// Returns `true` if no files are held.
    pub fn is_empty(&self) -> StorageResult<bool> {
        Ok(self.len()? == 0)
    }
}

fn poisoned<E: std::fmt::Display>(e: E) -> StorageError {
    StorageError::LockPoisoned(e.to_string())
}

impl Storage for InMemoryStorage {
    fn read(&self, path: &Path) -> StorageResult<Option<Vec<u8>>> {
        let files = self.files.read().map_err(poisoned)?;
        Ok(files.get(path).cloned())
    }

    fn write(&self, path: &Path, data: &[u8]) -> StorageResult<()> {
        let mut files = self.files.write().map_err(poisoned)?;
        files.insert(path.to_path_buf(), data.to_vec());
        Ok(())
    }

    fn remove(&self, path: &Path) -> StorageResult<bool> {
        let mut files = self.files.write().map_err(poisoned)?;
        Ok(files.remove(path).is_some())
    }

    fn rename(&self, from: &Path, to: &Path) -> StorageResult<()> {
        let mut files = self.files.write().map_err(poisoned)?;
        let data = files.remove(from).ok_or_else(|| {
            StorageError::io(
                "rename",
                from,
                std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
            )
        })?;
        files.insert(to.to_path_buf(), data);
        Ok(())
    }

    fn list(&self, dir: &Path) -> StorageResult<Vec<String>> {
        let files = self.files.read().map_err(poisoned)?;
        Ok(files
            .keys()
            .filter(|path| path.parent() == Some(dir))
            .filter_map(|path| path.file_name()?.to_str().map(str::to_string))
            .collect())
    }
}
