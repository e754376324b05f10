//! Filesystem storage with write-to-temp-then-rename.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::debug;

use super::{Storage, StorageError, StorageResult};

/// Storage backed by the local filesystem.
///
/// Writes go to a temporary file in the destination directory, are synced,
/// and are then renamed over the destination, so an interrupted write never
/// leaves a half-written document behind.
#[derive(Clone, Copy, Debug, Default)]
pub struct FsStorage;

impl FsStorage {
    pub fn new() -> Self {
        Self
    }
}

impl Storage for FsStorage {
    fn read(&self, path: &Path) -> StorageResult<Option<Vec<u8>>> {
        match fs::read(path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::io("read", path, e)),
        }
    }

    fn write(&self, path: &Path, data: &[u8]) -> StorageResult<()> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir).map_err(|e| StorageError::io("create directory", dir, e))?;

        let mut tmp =
            NamedTempFile::new_in(dir).map_err(|e| StorageError::io("create temp file in", dir, e))?;
        tmp.write_all(data)
            .and_then(|()| tmp.as_file().sync_all())
            .map_err(|e| StorageError::io("write", tmp.path(), e))?;
        tmp.persist(path)
            .map_err(|e| StorageError::io("replace", path, e.error))?;

        debug!(path = %path.display(), len = data.len(), "file written");
        Ok(())
    }

    fn remove(&self, path: &Path) -> StorageResult<bool> {
        match fs::remove_file(path) {
            Ok(()) => {
                debug!(path = %path.display(), "file removed");
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StorageError::io("remove", path, e)),
        }
    }

    fn rename(&self, from: &Path, to: &Path) -> StorageResult<()> {
        if let Some(parent) = to.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| StorageError::io("create directory", parent, e))?;
        }
        fs::rename(from, to).map_err(|e| StorageError::io("rename", from, e))?;
        debug!(from = %from.display(), to = %to.display(), "file renamed");
        Ok(())
    }

    fn list(&self, dir: &Path) -> StorageResult<Vec<String>> {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StorageError::io("read directory", dir, e)),
        };

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StorageError::io("read directory", dir, e))?;
            if !entry.path().is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
        Ok(names)
    }
}
