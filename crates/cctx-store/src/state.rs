//! Persistence for the per-scope [`ActiveState`].

use std::path::{Path, PathBuf};
use std::sync::Arc;

use cctx_types::document::to_pretty_bytes;
use cctx_types::ActiveState;
use tracing::debug;

use crate::error::{ContextError, Result};
use crate::storage::Storage;

/// Reads and writes the state file of one scope.
#[derive(Clone, Debug)]
pub struct StateStore {
    storage: Arc<dyn Storage>,
    path: PathBuf,
}

impl StateStore {
    pub fn new(storage: Arc<dyn Storage>, path: impl Into<PathBuf>) -> Self {
        Self {
            storage,
            path: path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the state. A missing file is the unset state.
    pub fn load(&self) -> Result<ActiveState> {
        let Some(bytes) = self.storage.read(&self.path)? else {
            return Ok(ActiveState::default());
        };
        serde_json::from_slice(&bytes).map_err(|source| ContextError::CorruptState {
            path: self.path.clone(),
            source,
        })
    }

    /// Overwrite the state file.
    pub fn save(&self, state: &ActiveState) -> Result<()> {
        let value = serde_json::to_value(state).map_err(|source| ContextError::CorruptState {
            path: self.path.clone(),
            source,
        })?;
        let bytes = to_pretty_bytes(&value)
            .map_err(|e| ContextError::invalid_document(self.path.display().to_string(), e))?;
        self.storage.write(&self.path, &bytes)?;
        debug!(
            current = state.current.as_deref().unwrap_or("-"),
            previous = state.previous.as_deref().unwrap_or("-"),
            "state saved"
        );
        Ok(())
    }

    /// Load, apply `f`, and save if the state changed.
    pub fn update<R>(&self, f: impl FnOnce(&mut ActiveState) -> R) -> Result<R> {
        let before = self.load()?;
        let mut after = before.clone();
        let out = f(&mut after);
        if after != before {
            self.save(&after)?;
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryStorage;

    fn store() -> (Arc<InMemoryStorage>, StateStore) {
        let storage = Arc::new(InMemoryStorage::new());
        let state = StateStore::new(storage.clone(), "/ctx/.cctx-state.json");
        (storage, state)
    }

    #[test]
    fn missing_file_is_unset() {
        let (_, state) = store();
        assert!(state.load().unwrap().is_unset());
    }

    #[test]
    fn save_then_load() {
        let (storage, state) = store();
        let value = ActiveState {
            current: Some("work".into()),
            previous: Some("home".into()),
        };
        state.save(&value).unwrap();
        assert_eq!(state.load().unwrap(), value);

        let raw = storage.read(state.path()).unwrap().unwrap();
        assert_eq!(
            String::from_utf8(raw).unwrap(),
            "{\n  \"current\": \"work\",\n  \"previous\": \"home\"\n}\n"
        );
    }

    #[test]
    fn corrupt_file_is_reported() {
        let (storage, state) = store();
        storage.write(state.path(), b"not json").unwrap();
        let err = state.load().unwrap_err();
        assert!(matches!(err, ContextError::CorruptState { .. }));
    }

    #[test]
    fn update_skips_write_when_unchanged() {
        let (storage, state) = store();
        let changed = state.update(|s| s.forget_previous("x")).unwrap();
        assert!(!changed);
        assert!(storage.is_empty().unwrap());

        state.update(|s| s.switch_to("a")).unwrap();
        assert_eq!(state.load().unwrap().current.as_deref(), Some("a"));
    }
}
