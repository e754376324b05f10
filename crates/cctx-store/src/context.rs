//! The context store: named settings profiles of one scope.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use cctx_merge::deep_merge;
use cctx_types::document::{parse_object, to_pretty_bytes};
use cctx_types::{validate_context_name, ActiveState, Document};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::error::{ContextError, Result};
use crate::history::HistoryLog;
use crate::scope::{Scope, ScopePaths};
use crate::state::StateStore;
use crate::storage::{FsStorage, Storage};

const DOCUMENT_EXT: &str = ".json";

/// What a successful switch did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SwitchOutcome {
    /// The context that is now active.
    pub current: String,
    /// The context recorded as previous after the switch.
    pub previous: Option<String>,
    /// `false` if `current` was already active.
    pub changed: bool,
}

/// Owns the context documents, the active document, the state file, and the
/// merge histories of one scope.
#[derive(Clone, Debug)]
pub struct ContextStore {
    storage: Arc<dyn Storage>,
    paths: ScopePaths,
    state: StateStore,
    history: HistoryLog,
    user_settings: Option<PathBuf>,
}

impl ContextStore {
    /// Create a store over `storage` at `paths`.
    pub fn new(storage: Arc<dyn Storage>, paths: ScopePaths) -> Self {
        let state = StateStore::new(storage.clone(), paths.state_file.clone());
        let history = HistoryLog::new(storage.clone(), paths.contexts_dir.clone());
        Self {
            storage,
            paths,
            state,
            history,
            user_settings: None,
        }
    }

    /// Create a store on the local filesystem.
    pub fn open(paths: ScopePaths) -> Self {
        Self::new(Arc::new(FsStorage::new()), paths)
    }

    /// Set the document the `user` merge source refers to.
    pub fn with_user_settings(mut self, path: impl Into<PathBuf>) -> Self {
        self.user_settings = Some(path.into());
        self
    }

    pub fn scope(&self) -> Scope {
        self.paths.scope
    }

    pub fn paths(&self) -> &ScopePaths {
        &self.paths
    }

    pub fn history_log(&self) -> &HistoryLog {
        &self.history
    }

    pub(crate) fn storage(&self) -> &dyn Storage {
        self.storage.as_ref()
    }

    pub(crate) fn user_settings(&self) -> Option<&Path> {
        self.user_settings.as_deref()
    }

    /// `<contexts_dir>/<name>.json`
    pub fn context_path(&self, name: &str) -> PathBuf {
        self.paths.contexts_dir.join(format!("{name}{DOCUMENT_EXT}"))
    }

    // ---- Queries ----

    /// Names of all contexts, sorted. An unreadable or absent contexts
    /// directory has no contexts.
    pub fn list(&self) -> Vec<String> {
        let entries = match self.storage.list(&self.paths.contexts_dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(error = %e, "cannot list contexts directory");
                return Vec::new();
            }
        };
        let mut names: Vec<String> = entries
            .iter()
            .filter_map(|file| file.strip_suffix(DOCUMENT_EXT))
            .filter(|name| validate_context_name(name).is_ok())
            .map(str::to_string)
            .collect();
        names.sort();
        names
    }

    /// Returns `true` if a context called `name` exists.
    pub fn exists(&self, name: &str) -> Result<bool> {
        if validate_context_name(name).is_err() {
            return Ok(false);
        }
        Ok(self.storage.exists(&self.context_path(name))?)
    }

    pub fn state(&self) -> Result<ActiveState> {
        self.state.load()
    }

    /// The active context, if any.
    pub fn current(&self) -> Result<Option<String>> {
        Ok(self.state.load()?.current)
    }

    /// The context that was active before the current one, if any.
    pub fn previous(&self) -> Result<Option<String>> {
        Ok(self.state.load()?.previous)
    }

    /// The parsed document of `name`.
    pub fn show(&self, name: &str) -> Result<Value> {
        let bytes = self.read_context(name)?;
        let object = parse_object(&bytes).map_err(|e| ContextError::invalid_document(name, e))?;
        Ok(Value::Object(object))
    }

    /// The raw bytes of `name`.
    pub fn export(&self, name: &str) -> Result<Vec<u8>> {
        self.read_context(name)
    }

    /// Check that `name` still holds a well-formed settings document.
    pub fn validate(&self, name: &str) -> Result<()> {
        let bytes = self.read_context(name)?;
        parse_object(&bytes).map_err(|e| ContextError::invalid_document(name, e))?;
        Ok(())
    }

    // ---- Mutations ----

    /// Create `name` from the active document, or as `{}` if there is none.
    pub fn create(&self, name: &str) -> Result<()> {
        validate_context_name(name)?;
        if self.exists(name)? {
            return Err(ContextError::AlreadyExists(name.to_string()));
        }

        let bytes = match self.storage.read(&self.paths.active_document)? {
            Some(bytes) => {
                parse_object(&bytes).map_err(|e| {
                    ContextError::invalid_document(self.paths.active_document.display().to_string(), e)
                })?;
                bytes
            }
            None => b"{}\n".to_vec(),
        };
        self.storage.write(&self.context_path(name), &bytes)?;
        info!(context = name, scope = %self.scope(), "context created");
        Ok(())
    }

    /// Make `name` the active context by copying its document over the
    /// active document.
    pub fn switch(&self, name: &str) -> Result<SwitchOutcome> {
        let bytes = self.read_context(name)?;
        self.storage.write(&self.paths.active_document, &bytes)?;

        let (changed, state) = self.state.update(|s| {
            let changed = s.switch_to(name);
            (changed, s.clone())
        })?;
        info!(context = name, changed, "switched context");
        Ok(SwitchOutcome {
            current: name.to_string(),
            previous: state.previous,
            changed,
        })
    }

    /// Switch back to the previous context.
    pub fn switch_to_previous(&self) -> Result<SwitchOutcome> {
        let previous = self.previous()?.ok_or(ContextError::NoPrevious)?;
        self.switch(&previous)
    }

    /// Delete `name` and its merge history. The active context cannot be
    /// deleted.
    pub fn delete(&self, name: &str) -> Result<()> {
        if !self.exists(name)? {
            return Err(ContextError::NotFound(name.to_string()));
        }
        if self.state.load()?.is_current(name) {
            return Err(ContextError::DeleteCurrent(name.to_string()));
        }

        self.storage.remove(&self.context_path(name))?;
        self.history.remove(name)?;
        self.state.update(|s| s.forget_previous(name))?;
        info!(context = name, "context deleted");
        Ok(())
    }

    /// Rename `old` to `new`, carrying its history and state pointers.
    pub fn rename(&self, old: &str, new: &str) -> Result<()> {
        if !self.exists(old)? {
            return Err(ContextError::NotFound(old.to_string()));
        }
        validate_context_name(new)?;
        if self.exists(new)? {
            return Err(ContextError::AlreadyExists(new.to_string()));
        }

        self.storage
            .rename(&self.context_path(old), &self.context_path(new))?;
        self.history.rename(old, new)?;
        self.state.update(|s| s.rename(old, new))?;
        info!(old, new, "context renamed");
        Ok(())
    }

    /// Create `name` from JSON text.
    pub fn import_from_text(&self, name: &str, text: &[u8]) -> Result<()> {
        self.import_with_prototype(name, text, None)
    }

    /// Create `name` from JSON text deep-merged over `prototype`.
    pub fn import_with_prototype(
        &self,
        name: &str,
        text: &[u8],
        prototype: Option<&Map<String, Value>>,
    ) -> Result<()> {
        let imported = parse_object(text).map_err(|e| ContextError::invalid_document("import", e))?;
        let object = match prototype {
            Some(base) => deep_merge(base, &imported),
            None => imported,
        };

        validate_context_name(name)?;
        if self.exists(name)? {
            return Err(ContextError::AlreadyExists(name.to_string()));
        }

        let bytes = to_pretty_bytes(&Value::Object(object))
            .map_err(|e| ContextError::invalid_document("import", e))?;
        self.storage.write(&self.context_path(name), &bytes)?;
        info!(context = name, prototype = prototype.is_some(), "context imported");
        Ok(())
    }

    /// Remove the active document and deactivate the current context.
    /// Returns the context that was active.
    pub fn unset(&self) -> Result<Option<String>> {
        if self.storage.remove(&self.paths.active_document)? {
            debug!(path = %self.paths.active_document.display(), "active document removed");
        }
        let old = self.state.update(|s| {
            let old = s.current.clone();
            s.unset();
            old
        })?;
        info!(previous = old.as_deref().unwrap_or("-"), "context unset");
        Ok(old)
    }

    // ---- Helpers ----

    fn read_context(&self, name: &str) -> Result<Vec<u8>> {
        if validate_context_name(name).is_err() {
            return Err(ContextError::NotFound(name.to_string()));
        }
        self.storage
            .read(&self.context_path(name))?
            .ok_or_else(|| ContextError::NotFound(name.to_string()))
    }

    /// Read and parse a document the caller has already located.
    pub(crate) fn load_document(&self, path: &Path, subject: &str) -> Result<Option<Document>> {
        let Some(bytes) = self.storage.read(path)? else {
            return Ok(None);
        };
        Document::from_slice(&bytes)
            .map(Some)
            .map_err(|e| ContextError::invalid_document(subject, e))
    }
}
