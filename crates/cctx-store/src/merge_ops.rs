//! Merge and unmerge between the documents of a store.
//!
//! These operations load documents through the [`ContextStore`], hand them
//! to the merge engine, and persist both the rewritten target and its
//! history. The target is written first. If the history cannot be written
//! afterwards the target is restored and the operation fails with
//! [`ContextError::ProvenanceNotRecorded`].

use std::fmt;
use std::path::{Path, PathBuf};

use cctx_merge::MergeMode;
use cctx_types::{validate_context_name, Document, ItemKey, MergeHistoryEntry};
use tracing::{error, info};

use crate::context::ContextStore;
use crate::error::{ContextError, Result};

/// Keyword naming the active document as a merge target.
pub const CURRENT_TARGET: &str = "current";
/// Source label naming the user-scope settings document.
pub const USER_SOURCE: &str = "user";

/// The document a merge writes into.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum MergeTarget {
    /// The active document.
    #[default]
    Current,
    /// A named context.
    Context(String),
}

impl MergeTarget {
    pub fn parse(s: &str) -> Self {
        if s == CURRENT_TARGET {
            MergeTarget::Current
        } else {
            MergeTarget::Context(s.to_string())
        }
    }
}

impl fmt::Display for MergeTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MergeTarget::Current => f.write_str(CURRENT_TARGET),
            MergeTarget::Context(name) => f.write_str(name),
        }
    }
}

/// Outcome of [`ContextStore::merge_from`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MergeReport {
    /// Context name the history entry was recorded under.
    pub history_key: String,
    /// The recorded entry. Empty if the source added nothing.
    pub entry: MergeHistoryEntry,
}

/// Outcome of [`ContextStore::unmerge_from`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnmergeReport {
    pub history_key: String,
    /// Items removed from the target.
    pub reverted: Vec<ItemKey>,
    /// History entries dropped because they named the source.
    pub dropped_entries: usize,
    /// The history as it is now.
    pub remaining: Vec<MergeHistoryEntry>,
}

struct ResolvedTarget {
    path: PathBuf,
    history_key: String,
    original: Vec<u8>,
    document: Document,
}

impl ContextStore {
    /// Merge `source` into `target` and record what it introduced.
    ///
    /// `source` is `user`, a path ending in `.json`, or a context name. It
    /// is recorded in the history exactly as given.
    pub fn merge_from(&self, target: &MergeTarget, source: &str, mode: MergeMode) -> Result<MergeReport> {
        let mut resolved = self.resolve_target(target)?;
        let source_doc = self.resolve_source(source)?;

        let entry = mode.merge(&mut resolved.document, &source_doc, source);
        let written = !entry.is_empty();
        if written {
            self.write_target(&resolved)?;
        }

        let appended = self.history_log().append(&resolved.history_key, entry.clone());
        if let Err(e) = appended {
            return Err(self.roll_back(&resolved, written, e));
        }

        info!(
            target = %target,
            source,
            items = entry.merged_items.len(),
            full = matches!(mode, MergeMode::Full),
            "merged"
        );
        Ok(MergeReport {
            history_key: resolved.history_key,
            entry,
        })
    }

    /// Remove from `target` every item recorded as merged from `source`.
    pub fn unmerge_from(
        &self,
        target: &MergeTarget,
        source: &str,
        mode: MergeMode,
    ) -> Result<UnmergeReport> {
        let mut resolved = self.resolve_target(target)?;
        let history = self.history_log().load(&resolved.history_key)?;

        let out = mode.unmerge(&mut resolved.document, history, source);
        let written = !out.reverted.is_empty();
        if written {
            self.write_target(&resolved)?;
        }

        if out.dropped_entries > 0 {
            let saved = self
                .history_log()
                .save(&resolved.history_key, &out.remaining);
            if let Err(e) = saved {
                return Err(self.roll_back(&resolved, written, e));
            }
        }

        info!(
            target = %target,
            source,
            reverted = out.reverted.len(),
            dropped = out.dropped_entries,
            "unmerged"
        );
        Ok(UnmergeReport {
            history_key: resolved.history_key,
            reverted: out.reverted,
            dropped_entries: out.dropped_entries,
            remaining: out.remaining,
        })
    }

    /// Merge history of `name`, or of the current context.
    /// Returns the context name together with its entries. An invalid name
    /// is `NotFound`.
    pub fn history(&self, name: Option<&str>) -> Result<(String, Vec<MergeHistoryEntry>)> {
        let name = match name {
            Some(name) if validate_context_name(name).is_err() => {
                return Err(ContextError::NotFound(name.to_string()));
            }
            Some(name) => name.to_string(),
            None => self
                .current()?
                .ok_or_else(|| ContextError::MissingDocument("no current context is set".into()))?,
        };
        let entries = self.history_log().load(&name)?;
        Ok((name, entries))
    }

    fn resolve_target(&self, target: &MergeTarget) -> Result<ResolvedTarget> {
        let (path, history_key) = match target {
            MergeTarget::Current => {
                let key = self
                    .current()?
                    .unwrap_or_else(|| CURRENT_TARGET.to_string());
                (self.paths().active_document.clone(), key)
            }
            MergeTarget::Context(name) => {
                if !self.exists(name)? {
                    return Err(ContextError::NotFound(name.clone()));
                }
                (self.context_path(name), name.clone())
            }
        };

        let original = self.storage().read(&path)?.ok_or_else(|| match target {
            MergeTarget::Current => ContextError::MissingDocument("no current context is set".into()),
            MergeTarget::Context(name) => ContextError::NotFound(name.clone()),
        })?;
        let document = Document::from_slice(&original)
            .map_err(|e| ContextError::invalid_document(target.to_string(), e))?;

        Ok(ResolvedTarget {
            path,
            history_key,
            original,
            document,
        })
    }

    fn resolve_source(&self, source: &str) -> Result<Document> {
        if source == USER_SOURCE {
            let path = self
                .user_settings()
                .ok_or_else(|| ContextError::MissingDocument("user settings location is unknown".into()))?
                .to_path_buf();
            return self.load_document(&path, source)?.ok_or_else(|| {
                ContextError::MissingDocument(format!(
                    "user settings file not found at {}",
                    path.display()
                ))
            });
        }

        if source.ends_with(".json") {
            let path = Path::new(source);
            return self.load_document(path, source)?.ok_or_else(|| {
                ContextError::MissingDocument(format!("source file not found at {source}"))
            });
        }

        if !self.exists(source)? {
            return Err(ContextError::NotFound(source.to_string()));
        }
        self.load_document(&self.context_path(source), source)?
            .ok_or_else(|| ContextError::NotFound(source.to_string()))
    }

    fn write_target(&self, resolved: &ResolvedTarget) -> Result<()> {
        let bytes = resolved
            .document
            .to_pretty_bytes()
            .map_err(|e| ContextError::invalid_document(resolved.history_key.clone(), e))?;
        self.storage().write(&resolved.path, &bytes)?;
        Ok(())
    }

    fn roll_back(&self, resolved: &ResolvedTarget, written: bool, cause: ContextError) -> ContextError {
        let rollback = if !written {
            "the document was not changed".to_string()
        } else {
            match self.storage().write(&resolved.path, &resolved.original) {
                Ok(()) => "the document was restored".to_string(),
                Err(e) => format!("restoring the document also failed: {e}"),
            }
        };
        error!(
            context = %resolved.history_key,
            path = %resolved.path.display(),
            error = %cause,
            rollback = %rollback,
            "merge history not recorded"
        );
        ContextError::ProvenanceNotRecorded {
            context: resolved.history_key.clone(),
            source: Box::new(cause),
            rollback,
        }
    }
}
