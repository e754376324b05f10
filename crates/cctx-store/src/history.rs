//! Per-context merge history files.
//!
//! The history of context `<name>` lives next to it as
//! `<contexts_dir>/.<name>-merge-history.json`, a JSON array of
//! [`MergeHistoryEntry`] values in the order the merges happened.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use cctx_types::document::to_pretty_bytes;
use cctx_types::{DocumentError, MergeHistoryEntry};
use tracing::{debug, warn};

use crate::error::{ContextError, Result};
use crate::storage::Storage;

/// Reads and rewrites merge history files for one scope.
#[derive(Clone, Debug)]
pub struct HistoryLog {
    storage: Arc<dyn Storage>,
    contexts_dir: PathBuf,
}

impl HistoryLog {
    pub fn new(storage: Arc<dyn Storage>, contexts_dir: impl Into<PathBuf>) -> Self {
        Self {
            storage,
            contexts_dir: contexts_dir.into(),
        }
    }

    /// Path of the history file for `context`.
    pub fn history_path(&self, context: &str) -> PathBuf {
        history_path(&self.contexts_dir, context)
    }

    /// Load the history of `context`.
    ///
    /// A missing or unparsable file is an empty history. Only a failure to
    /// read the file at all is an error.
    pub fn load(&self, context: &str) -> Result<Vec<MergeHistoryEntry>> {
        let path = self.history_path(context);
        let Some(bytes) = self.storage.read(&path)? else {
            return Ok(Vec::new());
        };
        match serde_json::from_slice(&bytes) {
            Ok(entries) => Ok(entries),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ignoring unparsable merge history");
                Ok(Vec::new())
            }
        }
    }

    /// Replace the whole history of `context`.
    pub fn save(&self, context: &str, entries: &[MergeHistoryEntry]) -> Result<()> {
        let path = self.history_path(context);
        let bytes = serde_json::to_value(entries)
            .map_err(DocumentError::from)
            .and_then(|value| to_pretty_bytes(&value))
            .map_err(|e| ContextError::invalid_document(path.display().to_string(), e))?;
        self.storage.write(&path, &bytes)?;
        debug!(context, entries = entries.len(), "merge history saved");
        Ok(())
    }

    /// Append one entry to the history of `context`.
    pub fn append(&self, context: &str, entry: MergeHistoryEntry) -> Result<Vec<MergeHistoryEntry>> {
        let mut entries = self.load(context)?;
        entries.push(entry);
        self.save(context, &entries)?;
        Ok(entries)
    }

    /// Move the history of `old` to `new`, if there is one.
    pub fn rename(&self, old: &str, new: &str) -> Result<bool> {
        let from = self.history_path(old);
        if !self.storage.exists(&from)? {
            return Ok(false);
        }
        self.storage.rename(&from, &self.history_path(new))?;
        debug!(old, new, "merge history moved");
        Ok(true)
    }

    /// Delete the history of `context`, if there is one.
    pub fn remove(&self, context: &str) -> Result<bool> {
        let removed = self.storage.remove(&self.history_path(context))?;
        if removed {
            debug!(context, "merge history removed");
        }
        Ok(removed)
    }
}

/// `<contexts_dir>/.<context>-merge-history.json`
pub fn history_path(contexts_dir: &Path, context: &str) -> PathBuf {
    contexts_dir.join(format!(".{context}-merge-history.json"))
}

/// Render a history for people.
pub fn format_history(context: &str, entries: &[MergeHistoryEntry]) -> String {
    if entries.is_empty() {
        return format!("No merge history for {context}");
    }

    let mut out = format!("Merge history for {context}:\n");
    for (i, entry) in entries.iter().enumerate() {
        let when = entry
            .recorded_at()
            .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
            .unwrap_or_else(|| entry.timestamp.clone());
        let _ = writeln!(
            out,
            "\n{}. {} from {} ({} item{})",
            i + 1,
            when,
            entry.source,
            entry.merged_items.len(),
            if entry.merged_items.len() == 1 { "" } else { "s" }
        );
        for item in &entry.merged_items {
            let _ = writeln!(out, "   - {item}");
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{FsStorage, InMemoryStorage};
    use cctx_types::ItemKey;

    fn entry(source: &str, items: &[&str]) -> MergeHistoryEntry {
        MergeHistoryEntry {
            source: source.into(),
            merged_items: items.iter().map(|s| ItemKey::from(*s)).collect(),
            timestamp: "2026-03-01T12:00:00.000Z".into(),
            created_permissions: false,
        }
    }

    fn log() -> (Arc<InMemoryStorage>, HistoryLog) {
        let storage = Arc::new(InMemoryStorage::new());
        let log = HistoryLog::new(storage.clone(), "/ctx");
        (storage, log)
    }

    #[test]
    fn path_is_hidden_sibling() {
        let (_, log) = log();
        assert_eq!(
            log.history_path("work"),
            PathBuf::from("/ctx/.work-merge-history.json")
        );
    }

    #[test]
    fn missing_and_garbage_load_empty() {
        let (storage, log) = log();
        assert!(log.load("work").unwrap().is_empty());
        storage.write(&log.history_path("work"), b"{oops").unwrap();
        assert!(log.load("work").unwrap().is_empty());
    }

    #[test]
    fn append_keeps_order() {
        let (_, log) = log();
        log.append("work", entry("a", &["permissions.allow:x"])).unwrap();
        let all = log.append("work", entry("b", &["env:K"])).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(log.load("work").unwrap(), all);
        assert_eq!(all[1].source, "b");
    }

    #[test]
    fn load_then_save_is_byte_stable() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Arc::new(FsStorage::new());
        let log = HistoryLog::new(storage.clone(), dir.path());
        let raw = "[\n  {\n    \"source\": \"user\",\n    \"mergedItems\": [\n      \"permissions.deny:Read(.env)\"\n    ],\n    \"timestamp\": \"2025-06-01T10:00:00+02:00\"\n  }\n]\n";
        storage.write(&log.history_path("w"), raw.as_bytes()).unwrap();

        let entries = log.load("w").unwrap();
        log.save("w", &entries).unwrap();

        let after = storage.read(&log.history_path("w")).unwrap().unwrap();
        assert_eq!(String::from_utf8(after).unwrap(), raw);
    }

    #[test]
    fn rename_and_remove() {
        let (storage, log) = log();
        assert!(!log.rename("a", "b").unwrap());
        log.append("a", entry("s", &[])).unwrap();

        assert!(log.rename("a", "b").unwrap());
        assert!(!storage.exists(&log.history_path("a")).unwrap());
        assert_eq!(log.load("b").unwrap().len(), 1);

        assert!(log.remove("b").unwrap());
        assert!(!log.remove("b").unwrap());
    }

    #[test]
    fn format_empty_and_populated() {
        assert_eq!(format_history("work", &[]), "No merge history for work");

        let text = format_history(
            "work",
            &[entry("base", &["permissions.allow:Bash(ls)", "env:TOKEN"])],
        );
        assert!(text.starts_with("Merge history for work:"));
        assert!(text.contains("1. 2026-03-01 12:00:00 UTC from base (2 items)"));
        assert!(text.contains("   - permissions.allow:Bash(ls)"));
        assert!(text.contains("   - env:TOKEN"));
    }
}
