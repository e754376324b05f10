//! Merge engine for cctx.
//!
//! Merges copy fragments of a source settings document into a target and
//! return a [`MergeHistoryEntry`](cctx_types::MergeHistoryEntry) naming every
//! item they introduced. Unmerges take that history back and remove exactly
//! the recorded items for one source label.
//!
//! Two modes exist:
//!
//! - **Permission** -- only `permissions.allow` / `permissions.deny` tokens.
//! - **Full** -- permission tokens, then `env` keys, then any other top-level
//!   field.
//!
//! Nothing in this crate performs I/O. Callers load the documents and
//! history, invoke the engine, and persist the results.

pub mod deep;
pub mod merge;
pub mod unmerge;

pub use deep::deep_merge;
pub use merge::{merge_full, merge_permissions};
pub use unmerge::{unmerge_full, unmerge_permissions, Unmerge};

/// Which parts of a document a merge or unmerge covers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MergeMode {
    /// Permission tokens only.
    #[default]
    Permissions,
    /// Permission tokens, `env` keys, and other top-level fields.
    Full,
}

impl MergeMode {
    /// Run the forward merge for this mode.
    pub fn merge(
        self,
        target: &mut cctx_types::Document,
        source: &cctx_types::Document,
        label: &str,
    ) -> cctx_types::MergeHistoryEntry {
        match self {
            MergeMode::Permissions => merge_permissions(target, source, label),
            MergeMode::Full => merge_full(target, source, label),
        }
    }

    /// Run the unmerge for this mode.
    pub fn unmerge(
        self,
        target: &mut cctx_types::Document,
        history: Vec<cctx_types::MergeHistoryEntry>,
        label: &str,
    ) -> Unmerge {
        match self {
            MergeMode::Permissions => unmerge_permissions(target, history, label),
            MergeMode::Full => unmerge_full(target, history, label),
        }
    }
}
