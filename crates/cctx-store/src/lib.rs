//! Context store for cctx.
//!
//! A [`ContextStore`] owns the named settings profiles of one [`Scope`]: the
//! `<name>.json` documents, the active document the tool reads, the state
//! file recording the current and previous context, and one merge history
//! per context. All file access goes through a [`Storage`] backend, so the
//! same store runs against the filesystem or against memory in tests.
//!
//! # Modules
//!
//! - [`storage`] -- the [`Storage`] trait with filesystem and in-memory backends
//! - [`scope`] -- [`Scope`] and [`ScopePaths`] resolution
//! - [`state`] -- [`StateStore`], persistence of the active/previous pointers
//! - [`history`] -- [`HistoryLog`], per-context merge history files
//! - [`context`] -- [`ContextStore`] profile operations
//! - [`merge_ops`] -- merge, unmerge, and history queries on a store
//! - [`error`] -- [`ContextError`]

pub mod context;
pub mod error;
pub mod history;
pub mod merge_ops;
pub mod scope;
pub mod state;
pub mod storage;

pub use context::{ContextStore, SwitchOutcome};
pub use error::{ContextError, Result};
pub use history::{format_history, HistoryLog};
pub use merge_ops::{MergeReport, MergeTarget, UnmergeReport, CURRENT_TARGET, USER_SOURCE};
pub use scope::{Scope, ScopePaths};
pub use state::StateStore;
pub use storage::{FsStorage, InMemoryStorage, Storage, StorageError};

pub use cctx_merge::MergeMode;
