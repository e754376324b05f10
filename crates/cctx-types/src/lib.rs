//! Foundation types for cctx.
//!
//! cctx keeps named settings profiles ("contexts") next to the single
//! settings document a tool reads, and can merge fragments of one profile
//! into another while remembering exactly what each merge introduced.
//!
//! # Modules
//!
//! - [`names`] -- context name validation
//! - [`document`] -- [`Document`], the typed view of a settings file
//! - [`history`] -- [`ItemKey`] and [`MergeHistoryEntry`] provenance records
//! - [`state`] -- [`ActiveState`] and its transitions
//! - [`error`] -- [`ErrorKind`], the error classes every crate maps onto

pub mod document;
pub mod error;
pub mod history;
pub mod names;
pub mod state;

pub use document::{Document, DocumentError, Permissions, ENV_KEY, PERMISSIONS_KEY};
pub use error::ErrorKind;
pub use history::{ItemKey, MergeHistoryEntry};
pub use names::{validate_context_name, NameError};
pub use state::ActiveState;
