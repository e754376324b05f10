//! Error types for context store operations.

use std::path::PathBuf;

use cctx_types::{DocumentError, ErrorKind, NameError};
use thiserror::Error;

use crate::storage::StorageError;

/// Errors that can occur during context store operations.
///
/// Every message begins with the [`ErrorKind`] prefix returned by
/// [`ContextError::kind`].
#[derive(Debug, Error)]
pub enum ContextError {
    /// The context name is not acceptable.
    #[error("validation error: {0}")]
    InvalidName(#[from] NameError),

    /// A document (or imported text) is not a well-formed JSON object.
    #[error("validation error: {subject}: {source}")]
    InvalidDocument {
        subject: String,
        source: DocumentError,
    },

    /// The state file exists but cannot be decoded.
    #[error("validation error: state file {} is corrupt: {source}", path.display())]
    CorruptState {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// No context with this name exists in the scope.
    #[error("not found: no context exists with the name {0:?}")]
    NotFound(String),

    /// Some other required document (active document, merge source) is absent.
    #[error("not found: {0}")]
    MissingDocument(String),

    /// A context with this name already exists.
    #[error("conflict: a context named {0:?} already exists")]
    AlreadyExists(String),

    /// The active context cannot be deleted.
    #[error("forbidden: cannot delete the current context {0:?}; switch to another context first")]
    DeleteCurrent(String),

    /// There is no previous context to return to.
    #[error("no previous context: nothing to switch back to")]
    NoPrevious,

    /// The storage backend failed.
    #[error("io error: {0}")]
    Storage(#[from] StorageError),

    /// A merge or unmerge rewrote the target but its history could not be
    /// saved.
    #[error(
        "io error: merge history for {context:?} could not be saved ({source}); {rollback}"
    )]
    ProvenanceNotRecorded {
        context: String,
        source: Box<ContextError>,
        rollback: String,
    },
}

impl ContextError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ContextError::InvalidName(_)
            | ContextError::InvalidDocument { .. }
            | ContextError::CorruptState { .. } => ErrorKind::Validation,
            ContextError::NotFound(_) | ContextError::MissingDocument(_) => ErrorKind::NotFound,
            ContextError::AlreadyExists(_) => ErrorKind::Conflict,
            ContextError::DeleteCurrent(_) => ErrorKind::Forbidden,
            ContextError::NoPrevious => ErrorKind::NoPrevious,
            ContextError::Storage(_) | ContextError::ProvenanceNotRecorded { .. } => ErrorKind::Io,
        }
    }

    pub(crate) fn invalid_document(subject: impl Into<String>, source: DocumentError) -> Self {
        ContextError::InvalidDocument {
            subject: subject.into(),
            source,
        }
    }
}

/// Result alias for context store operations.
pub type Result<T> = std::result::Result<T, ContextError>;
