//! Error classification shared by every cctx crate.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The class of a failed operation.
///
/// Each concrete error type in the workspace maps onto exactly one kind, and
/// every kind renders with a distinct, stable message prefix so scripts can
/// match on the class rather than the free text that follows it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Bad context name or malformed input document.
    Validation,
    /// Referenced context, source, or document is absent.
    NotFound,
    /// Target name already exists.
    Conflict,
    /// Structurally disallowed operation, such as deleting the active context.
    Forbidden,
    /// There is no previous context to switch back to.
    NoPrevious,
    /// Underlying storage failure.
    Io,
}

impl ErrorKind {
    /// The message prefix every error of this kind starts with.
    pub const fn prefix(self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation error",
            ErrorKind::NotFound => "not found",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Forbidden => "forbidden",
            ErrorKind::NoPrevious => "no previous context",
            ErrorKind::Io => "io error",
        }
    }

    /// Process exit code used by the command-line front end.
    pub const fn exit_code(self) -> i32 {
        match self {
            ErrorKind::Io => 1,
            ErrorKind::Validation => 2,
            ErrorKind::NotFound => 3,
            ErrorKind::Conflict => 4,
            ErrorKind::Forbidden => 5,
            ErrorKind::NoPrevious => 6,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}
