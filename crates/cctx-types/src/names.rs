//! Context name validation.
//!
//! A context name doubles as a file stem inside the contexts directory, so it
//! must be safe to join onto that directory and must stay visible to
//! directory listings:
//! - Must be non-empty
//! - Must not be `-` (reserved for "switch to previous")
//! - Must not be `.` or `..`
//! - Must not contain a path separator (`/` or `\`) or a NUL byte
//! - Must not start with `.` (hidden files are skipped when listing)

use thiserror::Error;

/// Characters that are forbidden anywhere in a context name.
const FORBIDDEN_CHARS: &[char] = &['/', '\\', '\0'];

/// Names that are reserved outright.
const RESERVED_NAMES: &[&str] = &["-", ".", ".."];

/// A rejected context name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid context name {name:?}: {reason}")]
pub struct NameError {
    pub name: String,
    pub reason: String,
}

impl NameError {
    fn new(name: &str, reason: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

/// Validate a context name, returning `Ok(())` if it can be stored.
///
/// # Examples
///
/// ```
/// use cctx_types::names::validate_context_name;
///
/// assert!(validate_context_name("work").is_ok());
/// assert!(validate_context_name("").is_err());
/// assert!(validate_context_name("a/b").is_err());
/// ```
pub fn validate_context_name(name: &str) -> Result<(), NameError> {
    if name.is_empty() {
        return Err(NameError::new(name, "name must not be empty"));
    }

    if RESERVED_NAMES.contains(&name) {
        return Err(NameError::new(name, "name is reserved"));
    }

    for ch in FORBIDDEN_CHARS {
        if name.contains(*ch) {
            return Err(NameError::new(
                name,
                format!("contains forbidden character: {ch:?}"),
            ));
        }
    }

    if name.starts_with('.') {
        return Err(NameError::new(name, "must not start with '.'"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_simple_names() {
        assert!(validate_context_name("alpha").is_ok());
        assert!(validate_context_name("work-laptop").is_ok());
        assert!(validate_context_name("v1.0").is_ok());
        assert!(validate_context_name("with space").is_ok());
    }

    #[test]
    fn reject_empty_name() {
        let err = validate_context_name("").unwrap_err();
        assert_eq!(err.name, "");
    }

    #[test]
    fn reject_reserved_names() {
        assert!(validate_context_name("-").is_err());
        assert!(validate_context_name(".").is_err());
        assert!(validate_context_name("..").is_err());
    }

    #[test]
    fn reject_path_separators() {
        assert!(validate_context_name("a/b").is_err());
        assert!(validate_context_name("a\\b").is_err());
        assert!(validate_context_name("../escape").is_err());
        assert!(validate_context_name("nul\0byte").is_err());
    }

    #[test]
    fn reject_hidden_names() {
        assert!(validate_context_name(".hidden").is_err());
    }

    #[test]
    fn error_message_names_the_input() {
        let err = validate_context_name("a/b").unwrap_err();
        assert!(err.to_string().contains("\"a/b\""));
    }
}
