//! Active/previous context pointers and their transitions.
//!
//! The state machine has two states, `Unset` and `Active(name)`. Only the
//! transitions live here; persistence is the state store's job.

use serde::{Deserialize, Serialize};

/// The per-scope record of which context is active and which one it replaced.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous: Option<String>,
}

impl ActiveState {
    /// Returns `true` if no context is active.
    pub fn is_unset(&self) -> bool {
        self.current.is_none()
    }

    /// Returns `true` if `name` is the active context.
    pub fn is_current(&self, name: &str) -> bool {
        self.current.as_deref() == Some(name)
    }

    /// Make `name` the active context.
    ///
    /// A different previously-active context becomes `previous`. Switching
    /// to the context that is already active changes nothing. Returns `true`
    /// if the state changed.
    pub fn switch_to(&mut self, name: &str) -> bool {
        if self.is_current(name) {
            return false;
        }
        if let Some(old) = self.current.take() {
            self.previous = Some(old);
        }
        self.current = Some(name.to_string());
        true
    }

    /// Deactivate the current context; `previous` becomes whatever was
    /// current, or nothing if no context was active.
    pub fn unset(&mut self) {
        self.previous = self.current.take();
    }

    /// Repoint any reference to `old` at `new`.
    pub fn rename(&mut self, old: &str, new: &str) {
        for slot in [&mut self.current, &mut self.previous] {
            if slot.as_deref() == Some(old) {
                *slot = Some(new.to_string());
            }
        }
    }

    /// Forget `name` as the previous context. Returns `true` if it was.
    pub fn forget_previous(&mut self, name: &str) -> bool {
        if self.previous.as_deref() == Some(name) {
            self.previous = None;
            return true;
        }
        false
    }
}
