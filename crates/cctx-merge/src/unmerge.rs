//! Reversing merges by recorded provenance.
//!
//! Unmerge never diffs documents. It selects every history entry whose
//! source equals the label, removes exactly the items those entries name,
//! and hands back the history without them. Consequences worth knowing:
//!
//! - An item that was already present when a second source was merged was
//!   never recorded for that source, so unmerging the second source leaves it.
//! - A full unmerge deletes a recorded `env` key or field by name even if its
//!   value was edited after the merge.

use cctx_types::{Document, ItemKey, MergeHistoryEntry, ENV_KEY, PERMISSIONS_KEY};
use tracing::debug;

/// The result of an unmerge.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Unmerge {
    /// History entries that did not match the label, in original order.
    pub remaining: Vec<MergeHistoryEntry>,
    /// Items that were present in the target and have been removed.
    pub reverted: Vec<ItemKey>,
    /// Number of history entries dropped.
    pub dropped_entries: usize,
}

/// Remove the permission tokens recorded for `label`.
///
/// Items of any other kind named by the matching entries are ignored, but
/// the entries themselves are still dropped from the returned history.
pub fn unmerge_permissions(
    target: &mut Document,
    history: Vec<MergeHistoryEntry>,
    label: &str,
) -> Unmerge {
    let (matching, remaining) = split_history(history, label);
    let reverted = revert_permissions(target, &matching);
    debug!(
        source = label,
        entries = matching.len(),
        reverted = reverted.len(),
        "permission unmerge"
    );
    Unmerge {
        remaining,
        reverted,
        dropped_entries: matching.len(),
    }
}

/// Remove every item recorded for `label`: env keys, top-level fields, and
/// permission tokens.
pub fn unmerge_full(
    target: &mut Document,
    history: Vec<MergeHistoryEntry>,
    label: &str,
) -> Unmerge {
    let (matching, remaining) = split_history(history, label);
    let mut reverted = Vec::new();
    let mut env_touched = false;

    for item in matching.iter().flat_map(|e| &e.merged_items) {
        match item {
            ItemKey::Allow(_) | ItemKey::Deny(_) => {}
            ItemKey::Env(key) => {
                if let Some(env) = target.env.as_mut() {
                    if env.shift_remove(key).is_some() {
                        env_touched = true;
                        reverted.push(item.clone());
                    }
                }
            }
            ItemKey::Field(key) => {
                if remove_field(target, key) {
                    reverted.push(item.clone());
                }
            }
        }
    }

    if env_touched && target.env.as_ref().is_some_and(|env| env.is_empty()) {
        target.env = None;
    }

    reverted.extend(revert_permissions(target, &matching));
    debug!(
        source = label,
        entries = matching.len(),
        reverted = reverted.len(),
        "full unmerge"
    );
    Unmerge {
        remaining,
        reverted,
        dropped_entries: matching.len(),
    }
}

fn split_history(
    history: Vec<MergeHistoryEntry>,
    label: &str,
) -> (Vec<MergeHistoryEntry>, Vec<MergeHistoryEntry>) {
    history.into_iter().partition(|entry| entry.source == label)
}

/// Removes recorded tokens. The permissions block is dropped only if that
/// empties it and one of the matching merges created it.
fn revert_permissions(target: &mut Document, matching: &[MergeHistoryEntry]) -> Vec<ItemKey> {
    let Some(perms) = target.permissions.as_mut() else {
        return Vec::new();
    };

    let mut reverted = Vec::new();
    for item in matching.iter().flat_map(|e| &e.merged_items) {
        let (list, token) = match item {
            ItemKey::Allow(token) => (&mut perms.allow, token),
            ItemKey::Deny(token) => (&mut perms.deny, token),
            _ => continue,
        };
        let before = list.len();
        list.retain(|t| t != token);
        if list.len() != before {
            reverted.push(item.clone());
        }
    }

    let created_here = matching.iter().any(|e| e.created_permissions);
    if created_here && !reverted.is_empty() && perms.is_empty() {
        target.permissions = None;
    }
    reverted
}

fn remove_field(target: &mut Document, key: &str) -> bool {
    match key {
        PERMISSIONS_KEY if target.permissions.is_some() => target.permissions.take().is_some(),
        ENV_KEY if target.env.is_some() => target.env.take().is_some(),
        _ => target.extra.shift_remove(key).is_some(),
    }
}
