//! Forward merges.
//!
//! Presence is the only gate: an item is copied from the source when the
//! target does not already have it, and recorded when (and only when) it is
//! copied. Existing target content is never overwritten, removed, or
//! reordered, which makes repeating a merge with the same source a no-op.
//! A `permissions` or `env` value the target holds opaquely is left as is.

use cctx_types::{Document, ItemKey, MergeHistoryEntry, ENV_KEY, PERMISSIONS_KEY};
use serde_json::Map;
use tracing::debug;

/// Merge the source's `permissions.allow` and `permissions.deny` tokens into
/// the target.
///
/// The target's permissions block is only created when at least one token is
/// actually added, and the entry then says so.
pub fn merge_permissions(
    target: &mut Document,
    source: &Document,
    label: &str,
) -> MergeHistoryEntry {
    let had_block = target.permissions.is_some();
    let merged_items = add_permissions(target, source);
    debug!(source = label, added = merged_items.len(), "permission merge");
    entry(label, merged_items, had_block, target)
}

/// Merge permissions, then absent `env` keys, then absent top-level fields.
pub fn merge_full(target: &mut Document, source: &Document, label: &str) -> MergeHistoryEntry {
    let had_block = target.permissions.is_some();
    let mut merged_items = add_permissions(target, source);

    if let Some(source_env) = source.env.as_ref().filter(|_| !target.env_is_opaque()) {
        for (key, value) in source_env {
            let present = target.env.as_ref().is_some_and(|env| env.contains_key(key));
            if !present {
                target
                    .env
                    .get_or_insert_with(Map::new)
                    .insert(key.clone(), value.clone());
                merged_items.push(ItemKey::Env(key.clone()));
            }
        }
    }

    for (key, value) in &source.extra {
        if key == PERMISSIONS_KEY || key == ENV_KEY {
            continue;
        }
        if !target.has_field(key) {
            target.extra.insert(key.clone(), value.clone());
            merged_items.push(ItemKey::Field(key.clone()));
        }
    }

    debug!(source = label, added = merged_items.len(), "full merge");
    entry(label, merged_items, had_block, target)
}

fn entry(label: &str, items: Vec<ItemKey>, had_block: bool, target: &Document) -> MergeHistoryEntry {
    let mut entry = MergeHistoryEntry::new(label, items);
    entry.created_permissions = !had_block && target.permissions.is_some();
    entry
}

fn add_permissions(target: &mut Document, source: &Document) -> Vec<ItemKey> {
    let mut items = Vec::new();
    if target.permissions_are_opaque() {
        return items;
    }

    for token in source.allow() {
        if !target.allow().contains(token) {
            target.permissions_mut().allow.push(token.clone());
            items.push(ItemKey::Allow(token.clone()));
        }
    }

    for token in source.deny() {
        if !target.deny().contains(token) {
            target.permissions_mut().deny.push(token.clone());
            items.push(ItemKey::Deny(token.clone()));
        }
    }

    items
}
