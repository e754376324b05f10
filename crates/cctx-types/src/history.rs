//! Merge provenance records.
//!
//! Every merge appends one [`MergeHistoryEntry`] to the target context's
//! history, naming exactly which atomic items the source introduced. Unmerge
//! later reverts by those names alone.

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

const ALLOW_PREFIX: &str = "permissions.allow:";
const DENY_PREFIX: &str = "permissions.deny:";
const ENV_PREFIX: &str = "env:";

/// Identity of one atomic piece of a document introduced by a merge.
///
/// Serialized as a namespaced string: `permissions.allow:<token>`,
/// `permissions.deny:<token>`, `env:<key>`, or a bare top-level field name.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ItemKey {
    Allow(String),
    Deny(String),
    Env(String),
    Field(String),
}

impl ItemKey {
    /// Returns `true` for `permissions.allow` and `permissions.deny` items.
    pub fn is_permission(&self) -> bool {
        matches!(self, ItemKey::Allow(_) | ItemKey::Deny(_))
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemKey::Allow(token) => write!(f, "{ALLOW_PREFIX}{token}"),
            ItemKey::Deny(token) => write!(f, "{DENY_PREFIX}{token}"),
            ItemKey::Env(key) => write!(f, "{ENV_PREFIX}{key}"),
            ItemKey::Field(key) => f.write_str(key),
        }
    }
}

impl From<String> for ItemKey {
    fn from(raw: String) -> Self {
        if let Some(token) = raw.strip_prefix(ALLOW_PREFIX) {
            ItemKey::Allow(token.to_string())
        } else if let Some(token) = raw.strip_prefix(DENY_PREFIX) {
            ItemKey::Deny(token.to_string())
        } else if let Some(key) = raw.strip_prefix(ENV_PREFIX) {
            ItemKey::Env(key.to_string())
        } else {
            ItemKey::Field(raw)
        }
    }
}

impl From<&str> for ItemKey {
    fn from(raw: &str) -> Self {
        ItemKey::from(raw.to_string())
    }
}

impl From<ItemKey> for String {
    fn from(key: ItemKey) -> Self {
        key.to_string()
    }
}

/// One merge operation recorded against a target context.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeHistoryEntry {
    /// The source label exactly as the caller gave it.
    pub source: String,
    /// Items this merge introduced, in the order they were added.
    pub merged_items: Vec<ItemKey>,
    /// ISO-8601 UTC timestamp with millisecond precision.
    ///
    /// Kept as the stored string so that loading and re-saving a history
    /// never rewrites timestamps produced by other tools.
    pub timestamp: String,
    /// Set when the target had no `permissions` block before this merge.
    /// Absent from entries written by other tools, which reads as `false`.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub created_permissions: bool,
}

impl MergeHistoryEntry {
    /// Create an entry stamped with the current time.
    pub fn new(source: impl Into<String>, merged_items: Vec<ItemKey>) -> Self {
        Self::at(source, merged_items, Utc::now())
    }

    /// Create an entry stamped with an explicit time.
    pub fn at(
        source: impl Into<String>,
        merged_items: Vec<ItemKey>,
        when: DateTime<Utc>,
    ) -> Self {
        Self {
            source: source.into(),
            merged_items,
            timestamp: when.to_rfc3339_opts(SecondsFormat::Millis, true),
            created_permissions: false,
        }
    }

    /// The timestamp parsed as a UTC instant, if it is valid RFC 3339.
    pub fn recorded_at(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.timestamp)
            .ok()
            .map(|t| t.with_timezone(&Utc))
    }

    /// Returns `true` if the merge introduced nothing.
    pub fn is_empty(&self) -> bool {
        self.merged_items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn item_keys_render_namespaced() {
        assert_eq!(ItemKey::Allow("Bash(ls)".into()).to_string(), "permissions.allow:Bash(ls)");
        assert_eq!(ItemKey::Deny("Read(.env)".into()).to_string(), "permissions.deny:Read(.env)");
        assert_eq!(ItemKey::Env("TOKEN".into()).to_string(), "env:TOKEN");
        assert_eq!(ItemKey::Field("model".into()).to_string(), "model");
    }

    #[test]
    fn item_keys_parse_back() {
        assert_eq!(ItemKey::from("permissions.allow:a"), ItemKey::Allow("a".into()));
        assert_eq!(ItemKey::from("permissions.deny:b"), ItemKey::Deny("b".into()));
        assert_eq!(ItemKey::from("env:C"), ItemKey::Env("C".into()));
        assert_eq!(ItemKey::from("hooks"), ItemKey::Field("hooks".into()));
    }

    #[test]
    fn tokens_may_contain_colons() {
        let key = ItemKey::from("permissions.allow:Bash(git commit:*)");
        assert_eq!(key, ItemKey::Allow("Bash(git commit:*)".into()));
        assert_eq!(key.to_string(), "permissions.allow:Bash(git commit:*)");
    }

    #[test]
    fn entry_uses_camel_case_wire_format() {
        let when = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
        let entry = MergeHistoryEntry::at(
            "base",
            vec![ItemKey::Allow("a".into()), ItemKey::Env("B".into())],
            when,
        );
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "source": "base",
                "mergedItems": ["permissions.allow:a", "env:B"],
                "timestamp": "2026-01-02T03:04:05.000Z"
            })
        );
    }

    #[test]
    fn created_permissions_flag_is_written_only_when_set() {
        let when = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
        let mut entry = MergeHistoryEntry::at("base", vec![ItemKey::Allow("a".into())], when);
        entry.created_permissions = true;

        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["createdPermissions"], serde_json::json!(true));
        let back: MergeHistoryEntry = serde_json::from_value(json).unwrap();
        assert_eq!(back, entry);

        let raw = r#"{"source":"x","mergedItems":["permissions.allow:a"],"timestamp":"t"}"#;
        let foreign: MergeHistoryEntry = serde_json::from_str(raw).unwrap();
        assert!(!foreign.created_permissions);
    }

    #[test]
    fn foreign_timestamps_are_kept_verbatim() {
        let raw = r#"{"source":"x","mergedItems":[],"timestamp":"2025-06-01T10:00:00+02:00"}"#;
        let entry: MergeHistoryEntry = serde_json::from_str(raw).unwrap();
        assert_eq!(entry.timestamp, "2025-06-01T10:00:00+02:00");
        let at = entry.recorded_at().unwrap();
        assert_eq!(at, Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap());
    }

    #[test]
    fn garbage_timestamp_has_no_instant() {
        let entry = MergeHistoryEntry {
            source: "x".into(),
            merged_items: vec![],
            timestamp: "yesterday".into(),
            created_permissions: false,
        };
        assert!(entry.recorded_at().is_none());
        assert!(entry.is_empty());
    }
}
