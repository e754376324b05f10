//! Settings documents.
//!
//! A context is an arbitrary JSON object. The merge engine only understands
//! two sub-structures of it, `permissions.{allow,deny}` and `env`, so those
//! are lifted into typed fields and everything else rides along untouched in
//! [`Document::extra`]. A `permissions` or `env` value of any other shape is
//! not an error: it stays in `extra` as an opaque value and merges leave it
//! alone.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Top-level key holding the permission lists.
pub const PERMISSIONS_KEY: &str = "permissions";
/// Top-level key holding the environment map.
pub const ENV_KEY: &str = "env";

/// Errors raised when bytes cannot be interpreted as a settings document.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// The input is not well-formed JSON.
    #[error("malformed document: {0}")]
    Malformed(#[from] serde_json::Error),

    /// The input is valid JSON but its top level is not an object.
    #[error("document must be a JSON object, found {found}")]
    NotAnObject { found: &'static str },
}

/// The `permissions` block of a settings document.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Permissions {
    #[serde(default)]
    pub allow: Vec<String>,
    #[serde(default)]
    pub deny: Vec<String>,
    /// Any other permission settings (`defaultMode`, `additionalDirectories`, ...).
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl Permissions {
    /// Returns `true` if both lists and the extra settings are empty.
    pub fn is_empty(&self) -> bool {
        self.allow.is_empty() && self.deny.is_empty() && self.other.is_empty()
    }
}

/// A parsed settings document.
///
/// `extra` never holds a `permissions` key while `permissions` is `Some`, nor
/// an `env` key while `env` is `Some`.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Document {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Permissions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub env: Option<Map<String, Value>>,
    /// Every other top-level field, in document order, plus `permissions` or
    /// `env` when their shape is not the one described above.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl<'de> Deserialize<'de> for Document {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Map::<String, Value>::deserialize(deserializer).map(Document::from_object)
    }
}

impl Document {
    /// An empty document, `{}`.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse a document from raw bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, DocumentError> {
        parse_object(bytes).map(Self::from_object)
    }

    /// Build a document from an already-parsed JSON object. Never fails:
    /// unrecognised shapes are kept as opaque fields.
    pub fn from_object(object: Map<String, Value>) -> Self {
        let mut doc = Document::default();
        for (key, value) in object {
            match key.as_str() {
                PERMISSIONS_KEY => match Permissions::deserialize(&value) {
                    Ok(perms) => doc.permissions = Some(perms),
                    Err(_) => {
                        doc.extra.insert(key, value);
                    }
                },
                ENV_KEY => match value {
                    Value::Object(env) => doc.env = Some(env),
                    other => {
                        doc.extra.insert(key, other);
                    }
                },
                _ => {
                    doc.extra.insert(key, value);
                }
            }
        }
        doc
    }

    /// Convert back into a plain JSON value.
    pub fn to_value(&self) -> Result<Value, DocumentError> {
        Ok(serde_json::to_value(self)?)
    }

    /// Serialize in the on-disk form: two-space pretty JSON plus a newline.
    pub fn to_pretty_bytes(&self) -> Result<Vec<u8>, DocumentError> {
        to_pretty_bytes(&self.to_value()?)
    }

    /// Returns `true` if the top-level field `key` is present.
    pub fn has_field(&self, key: &str) -> bool {
        match key {
            PERMISSIONS_KEY if self.permissions.is_some() => true,
            ENV_KEY if self.env.is_some() => true,
            _ => self.extra.contains_key(key),
        }
    }

    /// Returns `true` if `permissions` is present but not a typed block.
    pub fn permissions_are_opaque(&self) -> bool {
        self.extra.contains_key(PERMISSIONS_KEY)
    }

    /// Returns `true` if `env` is present but not an object.
    pub fn env_is_opaque(&self) -> bool {
        self.extra.contains_key(ENV_KEY)
    }

    /// Returns the permissions block, creating an empty one if absent.
    pub fn permissions_mut(&mut self) -> &mut Permissions {
        self.permissions.get_or_insert_with(Permissions::default)
    }

    /// Allowed tokens, or an empty slice if there is no permissions block.
    pub fn allow(&self) -> &[String] {
        self.permissions
            .as_ref()
            .map(|p| p.allow.as_slice())
            .unwrap_or_default()
    }

    /// Denied tokens, or an empty slice if there is no permissions block.
    pub fn deny(&self) -> &[String] {
        self.permissions
            .as_ref()
            .map(|p| p.deny.as_slice())
            .unwrap_or_default()
    }
}

/// Parse bytes as JSON and require an object at the top level.
pub fn parse_object(bytes: &[u8]) -> Result<Map<String, Value>, DocumentError> {
    match serde_json::from_slice::<Value>(bytes)? {
        Value::Object(map) => Ok(map),
        other => Err(DocumentError::NotAnObject {
            found: json_type_name(&other),
        }),
    }
}

/// Render any JSON value in the on-disk form.
pub fn to_pretty_bytes(value: &Value) -> Result<Vec<u8>, DocumentError> {
    let mut bytes = serde_json::to_vec_pretty(value)?;
    bytes.push(b'\n');
    Ok(bytes)
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_document_serializes_as_empty_object() {
        let bytes = Document::empty().to_pretty_bytes().unwrap();
        assert_eq!(bytes, b"{}\n");
    }

    #[test]
    fn recognised_fields_are_lifted() {
        let doc = Document::from_slice(
            br#"{"permissions":{"allow":["Bash(ls)"],"defaultMode":"plan"},"env":{"A":"1"},"model":"opus"}"#,
        )
        .unwrap();
        assert_eq!(doc.allow(), ["Bash(ls)".to_string()]);
        assert!(doc.deny().is_empty());
        let perms = doc.permissions.as_ref().unwrap();
        assert_eq!(perms.other.get("defaultMode"), Some(&json!("plan")));
        assert_eq!(doc.env.as_ref().unwrap().get("A"), Some(&json!("1")));
        assert_eq!(doc.extra.get("model"), Some(&json!("opus")));
        assert!(!doc.extra.contains_key("permissions"));
    }

    #[test]
    fn opaque_fields_survive_a_round_trip() {
        let input = json!({
            "hooks": {"PreToolUse": [{"matcher": "Bash"}]},
            "statusLine": {"type": "command", "command": "echo hi"},
            "includeCoAuthoredBy": false
        });
        let doc = Document::from_object(input.as_object().unwrap().clone());
        assert_eq!(doc.to_value().unwrap(), input);
    }

    #[test]
    fn has_field_covers_typed_and_extra_keys() {
        let doc = Document::from_slice(br#"{"env":{},"x":1}"#).unwrap();
        assert!(doc.has_field("env"));
        assert!(doc.has_field("x"));
        assert!(!doc.has_field("permissions"));
        assert!(!doc.has_field("y"));
    }

    #[test]
    fn non_object_top_level_is_rejected() {
        let err = Document::from_slice(b"[1,2]").unwrap_err();
        assert!(matches!(err, DocumentError::NotAnObject { found: "an array" }));
    }

    #[test]
    fn malformed_json_is_rejected() {
        let err = Document::from_slice(b"{").unwrap_err();
        assert!(matches!(err, DocumentError::Malformed(_)));
    }

    #[test]
    fn unusual_permissions_shapes_stay_opaque() {
        for raw in [
            br#"{"permissions":"all"}"#.as_slice(),
            br#"{"permissions":{"allow":[1]}}"#.as_slice(),
            br#"{"permissions":{"allow":"Bash"}}"#.as_slice(),
            br#"{"permissions":null}"#.as_slice(),
        ] {
            let doc = Document::from_slice(raw).unwrap();
            assert!(doc.permissions.is_none());
            assert!(doc.permissions_are_opaque());
            assert!(doc.has_field("permissions"));
            assert!(doc.allow().is_empty());
            let expected: Value = serde_json::from_slice(raw).unwrap();
            assert_eq!(doc.to_value().unwrap(), expected);
        }
    }

    #[test]
    fn non_object_env_stays_opaque() {
        let doc = Document::from_slice(br#"{"env":["A"],"model":"opus"}"#).unwrap();
        assert!(doc.env.is_none());
        assert!(doc.env_is_opaque());
        assert!(doc.has_field("env"));
        assert_eq!(doc.to_value().unwrap(), json!({"env": ["A"], "model": "opus"}));
    }

    #[test]
    fn serde_deserialize_is_tolerant_too() {
        let doc: Document = serde_json::from_str(r#"{"permissions":"all","env":{"A":"1"}}"#).unwrap();
        assert!(doc.permissions_are_opaque());
        assert_eq!(doc.env.as_ref().unwrap().get("A"), Some(&json!("1")));
    }

    #[test]
    fn pretty_bytes_end_with_newline() {
        let bytes = to_pretty_bytes(&json!({"ok": true})).unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), "{\n  \"ok\": true\n}\n");
    }
}
