//! Canonical entity identity (`user@server`).
//!
//! Identifier arguments arriving over the driver boundary are untyped: a bare
//! string, a structured id carrying its serialized form, or a `{user, server}`
//! pair. Everything is normalized to the canonical string before lookup.
//!
//! CHANGELOG:
//! - 08/26/2026 - Initial implementation

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// `user@server` identity of a contact, chat or group.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityId {
    pub user: String,
    pub server: String,
}

impl EntityId {
    pub fn new(user: impl Into<String>, server: impl Into<String>) -> Self {
        Self { user: user.into(), server: server.into() }
    }

    /// Parse from the canonical `user@server` form.
    pub fn parse(canonical: &str) -> Option<Self> {
        let (user, server) = canonical.split_once('@')?;
        if user.is_empty() || server.is_empty() {
            return None;
        }
        Some(Self::new(user, server))
    }

    /// Group identities live on a dedicated host server.
    pub fn is_group(&self) -> bool {
        self.server.starts_with("g.")
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.user, self.server)
    }
}

/// Normalize an untyped identifier value to its canonical string form.
///
/// Accepts a bare string, an object exposing `_serialized`, or an object with
/// `user` and `server` fields.
pub fn canonical_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Object(obj) => {
            if let Some(serialized) = obj.get("_serialized").and_then(Value::as_str) {
                return Some(serialized.to_string());
            }
            let user = obj.get("user")?.as_str()?;
            let server = obj.get("server")?.as_str()?;
            Some(format!("{user}@{server}"))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_and_display_roundtrip() {
        let id = EntityId::parse("alice@host").unwrap();
        assert_eq!(id.user, "alice");
        assert_eq!(id.to_string(), "alice@host");
        assert!(EntityId::parse("no-at-sign").is_none());
        assert!(EntityId::parse("@host").is_none());
    }

    #[test]
    fn test_group_server() {
        assert!(EntityId::parse("team123@g.host").unwrap().is_group());
        assert!(!EntityId::parse("alice@host").unwrap().is_group());
    }

    #[test]
    fn test_canonical_id_accepts_all_boundary_shapes() {
        assert_eq!(canonical_id(&json!("alice@host")).as_deref(), Some("alice@host"));
        assert_eq!(
            canonical_id(&json!({"_serialized": "alice@host", "user": "ignored"})).as_deref(),
            Some("alice@host")
        );
        assert_eq!(
            canonical_id(&json!({"user": "alice", "server": "host"})).as_deref(),
            Some("alice@host")
        );
        assert_eq!(canonical_id(&json!(42)), None);
    }
}
