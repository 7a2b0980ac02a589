//! Snapshot flattening - turn live, lazily-computed host objects into plain
//! records safe to serialize across the driver boundary.
//!
//! A live model exposes its materialized attribute bag under `"all"`. The
//! flatten pass is shallow on purpose: it recurses exactly one level, and the
//! caller re-invokes it on sub-objects that need it. That, plus the explicit
//! back-reference strip list, is what keeps records acyclic without general
//! cycle detection.
//!
//! CHANGELOG:
//! - 08/26/2026 - Initial implementation

use serde_json::Value;

/// Property name under which a live object exposes its materialized view.
pub const MATERIALIZED_KEY: &str = "all";

/// Fields known to point back into the live graph (message-chunk caches,
/// presence trackers, contact back-references, nested previews). Stripping
/// them is the caller's job after flattening; see [`strip_back_refs`].
pub const KNOWN_BACK_REFS: &[&str] = &[
    "msgChunks",
    "msgChunk",
    "mute",
    "presence",
    "contact",
    "previewMessage",
];

/// Returns the materialized view of `value` if it exposes one.
pub fn materialized_view(value: &Value) -> Option<&Value> {
    value.as_object().and_then(|obj| obj.get(MATERIALIZED_KEY))
}

/// Flatten one level of a live object.
///
/// Every direct property whose value exposes a materialized view is replaced
/// by that view. Non-collection nested references pass through unchanged and
/// may still alias the live graph. Reapplying to an already-flat record is a
/// no-op.
pub fn flatten(value: &Value) -> Value {
    let Some(obj) = value.as_object() else {
        return value.clone();
    };

    let mut out = serde_json::Map::with_capacity(obj.len());
    for (key, prop) in obj {
        match materialized_view(prop) {
            Some(view) => out.insert(key.clone(), view.clone()),
            None => out.insert(key.clone(), prop.clone()),
        };
    }
    Value::Object(out)
}

/// Flatten a model down to its own attribute bag, then flatten the bag.
///
/// Equivalent to the common `flatten(model.all)` call sites: the model's
/// materialized bag is taken first, and any lazily-computed properties inside
/// it are flattened one level.
pub fn flatten_model(model: &Value) -> Value {
    match materialized_view(model) {
        Some(bag) => flatten(bag),
        None => flatten(model),
    }
}

/// Remove the known back-reference fields from a flattened record.
pub fn strip_back_refs(record: &mut Value) {
    if let Some(obj) = record.as_object_mut() {
        for field in KNOWN_BACK_REFS {
            obj.remove(*field);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flatten_replaces_materialized_views() {
        let live = json!({
            "name": "Alice",
            "sender": {"all": {"id": "a@host", "name": "Alice"}, "stale": true},
        });
        let flat = flatten(&live);
        assert_eq!(flat["name"], "Alice");
        assert_eq!(flat["sender"], json!({"id": "a@host", "name": "Alice"}));
    }

    #[test]
    fn test_flatten_is_shallow() {
        // A view nested two levels down is untouched; the caller must flatten
        // the sub-object explicitly.
        let live = json!({
            "chat": {"all": {"owner": {"all": {"id": "o@host"}}}},
        });
        let flat = flatten(&live);
        assert_eq!(flat["chat"]["owner"]["all"]["id"], "o@host");

        let inner = flatten(&flat["chat"]);
        assert_eq!(inner["owner"], json!({"id": "o@host"}));
    }

    #[test]
    fn test_flatten_idempotent() {
        let live = json!({
            "t": 100,
            "senderObj": {"all": {"id": "a@host"}},
            "plain": [1, 2, 3],
        });
        let once = flatten(&live);
        let twice = flatten(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_flatten_non_object_passthrough() {
        assert_eq!(flatten(&json!([1, 2])), json!([1, 2]));
        assert_eq!(flatten(&json!("x")), json!("x"));
    }

    #[test]
    fn test_flatten_model_takes_bag_first() {
        let model = json!({
            "all": {"id": "c@host", "mute": {"all": {"until": 0}}},
            "internal": "ignored",
        });
        let flat = flatten_model(&model);
        assert_eq!(flat["id"], "c@host");
        assert_eq!(flat["mute"], json!({"until": 0}));
        assert!(flat.get("internal").is_none());
    }

    #[test]
    fn test_strip_back_refs() {
        let mut record = json!({
            "id": "c@host",
            "msgChunks": [{"huge": true}],
            "presence": {"watchers": []},
            "contact": {"id": "c@host"},
            "body": "hi",
        });
        strip_back_refs(&mut record);
        assert_eq!(record, json!({"id": "c@host", "body": "hi"}));
    }
}
