//! Capability probes - small matcher values with a uniform evaluate contract.
//!
//! No stable reference to any host subsystem exists, so each capability is
//! located by probing the structure of candidate export modules. A probe
//! either rejects a module or accepts it, optionally selecting a sub-property
//! (most host modules of interest hang the real object off `default`).
//!
//! Capture conventions: function exports are encoded as `{"$fn": arity}`;
//! prototypes carry their constructor source under `prototype.constructor`.
//!
//! CHANGELOG:
//! - 08/27/2026 - Probe set finalized against current host captures
//! - 08/26/2026 - Initial implementation

use serde_json::Value;

/// Logical name of the designated base capability. The facade is anchored on
/// it; every other resolved capability is exposed alongside under its own
/// logical name.
pub const BASE_CAPABILITY: &str = "store";

/// A structural matcher for one required host capability.
///
/// `evaluate` returns `None` to reject the module, or the JSON-pointer suffix
/// selecting the resolved object: `""` for the module itself, `"/default"`
/// for its default export.
#[derive(Clone, Copy)]
pub struct CapabilityProbe {
    pub id: &'static str,
    probe: fn(&Value) -> Option<&'static str>,
}

impl CapabilityProbe {
    pub const fn new(id: &'static str, probe: fn(&Value) -> Option<&'static str>) -> Self {
        Self { id, probe }
    }

    pub fn evaluate(&self, module: &Value) -> Option<&'static str> {
        (self.probe)(module)
    }
}

impl std::fmt::Debug for CapabilityProbe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapabilityProbe").field("id", &self.id).finish()
    }
}

/// Arity of a captured function export, if `value` is one.
pub fn fn_arity(value: &Value) -> Option<u64> {
    value.as_object()?.get("$fn")?.as_u64()
}

/// Whether `value` is a captured function export.
pub fn is_fn(value: &Value) -> bool {
    fn_arity(value).is_some()
}

fn has_key(module: &Value, key: &str) -> bool {
    module.as_object().is_some_and(|m| m.contains_key(key))
}

fn probe_store(module: &Value) -> Option<&'static str> {
    (has_key(module, "Chat") && has_key(module, "Msg")).then_some("")
}

fn probe_group_api(module: &Value) -> Option<&'static str> {
    has_key(module, "createGroup").then_some("")
}

fn probe_media(module: &Value) -> Option<&'static str> {
    module
        .pointer("/default/prototype/processFiles")
        .is_some()
        .then_some("/default")
}

fn probe_chat_delete(module: &Value) -> Option<&'static str> {
    let delete = module.as_object()?.get("sendConversationDelete")?;
    (fn_arity(delete) == Some(2)).then_some("")
}

fn probe_conn(module: &Value) -> Option<&'static str> {
    (module.pointer("/default/ref").is_some() && module.pointer("/default/refTTL").is_some())
        .then_some("/default")
}

fn probe_query(module: &Value) -> Option<&'static str> {
    has_key(module, "queryExist").then_some("")
}

fn probe_wire_proto(module: &Value) -> Option<&'static str> {
    let ctor = module.pointer("/prototype/constructor")?.as_str()?;
    ctor.contains("binaryProtocol deprecated version").then_some("")
}

fn probe_user_id(module: &Value) -> Option<&'static str> {
    (module.pointer("/default/prototype/isServer").is_some()
        && module.pointer("/default/prototype/isUser").is_some())
    .then_some("/default")
}

/// The capabilities the shim needs from the host, in evaluation order.
///
/// Probes are expected to be mutually exclusive across host modules; when two
/// modules match the same probe, the first in snapshot iteration order wins.
pub fn default_probes() -> Vec<CapabilityProbe> {
    vec![
        CapabilityProbe::new(BASE_CAPABILITY, probe_store),
        CapabilityProbe::new("group_api", probe_group_api),
        CapabilityProbe::new("media", probe_media),
        CapabilityProbe::new("chat_delete", probe_chat_delete),
        CapabilityProbe::new("conn", probe_conn),
        CapabilityProbe::new("query", probe_query),
        CapabilityProbe::new("wire_proto", probe_wire_proto),
        CapabilityProbe::new("user_id", probe_user_id),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fn_arity() {
        assert_eq!(fn_arity(&json!({"$fn": 2})), Some(2));
        assert_eq!(fn_arity(&json!({"arity": 2})), None);
        assert!(!is_fn(&json!("createGroup")));
    }

    #[test]
    fn test_store_probe_needs_both_collections() {
        assert_eq!(probe_store(&json!({"Chat": {}, "Msg": {}})), Some(""));
        assert_eq!(probe_store(&json!({"Chat": {}})), None);
    }

    #[test]
    fn test_sub_property_probes_select_default() {
        let conn = json!({"default": {"ref": "abc", "refTTL": 20}});
        assert_eq!(probe_conn(&conn), Some("/default"));

        let media = json!({"default": {"prototype": {"processFiles": {"$fn": 1}}}});
        assert_eq!(probe_media(&media), Some("/default"));
    }

    #[test]
    fn test_chat_delete_requires_exact_arity() {
        assert_eq!(
            probe_chat_delete(&json!({"sendConversationDelete": {"$fn": 2}})),
            Some("")
        );
        assert_eq!(
            probe_chat_delete(&json!({"sendConversationDelete": {"$fn": 3}})),
            None
        );
    }

    #[test]
    fn test_wire_proto_matches_constructor_source() {
        let module = json!({
            "prototype": {"constructor": "function(){/* binaryProtocol deprecated version 10 */}"}
        });
        assert_eq!(probe_wire_proto(&module), Some(""));
        assert_eq!(probe_wire_proto(&json!({"prototype": {}})), None);
    }
}
