//! Registry scanner - locates the host module table by shape and binds
//! capability probes to export modules.
//!
//! The host registry is a nested map with no stable path to the module table,
//! so the scanner looks for the one container whose first entry is itself a
//! keyed table of leaf export modules. Resolution records JSON pointers into
//! the capture rather than cloned values, so the facade keeps reading (and,
//! where sanctioned, mutating) the live objects.
//!
//! CHANGELOG:
//! - 08/27/2026 - Soft-fail path and early exit
//! - 08/26/2026 - Initial implementation

use serde_json::Value;
use tracing::{debug, warn};

use crate::registry::probe::CapabilityProbe;

/// One capability bound by the scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCapability {
    /// Logical name the facade exposes this capability under.
    pub id: &'static str,
    /// JSON pointer to the resolved object within the host capture.
    pub pointer: String,
}

/// Escape a map key for use in a JSON pointer segment.
fn pointer_segment(key: &str) -> String {
    key.replace('~', "~0").replace('/', "~1")
}

/// Whether `container` has the module-table shape: a keyed table whose first
/// entry is a leaf export module.
fn is_module_table(container: &Value) -> bool {
    let Some(entries) = container.as_object() else {
        return false;
    };
    match entries.values().next() {
        Some(first) => first.as_object().is_some_and(|m| m.contains_key("exports")),
        None => false,
    }
}

/// Scan the host registry capture and bind each probe to the first matching
/// export module.
///
/// Iteration order is the capture's own; when two modules satisfy the same
/// probe, the earlier one wins. A probe that matches nothing is simply absent
/// from the result. If no container has the module-table shape the result is
/// empty - a deliberate soft fail, since the host's internal shape may change
/// between versions.
pub fn scan(root: &Value, probes: &[CapabilityProbe]) -> Vec<ResolvedCapability> {
    let Some(containers) = root.as_object() else {
        warn!("registry capture root is not a container; facade left empty");
        return Vec::new();
    };

    for (container_key, container) in containers {
        let Some(entries) = container.as_object() else {
            continue;
        };
        if !is_module_table(container) {
            continue;
        }

        debug!(container = %container_key, "module table located");
        return bind_probes(container_key, entries, probes);
    }

    warn!("no container matched the module-table shape; facade left empty");
    Vec::new()
}

/// Evaluate every probe against the leaf modules of the located table,
/// first-match-wins, exiting early once all probes have resolved.
fn bind_probes(
    container_key: &str,
    entries: &serde_json::Map<String, Value>,
    probes: &[CapabilityProbe],
) -> Vec<ResolvedCapability> {
    let mut resolved: Vec<ResolvedCapability> = Vec::with_capacity(probes.len());

    for (module_key, leaf) in entries {
        let Some(exports) = leaf.get("exports") else {
            continue;
        };
        if exports.is_null() {
            continue;
        }

        for probe in probes {
            if resolved.iter().any(|r| r.id == probe.id) {
                continue;
            }
            if let Some(suffix) = probe.evaluate(exports) {
                let pointer = format!(
                    "/{}/{}/exports{}",
                    pointer_segment(container_key),
                    pointer_segment(module_key),
                    suffix
                );
                debug!(capability = probe.id, %pointer, "capability resolved");
                resolved.push(ResolvedCapability { id: probe.id, pointer });
            }
        }

        if resolved.len() == probes.len() {
            break;
        }
    }

    resolved
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::probe::{default_probes, BASE_CAPABILITY};
    use serde_json::json;

    fn store_probe() -> CapabilityProbe {
        fn probe(m: &Value) -> Option<&'static str> {
            (m.get("Chat").is_some() && m.get("Msg").is_some()).then_some("")
        }
        CapabilityProbe::new("store", probe)
    }

    fn query_probe() -> CapabilityProbe {
        fn probe(m: &Value) -> Option<&'static str> {
            m.get("queryExist").is_some().then_some("")
        }
        CapabilityProbe::new("query", probe)
    }

    #[test]
    fn test_locates_table_regardless_of_position() {
        // Several container levels; only one container's first entry is a
        // keyed table of export modules.
        let tables = [
            json!({
                "mods": {"12": {"exports": {"Chat": {}, "Msg": {}}}},
                "later": {"0": {"exports": {}}},
            }),
            json!({
                "scalars": {"0": 1},
                "empty": {},
                "wrapped": {"x": {"noExports": true}},
                "mods": {"12": {"exports": {"Chat": {}, "Msg": {}}}},
            }),
        ];

        for root in &tables {
            let resolved = scan(root, &[store_probe()]);
            assert_eq!(resolved.len(), 1, "root: {root}");
            assert_eq!(resolved[0].pointer, "/mods/12/exports");
            assert_eq!(
                root.pointer(&resolved[0].pointer).unwrap()["Chat"],
                json!({})
            );
        }
    }

    #[test]
    fn test_first_match_wins_on_iteration_order() {
        let root = json!({
            "mods": {
                "1": {"exports": {"Chat": {}, "Msg": {}, "tag": "early"}},
                "2": {"exports": {"Chat": {}, "Msg": {}, "tag": "late"}},
            },
        });
        let resolved = scan(&root, &[store_probe()]);
        assert_eq!(resolved[0].pointer, "/mods/1/exports");
    }

    #[test]
    fn test_unmatched_probe_is_absent_not_an_error() {
        let root = json!({
            "mods": {"1": {"exports": {"Chat": {}, "Msg": {}}}},
        });
        let resolved = scan(&root, &[store_probe(), query_probe()]);
        assert_eq!(resolved.len(), 1);
        assert!(resolved.iter().all(|r| r.id != "query"));
    }

    #[test]
    fn test_wrong_shape_container_never_evaluated() {
        // B's first entry is a scalar, so B is rejected on shape alone and the
        // facade binds to A's exports.
        let root = json!({
            "A": {"0": {"exports": {"Chat": {}, "Msg": {}}}},
            "B": {"0": 1},
        });
        let resolved = scan(&root, &[store_probe()]);
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].pointer, "/A/0/exports");
    }

    #[test]
    fn test_no_module_table_soft_fails_empty() {
        let root = json!({"A": {"0": 1}, "B": "nope"});
        assert!(scan(&root, &[store_probe()]).is_empty());
        assert!(scan(&json!(42), &[store_probe()]).is_empty());
    }

    #[test]
    fn test_null_exports_skipped() {
        let root = json!({
            "mods": {
                "1": {"exports": {"placeholder": true}},
                "2": {"exports": null},
                "3": {"exports": {"Chat": {}, "Msg": {}}},
            },
        });
        let resolved = scan(&root, &[store_probe()]);
        assert_eq!(resolved[0].pointer, "/mods/3/exports");
    }

    #[test]
    fn test_default_probe_set_resolves_sub_properties() {
        let root = json!({
            "mods": {
                "1": {"exports": {"Chat": {"models": []}, "Msg": {"models": []}}},
                "2": {"exports": {"default": {"ref": "r", "refTTL": 30}}},
                "3": {"exports": {"queryExist": {"$fn": 1}}},
            },
        });
        let resolved = scan(&root, &default_probes());
        let pointer_of = |id: &str| {
            resolved
                .iter()
                .find(|r| r.id == id)
                .map(|r| r.pointer.clone())
        };
        assert_eq!(pointer_of(BASE_CAPABILITY).as_deref(), Some("/mods/1/exports"));
        assert_eq!(pointer_of("conn").as_deref(), Some("/mods/2/exports/default"));
        assert_eq!(pointer_of("query").as_deref(), Some("/mods/3/exports"));
        assert_eq!(pointer_of("group_api"), None);
    }

    #[test]
    fn test_pointer_segment_escaping() {
        let root = json!({
            "a/b": {"x~y": {"exports": {"Chat": {}, "Msg": {}}}},
        });
        let resolved = scan(&root, &[store_probe()]);
        assert_eq!(resolved[0].pointer, "/a~1b/x~0y/exports");
        assert!(root.pointer(&resolved[0].pointer).is_some());
    }
}
