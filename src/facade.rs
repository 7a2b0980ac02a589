//! Facade store - resolved host capabilities under stable logical names.
//!
//! Owned by the gateway context rather than living in a process global; the
//! gateway is the single writer and populates it exactly once. Capabilities
//! are stored as JSON pointers into the host capture, resolved at use time,
//! so consumers always see the live objects.
//!
//! CHANGELOG:
//! - 08/26/2026 - Initial implementation

use serde_json::Value;
use tracing::debug;

use crate::error::ShimError;
use crate::registry::probe::BASE_CAPABILITY;
use crate::registry::ResolvedCapability;

/// Write-once mapping from logical capability name to its location in the
/// host capture. Either empty or fully assembled from one scan pass - never
/// partially rebuilt.
#[derive(Debug, Default)]
pub struct FacadeStore {
    capabilities: Vec<ResolvedCapability>,
    assembled: bool,
}

impl FacadeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Populate from a scan pass. A second call on an already-assembled store
    /// is a no-op, which also makes the enclosing scan idempotent.
    pub fn assemble(&mut self, resolved: Vec<ResolvedCapability>) {
        if self.assembled {
            debug!("facade already assembled; ignoring re-scan");
            return;
        }
        self.capabilities = resolved;
        self.assembled = true;
    }

    /// Whether a scan pass has run (even one that resolved nothing).
    pub fn is_assembled(&self) -> bool {
        self.assembled
    }

    /// Whether any capability resolved. An assembled-but-empty facade is the
    /// soft-fail state: every dependent operation reports
    /// `CapabilityUnavailable` instead of the scan crashing.
    pub fn is_empty(&self) -> bool {
        self.capabilities.is_empty()
    }

    /// Pointer for a capability, if it resolved. Consumers must treat absence
    /// as "feature unavailable", never as fatal.
    pub fn pointer(&self, id: &str) -> Option<&str> {
        self.capabilities
            .iter()
            .find(|c| c.id == id)
            .map(|c| c.pointer.as_str())
    }

    /// Resolve a capability against the host capture root.
    pub fn capability<'a>(&self, root: &'a Value, id: &str) -> Result<&'a Value, ShimError> {
        let pointer = self
            .pointer(id)
            .ok_or_else(|| ShimError::CapabilityUnavailable(id.to_string()))?;
        root.pointer(pointer)
            .ok_or_else(|| ShimError::CapabilityUnavailable(id.to_string()))
    }

    /// Resolve the designated base capability.
    pub fn base<'a>(&self, root: &'a Value) -> Result<&'a Value, ShimError> {
        self.capability(root, BASE_CAPABILITY)
    }

    /// Resolved logical names, in scan order.
    pub fn names(&self) -> Vec<&'static str> {
        self.capabilities.iter().map(|c| c.id).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn resolved(id: &'static str, pointer: &str) -> ResolvedCapability {
        ResolvedCapability { id, pointer: pointer.to_string() }
    }

    #[test]
    fn test_second_assembly_is_noop() {
        let mut facade = FacadeStore::new();
        facade.assemble(vec![resolved("store", "/a")]);
        facade.assemble(vec![resolved("store", "/b"), resolved("query", "/c")]);
        assert_eq!(facade.pointer("store"), Some("/a"));
        assert_eq!(facade.pointer("query"), None);
    }

    #[test]
    fn test_missing_capability_reports_unavailable() {
        let mut facade = FacadeStore::new();
        facade.assemble(Vec::new());
        assert!(facade.is_assembled());
        assert!(facade.is_empty());

        let err = facade.capability(&json!({}), "query").unwrap_err();
        assert!(matches!(err, ShimError::CapabilityUnavailable(ref id) if id == "query"));
    }

    #[test]
    fn test_capability_resolves_live_value() {
        let root = json!({"mods": {"1": {"exports": {"Chat": {"models": []}}}}});
        let mut facade = FacadeStore::new();
        facade.assemble(vec![resolved("store", "/mods/1/exports")]);

        let store = facade.base(&root).unwrap();
        assert!(store.get("Chat").is_some());
    }
}
