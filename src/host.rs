//! Host state - the captured runtime of the messaging client.
//!
//! The capture is treated as read-only except for the two sanctioned
//! mutations: appending a sent message to a chat's collection and flipping a
//! message's seen flag during an unread scan. Everything else reads through
//! JSON pointers handed out by the facade.
//!
//! CHANGELOG:
//! - 08/27/2026 - Stale group refresh
//! - 08/26/2026 - Initial implementation

use serde_json::Value;

use crate::error::ShimError;

/// Owns the host capture root. The registry scanner and the facade's
/// capability pointers both address into this document.
#[derive(Debug)]
pub struct HostState {
    root: Value,
}

impl HostState {
    pub fn new(root: Value) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Value {
        &self.root
    }

    /// Live object at `pointer`, if present.
    pub fn at(&self, pointer: &str) -> Option<&Value> {
        self.root.pointer(pointer)
    }

    /// Sanctioned mutation: append a message to the collection at
    /// `collection_pointer` (a `models` array).
    pub fn push_message(&mut self, collection_pointer: &str, message: Value) -> Result<(), ShimError> {
        let models = self
            .root
            .pointer_mut(collection_pointer)
            .and_then(|v| v.as_array_mut())
            .ok_or_else(|| {
                ShimError::MalformedSnapshot(format!("no message collection at {collection_pointer}"))
            })?;
        models.push(message);
        Ok(())
    }

    /// Sanctioned mutation: mark the message at `pointer` as seen.
    pub fn clear_seen_flag(&mut self, pointer: &str) -> Result<(), ShimError> {
        let msg = self
            .root
            .pointer_mut(pointer)
            .and_then(|v| v.as_object_mut())
            .ok_or_else(|| ShimError::MalformedSnapshot(format!("no message at {pointer}")))?;
        msg.insert("isNewMsg".to_string(), Value::Bool(false));
        Ok(())
    }

    /// Complete a stale metadata object's host-asynchronous refresh before it
    /// is read.
    ///
    /// A non-stale object is left alone. On success the pending attributes are
    /// merged into the model and the stale flag drops; on failure the error
    /// propagates once to the caller, uncaught - there is no retry.
    pub async fn refresh_stale(&mut self, pointer: &str) -> Result<(), ShimError> {
        let is_stale = self
            .at(pointer)
            .and_then(|m| m.get("stale"))
            .and_then(Value::as_bool)
            .unwrap_or(false);
        if !is_stale {
            return Ok(());
        }

        // The host completes refreshes asynchronously; control returns to the
        // cooperative loop once before the refreshed object is read.
        tokio::task::yield_now().await;

        let model = self
            .root
            .pointer_mut(pointer)
            .and_then(|v| v.as_object_mut())
            .ok_or_else(|| ShimError::MalformedSnapshot(format!("no model at {pointer}")))?;

        if let Some(reason) = model.get("refreshError").and_then(Value::as_str) {
            let id = model
                .get("id")
                .map(id_hint)
                .unwrap_or_else(|| pointer.to_string());
            return Err(ShimError::StaleData { id, reason: reason.to_string() });
        }

        if let Some(Value::Object(pending)) = model.remove("pendingUpdate") {
            for (key, value) in pending {
                model.insert(key, value);
            }
        }
        model.insert("stale".to_string(), Value::Bool(false));
        Ok(())
    }
}

/// Best-effort identifier for error messages.
fn id_hint(id: &Value) -> String {
    match id {
        Value::String(s) => s.clone(),
        other => other
            .get("_serialized")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| other.to_string()),
    }
}
