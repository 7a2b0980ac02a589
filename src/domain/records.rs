//! Typed snapshot records built from flattened live models.
//!
//! Each builder takes a live host object, flattens it one level, and extracts
//! plain fields plus identifier references. A record never mutates the live
//! object it was derived from.
//!
//! CHANGELOG:
//! - 08/27/2026 - Message/chat relationship fields reduced to id references
//! - 08/26/2026 - Initial implementation

use serde::Serialize;
use serde_json::Value;

use crate::cursor::MessageView;
use crate::domain::id::{canonical_id, EntityId};
use crate::flatten::{flatten, flatten_model, strip_back_refs};

/// A contact from the host address book.
#[derive(Debug, Clone, Serialize)]
pub struct ContactRecord {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub is_my_contact: bool,
    pub is_me: bool,
}

impl ContactRecord {
    /// Build from a live contact model.
    pub fn from_live(model: &Value) -> Option<Self> {
        let bag = flatten_model(model);
        let id = canonical_id(bag.get("id").or_else(|| model.get("id"))?)?;
        Some(Self {
            id,
            name: bag.get("name").and_then(Value::as_str).map(str::to_string),
            is_my_contact: bool_field(&bag, "isMyContact"),
            is_me: bool_field(&bag, "isMe"),
        })
    }
}

/// A conversation, direct or group.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRecord {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub is_group: bool,
    /// Identifier references into the chat's message list, host order.
    pub message_ids: Vec<String>,
}

impl ChatRecord {
    pub fn from_live(model: &Value) -> Option<Self> {
        let mut bag = flatten_model(model);
        strip_back_refs(&mut bag);

        let id = canonical_id(bag.get("id").or_else(|| model.get("id"))?)?;
        let message_ids = model
            .pointer("/msgs/models")
            .and_then(Value::as_array)
            .map(|models| {
                models
                    .iter()
                    .filter_map(|m| m.get("id").and_then(canonical_id))
                    .collect()
            })
            .unwrap_or_default();

        Some(Self {
            is_group: EntityId::parse(&id).is_some_and(|e| e.is_group()),
            name: bag.get("name").and_then(Value::as_str).map(str::to_string),
            id,
            message_ids,
        })
    }
}

/// A group participant reference.
#[derive(Debug, Clone, Serialize)]
pub struct ParticipantRecord {
    pub id: String,
    pub is_admin: bool,
}

/// Group metadata after any required stale refresh.
#[derive(Debug, Clone, Serialize)]
pub struct GroupMetadataRecord {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    pub participants: Vec<ParticipantRecord>,
}

impl GroupMetadataRecord {
    pub fn from_live(model: &Value) -> Option<Self> {
        // Group metadata is flattened as a whole model: participants and owner
        // live on the model itself, not inside the attribute bag.
        let flat = flatten(model);
        let id = canonical_id(flat.get("id")?)?;

        let participants = flat
            .get("participants")
            .and_then(Value::as_array)
            .map(|list| {
                list.iter()
                    .filter_map(|p| {
                        let id = p.get("id").and_then(canonical_id)?;
                        Some(ParticipantRecord { id, is_admin: bool_field(p, "isAdmin") })
                    })
                    .collect()
            })
            .unwrap_or_default();

        Some(Self {
            id,
            subject: flat
                .get("subject")
                .or_else(|| flat.get("all").and_then(|b| b.get("subject")))
                .and_then(Value::as_str)
                .map(str::to_string),
            owner: flat.get("owner").and_then(canonical_id),
            participants,
        })
    }
}

/// A single message, relationships as identifier references.
#[derive(Debug, Clone, Serialize)]
pub struct MessageRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Chat this message belongs to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chat: Option<String>,
    /// Sender identity.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender: Option<String>,
    /// Epoch seconds.
    pub t: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    pub from_me: bool,
    pub is_notification: bool,
}

impl MessageRecord {
    pub fn from_live(model: &Value) -> Option<Self> {
        let mut bag = flatten_model(model);
        strip_back_refs(&mut bag);
        let live = LiveMessage(model);

        // senderObj/chat were materialized to their attribute bags by the
        // flatten pass; only their identifier references survive here.
        let sender = bag
            .pointer("/senderObj/id")
            .or_else(|| bag.get("sender"))
            .and_then(canonical_id);
        let chat = bag.pointer("/chat/id").and_then(canonical_id);

        Some(Self {
            id: bag.get("id").or_else(|| model.get("id")).and_then(canonical_id),
            chat,
            sender,
            t: live.timestamp(),
            body: bag.get("body").and_then(Value::as_str).map(str::to_string),
            from_me: live.from_me(),
            is_notification: live.is_system(),
        })
    }
}

/// Adapter exposing a live message model to the read-cursor tracker.
pub struct LiveMessage<'a>(pub &'a Value);

impl MessageView for LiveMessage<'_> {
    fn timestamp(&self) -> i64 {
        self.0
            .get("t")
            .or_else(|| self.0.pointer("/all/t"))
            .and_then(Value::as_i64)
            .unwrap_or(0)
    }

    fn from_me(&self) -> bool {
        // Host versions differ on where the authorship flag lives.
        self.0
            .get("fromMe")
            .or_else(|| self.0.pointer("/id/fromMe"))
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    fn is_system(&self) -> bool {
        bool_field(self.0, "isNotification")
    }
}

/// Whether a message is flagged new by the host. Anything but an explicit
/// boolean counts as not-new.
pub fn is_new_message(model: &Value) -> bool {
    model.get("isNewMsg").and_then(Value::as_bool).unwrap_or(false)
}

fn bool_field(obj: &Value, key: &str) -> bool {
    obj.get(key).and_then(Value::as_bool).unwrap_or(false)
}
