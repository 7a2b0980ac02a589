//! Record arena - domain records addressed by stable identifier.
//!
//! Built from the resolved base capability's collections; relationships stay
//! identifier references, so the arena is acyclic by construction.
//!
//! CHANGELOG:
//! - 08/27/2026 - Initial implementation

use serde_json::Value;

use crate::domain::records::{ChatRecord, ContactRecord, GroupMetadataRecord};

/// All domain records extracted from one read of the host store.
///
/// Messages stay on their live models; a chat keeps only identifier
/// references to them, so the arena never pays to build records nobody
/// reads.
#[derive(Debug, Default)]
pub struct DomainArena {
    contacts: Vec<ContactRecord>,
    chats: Vec<ChatRecord>,
    groups: Vec<GroupMetadataRecord>,
}

impl DomainArena {
    /// Build from the live store module (the base capability's exports).
    pub fn from_store(store: &Value) -> Self {
        let contacts = models(store, "Contact")
            .iter()
            .filter_map(ContactRecord::from_live)
            .collect();
        let chats = models(store, "Chat")
            .iter()
            .filter_map(ChatRecord::from_live)
            .collect();
        let groups = models(store, "GroupMetadata")
            .iter()
            .filter_map(GroupMetadataRecord::from_live)
            .collect();

        Self { contacts, chats, groups }
    }

    pub fn contacts(&self) -> &[ContactRecord] {
        &self.contacts
    }

    pub fn chats(&self) -> &[ChatRecord] {
        &self.chats
    }

    pub fn groups(&self) -> &[GroupMetadataRecord] {
        &self.groups
    }

    pub fn contact(&self, id: &str) -> Option<&ContactRecord> {
        self.contacts.iter().find(|c| c.id == id)
    }

    pub fn contact_by_name(&self, name: &str) -> Option<&ContactRecord> {
        self.contacts.iter().find(|c| c.name.as_deref() == Some(name))
    }

    /// The logged-in user's own contact record.
    pub fn me(&self) -> Option<&ContactRecord> {
        self.contacts.iter().find(|c| c.is_me)
    }

    pub fn chat(&self, id: &str) -> Option<&ChatRecord> {
        self.chats.iter().find(|c| c.id == id)
    }

    pub fn group(&self, id: &str) -> Option<&GroupMetadataRecord> {
        self.groups.iter().find(|g| g.id == id)
    }
}

/// The `models` array of a store collection, or empty.
fn models<'a>(store: &'a Value, collection: &str) -> &'a [Value] {
    store
        .get(collection)
        .and_then(|c| c.get("models"))
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store() -> Value {
        json!({
            "Contact": {"models": [
                {"all": {"id": "me@host", "name": "Me", "isMe": true, "isMyContact": true}},
                {"all": {"id": "alice@host", "name": "Alice", "isMyContact": true}},
            ]},
            "Chat": {"models": [
                {
                    "id": "alice@host",
                    "all": {"id": "alice@host", "name": "Alice"},
                    "msgs": {"models": [
                        {"id": "m1", "t": 10, "fromMe": false,
                         "all": {"id": "m1", "body": "hi", "chat": {"all": {"id": "alice@host"}}}},
                    ]},
                },
            ]},
            "GroupMetadata": {"models": [
                {"id": "team@g.host", "participants": [{"id": "alice@host", "isAdmin": true}]},
            ]},
            "Msg": {"models": []},
        })
    }

    #[test]
    fn test_arena_builds_all_record_kinds() {
        let arena = DomainArena::from_store(&store());
        assert_eq!(arena.contacts().len(), 2);
        assert_eq!(arena.chats().len(), 1);
        assert_eq!(arena.groups().len(), 1);
        assert_eq!(arena.me().unwrap().id, "me@host");
        assert_eq!(arena.contact_by_name("Alice").unwrap().id, "alice@host");
    }

    #[test]
    fn test_chat_keeps_id_references_only() {
        // Messages are not materialized; the chat record carries their ids.
        let arena = DomainArena::from_store(&store());
        let chat = arena.chat("alice@host").unwrap();
        assert_eq!(chat.message_ids, vec!["m1"]);
        assert!(arena.chat("nobody@host").is_none());
    }
}
