//! Gateway service - entity accessors composed from the core mechanisms,
//! exposed to the automation driver by method name.
//!
//! The gateway is an explicit context value rather than a set of globals: it
//! owns the host capture, the facade store and the read-cursor table, and
//! every operation threads through it. It is the single writer of all three.
//!
//! CHANGELOG:
//! - 08/27/2026 - Dispatch table and callback delivery
//! - 08/26/2026 - Initial implementation

use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::cursor::{MessageView, ReadCursorTracker};
use crate::domain::records::is_new_message;
use crate::domain::{
    canonical_id, ChatRecord, ContactRecord, DomainArena, GroupMetadataRecord, LiveMessage,
    MessageRecord,
};
use crate::error::{Result, ShimError};
use crate::facade::FacadeStore;
use crate::host::HostState;
use crate::registry::probe::BASE_CAPABILITY;
use crate::registry::{default_probes, scan};

/// Unread messages of one conversation, newest first.
#[derive(Debug, Serialize)]
pub struct UnreadBatch {
    pub chat: ChatRecord,
    pub messages: Vec<MessageRecord>,
}

/// Context value threaded through every shim operation.
pub struct Gateway {
    host: HostState,
    facade: FacadeStore,
    cursors: ReadCursorTracker,
}

impl Gateway {
    /// Attach to a host capture and run the registry scan once.
    ///
    /// A capture without the module-table shape leaves the facade empty;
    /// every dependent operation then fails with `CapabilityUnavailable`
    /// instead of attach itself failing.
    pub fn attach(root: Value) -> Self {
        let resolved = scan(&root, &default_probes());
        let mut facade = FacadeStore::new();
        facade.assemble(resolved);
        info!(capabilities = ?facade.names(), "gateway attached");

        Self {
            host: HostState::new(root),
            facade,
            cursors: ReadCursorTracker::new(),
        }
    }

    /// Resolved capability names, scan order.
    pub fn capabilities(&self) -> Vec<&'static str> {
        self.facade.names()
    }

    // ========================================================================
    // Store access
    // ========================================================================

    fn store(&self) -> Result<&Value> {
        self.facade.base(self.host.root())
    }

    fn store_pointer(&self) -> Result<String> {
        self.facade
            .pointer(BASE_CAPABILITY)
            .map(str::to_string)
            .ok_or_else(|| ShimError::CapabilityUnavailable(BASE_CAPABILITY.to_string()))
    }

    /// The `models` array of a store collection; missing collections read as
    /// empty rather than failing.
    fn collection(&self, name: &str) -> Result<&[Value]> {
        let store = self.store()?;
        Ok(store
            .get(name)
            .and_then(|c| c.get("models"))
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[]))
    }

    /// Index of the model whose id normalizes to `canonical`.
    fn model_index(&self, collection: &str, canonical: &str) -> Result<Option<usize>> {
        Ok(self.collection(collection)?.iter().position(|m| {
            m.get("id")
                .and_then(canonical_id)
                .is_some_and(|id| id == canonical)
        }))
    }

    fn arena(&self) -> Result<DomainArena> {
        Ok(DomainArena::from_store(self.store()?))
    }

    // ========================================================================
    // Contacts
    // ========================================================================

    /// Contacts from the host address book (my-contact entries only).
    pub fn contacts(&self) -> Result<Vec<ContactRecord>> {
        Ok(self
            .arena()?
            .contacts()
            .iter()
            .filter(|c| c.is_my_contact)
            .cloned()
            .collect())
    }

    pub fn contact(&self, id: &Value) -> Result<Option<ContactRecord>> {
        let Some(canonical) = canonical_id(id) else {
            return Ok(None);
        };
        Ok(self.arena()?.contact(&canonical).cloned())
    }

    pub fn contact_by_name(&self, name: &str) -> Result<Option<ContactRecord>> {
        Ok(self.arena()?.contact_by_name(name).cloned())
    }

    /// The logged-in user.
    pub fn me(&self) -> Result<Option<ContactRecord>> {
        Ok(self.arena()?.me().cloned())
    }

    // ========================================================================
    // Chats
    // ========================================================================

    pub fn chats(&self) -> Result<Vec<ChatRecord>> {
        Ok(self
            .collection("Chat")?
            .iter()
            .filter_map(ChatRecord::from_live)
            .collect())
    }

    pub fn chat(&self, id: &Value) -> Result<Option<ChatRecord>> {
        let Some(canonical) = canonical_id(id) else {
            return Ok(None);
        };
        Ok(self.arena()?.chat(&canonical).cloned())
    }

    // ========================================================================
    // Group metadata
    // ========================================================================

    pub fn group_metadata_all(&self) -> Result<Vec<GroupMetadataRecord>> {
        Ok(self
            .collection("GroupMetadata")?
            .iter()
            .filter_map(GroupMetadataRecord::from_live)
            .collect())
    }

    /// Group metadata by id, completing a stale refresh first if the host
    /// flagged the model. A failed refresh propagates as `StaleData`.
    pub async fn group_metadata(&mut self, id: &Value) -> Result<Option<GroupMetadataRecord>> {
        let Some(canonical) = canonical_id(id) else {
            return Ok(None);
        };
        let Some(idx) = self.model_index("GroupMetadata", &canonical)? else {
            return Ok(None);
        };

        let pointer = format!("{}/GroupMetadata/models/{idx}", self.store_pointer()?);
        self.host.refresh_stale(&pointer).await?;

        Ok(self
            .host
            .at(&pointer)
            .and_then(GroupMetadataRecord::from_live))
    }

    pub async fn group_participant_ids(&mut self, id: &Value) -> Result<Vec<String>> {
        Ok(self
            .group_metadata(id)
            .await?
            .map(|g| g.participants.into_iter().map(|p| p.id).collect())
            .unwrap_or_default())
    }

    pub async fn group_admins(&mut self, id: &Value) -> Result<Vec<String>> {
        Ok(self
            .group_metadata(id)
            .await?
            .map(|g| {
                g.participants
                    .into_iter()
                    .filter(|p| p.is_admin)
                    .map(|p| p.id)
                    .collect()
            })
            .unwrap_or_default())
    }

    pub async fn group_owner(&mut self, id: &Value) -> Result<Option<String>> {
        Ok(self.group_metadata(id).await?.and_then(|g| g.owner))
    }

    // ========================================================================
    // Messages
    // ========================================================================

    /// All messages of a chat in host order, system messages skipped,
    /// self-authored included only on request.
    ///
    /// Listing counts as reading: the conversation's cursor advances to now,
    /// so a later unread scan does not re-report what the caller just saw.
    pub fn messages_in_chat(&mut self, id: &Value, include_me: bool) -> Result<Option<Vec<MessageRecord>>> {
        let Some(canonical) = canonical_id(id) else {
            return Ok(None);
        };
        let Some(idx) = self.model_index("Chat", &canonical)? else {
            return Ok(None);
        };

        let chat = &self.collection("Chat")?[idx];
        let msgs = chat
            .pointer("/msgs/models")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[]);

        let records = msgs
            .iter()
            .filter(|m| {
                let view = LiveMessage(m);
                !view.is_system() && (include_me || !view.from_me())
            })
            .filter_map(MessageRecord::from_live)
            .collect();

        self.cursors.advance(&canonical, Utc::now().timestamp());
        Ok(Some(records))
    }

    /// Unread messages of one chat by the host's own seen flags, newest
    /// first. Consuming a message flips its seen flag - the second
    /// sanctioned mutation.
    pub fn unread_in_chat(&mut self, id: &Value) -> Result<Option<Vec<MessageRecord>>> {
        let Some(canonical) = canonical_id(id) else {
            return Ok(None);
        };
        let Some(idx) = self.model_index("Chat", &canonical)? else {
            return Ok(None);
        };
        let msgs_pointer = format!("{}/Chat/models/{idx}/msgs/models", self.store_pointer()?);

        let mut consumed: Vec<usize> = Vec::new();
        let mut records: Vec<MessageRecord> = Vec::new();
        if let Some(msgs) = self.host.at(&msgs_pointer).and_then(Value::as_array) {
            for (i, model) in msgs.iter().enumerate().rev() {
                if !is_new_message(model) {
                    continue;
                }
                if let Some(record) = MessageRecord::from_live(model) {
                    consumed.push(i);
                    records.push(record);
                }
            }
        }

        for i in consumed {
            self.host.clear_seen_flag(&format!("{msgs_pointer}/{i}"))?;
        }
        Ok(Some(records))
    }

    /// Cursor-driven unread scan across every chat, batched per
    /// conversation. Each conversation's cursor advances to now, so a batch
    /// is returned at most once.
    pub fn unread_messages(&mut self) -> Result<Vec<UnreadBatch>> {
        let now = Utc::now().timestamp();
        let store = self.facade.base(self.host.root())?;
        let chats = store
            .get("Chat")
            .and_then(|c| c.get("models"))
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[]);

        let mut batches = Vec::new();
        for model in chats {
            let Some(chat) = ChatRecord::from_live(model) else {
                continue;
            };
            let msgs = model
                .pointer("/msgs/models")
                .and_then(Value::as_array)
                .map(Vec::as_slice)
                .unwrap_or(&[]);

            // Host keeps messages oldest-first; the scan wants newest-first.
            let views: Vec<LiveMessage> = msgs.iter().rev().map(LiveMessage).collect();
            let unread = self.cursors.unread_since(&chat.id, &views, now);

            let records: Vec<MessageRecord> = unread
                .into_iter()
                .filter_map(|i| MessageRecord::from_live(views[i].0))
                .collect();
            if !records.is_empty() {
                debug!(chat = %chat.id, count = records.len(), "unread batch");
                batches.push(UnreadBatch { chat, messages: records });
            }
        }
        Ok(batches)
    }

    /// Set every known conversation's cursor to now.
    pub fn mark_all_read(&mut self) {
        self.cursors.mark_all_read(Utc::now().timestamp());
    }

    /// Send a message through the host's send capability. Returns whether a
    /// chat matched the identifier.
    pub fn send_message(&mut self, id: &Value, body: &str) -> Result<bool> {
        let Some(canonical) = canonical_id(id) else {
            return Ok(false);
        };
        let Some(idx) = self.model_index("Chat", &canonical)? else {
            return Ok(false);
        };

        let now = Utc::now().timestamp();
        let message = json!({
            "id": {"_serialized": format!("true_{canonical}_{now}")},
            "t": now,
            "fromMe": true,
            "isNewMsg": false,
            "isNotification": false,
            "all": {
                "id": {"_serialized": format!("true_{canonical}_{now}")},
                "t": now,
                "body": body,
                "chat": {"all": {"id": canonical.clone()}},
            },
        });

        let pointer = format!("{}/Chat/models/{idx}/msgs/models", self.store_pointer()?);
        self.host.push_message(&pointer, message)?;
        Ok(true)
    }

    // ========================================================================
    // Driver boundary
    // ========================================================================

    /// Invoke an operation by name with serializable arguments. Everything
    /// returned is plain data; lookups that match nothing return null or an
    /// empty list.
    pub async fn dispatch(&mut self, method: &str, params: &Value) -> Result<Value> {
        match method {
            "capabilities" => Ok(json!({
                "assembled": self.facade.is_assembled(),
                "resolved": self.facade.names(),
            })),
            "contacts" => Ok(to_json(&self.contacts()?)),
            "contact" => Ok(to_json(&self.contact(id_param(params)?)?)),
            "contact_by_name" => {
                let name = str_param(params, "name")?;
                Ok(to_json(&self.contact_by_name(name)?))
            }
            "me" => Ok(to_json(&self.me()?)),
            "chats" => Ok(to_json(&self.chats()?)),
            "chat" => Ok(to_json(&self.chat(id_param(params)?)?)),
            "group_metadata_all" => Ok(to_json(&self.group_metadata_all()?)),
            "group_metadata" => {
                let id = id_param(params)?.clone();
                Ok(to_json(&self.group_metadata(&id).await?))
            }
            "group_participants" => {
                let id = id_param(params)?.clone();
                Ok(to_json(&self.group_participant_ids(&id).await?))
            }
            "group_admins" => {
                let id = id_param(params)?.clone();
                Ok(to_json(&self.group_admins(&id).await?))
            }
            "group_owner" => {
                let id = id_param(params)?.clone();
                Ok(to_json(&self.group_owner(&id).await?))
            }
            "messages" => {
                let include_me = params
                    .get("include_me")
                    .and_then(Value::as_bool)
                    .unwrap_or(false);
                Ok(to_json(&self.messages_in_chat(id_param(params)?, include_me)?))
            }
            "unread_chat" => {
                let id = id_param(params)?.clone();
                Ok(to_json(&self.unread_in_chat(&id)?))
            }
            "unread" => Ok(to_json(&self.unread_messages()?)),
            "mark_all_read" => {
                self.mark_all_read();
                Ok(Value::Bool(true))
            }
            "send" => {
                let id = id_param(params)?.clone();
                let body = str_param(params, "body")?.to_string();
                Ok(Value::Bool(self.send_message(&id, &body)?))
            }
            other => Err(ShimError::UnknownMethod(other.to_string())),
        }
    }

    /// Callback calling convention: the result is delivered through `done`
    /// instead of being returned.
    pub async fn invoke_with<F>(&mut self, method: &str, params: &Value, done: F)
    where
        F: FnOnce(Result<Value>),
    {
        let result = self.dispatch(method, params).await;
        done(result);
    }
}

fn to_json<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

fn id_param(params: &Value) -> Result<&Value> {
    params.get("id").ok_or(ShimError::InvalidParam {
        name: "id",
        reason: "missing".to_string(),
    })
}

fn str_param<'a>(params: &'a Value, name: &'static str) -> Result<&'a str> {
    params
        .get(name)
        .and_then(Value::as_str)
        .ok_or(ShimError::InvalidParam { name, reason: "missing or not a string".to_string() })
}
