//! Typed events consumed by the synchronized store.
//!
//! The transport layer decodes its payloads into [`StoreEvent`] values and
//! delivers them one at a time. The serde names follow the transport's event
//! names so JSON payloads can be decoded directly.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::chat::{ChatPatch, ConversationSummary};
use crate::contact::Contact;
use crate::group::{GroupMetadata, GroupParticipant, GroupPatch, ParticipantAction};
use crate::message::{MessageKey, MessagePatch, MessageRecord, Reaction, UserReceipt};
use crate::presence::PresenceData;

/// All events the store reconciles.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum StoreEvent {
    /// Bulk history snapshot delivered on (re)connection.
    #[serde(rename = "messaging-history.set")]
    HistorySet(HistorySet),

    /// Presence change of the participants of one conversation.
    #[serde(rename = "presence.update")]
    PresenceUpdate {
        id: String,
        presences: HashMap<String, PresenceData>,
    },

    #[serde(rename = "contacts.upsert")]
    ContactsUpsert(Vec<Contact>),

    #[serde(rename = "contacts.update")]
    ContactsUpdate(Vec<Contact>),

    #[serde(rename = "chats.upsert")]
    ChatsUpsert(Vec<ConversationSummary>),

    #[serde(rename = "chats.update")]
    ChatsUpdate(Vec<ChatPatch>),

    #[serde(rename = "chats.delete")]
    ChatsDelete(Vec<String>),

    #[serde(rename = "messages.upsert")]
    MessagesUpsert {
        messages: Vec<MessageRecord>,
        #[serde(rename = "type")]
        kind: UpsertKind,
    },

    #[serde(rename = "messages.update")]
    MessagesUpdate(Vec<MessageUpdate>),

    #[serde(rename = "messages.delete")]
    MessagesDelete(MessageDeletion),

    #[serde(rename = "group-participants.update")]
    GroupParticipantsUpdate {
        id: String,
        participants: Vec<GroupParticipant>,
        action: ParticipantAction,
    },

    #[serde(rename = "groups.update")]
    GroupsUpdate(Vec<GroupPatch>),

    #[serde(rename = "groups.upsert")]
    GroupsUpsert(Vec<GroupMetadata>),

    #[serde(rename = "message-receipt.update")]
    MessageReceiptUpdate(Vec<ReceiptUpdate>),

    #[serde(rename = "messages.reaction")]
    MessagesReaction(Vec<ReactionUpdate>),
}

impl StoreEvent {
    /// Transport name of the event, used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            StoreEvent::HistorySet(_) => "messaging-history.set",
            StoreEvent::PresenceUpdate { .. } => "presence.update",
            StoreEvent::ContactsUpsert(_) => "contacts.upsert",
            StoreEvent::ContactsUpdate(_) => "contacts.update",
            StoreEvent::ChatsUpsert(_) => "chats.upsert",
            StoreEvent::ChatsUpdate(_) => "chats.update",
            StoreEvent::ChatsDelete(_) => "chats.delete",
            StoreEvent::MessagesUpsert { .. } => "messages.upsert",
            StoreEvent::MessagesUpdate(_) => "messages.update",
            StoreEvent::MessagesDelete(_) => "messages.delete",
            StoreEvent::GroupParticipantsUpdate { .. } => "group-participants.update",
            StoreEvent::GroupsUpdate(_) => "groups.update",
            StoreEvent::GroupsUpsert(_) => "groups.upsert",
            StoreEvent::MessageReceiptUpdate(_) => "message-receipt.update",
            StoreEvent::MessagesReaction(_) => "messages.reaction",
        }
    }
}

// ---------------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------------

/// Contents of a history snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistorySet {
    #[serde(default)]
    pub chats: Vec<ConversationSummary>,
    #[serde(default)]
    pub contacts: Vec<Contact>,
    #[serde(default)]
    pub messages: Vec<MessageRecord>,
    /// Set on the most complete snapshot; everything cached before is stale.
    #[serde(default)]
    pub is_latest: Option<bool>,
    #[serde(default)]
    pub sync_type: Option<HistorySyncType>,
}

/// Kind of history synchronisation that produced a snapshot.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(try_from = "i32", into = "i32")]
pub enum HistorySyncType {
    InitialBootstrap,
    InitialStatusV3,
    Full,
    Recent,
    PushName,
    NonBlockingData,
    OnDemand,
}

impl TryFrom<i32> for HistorySyncType {
    type Error = String;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::InitialBootstrap),
            1 => Ok(Self::InitialStatusV3),
            2 => Ok(Self::Full),
            3 => Ok(Self::Recent),
            4 => Ok(Self::PushName),
            5 => Ok(Self::NonBlockingData),
            6 => Ok(Self::OnDemand),
            other => Err(format!("unknown history sync type: {other}")),
        }
    }
}

impl From<HistorySyncType> for i32 {
    fn from(value: HistorySyncType) -> Self {
        match value {
            HistorySyncType::InitialBootstrap => 0,
            HistorySyncType::InitialStatusV3 => 1,
            HistorySyncType::Full => 2,
            HistorySyncType::Recent => 3,
            HistorySyncType::PushName => 4,
            HistorySyncType::NonBlockingData => 5,
            HistorySyncType::OnDemand => 6,
        }
    }
}

/// How a batch of upserted messages reached the client.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UpsertKind {
    /// Older messages appended to history (sent from another device, resync).
    Append,
    /// New messages the user should be notified about.
    Notify,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageUpdate {
    pub key: MessageKey,
    pub update: MessagePatch,
}

/// Deletion request: a whole conversation, or specific messages.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum MessageDeletion {
    Keys { keys: Vec<MessageKey> },
    All { jid: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiptUpdate {
    pub key: MessageKey,
    pub receipt: UserReceipt,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReactionUpdate {
    pub key: MessageKey,
    pub reaction: Reaction,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_messages_upsert() {
        let raw = serde_json::json!({
            "event": "messages.upsert",
            "data": {
                "type": "notify",
                "messages": [{
                    "key": { "remoteJid": "123@s.whatsapp.net", "id": "M1", "fromMe": false },
                    "messageTimestamp": 1000
                }]
            }
        });
        let event: StoreEvent = serde_json::from_value(raw).unwrap();
        match event {
            StoreEvent::MessagesUpsert { messages, kind } => {
                assert_eq!(kind, UpsertKind::Notify);
                assert_eq!(messages[0].message_timestamp, Some(1000));
            }
            other => panic!("unexpected event {}", other.name()),
        }
    }

    #[test]
    fn test_decode_deletions() {
        let all: MessageDeletion =
            serde_json::from_value(serde_json::json!({ "jid": "g1@g.us", "all": true })).unwrap();
        assert_eq!(all, MessageDeletion::All { jid: "g1@g.us".into() });

        let keys: MessageDeletion = serde_json::from_value(serde_json::json!({
            "keys": [{ "remoteJid": "g1@g.us", "id": "A" }]
        }))
        .unwrap();
        assert!(matches!(keys, MessageDeletion::Keys { keys } if keys.len() == 1));
    }

    #[test]
    fn test_history_sync_type_from_number() {
        let set: HistorySet =
            serde_json::from_value(serde_json::json!({ "syncType": 6, "isLatest": false })).unwrap();
        assert_eq!(set.sync_type, Some(HistorySyncType::OnDemand));
        assert!(serde_json::from_value::<HistorySet>(serde_json::json!({ "syncType": 42 })).is_err());
    }

    #[test]
    fn test_unknown_upsert_kind() {
        let kind: UpsertKind = serde_json::from_value(serde_json::json!("prepend")).unwrap();
        assert_eq!(kind, UpsertKind::Other);
    }
}
