//! Message records as cached per conversation, and the merge rules applied
//! to them by update, receipt and reaction events.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::constants::{PROTOCOL_EPHEMERAL_SETTING, SELF_AUTHOR};

// ---------------------------------------------------------------------------
// Key
// ---------------------------------------------------------------------------

/// Addressing information of a message.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MessageKey {
    /// Conversation the message belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_jid: Option<String>,
    /// Whether the local user sent the message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_me: Option<bool>,
    /// Message id, unique within the conversation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Sender inside a group conversation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub participant: Option<String>,
}

impl MessageKey {
    pub fn new(remote_jid: impl Into<String>, id: impl Into<String>, from_me: bool) -> Self {
        Self {
            remote_jid: Some(remote_jid.into()),
            from_me: Some(from_me),
            id: Some(id.into()),
            participant: None,
        }
    }

    /// Author of the keyed message: `"me"`, the group participant, or the
    /// conversation itself.
    pub fn author(&self) -> &str {
        if self.from_me.unwrap_or(false) {
            return SELF_AUTHOR;
        }
        self.participant
            .as_deref()
            .or(self.remote_jid.as_deref())
            .unwrap_or_default()
    }

    /// Message id, or empty when the payload carried none.
    pub fn id_or_empty(&self) -> &str {
        self.id.as_deref().unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// Content
// ---------------------------------------------------------------------------

/// Control payload carried inside a message.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProtocolMessage {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ephemeral_expiration: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<MessageKey>,
}

/// Decoded message content. Only the protocol sub-message is typed, the rest
/// is kept verbatim.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MessageContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol_message: Option<ProtocolMessage>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

// ---------------------------------------------------------------------------
// Receipts & reactions
// ---------------------------------------------------------------------------

/// Per-recipient delivery state of a message.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserReceipt {
    pub user_jid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receipt_timestamp: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_timestamp: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub played_timestamp: Option<u64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pending_device_jid: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub delivered_device_jid: Vec<String>,
}

impl UserReceipt {
    fn merge(&mut self, incoming: UserReceipt) {
        if incoming.receipt_timestamp.is_some() {
            self.receipt_timestamp = incoming.receipt_timestamp;
        }
        if incoming.read_timestamp.is_some() {
            self.read_timestamp = incoming.read_timestamp;
        }
        if incoming.played_timestamp.is_some() {
            self.played_timestamp = incoming.played_timestamp;
        }
        if !incoming.pending_device_jid.is_empty() {
            self.pending_device_jid = incoming.pending_device_jid;
        }
        if !incoming.delivered_device_jid.is_empty() {
            self.delivered_device_jid = incoming.delivered_device_jid;
        }
    }
}

/// An emoji reaction attached to a message.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Reaction {
    /// Key of the reaction itself; identifies its author.
    #[serde(default)]
    pub key: MessageKey,
    /// Emoji; empty text withdraws the author's reaction.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_timestamp_ms: Option<i64>,
}

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// A message held in the volatile per-conversation history.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MessageRecord {
    pub key: MessageKey,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<MessageContent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_timestamp: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub push_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_stub_type: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub starred: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub user_receipt: Vec<UserReceipt>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reactions: Vec<Reaction>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MessageRecord {
    /// Identity used by the per-conversation message map.
    pub fn ident(record: &MessageRecord) -> String {
        record.key.id_or_empty().to_string()
    }

    /// New disappearing-messages duration when this message announces one.
    ///
    /// A control message without an explicit duration switches the setting
    /// off, reported as `0`.
    pub fn ephemeral_setting(&self) -> Option<u32> {
        let protocol = self.message.as_ref()?.protocol_message.as_ref()?;
        if protocol.kind == Some(PROTOCOL_EPHEMERAL_SETTING) {
            Some(protocol.ephemeral_expiration.unwrap_or(0))
        } else {
            None
        }
    }

    /// Overwrite the fields present in `patch`.
    pub fn apply_patch(&mut self, patch: &MessagePatch) {
        if let Some(message) = &patch.message {
            self.message = Some(message.clone());
        }
        if patch.message_timestamp.is_some() {
            self.message_timestamp = patch.message_timestamp;
        }
        if patch.status.is_some() {
            self.status = patch.status;
        }
        if let Some(push_name) = &patch.push_name {
            self.push_name = Some(push_name.clone());
        }
        if patch.message_stub_type.is_some() {
            self.message_stub_type = patch.message_stub_type;
        }
        if patch.starred.is_some() {
            self.starred = patch.starred;
        }
        for (field, value) in &patch.extra {
            self.extra.insert(field.clone(), value.clone());
        }
    }

    /// Merge a delivery receipt: the entry for the same user is updated in
    /// place, otherwise the receipt is appended.
    pub fn apply_receipt(&mut self, receipt: UserReceipt) {
        match self
            .user_receipt
            .iter_mut()
            .find(|r| r.user_jid == receipt.user_jid)
        {
            Some(existing) => existing.merge(receipt),
            None => self.user_receipt.push(receipt),
        }
    }

    /// Merge a reaction: an author keeps at most one reaction, and an empty
    /// text withdraws it.
    pub fn apply_reaction(&mut self, reaction: Reaction) {
        let author = reaction.key.author().to_string();
        self.reactions.retain(|r| r.key.author() != author);
        if reaction.text.as_deref().is_some_and(|t| !t.is_empty()) {
            self.reactions.push(reaction);
        }
    }
}

/// Sparse update of a cached message.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MessagePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<MessageContent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_timestamp: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub push_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_stub_type: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub starred: Option<bool>,
    /// Fields without a typed counterpart (poll updates, stub parameters).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reaction(author: &str, text: &str) -> Reaction {
        Reaction {
            key: MessageKey {
                remote_jid: Some("g1@g.us".into()),
                from_me: Some(false),
                id: Some(format!("r-{author}")),
                participant: Some(author.into()),
            },
            text: Some(text.into()),
            sender_timestamp_ms: None,
        }
    }

    #[test]
    fn test_ephemeral_setting_detected() {
        let msg: MessageRecord = serde_json::from_value(serde_json::json!({
            "key": { "remoteJid": "g1@g.us", "id": "A1" },
            "message": { "protocolMessage": { "type": 3, "ephemeralExpiration": 86400 } }
        }))
        .unwrap();
        assert_eq!(msg.ephemeral_setting(), Some(86400));

        let plain: MessageRecord = serde_json::from_value(serde_json::json!({
            "key": { "remoteJid": "g1@g.us", "id": "A2" },
            "message": { "conversation": "hello" }
        }))
        .unwrap();
        assert_eq!(plain.ephemeral_setting(), None);
        assert_eq!(
            plain.message.unwrap().other.get("conversation"),
            Some(&serde_json::json!("hello"))
        );
    }

    #[test]
    fn test_receipt_merges_per_user() {
        let mut msg = MessageRecord::default();
        msg.apply_receipt(UserReceipt {
            user_jid: "a@s.whatsapp.net".into(),
            receipt_timestamp: Some(10),
            ..Default::default()
        });
        msg.apply_receipt(UserReceipt {
            user_jid: "a@s.whatsapp.net".into(),
            read_timestamp: Some(20),
            ..Default::default()
        });
        msg.apply_receipt(UserReceipt {
            user_jid: "b@s.whatsapp.net".into(),
            ..Default::default()
        });

        assert_eq!(msg.user_receipt.len(), 2);
        assert_eq!(msg.user_receipt[0].receipt_timestamp, Some(10));
        assert_eq!(msg.user_receipt[0].read_timestamp, Some(20));
    }

    #[test]
    fn test_reaction_replaced_and_withdrawn() {
        let mut msg = MessageRecord::default();
        msg.apply_reaction(reaction("alice", "👍"));
        msg.apply_reaction(reaction("bob", "🔥"));
        msg.apply_reaction(reaction("alice", "❤️"));
        assert_eq!(msg.reactions.len(), 2);
        assert_eq!(msg.reactions[1].text.as_deref(), Some("❤️"));

        msg.apply_reaction(reaction("bob", ""));
        assert_eq!(msg.reactions.len(), 1);
        assert_eq!(msg.reactions[0].key.author(), "alice");
    }

    #[test]
    fn test_patch_only_overwrites_present_fields() {
        let mut msg = MessageRecord {
            key: MessageKey::new("1@s.whatsapp.net", "X", true),
            status: Some(1),
            push_name: Some("Ana".into()),
            ..Default::default()
        };
        msg.apply_patch(&MessagePatch {
            status: Some(3),
            ..Default::default()
        });
        assert_eq!(msg.status, Some(3));
        assert_eq!(msg.push_name.as_deref(), Some("Ana"));
    }

    #[test]
    fn test_patch_carries_untyped_fields() {
        let mut msg = MessageRecord {
            key: MessageKey::new("1@s.whatsapp.net", "X", true),
            ..Default::default()
        };
        msg.extra.insert("labels".into(), serde_json::json!(["keep"]));

        let patch: MessagePatch = serde_json::from_value(serde_json::json!({
            "status": 4,
            "pollUpdates": [{ "vote": 1 }],
            "messageStubParameters": ["Ana"]
        }))
        .unwrap();
        assert!(!patch.extra.contains_key("status"));
        msg.apply_patch(&patch);

        assert_eq!(msg.status, Some(4));
        assert_eq!(msg.extra["pollUpdates"], serde_json::json!([{ "vote": 1 }]));
        assert_eq!(msg.extra["messageStubParameters"], serde_json::json!(["Ana"]));
        assert_eq!(msg.extra["labels"], serde_json::json!(["keep"]));
    }
}
