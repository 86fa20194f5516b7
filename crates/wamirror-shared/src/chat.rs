//! Conversation summaries and their partial updates.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Summary of a one-to-one or group conversation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSummary {
    /// Conversation JID.
    pub id: String,
    /// Ordering timestamp (epoch seconds).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_timestamp: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_message_recv_timestamp: Option<u64>,
    /// Unread messages. Negative values are protocol markers ("marked unread").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unread_count: Option<i32>,
    /// Disappearing-messages duration in seconds, `0` when off.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ephemeral_expiration: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ephemeral_setting_timestamp: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archived: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pinned: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mute_end_time: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_only: Option<bool>,
    /// Protocol metadata without a typed field.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ConversationSummary {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// A zero timestamp counts as missing.
    pub fn has_ordering_timestamp(&self) -> bool {
        self.conversation_timestamp.is_some_and(|ts| ts > 0)
    }

    /// Shallow merge: every field present in `patch` overwrites ours.
    pub fn merge(&mut self, patch: &ChatPatch) {
        if patch.conversation_timestamp.is_some() {
            self.conversation_timestamp = patch.conversation_timestamp;
        }
        if patch.last_message_recv_timestamp.is_some() {
            self.last_message_recv_timestamp = patch.last_message_recv_timestamp;
        }
        if patch.unread_count.is_some() {
            self.unread_count = patch.unread_count;
        }
        if patch.ephemeral_expiration.is_some() {
            self.ephemeral_expiration = patch.ephemeral_expiration;
        }
        if patch.ephemeral_setting_timestamp.is_some() {
            self.ephemeral_setting_timestamp = patch.ephemeral_setting_timestamp;
        }
        if let Some(name) = &patch.name {
            self.name = Some(name.clone());
        }
        if patch.archived.is_some() {
            self.archived = patch.archived;
        }
        if patch.pinned.is_some() {
            self.pinned = patch.pinned;
        }
        if patch.mute_end_time.is_some() {
            self.mute_end_time = patch.mute_end_time;
        }
        if patch.read_only.is_some() {
            self.read_only = patch.read_only;
        }
        for (key, value) in &patch.extra {
            self.extra.insert(key.clone(), value.clone());
        }
    }
}

impl From<ChatPatch> for ConversationSummary {
    fn from(patch: ChatPatch) -> Self {
        let mut summary = ConversationSummary::new(patch.id.clone());
        summary.merge(&patch);
        summary
    }
}

/// Partial update of a [`ConversationSummary`]; `id` selects the target.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChatPatch {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_timestamp: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_message_recv_timestamp: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unread_count: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ephemeral_expiration: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ephemeral_setting_timestamp: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archived: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pinned: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mute_end_time: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_only: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ChatPatch {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }
}
