//! Volatile message history: one [`ExpiringMap`] per conversation.

use std::collections::HashMap;
use std::time::Duration;

use wamirror_shared::jid::normalized_user;
use wamirror_shared::MessageRecord;

use crate::expiring::ExpiringMap;

pub struct MessageHistory {
    conversations: HashMap<String, ExpiringMap<MessageRecord>>,
    ttl: Duration,
}

impl MessageHistory {
    pub fn new(ttl: Duration) -> Self {
        Self {
            conversations: HashMap::new(),
            ttl,
        }
    }

    /// Map of `jid`, created on first use. `jid` must already be normalized.
    pub fn conversation_mut(&mut self, jid: &str) -> &mut ExpiringMap<MessageRecord> {
        let ttl = self.ttl;
        self.conversations
            .entry(jid.to_string())
            .or_insert_with(|| ExpiringMap::new(ttl, MessageRecord::ident))
    }

    /// Existing map of `jid`, without creating one.
    pub fn existing_mut(&mut self, jid: &str) -> Option<&mut ExpiringMap<MessageRecord>> {
        self.conversations.get_mut(&normalized_user(jid))
    }

    /// Store a message under its normalized conversation. Messages without a
    /// conversation or an id cannot be addressed and are dropped.
    pub fn append(&mut self, message: MessageRecord) -> bool {
        let Some(jid) = message.key.remote_jid.as_deref().map(normalized_user) else {
            return false;
        };
        if message.key.id_or_empty().is_empty() {
            return false;
        }
        self.conversation_mut(&jid).upsert(message);
        true
    }

    pub fn get(&mut self, jid: &str, id: &str) -> Option<MessageRecord> {
        self.existing_mut(jid)?.get(id)
    }

    pub fn get_mut(&mut self, jid: &str, id: &str) -> Option<&mut MessageRecord> {
        self.existing_mut(jid)?.get_mut(id)
    }

    pub fn list(&self, jid: &str) -> Vec<MessageRecord> {
        self.conversations
            .get(&normalized_user(jid))
            .map(ExpiringMap::values)
            .unwrap_or_default()
    }

    pub fn count(&self, jid: &str) -> usize {
        self.conversations
            .get(&normalized_user(jid))
            .map_or(0, ExpiringMap::len)
    }

    pub fn clear(&mut self) {
        self.conversations.clear();
    }

    /// Evict expired messages everywhere and forget emptied conversations.
    pub fn purge_expired(&mut self) -> usize {
        let mut evicted = 0;
        self.conversations.retain(|_, messages| {
            evicted += messages.purge_expired();
            !messages.is_empty()
        });
        evicted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wamirror_shared::MessageKey;

    fn message(jid: &str, id: &str) -> MessageRecord {
        MessageRecord {
            key: MessageKey::new(jid, id, false),
            ..Default::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_append_normalizes_conversation() {
        let mut history = MessageHistory::new(Duration::from_secs(60));
        assert!(history.append(message("123:4@c.us", "m1")));
        assert!(history.append(message("123@s.whatsapp.net", "m2")));

        assert_eq!(history.count("123@s.whatsapp.net"), 2);
        assert!(history.get("123@c.us", "m1").is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unaddressable_messages_are_dropped() {
        let mut history = MessageHistory::new(Duration::from_secs(60));
        let mut no_jid = message("x@s.whatsapp.net", "m1");
        no_jid.key.remote_jid = None;

        assert!(!history.append(no_jid));
        assert!(!history.append(message("x@s.whatsapp.net", "")));
        assert_eq!(history.count("x@s.whatsapp.net"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_purge_forgets_empty_conversations() {
        let mut history = MessageHistory::new(Duration::from_secs(60));
        history.append(message("1@s.whatsapp.net", "m1"));
        tokio::time::advance(Duration::from_secs(61)).await;

        assert_eq!(history.purge_expired(), 1);
        assert!(history.existing_mut("1@s.whatsapp.net").is_none());
    }
}
