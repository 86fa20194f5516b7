//! In-memory index of conversation summaries keyed by JID.

use std::collections::HashMap;

use wamirror_shared::{ChatPatch, ConversationSummary};

#[derive(Default)]
pub struct ConversationIndex {
    chats: HashMap<String, ConversationSummary>,
}

impl ConversationIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bulk insert from a history snapshot. Summaries without an ordering
    /// timestamp cannot be placed in a list and are skipped.
    /// Returns how many were kept.
    pub fn upsert(&mut self, chats: impl IntoIterator<Item = ConversationSummary>) -> usize {
        let mut kept = 0;
        for chat in chats.into_iter().filter(|c| c.has_ordering_timestamp()) {
            self.chats.insert(chat.id.clone(), chat);
            kept += 1;
        }
        kept
    }

    /// Unconditional insert or replace.
    pub fn insert(&mut self, chat: ConversationSummary) {
        self.chats.insert(chat.id.clone(), chat);
    }

    pub fn get(&self, id: &str) -> Option<&ConversationSummary> {
        self.chats.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.chats.contains_key(id)
    }

    /// Shallow-merge `patch` into the summary it targets.
    pub fn update(&mut self, patch: &ChatPatch) -> Option<&ConversationSummary> {
        let chat = self.chats.get_mut(&patch.id)?;
        chat.merge(patch);
        Some(chat)
    }

    pub fn delete_by_id(&mut self, id: &str) -> bool {
        self.chats.remove(id).is_some()
    }

    /// Every summary, most recent conversation first.
    pub fn all(&self) -> Vec<ConversationSummary> {
        let mut chats: Vec<_> = self.chats.values().cloned().collect();
        chats.sort_by(|a, b| {
            b.conversation_timestamp
                .cmp(&a.conversation_timestamp)
                .then_with(|| a.id.cmp(&b.id))
        });
        chats
    }

    pub fn clear(&mut self) {
        self.chats.clear();
    }

    pub fn len(&self) -> usize {
        self.chats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chats.is_empty()
    }
}
