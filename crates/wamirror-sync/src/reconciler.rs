//! Event reconciliation: each [`StoreEvent`] is folded into the in-memory
//! indices and mirrored to the write-behind worker.
//!
//! Events derived from other events (a notify message creating its chat,
//! an ephemeral-setting message updating chat and group) are applied by
//! calling the matching handler directly, after any lock has been released.

use std::collections::{HashMap, HashSet};

use tracing::{debug, info};

use wamirror_shared::constants::STUB_REVOKE;
use wamirror_shared::jid::{is_group, normalized_user};
use wamirror_shared::{
    ChatPatch, Contact, ConversationSummary, GroupMetadata, GroupParticipant, GroupPatch,
    HistorySet, HistorySyncType, MessageDeletion, MessageRecord, MessageUpdate,
    ParticipantAction, PresenceData, ReactionUpdate, ReceiptUpdate, StoreEvent, UpsertKind,
};

use crate::store::{lock, ChatStore};

impl ChatStore {
    /// Apply one event to completion.
    pub fn apply(&self, event: StoreEvent) {
        debug!(event = event.name(), "Applying event");
        match event {
            StoreEvent::HistorySet(set) => self.on_history_set(set),
            StoreEvent::PresenceUpdate { id, presences } => self.on_presence_update(id, presences),
            StoreEvent::ContactsUpsert(contacts) => self.on_contacts_upsert(contacts),
            StoreEvent::ContactsUpdate(updates) => self.on_contacts_update(updates),
            StoreEvent::ChatsUpsert(chats) => self.on_chats_upsert(chats),
            StoreEvent::ChatsUpdate(patches) => self.on_chats_update(patches),
            StoreEvent::ChatsDelete(ids) => self.on_chats_delete(ids),
            StoreEvent::MessagesUpsert { messages, kind } => self.on_messages_upsert(messages, kind),
            StoreEvent::MessagesUpdate(updates) => self.on_messages_update(updates),
            StoreEvent::MessagesDelete(deletion) => self.on_messages_delete(deletion),
            StoreEvent::GroupParticipantsUpdate {
                id,
                participants,
                action,
            } => self.on_group_participants_update(&id, &participants, action),
            StoreEvent::GroupsUpdate(patches) => self.on_groups_update(patches),
            StoreEvent::GroupsUpsert(groups) => self.on_groups_upsert(groups),
            StoreEvent::MessageReceiptUpdate(updates) => self.on_receipt_update(updates),
            StoreEvent::MessagesReaction(reactions) => self.on_reactions(reactions),
        }
    }

    fn on_history_set(&self, set: HistorySet) {
        if set.sync_type == Some(HistorySyncType::OnDemand) {
            debug!("On-demand history sync ignored");
            return;
        }

        let is_latest = set.is_latest == Some(true);
        if is_latest {
            lock(&self.chats).clear();
            self.writer.clear_chats();
            lock(&self.messages).clear();
        }

        let chat_count = set.chats.len();
        let dated: Vec<_> = set
            .chats
            .into_iter()
            .filter(|chat| chat.has_ordering_timestamp())
            .collect();
        let kept = lock(&self.chats).upsert(dated.iter().cloned());
        self.writer.upsert_chats(dated);

        let merged = self.merge_contacts(&set.contacts);
        let contact_count = merged.len();
        self.writer.upsert_contacts(merged);

        let mut appended = 0;
        {
            let mut history = lock(&self.messages);
            for message in set.messages {
                if history.append(message) {
                    appended += 1;
                }
            }
        }

        info!(
            chats = chat_count,
            kept,
            contacts = contact_count,
            messages = appended,
            is_latest,
            "History snapshot applied"
        );
    }

    fn on_presence_update(&self, id: String, presences: HashMap<String, PresenceData>) {
        lock(&self.presences).entry(id).or_default().extend(presences);
    }

    fn merge_contacts(&self, contacts: &[Contact]) -> Vec<Contact> {
        let mut book = lock(&self.contacts);
        contacts
            .iter()
            .filter(|c| !c.id.is_empty())
            .map(|c| book.upsert(c))
            .collect()
    }

    fn on_contacts_upsert(&self, contacts: Vec<Contact>) {
        let merged = self.merge_contacts(&contacts);
        self.writer.upsert_contacts(merged);
    }

    fn on_contacts_update(&self, updates: Vec<Contact>) {
        let mut merged = Vec::new();
        {
            let mut book = lock(&self.contacts);
            for update in &updates {
                let Some(target) = book.resolve(&update.id) else {
                    debug!(id = %update.id, "Contact update for unknown contact dropped");
                    continue;
                };
                if let Some(contact) = book.merge_into(&target, update) {
                    merged.push(contact);
                }
            }
        }
        self.writer.upsert_contacts(merged);
    }

    fn on_chats_upsert(&self, chats: Vec<ConversationSummary>) {
        {
            let mut index = lock(&self.chats);
            for chat in &chats {
                index.insert(chat.clone());
            }
        }
        self.writer.upsert_chats(chats);
    }

    fn on_chats_update(&self, patches: Vec<ChatPatch>) {
        let mut updated = Vec::new();
        {
            let mut index = lock(&self.chats);
            for mut patch in patches {
                let Some(existing) = index.get(&patch.id) else {
                    continue;
                };
                // A positive count is a delta over the known unread count.
                if let Some(delta) = patch.unread_count.filter(|d| *d > 0) {
                    let current = existing.unread_count.unwrap_or(0);
                    patch.unread_count = Some(current.saturating_add(delta));
                }
                if let Some(chat) = index.update(&patch) {
                    updated.push(chat.clone());
                }
            }
        }
        self.writer.upsert_chats(updated);
    }

    fn on_chats_delete(&self, ids: Vec<String>) {
        for id in ids {
            if lock(&self.chats).delete_by_id(&id) {
                self.writer.delete_chat(id);
            }
        }
    }

    fn on_messages_upsert(&self, messages: Vec<MessageRecord>, kind: UpsertKind) {
        if !matches!(kind, UpsertKind::Append | UpsertKind::Notify) {
            debug!(?kind, "Message upsert kind ignored");
            return;
        }

        for message in messages {
            let Some(jid) = message.key.remote_jid.as_deref().map(normalized_user) else {
                debug!("Message without conversation dropped");
                continue;
            };

            if let Some(expiration) = message.ephemeral_setting() {
                let mut chat = ChatPatch::new(&jid);
                chat.ephemeral_expiration = Some(expiration);
                self.on_chats_update(vec![chat]);

                if is_group(&jid) {
                    let mut group = GroupPatch::new(&jid);
                    group.ephemeral_duration = Some(expiration);
                    self.on_groups_update(vec![group]);
                }
            }

            let timestamp = message.message_timestamp;
            let from_me = message.key.from_me.unwrap_or(false);
            if !lock(&self.messages).append(message) {
                debug!(jid = %jid, "Message without id dropped");
            }

            if kind == UpsertKind::Notify {
                let known = lock(&self.chats).contains(&jid);
                if !known {
                    let mut chat = ConversationSummary::new(&jid);
                    chat.conversation_timestamp = timestamp;
                    chat.unread_count = Some(1);
                    self.on_chats_upsert(vec![chat]);
                }

                if !from_me {
                    let mut chat = ChatPatch::new(&jid);
                    chat.last_message_recv_timestamp = timestamp;
                    self.on_chats_update(vec![chat]);
                }
            }
        }
    }

    fn on_messages_update(&self, updates: Vec<MessageUpdate>) {
        let mut history = lock(&self.messages);
        for MessageUpdate { key, update } in updates {
            let (Some(jid), Some(id)) = (
                key.remote_jid.as_deref(),
                key.id.as_deref().filter(|id| !id.is_empty()),
            ) else {
                debug!("Message update without key dropped");
                continue;
            };

            let applied = history.existing_mut(jid).is_some_and(|messages| {
                if update.message_stub_type == Some(STUB_REVOKE) {
                    messages.update_assign(id, |m| m.message_stub_type = Some(STUB_REVOKE))
                } else {
                    messages.update_assign(id, |m| m.apply_patch(&update))
                }
            });
            if !applied {
                debug!(jid, id, "Update for uncached message dropped");
            }
        }
    }

    fn on_messages_delete(&self, deletion: MessageDeletion) {
        let mut history = lock(&self.messages);
        match deletion {
            MessageDeletion::All { jid } => {
                if let Some(messages) = history.existing_mut(&jid) {
                    messages.clear();
                }
            }
            MessageDeletion::Keys { keys } => {
                let Some(jid) = keys.first().and_then(|k| k.remote_jid.clone()) else {
                    debug!("Message deletion without conversation dropped");
                    return;
                };
                let ids: HashSet<&str> = keys.iter().map(|k| k.id_or_empty()).collect();
                if let Some(messages) = history.existing_mut(&jid) {
                    messages.filter(|m| !ids.contains(m.key.id_or_empty()));
                }
            }
        }
    }

    fn on_group_participants_update(
        &self,
        id: &str,
        participants: &[GroupParticipant],
        action: ParticipantAction,
    ) {
        let updated = lock(&self.groups).apply_participants(id, action, participants);
        match updated {
            Some(group) => self.writer.upsert_groups(vec![group]),
            None => debug!(id, "Roster change for uncached group ignored"),
        }
    }

    fn on_groups_update(&self, patches: Vec<GroupPatch>) {
        let updated: Vec<GroupMetadata> = {
            let mut cache = lock(&self.groups);
            patches.iter().filter_map(|p| cache.merge(p)).collect()
        };
        self.writer.upsert_groups(updated);
    }

    fn on_groups_upsert(&self, groups: Vec<GroupMetadata>) {
        let merged: Vec<GroupMetadata> = {
            let mut cache = lock(&self.groups);
            groups.into_iter().map(|g| cache.merge_or_insert(g)).collect()
        };
        self.writer.upsert_groups(merged);
    }

    fn on_receipt_update(&self, updates: Vec<ReceiptUpdate>) {
        let mut history = lock(&self.messages);
        for ReceiptUpdate { key, receipt } in updates {
            let (Some(jid), Some(id)) = (key.remote_jid.as_deref(), key.id.as_deref()) else {
                continue;
            };
            if let Some(message) = history.get_mut(jid, id) {
                message.apply_receipt(receipt);
            }
        }
    }

    fn on_reactions(&self, reactions: Vec<ReactionUpdate>) {
        let mut history = lock(&self.messages);
        for ReactionUpdate { key, reaction } in reactions {
            let (Some(jid), Some(id)) = (key.remote_jid.as_deref(), key.id.as_deref()) else {
                continue;
            };
            if let Some(message) = history.get_mut(jid, id) {
                message.apply_reaction(reaction);
            }
        }
    }
}
