//! In-memory [`Persistence`] backend with write-failure injection.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use wamirror_shared::{
    Contact, ConversationSummary, GroupMetadata, PersistError, PersistResult, Persistence,
};

#[derive(Default)]
struct Tables {
    chats: BTreeMap<String, ConversationSummary>,
    contacts: BTreeMap<String, Contact>,
    groups: BTreeMap<String, GroupMetadata>,
}

#[derive(Clone, Default)]
pub struct MemoryBackend {
    tables: Arc<Mutex<Tables>>,
    failing: Arc<AtomicBool>,
}

impl MemoryBackend {
    pub fn fail_writes(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn chats(&self) -> Vec<ConversationSummary> {
        self.tables.lock().unwrap().chats.values().cloned().collect()
    }

    pub fn contacts(&self) -> Vec<Contact> {
        self.tables.lock().unwrap().contacts.values().cloned().collect()
    }

    pub fn groups(&self) -> Vec<GroupMetadata> {
        self.tables.lock().unwrap().groups.values().cloned().collect()
    }

    fn write<R>(&self, f: impl FnOnce(&mut Tables) -> R) -> PersistResult<R> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(PersistError::Backend("injected failure".into()));
        }
        Ok(f(&mut self.tables.lock().unwrap()))
    }
}

impl Persistence for MemoryBackend {
    fn load_chats(&self) -> PersistResult<Vec<ConversationSummary>> {
        Ok(self.chats())
    }

    fn upsert_chats(&self, chats: &[ConversationSummary]) -> PersistResult<()> {
        self.write(|t| {
            for chat in chats {
                t.chats.insert(chat.id.clone(), chat.clone());
            }
        })
    }

    fn delete_chat(&self, id: &str) -> PersistResult<bool> {
        self.write(|t| t.chats.remove(id).is_some())
    }

    fn clear_chats(&self) -> PersistResult<()> {
        self.write(|t| t.chats.clear())
    }

    fn load_contacts(&self) -> PersistResult<Vec<Contact>> {
        Ok(self.contacts())
    }

    fn upsert_contacts(&self, contacts: &[Contact]) -> PersistResult<()> {
        self.write(|t| {
            for contact in contacts {
                t.contacts.insert(contact.id.clone(), contact.clone());
            }
        })
    }

    fn delete_contact(&self, id: &str) -> PersistResult<bool> {
        self.write(|t| t.contacts.remove(id).is_some())
    }

    fn clear_contacts(&self) -> PersistResult<()> {
        self.write(|t| t.contacts.clear())
    }

    fn load_groups(&self) -> PersistResult<Vec<GroupMetadata>> {
        Ok(self.groups())
    }

    fn upsert_groups(&self, groups: &[GroupMetadata]) -> PersistResult<()> {
        self.write(|t| {
            for group in groups {
                t.groups.insert(group.id.clone(), group.clone());
            }
        })
    }

    fn delete_group(&self, id: &str) -> PersistResult<bool> {
        self.write(|t| t.groups.remove(id).is_some())
    }

    fn clear_groups(&self) -> PersistResult<()> {
        self.write(|t| t.groups.clear())
    }
}
