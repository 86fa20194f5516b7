//! In-memory contact index with sparse merges and notification-alias
//! resolution.
//!
//! Contact updates sometimes address a contact by a short alias derived
//! from the real user id (`base64(md5(user + salt))[..3]`) instead of the
//! id itself. [`ContactBook::resolve`] maps such an id back to a known
//! contact.

use std::collections::HashMap;

use base64::{engine::general_purpose::STANDARD, Engine};
use md5::{Digest, Md5};

use wamirror_shared::constants::{CONTACT_HASH_LEN, CONTACT_HASH_SALT};
use wamirror_shared::jid::Jid;
use wamirror_shared::Contact;

#[derive(Default)]
pub struct ContactBook {
    contacts: HashMap<String, Contact>,
}

impl ContactBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load persisted contacts verbatim.
    pub fn seed(&mut self, contacts: Vec<Contact>) {
        for contact in contacts {
            self.contacts.insert(contact.id.clone(), contact);
        }
    }

    pub fn get(&self, id: &str) -> Option<&Contact> {
        self.contacts.get(id)
    }

    /// Every contact, sorted by id.
    pub fn all(&self) -> Vec<Contact> {
        let mut contacts: Vec<_> = self.contacts.values().cloned().collect();
        contacts.sort_by(|a, b| a.id.cmp(&b.id));
        contacts
    }

    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }

    /// Sparse-merge `incoming` into the contact with the same id, creating
    /// it if needed. Returns the merged record.
    pub fn upsert(&mut self, incoming: &Contact) -> Contact {
        let contact = self
            .contacts
            .entry(incoming.id.clone())
            .or_insert_with(|| Contact::new(incoming.id.clone()));
        contact.merge_sparse(incoming);
        contact.clone()
    }

    /// Sparse-merge `incoming` into an existing contact `target`.
    pub fn merge_into(&mut self, target: &str, incoming: &Contact) -> Option<Contact> {
        let contact = self.contacts.get_mut(target)?;
        contact.merge_sparse(incoming);
        Some(contact.clone())
    }

    /// Id of the known contact an update addresses: the id itself when known,
    /// otherwise the first contact (by id) whose alias appears in it.
    pub fn resolve(&self, id: &str) -> Option<String> {
        if self.contacts.contains_key(id) {
            return Some(id.to_string());
        }

        let incoming_user = Jid::decode(id).map_or(id, |jid| jid.user);
        let mut candidates: Vec<(&str, String)> = self
            .contacts
            .keys()
            .filter_map(|known| Some((known.as_str(), contact_hash(known)?)))
            .collect();
        candidates.sort_by(|a, b| a.0.cmp(b.0));

        candidates
            .into_iter()
            .find(|(_, hash)| incoming_user.contains(hash.as_str()))
            .map(|(known, _)| known.to_string())
    }
}

/// Notification alias of a contact JID. `None` when the JID has no user part.
pub fn contact_hash(jid: &str) -> Option<String> {
    let user = Jid::decode(jid)?.user;
    if user.is_empty() {
        return None;
    }
    let digest = Md5::digest(format!("{user}{CONTACT_HASH_SALT}").as_bytes());
    let encoded = STANDARD.encode(digest);
    Some(encoded[..CONTACT_HASH_LEN].to_string())
}
