//! [`Persistence`] implementation backed by the SQLite tables.

use wamirror_shared::{
    Contact, ConversationSummary, GroupMetadata, PersistResult, Persistence,
};

use crate::database::Database;

impl Persistence for Database {
    fn load_chats(&self) -> PersistResult<Vec<ConversationSummary>> {
        Ok(self.list_chats()?)
    }

    fn upsert_chats(&self, chats: &[ConversationSummary]) -> PersistResult<()> {
        Ok(Database::upsert_chats(self, chats)?)
    }

    fn delete_chat(&self, id: &str) -> PersistResult<bool> {
        Ok(Database::delete_chat(self, id)?)
    }

    fn clear_chats(&self) -> PersistResult<()> {
        Ok(Database::clear_chats(self)?)
    }

    fn load_contacts(&self) -> PersistResult<Vec<Contact>> {
        Ok(self.list_contacts()?)
    }

    fn upsert_contacts(&self, contacts: &[Contact]) -> PersistResult<()> {
        Ok(Database::upsert_contacts(self, contacts)?)
    }

    fn delete_contact(&self, id: &str) -> PersistResult<bool> {
        Ok(Database::delete_contact(self, id)?)
    }

    fn clear_contacts(&self) -> PersistResult<()> {
        Ok(Database::clear_contacts(self)?)
    }

    fn load_groups(&self) -> PersistResult<Vec<GroupMetadata>> {
        Ok(self.list_groups()?)
    }

    fn upsert_groups(&self, groups: &[GroupMetadata]) -> PersistResult<()> {
        Ok(Database::upsert_groups(self, groups)?)
    }

    fn delete_group(&self, id: &str) -> PersistResult<bool> {
        Ok(Database::delete_group(self, id)?)
    }

    fn clear_groups(&self) -> PersistResult<()> {
        Ok(Database::clear_groups(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_reads_what_it_wrote() {
        let backend: Box<dyn Persistence> = Box::new(Database::open_in_memory().unwrap());

        let mut chat = ConversationSummary::new("1@s.whatsapp.net");
        chat.conversation_timestamp = Some(7);
        backend.upsert_chats(&[chat.clone()]).unwrap();
        backend.upsert_contacts(&[Contact::new("1@s.whatsapp.net")]).unwrap();
        backend
            .upsert_groups(&[GroupMetadata::new("g1@g.us", "Team")])
            .unwrap();

        assert_eq!(backend.load_chats().unwrap(), vec![chat]);
        assert_eq!(backend.load_contacts().unwrap().len(), 1);
        assert_eq!(backend.load_groups().unwrap()[0].subject, "Team");

        backend.clear_chats().unwrap();
        assert!(backend.load_chats().unwrap().is_empty());
    }
}
