//! Contract between the in-memory store and its durable backend.
//!
//! Every table supports the same four operations: read everything back,
//! insert-or-replace keyed by primary id, delete by id, and clear. Backends
//! run on a dedicated blocking worker, so the trait is synchronous.

use crate::chat::ConversationSummary;
use crate::contact::Contact;
use crate::error::PersistResult;
use crate::group::GroupMetadata;

pub trait Persistence: Send + 'static {
    // -- conversations (opaque blob per id) --

    fn load_chats(&self) -> PersistResult<Vec<ConversationSummary>>;
    fn upsert_chats(&self, chats: &[ConversationSummary]) -> PersistResult<()>;
    /// Returns `true` if a row was deleted.
    fn delete_chat(&self, id: &str) -> PersistResult<bool>;
    fn clear_chats(&self) -> PersistResult<()>;

    // -- contacts --

    fn load_contacts(&self) -> PersistResult<Vec<Contact>>;
    fn upsert_contacts(&self, contacts: &[Contact]) -> PersistResult<()>;
    fn delete_contact(&self, id: &str) -> PersistResult<bool>;
    fn clear_contacts(&self) -> PersistResult<()>;

    // -- group metadata --

    fn load_groups(&self) -> PersistResult<Vec<GroupMetadata>>;
    fn upsert_groups(&self, groups: &[GroupMetadata]) -> PersistResult<()>;
    fn delete_group(&self, id: &str) -> PersistResult<bool>;
    fn clear_groups(&self) -> PersistResult<()>;
}
