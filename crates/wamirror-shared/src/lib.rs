//! # wamirror-shared
//!
//! Domain model shared by the store crates: messages, conversation
//! summaries, contacts, group snapshots and presences, the typed event
//! stream they are built from, and the persistence contract.

pub mod chat;
pub mod constants;
pub mod contact;
pub mod error;
pub mod group;
pub mod jid;
pub mod message;
pub mod persistence;
pub mod presence;
pub mod protocol;

pub use chat::{ChatPatch, ConversationSummary};
pub use contact::Contact;
pub use error::{PersistError, PersistResult};
pub use group::{AdminRank, GroupMetadata, GroupParticipant, GroupPatch, ParticipantAction};
pub use message::{
    MessageContent, MessageKey, MessagePatch, MessageRecord, ProtocolMessage, Reaction,
    UserReceipt,
};
pub use persistence::Persistence;
pub use presence::{Presence, PresenceData};
pub use protocol::{
    HistorySet, HistorySyncType, MessageDeletion, MessageUpdate, ReactionUpdate, ReceiptUpdate,
    StoreEvent, UpsertKind,
};
