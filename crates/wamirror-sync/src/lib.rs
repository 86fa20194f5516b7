//! # wamirror-sync
//!
//! Event-sourced mirror of a messaging session. A [`ChatStore`] folds the
//! client's event stream into in-memory indices (conversations, contacts,
//! group metadata, presences and a short-lived message history), serves
//! reads from memory, and mirrors durable entities to a [`Persistence`]
//! backend through a write-behind worker.
//!
//! [`Persistence`]: wamirror_shared::Persistence

pub mod chats;
pub mod config;
pub mod contacts;
pub mod expiring;
pub mod groups;
pub mod messages;
pub mod writer;

mod error;
mod reconciler;
mod store;

#[cfg(test)]
mod testing;

pub use config::SyncConfig;
pub use error::{Result, SyncError};
pub use groups::GroupMetadataSource;
pub use store::ChatStore;
