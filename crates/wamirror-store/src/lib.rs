//! # wamirror-store
//!
//! Durable storage for the synchronized chat mirror, backed by SQLite.
//!
//! The crate exposes a synchronous `Database` handle that wraps a
//! `rusqlite::Connection`, provides typed CRUD helpers for every durable
//! table, and implements the shared `Persistence` contract so it can be
//! handed to the write-behind worker.

pub mod backend;
pub mod chats;
pub mod contacts;
pub mod database;
pub mod groups;
pub mod migrations;
pub mod sessions;

mod error;

pub use database::Database;
pub use error::{Result, StoreError};
pub use sessions::sanitize_session_name;
