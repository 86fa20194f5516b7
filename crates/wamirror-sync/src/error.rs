use thiserror::Error;

use wamirror_shared::{GroupMetadata, PersistError};
use wamirror_store::StoreError;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Persistence error: {0}")]
    Persist(#[from] PersistError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// The remote group lookup failed. `cached` holds the unchanged local
    /// snapshot, if there was one, so callers can decide to serve it.
    #[error("Failed to refresh metadata of group {jid}: {source}")]
    GroupFetch {
        jid: String,
        cached: Option<Box<GroupMetadata>>,
        #[source]
        source: anyhow::Error,
    },

    #[error("Write-behind worker has stopped")]
    WriterStopped,

    #[error("Background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl SyncError {
    /// Snapshot still cached when a group refresh failed.
    pub fn cached_group(&self) -> Option<&GroupMetadata> {
        match self {
            SyncError::GroupFetch { cached, .. } => cached.as_deref(),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
