use thiserror::Error;

/// Errors surfaced by a [`Persistence`](crate::persistence::Persistence) backend.
#[derive(Error, Debug)]
pub enum PersistError {
    /// The backend rejected or failed the operation.
    #[error("Backend error: {0}")]
    Backend(String),

    /// A stored blob could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Convenience alias for persistence results.
pub type PersistResult<T> = std::result::Result<T, PersistError>;
