//! Error types for typing sessions and result persistence

use thiserror::Error;

use crate::session::SessionStatus;

/// Result type for library operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the engine, passage selection and settings handling
#[derive(Debug, Error)]
pub enum Error {
    /// No catalog entry carries the requested category
    #[error("no passages available for category '{category}'")]
    NoPassagesForCategory { category: String },

    /// The passage catalog has no entries at all
    #[error("passage catalog is empty")]
    EmptyCatalog,

    /// The catalog data could not be read
    #[error("unreadable passage catalog: {0}")]
    Catalog(String),

    /// A transition was requested from a state that does not allow it.
    /// This is a caller bug, not a runtime condition.
    #[error("cannot {action} a session that is {status}")]
    InvalidTransition {
        action: &'static str,
        status: SessionStatus,
    },

    /// The durable results medium could not be read or written
    #[error("results store unavailable: {0}")]
    PersistenceUnavailable(#[from] StoreError),

    /// Settings failed validation
    #[error("invalid settings: {0}")]
    Settings(String),
}

/// Low-level failures of a results or settings store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("encoding: {0}")]
    Encode(#[from] serde_json::Error),
}
