//! Common error types for Tapestry

use thiserror::Error;
use uuid::Uuid;

/// Common result type for Tapestry operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across Tapestry services
///
/// Absence of a theme match is never an error; matching and balancing
/// return plain values. Only environment-level failures appear here.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored JSON column failed to parse
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Taxonomy store unreachable or holds zero active themes at run
    /// start. Fatal for the whole run; nothing is written.
    #[error("Taxonomy unavailable: {0}")]
    TaxonomyUnavailable(String),

    /// Commit of a single story's assignment failed after retries
    #[error("Assignment write for story {story_id} failed after {attempts} attempts: {message}")]
    PersistenceWrite {
        story_id: Uuid,
        attempts: u32,
        message: String,
    },

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}
