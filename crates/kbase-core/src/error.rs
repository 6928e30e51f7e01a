//! Error types for kbase.

use thiserror::Error;

use crate::models::{ItemId, TagId};

/// Result type alias using kbase's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for kbase operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Store operation failed in a non-SQL backend
    #[error("Store error: {0}")]
    Store(String),

    /// Item not found
    #[error("Item not found: {0}")]
    ItemNotFound(ItemId),

    /// Tag not found
    #[error("Tag not found: {0}")]
    TagNotFound(TagId),

    /// Invalid input, rejected before any store call
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Programmer misuse of an API (e.g. slot index out of range)
    #[error("Precondition violated: {0}")]
    Precondition(String),

    /// Operation not allowed in the current session state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// True for input rejected before reaching the store.
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::InvalidInput(_))
    }

    /// True for any of the not-found variants.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::ItemNotFound(_) | Error::TagNotFound(_))
            || matches!(self, Error::Database(sqlx::Error::RowNotFound))
    }
}
