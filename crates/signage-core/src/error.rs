//! Repository-level error taxonomy

use crate::io::StoreError;
use crate::schema::Family;
use thiserror::Error;

/// Errors surfaced by repositories, the migration runner and the usage resolver
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// The entity does not exist (only raised by operations that need it)
    #[error("{family} entry '{id}' not found")]
    NotFound { family: Family, id: String },

    /// A payload failed validation against its family schema
    #[error("Schema error in {family} at {path}: {message}")]
    Schema {
        family: Family,
        path: String,
        message: String,
    },

    /// The stored record changed after this session last read it
    #[error("{family} entry '{id}' was modified since it was last read")]
    Conflict { family: Family, id: String },

    /// Underlying store failure
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result alias for repository operations
pub type Result<T> = std::result::Result<T, RepositoryError>;
