use common::ErrorKind;
use domain::DomainError;
use thiserror::Error;

/// Errors that can occur when interacting with storage.
#[derive(Debug, Error)]
pub enum StorageError {
    /// `update` was called on an aggregate that has no identity yet.
    #[error("{aggregate_type} must have an identity to be updated")]
    MissingIdentity { aggregate_type: &'static str },

    /// An update or removal targeted a row that does not exist.
    #[error("{aggregate_type} with id {id} not found")]
    NotFound {
        aggregate_type: &'static str,
        id: i64,
    },

    /// The stored version moved on since the aggregate was loaded.
    #[error(
        "Concurrency conflict for {aggregate_type} {id}: expected version {expected}, found {actual}"
    )]
    ConcurrencyConflict {
        aggregate_type: &'static str,
        id: i64,
        expected: i32,
        actual: i32,
    },

    /// An update tried to change a field that is fixed at creation.
    #[error("{field} of {aggregate_type} {id} cannot change after creation")]
    ImmutableField {
        aggregate_type: &'static str,
        id: i64,
        field: &'static str,
    },

    /// The store rejected a write because of a constraint.
    #[error("Constraint violation: {constraint}")]
    Conflict { constraint: String },

    /// The unit of work was used out of order.
    #[error("Unit of work is {actual}, expected {expected}")]
    InvalidState {
        expected: &'static str,
        actual: &'static str,
    },

    /// The operation was cancelled before it took effect.
    #[error("Operation cancelled")]
    Cancelled,

    /// Stored data could not be turned back into a domain object.
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl StorageError {
    /// Returns the coarse classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            StorageError::MissingIdentity { .. }
            | StorageError::InvalidState { .. }
            | StorageError::ImmutableField { .. } => ErrorKind::Precondition,
            StorageError::ConcurrencyConflict { .. } => ErrorKind::Conflict,
            StorageError::Cancelled => ErrorKind::Cancelled,
            StorageError::Domain(e) => e.kind(),
            StorageError::NotFound { .. }
            | StorageError::Conflict { .. }
            | StorageError::Database(_)
            | StorageError::Migration(_) => ErrorKind::Storage,
        }
    }
}

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;
