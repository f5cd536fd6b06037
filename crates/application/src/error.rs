//! Application error types.

use common::ErrorKind;
use domain::{DomainError, Email, MerchPackType};
use storage::StorageError;
use thiserror::Error;

use crate::validation::ValidationErrors;

/// Errors that can occur while executing a command through the pipeline.
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// The command failed validation; nothing was executed.
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    /// The employee already holds an active request for this pack.
    #[error("{email} already has an active request for {pack_type}")]
    AlreadyIssued {
        email: Email,
        pack_type: MerchPackType,
    },

    /// There is no pending request to act on.
    #[error("{email} has no active request for {pack_type}")]
    NoActiveRequest {
        email: Email,
        pack_type: MerchPackType,
    },

    /// The catalog has no pack of the requested type.
    #[error("No merch pack of type {0} in the catalog")]
    PackNotInCatalog(MerchPackType),

    /// The email service failed.
    #[error("Notification error: {0}")]
    Notification(String),

    /// The stock service failed.
    #[error("Stock service error: {0}")]
    Stock(String),

    /// Domain error.
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    /// Storage error.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl ApplicationError {
    /// Returns the coarse classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApplicationError::Validation(_) => ErrorKind::Validation,
            ApplicationError::AlreadyIssued { .. }
            | ApplicationError::NoActiveRequest { .. }
            | ApplicationError::PackNotInCatalog(_) => ErrorKind::Rejected,
            ApplicationError::Notification(_) | ApplicationError::Stock(_) => {
                ErrorKind::Collaborator
            }
            ApplicationError::Domain(e) => e.kind(),
            ApplicationError::Storage(e) => e.kind(),
        }
    }
}

/// Convenience type alias for application results.
pub type Result<T> = std::result::Result<T, ApplicationError>;
