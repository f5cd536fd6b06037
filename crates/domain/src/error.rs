//! Domain error types.

use common::{EnumerationError, ErrorKind};
use thiserror::Error;

/// Errors that can occur while building or mutating domain objects.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// The address is not a well-formed email.
    #[error("Invalid email address: '{0}'")]
    InvalidEmail(String),

    /// A required name part is blank.
    #[error("Employee {field} must not be empty")]
    EmptyName { field: &'static str },

    /// A merch item quantity is not positive.
    #[error("Invalid quantity {quantity} for sku {sku}")]
    InvalidQuantity { sku: i64, quantity: i32 },

    /// An aggregate that already has an identity was handed out a new one.
    #[error("{aggregate_type} already has identity {id}")]
    IdentityAlreadyAssigned {
        aggregate_type: &'static str,
        id: i64,
    },

    /// An enumeration lookup or comparison failed.
    #[error("Enumeration error: {0}")]
    Enumeration(#[from] EnumerationError),
}

impl DomainError {
    /// Returns the coarse classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            DomainError::Enumeration(e) => e.kind(),
            DomainError::IdentityAlreadyAssigned { .. } => ErrorKind::Precondition,
            DomainError::InvalidEmail(_)
            | DomainError::EmptyName { .. }
            | DomainError::InvalidQuantity { .. } => ErrorKind::Validation,
        }
    }
}
