use thiserror::Error;

/// Errors raised by enumeration lookups and comparisons.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnumerationError {
    /// Two values of different enumeration types were compared.
    #[error("type {found} is not type {expected}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    /// No declared member of the enumeration has this id.
    #[error("{type_name} has no member with id {id}")]
    UnknownId { type_name: &'static str, id: i32 },

    /// No declared member of the enumeration has this name.
    #[error("{type_name} has no member named '{name}'")]
    UnknownName {
        type_name: &'static str,
        name: String,
    },
}

/// Coarse classification of failures across the service.
///
/// Every crate-level error maps onto one of these so callers can decide how
/// to react (resubmit, report a bug, surface an outage) without matching on
/// every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Enumeration values of different types were compared.
    TypeMismatch,
    /// Input failed declared rules; the caller can fix and resubmit.
    Validation,
    /// An operation was used incorrectly (e.g. update without identity).
    Precondition,
    /// A concurrent writer changed the same aggregate first.
    Conflict,
    /// The operation was cancelled before it took effect.
    Cancelled,
    /// The store failed or rejected a write.
    Storage,
    /// A business rule rejected the command.
    Rejected,
    /// An external collaborator (email, stock) failed.
    Collaborator,
}

impl EnumerationError {
    /// Returns the coarse classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            EnumerationError::TypeMismatch { .. } => ErrorKind::TypeMismatch,
            EnumerationError::UnknownId { .. } | EnumerationError::UnknownName { .. } => {
                ErrorKind::Validation
            }
        }
    }
}
