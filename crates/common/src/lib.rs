//! Shared building blocks for the merch request service.
//!
//! - [`Enumeration`]: closed, named sets of integral constants
//! - [`EnumerationValue`]: a type-erased enumeration value with fallible ordering
//! - [`CorrelationId`]: identifies one command execution across log lines

pub mod enumeration;
pub mod error;
pub mod types;

pub use enumeration::{Enumeration, EnumerationValue, get_all};
pub use error::{EnumerationError, ErrorKind};
pub use types::CorrelationId;
