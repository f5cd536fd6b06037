//! Merch request aggregate and related types.

mod aggregate;
mod state;
mod value_objects;

pub use aggregate::MerchRequest;
pub use state::{MerchRequestFromType, MerchRequestStatus};
pub use value_objects::{Email, Employee, EmployeeFullName, MerchRequestDateTime, MerchRequestId};
