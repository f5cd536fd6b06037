//! Domain layer for the merch request service.
//!
//! This crate provides:
//! - the [`Aggregate`] contract used by storage to key tracked changes
//! - the [`MerchRequest`] aggregate with its value objects and enumerations
//! - the [`MerchPack`] catalog aggregate

pub mod aggregate;
pub mod error;
pub mod merch_pack;
pub mod merch_request;

pub use aggregate::Aggregate;
pub use error::DomainError;
pub use merch_pack::{MerchItem, MerchPack, MerchPackId, MerchPackType};
pub use merch_request::{
    Email, Employee, EmployeeFullName, MerchRequest, MerchRequestDateTime, MerchRequestFromType,
    MerchRequestId, MerchRequestStatus,
};
