//! Merch pack catalog aggregate.

mod aggregate;
mod pack_type;

pub use aggregate::{MerchItem, MerchPack, MerchPackId};
pub use pack_type::MerchPackType;
