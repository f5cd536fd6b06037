use serde::{Deserialize, Serialize};

use crate::aggregate::Aggregate;
use crate::error::DomainError;

use super::MerchPackType;

/// Identity of a merch pack catalog entry. `0` is unset.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct MerchPackId(i64);

impl MerchPackId {
    pub const UNSET: MerchPackId = MerchPackId(0);

    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }

    pub fn is_unset(&self) -> bool {
        *self == Self::UNSET
    }
}

impl std::fmt::Display for MerchPackId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for MerchPackId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// One stock item inside a merch pack.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MerchItem {
    pub sku: i64,
    pub quantity: i32,
}

impl MerchItem {
    /// Creates an item; the quantity must be positive.
    pub fn new(sku: i64, quantity: i32) -> Result<Self, DomainError> {
        if quantity <= 0 {
            return Err(DomainError::InvalidQuantity { sku, quantity });
        }
        Ok(Self { sku, quantity })
    }
}

/// Merch pack catalog entry: a pack type and the items it contains.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerchPack {
    id: MerchPackId,
    pack_type: MerchPackType,
    items: Vec<MerchItem>,
}

impl Aggregate for MerchPack {
    type Id = MerchPackId;

    fn aggregate_type() -> &'static str {
        "MerchPack"
    }

    fn id(&self) -> MerchPackId {
        self.id
    }

    fn has_identity(&self) -> bool {
        !self.id.is_unset()
    }
}

impl MerchPack {
    /// Builds a catalog entry that has not been persisted yet.
    pub fn new(pack_type: MerchPackType, items: Vec<MerchItem>) -> Self {
        Self {
            id: MerchPackId::UNSET,
            pack_type,
            items,
        }
    }

    /// Rebuilds a persisted catalog entry.
    pub fn restore(id: MerchPackId, pack_type: MerchPackType, items: Vec<MerchItem>) -> Self {
        Self {
            id,
            pack_type,
            items,
        }
    }

    /// Returns a copy carrying a freshly assigned identity.
    pub fn with_identity(&self, id: MerchPackId) -> Result<Self, DomainError> {
        if self.has_identity() {
            return Err(DomainError::IdentityAlreadyAssigned {
                aggregate_type: Self::aggregate_type(),
                id: self.id.as_i64(),
            });
        }
        Ok(Self {
            id,
            ..self.clone()
        })
    }

    /// Returns a copy with the item list replaced.
    pub fn with_items(&self, items: Vec<MerchItem>) -> Self {
        Self {
            items,
            ..self.clone()
        }
    }

    pub fn pack_type(&self) -> MerchPackType {
        self.pack_type
    }

    pub fn items(&self) -> &[MerchItem] {
        &self.items
    }
}
