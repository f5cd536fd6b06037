//! Merch request aggregate implementation.

use serde::{Deserialize, Serialize};

use crate::aggregate::Aggregate;
use crate::error::DomainError;
use crate::merch_pack::MerchPackId;

use super::{
    Email, Employee, MerchRequestDateTime, MerchRequestFromType, MerchRequestId, MerchRequestStatus,
};

/// Merch request aggregate root.
///
/// An employee's request for a merch pack. The identity is assigned once by
/// a repository `create` and never changes; `merch_pack_id` and `origin` are
/// fixed at construction. The status is replaced wholesale through a
/// repository `update`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerchRequest {
    id: MerchRequestId,

    /// Committed version for optimistic concurrency; 0 until created.
    #[serde(default)]
    version: i32,

    employee: Employee,

    merch_pack_id: MerchPackId,

    requested_at: MerchRequestDateTime,

    status: MerchRequestStatus,

    /// Where the request came from; set once at construction.
    origin: MerchRequestFromType,
}

impl Aggregate for MerchRequest {
    type Id = MerchRequestId;

    fn aggregate_type() -> &'static str {
        "MerchRequest"
    }

    fn id(&self) -> MerchRequestId {
        self.id
    }

    fn has_identity(&self) -> bool {
        !self.id.is_unset()
    }
}

impl MerchRequest {
    /// Builds a request that has not been persisted yet.
    pub fn new(
        employee: Employee,
        merch_pack_id: MerchPackId,
        requested_at: MerchRequestDateTime,
        status: MerchRequestStatus,
        origin: MerchRequestFromType,
    ) -> Self {
        Self {
            id: MerchRequestId::UNSET,
            version: 0,
            employee,
            merch_pack_id,
            requested_at,
            status,
            origin,
        }
    }

    /// Rebuilds a persisted request from its stored fields.
    pub fn restore(
        id: MerchRequestId,
        version: i32,
        employee: Employee,
        merch_pack_id: MerchPackId,
        requested_at: MerchRequestDateTime,
        status: MerchRequestStatus,
        origin: MerchRequestFromType,
    ) -> Self {
        Self {
            id,
            version,
            employee,
            merch_pack_id,
            requested_at,
            status,
            origin,
        }
    }

    /// Returns a copy carrying a freshly assigned identity at version 1.
    ///
    /// Fails if the request already has an identity.
    pub fn with_identity(&self, id: MerchRequestId) -> Result<Self, DomainError> {
        if self.has_identity() {
            return Err(DomainError::IdentityAlreadyAssigned {
                aggregate_type: Self::aggregate_type(),
                id: self.id.as_i64(),
            });
        }
        Ok(Self {
            id,
            version: 1,
            ..self.clone()
        })
    }

    /// Returns a copy at the given committed version.
    ///
    /// Storage adapters call this when a commit bumps the stored version.
    pub fn with_version(&self, version: i32) -> Self {
        Self {
            version,
            ..self.clone()
        }
    }

    /// Returns a copy with the status replaced.
    pub fn with_status(&self, status: MerchRequestStatus) -> Self {
        Self {
            status,
            ..self.clone()
        }
    }
}

// Query methods
impl MerchRequest {
    pub fn version(&self) -> i32 {
        self.version
    }

    pub fn employee(&self) -> &Employee {
        &self.employee
    }

    pub fn employee_email(&self) -> &Email {
        &self.employee.email
    }

    pub fn merch_pack_id(&self) -> MerchPackId {
        self.merch_pack_id
    }

    pub fn requested_at(&self) -> MerchRequestDateTime {
        self.requested_at
    }

    pub fn status(&self) -> MerchRequestStatus {
        self.status
    }

    pub fn origin(&self) -> MerchRequestFromType {
        self.origin
    }

    /// Returns true if the request is done or canceled.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}
