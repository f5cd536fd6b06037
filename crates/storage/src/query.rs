use domain::{
    Email, MerchPack, MerchPackId, MerchPackType, MerchRequest, MerchRequestStatus,
};

/// Builder for merch request queries.
///
/// Every set field must match; unset fields match anything. Backends
/// return results in identity order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MerchRequestQuery {
    /// Filter by merch pack.
    pub merch_pack_id: Option<MerchPackId>,

    /// Filter by the employee's (normalized) email.
    pub employee_email: Option<Email>,

    /// Filter by status.
    pub status: Option<MerchRequestStatus>,
}

impl MerchRequestQuery {
    /// Creates a new empty query.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn merch_pack_id(mut self, merch_pack_id: MerchPackId) -> Self {
        self.merch_pack_id = Some(merch_pack_id);
        self
    }

    pub fn employee_email(mut self, email: Email) -> Self {
        self.employee_email = Some(email);
        self
    }

    pub fn status(mut self, status: MerchRequestStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Returns true if `request` satisfies every set filter.
    pub fn matches(&self, request: &MerchRequest) -> bool {
        if let Some(pack) = self.merch_pack_id
            && request.merch_pack_id() != pack
        {
            return false;
        }
        if let Some(ref email) = self.employee_email
            && request.employee_email() != email
        {
            return false;
        }
        if let Some(status) = self.status
            && request.status() != status
        {
            return false;
        }
        true
    }
}

/// Builder for merch pack queries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MerchPackQuery {
    /// Filter by identity.
    pub id: Option<MerchPackId>,

    /// Filter by pack type.
    pub pack_type: Option<MerchPackType>,
}

impl MerchPackQuery {
    /// Creates a new empty query.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(mut self, id: MerchPackId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn pack_type(mut self, pack_type: MerchPackType) -> Self {
        self.pack_type = Some(pack_type);
        self
    }

    /// Returns true if `pack` satisfies every set filter.
    pub fn matches(&self, pack: &MerchPack) -> bool {
        use domain::Aggregate;

        if let Some(id) = self.id
            && pack.id() != id
        {
            return false;
        }
        if let Some(pack_type) = self.pack_type
            && pack.pack_type() != pack_type
        {
            return false;
        }
        true
    }
}
