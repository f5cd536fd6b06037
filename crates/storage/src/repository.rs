//! Per-aggregate repository contracts and their unit-of-work implementations.
//!
//! Writes never touch the store directly: `create`, `update` and `remove`
//! register with the [`ChangeTracker`] and the owning
//! [`UnitOfWork`](crate::UnitOfWork) persists them at commit. Reads go
//! through the open transaction and see committed data.

use async_trait::async_trait;
use domain::{
    Aggregate, DomainError, Email, MerchPack, MerchPackId, MerchPackType, MerchRequest,
    MerchRequestStatus,
};
use tokio_util::sync::CancellationToken;

use crate::change_tracker::EntityKey;
use crate::store::{StorageTransaction, cancellable};
use crate::{ChangeTracker, MerchPackQuery, MerchRequestQuery, Result, StorageError};

/// Repository contract for the [`MerchRequest`] aggregate.
///
/// Every operation honours `cancel`: once it fires the call returns
/// [`StorageError::Cancelled`] and registers nothing. Queries return an empty
/// vector when nothing matches.
#[async_trait]
pub trait MerchRequestRepository: Send {
    /// Assigns a new identity (greater than every identity handed out so far)
    /// and returns the created request. `item` itself is left untouched.
    async fn create(
        &mut self,
        item: &MerchRequest,
        cancel: &CancellationToken,
    ) -> Result<MerchRequest>;

    /// Replaces the stored request wholesale.
    ///
    /// Fails with [`StorageError::MissingIdentity`] if `item` has no identity.
    async fn update(
        &mut self,
        item: &MerchRequest,
        cancel: &CancellationToken,
    ) -> Result<MerchRequest>;

    /// Requests for the given pack in the given status.
    async fn find_by_merch_pack_and_status(
        &mut self,
        merch_pack_id: MerchPackId,
        status: MerchRequestStatus,
        cancel: &CancellationToken,
    ) -> Result<Vec<MerchRequest>>;

    /// Requests of the given employee in the given status.
    async fn find_by_employee_and_status(
        &mut self,
        email: &Email,
        status: MerchRequestStatus,
        cancel: &CancellationToken,
    ) -> Result<Vec<MerchRequest>>;

    /// Requests of the given employee for the given pack, in any status.
    async fn find_by_employee_and_merch_pack(
        &mut self,
        email: &Email,
        merch_pack_id: MerchPackId,
        cancel: &CancellationToken,
    ) -> Result<Vec<MerchRequest>>;
}

/// Repository contract for the [`MerchPack`] catalog aggregate.
#[async_trait]
pub trait MerchPackRepository: Send {
    /// Assigns a new identity and returns the created pack.
    async fn create(&mut self, item: &MerchPack, cancel: &CancellationToken)
    -> Result<MerchPack>;

    /// Replaces the stored pack wholesale.
    async fn update(&mut self, item: &MerchPack, cancel: &CancellationToken)
    -> Result<MerchPack>;

    /// Withdraws a pack from the catalog.
    async fn remove(&mut self, id: MerchPackId, cancel: &CancellationToken) -> Result<()>;

    /// The pack with the given identity, if it exists.
    async fn find_by_id(
        &mut self,
        id: MerchPackId,
        cancel: &CancellationToken,
    ) -> Result<Option<MerchPack>>;

    /// Packs of the given type.
    async fn find_by_type(
        &mut self,
        pack_type: MerchPackType,
        cancel: &CancellationToken,
    ) -> Result<Vec<MerchPack>>;
}

/// [`MerchRequestRepository`] bound to one unit of work.
pub struct MerchRequests<'a, T: StorageTransaction> {
    transaction: &'a mut T,
    tracker: &'a mut ChangeTracker,
}

impl<'a, T: StorageTransaction> MerchRequests<'a, T> {
    pub(crate) fn new(transaction: &'a mut T, tracker: &'a mut ChangeTracker) -> Self {
        Self {
            transaction,
            tracker,
        }
    }

    async fn query(
        &mut self,
        query: MerchRequestQuery,
        cancel: &CancellationToken,
    ) -> Result<Vec<MerchRequest>> {
        cancellable(cancel, self.transaction.query_merch_requests(&query)).await
    }
}

#[async_trait]
impl<T: StorageTransaction> MerchRequestRepository for MerchRequests<'_, T> {
    async fn create(
        &mut self,
        item: &MerchRequest,
        cancel: &CancellationToken,
    ) -> Result<MerchRequest> {
        if item.has_identity() {
            return Err(DomainError::IdentityAlreadyAssigned {
                aggregate_type: MerchRequest::aggregate_type(),
                id: item.id().as_i64(),
            }
            .into());
        }

        let id = cancellable(cancel, self.transaction.next_merch_request_id()).await?;
        let created = item.with_identity(id)?;
        self.tracker.track_added(created.clone());
        Ok(created)
    }

    async fn update(
        &mut self,
        item: &MerchRequest,
        cancel: &CancellationToken,
    ) -> Result<MerchRequest> {
        if !item.has_identity() {
            return Err(StorageError::MissingIdentity {
                aggregate_type: MerchRequest::aggregate_type(),
            });
        }
        if cancel.is_cancelled() {
            return Err(StorageError::Cancelled);
        }

        self.tracker
            .track_modified(item.clone(), Some(item.version()));
        Ok(item.clone())
    }

    async fn find_by_merch_pack_and_status(
        &mut self,
        merch_pack_id: MerchPackId,
        status: MerchRequestStatus,
        cancel: &CancellationToken,
    ) -> Result<Vec<MerchRequest>> {
        let query = MerchRequestQuery::new()
            .merch_pack_id(merch_pack_id)
            .status(status);
        self.query(query, cancel).await
    }

    async fn find_by_employee_and_status(
        &mut self,
        email: &Email,
        status: MerchRequestStatus,
        cancel: &CancellationToken,
    ) -> Result<Vec<MerchRequest>> {
        let query = MerchRequestQuery::new()
            .employee_email(email.clone())
            .status(status);
        self.query(query, cancel).await
    }

    async fn find_by_employee_and_merch_pack(
        &mut self,
        email: &Email,
        merch_pack_id: MerchPackId,
        cancel: &CancellationToken,
    ) -> Result<Vec<MerchRequest>> {
        let query = MerchRequestQuery::new()
            .employee_email(email.clone())
            .merch_pack_id(merch_pack_id);
        self.query(query, cancel).await
    }
}

/// [`MerchPackRepository`] bound to one unit of work.
pub struct MerchPacks<'a, T: StorageTransaction> {
    transaction: &'a mut T,
    tracker: &'a mut ChangeTracker,
}

impl<'a, T: StorageTransaction> MerchPacks<'a, T> {
    pub(crate) fn new(transaction: &'a mut T, tracker: &'a mut ChangeTracker) -> Self {
        Self {
            transaction,
            tracker,
        }
    }
}

#[async_trait]
impl<T: StorageTransaction> MerchPackRepository for MerchPacks<'_, T> {
    async fn create(&mut self, item: &MerchPack, cancel: &CancellationToken) -> Result<MerchPack> {
        if item.has_identity() {
            return Err(DomainError::IdentityAlreadyAssigned {
                aggregate_type: MerchPack::aggregate_type(),
                id: item.id().as_i64(),
            }
            .into());
        }

        let id = cancellable(cancel, self.transaction.next_merch_pack_id()).await?;
        let created = item.with_identity(id)?;
        self.tracker.track_added(created.clone());
        Ok(created)
    }

    async fn update(&mut self, item: &MerchPack, cancel: &CancellationToken) -> Result<MerchPack> {
        if !item.has_identity() {
            return Err(StorageError::MissingIdentity {
                aggregate_type: MerchPack::aggregate_type(),
            });
        }
        if cancel.is_cancelled() {
            return Err(StorageError::Cancelled);
        }

        self.tracker.track_modified(item.clone(), None);
        Ok(item.clone())
    }

    async fn remove(&mut self, id: MerchPackId, cancel: &CancellationToken) -> Result<()> {
        if id.is_unset() {
            return Err(StorageError::MissingIdentity {
                aggregate_type: MerchPack::aggregate_type(),
            });
        }
        if cancel.is_cancelled() {
            return Err(StorageError::Cancelled);
        }

        self.tracker.track_removed(EntityKey::MerchPack(id));
        Ok(())
    }

    async fn find_by_id(
        &mut self,
        id: MerchPackId,
        cancel: &CancellationToken,
    ) -> Result<Option<MerchPack>> {
        let query = MerchPackQuery::new().id(id);
        let packs = cancellable(cancel, self.transaction.query_merch_packs(&query)).await?;
        Ok(packs.into_iter().next())
    }

    async fn find_by_type(
        &mut self,
        pack_type: MerchPackType,
        cancel: &CancellationToken,
    ) -> Result<Vec<MerchPack>> {
        let query = MerchPackQuery::new().pack_type(pack_type);
        cancellable(cancel, self.transaction.query_merch_packs(&query)).await
    }
}
