use std::future::Future;

use async_trait::async_trait;
use domain::{MerchPack, MerchPackId, MerchRequest, MerchRequestId};
use tokio_util::sync::CancellationToken;

use crate::{Change, MerchPackQuery, MerchRequestQuery, Result, StorageError};

/// A backing store that hands out transactions.
///
/// Implementations are cheap to clone (they share a pool or an `Arc`) and
/// thread-safe; every unit of work begins its own transaction.
#[async_trait]
pub trait Storage: Clone + Send + Sync + 'static {
    /// The transaction type for this backend.
    type Transaction: StorageTransaction;

    /// Opens a new transaction.
    async fn begin(&self) -> Result<Self::Transaction>;
}

/// One open transaction against a backing store.
///
/// Reads see committed data only. Writes are handed over in one batch by
/// [`apply`](StorageTransaction::apply) and become visible to others only
/// after [`commit`](StorageTransaction::commit).
#[async_trait]
pub trait StorageTransaction: Send {
    /// Reserves the next merch request identity.
    ///
    /// Identities are strictly increasing and never reused, even when the
    /// transaction that reserved them rolls back.
    async fn next_merch_request_id(&mut self) -> Result<MerchRequestId>;

    /// Reserves the next merch pack identity.
    async fn next_merch_pack_id(&mut self) -> Result<MerchPackId>;

    /// Returns every merch request matching the query, in identity order.
    async fn query_merch_requests(&mut self, query: &MerchRequestQuery)
    -> Result<Vec<MerchRequest>>;

    /// Returns every merch pack matching the query, in identity order.
    async fn query_merch_packs(&mut self, query: &MerchPackQuery) -> Result<Vec<MerchPack>>;

    /// Writes a batch of changes inside the transaction.
    ///
    /// Either every change is written or the call fails and the transaction
    /// must be rolled back.
    async fn apply(&mut self, changes: Vec<Change>) -> Result<()>;

    /// Makes the applied changes durable and visible.
    async fn commit(self) -> Result<()>;

    /// Discards the transaction.
    async fn rollback(self) -> Result<()>;
}

/// Runs `operation` unless `cancel` fires first.
///
/// Returns [`StorageError::Cancelled`] without polling `operation` when the
/// token is already cancelled.
pub async fn cancellable<T, F>(cancel: &CancellationToken, operation: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    if cancel.is_cancelled() {
        return Err(StorageError::Cancelled);
    }

    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(StorageError::Cancelled),
        result = operation => result,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn cancellable_passes_result_through() {
        let cancel = CancellationToken::new();
        let result = cancellable(&cancel, async { Ok(7) }).await;
        assert_eq!(result.unwrap(), 7);
    }

    #[tokio::test]
    async fn cancelled_token_skips_the_operation() {
        let cancel = CancellationToken::new();
        cancel.cancel();

        let mut polled = false;
        let result: Result<()> = cancellable(&cancel, async {
            polled = true;
            Ok(())
        })
        .await;

        assert!(matches!(result, Err(StorageError::Cancelled)));
        assert!(!polled);
    }

    #[tokio::test]
    async fn cancellation_interrupts_pending_operation() {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();

        let handle = tokio::spawn(async move {
            cancellable(&cancel, async {
                std::future::pending::<()>().await;
                Ok(())
            })
            .await
        });

        trigger.cancel();
        let result = handle.await.unwrap();
        assert!(matches!(result, Err(StorageError::Cancelled)));
    }
}
