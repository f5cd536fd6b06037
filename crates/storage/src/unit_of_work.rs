//! Transaction boundary for one command.

use tokio_util::sync::CancellationToken;

use crate::repository::{MerchPacks, MerchRequests};
use crate::store::{Storage, StorageTransaction, cancellable};
use crate::{Change, ChangeTracker, Result, StorageError};

enum State<T> {
    Idle,
    Active(T),
    Committed,
    RolledBack,
}

impl<T> State<T> {
    fn name(&self) -> &'static str {
        match self {
            State::Idle => "idle",
            State::Active(_) => "active",
            State::Committed => "committed",
            State::RolledBack => "rolled back",
        }
    }
}

/// Unit of work over a [`Storage`] backend.
///
/// Owns one transaction and one [`ChangeTracker`]. Repository views obtained
/// from [`merch_requests`](Self::merch_requests) and
/// [`merch_packs`](Self::merch_packs) read through the transaction and
/// register writes with the tracker; nothing reaches the store until
/// [`commit`](Self::commit), which applies every tracked change as one
/// atomic batch.
///
/// Lifecycle: `begin` once, then exactly one of `commit` or `rollback`. Any
/// other sequence fails with [`StorageError::InvalidState`]. A unit of work
/// dropped while active discards its transaction.
pub struct UnitOfWork<S: Storage> {
    storage: S,
    state: State<S::Transaction>,
    tracker: ChangeTracker,
}

impl<S: Storage> UnitOfWork<S> {
    /// Creates an idle unit of work.
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            state: State::Idle,
            tracker: ChangeTracker::new(),
        }
    }

    /// Starts the transaction scope.
    pub async fn begin(&mut self, cancel: &CancellationToken) -> Result<()> {
        if !matches!(self.state, State::Idle) {
            return Err(self.invalid_state("idle"));
        }

        let transaction = cancellable(cancel, self.storage.begin()).await?;
        self.state = State::Active(transaction);
        tracing::debug!("unit of work started");
        Ok(())
    }

    /// Persists every tracked change atomically, then clears the tracker.
    ///
    /// If the token is already cancelled, or the store rejects the batch, the
    /// transaction is rolled back and the error returned. Once the write has
    /// started it runs to completion regardless of the token.
    pub async fn commit(&mut self, cancel: &CancellationToken) -> Result<()> {
        let mut transaction = self.take_active()?;

        let changes = self.tracker.take();
        let change_count = changes.len();

        if cancel.is_cancelled() {
            self.finish_rollback(transaction, "cancelled before commit")
                .await;
            return Err(StorageError::Cancelled);
        }

        if let Err(e) = transaction.apply(changes).await {
            self.finish_rollback(transaction, "store rejected changes")
                .await;
            return Err(e);
        }

        match transaction.commit().await {
            Ok(()) => {
                self.state = State::Committed;
                metrics::counter!("unit_of_work_commits_total").increment(1);
                tracing::info!(changes = change_count, "unit of work committed");
                Ok(())
            }
            Err(e) => {
                self.state = State::RolledBack;
                metrics::counter!("unit_of_work_rollbacks_total").increment(1);
                tracing::warn!(error = %e, "commit failed, transaction rolled back");
                Err(e)
            }
        }
    }

    /// Discards the tracked changes and the transaction without persisting.
    pub async fn rollback(&mut self) -> Result<()> {
        let transaction = self.take_active()?;

        self.tracker.clear();
        self.finish_rollback(transaction, "requested").await;
        Ok(())
    }

    /// Repository view for merch requests.
    pub fn merch_requests(&mut self) -> Result<MerchRequests<'_, S::Transaction>> {
        match &mut self.state {
            State::Active(transaction) => Ok(MerchRequests::new(transaction, &mut self.tracker)),
            other => Err(StorageError::InvalidState {
                expected: "active",
                actual: other.name(),
            }),
        }
    }

    /// Repository view for merch packs.
    pub fn merch_packs(&mut self) -> Result<MerchPacks<'_, S::Transaction>> {
        match &mut self.state {
            State::Active(transaction) => Ok(MerchPacks::new(transaction, &mut self.tracker)),
            other => Err(StorageError::InvalidState {
                expected: "active",
                actual: other.name(),
            }),
        }
    }

    /// Point-in-time copy of the changes pending commit.
    pub fn pending_changes(&self) -> Vec<Change> {
        self.tracker.snapshot()
    }

    /// Returns true between a successful `begin` and `commit`/`rollback`.
    pub fn is_active(&self) -> bool {
        matches!(self.state, State::Active(_))
    }

    async fn finish_rollback(&mut self, transaction: S::Transaction, reason: &'static str) {
        self.state = State::RolledBack;
        metrics::counter!("unit_of_work_rollbacks_total").increment(1);
        match transaction.rollback().await {
            Ok(()) => tracing::warn!(reason, "unit of work rolled back"),
            // The transaction is gone either way; nothing was committed.
            Err(e) => tracing::error!(reason, error = %e, "rollback failed"),
        }
    }

    fn take_active(&mut self) -> Result<S::Transaction> {
        match std::mem::replace(&mut self.state, State::Idle) {
            State::Active(transaction) => Ok(transaction),
            other => {
                let actual = other.name();
                self.state = other;
                Err(StorageError::InvalidState {
                    expected: "active",
                    actual,
                })
            }
        }
    }

    fn invalid_state(&self, expected: &'static str) -> StorageError {
        StorageError::InvalidState {
            expected,
            actual: self.state.name(),
        }
    }
}

impl<S: Storage> Drop for UnitOfWork<S> {
    fn drop(&mut self) {
        if self.is_active() {
            tracing::warn!(
                pending = self.tracker.len(),
                "unit of work dropped while active; discarding transaction"
            );
        }
    }
}
