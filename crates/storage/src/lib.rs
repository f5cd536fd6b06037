//! Persistence layer for the merch request service.
//!
//! Handlers work against a [`UnitOfWork`]: it opens one transaction, hands out
//! repository views that record writes in a [`ChangeTracker`], and applies the
//! tracked batch atomically on commit. Two backends implement [`Storage`]:
//! [`InMemoryStorage`] for tests and local runs, [`PostgresStorage`] for
//! production.

pub mod change_tracker;
pub mod config;
pub mod error;
pub mod memory;
pub mod postgres;
pub mod query;
pub mod repository;
pub mod seed;
pub mod store;
pub mod unit_of_work;

pub use change_tracker::{Change, ChangeTracker, EntityKey, TrackedEntity};
pub use config::DatabaseConfig;
pub use error::{Result, StorageError};
pub use memory::{InMemoryStorage, InMemoryTransaction};
pub use postgres::{PostgresStorage, PostgresTransaction};
pub use query::{MerchPackQuery, MerchRequestQuery};
pub use repository::{MerchPackRepository, MerchPacks, MerchRequestRepository, MerchRequests};
pub use store::{Storage, StorageTransaction, cancellable};
pub use unit_of_work::UnitOfWork;
pub use tokio_util::sync::CancellationToken;
