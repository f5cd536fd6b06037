//! Composition root for the merch request service.
//!
//! Reads [`Config`], installs structured logging and Prometheus metrics, and
//! wires a [`MerchService`] over the configured storage backend.

pub mod config;
pub mod error;
pub mod request;
pub mod telemetry;

use application::{InMemoryEmailService, InMemoryStockService, MerchService};
use storage::{InMemoryStorage, PostgresStorage};

pub use config::{Config, LogFormat};
pub use error::AppError;
pub use request::{Request, dispatch, handle_line};

/// Builds the service over PostgreSQL when a database is configured, and over
/// in-memory storage otherwise.
///
/// PostgreSQL migrations run before the service is returned. When
/// [`Config::should_seed`] holds, the mock catalog and requests are loaded.
pub async fn build_service(config: &Config) -> Result<MerchService, AppError> {
    let email = InMemoryEmailService::new();
    let stock = InMemoryStockService::new();

    match config.database() {
        Some(database) => {
            let storage = PostgresStorage::connect(&database).await?;
            storage.run_migrations().await?;
            if config.should_seed() {
                storage.seed_mock_data().await?;
            }
            tracing::info!(
                max_connections = database.max_connections,
                "using PostgreSQL storage"
            );
            Ok(MerchService::new(storage, email, stock))
        }
        None => {
            let storage = if config.should_seed() {
                InMemoryStorage::with_mock_data()?
            } else {
                InMemoryStorage::new()
            };
            tracing::info!(seeded = config.should_seed(), "using in-memory storage");
            Ok(MerchService::new(storage, email, stock))
        }
    }
}
