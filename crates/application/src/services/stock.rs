//! Stock availability trait and in-memory implementation.

use std::collections::HashSet;
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use domain::MerchPackType;

use crate::error::ApplicationError;

/// Trait for checking whether a merch pack can be handed out right now.
///
/// Checks are read-only: asking never reserves stock.
#[async_trait]
pub trait StockService: Send + Sync {
    async fn is_available(&self, pack_type: MerchPackType) -> Result<bool, ApplicationError>;
}

#[async_trait]
impl<T: StockService + ?Sized> StockService for Arc<T> {
    async fn is_available(&self, pack_type: MerchPackType) -> Result<bool, ApplicationError> {
        (**self).is_available(pack_type).await
    }
}

#[derive(Debug, Default)]
struct InMemoryStockState {
    out_of_stock: HashSet<MerchPackType>,
    checks: usize,
    fail_on_check: bool,
}

/// In-memory stock service for testing.
///
/// Every pack type is in stock until marked otherwise.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStockService {
    state: Arc<RwLock<InMemoryStockState>>,
}

impl InMemoryStockService {
    /// Creates a new in-memory stock service.
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `pack_type` as in or out of stock.
    pub fn set_available(&self, pack_type: MerchPackType, available: bool) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if available {
            state.out_of_stock.remove(&pack_type);
        } else {
            state.out_of_stock.insert(pack_type);
        }
    }

    /// Configures the service to fail every check until reset.
    pub fn set_fail_on_check(&self, fail: bool) {
        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .fail_on_check = fail;
    }

    /// Returns the number of availability checks answered so far.
    pub fn check_count(&self) -> usize {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .checks
    }
}

#[async_trait]
impl StockService for InMemoryStockService {
    async fn is_available(&self, pack_type: MerchPackType) -> Result<bool, ApplicationError> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);

        if state.fail_on_check {
            return Err(ApplicationError::Stock(format!(
                "Stock service unavailable while checking {pack_type}"
            )));
        }

        state.checks += 1;
        Ok(!state.out_of_stock.contains(&pack_type))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_everything_in_stock_by_default() {
        let service = InMemoryStockService::new();
        assert!(service.is_available(MerchPackType::WelcomePack).await.unwrap());
        assert!(service.is_available(MerchPackType::VeteranPack).await.unwrap());
        assert_eq!(service.check_count(), 2);
    }

    #[tokio::test]
    async fn test_set_available() {
        let service = InMemoryStockService::new();
        service.set_available(MerchPackType::ConferenceSpeakerPack, false);

        assert!(
            !service
                .is_available(MerchPackType::ConferenceSpeakerPack)
                .await
                .unwrap()
        );
        assert!(service.is_available(MerchPackType::WelcomePack).await.unwrap());

        service.set_available(MerchPackType::ConferenceSpeakerPack, true);
        assert!(
            service
                .is_available(MerchPackType::ConferenceSpeakerPack)
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_fail_on_check() {
        let service = InMemoryStockService::new();
        service.set_fail_on_check(true);

        let result = service.is_available(MerchPackType::WelcomePack).await;
        assert!(matches!(result, Err(ApplicationError::Stock(_))));
        assert_eq!(service.check_count(), 0);
    }
}
