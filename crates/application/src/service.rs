use std::sync::Arc;

use domain::MerchRequest;
use storage::{CancellationToken, Storage};

use crate::error::Result;
use crate::handlers::{
    CancelMerchRequest, CancelMerchRequestHandler, CancelMerchRequestValidator,
    GetIssuedMerchPacks, GetIssuedMerchPacksHandler, GetIssuedMerchPacksValidator, IssueMerch,
    IssueMerchHandler, IssueMerchValidator, IssuedMerchPack, ProcessSupplyArrived,
    ProcessSupplyArrivedHandler, ProcessSupplyArrivedValidator,
};
use crate::pipeline::Pipeline;
use crate::services::{EmailService, StockService};

/// One pipeline per command, wired once over a storage backend and the
/// external services.
pub struct MerchService {
    issue_merch: Pipeline<IssueMerch>,
    process_supply_arrived: Pipeline<ProcessSupplyArrived>,
    cancel_merch_request: Pipeline<CancelMerchRequest>,
    get_issued_merch_packs: Pipeline<GetIssuedMerchPacks>,
}

impl MerchService {
    pub fn new<S, E, K>(storage: S, email: E, stock: K) -> Self
    where
        S: Storage,
        E: EmailService + 'static,
        K: StockService + Clone + 'static,
    {
        let notifier: Arc<dyn EmailService> = Arc::new(email);
        Self {
            issue_merch: Pipeline::<IssueMerch>::builder(
                storage.clone(),
                notifier.clone(),
                IssueMerchHandler::new(stock.clone()),
            )
            .validator(IssueMerchValidator)
            .build(),
            process_supply_arrived: Pipeline::<ProcessSupplyArrived>::builder(
                storage.clone(),
                notifier.clone(),
                ProcessSupplyArrivedHandler::new(stock),
            )
            .validator(ProcessSupplyArrivedValidator)
            .build(),
            cancel_merch_request: Pipeline::<CancelMerchRequest>::builder(
                storage.clone(),
                notifier.clone(),
                CancelMerchRequestHandler,
            )
            .validator(CancelMerchRequestValidator)
            .build(),
            get_issued_merch_packs: Pipeline::<GetIssuedMerchPacks>::builder(
                storage,
                notifier,
                GetIssuedMerchPacksHandler,
            )
            .validator(GetIssuedMerchPacksValidator)
            .build(),
        }
    }

    pub async fn issue_merch(
        &self,
        command: IssueMerch,
        cancel: &CancellationToken,
    ) -> Result<MerchRequest> {
        self.issue_merch.execute(command, cancel).await
    }

    pub async fn process_supply_arrived(
        &self,
        command: ProcessSupplyArrived,
        cancel: &CancellationToken,
    ) -> Result<Vec<MerchRequest>> {
        self.process_supply_arrived.execute(command, cancel).await
    }

    pub async fn cancel_merch_request(
        &self,
        command: CancelMerchRequest,
        cancel: &CancellationToken,
    ) -> Result<Vec<MerchRequest>> {
        self.cancel_merch_request.execute(command, cancel).await
    }

    pub async fn get_issued_merch_packs(
        &self,
        command: GetIssuedMerchPacks,
        cancel: &CancellationToken,
    ) -> Result<Vec<IssuedMerchPack>> {
        self.get_issued_merch_packs.execute(command, cancel).await
    }
}
