//! Commands, their validators and their handlers.

pub mod cancel_merch_request;
pub mod get_issued_merch_packs;
pub mod issue_merch;
pub mod process_supply_arrived;

pub use cancel_merch_request::{
    CancelMerchRequest, CancelMerchRequestHandler, CancelMerchRequestValidator,
};
pub use get_issued_merch_packs::{
    GetIssuedMerchPacks, GetIssuedMerchPacksHandler, GetIssuedMerchPacksValidator,
    IssuedMerchPack,
};
pub use issue_merch::{IssueMerch, IssueMerchHandler, IssueMerchValidator};
pub use process_supply_arrived::{
    ProcessSupplyArrived, ProcessSupplyArrivedHandler, ProcessSupplyArrivedValidator,
};

use common::Enumeration;
use domain::{DomainError, MerchPack, MerchPackType, MerchRequest};
use storage::{CancellationToken, MerchPackRepository, Storage, UnitOfWork};

use crate::error::{ApplicationError, Result};
use crate::outbox::Outbox;

fn parse_pack_type(merch_pack_type_id: i32) -> Result<MerchPackType> {
    Ok(MerchPackType::from_id(merch_pack_type_id).map_err(DomainError::from)?)
}

/// Resolves a pack type into its catalog entry.
async fn find_pack<S: Storage>(
    uow: &mut UnitOfWork<S>,
    pack_type: MerchPackType,
    cancel: &CancellationToken,
) -> Result<MerchPack> {
    uow.merch_packs()?
        .find_by_type(pack_type, cancel)
        .await?
        .into_iter()
        .next()
        .ok_or(ApplicationError::PackNotInCatalog(pack_type))
}

fn queue_issued(outbox: &mut Outbox, request: &MerchRequest, pack_type: MerchPackType) {
    let body = format!(
        "Hello, {}! Your {} is ready. Please pick it up at the office.",
        request.employee().full_name,
        pack_type
    );
    outbox.push(
        request.employee_email().clone(),
        "Your merch pack is ready",
        body,
    );
}
