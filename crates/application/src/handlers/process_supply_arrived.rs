//! Hand out packs that were waiting for a supply.

use std::collections::BTreeMap;

use async_trait::async_trait;
use domain::{Aggregate, MerchPackType, MerchRequest, MerchRequestStatus};
use serde::{Deserialize, Serialize};
use storage::{CancellationToken, MerchRequestRepository, Storage, UnitOfWork};

use super::{find_pack, parse_pack_type, queue_issued};
use crate::command::Command;
use crate::error::Result;
use crate::outbox::Outbox;
use crate::pipeline::CommandHandler;
use crate::services::StockService;
use crate::validation::{Rules, ValidationFailure, Validator};

/// A supply of the listed pack types has arrived.
///
/// Every `AwaitingDelivery` request for a pack that is now in stock becomes
/// `Done` and its employee is notified. Returns the requests that changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessSupplyArrived {
    pub merch_pack_type_ids: Vec<i32>,
}

impl Command for ProcessSupplyArrived {
    const NAME: &'static str = "ProcessSupplyArrived";
    type Output = Vec<MerchRequest>;
}

pub struct ProcessSupplyArrivedValidator;

impl Validator<ProcessSupplyArrived> for ProcessSupplyArrivedValidator {
    fn validate(&self, command: &ProcessSupplyArrived) -> Vec<ValidationFailure> {
        command
            .merch_pack_type_ids
            .iter()
            .fold(
                Rules::new().not_empty("merch_pack_type_ids", &command.merch_pack_type_ids),
                |rules, &id| rules.declared::<MerchPackType>("merch_pack_type_ids", id),
            )
            .finish()
    }
}

pub struct ProcessSupplyArrivedHandler<K> {
    stock: K,
}

impl<K> ProcessSupplyArrivedHandler<K> {
    pub fn new(stock: K) -> Self {
        Self { stock }
    }
}

#[async_trait]
impl<S, K> CommandHandler<ProcessSupplyArrived, S> for ProcessSupplyArrivedHandler<K>
where
    S: Storage,
    K: StockService,
{
    /// Availability of every distinct pack type in the supply.
    type Checked = BTreeMap<MerchPackType, bool>;

    async fn check(
        &self,
        command: &ProcessSupplyArrived,
        _cancel: &CancellationToken,
    ) -> Result<BTreeMap<MerchPackType, bool>> {
        let mut availability = BTreeMap::new();
        for &type_id in &command.merch_pack_type_ids {
            let pack_type = parse_pack_type(type_id)?;
            if !availability.contains_key(&pack_type) {
                availability.insert(pack_type, self.stock.is_available(pack_type).await?);
            }
        }
        Ok(availability)
    }

    #[tracing::instrument(skip_all)]
    async fn handle(
        &self,
        uow: &mut UnitOfWork<S>,
        _command: ProcessSupplyArrived,
        availability: BTreeMap<MerchPackType, bool>,
        outbox: &mut Outbox,
        cancel: &CancellationToken,
    ) -> Result<Vec<MerchRequest>> {
        let mut delivered = Vec::new();

        for (pack_type, in_stock) in availability {
            let pack = find_pack(uow, pack_type, cancel).await?;
            if !in_stock {
                tracing::debug!(%pack_type, "still out of stock");
                continue;
            }

            let waiting = uow
                .merch_requests()?
                .find_by_merch_pack_and_status(
                    pack.id(),
                    MerchRequestStatus::AwaitingDelivery,
                    cancel,
                )
                .await?;

            for request in waiting {
                let done = uow
                    .merch_requests()?
                    .update(&request.with_status(MerchRequestStatus::Done), cancel)
                    .await?;
                queue_issued(outbox, &done, pack_type);
                delivered.push(done);
            }
        }

        tracing::info!(delivered = delivered.len(), "supply processed");
        Ok(delivered)
    }
}
