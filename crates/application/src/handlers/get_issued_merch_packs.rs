//! List the packs an employee has received.

use async_trait::async_trait;
use domain::{
    Email, MerchPackId, MerchPackType, MerchRequest, MerchRequestDateTime, MerchRequestStatus,
};
use serde::{Deserialize, Serialize};
use storage::{
    CancellationToken, MerchPackRepository, MerchRequestRepository, Storage, UnitOfWork,
};

use crate::command::Command;
use crate::error::Result;
use crate::outbox::Outbox;
use crate::pipeline::CommandHandler;
use crate::validation::{Rules, ValidationFailure, Validator};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetIssuedMerchPacks {
    pub email: String,
}

impl Command for GetIssuedMerchPacks {
    const NAME: &'static str = "GetIssuedMerchPacks";
    type Output = Vec<IssuedMerchPack>;
}

/// One pack an employee has received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuedMerchPack {
    pub merch_pack_id: MerchPackId,
    pub pack_type: MerchPackType,
    pub issued_at: MerchRequestDateTime,
}

pub struct GetIssuedMerchPacksValidator;

impl Validator<GetIssuedMerchPacks> for GetIssuedMerchPacksValidator {
    fn validate(&self, command: &GetIssuedMerchPacks) -> Vec<ValidationFailure> {
        Rules::new().email("email", &command.email).finish()
    }
}

#[derive(Debug, Default)]
pub struct GetIssuedMerchPacksHandler;

#[async_trait]
impl<S: Storage> CommandHandler<GetIssuedMerchPacks, S> for GetIssuedMerchPacksHandler {
    type Checked = ();

    #[tracing::instrument(skip_all)]
    async fn handle(
        &self,
        uow: &mut UnitOfWork<S>,
        command: GetIssuedMerchPacks,
        _checked: (),
        _outbox: &mut Outbox,
        cancel: &CancellationToken,
    ) -> Result<Vec<IssuedMerchPack>> {
        let email = Email::parse(&command.email)?;
        let done: Vec<MerchRequest> = uow
            .merch_requests()?
            .find_by_employee_and_status(&email, MerchRequestStatus::Done, cancel)
            .await?;

        let mut issued = Vec::with_capacity(done.len());
        for request in done {
            let merch_pack_id = request.merch_pack_id();
            match uow.merch_packs()?.find_by_id(merch_pack_id, cancel).await? {
                Some(pack) => issued.push(IssuedMerchPack {
                    merch_pack_id,
                    pack_type: pack.pack_type(),
                    issued_at: request.requested_at(),
                }),
                None => tracing::warn!(%merch_pack_id, "issued pack no longer in catalog"),
            }
        }

        Ok(issued)
    }
}
