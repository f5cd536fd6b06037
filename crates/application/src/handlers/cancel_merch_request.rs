//! Withdraw an employee's pending merch request.

use async_trait::async_trait;
use domain::{Aggregate, Email, MerchPackType, MerchRequest, MerchRequestStatus};
use serde::{Deserialize, Serialize};
use storage::{CancellationToken, MerchRequestRepository, Storage, UnitOfWork};

use super::{find_pack, parse_pack_type};
use crate::command::Command;
use crate::error::{ApplicationError, Result};
use crate::outbox::Outbox;
use crate::pipeline::CommandHandler;
use crate::validation::{Rules, ValidationFailure, Validator};

/// Cancel every request of the employee for the pack that is not yet `Done`
/// or `Canceled`. Returns the canceled requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelMerchRequest {
    pub email: String,
    pub merch_pack_type_id: i32,
}

impl Command for CancelMerchRequest {
    const NAME: &'static str = "CancelMerchRequest";
    type Output = Vec<MerchRequest>;
}

pub struct CancelMerchRequestValidator;

impl Validator<CancelMerchRequest> for CancelMerchRequestValidator {
    fn validate(&self, command: &CancelMerchRequest) -> Vec<ValidationFailure> {
        Rules::new()
            .email("email", &command.email)
            .declared::<MerchPackType>("merch_pack_type_id", command.merch_pack_type_id)
            .finish()
    }
}

#[derive(Debug, Default)]
pub struct CancelMerchRequestHandler;

#[async_trait]
impl<S: Storage> CommandHandler<CancelMerchRequest, S> for CancelMerchRequestHandler {
    type Checked = ();

    #[tracing::instrument(skip_all, fields(pack_type_id = command.merch_pack_type_id))]
    async fn handle(
        &self,
        uow: &mut UnitOfWork<S>,
        command: CancelMerchRequest,
        _checked: (),
        _outbox: &mut Outbox,
        cancel: &CancellationToken,
    ) -> Result<Vec<MerchRequest>> {
        let email = Email::parse(&command.email)?;
        let pack_type = parse_pack_type(command.merch_pack_type_id)?;
        let pack = find_pack(uow, pack_type, cancel).await?;

        let mut requests = uow.merch_requests()?;
        let active: Vec<_> = requests
            .find_by_employee_and_merch_pack(&email, pack.id(), cancel)
            .await?
            .into_iter()
            .filter(|request| !request.is_terminal())
            .collect();

        if active.is_empty() {
            return Err(ApplicationError::NoActiveRequest {
                email,
                pack_type: pack.pack_type(),
            });
        }

        let mut canceled = Vec::with_capacity(active.len());
        for request in active {
            let updated = requests
                .update(&request.with_status(MerchRequestStatus::Canceled), cancel)
                .await?;
            canceled.push(updated);
        }

        tracing::info!(canceled = canceled.len(), "merch requests canceled");
        Ok(canceled)
    }
}
