//! Issue a merch pack to an employee.

use async_trait::async_trait;
use common::Enumeration;
use domain::{
    Aggregate, DomainError, Email, Employee, EmployeeFullName, MerchPackType, MerchRequest,
    MerchRequestDateTime, MerchRequestFromType, MerchRequestStatus,
};
use serde::{Deserialize, Serialize};
use storage::{CancellationToken, MerchRequestRepository, Storage, UnitOfWork};

use super::{find_pack, parse_pack_type, queue_issued};
use crate::command::Command;
use crate::error::{ApplicationError, Result};
use crate::outbox::Outbox;
use crate::pipeline::CommandHandler;
use crate::services::StockService;
use crate::validation::{Rules, ValidationFailure, Validator};

/// Raise a merch request for an employee.
///
/// The request is created as `Done` when the pack is in stock, otherwise as
/// `AwaitingDelivery` until a supply arrives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueMerch {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub patronymic: String,
    pub merch_pack_type_id: i32,
    pub from_type_id: i32,
}

impl Command for IssueMerch {
    const NAME: &'static str = "IssueMerch";
    type Output = MerchRequest;
}

pub struct IssueMerchValidator;

impl Validator<IssueMerch> for IssueMerchValidator {
    fn validate(&self, command: &IssueMerch) -> Vec<ValidationFailure> {
        Rules::new()
            .email("email", &command.email)
            .not_blank("first_name", &command.first_name)
            .not_blank("last_name", &command.last_name)
            .declared::<MerchPackType>("merch_pack_type_id", command.merch_pack_type_id)
            .declared::<MerchRequestFromType>("from_type_id", command.from_type_id)
            .finish()
    }
}

pub struct IssueMerchHandler<K> {
    stock: K,
}

impl<K> IssueMerchHandler<K> {
    pub fn new(stock: K) -> Self {
        Self { stock }
    }
}

#[async_trait]
impl<S, K> CommandHandler<IssueMerch, S> for IssueMerchHandler<K>
where
    S: Storage,
    K: StockService,
{
    /// Whether the pack was in stock when the command arrived.
    type Checked = bool;

    async fn check(&self, command: &IssueMerch, _cancel: &CancellationToken) -> Result<bool> {
        self.stock
            .is_available(parse_pack_type(command.merch_pack_type_id)?)
            .await
    }

    #[tracing::instrument(skip_all, fields(pack_type_id = command.merch_pack_type_id))]
    async fn handle(
        &self,
        uow: &mut UnitOfWork<S>,
        command: IssueMerch,
        in_stock: bool,
        outbox: &mut Outbox,
        cancel: &CancellationToken,
    ) -> Result<MerchRequest> {
        let email = Email::parse(&command.email)?;
        let full_name =
            EmployeeFullName::new(command.first_name, command.last_name, command.patronymic)?;
        let origin =
            MerchRequestFromType::from_id(command.from_type_id).map_err(DomainError::from)?;
        let pack_type = parse_pack_type(command.merch_pack_type_id)?;
        let pack = find_pack(uow, pack_type, cancel).await?;

        let previous = uow
            .merch_requests()?
            .find_by_employee_and_merch_pack(&email, pack.id(), cancel)
            .await?;
        if previous
            .iter()
            .any(|request| request.status() != MerchRequestStatus::Canceled)
        {
            return Err(ApplicationError::AlreadyIssued {
                email,
                pack_type: pack.pack_type(),
            });
        }

        let status = if in_stock {
            MerchRequestStatus::Done
        } else {
            MerchRequestStatus::AwaitingDelivery
        };

        let request = MerchRequest::new(
            Employee::new(email, full_name),
            pack.id(),
            MerchRequestDateTime::now(),
            status,
            origin,
        );
        let created = uow.merch_requests()?.create(&request, cancel).await?;

        if in_stock {
            queue_issued(outbox, &created, pack.pack_type());
        }

        tracing::info!(id = %created.id(), %status, "merch request created");
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command() -> IssueMerch {
        IssueMerch {
            email: "iivanov@mail.com".to_string(),
            first_name: "Ivan".to_string(),
            last_name: "Ivanov".to_string(),
            patronymic: "Ivanovich".to_string(),
            merch_pack_type_id: MerchPackType::WelcomePack.id(),
            from_type_id: MerchRequestFromType::Manually.id(),
        }
    }

    #[test]
    fn valid_command_passes() {
        assert!(IssueMerchValidator.validate(&command()).is_empty());
    }

    #[test]
    fn patronymic_is_optional() {
        let command = IssueMerch {
            patronymic: String::new(),
            ..command()
        };
        assert!(IssueMerchValidator.validate(&command).is_empty());
    }

    #[test]
    fn every_invalid_field_is_reported() {
        let command = IssueMerch {
            email: "ivanov".to_string(),
            first_name: " ".to_string(),
            merch_pack_type_id: 11,
            from_type_id: 0,
            ..command()
        };
        let fields: Vec<_> = IssueMerchValidator
            .validate(&command)
            .into_iter()
            .map(|failure| failure.field)
            .collect();
        assert_eq!(
            fields,
            vec!["email", "first_name", "merch_pack_type_id", "from_type_id"]
        );
    }

    #[test]
    fn deserializes_without_patronymic() {
        let command: IssueMerch = serde_json::from_value(serde_json::json!({
            "email": "ppetrov@mail.com",
            "first_name": "Petr",
            "last_name": "Petrov",
            "merch_pack_type_id": 20,
            "from_type_id": 2
        }))
        .unwrap();
        assert_eq!(command.patronymic, "");
    }
}
