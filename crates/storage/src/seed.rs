//! Mock catalog and request history used for local runs and tests.

use chrono::{TimeZone, Utc};
use domain::{
    DomainError, Email, Employee, EmployeeFullName, MerchItem, MerchPack, MerchPackId,
    MerchPackType, MerchRequest, MerchRequestDateTime, MerchRequestFromType, MerchRequestId,
    MerchRequestStatus,
};

/// One pack per declared [`MerchPackType`], ids 1 through 5 in declaration order.
pub fn mock_merch_packs() -> Result<Vec<MerchPack>, DomainError> {
    let contents: [(MerchPackType, &[(i64, i32)]); 5] = [
        (MerchPackType::WelcomePack, &[(1001, 1), (1002, 1), (1003, 2)]),
        (MerchPackType::ConferenceListenerPack, &[(2001, 1), (2002, 1)]),
        (MerchPackType::ConferenceSpeakerPack, &[(3001, 1), (3002, 1), (2002, 1)]),
        (MerchPackType::ProbationPeriodEndingPack, &[(4001, 1), (1003, 1)]),
        (MerchPackType::VeteranPack, &[(5001, 1), (5002, 1)]),
    ];

    contents
        .into_iter()
        .zip(1..)
        .map(|((pack_type, items), id)| {
            let items = items
                .iter()
                .map(|&(sku, quantity)| MerchItem::new(sku, quantity))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(MerchPack::restore(MerchPackId::new(id), pack_type, items))
        })
        .collect()
}

/// Three historical requests referencing packs from [`mock_merch_packs`].
pub fn mock_merch_requests() -> Result<Vec<MerchRequest>, DomainError> {
    let rows = [
        (
            1,
            "iivanov@mail.com",
            ("Ivan", "Ivanov", "Ivanovich"),
            1,
            21,
            MerchRequestStatus::Done,
            MerchRequestFromType::Automatically,
        ),
        (
            2,
            "ppetrov@mail.com",
            ("Petr", "Petrov", "Petrovich"),
            2,
            22,
            MerchRequestStatus::AwaitingDelivery,
            MerchRequestFromType::Manually,
        ),
        (
            3,
            "aivanova@mail.com",
            ("Anna", "Ivanova", "Ivanovna"),
            5,
            23,
            MerchRequestStatus::Canceled,
            MerchRequestFromType::Manually,
        ),
    ];

    rows.into_iter()
        .map(|(id, email, (first, last, patronymic), pack, day, status, origin)| {
            let employee = Employee::new(
                Email::parse(email)?,
                EmployeeFullName::new(first, last, patronymic)?,
            );
            let requested_at = Utc
                .with_ymd_and_hms(2020, 12, day, 0, 0, 0)
                .single()
                .unwrap_or_default();

            Ok(MerchRequest::restore(
                MerchRequestId::new(id),
                1,
                employee,
                MerchPackId::new(pack),
                MerchRequestDateTime::new(requested_at),
                status,
                origin,
            ))
        })
        .collect()
}
