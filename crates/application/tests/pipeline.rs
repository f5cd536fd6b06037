//! End-to-end command scenarios through `MerchService` over the mock data set.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use application::{
    ApplicationError, CancelMerchRequest, GetIssuedMerchPacks, InMemoryEmailService,
    InMemoryStockService, IssueMerch, MerchService, ProcessSupplyArrived,
};
use async_trait::async_trait;
use common::{Enumeration, ErrorKind};
use domain::{
    Aggregate, MerchPack, MerchPackId, MerchPackType, MerchRequest, MerchRequestFromType,
    MerchRequestId, MerchRequestStatus,
};
use storage::{
    CancellationToken, Change, InMemoryStorage, InMemoryTransaction, MerchPackQuery,
    MerchRequestQuery, Storage, StorageError, StorageTransaction,
};

/// Wraps the in-memory backend and counts every call that reaches it.
#[derive(Clone)]
struct SpyStorage {
    inner: InMemoryStorage,
    calls: Arc<AtomicUsize>,
}

impl SpyStorage {
    fn new(inner: InMemoryStorage) -> Self {
        Self {
            inner,
            calls: Arc::default(),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Storage for SpyStorage {
    type Transaction = SpyTransaction;

    async fn begin(&self) -> storage::Result<SpyTransaction> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(SpyTransaction {
            inner: self.inner.begin().await?,
            calls: self.calls.clone(),
        })
    }
}

struct SpyTransaction {
    inner: InMemoryTransaction,
    calls: Arc<AtomicUsize>,
}

impl SpyTransaction {
    fn record(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl StorageTransaction for SpyTransaction {
    async fn next_merch_request_id(&mut self) -> storage::Result<MerchRequestId> {
        self.record();
        self.inner.next_merch_request_id().await
    }

    async fn next_merch_pack_id(&mut self) -> storage::Result<MerchPackId> {
        self.record();
        self.inner.next_merch_pack_id().await
    }

    async fn query_merch_requests(
        &mut self,
        query: &MerchRequestQuery,
    ) -> storage::Result<Vec<MerchRequest>> {
        self.record();
        self.inner.query_merch_requests(query).await
    }

    async fn query_merch_packs(&mut self, query: &MerchPackQuery) -> storage::Result<Vec<MerchPack>> {
        self.record();
        self.inner.query_merch_packs(query).await
    }

    async fn apply(&mut self, changes: Vec<Change>) -> storage::Result<()> {
        self.record();
        self.inner.apply(changes).await
    }

    async fn commit(self) -> storage::Result<()> {
        self.record();
        self.inner.commit().await
    }

    async fn rollback(self) -> storage::Result<()> {
        self.record();
        self.inner.rollback().await
    }
}

struct TestHarness {
    service: MerchService,
    storage: InMemoryStorage,
    email: InMemoryEmailService,
    stock: InMemoryStockService,
    cancel: CancellationToken,
}

impl TestHarness {
    fn new() -> Self {
        let storage = InMemoryStorage::with_mock_data().unwrap();
        let email = InMemoryEmailService::new();
        let stock = InMemoryStockService::new();
        let service = MerchService::new(storage.clone(), email.clone(), stock.clone());

        Self {
            service,
            storage,
            email,
            stock,
            cancel: CancellationToken::new(),
        }
    }
}

fn issue(email: &str, pack_type: MerchPackType) -> IssueMerch {
    IssueMerch {
        email: email.to_string(),
        first_name: "Sidor".to_string(),
        last_name: "Sidorov".to_string(),
        patronymic: String::new(),
        merch_pack_type_id: pack_type.id(),
        from_type_id: MerchRequestFromType::Manually.id(),
    }
}

#[tokio::test]
async fn test_issue_in_stock_completes_and_notifies() {
    let h = TestHarness::new();

    let created = h
        .service
        .issue_merch(issue("ssidorov@mail.com", MerchPackType::WelcomePack), &h.cancel)
        .await
        .unwrap();

    assert_eq!(created.id(), MerchRequestId::new(4));
    assert_eq!(created.version(), 1);
    assert_eq!(created.status(), MerchRequestStatus::Done);
    assert_eq!(created.merch_pack_id(), MerchPackId::new(1));
    assert_eq!(h.storage.merch_request(created.id()).await, Some(created));

    let sent = h.email.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to.as_str(), "ssidorov@mail.com");
    assert_eq!(sent[0].subject, "Your merch pack is ready");
    assert!(sent[0].body.contains("WelcomePack"));
}

#[tokio::test]
async fn test_issue_out_of_stock_waits_for_delivery() {
    let h = TestHarness::new();
    h.stock.set_available(MerchPackType::VeteranPack, false);

    let created = h
        .service
        .issue_merch(issue("ssidorov@mail.com", MerchPackType::VeteranPack), &h.cancel)
        .await
        .unwrap();

    assert_eq!(created.status(), MerchRequestStatus::AwaitingDelivery);
    assert_eq!(created.merch_pack_id(), MerchPackId::new(5));
    assert_eq!(h.email.sent_count(), 0);
    assert_eq!(h.storage.request_count().await, 4);
}

#[tokio::test]
async fn test_issue_twice_is_rejected() {
    let h = TestHarness::new();

    let result = h
        .service
        .issue_merch(issue("iivanov@mail.com", MerchPackType::WelcomePack), &h.cancel)
        .await;

    let err = result.unwrap_err();
    assert!(matches!(
        err,
        ApplicationError::AlreadyIssued {
            pack_type: MerchPackType::WelcomePack,
            ..
        }
    ));
    assert_eq!(err.kind(), ErrorKind::Rejected);
    assert_eq!(h.storage.request_count().await, 3);
    assert_eq!(h.stock.check_count(), 1);
    assert_eq!(h.email.sent_count(), 0);
}

#[tokio::test]
async fn test_issue_after_cancellation_is_allowed() {
    let h = TestHarness::new();

    let created = h
        .service
        .issue_merch(issue("aivanova@mail.com", MerchPackType::VeteranPack), &h.cancel)
        .await
        .unwrap();

    assert_eq!(created.status(), MerchRequestStatus::Done);
    assert_eq!(created.merch_pack_id(), MerchPackId::new(5));
}

#[tokio::test]
async fn test_notification_failure_keeps_the_committed_request() {
    let h = TestHarness::new();
    h.email.set_fail_on_send(true);

    let created = h
        .service
        .issue_merch(issue("ssidorov@mail.com", MerchPackType::WelcomePack), &h.cancel)
        .await
        .unwrap();

    assert_eq!(created.status(), MerchRequestStatus::Done);
    assert_eq!(h.storage.merch_request(created.id()).await, Some(created));
    assert_eq!(h.email.sent_count(), 0);
}

#[tokio::test]
async fn test_failed_commit_sends_no_email() {
    let h = TestHarness::new();
    h.storage.set_fail_on_commit(true);

    let result = h
        .service
        .issue_merch(issue("ssidorov@mail.com", MerchPackType::WelcomePack), &h.cancel)
        .await;

    assert!(matches!(result, Err(ApplicationError::Storage(_))));
    assert_eq!(h.storage.request_count().await, 3);
    assert_eq!(h.email.sent_count(), 0);

    let result = h
        .service
        .process_supply_arrived(
            ProcessSupplyArrived {
                merch_pack_type_ids: vec![MerchPackType::ConferenceListenerPack.id()],
            },
            &h.cancel,
        )
        .await;

    assert!(matches!(result, Err(ApplicationError::Storage(_))));
    let stored = h.storage.merch_request(MerchRequestId::new(2)).await.unwrap();
    assert_eq!(stored.status(), MerchRequestStatus::AwaitingDelivery);
    assert_eq!(h.email.sent_count(), 0);
}

#[tokio::test]
async fn test_stock_check_happens_before_the_transaction() {
    let spy = SpyStorage::new(InMemoryStorage::with_mock_data().unwrap());
    let stock = InMemoryStockService::new();
    stock.set_fail_on_check(true);
    let service = MerchService::new(spy.clone(), InMemoryEmailService::new(), stock);
    let cancel = CancellationToken::new();

    let result = service
        .issue_merch(issue("ssidorov@mail.com", MerchPackType::WelcomePack), &cancel)
        .await;
    assert!(matches!(result, Err(ApplicationError::Stock(_))));
    assert_eq!(result.unwrap_err().kind(), ErrorKind::Collaborator);
    assert_eq!(spy.calls(), 0);

    let result = service
        .process_supply_arrived(
            ProcessSupplyArrived {
                merch_pack_type_ids: vec![MerchPackType::VeteranPack.id()],
            },
            &cancel,
        )
        .await;
    assert!(matches!(result, Err(ApplicationError::Stock(_))));
    assert_eq!(spy.calls(), 0);
}

#[tokio::test]
async fn test_supply_checks_each_pack_type_once() {
    let h = TestHarness::new();

    h.service
        .process_supply_arrived(
            ProcessSupplyArrived {
                merch_pack_type_ids: vec![
                    MerchPackType::ConferenceListenerPack.id(),
                    MerchPackType::ConferenceListenerPack.id(),
                    MerchPackType::WelcomePack.id(),
                ],
            },
            &h.cancel,
        )
        .await
        .unwrap();

    assert_eq!(h.stock.check_count(), 2);
    assert_eq!(h.email.sent_count(), 1);
}

#[tokio::test]
async fn test_supply_arrival_completes_waiting_requests() {
    let h = TestHarness::new();

    let delivered = h
        .service
        .process_supply_arrived(
            ProcessSupplyArrived {
                merch_pack_type_ids: vec![
                    MerchPackType::ConferenceListenerPack.id(),
                    MerchPackType::WelcomePack.id(),
                ],
            },
            &h.cancel,
        )
        .await
        .unwrap();

    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].id(), MerchRequestId::new(2));
    assert_eq!(delivered[0].status(), MerchRequestStatus::Done);

    let stored = h.storage.merch_request(MerchRequestId::new(2)).await.unwrap();
    assert_eq!(stored.status(), MerchRequestStatus::Done);
    assert_eq!(stored.version(), 2);

    let sent = h.email.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to.as_str(), "ppetrov@mail.com");
}

#[tokio::test]
async fn test_supply_of_unavailable_pack_changes_nothing() {
    let h = TestHarness::new();
    h.stock
        .set_available(MerchPackType::ConferenceListenerPack, false);

    let delivered = h
        .service
        .process_supply_arrived(
            ProcessSupplyArrived {
                merch_pack_type_ids: vec![MerchPackType::ConferenceListenerPack.id()],
            },
            &h.cancel,
        )
        .await
        .unwrap();

    assert!(delivered.is_empty());
    let stored = h.storage.merch_request(MerchRequestId::new(2)).await.unwrap();
    assert_eq!(stored.status(), MerchRequestStatus::AwaitingDelivery);
    assert_eq!(h.email.sent_count(), 0);
}

#[tokio::test]
async fn test_cancel_pending_request() {
    let h = TestHarness::new();

    let canceled = h
        .service
        .cancel_merch_request(
            CancelMerchRequest {
                email: "ppetrov@mail.com".to_string(),
                merch_pack_type_id: MerchPackType::ConferenceListenerPack.id(),
            },
            &h.cancel,
        )
        .await
        .unwrap();

    assert_eq!(canceled.len(), 1);
    assert_eq!(canceled[0].status(), MerchRequestStatus::Canceled);

    let stored = h.storage.merch_request(MerchRequestId::new(2)).await.unwrap();
    assert_eq!(stored.status(), MerchRequestStatus::Canceled);
}

#[tokio::test]
async fn test_cancel_without_pending_request_is_rejected() {
    let h = TestHarness::new();

    let result = h
        .service
        .cancel_merch_request(
            CancelMerchRequest {
                email: "iivanov@mail.com".to_string(),
                merch_pack_type_id: MerchPackType::WelcomePack.id(),
            },
            &h.cancel,
        )
        .await;

    assert!(matches!(
        result,
        Err(ApplicationError::NoActiveRequest { .. })
    ));
    let stored = h.storage.merch_request(MerchRequestId::new(1)).await.unwrap();
    assert_eq!(stored.status(), MerchRequestStatus::Done);
    assert_eq!(stored.version(), 1);
}

#[tokio::test]
async fn test_get_issued_merch_packs() {
    let h = TestHarness::new();

    let issued = h
        .service
        .get_issued_merch_packs(
            GetIssuedMerchPacks {
                email: "iivanov@mail.com".to_string(),
            },
            &h.cancel,
        )
        .await
        .unwrap();

    assert_eq!(issued.len(), 1);
    assert_eq!(issued[0].merch_pack_id, MerchPackId::new(1));
    assert_eq!(issued[0].pack_type, MerchPackType::WelcomePack);

    let none = h
        .service
        .get_issued_merch_packs(
            GetIssuedMerchPacks {
                email: "ppetrov@mail.com".to_string(),
            },
            &h.cancel,
        )
        .await
        .unwrap();
    assert!(none.is_empty());
}

#[tokio::test]
async fn test_invalid_command_never_reaches_storage() {
    let spy = SpyStorage::new(InMemoryStorage::with_mock_data().unwrap());
    let service = MerchService::new(
        spy.clone(),
        InMemoryEmailService::new(),
        InMemoryStockService::new(),
    );
    let cancel = CancellationToken::new();

    let command = IssueMerch {
        email: "not-an-address".to_string(),
        merch_pack_type_id: 15,
        ..issue("ssidorov@mail.com", MerchPackType::WelcomePack)
    };
    let result = service.issue_merch(command, &cancel).await;

    match result {
        Err(ApplicationError::Validation(errors)) => {
            assert!(errors.has_field("email"));
            assert!(errors.has_field("merch_pack_type_id"));
            assert_eq!(errors.failures().len(), 2);
        }
        other => panic!("expected validation failure, got {other:?}"),
    }
    assert_eq!(spy.calls(), 0);

    let result = service
        .process_supply_arrived(
            ProcessSupplyArrived {
                merch_pack_type_ids: vec![],
            },
            &cancel,
        )
        .await;
    assert_eq!(result.unwrap_err().kind(), ErrorKind::Validation);
    assert_eq!(spy.calls(), 0);
}

#[tokio::test]
async fn test_valid_command_begins_and_commits_once() {
    let spy = SpyStorage::new(InMemoryStorage::with_mock_data().unwrap());
    let service = MerchService::new(
        spy.clone(),
        InMemoryEmailService::new(),
        InMemoryStockService::new(),
    );

    service
        .get_issued_merch_packs(
            GetIssuedMerchPacks {
                email: "iivanov@mail.com".to_string(),
            },
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    // begin, one request query, one pack query, apply, commit
    assert_eq!(spy.calls(), 5);
}

#[tokio::test]
async fn test_cancelled_token_stops_the_command() {
    let h = TestHarness::new();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let result = h
        .service
        .issue_merch(issue("ssidorov@mail.com", MerchPackType::WelcomePack), &cancel)
        .await;

    assert!(matches!(
        result,
        Err(ApplicationError::Storage(StorageError::Cancelled))
    ));
    assert_eq!(h.storage.request_count().await, 3);
    assert_eq!(h.email.sent_count(), 0);
}
