//! PostgreSQL integration tests
//!
//! These tests use a shared PostgreSQL container and need a running Docker
//! daemon. Run with:
//!
//! ```bash
//! cargo test -p storage --test postgres_integration -- --ignored --test-threads=1
//! ```

use std::sync::Arc;

use domain::{
    Aggregate, Email, Employee, EmployeeFullName, MerchPack, MerchPackId, MerchPackType,
    MerchRequest, MerchRequestDateTime, MerchRequestFromType, MerchRequestStatus,
};
use serial_test::serial;
use sqlx::PgPool;
use storage::{
    CancellationToken, MerchPackRepository, MerchRequestRepository, PostgresStorage,
    StorageError, UnitOfWork,
};
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            let temp_pool = PgPool::connect(&connection_string).await.unwrap();
            PostgresStorage::new(temp_pool.clone())
                .run_migrations()
                .await
                .unwrap();
            temp_pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

/// Get a fresh storage with its own pool, cleared tables and the mock data.
async fn get_test_storage() -> PostgresStorage {
    let info = get_container_info().await;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&info.connection_string)
        .await
        .unwrap();

    sqlx::query("TRUNCATE TABLE merch_requests, merch_packs RESTART IDENTITY")
        .execute(&pool)
        .await
        .unwrap();

    let storage = PostgresStorage::new(pool);
    storage.seed_mock_data().await.unwrap();
    storage
}

fn create_test_request(email: &str, pack: i64) -> MerchRequest {
    MerchRequest::new(
        Employee::new(
            Email::parse(email).unwrap(),
            EmployeeFullName::new("Semen", "Semenov", "Semenovich").unwrap(),
        ),
        MerchPackId::new(pack),
        MerchRequestDateTime::now(),
        MerchRequestStatus::AwaitingDelivery,
        MerchRequestFromType::Manually,
    )
}

#[tokio::test]
#[serial]
#[ignore = "requires docker"]
async fn mock_data_round_trips() {
    let storage = get_test_storage().await;
    let cancel = CancellationToken::new();
    let mut uow = UnitOfWork::new(storage);
    uow.begin(&cancel).await.unwrap();

    let email = Email::parse("IIvanov@mail.com").unwrap();
    let done = uow
        .merch_requests()
        .unwrap()
        .find_by_employee_and_status(&email, MerchRequestStatus::Done, &cancel)
        .await
        .unwrap();
    assert_eq!(done.len(), 1);
    assert_eq!(done[0].merch_pack_id(), MerchPackId::new(1));
    assert_eq!(
        done[0].employee().full_name.to_string(),
        "Ivanov Ivan Ivanovich"
    );

    let welcome = uow
        .merch_packs()
        .unwrap()
        .find_by_type(MerchPackType::WelcomePack, &cancel)
        .await
        .unwrap();
    assert_eq!(welcome.len(), 1);
    assert!(!welcome[0].items().is_empty());

    uow.rollback().await.unwrap();
}

#[tokio::test]
#[serial]
#[ignore = "requires docker"]
async fn create_continues_after_seeded_ids() {
    let storage = get_test_storage().await;
    let cancel = CancellationToken::new();

    let mut uow = UnitOfWork::new(storage.clone());
    uow.begin(&cancel).await.unwrap();
    let created = uow
        .merch_requests()
        .unwrap()
        .create(&create_test_request("ssemenov@mail.com", 3), &cancel)
        .await
        .unwrap();
    uow.commit(&cancel).await.unwrap();
    assert_eq!(created.id().as_i64(), 4);

    let mut uow = UnitOfWork::new(storage);
    uow.begin(&cancel).await.unwrap();
    let found = uow
        .merch_requests()
        .unwrap()
        .find_by_employee_and_merch_pack(created.employee_email(), MerchPackId::new(3), &cancel)
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id(), created.id());
    assert_eq!(found[0].version(), 1);
    uow.rollback().await.unwrap();
}

#[tokio::test]
#[serial]
#[ignore = "requires docker"]
async fn rollback_burns_identity() {
    let storage = get_test_storage().await;
    let cancel = CancellationToken::new();

    let mut uow = UnitOfWork::new(storage.clone());
    uow.begin(&cancel).await.unwrap();
    let discarded = uow
        .merch_requests()
        .unwrap()
        .create(&create_test_request("ssemenov@mail.com", 3), &cancel)
        .await
        .unwrap();
    uow.rollback().await.unwrap();

    let mut uow = UnitOfWork::new(storage);
    uow.begin(&cancel).await.unwrap();
    let kept = uow
        .merch_requests()
        .unwrap()
        .create(&create_test_request("ssemenov@mail.com", 3), &cancel)
        .await
        .unwrap();
    uow.commit(&cancel).await.unwrap();

    assert!(kept.id() > discarded.id());
}

#[tokio::test]
#[serial]
#[ignore = "requires docker"]
async fn stale_update_is_rejected() {
    let storage = get_test_storage().await;
    let cancel = CancellationToken::new();
    let email = Email::parse("ppetrov@mail.com").unwrap();

    let mut first = UnitOfWork::new(storage.clone());
    let mut second = UnitOfWork::new(storage);
    first.begin(&cancel).await.unwrap();
    second.begin(&cancel).await.unwrap();

    let loaded = first
        .merch_requests()
        .unwrap()
        .find_by_employee_and_status(&email, MerchRequestStatus::AwaitingDelivery, &cancel)
        .await
        .unwrap();
    assert_eq!(loaded.len(), 1);

    first
        .merch_requests()
        .unwrap()
        .update(&loaded[0].with_status(MerchRequestStatus::Done), &cancel)
        .await
        .unwrap();
    first.commit(&cancel).await.unwrap();

    second
        .merch_requests()
        .unwrap()
        .update(&loaded[0].with_status(MerchRequestStatus::Canceled), &cancel)
        .await
        .unwrap();
    let result = second.commit(&cancel).await;
    assert!(matches!(
        result,
        Err(StorageError::ConcurrencyConflict {
            expected: 1,
            actual: 2,
            ..
        })
    ));
}

#[tokio::test]
#[serial]
#[ignore = "requires docker"]
async fn duplicate_pack_type_is_a_conflict() {
    let storage = get_test_storage().await;
    let cancel = CancellationToken::new();

    let mut uow = UnitOfWork::new(storage);
    uow.begin(&cancel).await.unwrap();
    uow.merch_packs()
        .unwrap()
        .create(&MerchPack::new(MerchPackType::WelcomePack, vec![]), &cancel)
        .await
        .unwrap();

    let result = uow.commit(&cancel).await;
    match result {
        Err(StorageError::Conflict { constraint }) => {
            assert_eq!(constraint, "merch_packs_pack_type_key")
        }
        other => panic!("expected conflict, got {other:?}"),
    }
}

#[tokio::test]
#[serial]
#[ignore = "requires docker"]
async fn batch_is_atomic() {
    let storage = get_test_storage().await;
    let cancel = CancellationToken::new();

    let mut uow = UnitOfWork::new(storage.clone());
    uow.begin(&cancel).await.unwrap();
    uow.merch_requests()
        .unwrap()
        .create(&create_test_request("ssemenov@mail.com", 3), &cancel)
        .await
        .unwrap();
    // Unknown pack: violates the foreign key after the first insert succeeded.
    uow.merch_requests()
        .unwrap()
        .create(&create_test_request("ssemenov@mail.com", 999), &cancel)
        .await
        .unwrap();
    assert!(matches!(
        uow.commit(&cancel).await,
        Err(StorageError::Conflict { .. })
    ));

    let mut uow = UnitOfWork::new(storage);
    uow.begin(&cancel).await.unwrap();
    let email = Email::parse("ssemenov@mail.com").unwrap();
    let found = uow
        .merch_requests()
        .unwrap()
        .find_by_employee_and_merch_pack(&email, MerchPackId::new(3), &cancel)
        .await
        .unwrap();
    assert!(found.is_empty());
    uow.rollback().await.unwrap();
}

#[tokio::test]
#[serial]
#[ignore = "requires docker"]
async fn pack_is_fixed_after_creation() {
    let storage = get_test_storage().await;
    let cancel = CancellationToken::new();
    let email = Email::parse("ppetrov@mail.com").unwrap();

    let mut uow = UnitOfWork::new(storage.clone());
    uow.begin(&cancel).await.unwrap();
    let loaded = uow
        .merch_requests()
        .unwrap()
        .find_by_employee_and_status(&email, MerchRequestStatus::AwaitingDelivery, &cancel)
        .await
        .unwrap()
        .remove(0);
    let moved = MerchRequest::restore(
        loaded.id(),
        loaded.version(),
        loaded.employee().clone(),
        MerchPackId::new(3),
        loaded.requested_at(),
        loaded.status(),
        loaded.origin(),
    );
    uow.merch_requests()
        .unwrap()
        .update(&moved, &cancel)
        .await
        .unwrap();
    assert!(matches!(
        uow.commit(&cancel).await,
        Err(StorageError::ImmutableField {
            field: "merch_pack_id",
            ..
        })
    ));

    let mut uow = UnitOfWork::new(storage);
    uow.begin(&cancel).await.unwrap();
    let stored = uow
        .merch_requests()
        .unwrap()
        .find_by_employee_and_merch_pack(&email, MerchPackId::new(2), &cancel)
        .await
        .unwrap();
    assert_eq!(stored, vec![loaded]);
    uow.rollback().await.unwrap();
}
