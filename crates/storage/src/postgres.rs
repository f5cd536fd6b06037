use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::Enumeration;
use domain::{
    Aggregate, DomainError, Email, Employee, EmployeeFullName, MerchItem, MerchPack, MerchPackId,
    MerchPackType, MerchRequest, MerchRequestDateTime, MerchRequestFromType, MerchRequestId,
    MerchRequestStatus,
};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, Row};

use crate::change_tracker::{EntityKey, TrackedEntity};
use crate::seed::{mock_merch_packs, mock_merch_requests};
use crate::store::{Storage, StorageTransaction};
use crate::{Change, DatabaseConfig, MerchPackQuery, MerchRequestQuery, Result, StorageError};

const REQUEST_COLUMNS: &str = "id, version, employee_email, employee_first_name, \
     employee_last_name, employee_patronymic, merch_pack_id, requested_at, status_id, origin_id";

/// PostgreSQL-backed storage implementation.
#[derive(Clone)]
pub struct PostgresStorage {
    pool: PgPool,
}

impl PostgresStorage {
    /// Creates a new PostgreSQL storage over an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a connection pool from `config`.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.connect_timeout)
            .connect(&config.url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Inserts the mock catalog and request history, skipping rows that
    /// already exist, and moves both sequences past the seeded ids.
    pub async fn seed_mock_data(&self) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        for pack in mock_merch_packs()? {
            sqlx::query(
                "INSERT INTO merch_packs (id, pack_type_id, items) VALUES ($1, $2, $3) \
                 ON CONFLICT DO NOTHING",
            )
            .bind(pack.id().as_i64())
            .bind(pack.pack_type().id())
            .bind(Json(pack.items()))
            .execute(&mut *tx)
            .await?;
        }

        for request in mock_merch_requests()? {
            insert_request(&mut tx, &request, " ON CONFLICT DO NOTHING").await?;
        }

        for table in ["merch_packs", "merch_requests"] {
            sqlx::query(&format!(
                "SELECT setval(pg_get_serial_sequence('{table}', 'id'), \
                 GREATEST((SELECT MAX(id) FROM {table}), 1))"
            ))
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        tracing::info!("mock data seeded");
        Ok(())
    }

    fn row_to_request(row: PgRow) -> Result<MerchRequest> {
        let email = Email::parse(row.try_get::<String, _>("employee_email")?)?;
        let full_name = EmployeeFullName::new(
            row.try_get::<String, _>("employee_first_name")?,
            row.try_get::<String, _>("employee_last_name")?,
            row.try_get::<String, _>("employee_patronymic")?,
        )?;
        let status =
            MerchRequestStatus::from_id(row.try_get("status_id")?).map_err(DomainError::from)?;
        let origin =
            MerchRequestFromType::from_id(row.try_get("origin_id")?).map_err(DomainError::from)?;

        Ok(MerchRequest::restore(
            MerchRequestId::new(row.try_get("id")?),
            row.try_get("version")?,
            Employee::new(email, full_name),
            MerchPackId::new(row.try_get("merch_pack_id")?),
            MerchRequestDateTime::new(row.try_get::<DateTime<Utc>, _>("requested_at")?),
            status,
            origin,
        ))
    }

    fn row_to_pack(row: PgRow) -> Result<MerchPack> {
        let pack_type =
            MerchPackType::from_id(row.try_get("pack_type_id")?).map_err(DomainError::from)?;
        let Json(items) = row.try_get::<Json<Vec<MerchItem>>, _>("items")?;

        Ok(MerchPack::restore(
            MerchPackId::new(row.try_get("id")?),
            pack_type,
            items,
        ))
    }
}

#[async_trait]
impl Storage for PostgresStorage {
    type Transaction = PostgresTransaction;

    async fn begin(&self) -> Result<PostgresTransaction> {
        let tx = self.pool.begin().await?;
        Ok(PostgresTransaction { tx })
    }
}

/// One open PostgreSQL transaction.
pub struct PostgresTransaction {
    tx: sqlx::Transaction<'static, Postgres>,
}

impl PostgresTransaction {
    async fn update_request(
        &mut self,
        request: &MerchRequest,
        expected_version: Option<i32>,
    ) -> Result<()> {
        let id = request.id().as_i64();
        let employee = request.employee();

        let merch_pack_id = request.merch_pack_id().as_i64();
        let origin_id = request.origin().id();

        // Pack and origin are fixed at creation: they guard the row instead of
        // being written.
        let mut sql = String::from(
            "UPDATE merch_requests SET version = version + 1, employee_email = $2, \
             employee_first_name = $3, employee_last_name = $4, employee_patronymic = $5, \
             requested_at = $6, status_id = $7 \
             WHERE id = $1 AND merch_pack_id = $8 AND origin_id = $9",
        );
        if expected_version.is_some() {
            sql.push_str(" AND version = $10");
        }
        sql.push_str(" RETURNING version");

        let mut query = sqlx::query_scalar::<_, i32>(&sql)
            .bind(id)
            .bind(employee.email.as_str())
            .bind(employee.full_name.first_name())
            .bind(employee.full_name.last_name())
            .bind(employee.full_name.patronymic())
            .bind(request.requested_at().as_datetime())
            .bind(request.status().id())
            .bind(merch_pack_id)
            .bind(origin_id);
        if let Some(expected) = expected_version {
            query = query.bind(expected);
        }

        let updated = query
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(map_write_error)?;
        if updated.is_some() {
            return Ok(());
        }

        let current: Option<(i32, i64, i32)> = sqlx::query_as(
            "SELECT version, merch_pack_id, origin_id FROM merch_requests WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;

        let aggregate_type = MerchRequest::aggregate_type();
        Err(match (current, expected_version) {
            (None, _) => StorageError::NotFound { aggregate_type, id },
            (Some((actual, _, _)), Some(expected)) if expected != actual => {
                StorageError::ConcurrencyConflict {
                    aggregate_type,
                    id,
                    expected,
                    actual,
                }
            }
            (Some((_, stored_pack, _)), _) if stored_pack != merch_pack_id => {
                StorageError::ImmutableField {
                    aggregate_type,
                    id,
                    field: "merch_pack_id",
                }
            }
            (Some(_), _) => StorageError::ImmutableField {
                aggregate_type,
                id,
                field: "origin",
            },
        })
    }

    async fn insert_pack(&mut self, pack: &MerchPack) -> Result<()> {
        sqlx::query("INSERT INTO merch_packs (id, pack_type_id, items) VALUES ($1, $2, $3)")
            .bind(pack.id().as_i64())
            .bind(pack.pack_type().id())
            .bind(Json(pack.items()))
            .execute(&mut *self.tx)
            .await
            .map_err(map_write_error)?;
        Ok(())
    }

    async fn update_pack(&mut self, pack: &MerchPack) -> Result<()> {
        let result =
            sqlx::query("UPDATE merch_packs SET pack_type_id = $2, items = $3 WHERE id = $1")
                .bind(pack.id().as_i64())
                .bind(pack.pack_type().id())
                .bind(Json(pack.items()))
                .execute(&mut *self.tx)
                .await
                .map_err(map_write_error)?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound {
                aggregate_type: MerchPack::aggregate_type(),
                id: pack.id().as_i64(),
            });
        }
        Ok(())
    }

    async fn delete(&mut self, key: EntityKey) -> Result<()> {
        let sql = match key {
            EntityKey::MerchRequest(_) => "DELETE FROM merch_requests WHERE id = $1",
            EntityKey::MerchPack(_) => "DELETE FROM merch_packs WHERE id = $1",
        };
        let result = sqlx::query(sql)
            .bind(key.id())
            .execute(&mut *self.tx)
            .await
            .map_err(map_write_error)?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound {
                aggregate_type: key.aggregate_type(),
                id: key.id(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl StorageTransaction for PostgresTransaction {
    async fn next_merch_request_id(&mut self) -> Result<MerchRequestId> {
        let id: i64 =
            sqlx::query_scalar("SELECT nextval(pg_get_serial_sequence('merch_requests', 'id'))")
                .fetch_one(&mut *self.tx)
                .await?;
        Ok(MerchRequestId::new(id))
    }

    async fn next_merch_pack_id(&mut self) -> Result<MerchPackId> {
        let id: i64 =
            sqlx::query_scalar("SELECT nextval(pg_get_serial_sequence('merch_packs', 'id'))")
                .fetch_one(&mut *self.tx)
                .await?;
        Ok(MerchPackId::new(id))
    }

    async fn query_merch_requests(
        &mut self,
        query: &MerchRequestQuery,
    ) -> Result<Vec<MerchRequest>> {
        let mut sql = format!("SELECT {REQUEST_COLUMNS} FROM merch_requests WHERE 1=1");
        let mut param_count = 0;

        if query.merch_pack_id.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND merch_pack_id = ${param_count}"));
        }
        if query.employee_email.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND employee_email = ${param_count}"));
        }
        if query.status.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND status_id = ${param_count}"));
        }
        sql.push_str(" ORDER BY id ASC");

        let mut sqlx_query = sqlx::query(&sql);
        if let Some(merch_pack_id) = query.merch_pack_id {
            sqlx_query = sqlx_query.bind(merch_pack_id.as_i64());
        }
        if let Some(ref email) = query.employee_email {
            sqlx_query = sqlx_query.bind(email.as_str());
        }
        if let Some(status) = query.status {
            sqlx_query = sqlx_query.bind(status.id());
        }

        let rows = sqlx_query.fetch_all(&mut *self.tx).await?;
        rows.into_iter()
            .map(PostgresStorage::row_to_request)
            .collect()
    }

    async fn query_merch_packs(&mut self, query: &MerchPackQuery) -> Result<Vec<MerchPack>> {
        let mut sql = String::from("SELECT id, pack_type_id, items FROM merch_packs WHERE 1=1");
        let mut param_count = 0;

        if query.id.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND id = ${param_count}"));
        }
        if query.pack_type.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND pack_type_id = ${param_count}"));
        }
        sql.push_str(" ORDER BY id ASC");

        let mut sqlx_query = sqlx::query(&sql);
        if let Some(id) = query.id {
            sqlx_query = sqlx_query.bind(id.as_i64());
        }
        if let Some(pack_type) = query.pack_type {
            sqlx_query = sqlx_query.bind(pack_type.id());
        }

        let rows = sqlx_query.fetch_all(&mut *self.tx).await?;
        rows.into_iter().map(PostgresStorage::row_to_pack).collect()
    }

    async fn apply(&mut self, changes: Vec<Change>) -> Result<()> {
        for change in changes {
            match change {
                Change::Added(TrackedEntity::MerchRequest(request)) => {
                    insert_request(&mut self.tx, &request, "").await?;
                }
                Change::Added(TrackedEntity::MerchPack(pack)) => self.insert_pack(&pack).await?,
                Change::Modified {
                    entity: TrackedEntity::MerchRequest(request),
                    expected_version,
                } => self.update_request(&request, expected_version).await?,
                Change::Modified {
                    entity: TrackedEntity::MerchPack(pack),
                    ..
                } => self.update_pack(&pack).await?,
                Change::Removed(key) => self.delete(key).await?,
            }
        }
        Ok(())
    }

    async fn commit(self) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self) -> Result<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}

async fn insert_request(
    tx: &mut sqlx::Transaction<'static, Postgres>,
    request: &MerchRequest,
    on_conflict: &str,
) -> Result<()> {
    let employee = request.employee();
    let sql = format!(
        "INSERT INTO merch_requests ({REQUEST_COLUMNS}) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10){on_conflict}"
    );

    sqlx::query(&sql)
        .bind(request.id().as_i64())
        .bind(request.version())
        .bind(employee.email.as_str())
        .bind(employee.full_name.first_name())
        .bind(employee.full_name.last_name())
        .bind(employee.full_name.patronymic())
        .bind(request.merch_pack_id().as_i64())
        .bind(request.requested_at().as_datetime())
        .bind(request.status().id())
        .bind(request.origin().id())
        .execute(&mut **tx)
        .await
        .map_err(map_write_error)?;
    Ok(())
}

/// Maps unique, check and foreign key violations to [`StorageError::Conflict`].
fn map_write_error(e: sqlx::Error) -> StorageError {
    if let sqlx::Error::Database(db_err) = &e
        && matches!(db_err.code().as_deref(), Some("23505" | "23514" | "23503"))
    {
        return StorageError::Conflict {
            constraint: db_err
                .constraint()
                .map_or_else(|| db_err.message().to_string(), str::to_string),
        };
    }
    StorageError::Database(e)
}
