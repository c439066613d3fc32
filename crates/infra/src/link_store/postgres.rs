//! Postgres-backed link store.
//!
//! Links live in `invoice_links` with `order_id` as primary key, so the
//! database itself enforces one link per order: a concurrent second insert
//! fails with a unique violation (`23505`), surfaced as
//! [`LinkStoreError::Duplicate`].
//!
//! The pipeline is synchronous, so the store owns a current-thread tokio
//! runtime and blocks on each query. Do not call it from inside another
//! async runtime.

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use tokio::runtime::Runtime;
use tracing::{debug, instrument};
use uuid::Uuid;

use orderbridge_accounting::InvoiceId;
use orderbridge_commerce::OrderId;

use super::{InvoiceLink, LinkStore, LinkStoreError};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS invoice_links (
    order_id    BIGINT PRIMARY KEY,
    invoice_id  UUID NOT NULL,
    created_at  TIMESTAMPTZ NOT NULL DEFAULT now()
)
"#;

pub struct PostgresLinkStore {
    pool: PgPool,
    runtime: Runtime,
}

impl PostgresLinkStore {
    /// Connect to `database_url` and make sure the `invoice_links` table exists.
    pub fn connect(database_url: &str) -> Result<Self, LinkStoreError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| LinkStoreError::Storage(format!("failed to start runtime: {e}")))?;

        let pool = runtime
            .block_on(PgPool::connect(database_url))
            .map_err(|e| map_sqlx_error("connect", e))?;

        let store = Self { pool, runtime };
        store.ensure_schema()?;
        Ok(store)
    }

    pub fn ensure_schema(&self) -> Result<(), LinkStoreError> {
        self.runtime
            .block_on(sqlx::query(SCHEMA).execute(&self.pool))
            .map_err(|e| map_sqlx_error("ensure_schema", e))?;
        Ok(())
    }
}

fn order_key(order_id: OrderId) -> Result<i64, LinkStoreError> {
    i64::try_from(order_id.get())
        .map_err(|_| LinkStoreError::Storage(format!("order id {order_id} exceeds BIGINT range")))
}

impl LinkStore for PostgresLinkStore {
    #[instrument(skip_all, fields(order_id = %order_id), err)]
    fn find_by_order_id(&self, order_id: OrderId) -> Result<Option<InvoiceLink>, LinkStoreError> {
        let key = order_key(order_id)?;
        let row = self
            .runtime
            .block_on(
                sqlx::query(
                    r#"
                    SELECT invoice_id, created_at
                    FROM invoice_links
                    WHERE order_id = $1
                    "#,
                )
                .bind(key)
                .fetch_optional(&self.pool),
            )
            .map_err(|e| map_sqlx_error("find_by_order_id", e))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let invoice_id: Uuid = row
            .try_get("invoice_id")
            .map_err(|e| LinkStoreError::Storage(format!("invalid invoice_id column: {e}")))?;
        let created_at: DateTime<Utc> = row
            .try_get("created_at")
            .map_err(|e| LinkStoreError::Storage(format!("invalid created_at column: {e}")))?;

        Ok(Some(InvoiceLink {
            order_id,
            invoice_id: InvoiceId::from_uuid(invoice_id),
            created_at,
        }))
    }

    #[instrument(skip_all, fields(order_id = %order_id, invoice_id = %invoice_id), err)]
    fn create(&self, order_id: OrderId, invoice_id: InvoiceId) -> Result<InvoiceLink, LinkStoreError> {
        let key = order_key(order_id)?;
        let row = self
            .runtime
            .block_on(
                sqlx::query(
                    r#"
                    INSERT INTO invoice_links (order_id, invoice_id)
                    VALUES ($1, $2)
                    RETURNING created_at
                    "#,
                )
                .bind(key)
                .bind(invoice_id.as_uuid())
                .fetch_one(&self.pool),
            )
            .map_err(|e| {
                if is_unique_violation(&e) {
                    LinkStoreError::Duplicate(order_id)
                } else {
                    map_sqlx_error("create", e)
                }
            })?;

        let created_at: DateTime<Utc> = row
            .try_get("created_at")
            .map_err(|e| LinkStoreError::Storage(format!("invalid created_at column: {e}")))?;
        debug!("invoice link created");

        Ok(InvoiceLink {
            order_id,
            invoice_id,
            created_at,
        })
    }
}

/// Check if an error is a unique constraint violation.
fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().as_deref() == Some("23505"),
        _ => false,
    }
}

/// Map SQLx errors into `LinkStoreError`.
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> LinkStoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let code = db_err.code().map(|c| c.to_string()).unwrap_or_default();
            LinkStoreError::Storage(format!(
                "database error in {operation} [{code}]: {}",
                db_err.message()
            ))
        }
        sqlx::Error::PoolClosed => {
            LinkStoreError::Storage(format!("connection pool closed in {operation}"))
        }
        _ => LinkStoreError::Storage(format!("sqlx error in {operation}: {err}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_ids_beyond_bigint_are_rejected() {
        assert_eq!(order_key(OrderId::new(42)).unwrap(), 42);
        let err = order_key(OrderId::new(u64::MAX)).unwrap_err();
        assert!(matches!(err, LinkStoreError::Storage(msg) if msg.contains("BIGINT")));
    }

    /// Requires a reachable Postgres at `DATABASE_URL`.
    #[test]
    #[ignore]
    fn create_is_insert_only_against_postgres() {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let store = PostgresLinkStore::connect(&url).unwrap();
        let order_id = OrderId::new(u64::from(uuid::Uuid::now_v7().as_fields().0));

        let link = store.create(order_id, InvoiceId::new()).unwrap();
        assert_eq!(store.find_by_order_id(order_id).unwrap(), Some(link));
        assert!(matches!(
            store.create(order_id, InvoiceId::new()),
            Err(LinkStoreError::Duplicate(_))
        ));
    }
}
