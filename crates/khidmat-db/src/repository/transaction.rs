//! # Transaction Repository
//!
//! Database operations for payment transaction records.
//!
//! A booking may accumulate several transactions (failed attempts,
//! retries). Each carries a unique business reference and an opaque
//! metadata document from the gateway.

use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use khidmat_core::{PaymentMethod, Transaction, TransactionStatus};

/// Filters for listing transactions. All fields are optional and AND-ed.
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub user_id: Option<String>,
    pub booking_id: Option<String>,
    pub status: Option<TransactionStatus>,
    pub payment_method: Option<PaymentMethod>,
}

/// Repository for transaction database operations.
#[derive(Debug, Clone)]
pub struct TransactionRepository {
    pool: SqlitePool,
}

impl TransactionRepository {
    /// Creates a new TransactionRepository.
    pub fn new(pool: SqlitePool) -> Self {
        TransactionRepository { pool }
    }

    /// Inserts a transaction record.
    pub async fn insert(&self, txn: &Transaction) -> DbResult<()> {
        debug!(
            id = %txn.id,
            booking_id = %txn.booking_id,
            transaction_ref = %txn.transaction_ref,
            "Recording transaction"
        );

        sqlx::query(
            r#"
            INSERT INTO transactions (
                id, user_id, booking_id, transaction_ref,
                amount_minor, currency, payment_method, status,
                gateway_payment_id, gateway_order_id, gateway_signature,
                metadata, is_deleted, payment_date, created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4,
                ?5, ?6, ?7, ?8,
                ?9, ?10, ?11,
                ?12, ?13, ?14, ?15, ?16
            )
            "#,
        )
        .bind(&txn.id)
        .bind(&txn.user_id)
        .bind(&txn.booking_id)
        .bind(&txn.transaction_ref)
        .bind(txn.amount_minor)
        .bind(&txn.currency)
        .bind(txn.payment_method)
        .bind(txn.status)
        .bind(&txn.gateway_payment_id)
        .bind(&txn.gateway_order_id)
        .bind(&txn.gateway_signature)
        .bind(&txn.metadata)
        .bind(txn.is_deleted)
        .bind(txn.payment_date)
        .bind(txn.created_at)
        .bind(txn.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets a transaction by ID. Soft-deleted records are invisible.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Transaction>> {
        let txn = sqlx::query_as::<_, Transaction>(
            r#"
            SELECT id, user_id, booking_id, transaction_ref,
                   amount_minor, currency, payment_method, status,
                   gateway_payment_id, gateway_order_id, gateway_signature,
                   metadata, is_deleted, payment_date, created_at, updated_at
            FROM transactions
            WHERE id = ?1 AND is_deleted = 0
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(txn)
    }

    /// Checks whether a business reference is already recorded.
    pub async fn ref_exists(&self, transaction_ref: &str) -> DbResult<bool> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM transactions WHERE transaction_ref = ?1")
                .bind(transaction_ref)
                .fetch_one(&self.pool)
                .await?;

        Ok(count > 0)
    }

    /// Lists transactions matching the filter, newest first.
    pub async fn list(
        &self,
        filter: &TransactionFilter,
        limit: i64,
        offset: i64,
    ) -> DbResult<Vec<Transaction>> {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
            r#"
            SELECT id, user_id, booking_id, transaction_ref,
                   amount_minor, currency, payment_method, status,
                   gateway_payment_id, gateway_order_id, gateway_signature,
                   metadata, is_deleted, payment_date, created_at, updated_at
            FROM transactions
            WHERE is_deleted = 0
            "#,
        );

        if let Some(user_id) = &filter.user_id {
            qb.push(" AND user_id = ").push_bind(user_id);
        }
        if let Some(booking_id) = &filter.booking_id {
            qb.push(" AND booking_id = ").push_bind(booking_id);
        }
        if let Some(status) = filter.status {
            qb.push(" AND status = ").push_bind(status);
        }
        if let Some(method) = filter.payment_method {
            qb.push(" AND payment_method = ").push_bind(method);
        }

        qb.push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);

        let txns = qb
            .build_query_as::<Transaction>()
            .fetch_all(&self.pool)
            .await?;

        Ok(txns)
    }

    /// Updates a transaction's status, optionally replacing the metadata
    /// document.
    ///
    /// The caller is responsible for merging the new metadata with the
    /// stored document first (shallow merge in the service layer), so
    /// this write stays a plain column update.
    pub async fn update_status(
        &self,
        id: &str,
        status: TransactionStatus,
        metadata: Option<&serde_json::Value>,
    ) -> DbResult<()> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE transactions SET
                status = ?2,
                metadata = COALESCE(?3, metadata),
                updated_at = ?4
            WHERE id = ?1 AND is_deleted = 0
            "#,
        )
        .bind(id)
        .bind(status)
        .bind(metadata)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Transaction", id));
        }

        Ok(())
    }

    /// Soft-deletes a transaction record.
    pub async fn soft_delete(&self, id: &str) -> DbResult<()> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE transactions SET is_deleted = 1, updated_at = ?2
            WHERE id = ?1 AND is_deleted = 0
            "#,
        )
        .bind(id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Transaction", id));
        }

        Ok(())
    }
}
