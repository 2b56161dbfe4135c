//! # Tax Configuration Repository
//!
//! Database operations for the fee/tax configuration table.
//!
//! ## Mutual Exclusion
//! At most one active, non-deleted config exists at any time. Both
//! `insert` (with `is_active`) and `activate` flip every other row
//! inactive inside the same database transaction, so two concurrent
//! activations can never leave two active rows behind.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use khidmat_core::TaxConfig;

/// Repository for tax configuration operations.
#[derive(Debug, Clone)]
pub struct TaxConfigRepository {
    pool: SqlitePool,
}

impl TaxConfigRepository {
    /// Creates a new TaxConfigRepository.
    pub fn new(pool: SqlitePool) -> Self {
        TaxConfigRepository { pool }
    }

    /// Gets the currently active config, if any.
    pub async fn active(&self) -> DbResult<Option<TaxConfig>> {
        let config = sqlx::query_as::<_, TaxConfig>(
            r#"
            SELECT id, visitation_fee_minor, tax_rate_bps,
                   is_active, is_deleted, created_by, created_at, updated_at
            FROM tax_configs
            WHERE is_active = 1 AND is_deleted = 0
            ORDER BY updated_at DESC
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(config)
    }

    /// Gets a config by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<TaxConfig>> {
        let config = sqlx::query_as::<_, TaxConfig>(
            r#"
            SELECT id, visitation_fee_minor, tax_rate_bps,
                   is_active, is_deleted, created_by, created_at, updated_at
            FROM tax_configs
            WHERE id = ?1 AND is_deleted = 0
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(config)
    }

    /// Lists all non-deleted configs, newest first.
    pub async fn list(&self) -> DbResult<Vec<TaxConfig>> {
        let configs = sqlx::query_as::<_, TaxConfig>(
            r#"
            SELECT id, visitation_fee_minor, tax_rate_bps,
                   is_active, is_deleted, created_by, created_at, updated_at
            FROM tax_configs
            WHERE is_deleted = 0
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(configs)
    }

    /// Inserts a config. When the new config is active, all other rows
    /// are deactivated in the same transaction.
    pub async fn insert(&self, config: &TaxConfig) -> DbResult<()> {
        debug!(id = %config.id, is_active = config.is_active, "Inserting tax config");

        let mut tx = self.pool.begin().await?;

        if config.is_active {
            sqlx::query("UPDATE tax_configs SET is_active = 0, updated_at = ?1 WHERE is_active = 1")
                .bind(Utc::now())
                .execute(&mut *tx)
                .await?;
        }

        sqlx::query(
            r#"
            INSERT INTO tax_configs (
                id, visitation_fee_minor, tax_rate_bps,
                is_active, is_deleted, created_by, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&config.id)
        .bind(config.visitation_fee_minor)
        .bind(config.tax_rate_bps)
        .bind(config.is_active)
        .bind(config.is_deleted)
        .bind(&config.created_by)
        .bind(config.created_at)
        .bind(config.updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(())
    }

    /// Activates a config, deactivating every other row atomically.
    pub async fn activate(&self, id: &str) -> DbResult<()> {
        let now = Utc::now();

        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE tax_configs SET is_active = 0, updated_at = ?1 WHERE is_active = 1")
            .bind(now)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query(
            r#"
            UPDATE tax_configs SET is_active = 1, updated_at = ?2
            WHERE id = ?1 AND is_deleted = 0
            "#,
        )
        .bind(id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            // Roll back the blanket deactivation
            tx.rollback().await?;
            return Err(DbError::not_found("Tax config", id));
        }

        tx.commit().await?;

        Ok(())
    }

    /// Soft-deletes a config. A deleted config is never considered
    /// active, so pricing falls back to defaults if it was the one.
    pub async fn soft_delete(&self, id: &str) -> DbResult<()> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE tax_configs SET is_deleted = 1, is_active = 0, updated_at = ?2
            WHERE id = ?1 AND is_deleted = 0
            "#,
        )
        .bind(id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Tax config", id));
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::pool::{Database, DbConfig};
    use chrono::Utc;
    use khidmat_core::TaxConfig;

    fn config(id: &str, fee_minor: i64, bps: u32, active: bool) -> TaxConfig {
        let now = Utc::now();
        TaxConfig {
            id: id.to_string(),
            visitation_fee_minor: fee_minor,
            tax_rate_bps: bps,
            is_active: active,
            is_deleted: false,
            created_by: "admin-1".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_at_most_one_active() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        db.tax_configs()
            .insert(&config("tc1", 5_000, 1_500, true))
            .await
            .unwrap();
        db.tax_configs()
            .insert(&config("tc2", 7_500, 1_800, true))
            .await
            .unwrap();

        let active = db.tax_configs().active().await.unwrap().unwrap();
        assert_eq!(active.id, "tc2");

        let actives = db
            .tax_configs()
            .list()
            .await
            .unwrap()
            .into_iter()
            .filter(|c| c.is_active)
            .count();
        assert_eq!(actives, 1);
    }

    #[tokio::test]
    async fn test_activate_switches_configs() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        db.tax_configs()
            .insert(&config("tc1", 5_000, 1_500, true))
            .await
            .unwrap();
        db.tax_configs()
            .insert(&config("tc2", 7_500, 1_800, false))
            .await
            .unwrap();

        db.tax_configs().activate("tc2").await.unwrap();

        let active = db.tax_configs().active().await.unwrap().unwrap();
        assert_eq!(active.id, "tc2");
    }

    #[tokio::test]
    async fn test_soft_delete_clears_active() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        db.tax_configs()
            .insert(&config("tc1", 5_000, 1_500, true))
            .await
            .unwrap();
        db.tax_configs().soft_delete("tc1").await.unwrap();

        assert!(db.tax_configs().active().await.unwrap().is_none());
        assert!(db.tax_configs().get_by_id("tc1").await.unwrap().is_none());
    }
}
