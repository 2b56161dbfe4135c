//! # Tax Configuration Service
//!
//! Admin-only management of the visitation fee and tax rate, plus the
//! lookup every cart creation goes through.
//!
//! ## Fallback Behaviour
//! Pricing must never be blocked by missing configuration: when no
//! active config exists (fresh install, or the active one was deleted),
//! [`effective_rates`] falls back to the built-in defaults (Rs 50.00
//! fee, 15%).

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use khidmat_core::validation::{validate_tax_rate_bps, validate_visitation_fee};
use khidmat_core::{
    Actor, Money, TaxConfig, TaxRate, DEFAULT_TAX_RATE_BPS, DEFAULT_VISITATION_FEE_MINOR,
};
use khidmat_db::Database;

/// Returns the fee/rate pair new carts snapshot.
///
/// Active config if one exists, otherwise the built-in defaults.
pub async fn effective_rates(db: &Database) -> ApiResult<(Money, TaxRate)> {
    match db.tax_configs().active().await? {
        Some(config) => Ok((config.visitation_fee(), config.tax_rate())),
        None => Ok((
            Money::from_minor(DEFAULT_VISITATION_FEE_MINOR),
            TaxRate::from_bps(DEFAULT_TAX_RATE_BPS),
        )),
    }
}

/// Service for tax configuration administration.
#[derive(Debug, Clone)]
pub struct TaxConfigService {
    db: Database,
}

impl TaxConfigService {
    /// Creates a new TaxConfigService.
    pub fn new(db: Database) -> Self {
        TaxConfigService { db }
    }

    /// Creates a config. When `activate` is set, it becomes the single
    /// active config and all others are deactivated.
    pub async fn create(
        &self,
        actor: &Actor,
        visitation_fee_minor: i64,
        tax_rate_bps: u32,
        activate: bool,
    ) -> ApiResult<TaxConfig> {
        require_admin(actor)?;
        validate_visitation_fee(visitation_fee_minor)?;
        validate_tax_rate_bps(tax_rate_bps)?;

        let now = Utc::now();
        let config = TaxConfig {
            id: Uuid::new_v4().to_string(),
            visitation_fee_minor,
            tax_rate_bps,
            is_active: activate,
            is_deleted: false,
            created_by: actor.user_id.clone(),
            created_at: now,
            updated_at: now,
        };

        self.db.tax_configs().insert(&config).await?;

        info!(
            id = %config.id,
            fee = %config.visitation_fee(),
            rate_bps = tax_rate_bps,
            active = activate,
            "Tax config created"
        );

        Ok(config)
    }

    /// Activates an existing config (deactivating every other one).
    pub async fn activate(&self, actor: &Actor, id: &str) -> ApiResult<TaxConfig> {
        require_admin(actor)?;

        self.db.tax_configs().activate(id).await?;

        let config = self
            .db
            .tax_configs()
            .get_by_id(id)
            .await?
            .ok_or_else(|| ApiError::not_found("Tax config", id))?;

        info!(id = %id, "Tax config activated");
        Ok(config)
    }

    /// Soft-deletes a config. Deleting the active one makes pricing
    /// fall back to defaults until another is activated.
    pub async fn remove(&self, actor: &Actor, id: &str) -> ApiResult<()> {
        require_admin(actor)?;

        self.db.tax_configs().soft_delete(id).await?;

        info!(id = %id, "Tax config deleted");
        Ok(())
    }

    /// Lists all configs (admin view).
    pub async fn list(&self, actor: &Actor) -> ApiResult<Vec<TaxConfig>> {
        require_admin(actor)?;
        Ok(self.db.tax_configs().list().await?)
    }
}

fn require_admin(actor: &Actor) -> ApiResult<()> {
    if !actor.is_admin() {
        return Err(ApiError::forbidden("admin role required"));
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
