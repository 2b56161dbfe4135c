//! # Cart Service
//!
//! Cart line management and totals.
//!
//! ## Cart Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Cart Flow                                       │
//! │                                                                         │
//! │  add_item(service, qty)                                                │
//! │       │                                                                 │
//! │       ├── no cart yet? create one, snapshotting the ACTIVE fee/rate    │
//! │       │   (or defaults) onto the cart                                  │
//! │       │                                                                 │
//! │       ├── same service already in cart? MERGE quantities               │
//! │       │   (one line per service, never duplicates)                     │
//! │       │                                                                 │
//! │       └── otherwise append a line with the price frozen at add time    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  recompute totals from the lines ── persist                            │
//! │                                                                         │
//! │  remove_item(last line) ──► the cart row itself is deleted             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::services::tax_config::effective_rates;
use khidmat_core::validation::{validate_cart_size, validate_quantity};
use khidmat_core::{compute_totals, Actor, Cart, CartItem, CoreError};
use khidmat_db::Database;

/// Service for cart operations. All operations act on the calling
/// user's own cart; carts are not visible across users.
#[derive(Debug, Clone)]
pub struct CartService {
    db: Database,
}

impl CartService {
    /// Creates a new CartService.
    pub fn new(db: Database) -> Self {
        CartService { db }
    }

    /// Gets the actor's cart, if one exists.
    pub async fn get_cart(&self, actor: &Actor) -> ApiResult<Option<Cart>> {
        Ok(self.db.carts().find_by_user(&actor.user_id).await?)
    }

    /// Adds a service to the cart, merging with an existing line.
    pub async fn add_item(&self, actor: &Actor, service_id: &str, quantity: i64) -> ApiResult<Cart> {
        validate_quantity(quantity)?;

        let service = self
            .db
            .catalog()
            .get_service(service_id)
            .await?
            .ok_or_else(|| CoreError::ServiceNotFound(service_id.to_string()))
            .map_err(ApiError::from)?;

        let cart = match self.db.carts().find_by_user(&actor.user_id).await? {
            Some(cart) => cart,
            None => {
                // Snapshot the fee/rate in force right now; later config
                // changes don't reprice this cart
                let (fee, rate) = effective_rates(&self.db).await?;
                let now = Utc::now();
                let cart = Cart {
                    id: Uuid::new_v4().to_string(),
                    user_id: actor.user_id.clone(),
                    visitation_fee_minor: fee.minor(),
                    tax_rate_bps: rate.bps(),
                    sub_total_minor: 0,
                    total_amount_minor: 0,
                    amount_to_pay_minor: 0,
                    created_at: now,
                    updated_at: now,
                    items: vec![],
                };
                self.db.carts().insert_cart(&cart).await?;
                cart
            }
        };

        match cart.items.iter().find(|i| i.service_id == service_id) {
            Some(existing) => {
                let merged = existing.quantity + quantity;
                validate_quantity(merged)?;
                debug!(cart_id = %cart.id, service_id = %service_id, quantity = merged, "Merging cart line");
                self.db
                    .carts()
                    .update_item_quantity(
                        &existing.id,
                        merged,
                        existing.price().times(merged).minor(),
                    )
                    .await?;
            }
            None => {
                validate_cart_size(cart.items.len())?;
                let item = CartItem {
                    id: Uuid::new_v4().to_string(),
                    cart_id: cart.id.clone(),
                    service_id: service.id.clone(),
                    service_name: service.name.clone(),
                    price_minor: service.price_minor,
                    quantity,
                    total_minor: service.price().times(quantity).minor(),
                    created_at: Utc::now(),
                };
                self.db.carts().insert_item(&item).await?;
            }
        }

        self.refresh_totals(&cart).await?;
        self.reload(&actor.user_id).await
    }

    /// Sets the quantity of an existing line.
    pub async fn update_item(
        &self,
        actor: &Actor,
        service_id: &str,
        quantity: i64,
    ) -> ApiResult<Cart> {
        validate_quantity(quantity)?;

        let cart = self.require_cart(&actor.user_id).await?;
        let item = cart
            .items
            .iter()
            .find(|i| i.service_id == service_id)
            .ok_or_else(|| ApiError::not_found("Cart item", service_id))?;

        self.db
            .carts()
            .update_item_quantity(&item.id, quantity, item.price().times(quantity).minor())
            .await?;

        self.refresh_totals(&cart).await?;
        self.reload(&actor.user_id).await
    }

    /// Removes a line. Removing the last line deletes the cart itself
    /// and `None` is returned.
    pub async fn remove_item(&self, actor: &Actor, service_id: &str) -> ApiResult<Option<Cart>> {
        let cart = self.require_cart(&actor.user_id).await?;
        let item = cart
            .items
            .iter()
            .find(|i| i.service_id == service_id)
            .ok_or_else(|| ApiError::not_found("Cart item", service_id))?;

        if cart.items.len() == 1 {
            // Empty carts are never persisted
            self.db.carts().delete_cart(&cart.id).await?;
            info!(cart_id = %cart.id, "Last line removed, cart deleted");
            return Ok(None);
        }

        self.db.carts().delete_item(&item.id).await?;
        self.refresh_totals(&cart).await?;
        Ok(Some(self.reload(&actor.user_id).await?))
    }

    /// Deletes the actor's cart entirely. Idempotent.
    pub async fn clear(&self, actor: &Actor) -> ApiResult<()> {
        if let Some(cart) = self.db.carts().find_by_user(&actor.user_id).await? {
            self.db.carts().delete_cart(&cart.id).await?;
        }
        Ok(())
    }

    /// Recomputes and persists totals from the current lines.
    ///
    /// Fee/rate come from the cart snapshot, not the live config.
    async fn refresh_totals(&self, cart: &Cart) -> ApiResult<()> {
        let items = self.db.carts().get_items(&cart.id).await?;
        let totals = compute_totals(&items, cart.visitation_fee(), cart.tax_rate());
        self.db.carts().update_totals(&cart.id, &totals).await?;
        Ok(())
    }

    async fn require_cart(&self, user_id: &str) -> ApiResult<Cart> {
        self.db
            .carts()
            .find_by_user(user_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Cart", user_id))
    }

    async fn reload(&self, user_id: &str) -> ApiResult<Cart> {
        self.require_cart(user_id).await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
