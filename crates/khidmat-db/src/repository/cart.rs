//! # Cart Repository
//!
//! Database operations for carts and cart lines.
//!
//! ## Cart Invariants (enforced here and in the service layer)
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Cart Invariants                                   │
//! │                                                                         │
//! │  1. ONE CART PER USER                                                  │
//! │     └── UNIQUE(user_id); find_by_user() is the only entry point        │
//! │                                                                         │
//! │  2. ONE LINE PER SERVICE                                               │
//! │     └── UNIQUE(cart_id, service_id); adds merge quantities             │
//! │                                                                         │
//! │  3. TOTALS NEVER STALE                                                 │
//! │     └── update_totals() runs after every line mutation                 │
//! │                                                                         │
//! │  4. EMPTY CART NEVER PERSISTED                                         │
//! │     └── removing the last line calls delete_cart()                     │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use khidmat_core::{Cart, CartItem, CartTotals};

/// Repository for cart database operations.
#[derive(Debug, Clone)]
pub struct CartRepository {
    pool: SqlitePool,
}

impl CartRepository {
    /// Creates a new CartRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CartRepository { pool }
    }

    /// Finds the user's cart with its lines loaded.
    ///
    /// Returns `None` when the user has no cart (which is the normal
    /// state between checkouts).
    pub async fn find_by_user(&self, user_id: &str) -> DbResult<Option<Cart>> {
        let cart = sqlx::query_as::<_, Cart>(
            r#"
            SELECT id, user_id, visitation_fee_minor, tax_rate_bps,
                   sub_total_minor, total_amount_minor, amount_to_pay_minor,
                   created_at, updated_at
            FROM carts
            WHERE user_id = ?1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        match cart {
            Some(mut cart) => {
                cart.items = self.get_items(&cart.id).await?;
                Ok(Some(cart))
            }
            None => Ok(None),
        }
    }

    /// Gets all lines for a cart, oldest first.
    pub async fn get_items(&self, cart_id: &str) -> DbResult<Vec<CartItem>> {
        let items = sqlx::query_as::<_, CartItem>(
            r#"
            SELECT id, cart_id, service_id, service_name,
                   price_minor, quantity, total_minor, created_at
            FROM cart_items
            WHERE cart_id = ?1
            ORDER BY created_at
            "#,
        )
        .bind(cart_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Inserts a new cart row (no lines yet).
    pub async fn insert_cart(&self, cart: &Cart) -> DbResult<()> {
        debug!(id = %cart.id, user_id = %cart.user_id, "Creating cart");

        sqlx::query(
            r#"
            INSERT INTO carts (
                id, user_id, visitation_fee_minor, tax_rate_bps,
                sub_total_minor, total_amount_minor, amount_to_pay_minor,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&cart.id)
        .bind(&cart.user_id)
        .bind(cart.visitation_fee_minor)
        .bind(cart.tax_rate_bps)
        .bind(cart.sub_total_minor)
        .bind(cart.total_amount_minor)
        .bind(cart.amount_to_pay_minor)
        .bind(cart.created_at)
        .bind(cart.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Inserts a cart line.
    ///
    /// ## Snapshot Pattern
    /// Service name and price are frozen on the line at add time, so
    /// later catalog edits never reprice an existing cart.
    pub async fn insert_item(&self, item: &CartItem) -> DbResult<()> {
        debug!(cart_id = %item.cart_id, service_id = %item.service_id, "Adding cart line");

        sqlx::query(
            r#"
            INSERT INTO cart_items (
                id, cart_id, service_id, service_name,
                price_minor, quantity, total_minor, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&item.id)
        .bind(&item.cart_id)
        .bind(&item.service_id)
        .bind(&item.service_name)
        .bind(item.price_minor)
        .bind(item.quantity)
        .bind(item.total_minor)
        .bind(item.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Updates a line's quantity and line total.
    pub async fn update_item_quantity(
        &self,
        item_id: &str,
        quantity: i64,
        total_minor: i64,
    ) -> DbResult<()> {
        sqlx::query(
            r#"
            UPDATE cart_items SET quantity = ?2, total_minor = ?3
            WHERE id = ?1
            "#,
        )
        .bind(item_id)
        .bind(quantity)
        .bind(total_minor)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Deletes a single cart line.
    pub async fn delete_item(&self, item_id: &str) -> DbResult<()> {
        sqlx::query("DELETE FROM cart_items WHERE id = ?1")
            .bind(item_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Persists recomputed totals for a cart.
    ///
    /// ## When To Call
    /// After every line mutation, with totals freshly derived from the
    /// lines. Stored totals are a cache of the lines, never a source of
    /// truth.
    pub async fn update_totals(&self, cart_id: &str, totals: &CartTotals) -> DbResult<()> {
        let now = Utc::now();

        sqlx::query(
            r#"
            UPDATE carts SET
                sub_total_minor = ?2,
                total_amount_minor = ?3,
                amount_to_pay_minor = ?4,
                updated_at = ?5
            WHERE id = ?1
            "#,
        )
        .bind(cart_id)
        .bind(totals.sub_total.minor())
        .bind(totals.total_amount.minor())
        .bind(totals.amount_to_pay.minor())
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Deletes a cart and (via FK cascade) all of its lines.
    ///
    /// ## When To Call
    /// - Removing the last line from a cart
    /// - Explicit clear-cart request
    /// (Checkout deletion happens inside the booking-creation
    /// transaction instead; see `BookingRepository::create_from_cart`.)
    pub async fn delete_cart(&self, cart_id: &str) -> DbResult<()> {
        debug!(cart_id = %cart_id, "Deleting cart");

        sqlx::query("DELETE FROM carts WHERE id = ?1")
            .bind(cart_id)
            .execute(&self.pool)
            .await?;

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
    use khidmat_core::{compute_totals, Cart, CartItem, Money, TaxRate};

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn cart(user_id: &str) -> Cart {
        let now = Utc::now();
        Cart {
            id: format!("cart-{user_id}"),
            user_id: user_id.to_string(),
            visitation_fee_minor: 5_000,
            tax_rate_bps: 1_500,
            sub_total_minor: 0,
            total_amount_minor: 0,
            amount_to_pay_minor: 0,
            created_at: now,
            updated_at: now,
            items: vec![],
        }
    }

    fn user_row(id: &str) -> khidmat_core::User {
        khidmat_core::User {
            id: id.to_string(),
            name: format!("User {id}"),
            email: format!("{id}@example.com"),
            role: khidmat_core::Role::User,
            is_deleted: false,
            created_at: Utc::now(),
        }
    }

    fn service_row(id: &str, price_minor: i64) -> khidmat_core::Service {
        let now = Utc::now();
        khidmat_core::Service {
            id: id.to_string(),
            name: format!("Service {id}"),
            description: None,
            price_minor,
            is_deleted: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_cart_roundtrip_with_items() {
        let db = test_db().await;
        db.catalog().insert_user(&user_row("u1")).await.unwrap();
        db.catalog()
            .insert_service(&service_row("s1", 10_000))
            .await
            .unwrap();

        let c = cart("u1");
        db.carts().insert_cart(&c).await.unwrap();

        let item = CartItem {
            id: "i1".to_string(),
            cart_id: c.id.clone(),
            service_id: "s1".to_string(),
            service_name: "Service s1".to_string(),
            price_minor: 10_000,
            quantity: 2,
            total_minor: 20_000,
            created_at: Utc::now(),
        };
        db.carts().insert_item(&item).await.unwrap();

        let totals = compute_totals(&[item], Money::from_minor(5_000), TaxRate::from_bps(1_500));
        db.carts().update_totals(&c.id, &totals).await.unwrap();

        let loaded = db.carts().find_by_user("u1").await.unwrap().unwrap();
        assert_eq!(loaded.items.len(), 1);
        assert_eq!(loaded.sub_total_minor, 20_000);
        assert_eq!(loaded.total_amount_minor, 28_750);
    }

    #[tokio::test]
    async fn test_delete_cart_cascades_items() {
        let db = test_db().await;
        db.catalog().insert_user(&user_row("u2")).await.unwrap();
        db.catalog()
            .insert_service(&service_row("s2", 500))
            .await
            .unwrap();

        let c = cart("u2");
        db.carts().insert_cart(&c).await.unwrap();
        db.carts()
            .insert_item(&CartItem {
                id: "i2".to_string(),
                cart_id: c.id.clone(),
                service_id: "s2".to_string(),
                service_name: "x".to_string(),
                price_minor: 500,
                quantity: 1,
                total_minor: 500,
                created_at: Utc::now(),
            })
            .await
            .unwrap();

        db.carts().delete_cart(&c.id).await.unwrap();

        assert!(db.carts().find_by_user("u2").await.unwrap().is_none());
        assert!(db.carts().get_items(&c.id).await.unwrap().is_empty());
    }
}
