//! # Booking Repository
//!
//! Database operations for bookings and their frozen line items.
//!
//! ## Booking Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Booking Lifecycle                                 │
//! │                                                                         │
//! │  1. CHECKOUT                                                           │
//! │     └── create_from_cart() → Booking { status: Created }               │
//! │         (inserts booking + items AND deletes the cart, one txn)        │
//! │                                                                         │
//! │  2. ACCEPT (first provider wins)                                       │
//! │     └── accept() → conditional UPDATE guarded on                       │
//! │         status IN (created, pending) AND provider IS NULL              │
//! │         rows_affected = 0 means someone else already won               │
//! │                                                                         │
//! │  3. COMPLETE (OTP handshake)                                           │
//! │     └── complete_with_otp() → guarded on status = accepted             │
//! │         AND matching OTP; clears the OTP so replay fails               │
//! │                                                                         │
//! │  4. CANCEL (any non-terminal state)                                    │
//! │     └── cancel() → guarded on status NOT IN (completed, canceled)      │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every guard lives in the WHERE clause of a single UPDATE, so races
//! between concurrent actors are settled by SQLite, not by read-then-write
//! application code.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use khidmat_core::{Booking, BookingItem, BookingStatus};

/// Repository for booking database operations.
#[derive(Debug, Clone)]
pub struct BookingRepository {
    pool: SqlitePool,
}

impl BookingRepository {
    /// Creates a new BookingRepository.
    pub fn new(pool: SqlitePool) -> Self {
        BookingRepository { pool }
    }

    // =========================================================================
    // Creation
    // =========================================================================

    /// Creates a booking from a cart, atomically.
    ///
    /// ## Atomic Swap
    /// Inserts the booking and its frozen line items and deletes the cart
    /// (with its lines) in ONE database transaction. Either the user ends
    /// up with a booking and no cart, or with their cart untouched.
    pub async fn create_from_cart(&self, booking: &Booking, cart_id: &str) -> DbResult<()> {
        debug!(id = %booking.id, cart_id = %cart_id, "Creating booking from cart");

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO bookings (
                id, user_id, service_provider_id, status, payment_mode,
                item_total_minor, visitation_fee_minor, tax_minor,
                total_amount_minor, amount_to_pay_minor,
                payment_status, gateway_payment_id, address_id, notes,
                verification_otp, otp_issued_at, cancellation_reason,
                is_deleted, created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5,
                ?6, ?7, ?8,
                ?9, ?10,
                ?11, ?12, ?13, ?14,
                ?15, ?16, ?17,
                ?18, ?19, ?20
            )
            "#,
        )
        .bind(&booking.id)
        .bind(&booking.user_id)
        .bind(&booking.service_provider_id)
        .bind(booking.status)
        .bind(booking.payment_mode)
        .bind(booking.item_total_minor)
        .bind(booking.visitation_fee_minor)
        .bind(booking.tax_minor)
        .bind(booking.total_amount_minor)
        .bind(booking.amount_to_pay_minor)
        .bind(booking.payment_status)
        .bind(&booking.gateway_payment_id)
        .bind(&booking.address_id)
        .bind(&booking.notes)
        .bind(&booking.verification_otp)
        .bind(booking.otp_issued_at)
        .bind(&booking.cancellation_reason)
        .bind(booking.is_deleted)
        .bind(booking.created_at)
        .bind(booking.updated_at)
        .execute(&mut *tx)
        .await?;

        for item in &booking.items {
            sqlx::query(
                r#"
                INSERT INTO booking_items (
                    id, booking_id, service_id, service_name,
                    price_minor, quantity, total_minor
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
            )
            .bind(&item.id)
            .bind(&item.booking_id)
            .bind(&item.service_id)
            .bind(&item.service_name)
            .bind(item.price_minor)
            .bind(item.quantity)
            .bind(item.total_minor)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query("DELETE FROM cart_items WHERE cart_id = ?1")
            .bind(cart_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM carts WHERE id = ?1")
            .bind(cart_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(())
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Gets a booking by ID with its items. Soft-deleted bookings are
    /// invisible.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Booking>> {
        let booking = sqlx::query_as::<_, Booking>(
            r#"
            SELECT id, user_id, service_provider_id, status, payment_mode,
                   item_total_minor, visitation_fee_minor, tax_minor,
                   total_amount_minor, amount_to_pay_minor,
                   payment_status, gateway_payment_id, address_id, notes,
                   verification_otp, otp_issued_at, cancellation_reason,
                   is_deleted, created_at, updated_at
            FROM bookings
            WHERE id = ?1 AND is_deleted = 0
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match booking {
            Some(mut booking) => {
                booking.items = self.get_items(&booking.id).await?;
                Ok(Some(booking))
            }
            None => Ok(None),
        }
    }

    /// Gets the frozen line items for a booking.
    pub async fn get_items(&self, booking_id: &str) -> DbResult<Vec<BookingItem>> {
        let items = sqlx::query_as::<_, BookingItem>(
            r#"
            SELECT id, booking_id, service_id, service_name,
                   price_minor, quantity, total_minor
            FROM booking_items
            WHERE booking_id = ?1
            "#,
        )
        .bind(booking_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Lists a user's bookings, newest first, optionally filtered by status.
    pub async fn list_for_user(
        &self,
        user_id: &str,
        status: Option<BookingStatus>,
        limit: i64,
        offset: i64,
    ) -> DbResult<Vec<Booking>> {
        let bookings = sqlx::query_as::<_, Booking>(
            r#"
            SELECT id, user_id, service_provider_id, status, payment_mode,
                   item_total_minor, visitation_fee_minor, tax_minor,
                   total_amount_minor, amount_to_pay_minor,
                   payment_status, gateway_payment_id, address_id, notes,
                   verification_otp, otp_issued_at, cancellation_reason,
                   is_deleted, created_at, updated_at
            FROM bookings
            WHERE user_id = ?1
              AND is_deleted = 0
              AND (?2 IS NULL OR status = ?2)
            ORDER BY created_at DESC
            LIMIT ?3 OFFSET ?4
            "#,
        )
        .bind(user_id)
        .bind(status)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        self.attach_items(bookings).await
    }

    /// Lists a provider's assigned bookings, newest first.
    pub async fn list_for_provider(
        &self,
        provider_id: &str,
        status: Option<BookingStatus>,
        limit: i64,
        offset: i64,
    ) -> DbResult<Vec<Booking>> {
        let bookings = sqlx::query_as::<_, Booking>(
            r#"
            SELECT id, user_id, service_provider_id, status, payment_mode,
                   item_total_minor, visitation_fee_minor, tax_minor,
                   total_amount_minor, amount_to_pay_minor,
                   payment_status, gateway_payment_id, address_id, notes,
                   verification_otp, otp_issued_at, cancellation_reason,
                   is_deleted, created_at, updated_at
            FROM bookings
            WHERE service_provider_id = ?1
              AND is_deleted = 0
              AND (?2 IS NULL OR status = ?2)
            ORDER BY created_at DESC
            LIMIT ?3 OFFSET ?4
            "#,
        )
        .bind(provider_id)
        .bind(status)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        self.attach_items(bookings).await
    }

    /// Lists every booking (admin view), newest first.
    pub async fn list_all(
        &self,
        status: Option<BookingStatus>,
        limit: i64,
        offset: i64,
    ) -> DbResult<Vec<Booking>> {
        let bookings = sqlx::query_as::<_, Booking>(
            r#"
            SELECT id, user_id, service_provider_id, status, payment_mode,
                   item_total_minor, visitation_fee_minor, tax_minor,
                   total_amount_minor, amount_to_pay_minor,
                   payment_status, gateway_payment_id, address_id, notes,
                   verification_otp, otp_issued_at, cancellation_reason,
                   is_deleted, created_at, updated_at
            FROM bookings
            WHERE is_deleted = 0
              AND (?1 IS NULL OR status = ?1)
            ORDER BY created_at DESC
            LIMIT ?2 OFFSET ?3
            "#,
        )
        .bind(status)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        self.attach_items(bookings).await
    }

    /// Lists unassigned bookings a provider is eligible to accept,
    /// oldest first (fairness: first come, first served).
    ///
    /// Eligibility: the booking contains at least one service the
    /// provider offers.
    pub async fn list_available_for_provider(
        &self,
        provider_id: &str,
        limit: i64,
        offset: i64,
    ) -> DbResult<Vec<Booking>> {
        let bookings = sqlx::query_as::<_, Booking>(
            r#"
            SELECT b.id, b.user_id, b.service_provider_id, b.status, b.payment_mode,
                   b.item_total_minor, b.visitation_fee_minor, b.tax_minor,
                   b.total_amount_minor, b.amount_to_pay_minor,
                   b.payment_status, b.gateway_payment_id, b.address_id, b.notes,
                   b.verification_otp, b.otp_issued_at, b.cancellation_reason,
                   b.is_deleted, b.created_at, b.updated_at
            FROM bookings b
            WHERE b.status IN ('created', 'pending')
              AND b.service_provider_id IS NULL
              AND b.is_deleted = 0
              AND EXISTS (
                  SELECT 1
                  FROM booking_items bi
                  JOIN provider_services ps ON ps.service_id = bi.service_id
                  WHERE bi.booking_id = b.id AND ps.service_provider_id = ?1
              )
            ORDER BY b.created_at ASC
            LIMIT ?2 OFFSET ?3
            "#,
        )
        .bind(provider_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        self.attach_items(bookings).await
    }

    async fn attach_items(&self, mut bookings: Vec<Booking>) -> DbResult<Vec<Booking>> {
        for booking in &mut bookings {
            booking.items = self.get_items(&booking.id).await?;
        }
        Ok(bookings)
    }

    // =========================================================================
    // State Transitions
    // =========================================================================

    /// Claims a booking for a provider and stores the issued OTP.
    ///
    /// ## Race Resolution
    /// The guard is entirely in the WHERE clause: the booking must still
    /// be unassigned and waiting. When two providers race, exactly one
    /// UPDATE matches a row; the loser gets `NotFound` because, from
    /// their perspective, no available booking exists anymore.
    pub async fn accept(
        &self,
        booking_id: &str,
        provider_id: &str,
        otp: &str,
        issued_at: DateTime<Utc>,
    ) -> DbResult<()> {
        debug!(id = %booking_id, provider_id = %provider_id, "Accepting booking");

        let result = sqlx::query(
            r#"
            UPDATE bookings SET
                status = 'accepted',
                service_provider_id = ?2,
                verification_otp = ?3,
                otp_issued_at = ?4,
                updated_at = ?4
            WHERE id = ?1
              AND status IN ('created', 'pending')
              AND service_provider_id IS NULL
              AND is_deleted = 0
            "#,
        )
        .bind(booking_id)
        .bind(provider_id)
        .bind(otp)
        .bind(issued_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Available booking", booking_id));
        }

        Ok(())
    }

    /// Completes a booking when the submitted OTP matches.
    ///
    /// Clears the OTP in the same statement, so a second submission of
    /// the same code matches nothing (single use).
    ///
    /// ## Returns
    /// `true` if the booking transitioned to completed, `false` if the
    /// guard didn't match (wrong OTP, wrong state, or already completed).
    pub async fn complete_with_otp(&self, booking_id: &str, otp: &str) -> DbResult<bool> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE bookings SET
                status = 'completed',
                verification_otp = NULL,
                otp_issued_at = NULL,
                updated_at = ?3
            WHERE id = ?1
              AND status = 'accepted'
              AND verification_otp = ?2
              AND is_deleted = 0
            "#,
        )
        .bind(booking_id)
        .bind(otp)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Applies a plain status update, guarded against writes to rows
    /// already in a terminal state.
    ///
    /// Moving into a terminal state discards any pending OTP, matching
    /// what the dedicated completion and cancellation paths do.
    ///
    /// ## Returns
    /// `true` if a row was updated, `false` if the booking is terminal
    /// (or missing).
    pub async fn update_status(&self, booking_id: &str, status: BookingStatus) -> DbResult<bool> {
        let now = Utc::now();
        let clears_otp = status.is_terminal();

        let result = sqlx::query(
            r#"
            UPDATE bookings SET
                status = ?2,
                verification_otp = CASE WHEN ?4 THEN NULL ELSE verification_otp END,
                otp_issued_at = CASE WHEN ?4 THEN NULL ELSE otp_issued_at END,
                updated_at = ?3
            WHERE id = ?1
              AND status NOT IN ('completed', 'canceled')
              AND is_deleted = 0
            "#,
        )
        .bind(booking_id)
        .bind(status)
        .bind(now)
        .bind(clears_otp)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Cancels a booking from any non-terminal state.
    ///
    /// Also discards any pending OTP, so an accepted-then-canceled
    /// booking can never be completed with a stale code.
    pub async fn cancel(&self, booking_id: &str, reason: Option<&str>) -> DbResult<bool> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE bookings SET
                status = 'canceled',
                cancellation_reason = ?2,
                verification_otp = NULL,
                otp_issued_at = NULL,
                updated_at = ?3
            WHERE id = ?1
              AND status NOT IN ('completed', 'canceled')
              AND is_deleted = 0
            "#,
        )
        .bind(booking_id)
        .bind(reason)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Soft-deletes a booking. It disappears from every read path but
    /// the row (and its payment history) survives for audit.
    pub async fn soft_delete(&self, booking_id: &str) -> DbResult<()> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE bookings SET is_deleted = 1, updated_at = ?2
            WHERE id = ?1 AND is_deleted = 0
            "#,
        )
        .bind(booking_id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Booking", booking_id));
        }

        Ok(())
    }

    /// Marks the booking paid after a captured transaction is recorded.
    pub async fn set_payment_captured(
        &self,
        booking_id: &str,
        gateway_payment_id: Option<&str>,
    ) -> DbResult<()> {
        let now = Utc::now();

        sqlx::query(
            r#"
            UPDATE bookings SET
                payment_status = 'paid',
                gateway_payment_id = COALESCE(?2, gateway_payment_id),
                updated_at = ?3
            WHERE id = ?1 AND is_deleted = 0
            "#,
        )
        .bind(booking_id)
        .bind(gateway_payment_id)
        .bind(now)
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
    use khidmat_core::{
        Booking, BookingItem, BookingStatus, PaymentStatus, Role, Service, ServiceProvider, User,
    };

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    async fn seed_user(db: &Database, id: &str, role: Role) {
        db.catalog()
            .insert_user(&User {
                id: id.to_string(),
                name: format!("User {id}"),
                email: format!("{id}@example.com"),
                role,
                is_deleted: false,
                created_at: Utc::now(),
            })
            .await
            .unwrap();
    }

    async fn seed_provider(db: &Database, id: &str, user_id: &str) {
        let now = Utc::now();
        db.catalog()
            .insert_provider(&ServiceProvider {
                id: id.to_string(),
                user_id: user_id.to_string(),
                business_name: None,
                is_approved: true,
                is_deleted: false,
                created_at: now,
                updated_at: now,
            })
            .await
            .unwrap();
    }

    async fn seed_service(db: &Database, id: &str, price_minor: i64) {
        let now = Utc::now();
        db.catalog()
            .insert_service(&Service {
                id: id.to_string(),
                name: format!("Service {id}"),
                description: None,
                price_minor,
                is_deleted: false,
                created_at: now,
                updated_at: now,
            })
            .await
            .unwrap();
    }

    fn booking(id: &str, user_id: &str, service_id: &str) -> Booking {
        let now = Utc::now();
        Booking {
            id: id.to_string(),
            user_id: user_id.to_string(),
            service_provider_id: None,
            status: BookingStatus::Created,
            payment_mode: None,
            item_total_minor: 20_000,
            visitation_fee_minor: 5_000,
            tax_minor: 3_750,
            total_amount_minor: 28_750,
            amount_to_pay_minor: 28_750,
            payment_status: PaymentStatus::Pending,
            gateway_payment_id: None,
            address_id: "addr-1".to_string(),
            notes: String::new(),
            verification_otp: None,
            otp_issued_at: None,
            cancellation_reason: None,
            is_deleted: false,
            created_at: now,
            updated_at: now,
            items: vec![BookingItem {
                id: format!("{id}-item"),
                booking_id: id.to_string(),
                service_id: service_id.to_string(),
                service_name: "AC Repair".to_string(),
                price_minor: 10_000,
                quantity: 2,
                total_minor: 20_000,
            }],
        }
    }

    async fn seed_booking(db: &Database, id: &str) {
        seed_user(db, &format!("u-{id}"), Role::User).await;
        seed_service(db, &format!("s-{id}"), 10_000).await;
        let b = booking(id, &format!("u-{id}"), &format!("s-{id}"));
        // no cart backing these test bookings; deleting a missing cart is a no-op
        db.bookings().create_from_cart(&b, "no-cart").await.unwrap();
    }

    #[tokio::test]
    async fn test_create_and_get_with_items() {
        let db = test_db().await;
        seed_booking(&db, "b1").await;

        let loaded = db.bookings().get_by_id("b1").await.unwrap().unwrap();
        assert_eq!(loaded.status, BookingStatus::Created);
        assert_eq!(loaded.items.len(), 1);
        assert_eq!(loaded.total_amount_minor, 28_750);
    }

    #[tokio::test]
    async fn test_accept_claims_booking_once() {
        let db = test_db().await;
        seed_booking(&db, "b2").await;
        seed_user(&db, "pu1", Role::ServiceProvider).await;
        seed_user(&db, "pu2", Role::ServiceProvider).await;
        seed_provider(&db, "p1", "pu1").await;
        seed_provider(&db, "p2", "pu2").await;

        let now = Utc::now();
        db.bookings().accept("b2", "p1", "1234", now).await.unwrap();

        // Second claim sees no available booking
        let err = db.bookings().accept("b2", "p2", "5678", now).await;
        assert!(err.is_err());

        let loaded = db.bookings().get_by_id("b2").await.unwrap().unwrap();
        assert_eq!(loaded.status, BookingStatus::Accepted);
        assert_eq!(loaded.service_provider_id.as_deref(), Some("p1"));
        assert_eq!(loaded.verification_otp.as_deref(), Some("1234"));
    }

    #[tokio::test]
    async fn test_concurrent_accept_exactly_one_winner() {
        let db = test_db().await;
        seed_booking(&db, "b3").await;
        seed_user(&db, "pu3", Role::ServiceProvider).await;
        seed_user(&db, "pu4", Role::ServiceProvider).await;
        seed_provider(&db, "p3", "pu3").await;
        seed_provider(&db, "p4", "pu4").await;

        let now = Utc::now();
        let bookings1 = db.bookings();
        let bookings2 = db.bookings();
        let r1 = bookings1.accept("b3", "p3", "1111", now);
        let r2 = bookings2.accept("b3", "p4", "2222", now);
        let (r1, r2) = tokio::join!(r1, r2);

        assert_eq!(r1.is_ok() as u8 + r2.is_ok() as u8, 1);
    }

    #[tokio::test]
    async fn test_otp_completes_once() {
        let db = test_db().await;
        seed_booking(&db, "b4").await;
        seed_user(&db, "pu5", Role::ServiceProvider).await;
        seed_provider(&db, "p5", "pu5").await;

        db.bookings()
            .accept("b4", "p5", "4242", Utc::now())
            .await
            .unwrap();

        // Wrong OTP leaves the booking accepted
        assert!(!db.bookings().complete_with_otp("b4", "9999").await.unwrap());
        let loaded = db.bookings().get_by_id("b4").await.unwrap().unwrap();
        assert_eq!(loaded.status, BookingStatus::Accepted);

        // Correct OTP completes and clears the code
        assert!(db.bookings().complete_with_otp("b4", "4242").await.unwrap());
        let loaded = db.bookings().get_by_id("b4").await.unwrap().unwrap();
        assert_eq!(loaded.status, BookingStatus::Completed);
        assert!(loaded.verification_otp.is_none());

        // Replay fails: the OTP is gone and the state is terminal
        assert!(!db.bookings().complete_with_otp("b4", "4242").await.unwrap());
    }

    #[tokio::test]
    async fn test_cancel_guards_terminal_states() {
        let db = test_db().await;
        seed_booking(&db, "b5").await;

        assert!(db
            .bookings()
            .cancel("b5", Some("changed my mind"))
            .await
            .unwrap());

        // Already canceled: guard rejects the second cancel
        assert!(!db.bookings().cancel("b5", None).await.unwrap());

        let loaded = db.bookings().get_by_id("b5").await.unwrap().unwrap();
        assert_eq!(loaded.status, BookingStatus::Canceled);
        assert_eq!(
            loaded.cancellation_reason.as_deref(),
            Some("changed my mind")
        );
    }

    #[tokio::test]
    async fn test_soft_delete_hides_booking() {
        let db = test_db().await;
        seed_booking(&db, "b6").await;

        db.bookings().soft_delete("b6").await.unwrap();

        assert!(db.bookings().get_by_id("b6").await.unwrap().is_none());
        let all = db.bookings().list_all(None, 50, 0).await.unwrap();
        assert!(all.iter().all(|b| b.id != "b6"));
    }

    #[tokio::test]
    async fn test_available_pool_filters_by_provider_services() {
        let db = test_db().await;
        seed_booking(&db, "b7").await;
        seed_user(&db, "pu6", Role::ServiceProvider).await;
        seed_provider(&db, "p6", "pu6").await;

        // Provider offers nothing yet: pool is empty
        let pool = db
            .bookings()
            .list_available_for_provider("p6", 50, 0)
            .await
            .unwrap();
        assert!(pool.is_empty());

        // Offering the booking's service makes it visible
        db.catalog()
            .add_provider_service("p6", "s-b7")
            .await
            .unwrap();
        let pool = db
            .bookings()
            .list_available_for_provider("p6", 50, 0)
            .await
            .unwrap();
        assert_eq!(pool.len(), 1);
        assert_eq!(pool[0].id, "b7");
    }

    #[tokio::test]
    async fn test_available_pool_is_oldest_first() {
        let db = test_db().await;
        seed_user(&db, "u-fifo", Role::User).await;
        seed_service(&db, "s-fifo", 10_000).await;
        seed_user(&db, "pu7", Role::ServiceProvider).await;
        seed_provider(&db, "p7", "pu7").await;
        db.catalog()
            .add_provider_service("p7", "s-fifo")
            .await
            .unwrap();

        // Insert the newer booking first so the ordering cannot come
        // from insertion order
        let newer = booking("b-new", "u-fifo", "s-fifo");
        let mut older = booking("b-old", "u-fifo", "s-fifo");
        older.created_at = newer.created_at - chrono::Duration::hours(1);
        db.bookings()
            .create_from_cart(&newer, "no-cart")
            .await
            .unwrap();
        db.bookings()
            .create_from_cart(&older, "no-cart")
            .await
            .unwrap();

        let pool = db
            .bookings()
            .list_available_for_provider("p7", 50, 0)
            .await
            .unwrap();
        assert_eq!(pool.len(), 2);
        assert_eq!(pool[0].id, "b-old");
        assert_eq!(pool[1].id, "b-new");
    }

    #[tokio::test]
    async fn test_list_for_user_status_filter() {
        let db = test_db().await;
        seed_booking(&db, "b8").await;

        let created = db
            .bookings()
            .list_for_user("u-b8", Some(BookingStatus::Created), 50, 0)
            .await
            .unwrap();
        assert_eq!(created.len(), 1);

        let completed = db
            .bookings()
            .list_for_user("u-b8", Some(BookingStatus::Completed), 50, 0)
            .await
            .unwrap();
        assert!(completed.is_empty());
    }
}
