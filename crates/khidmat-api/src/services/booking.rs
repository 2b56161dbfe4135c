//! # Booking Service
//!
//! Checkout and the booking lifecycle.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Booking Lifecycle                                  │
//! │                                                                         │
//! │  checkout ──► created ──────┐                                          │
//! │                  │          │ accept (provider, atomic claim)          │
//! │              pending ───────┤                                          │
//! │                             ▼                                          │
//! │                         accepted ──► in_progress                       │
//! │                             │             │                            │
//! │                             │  verify_otp │                            │
//! │                             ▼             │                            │
//! │                         completed ◄───────┘   (terminal)               │
//! │                                                                         │
//! │  canceled ◄── cancel, from any non-terminal state   (terminal)         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Completion Handshake
//! Accepting a booking mints a 4-digit OTP, stored on the row and sent
//! to the customer. The provider closes the job by presenting that OTP;
//! the matching UPDATE clears it, so a code can never complete twice.
//! Provider-facing reads never include the OTP.

use std::sync::Arc;

use chrono::Utc;
use rand::Rng;
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::notify::NotificationGateway;
use khidmat_core::validation::{validate_notes, validate_otp};
use khidmat_core::{
    compute_totals, Actor, Booking, BookingItem, BookingStatus, CoreError, PaymentMode,
    PaymentStatus, Role, ServiceProvider,
};
use khidmat_db::Database;

const DEFAULT_PAGE_SIZE: i64 = 20;
const MAX_PAGE_SIZE: i64 = 100;

/// What a customer submits at checkout.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutRequest {
    pub address_id: String,
    pub payment_mode: Option<PaymentMode>,
    pub notes: Option<String>,
}

/// Page cursor for listings.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct Page {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl Page {
    fn clamp(self) -> (i64, i64) {
        let limit = self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        let offset = self.offset.unwrap_or(0).max(0);
        (limit, offset)
    }
}

/// Service for checkout and booking lifecycle transitions.
#[derive(Clone)]
pub struct BookingService {
    db: Database,
    notifier: Arc<dyn NotificationGateway>,
    /// When set, OTPs older than this many seconds are rejected.
    otp_ttl_secs: Option<i64>,
}

impl BookingService {
    /// Creates a new BookingService.
    pub fn new(
        db: Database,
        notifier: Arc<dyn NotificationGateway>,
        otp_ttl_secs: Option<i64>,
    ) -> Self {
        BookingService {
            db,
            notifier,
            otp_ttl_secs,
        }
    }

    // =========================================================================
    // Checkout
    // =========================================================================

    /// Converts the actor's cart into a booking.
    ///
    /// The cart's lines and pricing snapshot become the booking's; the
    /// insert and the cart deletion happen in one transaction, so the
    /// cart is consumed exactly when the booking exists.
    pub async fn checkout(&self, actor: &Actor, request: CheckoutRequest) -> ApiResult<Booking> {
        let notes = request.notes.unwrap_or_default();
        validate_notes(&notes)?;

        if !self
            .db
            .catalog()
            .address_belongs_to(&request.address_id, &actor.user_id)
            .await?
        {
            return Err(ApiError::not_found("Address", &request.address_id));
        }

        let cart = self
            .db
            .carts()
            .find_by_user(&actor.user_id)
            .await?
            .filter(|c| !c.is_empty())
            .ok_or(CoreError::CartEmpty)
            .map_err(ApiError::from)?;

        // Totals are recomputed from the lines at the moment of
        // checkout; stored cart totals are treated as a cache only
        let totals = compute_totals(&cart.items, cart.visitation_fee(), cart.tax_rate());

        let now = Utc::now();
        let booking_id = Uuid::new_v4().to_string();
        let items: Vec<BookingItem> = cart
            .items
            .iter()
            .map(|line| BookingItem {
                id: Uuid::new_v4().to_string(),
                booking_id: booking_id.clone(),
                service_id: line.service_id.clone(),
                service_name: line.service_name.clone(),
                price_minor: line.price_minor,
                quantity: line.quantity,
                total_minor: line.total_minor,
            })
            .collect();

        let booking = Booking {
            id: booking_id,
            user_id: actor.user_id.clone(),
            service_provider_id: None,
            status: BookingStatus::Created,
            payment_mode: request.payment_mode,
            item_total_minor: totals.sub_total.minor(),
            visitation_fee_minor: cart.visitation_fee_minor,
            tax_minor: totals.tax_amount.minor(),
            total_amount_minor: totals.total_amount.minor(),
            amount_to_pay_minor: totals.amount_to_pay.minor(),
            payment_status: PaymentStatus::Pending,
            gateway_payment_id: None,
            address_id: request.address_id,
            notes,
            verification_otp: None,
            otp_issued_at: None,
            cancellation_reason: None,
            is_deleted: false,
            created_at: now,
            updated_at: now,
            items,
        };

        self.db.bookings().create_from_cart(&booking, &cart.id).await?;

        info!(
            booking_id = %booking.id,
            user_id = %actor.user_id,
            total = %booking.total_amount(),
            items = booking.items.len(),
            "Booking created from cart"
        );

        Ok(booking)
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Fetches one booking, enforcing visibility.
    ///
    /// Visible to its customer, its assigned provider, and admins. The
    /// OTP is stripped from provider-facing responses.
    pub async fn get_details(&self, actor: &Actor, booking_id: &str) -> ApiResult<Booking> {
        let booking = self.require_booking(booking_id).await?;

        if actor.is_admin() || booking.user_id == actor.user_id {
            return Ok(booking);
        }

        if let Some(provider) = self.provider_for(actor).await? {
            if booking.service_provider_id.as_deref() == Some(provider.id.as_str()) {
                return Ok(scrub_otp(booking));
            }
        }

        // Existence is not leaked to strangers
        Err(ApiError::not_found("Booking", booking_id))
    }

    /// The actor's own bookings, newest first.
    pub async fn my_bookings(
        &self,
        actor: &Actor,
        status: Option<BookingStatus>,
        page: Page,
    ) -> ApiResult<Vec<Booking>> {
        let (limit, offset) = page.clamp();
        Ok(self
            .db
            .bookings()
            .list_for_user(&actor.user_id, status, limit, offset)
            .await?)
    }

    /// Bookings assigned to the calling provider, newest first.
    pub async fn provider_bookings(
        &self,
        actor: &Actor,
        status: Option<BookingStatus>,
        page: Page,
    ) -> ApiResult<Vec<Booking>> {
        let provider = self.require_provider(actor).await?;
        let (limit, offset) = page.clamp();
        let bookings = self
            .db
            .bookings()
            .list_for_provider(&provider.id, status, limit, offset)
            .await?;
        Ok(bookings.into_iter().map(scrub_otp).collect())
    }

    /// Every booking in the system. Admin only.
    pub async fn all_bookings(
        &self,
        actor: &Actor,
        status: Option<BookingStatus>,
        page: Page,
    ) -> ApiResult<Vec<Booking>> {
        if !actor.is_admin() {
            return Err(ApiError::forbidden("admin role required"));
        }
        let (limit, offset) = page.clamp();
        Ok(self.db.bookings().list_all(status, limit, offset).await?)
    }

    /// Unassigned bookings the calling provider could accept, oldest
    /// first, limited to bookings containing at least one service the
    /// provider offers.
    pub async fn available_bookings(&self, actor: &Actor, page: Page) -> ApiResult<Vec<Booking>> {
        let provider = self.require_provider(actor).await?;
        let (limit, offset) = page.clamp();
        let bookings = self
            .db
            .bookings()
            .list_available_for_provider(&provider.id, limit, offset)
            .await?;
        Ok(bookings.into_iter().map(scrub_otp).collect())
    }

    // =========================================================================
    // Lifecycle Transitions
    // =========================================================================

    /// Claims an unassigned booking for the calling provider.
    ///
    /// The claim is a single conditional UPDATE, so when several
    /// providers race for the same booking exactly one wins; losers see
    /// the booking as not found. Winning mints the completion OTP and
    /// notifies the customer.
    pub async fn accept(&self, actor: &Actor, booking_id: &str) -> ApiResult<Booking> {
        let provider = self.require_provider(actor).await?;

        if !self
            .db
            .catalog()
            .provider_offers_any_for_booking(&provider.id, booking_id)
            .await?
        {
            return Err(ApiError::not_found("Available booking", booking_id));
        }

        let otp = generate_otp();
        let issued_at = Utc::now();
        self.db
            .bookings()
            .accept(booking_id, &provider.id, &otp, issued_at)
            .await?;

        let booking = self.require_booking(booking_id).await?;

        info!(
            booking_id = %booking_id,
            provider_id = %provider.id,
            "Booking accepted"
        );

        // Best effort: the transition already committed
        match self.db.catalog().get_user(&booking.user_id).await? {
            Some(customer) => {
                if let Err(e) = self.notifier.booking_accepted(&booking, &customer, &otp).await {
                    warn!(booking_id = %booking_id, error = %e, "Accept notification failed");
                }
            }
            None => warn!(booking_id = %booking_id, "Customer not found, skipping notification"),
        }

        Ok(scrub_otp(booking))
    }

    /// Completes an accepted booking by presenting the customer's OTP.
    pub async fn verify_otp(&self, actor: &Actor, booking_id: &str, otp: &str) -> ApiResult<Booking> {
        validate_otp(otp)?;

        let booking = self.require_booking(booking_id).await?;

        if !actor.is_admin() {
            let provider = self.require_provider(actor).await?;
            if booking.service_provider_id.as_deref() != Some(provider.id.as_str()) {
                return Err(ApiError::forbidden(
                    "booking is not assigned to this provider",
                ));
            }
        }

        if booking.status != BookingStatus::Accepted {
            return Err(CoreError::InvalidBookingStatus {
                booking_id: booking.id.clone(),
                current_status: booking.status.as_str().to_string(),
            }
            .into());
        }

        if let (Some(ttl), Some(issued_at)) = (self.otp_ttl_secs, booking.otp_issued_at) {
            if (Utc::now() - issued_at).num_seconds() > ttl {
                return Err(ApiError::validation("verification code has expired"));
            }
        }

        if !self.db.bookings().complete_with_otp(booking_id, otp).await? {
            return Err(ApiError::validation("invalid verification code"));
        }

        let booking = self.require_booking(booking_id).await?;
        info!(booking_id = %booking_id, "Booking completed");

        if let Some(customer) = self.db.catalog().get_user(&booking.user_id).await? {
            if let Err(e) = self.notifier.booking_completed(&booking, &customer).await {
                warn!(booking_id = %booking_id, error = %e, "Completion notification failed");
            }
        }

        Ok(scrub_otp(booking))
    }

    /// Sets a booking's status to the requested value.
    ///
    /// Allowed to the booking's customer, its assigned provider, and
    /// admins. A booking already completed or canceled is frozen and
    /// yields `Conflict`. Moving into `completed` fires the completion
    /// notification; moving into `canceled` records the default reason.
    pub async fn update_status(
        &self,
        actor: &Actor,
        booking_id: &str,
        status: BookingStatus,
    ) -> ApiResult<Booking> {
        let booking = self.require_booking(booking_id).await?;

        let is_owner = booking.user_id == actor.user_id;
        if !actor.is_admin() && !is_owner {
            let provider = self.require_provider(actor).await?;
            if booking.service_provider_id.as_deref() != Some(provider.id.as_str()) {
                return Err(ApiError::forbidden(
                    "booking is not assigned to this provider",
                ));
            }
        }

        let updated = match status {
            // The cancellation write also records the reason column
            BookingStatus::Canceled => {
                self.db
                    .bookings()
                    .cancel(booking_id, Some("No reason provided"))
                    .await?
            }
            _ => self.db.bookings().update_status(booking_id, status).await?,
        };
        if !updated {
            return Err(CoreError::InvalidBookingStatus {
                booking_id: booking.id,
                current_status: booking.status.as_str().to_string(),
            }
            .into());
        }

        let booking = self.require_booking(booking_id).await?;
        info!(booking_id = %booking_id, status = ?status, "Booking status updated");

        if status == BookingStatus::Completed {
            if let Some(customer) = self.db.catalog().get_user(&booking.user_id).await? {
                if let Err(e) = self.notifier.booking_completed(&booking, &customer).await {
                    warn!(booking_id = %booking_id, error = %e, "Completion notification failed");
                }
            }
        }

        Ok(if actor.is_admin() || is_owner {
            booking
        } else {
            scrub_otp(booking)
        })
    }

    /// Cancels a non-terminal booking.
    ///
    /// Allowed to the customer, the assigned provider, and admins.
    pub async fn cancel(
        &self,
        actor: &Actor,
        booking_id: &str,
        reason: Option<String>,
    ) -> ApiResult<Booking> {
        let booking = self.require_booking(booking_id).await?;

        let allowed = actor.is_admin()
            || booking.user_id == actor.user_id
            || match self.provider_for(actor).await? {
                Some(p) => booking.service_provider_id.as_deref() == Some(p.id.as_str()),
                None => false,
            };
        if !allowed {
            return Err(ApiError::not_found("Booking", booking_id));
        }

        let reason = reason.unwrap_or_else(|| "No reason provided".to_string());
        if !self.db.bookings().cancel(booking_id, Some(&reason)).await? {
            return Err(CoreError::InvalidBookingStatus {
                booking_id: booking.id,
                current_status: booking.status.as_str().to_string(),
            }
            .into());
        }

        let booking = self.require_booking(booking_id).await?;
        info!(booking_id = %booking_id, "Booking canceled");

        if let Some(customer) = self.db.catalog().get_user(&booking.user_id).await? {
            if let Err(e) = self
                .notifier
                .booking_canceled(&booking, &customer, Some(&reason))
                .await
            {
                warn!(booking_id = %booking_id, error = %e, "Cancellation notification failed");
            }
        }

        Ok(booking)
    }

    /// Hides a booking from all listings. Customer or admin only; the
    /// row survives for transaction history.
    pub async fn soft_delete(&self, actor: &Actor, booking_id: &str) -> ApiResult<()> {
        let booking = self.require_booking(booking_id).await?;

        if !actor.is_admin() && booking.user_id != actor.user_id {
            return Err(ApiError::not_found("Booking", booking_id));
        }

        self.db.bookings().soft_delete(booking_id).await?;
        info!(booking_id = %booking_id, "Booking soft-deleted");
        Ok(())
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    async fn require_booking(&self, booking_id: &str) -> ApiResult<Booking> {
        self.db
            .bookings()
            .get_by_id(booking_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Booking", booking_id))
    }

    async fn provider_for(&self, actor: &Actor) -> ApiResult<Option<ServiceProvider>> {
        if actor.role != Role::ServiceProvider {
            return Ok(None);
        }
        Ok(self.db.catalog().provider_by_user(&actor.user_id).await?)
    }

    async fn require_provider(&self, actor: &Actor) -> ApiResult<ServiceProvider> {
        let provider = self
            .provider_for(actor)
            .await?
            .ok_or_else(|| ApiError::forbidden("service provider role required"))?;
        if !provider.is_approved {
            return Err(ApiError::forbidden("provider account is not approved"));
        }
        Ok(provider)
    }
}

/// Mints a uniformly random 4-digit code ("0000" through "9999").
fn generate_otp() -> String {
    format!("{:04}", rand::thread_rng().gen_range(0..10_000))
}

/// Strips the completion OTP from provider-facing responses.
fn scrub_otp(mut booking: Booking) -> Booking {
    booking.verification_otp = None;
    booking
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::notify::{FailingNotifier, MockNotifier};
    use crate::services::cart::CartService;
    use crate::testutil::{seed_address, seed_provider, seed_service, seed_user, test_db};

    struct Fixture {
        db: Database,
        bookings: BookingService,
        notifier: Arc<MockNotifier>,
    }

    async fn fixture() -> Fixture {
        let db = test_db().await;
        let notifier = Arc::new(MockNotifier::default());
        let bookings = BookingService::new(db.clone(), notifier.clone(), None);
        Fixture {
            db,
            bookings,
            notifier,
        }
    }

    /// Seeds a customer with a one-line cart and an address.
    async fn seed_checkout_setup(db: &Database) {
        seed_user(db, "u1", Role::User).await;
        seed_service(db, "s1", "AC Repair", 10_000).await;
        seed_address(db, "addr-1", "u1").await;

        let carts = CartService::new(db.clone());
        carts.add_item(&Actor::user("u1"), "s1", 2).await.unwrap();
    }

    async fn seed_offering_provider(db: &Database) {
        seed_provider(db, "p1", "pu1").await;
        db.catalog().add_provider_service("p1", "s1").await.unwrap();
    }

    fn checkout_request() -> CheckoutRequest {
        CheckoutRequest {
            address_id: "addr-1".to_string(),
            payment_mode: Some(PaymentMode::Cash),
            notes: None,
        }
    }

    async fn checked_out_booking(fx: &Fixture) -> Booking {
        seed_checkout_setup(&fx.db).await;
        fx.bookings
            .checkout(&Actor::user("u1"), checkout_request())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_checkout_consumes_cart() {
        let fx = fixture().await;
        let booking = checked_out_booking(&fx).await;

        assert_eq!(booking.status, BookingStatus::Created);
        assert_eq!(booking.item_total_minor, 20_000);
        assert_eq!(booking.total_amount_minor, 28_750);
        assert_eq!(booking.amount_to_pay_minor, 28_750);
        assert_eq!(booking.items.len(), 1);

        // Cart is gone once the booking exists
        let cart = fx.db.carts().find_by_user("u1").await.unwrap();
        assert!(cart.is_none());
    }

    #[tokio::test]
    async fn test_checkout_without_cart_fails() {
        let fx = fixture().await;
        seed_user(&fx.db, "u1", Role::User).await;
        seed_address(&fx.db, "addr-1", "u1").await;

        let err = fx
            .bookings
            .checkout(&Actor::user("u1"), checkout_request())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_checkout_rejects_foreign_address() {
        let fx = fixture().await;
        seed_checkout_setup(&fx.db).await;
        seed_user(&fx.db, "u2", Role::User).await;
        seed_address(&fx.db, "addr-2", "u2").await;

        let err = fx
            .bookings
            .checkout(
                &Actor::user("u1"),
                CheckoutRequest {
                    address_id: "addr-2".to_string(),
                    payment_mode: None,
                    notes: None,
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_accept_assigns_and_notifies() {
        let fx = fixture().await;
        let booking = checked_out_booking(&fx).await;
        seed_offering_provider(&fx.db).await;

        let accepted = fx
            .bookings
            .accept(&Actor::provider("pu1"), &booking.id)
            .await
            .unwrap();

        assert_eq!(accepted.status, BookingStatus::Accepted);
        assert_eq!(accepted.service_provider_id.as_deref(), Some("p1"));
        // Provider never sees the code
        assert!(accepted.verification_otp.is_none());

        let events = fx.notifier.events();
        assert_eq!(events.len(), 1);
        assert!(events[0].starts_with(&format!("accepted:{}:u1:", booking.id)));
    }

    #[tokio::test]
    async fn test_accept_requires_matching_service() {
        let fx = fixture().await;
        let booking = checked_out_booking(&fx).await;
        // Provider exists but offers nothing on this booking
        seed_provider(&fx.db, "p1", "pu1").await;

        let err = fx
            .bookings
            .accept(&Actor::provider("pu1"), &booking.id)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_accept_survives_notifier_outage() {
        let db = test_db().await;
        let bookings = BookingService::new(db.clone(), Arc::new(FailingNotifier), None);
        let fx = Fixture {
            db,
            bookings,
            notifier: Arc::new(MockNotifier::default()),
        };

        let booking = checked_out_booking(&fx).await;
        seed_offering_provider(&fx.db).await;

        let accepted = fx
            .bookings
            .accept(&Actor::provider("pu1"), &booking.id)
            .await
            .unwrap();
        assert_eq!(accepted.status, BookingStatus::Accepted);
    }

    #[tokio::test]
    async fn test_verify_otp_completes_booking() {
        let fx = fixture().await;
        let booking = checked_out_booking(&fx).await;
        seed_offering_provider(&fx.db).await;

        fx.bookings
            .accept(&Actor::provider("pu1"), &booking.id)
            .await
            .unwrap();

        // The customer received the code through the notification
        let otp = fx.notifier.events()[0].rsplit(':').next().unwrap().to_string();

        let completed = fx
            .bookings
            .verify_otp(&Actor::provider("pu1"), &booking.id, &otp)
            .await
            .unwrap();
        assert_eq!(completed.status, BookingStatus::Completed);
    }

    #[tokio::test]
    async fn test_verify_otp_rejects_wrong_code() {
        let fx = fixture().await;
        let booking = checked_out_booking(&fx).await;
        seed_offering_provider(&fx.db).await;

        fx.bookings
            .accept(&Actor::provider("pu1"), &booking.id)
            .await
            .unwrap();

        let otp = fx.notifier.events()[0].rsplit(':').next().unwrap().to_string();
        let wrong = if otp == "0000" { "0001" } else { "0000" };

        let err = fx
            .bookings
            .verify_otp(&Actor::provider("pu1"), &booking.id, wrong)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        // Still accepted, code still live
        let booking = fx.db.bookings().get_by_id(&booking.id).await.unwrap().unwrap();
        assert_eq!(booking.status, BookingStatus::Accepted);
    }

    #[tokio::test]
    async fn test_verify_otp_rejects_unassigned_provider() {
        let fx = fixture().await;
        let booking = checked_out_booking(&fx).await;
        seed_offering_provider(&fx.db).await;
        seed_provider(&fx.db, "p2", "pu2").await;

        fx.bookings
            .accept(&Actor::provider("pu1"), &booking.id)
            .await
            .unwrap();

        let err = fx
            .bookings
            .verify_otp(&Actor::provider("pu2"), &booking.id, "1234")
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);
    }

    #[tokio::test]
    async fn test_expired_otp_rejected() {
        let db = test_db().await;
        let notifier = Arc::new(MockNotifier::default());
        // Zero-second TTL: any issued code is immediately stale
        let bookings = BookingService::new(db.clone(), notifier.clone(), Some(0));
        let fx = Fixture {
            db,
            bookings,
            notifier,
        };

        let booking = checked_out_booking(&fx).await;
        seed_offering_provider(&fx.db).await;

        fx.bookings
            .accept(&Actor::provider("pu1"), &booking.id)
            .await
            .unwrap();

        tokio::time::sleep(std::time::Duration::from_millis(1100)).await;

        let otp = fx.notifier.events()[0].rsplit(':').next().unwrap().to_string();
        let err = fx
            .bookings
            .verify_otp(&Actor::provider("pu1"), &booking.id, &otp)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert!(err.message.contains("expired"));
    }

    #[tokio::test]
    async fn test_owner_updates_own_booking_status() {
        let fx = fixture().await;
        let booking = checked_out_booking(&fx).await;

        let updated = fx
            .bookings
            .update_status(&Actor::user("u1"), &booking.id, BookingStatus::InProgress)
            .await
            .unwrap();
        assert_eq!(updated.status, BookingStatus::InProgress);
    }

    #[tokio::test]
    async fn test_owner_completes_via_status_update() {
        let fx = fixture().await;
        let booking = checked_out_booking(&fx).await;
        seed_offering_provider(&fx.db).await;

        fx.bookings
            .accept(&Actor::provider("pu1"), &booking.id)
            .await
            .unwrap();

        let completed = fx
            .bookings
            .update_status(&Actor::user("u1"), &booking.id, BookingStatus::Completed)
            .await
            .unwrap();
        assert_eq!(completed.status, BookingStatus::Completed);
        // The direct write discards the pending code
        assert!(completed.verification_otp.is_none());
        assert!(fx
            .notifier
            .events()
            .iter()
            .any(|e| e.starts_with("completed:")));
    }

    #[tokio::test]
    async fn test_status_update_frozen_after_terminal() {
        let fx = fixture().await;
        let booking = checked_out_booking(&fx).await;

        fx.bookings
            .update_status(&Actor::user("u1"), &booking.id, BookingStatus::Canceled)
            .await
            .unwrap();

        let err = fx
            .bookings
            .update_status(&Actor::user("u1"), &booking.id, BookingStatus::InProgress)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Conflict);
    }

    #[tokio::test]
    async fn test_non_owner_cannot_update_status() {
        let fx = fixture().await;
        let booking = checked_out_booking(&fx).await;
        seed_user(&fx.db, "u2", Role::User).await;

        let err = fx
            .bookings
            .update_status(&Actor::user("u2"), &booking.id, BookingStatus::InProgress)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);
    }

    #[tokio::test]
    async fn test_assigned_provider_moves_to_in_progress() {
        let fx = fixture().await;
        let booking = checked_out_booking(&fx).await;
        seed_offering_provider(&fx.db).await;

        fx.bookings
            .accept(&Actor::provider("pu1"), &booking.id)
            .await
            .unwrap();

        let updated = fx
            .bookings
            .update_status(&Actor::provider("pu1"), &booking.id, BookingStatus::InProgress)
            .await
            .unwrap();
        assert_eq!(updated.status, BookingStatus::InProgress);
    }

    #[tokio::test]
    async fn test_cancel_records_reason_and_notifies() {
        let fx = fixture().await;
        let booking = checked_out_booking(&fx).await;

        let canceled = fx
            .bookings
            .cancel(
                &Actor::user("u1"),
                &booking.id,
                Some("changed my mind".to_string()),
            )
            .await
            .unwrap();

        assert_eq!(canceled.status, BookingStatus::Canceled);
        assert_eq!(canceled.cancellation_reason.as_deref(), Some("changed my mind"));
        assert!(fx
            .notifier
            .events()
            .iter()
            .any(|e| e.starts_with("canceled:")));
    }

    #[tokio::test]
    async fn test_cancel_completed_booking_conflicts() {
        let fx = fixture().await;
        let booking = checked_out_booking(&fx).await;
        seed_offering_provider(&fx.db).await;

        fx.bookings
            .accept(&Actor::provider("pu1"), &booking.id)
            .await
            .unwrap();
        let otp = fx.notifier.events()[0].rsplit(':').next().unwrap().to_string();
        fx.bookings
            .verify_otp(&Actor::provider("pu1"), &booking.id, &otp)
            .await
            .unwrap();

        let err = fx
            .bookings
            .cancel(&Actor::user("u1"), &booking.id, None)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Conflict);
    }

    #[tokio::test]
    async fn test_stranger_cannot_see_booking() {
        let fx = fixture().await;
        let booking = checked_out_booking(&fx).await;
        seed_user(&fx.db, "u2", Role::User).await;

        let err = fx
            .bookings
            .get_details(&Actor::user("u2"), &booking.id)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_owner_sees_otp_provider_does_not() {
        let fx = fixture().await;
        let booking = checked_out_booking(&fx).await;
        seed_offering_provider(&fx.db).await;

        fx.bookings
            .accept(&Actor::provider("pu1"), &booking.id)
            .await
            .unwrap();

        let owner_view = fx
            .bookings
            .get_details(&Actor::user("u1"), &booking.id)
            .await
            .unwrap();
        assert!(owner_view.verification_otp.is_some());

        let provider_view = fx
            .bookings
            .get_details(&Actor::provider("pu1"), &booking.id)
            .await
            .unwrap();
        assert!(provider_view.verification_otp.is_none());
    }

    #[tokio::test]
    async fn test_available_listing_respects_offerings() {
        let fx = fixture().await;
        let booking = checked_out_booking(&fx).await;
        seed_offering_provider(&fx.db).await;
        seed_provider(&fx.db, "p2", "pu2").await;

        let for_p1 = fx
            .bookings
            .available_bookings(&Actor::provider("pu1"), Page::default())
            .await
            .unwrap();
        assert_eq!(for_p1.len(), 1);
        assert_eq!(for_p1[0].id, booking.id);

        let for_p2 = fx
            .bookings
            .available_bookings(&Actor::provider("pu2"), Page::default())
            .await
            .unwrap();
        assert!(for_p2.is_empty());
    }

    #[tokio::test]
    async fn test_soft_delete_hides_from_owner() {
        let fx = fixture().await;
        let booking = checked_out_booking(&fx).await;

        fx.bookings
            .soft_delete(&Actor::user("u1"), &booking.id)
            .await
            .unwrap();

        let err = fx
            .bookings
            .get_details(&Actor::user("u1"), &booking.id)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[test]
    fn test_page_clamps_to_bounds() {
        let (limit, offset) = Page {
            limit: Some(10_000),
            offset: Some(-5),
        }
        .clamp();
        assert_eq!(limit, MAX_PAGE_SIZE);
        assert_eq!(offset, 0);

        let (limit, offset) = Page::default().clamp();
        assert_eq!(limit, DEFAULT_PAGE_SIZE);
        assert_eq!(offset, 0);
    }

    #[test]
    fn test_generated_otp_shape() {
        for _ in 0..50 {
            let otp = generate_otp();
            assert_eq!(otp.len(), 4);
            assert!(otp.chars().all(|c| c.is_ascii_digit()));
        }
    }
}
