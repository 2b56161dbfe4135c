//! # Domain Types
//!
//! Core domain types used throughout the Khidmat marketplace backend.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Service      │   │     Booking     │   │   Transaction   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  name           │   │  status         │   │  booking_id     │       │
//! │  │  price_minor    │   │  items (frozen) │   │  amount_minor   │       │
//! │  └─────────────────┘   │  money snapshot │   │  status         │       │
//! │                        └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    TaxRate      │   │  BookingStatus  │   │   PaymentMode   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  bps (u32)      │   │  Created        │   │  Cash           │       │
//! │  │  1500 = 15%     │   │  Accepted ...   │   │  Card ...       │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Snapshot Pattern
//! Cart lines freeze the catalog price at add time; booking lines are
//! copied **by value** from the cart at checkout. A booking never
//! recomputes money after creation - the snapshot is the contract price.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000
/// 1500 bps = 15% (the marketplace default)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Creates a tax rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Creates a tax rate from a percentage (for convenience).
    pub fn from_percentage(pct: f64) -> Self {
        TaxRate((pct * 100.0).round() as u32)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Zero tax rate.
    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }

    /// Checks if tax rate is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::zero()
    }
}

// =============================================================================
// Actors & Roles
// =============================================================================

/// Role carried by an authenticated request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "camelCase"))]
#[serde(rename_all = "camelCase")]
pub enum Role {
    /// A customer booking services.
    User,
    /// An approved provider fulfilling bookings.
    ServiceProvider,
    /// Back-office administrator.
    Admin,
}

/// The authenticated actor performing an operation.
///
/// ## Authorization Model
/// - `Admin` may act on any booking/transaction
/// - `User` may only act on entities where `entity.user_id == actor.user_id`
/// - `ServiceProvider` may only act on bookings assigned to the provider
///   record owned by `actor.user_id`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// The acting user's id (UUID).
    pub user_id: String,
    /// The acting user's role.
    pub role: Role,
}

impl Actor {
    /// Creates a customer actor.
    pub fn user(user_id: impl Into<String>) -> Self {
        Actor {
            user_id: user_id.into(),
            role: Role::User,
        }
    }

    /// Creates a service-provider actor.
    pub fn provider(user_id: impl Into<String>) -> Self {
        Actor {
            user_id: user_id.into(),
            role: Role::ServiceProvider,
        }
    }

    /// Creates an admin actor.
    pub fn admin(user_id: impl Into<String>) -> Self {
        Actor {
            user_id: user_id.into(),
            role: Role::Admin,
        }
    }

    /// Checks whether the actor has the admin role.
    #[inline]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

// =============================================================================
// Service Taxonomy
// =============================================================================

/// Level within the four-tier service taxonomy.
///
/// ## Why a Closed Enum?
/// A closed enum rejects unknown `serviceType` tags at the serde
/// boundary instead of deep inside a handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "camelCase"))]
pub enum ServiceLevel {
    /// Top-level category (e.g., "Home Maintenance").
    #[serde(rename = "mainServices")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "mainServices"))]
    Main,
    /// Second-level category.
    #[serde(rename = "subServices")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "subServices"))]
    Sub,
    /// Third-level category.
    #[serde(rename = "subSubServices")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "subSubServices"))]
    SubSub,
    /// Leaf level: the bookable service carrying a price.
    #[serde(rename = "subSubSubServices")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "subSubSubServices"))]
    Bookable,
}

/// A bookable service (leaf of the taxonomy).
///
/// The taxonomy CRUD itself lives outside the core; the core only needs
/// the id/name/price triple to snapshot prices into carts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Service {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name shown to customers.
    pub name: String,

    /// Optional description.
    pub description: Option<String>,

    /// Price in minor units (smallest currency unit).
    pub price_minor: i64,

    /// Whether service is deleted (soft delete).
    pub is_deleted: bool,

    /// When the service was created.
    pub created_at: DateTime<Utc>,

    /// When the service was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Service {
    /// Returns the price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_minor(self.price_minor)
    }
}

/// An approved service provider.
///
/// Providers are **assigned** to bookings, never owners of them - a
/// booking outlives its provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ServiceProvider {
    pub id: String,
    /// The user account backing this provider.
    pub user_id: String,
    pub business_name: Option<String>,
    /// Set by the admin approval flow.
    pub is_approved: bool,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A user account (minimal projection - profile CRUD is out of scope).
///
/// The core needs the email to address lifecycle notifications.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Cart
// =============================================================================

/// A line item in a cart.
/// Uses the snapshot pattern to freeze service data at add time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct CartItem {
    pub id: String,
    pub cart_id: String,
    /// The bookable service this line references.
    pub service_id: String,
    /// Service name at add time (frozen).
    pub service_name: String,
    /// Unit price in minor units at add time (frozen).
    pub price_minor: i64,
    /// Quantity, always >= 1.
    pub quantity: i64,
    /// Line total (price × quantity).
    pub total_minor: i64,
    pub created_at: DateTime<Utc>,
}

impl CartItem {
    /// Returns the unit price as Money.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_minor(self.price_minor)
    }

    /// Returns the line total as Money.
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_minor(self.total_minor)
    }
}

/// A user's cart. Exactly one per user (UNIQUE on `user_id`).
///
/// ## Invariants
/// - Lines are unique by `service_id` (adding the same service merges
///   quantities, never duplicates the line)
/// - Stored totals are recomputed from the lines before every write -
///   a stale total is never trusted after an item mutation
/// - An empty cart is never persisted: removing the last line deletes
///   the cart row itself
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Cart {
    pub id: String,
    pub user_id: String,
    /// Fixed fee snapshotted from the active tax config at cart creation.
    pub visitation_fee_minor: i64,
    /// Tax rate (bps) snapshotted from the active tax config at creation.
    pub tax_rate_bps: u32,
    pub sub_total_minor: i64,
    pub total_amount_minor: i64,
    pub amount_to_pay_minor: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    /// Cart lines, loaded alongside the row.
    #[cfg_attr(feature = "sqlx", sqlx(skip))]
    #[serde(default)]
    pub items: Vec<CartItem>,
}

impl Cart {
    /// Returns the snapshotted visitation fee as Money.
    #[inline]
    pub fn visitation_fee(&self) -> Money {
        Money::from_minor(self.visitation_fee_minor)
    }

    /// Returns the snapshotted tax rate.
    #[inline]
    pub fn tax_rate(&self) -> TaxRate {
        TaxRate::from_bps(self.tax_rate_bps)
    }

    /// Checks if the cart has no lines.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

// =============================================================================
// Booking Status
// =============================================================================

/// The lifecycle status of a booking.
///
/// ## State Machine
/// ```text
/// created ──────► accepted ──────► completed   (terminal)
///    │               │
/// pending            ├──────────► in_progress
///    │               │                │
///    └───────────────┴────────────────┴──────► canceled    (terminal)
/// ```
/// `pending` is a synonym entry state for bookings not yet pulled by a
/// provider. No transition leaves a terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    /// Freshly checked out, waiting for a provider.
    Created,
    /// Synonym entry state - also waiting for a provider.
    Pending,
    /// A provider has claimed the booking; OTP issued.
    Accepted,
    /// Work underway (reachable via explicit status update).
    InProgress,
    /// Service completion verified by OTP.
    Completed,
    /// Cancelled by the user, the provider, or an admin.
    Canceled,
}

impl BookingStatus {
    /// Checks whether the status is terminal (no further transitions).
    #[inline]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, BookingStatus::Completed | BookingStatus::Canceled)
    }

    /// Checks whether a provider may still claim the booking.
    #[inline]
    pub const fn is_acceptable(&self) -> bool {
        matches!(self, BookingStatus::Created | BookingStatus::Pending)
    }

    /// Database representation (matches the sqlx rename).
    pub const fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Created => "created",
            BookingStatus::Pending => "pending",
            BookingStatus::Accepted => "accepted",
            BookingStatus::InProgress => "in_progress",
            BookingStatus::Completed => "completed",
            BookingStatus::Canceled => "canceled",
        }
    }
}

impl Default for BookingStatus {
    fn default() -> Self {
        BookingStatus::Created
    }
}

// =============================================================================
// Payment Enums
// =============================================================================

/// Payment status tracked on a booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
}

impl Default for PaymentStatus {
    fn default() -> Self {
        PaymentStatus::Pending
    }
}

/// How the customer intends to pay for a booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum PaymentMode {
    CreditCard,
    DebitCard,
    Netbanking,
    Card,
    Cash,
    /// Online payment through the external gateway.
    Online,
    Other,
}

/// Payment instrument recorded on a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    CreditCard,
    DebitCard,
    Netbanking,
    Upi,
    Wallet,
    Emi,
    Card,
    Online,
    Cash,
}

/// The status of a recorded payment transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    /// Recorded locally, not yet confirmed by the gateway.
    Created,
    /// Authorized but not captured.
    Authorized,
    /// Funds captured - booking payment flips to paid.
    Captured,
    /// Refunded to the customer.
    Refunded,
    /// Gateway reported failure.
    Failed,
}

impl Default for TransactionStatus {
    fn default() -> Self {
        TransactionStatus::Created
    }
}

// =============================================================================
// Booking
// =============================================================================

/// A line item in a booking.
/// Copied **by value** from the cart at checkout - the cart can be (and
/// is) deleted afterwards without touching the booking.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct BookingItem {
    pub id: String,
    pub booking_id: String,
    pub service_id: String,
    /// Service name at checkout (frozen).
    pub service_name: String,
    /// Unit price in minor units at checkout (frozen).
    pub price_minor: i64,
    pub quantity: i64,
    /// Line total (price × quantity).
    pub total_minor: i64,
}

impl BookingItem {
    /// Returns the line total as Money.
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_minor(self.total_minor)
    }
}

/// A booking - the unit the state machine operates on.
///
/// ## Monetary Snapshot
/// `item_total`/`visitation_fee`/`tax`/`total_amount`/`amount_to_pay` are
/// frozen at creation. A booking NEVER recomputes totals - the snapshot
/// is the contract price.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Booking {
    pub id: String,
    /// Owning user.
    pub user_id: String,
    /// Assigned provider; NULL until accepted.
    pub service_provider_id: Option<String>,
    pub status: BookingStatus,
    pub payment_mode: Option<PaymentMode>,
    pub item_total_minor: i64,
    pub visitation_fee_minor: i64,
    pub tax_minor: i64,
    pub total_amount_minor: i64,
    pub amount_to_pay_minor: i64,
    pub payment_status: PaymentStatus,
    /// Gateway payment id once a captured transaction is recorded.
    pub gateway_payment_id: Option<String>,
    /// Opaque reference into the address store.
    pub address_id: String,
    pub notes: String,
    /// 4-digit code issued at acceptance, single use, cleared on verify.
    pub verification_otp: Option<String>,
    /// When the OTP was issued (drives the optional expiry window).
    pub otp_issued_at: Option<DateTime<Utc>>,
    pub cancellation_reason: Option<String>,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    /// Frozen line items, loaded alongside the row.
    #[cfg_attr(feature = "sqlx", sqlx(skip))]
    #[serde(default)]
    pub items: Vec<BookingItem>,
}

impl Booking {
    /// Returns the frozen grand total as Money.
    #[inline]
    pub fn total_amount(&self) -> Money {
        Money::from_minor(self.total_amount_minor)
    }

    /// Returns the frozen amount-to-pay as Money.
    #[inline]
    pub fn amount_to_pay(&self) -> Money {
        Money::from_minor(self.amount_to_pay_minor)
    }
}

// =============================================================================
// Transaction
// =============================================================================

/// A recorded payment attempt against a booking.
///
/// Many transactions may exist per booking (retries). Once captured, a
/// transaction is immutable except for status/metadata updates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Transaction {
    pub id: String,
    pub user_id: String,
    pub booking_id: String,
    /// Business identifier: gateway payment id, or a synthetic
    /// `txn_<millis>` fallback. Unique.
    pub transaction_ref: String,
    pub amount_minor: i64,
    pub currency: String,
    pub payment_method: PaymentMethod,
    pub status: TransactionStatus,
    pub gateway_payment_id: Option<String>,
    pub gateway_order_id: Option<String>,
    pub gateway_signature: Option<String>,
    /// Arbitrary gateway metadata, shallow-merged on update.
    pub metadata: serde_json::Value,
    pub is_deleted: bool,
    pub payment_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    /// Returns the amount as Money.
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_minor(self.amount_minor)
    }
}

// =============================================================================
// Tax Configuration
// =============================================================================

/// Fee/tax rate record. At most one active, non-deleted config exists at
/// any time; activating one deactivates all others.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct TaxConfig {
    pub id: String,
    pub visitation_fee_minor: i64,
    pub tax_rate_bps: u32,
    pub is_active: bool,
    pub is_deleted: bool,
    /// Admin user who created the record.
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TaxConfig {
    /// Returns the visitation fee as Money.
    #[inline]
    pub fn visitation_fee(&self) -> Money {
        Money::from_minor(self.visitation_fee_minor)
    }

    /// Returns the tax rate.
    #[inline]
    pub fn tax_rate(&self) -> TaxRate {
        TaxRate::from_bps(self.tax_rate_bps)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tax_rate_from_bps() {
        let rate = TaxRate::from_bps(1500);
        assert_eq!(rate.bps(), 1500);
        assert!((rate.percentage() - 15.0).abs() < 0.001);
    }

    #[test]
    fn test_tax_rate_from_percentage() {
        let rate = TaxRate::from_percentage(15.0);
        assert_eq!(rate.bps(), 1500);
    }

    #[test]
    fn test_booking_status_terminal() {
        assert!(BookingStatus::Completed.is_terminal());
        assert!(BookingStatus::Canceled.is_terminal());
        assert!(!BookingStatus::Created.is_terminal());
        assert!(!BookingStatus::Accepted.is_terminal());
        assert!(!BookingStatus::InProgress.is_terminal());
    }

    #[test]
    fn test_booking_status_acceptable() {
        assert!(BookingStatus::Created.is_acceptable());
        assert!(BookingStatus::Pending.is_acceptable());
        assert!(!BookingStatus::Accepted.is_acceptable());
        assert!(!BookingStatus::Completed.is_acceptable());
    }

    #[test]
    fn test_service_level_serde_tags() {
        let tag: ServiceLevel = serde_json::from_str("\"subSubSubServices\"").unwrap();
        assert_eq!(tag, ServiceLevel::Bookable);

        // Unknown tags are rejected at the boundary
        assert!(serde_json::from_str::<ServiceLevel>("\"superServices\"").is_err());
    }

    #[test]
    fn test_actor_helpers() {
        assert!(Actor::admin("a1").is_admin());
        assert!(!Actor::user("u1").is_admin());
        assert_eq!(Actor::provider("p1").role, Role::ServiceProvider);
    }
}
