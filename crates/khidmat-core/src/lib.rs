//! # khidmat-core: Pure Business Logic for the Khidmat Marketplace
//!
//! This crate is the **heart** of the Khidmat backend. It contains all
//! business logic as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Khidmat Backend Architecture                       │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     khidmat-api (services)                      │   │
//! │  │    Cart Manager ──► Booking State Machine ──► Tx Recorder       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ khidmat-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │  pricing  │  │ validation│  │   │
//! │  │   │  Booking  │  │   Money   │  │  totals   │  │   rules   │  │   │
//! │  │   │   Cart    │  │  TaxRate  │  │   math    │  │  checks   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    khidmat-db (Database Layer)                  │   │
//! │  │              SQLite queries, migrations, repositories           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Booking, Cart, Transaction, etc.)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`pricing`] - Cart/booking totals computation
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are in minor units (i64)
//! 4. **Explicit Errors**: All errors are typed, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use khidmat_core::money::Money;
//! use khidmat_core::types::TaxRate;
//!
//! // Create money from minor units (never from floats!)
//! let price = Money::from_minor(10_000); // Rs 100.00
//!
//! // 15% tax on (subtotal + visitation fee)
//! let rate = TaxRate::from_bps(1500);
//! let tax = price.tax_at(rate);
//! assert_eq!(tax.minor(), 1_500);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod pricing;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use khidmat_core::Money` instead of
// `use khidmat_core::money::Money`

pub use error::{CoreError, ValidationError};
pub use money::Money;
pub use pricing::{compute_totals, CartTotals};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Visitation fee (minor units) used when no tax configuration is active.
///
/// ## Why a default?
/// Checkout must never be blocked because an admin has not configured fees
/// yet. New carts fall back to Rs 50.00 + 15% when no active config exists.
pub const DEFAULT_VISITATION_FEE_MINOR: i64 = 5_000;

/// Tax rate (basis points) used when no tax configuration is active.
pub const DEFAULT_TAX_RATE_BPS: u32 = 1_500;

/// Maximum unique line items allowed in a single cart.
///
/// ## Business Reason
/// Prevents runaway carts and ensures reasonable booking sizes.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of a single service in a cart line.
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10).
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Number of digits in a booking verification OTP.
pub const OTP_LENGTH: usize = 4;
