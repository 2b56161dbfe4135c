//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In JavaScript/floating point:                                          │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  The original marketplace stored rupee amounts as doubles and           │
//! │  recomputed totals with float math on every save.                       │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Minor Units                                      │
//! │    Rs 287.50 = 28750 minor units                                        │
//! │    Tax math is integer-only with explicit half-up rounding              │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use khidmat_core::money::Money;
//!
//! // Create from minor units (preferred)
//! let price = Money::from_minor(10_000); // Rs 100.00
//!
//! // Arithmetic operations
//! let doubled = price * 2;                          // Rs 200.00
//! let total = price + Money::from_minor(5_000);     // Rs 150.00
//!
//! // NEVER do this:
//! // let bad = Money::from_float(100.0); // NO SUCH METHOD EXISTS!
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

use crate::types::TaxRate;

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in the smallest currency unit.
///
/// ## Design Decisions
/// - **i64 (signed)**: Allows negative values for refunds and adjustments
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **Derives**: Full serde support for JSON serialization
///
/// ## Where Money Flows
/// ```text
/// Service.price ──► CartItem.price ──► CartItem.total
///                        │
///                        ▼
/// Cart.sub_total ──► Tax Calculation ──► Cart.total_amount
///                        │
///                        ▼
/// Booking monetary snapshot (frozen) ──► Transaction.amount
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from minor units (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use khidmat_core::money::Money;
    ///
    /// let price = Money::from_minor(28_750); // Rs 287.50
    /// assert_eq!(price.minor(), 28_750);
    /// ```
    #[inline]
    pub const fn from_minor(minor: i64) -> Self {
        Money(minor)
    }

    /// Creates a Money value from whole major units (rupees).
    ///
    /// ## Example
    /// ```rust
    /// use khidmat_core::money::Money;
    ///
    /// let fee = Money::from_major(50); // Rs 50.00
    /// assert_eq!(fee.minor(), 5_000);
    /// ```
    #[inline]
    pub const fn from_major(major: i64) -> Self {
        Money(major * 100)
    }

    /// Returns the value in minor units.
    #[inline]
    pub const fn minor(&self) -> i64 {
        self.0
    }

    /// Returns the major unit (rupees) portion.
    #[inline]
    pub const fn major_part(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn minor_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Calculates tax at the given rate with half-up rounding.
    ///
    /// ## Implementation
    /// Integer math: `(amount * bps + 5000) / 10000`.
    /// The +5000 provides rounding (5000/10000 = 0.5). i128 intermediate
    /// prevents overflow on large amounts.
    ///
    /// ## Example
    /// ```rust
    /// use khidmat_core::money::Money;
    /// use khidmat_core::types::TaxRate;
    ///
    /// // (subtotal + visitation fee) = Rs 250.00, rate 15%
    /// let base = Money::from_minor(25_000);
    /// let tax = base.tax_at(TaxRate::from_bps(1500));
    /// assert_eq!(tax.minor(), 3_750); // Rs 37.50
    /// ```
    pub fn tax_at(&self, rate: TaxRate) -> Money {
        let tax_minor = (self.0 as i128 * rate.bps() as i128 + 5000) / 10000;
        Money::from_minor(tax_minor as i64)
    }

    /// Multiplies money by a quantity.
    ///
    /// ## Example
    /// ```rust
    /// use khidmat_core::money::Money;
    ///
    /// let unit_price = Money::from_minor(10_000); // Rs 100.00
    /// let line_total = unit_price.times(2);
    /// assert_eq!(line_total.minor(), 20_000);     // Rs 200.00
    /// ```
    #[inline]
    pub const fn times(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display implementation shows money in a human-readable format.
///
/// ## Note
/// This is for debugging and log lines. Client formatting handles
/// localization.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(
            f,
            "{}Rs {}.{:02}",
            sign,
            self.major_part().abs(),
            self.minor_part()
        )
    }
}

/// Default money is zero.
impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

/// Addition of two Money values.
impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

/// Addition assignment (+=).
impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

/// Subtraction of two Money values.
impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

/// Subtraction assignment (-=).
impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

/// Multiplication by integer (for quantity calculations).
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_minor() {
        let money = Money::from_minor(28_750);
        assert_eq!(money.minor(), 28_750);
        assert_eq!(money.major_part(), 287);
        assert_eq!(money.minor_part(), 50);
    }

    #[test]
    fn test_from_major() {
        assert_eq!(Money::from_major(50).minor(), 5_000);
        assert_eq!(Money::from_major(-5).minor(), -500);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_minor(28_750)), "Rs 287.50");
        assert_eq!(format!("{}", Money::from_minor(5_000)), "Rs 50.00");
        assert_eq!(format!("{}", Money::from_minor(-550)), "-Rs 5.50");
        assert_eq!(format!("{}", Money::from_minor(0)), "Rs 0.00");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_minor(1000);
        let b = Money::from_minor(500);

        assert_eq!((a + b).minor(), 1500);
        assert_eq!((a - b).minor(), 500);
        assert_eq!((a * 3).minor(), 3000);
    }

    #[test]
    fn test_tax_basic() {
        // Rs 250.00 at 15% = Rs 37.50
        let base = Money::from_minor(25_000);
        let tax = base.tax_at(TaxRate::from_bps(1500));
        assert_eq!(tax.minor(), 3_750);
    }

    #[test]
    fn test_tax_with_rounding() {
        // Rs 10.00 at 8.25% = 82.5 → 83 (half-up)
        let base = Money::from_minor(1000);
        let tax = base.tax_at(TaxRate::from_bps(825));
        assert_eq!(tax.minor(), 83);
    }

    #[test]
    fn test_times() {
        let unit_price = Money::from_minor(299);
        assert_eq!(unit_price.times(3).minor(), 897);
    }

    #[test]
    fn test_zero_and_checks() {
        let zero = Money::zero();
        assert!(zero.is_zero());
        assert!(!zero.is_negative());

        assert!(Money::from_minor(-100).is_negative());
    }
}
