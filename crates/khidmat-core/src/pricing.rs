//! # Pricing Engine
//!
//! Pure totals computation for carts and booking snapshots.
//!
//! ## Where This Runs
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Totals Recomputation                               │
//! │                                                                         │
//! │  add_item / update_item / remove_item                                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  compute_totals(items, fee, rate) ← after EVERY cart mutation          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  persisted cart totals (rederived, never trusted stale)                │
//! │                                                                         │
//! │  checkout ──► compute_totals(...) ──► booking monetary snapshot        │
//! │                                       (frozen forever)                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Formula
//! - `sub_total   = Σ price × quantity`
//! - `tax_amount  = (sub_total + visitation_fee) × rate`
//! - `total       = sub_total + visitation_fee + tax_amount`
//! - `amount_to_pay = total` (extension point for discounts; must never
//!   exceed `total` if discounts are introduced)

use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::types::{CartItem, TaxRate};

/// Computed totals for a cart or a booking-to-be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartTotals {
    /// Sum of all line totals.
    pub sub_total: Money,
    /// Tax on (sub_total + visitation_fee).
    pub tax_amount: Money,
    /// sub_total + visitation_fee + tax_amount.
    pub total_amount: Money,
    /// What the customer actually pays. Currently == total_amount.
    pub amount_to_pay: Money,
}

/// Computes totals from line items and the snapshotted fee/rate.
///
/// Pure function: no side effects, deterministic. Quantity >= 1 is
/// enforced at the input boundary, so `sub_total` is never negative for
/// non-negative prices.
///
/// ## Example
/// ```rust
/// use khidmat_core::pricing::compute_totals;
/// use khidmat_core::money::Money;
/// use khidmat_core::types::{CartItem, TaxRate};
/// use chrono::Utc;
///
/// let item = CartItem {
///     id: "i1".into(),
///     cart_id: "c1".into(),
///     service_id: "s1".into(),
///     service_name: "AC Repair".into(),
///     price_minor: 10_000, // Rs 100.00
///     quantity: 2,
///     total_minor: 20_000,
///     created_at: Utc::now(),
/// };
///
/// let totals = compute_totals(&[item], Money::from_major(50), TaxRate::from_bps(1500));
/// assert_eq!(totals.sub_total.minor(), 20_000);   // Rs 200.00
/// assert_eq!(totals.tax_amount.minor(), 3_750);   // (200+50) × 15% = Rs 37.50
/// assert_eq!(totals.total_amount.minor(), 28_750); // Rs 287.50
/// ```
pub fn compute_totals(items: &[CartItem], visitation_fee: Money, rate: TaxRate) -> CartTotals {
    let sub_total = items
        .iter()
        .map(|item| item.price().times(item.quantity))
        .fold(Money::zero(), |acc, line| acc + line);

    let tax_amount = (sub_total + visitation_fee).tax_at(rate);
    let total_amount = sub_total + visitation_fee + tax_amount;

    CartTotals {
        sub_total,
        tax_amount,
        total_amount,
        amount_to_pay: total_amount,
    }
}

/// Recomputes each line's stored total from its price and quantity.
///
/// ## When To Call
/// Before persisting mutated lines, so `total_minor` can never drift
/// from `price × quantity`.
pub fn refresh_line_totals(items: &mut [CartItem]) {
    for item in items {
        item.total_minor = item.price().times(item.quantity).minor();
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn line(service_id: &str, price_minor: i64, quantity: i64) -> CartItem {
        CartItem {
            id: format!("item-{service_id}"),
            cart_id: "cart-1".to_string(),
            service_id: service_id.to_string(),
            service_name: format!("Service {service_id}"),
            price_minor,
            quantity,
            total_minor: price_minor * quantity,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_spec_example() {
        // price Rs 100, qty 2, fee Rs 50, 15% → subtotal 200, tax 37.50, total 287.50
        let totals = compute_totals(
            &[line("s1", 10_000, 2)],
            Money::from_major(50),
            TaxRate::from_bps(1500),
        );

        assert_eq!(totals.sub_total.minor(), 20_000);
        assert_eq!(totals.tax_amount.minor(), 3_750);
        assert_eq!(totals.total_amount.minor(), 28_750);
        assert_eq!(totals.amount_to_pay, totals.total_amount);
    }

    #[test]
    fn test_empty_items() {
        let totals = compute_totals(&[], Money::from_major(50), TaxRate::from_bps(1500));

        // Fee is still taxed even with no lines
        assert_eq!(totals.sub_total, Money::zero());
        assert_eq!(totals.tax_amount.minor(), 750);
        assert_eq!(totals.total_amount.minor(), 5_750);
    }

    #[test]
    fn test_multiple_lines() {
        let totals = compute_totals(
            &[line("s1", 10_000, 2), line("s2", 2_500, 4)],
            Money::zero(),
            TaxRate::zero(),
        );

        assert_eq!(totals.sub_total.minor(), 30_000);
        assert_eq!(totals.tax_amount, Money::zero());
        assert_eq!(totals.total_amount.minor(), 30_000);
    }

    #[test]
    fn test_totals_invariant() {
        // total == sub_total + fee + (sub_total + fee) × rate, always
        let fee = Money::from_major(50);
        let rate = TaxRate::from_bps(1500);
        let items = [line("s1", 999, 3), line("s2", 12_345, 1)];

        let totals = compute_totals(&items, fee, rate);
        let expected_tax = (totals.sub_total + fee).tax_at(rate);
        assert_eq!(totals.tax_amount, expected_tax);
        assert_eq!(totals.total_amount, totals.sub_total + fee + expected_tax);
    }

    #[test]
    fn test_refresh_line_totals() {
        let mut items = [line("s1", 1_000, 2)];
        items[0].quantity = 5;

        refresh_line_totals(&mut items);
        assert_eq!(items[0].total_minor, 5_000);
    }
}
