//! # Money Module
//!
//! Provides the `Money` type for monetary values in the settlement currency.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  With floats:  12500 × 0.30 = 3749.9999999999995  ❌                    │
//! │                                                                         │
//! │  OUR SOLUTION: Integer francs                                           │
//! │    XAF has no minor unit, so 1 = one franc.                             │
//! │    12500 × 30 / 100 = 3750 exactly, rounding is explicit.               │
//! │                                                                         │
//! │  deposit + remaining == total holds by construction:                    │
//! │    remaining = total - deposit                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use promoweb_core::money::Money;
//!
//! let unit_price = Money::from_xaf(1_000);
//! let line_total = unit_price * 2i64;
//! let shipping = Money::from_xaf(2_500);
//!
//! assert_eq!((line_total + shipping).xaf(), 4_500);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in whole CFA francs (XAF).
///
/// ## Design Decisions
/// - **i64 (signed)**: refunds are stored as negative payments
/// - **Single field tuple struct**: zero-cost abstraction over i64
/// - **Derives**: full serde support, serialized as a plain number
///
/// ## Where Money Flows
/// ```text
/// Product.price_xaf ──► OrderItem.unit_price ──► OrderItem.line_total
///                                                      │
///                       Order.subtotal ◄───────────────┘
///                             │
///              + shipping ────┤
///                             ▼
///                       Order.total ──► deposit (30%) + remaining
///                                            │             │
///                                            ▼             ▼
///                                      Payment(deposit) Payment(balance)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from whole francs.
    ///
    /// ## Example
    /// ```rust
    /// use promoweb_core::money::Money;
    ///
    /// let price = Money::from_xaf(10_000);
    /// assert_eq!(price.xaf(), 10_000);
    /// ```
    #[inline]
    pub const fn from_xaf(xaf: i64) -> Self {
        Money(xaf)
    }

    /// Returns the value in whole francs.
    #[inline]
    pub const fn xaf(&self) -> i64 {
        self.0
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

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns the absolute value.
    ///
    /// ## Example
    /// ```rust
    /// use promoweb_core::money::Money;
    ///
    /// let refund = Money::from_xaf(-1_500);
    /// assert_eq!(refund.abs().xaf(), 1_500);
    /// ```
    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Multiplies money by a quantity, saturating at the `i64` range.
    ///
    /// ## Example
    /// ```rust
    /// use promoweb_core::money::Money;
    ///
    /// let unit_price = Money::from_xaf(1_000);
    /// assert_eq!(unit_price.multiply_quantity(3).xaf(), 3_000);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0.saturating_mul(qty))
    }

    /// Returns `percent`% of this amount, rounded half away from zero to the franc.
    ///
    /// ## Implementation
    /// Integer math in i128: `(amount * percent ± 50) / 100`.
    ///
    /// ## Example
    /// ```rust
    /// use promoweb_core::money::Money;
    ///
    /// // 30% of 12 500 = 3 750
    /// assert_eq!(Money::from_xaf(12_500).percentage(30).xaf(), 3_750);
    ///
    /// // 30% of 1 001 = 300.3 → 300
    /// assert_eq!(Money::from_xaf(1_001).percentage(30).xaf(), 300);
    ///
    /// // 30% of 1 005 = 301.5 → 302
    /// assert_eq!(Money::from_xaf(1_005).percentage(30).xaf(), 302);
    /// ```
    pub fn percentage(&self, percent: i64) -> Money {
        let scaled = self.0 as i128 * percent as i128;
        let rounded = if scaled >= 0 {
            (scaled + 50) / 100
        } else {
            (scaled - 50) / 100
        };
        Money::from_xaf(rounded as i64)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Debug-friendly display: `12500 XAF`.
///
/// Thousands separators and locale are left to the storefront.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.0, crate::SETTLEMENT_CURRENCY)
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(-self.0)
    }
}

/// Multiplication by i64 (for quantity calculations).
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0.saturating_mul(qty))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + *m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_xaf(12_500)), "12500 XAF");
        assert_eq!(format!("{}", Money::from_xaf(-1_000)), "-1000 XAF");
        assert_eq!(format!("{}", Money::zero()), "0 XAF");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_xaf(1_000);
        let b = Money::from_xaf(500);

        assert_eq!((a + b).xaf(), 1_500);
        assert_eq!((a - b).xaf(), 500);
        assert_eq!((a * 3).xaf(), 3_000);
        assert_eq!((-a).xaf(), -1_000);
    }

    #[test]
    fn test_multiply_quantity_saturates() {
        assert_eq!(Money::from_xaf(1_000_000_000).multiply_quantity(999).xaf(), 999_000_000_000);
        assert_eq!(Money::from_xaf(i64::MAX / 2 + 1).multiply_quantity(2).xaf(), i64::MAX);
    }

    #[test]
    fn test_percentage_rounds_half_away_from_zero() {
        assert_eq!(Money::from_xaf(12_500).percentage(30).xaf(), 3_750);
        assert_eq!(Money::from_xaf(1_005).percentage(30).xaf(), 302);
        assert_eq!(Money::from_xaf(1_001).percentage(30).xaf(), 300);
        assert_eq!(Money::from_xaf(-1_005).percentage(30).xaf(), -302);
        assert_eq!(Money::from_xaf(7_777).percentage(100).xaf(), 7_777);
        assert_eq!(Money::from_xaf(7_777).percentage(0).xaf(), 0);
    }

    /// The deposit split never loses a franc: remaining is derived by subtraction.
    #[test]
    fn test_split_is_lossless() {
        for total in [1, 99, 1_005, 12_500, 33_333, 999_999] {
            let total = Money::from_xaf(total);
            for pct in [1, 10, 30, 33, 50, 99, 100] {
                let deposit = total.percentage(pct);
                let remaining = total - deposit;
                assert_eq!(deposit + remaining, total);
                assert!(!remaining.is_negative());
            }
        }
    }

    #[test]
    fn test_sum() {
        let amounts = vec![Money::from_xaf(100), Money::from_xaf(250), Money::from_xaf(-50)];
        let total: Money = amounts.iter().sum();
        assert_eq!(total.xaf(), 300);
    }

    #[test]
    fn test_zero_and_checks() {
        let zero = Money::zero();
        assert!(zero.is_zero());
        assert!(!zero.is_positive());
        assert!(!zero.is_negative());

        let negative = Money::from_xaf(-100);
        assert!(negative.is_negative());
        assert_eq!(negative.abs().xaf(), 100);
    }
}
