//! # Money Module
//!
//! Monetary values as integer cents.
//!
//! ## Why Integer Money?
//! Floating point cannot represent retail amounts exactly (`0.1 + 0.2 !=
//! 0.3`), and a POS that loses a centavo per ticket loses real money over a
//! day of service. Every price, discount, tax, total, and refund in Mesa POS
//! is an `i64` number of cents; only the UI converts to a display currency.
//!
//! ## Usage
//! ```rust
//! use mesa_core::money::Money;
//!
//! let price = Money::from_cents(2500); // $25.00
//! let line = price * 3;                // $75.00
//! assert_eq!(line.cents(), 7500);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

/// A monetary value in the smallest currency unit (cents).
///
/// ## Design Decisions
/// - **i64 (signed)**: refunds and corrections need negative intermediates
/// - **Single-field tuple struct**: zero-cost abstraction over i64
/// - **Derives**: full serde support for JSON serialization
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Zero money value.
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
    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Multiplies money by a quantity.
    ///
    /// ## Example
    /// ```rust
    /// use mesa_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(1800); // one order of tacos
    /// assert_eq!(unit_price.multiply_quantity(3).cents(), 5400);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Clamps a negative value to zero.
    ///
    /// Combo price adjustments may push a price below zero; the floor is
    /// always $0.00, never a payout.
    #[inline]
    pub const fn max_zero(&self) -> Self {
        if self.0 < 0 {
            Money(0)
        } else {
            *self
        }
    }

    /// Returns this amount's proportional share `self × part / whole`,
    /// rounded half-up at the cent boundary.
    ///
    /// ## Where This Is Used
    /// A partial return refunds a fraction of the original sale. The sale's
    /// discount and tax were charged once on the whole ticket, so the refund
    /// carries `part / whole` of each — never a recomputation from rates.
    ///
    /// ## Example
    /// ```rust
    /// use mesa_core::money::Money;
    ///
    /// let tax = Money::from_cents(1600);          // charged on the sale
    /// let part = Money::from_cents(5000);         // subtotal being returned
    /// let whole = Money::from_cents(20000);       // original subtotal
    /// assert_eq!(tax.proportional_share(part, whole).cents(), 400);
    /// ```
    ///
    /// A zero or non-positive `whole` yields zero (nothing to apportion).
    pub fn proportional_share(&self, part: Money, whole: Money) -> Money {
        if whole.0 <= 0 || part.0 <= 0 {
            return Money::zero();
        }
        // i128 intermediate prevents overflow; +whole/2 rounds half-up.
        let numer = self.0 as i128 * part.0 as i128;
        let denom = whole.0 as i128;
        Money::from_cents(((numer + denom / 2) / denom) as i64)
    }
}

/// Display implementation for debugging and log output.
/// UI display formatting (locale, currency symbol) happens in the frontend.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}${}.{:02}", sign, (self.0 / 100).abs(), (self.0 % 100).abs())
    }
}

/// Default money is zero.
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

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::zero(), Add::add)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(1099);
        assert_eq!(money.cents(), 1099);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_cents(1099)), "$10.99");
        assert_eq!(format!("{}", Money::from_cents(500)), "$5.00");
        assert_eq!(format!("{}", Money::from_cents(-550)), "-$5.50");
        assert_eq!(format!("{}", Money::from_cents(0)), "$0.00");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!((a * 3).cents(), 3000);
        assert_eq!(a.multiply_quantity(4).cents(), 4000);
    }

    #[test]
    fn test_max_zero() {
        assert_eq!(Money::from_cents(-250).max_zero().cents(), 0);
        assert_eq!(Money::from_cents(250).max_zero().cents(), 250);
    }

    #[test]
    fn test_proportional_share_exact() {
        // Whole-ticket share returns the full amount.
        let tax = Money::from_cents(1600);
        let whole = Money::from_cents(20000);
        assert_eq!(tax.proportional_share(whole, whole).cents(), 1600);
    }

    #[test]
    fn test_proportional_share_rounds_half_up() {
        // 100 × 1/3 = 33.33.. → 33; 100 × 1/2 of 3 = 50 exactly
        let amount = Money::from_cents(100);
        assert_eq!(
            amount
                .proportional_share(Money::from_cents(1), Money::from_cents(3))
                .cents(),
            33
        );
        // 5 × 1/2 = 2.5 → rounds up to 3
        assert_eq!(
            Money::from_cents(5)
                .proportional_share(Money::from_cents(1), Money::from_cents(2))
                .cents(),
            3
        );
    }

    #[test]
    fn test_proportional_share_degenerate_whole() {
        let amount = Money::from_cents(100);
        assert_eq!(
            amount
                .proportional_share(Money::from_cents(50), Money::zero())
                .cents(),
            0
        );
    }

    #[test]
    fn test_sum() {
        let total: Money = [100, 250, 50].iter().map(|c| Money::from_cents(*c)).sum();
        assert_eq!(total.cents(), 400);
    }
}
