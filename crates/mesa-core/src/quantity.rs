//! # Quantity Module
//!
//! Fixed-point ingredient quantities with three fractional digits.
//!
//! ## Why Fixed Point?
//! Ingredient stock is continuous (0.2 kg of chicken per taco) while sellable
//! units are discrete. Floats would drift across thousands of debits and
//! credits; a round-trip sale + full return must restore stock *exactly*.
//! Every quantity is an `i64` count of milli-units (thousandths of the
//! ingredient's unit of measure), mirroring how [`crate::money::Money`]
//! handles cents.
//!
//! ## Rounding Rules
//! - Converting continuous stock into a discrete sellable-unit count uses
//!   **floor** (truncation toward zero): 9.9 portions of stock sell 9 units.
//! - Persisting a derived unit value uses **round-half-up**; see
//!   [`StockQty::round_half_up`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};
use ts_rs::TS;

/// Milli-units per whole unit of measure.
pub const MILLI_PER_UNIT: i64 = 1_000;

/// A fixed-point ingredient quantity (thousandths of a unit of measure).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StockQty(i64);

impl StockQty {
    /// Creates a quantity from milli-units.
    ///
    /// ## Example
    /// ```rust
    /// use mesa_core::quantity::StockQty;
    ///
    /// let per_taco = StockQty::from_milli(200); // 0.200 kg
    /// assert_eq!(per_taco.milli(), 200);
    /// ```
    #[inline]
    pub const fn from_milli(milli: i64) -> Self {
        StockQty(milli)
    }

    /// Creates a quantity from whole units.
    #[inline]
    pub const fn from_units(units: i64) -> Self {
        StockQty(units * MILLI_PER_UNIT)
    }

    /// Returns the value in milli-units.
    #[inline]
    pub const fn milli(&self) -> i64 {
        self.0
    }

    /// Zero quantity.
    #[inline]
    pub const fn zero() -> Self {
        StockQty(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Scales the quantity by a unit count (e.g. recipe need × quantity sold).
    ///
    /// Exact: milli-units times an integer never rounds.
    #[inline]
    pub const fn times(&self, count: i64) -> Self {
        StockQty(self.0 * count)
    }

    /// How many discrete sellable units this stock covers at `per_unit`
    /// consumption. Floor division; a degenerate (zero or negative)
    /// `per_unit` yields 0 rather than dividing by it.
    ///
    /// ## Example
    /// ```rust
    /// use mesa_core::quantity::StockQty;
    ///
    /// let stock = StockQty::from_milli(10_000);   // 10.000 kg
    /// let per_unit = StockQty::from_milli(200);   // 0.200 kg per taco
    /// assert_eq!(stock.units_available(per_unit), 50);
    /// ```
    pub const fn units_available(&self, per_unit: StockQty) -> i64 {
        if per_unit.0 <= 0 || self.0 <= 0 {
            return 0;
        }
        self.0 / per_unit.0
    }

    /// Rounds a value expressed as `numer / denom` milli-units half-up.
    /// Used at the boundary where a derived unit value is persisted.
    pub const fn round_half_up(numer: i64, denom: i64) -> StockQty {
        if denom <= 0 {
            return StockQty(0);
        }
        StockQty((numer + denom / 2) / denom)
    }
}

/// Display as a decimal with three fractional digits, e.g. `9.400`.
impl fmt::Display for StockQty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(
            f,
            "{}{}.{:03}",
            sign,
            (self.0 / MILLI_PER_UNIT).abs(),
            (self.0 % MILLI_PER_UNIT).abs()
        )
    }
}

impl Default for StockQty {
    fn default() -> Self {
        StockQty::zero()
    }
}

impl Add for StockQty {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        StockQty(self.0 + other.0)
    }
}

impl AddAssign for StockQty {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for StockQty {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        StockQty(self.0 - other.0)
    }
}

impl SubAssign for StockQty {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Neg for StockQty {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        StockQty(-self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors() {
        assert_eq!(StockQty::from_units(10).milli(), 10_000);
        assert_eq!(StockQty::from_milli(250).milli(), 250);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", StockQty::from_milli(9_400)), "9.400");
        assert_eq!(format!("{}", StockQty::from_milli(200)), "0.200");
        assert_eq!(format!("{}", StockQty::from_milli(-1_500)), "-1.500");
    }

    #[test]
    fn test_units_available_floors() {
        // 9.9 portions of stock can only sell 9 whole units
        let stock = StockQty::from_milli(1_980);
        let per_unit = StockQty::from_milli(200);
        assert_eq!(stock.units_available(per_unit), 9);
    }

    #[test]
    fn test_units_available_degenerate_per_unit() {
        let stock = StockQty::from_units(5);
        assert_eq!(stock.units_available(StockQty::zero()), 0);
        assert_eq!(stock.units_available(StockQty::from_milli(-100)), 0);
    }

    #[test]
    fn test_units_available_empty_stock() {
        assert_eq!(StockQty::zero().units_available(StockQty::from_milli(200)), 0);
    }

    #[test]
    fn test_times_is_exact() {
        // 0.2 kg per taco × 3 tacos = 0.6 kg, exactly
        let per_taco = StockQty::from_milli(200);
        assert_eq!(per_taco.times(3).milli(), 600);
    }

    #[test]
    fn test_round_half_up() {
        assert_eq!(StockQty::round_half_up(5, 2).milli(), 3); // 2.5 → 3
        assert_eq!(StockQty::round_half_up(4, 2).milli(), 2);
        assert_eq!(StockQty::round_half_up(1, 0).milli(), 0);
    }

    #[test]
    fn test_arithmetic() {
        let a = StockQty::from_milli(10_000);
        let b = StockQty::from_milli(600);
        assert_eq!((a - b).milli(), 9_400);
        assert_eq!((a + b).milli(), 10_600);
        assert_eq!((-b).milli(), -600);
    }
}
