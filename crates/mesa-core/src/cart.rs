//! # Cart Module
//!
//! Pure ticket arithmetic: lines in, totals out.
//!
//! ## Price Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Cart Totals                                                            │
//! │                                                                         │
//! │  Lines:  Tacos        3 × $18.00  =  $54.00                            │
//! │          Quesadillas  2 × $15.00  =  $30.00                            │
//! │          ...                                                            │
//! │                                      ────────                           │
//! │  subtotal  = Σ (unit_price × qty)    $200.00                           │
//! │  discount  = whole-ticket amount    − $20.00                           │
//! │  tax       = whole-ticket amount    + $16.00                           │
//! │                                      ────────                           │
//! │  total     = subtotal − discount + tax   $196.00                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Discount and tax are caller-supplied cent amounts, never rates: the
//! calculator adds and subtracts exactly, so totals are reproducible from the
//! persisted lines alone. A negative final total rejects the whole ticket.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::LineKind;
use crate::validation::{
    validate_line_count, validate_quantity, validate_unit_price_cents,
};

/// One line of an in-progress ticket.
///
/// `unit_price` is the price captured at add-to-cart time; later catalog
/// edits must not reprice a ticket already on the floor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartLine {
    pub sellable_id: Option<String>,
    pub variant_id: Option<String>,
    pub description: String,
    pub kind: LineKind,
    pub unit_price: Money,
    pub quantity: i64,
}

impl CartLine {
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply_quantity(self.quantity)
    }
}

/// Computed ticket totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartTotals {
    pub subtotal: Money,
    pub discount: Money,
    pub tax: Money,
    pub total: Money,
}

/// Computes ticket totals from lines plus whole-ticket discount and tax.
///
/// ## Errors
/// - [`CoreError::EmptySale`] if there are no lines
/// - [`CoreError::TooManyLines`] / quantity / price validation failures
/// - [`CoreError::NegativeTotal`] if discount exceeds subtotal + tax
pub fn compute_totals(lines: &[CartLine], discount: Money, tax: Money) -> CoreResult<CartTotals> {
    if lines.is_empty() {
        return Err(CoreError::EmptySale);
    }
    validate_line_count(lines.len())?;

    for line in lines {
        validate_quantity(line.quantity)?;
        validate_unit_price_cents(line.unit_price.cents())?;
    }
    if discount.is_negative() {
        return Err(CoreError::Validation(
            crate::error::ValidationError::MustBePositive {
                field: "discount".to_string(),
            },
        ));
    }
    if tax.is_negative() {
        return Err(CoreError::Validation(
            crate::error::ValidationError::MustBePositive {
                field: "tax".to_string(),
            },
        ));
    }

    let subtotal: Money = lines.iter().map(CartLine::line_total).sum();
    let total = subtotal - discount + tax;

    if total.is_negative() {
        return Err(CoreError::NegativeTotal {
            total_cents: total.cents(),
        });
    }

    Ok(CartTotals {
        subtotal,
        discount,
        tax,
        total,
    })
}

/// Checks a computed total against an optional order minimum.
///
/// Digital-menu orders carry a configured floor; counter sales pass `None`.
pub fn enforce_minimum_order(totals: &CartTotals, minimum: Option<Money>) -> CoreResult<()> {
    if let Some(minimum) = minimum {
        if totals.total < minimum {
            return Err(CoreError::BelowMinimumOrder {
                total_cents: totals.total.cents(),
                minimum_cents: minimum.cents(),
            });
        }
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn line(description: &str, price_cents: i64, quantity: i64) -> CartLine {
        CartLine {
            sellable_id: Some(format!("id-{description}")),
            variant_id: None,
            description: description.to_string(),
            kind: LineKind::Menu,
            unit_price: Money::from_cents(price_cents),
            quantity,
        }
    }

    #[test]
    fn test_totals_subtotal_minus_discount_plus_tax() {
        // $200.00 ticket, $20.00 off, $16.00 tax → $196.00
        let lines = vec![line("tacos", 5000, 2), line("combo", 10000, 1)];
        let totals = compute_totals(
            &lines,
            Money::from_cents(2000),
            Money::from_cents(1600),
        )
        .unwrap();

        assert_eq!(totals.subtotal.cents(), 20_000);
        assert_eq!(totals.total.cents(), 19_600);
    }

    #[test]
    fn test_totals_no_adjustments() {
        let lines = vec![line("tacos", 1800, 3)];
        let totals = compute_totals(&lines, Money::zero(), Money::zero()).unwrap();
        assert_eq!(totals.subtotal.cents(), 5400);
        assert_eq!(totals.total.cents(), 5400);
    }

    #[test]
    fn test_empty_cart_rejected() {
        let err = compute_totals(&[], Money::zero(), Money::zero()).unwrap_err();
        assert!(matches!(err, CoreError::EmptySale));
    }

    #[test]
    fn test_negative_total_rejected() {
        let lines = vec![line("cafe", 800, 1)];
        let err =
            compute_totals(&lines, Money::from_cents(1000), Money::zero()).unwrap_err();
        assert!(matches!(err, CoreError::NegativeTotal { total_cents: -200 }));
    }

    #[test]
    fn test_discount_equal_to_subtotal_is_free() {
        let lines = vec![line("cafe", 800, 1)];
        let totals =
            compute_totals(&lines, Money::from_cents(800), Money::zero()).unwrap();
        assert_eq!(totals.total.cents(), 0);
    }

    #[test]
    fn test_invalid_quantity_rejected() {
        let lines = vec![line("tacos", 1800, 0)];
        assert!(compute_totals(&lines, Money::zero(), Money::zero()).is_err());

        let lines = vec![line("tacos", 1800, 1000)];
        assert!(compute_totals(&lines, Money::zero(), Money::zero()).is_err());
    }

    #[test]
    fn test_negative_unit_price_rejected() {
        let lines = vec![line("tacos", -100, 1)];
        assert!(compute_totals(&lines, Money::zero(), Money::zero()).is_err());
    }

    #[test]
    fn test_zero_price_courtesy_line_allowed() {
        let lines = vec![line("cortesia", 0, 1)];
        let totals = compute_totals(&lines, Money::zero(), Money::zero()).unwrap();
        assert_eq!(totals.total.cents(), 0);
    }

    #[test]
    fn test_minimum_order() {
        let lines = vec![line("tacos", 1800, 1)];
        let totals = compute_totals(&lines, Money::zero(), Money::zero()).unwrap();

        assert!(enforce_minimum_order(&totals, None).is_ok());
        assert!(enforce_minimum_order(&totals, Some(Money::from_cents(1500))).is_ok());
        let err =
            enforce_minimum_order(&totals, Some(Money::from_cents(2500))).unwrap_err();
        assert!(matches!(err, CoreError::BelowMinimumOrder { .. }));
    }
}
