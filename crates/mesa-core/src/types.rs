//! # Domain Types
//!
//! Core domain types for the restaurant POS.
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business ID where humans need one: `sale_number`, `return_number`
//!   (date-scoped, channel-prefixed, generated inside the write transaction)
//!
//! ## Integer Fields, Typed Accessors
//! Monetary columns are stored as `*_cents: i64` and stock columns as
//! `*_milli: i64`; the typed views ([`Money`], [`StockQty`]) are exposed
//! through accessor methods so rows map 1:1 onto the schema.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::quantity::StockQty;

// =============================================================================
// Cash ledger categories
// =============================================================================

/// Ledger category for sale inflows.
pub const CASH_CATEGORY_SALES: &str = "sales";

/// Ledger category for return outflows.
pub const CASH_CATEGORY_RETURNS: &str = "devoluciones";

// =============================================================================
// Enums
// =============================================================================

/// Where a sale originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum SaleChannel {
    /// In-restaurant service at a table.
    DineIn,
    /// Counter sale, no table.
    Takeout,
    /// Customer-submitted order from the digital menu.
    DigitalMenu,
}

impl SaleChannel {
    /// Channel prefix for the human-readable sale number.
    pub const fn prefix(&self) -> &'static str {
        match self {
            SaleChannel::DineIn => "V",
            SaleChannel::Takeout => "T",
            SaleChannel::DigitalMenu => "M",
        }
    }

    /// Digital-menu orders are customer-submitted; no cash drawer is
    /// involved at submission time.
    pub const fn requires_cash_session(&self) -> bool {
        !matches!(self, SaleChannel::DigitalMenu)
    }
}

/// The status of a sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum SaleStatus {
    /// Awaiting kitchen acknowledgment (digital-menu orders).
    Pending,
    /// Paid and final; inventory and cash ledger reflect it.
    Completed,
    /// Abandoned before completion; reserved inventory credited back.
    Cancelled,
}

/// How the customer paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Efectivo,
    Tarjeta,
    Transferencia,
    Mixto,
}

/// The sellable shape a sale line references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum LineKind {
    /// Recipe-based menu item.
    Menu,
    /// Simple product wrapping one ingredient.
    Simple,
    /// Variant of a simple product.
    SimpleVariant,
    /// Variant of a menu item.
    Variant,
    /// Combo of fixed and choice components.
    Combo,
    /// Free-text line: no catalog reference, no stock effect.
    Free,
}

impl LineKind {
    /// Free-text lines bypass catalog resolution and inventory.
    pub const fn is_free_text(&self) -> bool {
        matches!(self, LineKind::Free)
    }

    /// Whether the referenced sellable is a variant row.
    pub const fn is_variant(&self) -> bool {
        matches!(self, LineKind::Variant | LineKind::SimpleVariant)
    }
}

/// Direction of a cash ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum CashDirection {
    Inflow,
    Outflow,
}

/// Whether a return covers the whole sale or part of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ReturnKind {
    Partial,
    Total,
}

/// The status of a return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ReturnStatus {
    Pending,
    /// Side effects (inventory credit, ledger outflow) applied atomically.
    Completed,
    /// No side effects were applied.
    Cancelled,
}

/// Staff role of the acting user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum StaffRole {
    Cashier,
    Admin,
    Kitchen,
}

impl StaffRole {
    /// Roles that handle a cash drawer must have an open register session.
    pub const fn requires_cash_session(&self) -> bool {
        matches!(self, StaffRole::Cashier | StaffRole::Admin)
    }
}

// =============================================================================
// Ingredient stock
// =============================================================================

/// A raw ingredient with its current stock level.
///
/// Quantity is mutated only through signed [`StockMovement`]s; soft-deleted
/// (never hard-deleted) once referenced by a recipe or movement.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Ingredient {
    pub id: String,
    pub name: String,
    /// Unit of measure ("kg", "l", "pz").
    pub unit: String,
    /// Current stock in milli-units; never negative.
    pub quantity_milli: i64,
    /// Reorder threshold.
    pub min_quantity_milli: i64,
    pub max_quantity_milli: Option<i64>,
    pub unit_cost_cents: i64,
    #[ts(as = "Option<String>")]
    pub expires_at: Option<NaiveDate>,
    /// Soft delete flag; an inactive ingredient behaves as zero stock.
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Ingredient {
    /// Current stock as a typed quantity.
    #[inline]
    pub fn stock(&self) -> StockQty {
        StockQty::from_milli(self.quantity_milli)
    }

    /// Stock as seen by the availability resolver: an inactive ingredient
    /// behaves as if stock were zero.
    #[inline]
    pub fn effective_stock(&self) -> StockQty {
        if self.is_active {
            self.stock()
        } else {
            StockQty::zero()
        }
    }

    /// At or below the reorder threshold.
    #[inline]
    pub fn below_minimum(&self) -> bool {
        self.quantity_milli <= self.min_quantity_milli
    }
}

/// A signed ledger movement against one ingredient.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct StockMovement {
    pub id: String,
    pub ingredient_id: String,
    /// Negative for sale debits, positive for return credits / restocking.
    pub delta_milli: i64,
    /// Why the stock moved ("sale", "return", "restock", "adjustment").
    pub reason: String,
    pub sale_id: Option<String>,
    pub return_id: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// Declared consumption of one ingredient per unit of a sellable.
///
/// Recipe changes affect only future computations; historical sales keep the
/// movements they journaled.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct RecipeLine {
    pub id: String,
    pub ingredient_id: String,
    pub quantity_needed_milli: i64,
    pub unit: String,
}

impl RecipeLine {
    #[inline]
    pub fn quantity_needed(&self) -> StockQty {
        StockQty::from_milli(self.quantity_needed_milli)
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A sale transaction.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Sale {
    pub id: String,
    /// `<channel-prefix><YYYYMMDD><4-digit sequence>`, unique.
    pub sale_number: String,
    pub channel: SaleChannel,
    pub status: SaleStatus,
    pub payment_method: PaymentMethod,
    pub subtotal_cents: i64,
    pub discount_cents: i64,
    pub tax_cents: i64,
    /// Always `subtotal - discount + tax`.
    pub total_cents: i64,
    pub cash_session_id: Option<String>,
    pub table_id: Option<String>,
    pub customer_name: Option<String>,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Sale {
    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }

    #[inline]
    pub fn discount(&self) -> Money {
        Money::from_cents(self.discount_cents)
    }

    #[inline]
    pub fn tax(&self) -> Money {
        Money::from_cents(self.tax_cents)
    }

    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

/// A line item in a sale.
/// Snapshot pattern: name and unit price are frozen at sale time and never
/// recomputed from the catalog.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SaleLine {
    pub id: String,
    pub sale_id: String,
    pub product_id: Option<String>,
    pub variant_id: Option<String>,
    pub kind: LineKind,
    pub name_snapshot: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    /// Always `quantity × unit_price_cents`.
    pub total_price_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl SaleLine {
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    #[inline]
    pub fn total_price(&self) -> Money {
        Money::from_cents(self.total_price_cents)
    }
}

// =============================================================================
// Cash ledger
// =============================================================================

/// An append-only cash ledger entry.
///
/// Every completed sale has exactly one inflow whose amount equals the sale
/// total; every completed return has exactly one outflow equal to the
/// refunded total.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct CashEntry {
    pub id: String,
    pub direction: CashDirection,
    pub category: String,
    /// Strictly positive; direction carries the sign.
    pub amount_cents: i64,
    pub sale_id: Option<String>,
    pub description: String,
    #[ts(as = "String")]
    pub effective_date: NaiveDate,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl CashEntry {
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

// =============================================================================
// Returns
// =============================================================================

/// A full or partial return against one sale.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SaleReturn {
    pub id: String,
    pub sale_id: String,
    /// `D<YYYYMMDD><4-digit sequence>`, unique.
    pub return_number: String,
    pub kind: ReturnKind,
    pub status: ReturnStatus,
    pub reason: String,
    pub refund_method: PaymentMethod,
    pub subtotal_cents: i64,
    /// Discount share this return carried; successive partial returns are
    /// capped so these never sum past the sale's discount.
    pub discount_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
    /// Ingredients credited back (false when restoration was not requested,
    /// e.g. defective or consumed items).
    pub inventory_restored: bool,
    /// Offsetting ledger entry written (or no cash effect existed).
    pub cash_adjusted: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl SaleReturn {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

/// How much of one original sale line a return reverses.
/// Unit price is copied from the sale line, never renegotiated.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct ReturnLine {
    pub id: String,
    pub return_id: String,
    pub sale_line_id: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub total_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Collaborator state (consulted, not owned)
// =============================================================================

/// A cash register session. The core only reads this state.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct CashSession {
    pub id: String,
    pub user_id: String,
    #[ts(as = "String")]
    pub opened_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub closed_at: Option<DateTime<Utc>>,
}

impl CashSession {
    #[inline]
    pub fn is_open(&self) -> bool {
        self.closed_at.is_none()
    }
}

/// A dining table (occupancy owned by the table collaborator; dine-in
/// checkout links the current sale).
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct DiningTable {
    pub id: String,
    pub name: String,
    pub is_occupied: bool,
    pub current_sale_id: Option<String>,
}

/// Order settings snapshot injected into checkout at call time, never looked
/// up mid-transaction from ambient state.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderSettings {
    /// Minimum order total for digital-menu submissions, if any.
    pub minimum_order_cents: Option<i64>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_prefixes_are_distinct() {
        let prefixes = [
            SaleChannel::DineIn.prefix(),
            SaleChannel::Takeout.prefix(),
            SaleChannel::DigitalMenu.prefix(),
        ];
        assert_eq!(prefixes[0], "V");
        assert!(prefixes.iter().all(|p| p.len() == 1));
        assert_ne!(prefixes[0], prefixes[1]);
        assert_ne!(prefixes[1], prefixes[2]);
    }

    #[test]
    fn test_digital_menu_needs_no_cash_session() {
        assert!(SaleChannel::DineIn.requires_cash_session());
        assert!(SaleChannel::Takeout.requires_cash_session());
        assert!(!SaleChannel::DigitalMenu.requires_cash_session());
    }

    #[test]
    fn test_kitchen_role_needs_no_cash_session() {
        assert!(StaffRole::Cashier.requires_cash_session());
        assert!(StaffRole::Admin.requires_cash_session());
        assert!(!StaffRole::Kitchen.requires_cash_session());
    }

    #[test]
    fn test_inactive_ingredient_has_zero_effective_stock() {
        let now = Utc::now();
        let mut ingredient = Ingredient {
            id: "i-1".to_string(),
            name: "Pollo".to_string(),
            unit: "kg".to_string(),
            quantity_milli: 10_000,
            min_quantity_milli: 2_000,
            max_quantity_milli: None,
            unit_cost_cents: 8_000,
            expires_at: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        assert_eq!(ingredient.effective_stock().milli(), 10_000);

        ingredient.is_active = false;
        assert_eq!(ingredient.effective_stock().milli(), 0);
    }

    #[test]
    fn test_serde_wire_names() {
        assert_eq!(
            serde_json::to_string(&PaymentMethod::Efectivo).unwrap(),
            "\"efectivo\""
        );
        assert_eq!(
            serde_json::to_string(&LineKind::SimpleVariant).unwrap(),
            "\"simple_variant\""
        );
        assert_eq!(
            serde_json::to_string(&SaleChannel::DigitalMenu).unwrap(),
            "\"digital_menu\""
        );
    }

    #[test]
    fn test_session_is_open() {
        let session = CashSession {
            id: "s-1".to_string(),
            user_id: "u-1".to_string(),
            opened_at: Utc::now(),
            closed_at: None,
        };
        assert!(session.is_open());

        let closed = CashSession {
            closed_at: Some(Utc::now()),
            ..session
        };
        assert!(!closed.is_open());
    }
}
