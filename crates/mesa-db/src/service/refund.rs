//! # Refund Service
//!
//! Full and partial returns against completed sales: one SQLite transaction
//! covering the return row, its lines, the inventory credits, and the
//! offsetting cash ledger outflow.
//!
//! ## The Return Cap
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  sale line: Tacos × 3                                                   │
//! │                                                                         │
//! │  return #1: 2 tacos   → cumulative 2 of 3   ✓                          │
//! │  return #2: 1 taco    → cumulative 3 of 3   ✓                          │
//! │  return #3: 1 taco    → cumulative 4 of 3   ✗ OverReturn               │
//! │                                                                         │
//! │  The cap is cumulative across all completed returns of the sale,       │
//! │  read inside the same write transaction that inserts the new one.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Refund Arithmetic
//! Unit prices come from the sale lines, never the current catalog. Discount
//! and tax were charged once on the whole ticket, so a partial return carries
//! its proportional share of each, rounded half-up at the cent and clamped to
//! what remains of the charged amount across the sale's earlier returns. A
//! total return of a previously untouched sale refunds the persisted totals
//! exactly, so sale + full return always nets to zero.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use crate::repository::ingredient::{IngredientRepository, MOVEMENT_REASON_RETURN};
use crate::repository::{CashRepository, CatalogRepository, ReturnRepository, SaleRepository};
use crate::service::{TransactionError, TxResult};
use mesa_core::availability::{accumulate_consumption, ConsumptionMap};
use mesa_core::session::ensure_session_for_refund;
use mesa_core::validation::validate_quantity;
use mesa_core::{
    CashDirection, CashSession, CoreError, Money, PaymentMethod, ReturnKind, ReturnLine,
    ReturnStatus, SaleLine, SaleReturn, SaleStatus, CASH_CATEGORY_RETURNS,
};

/// One requested return line, referencing an original sale line.
#[derive(Debug, Clone)]
pub struct ReturnLineRequest {
    pub sale_line_id: String,
    pub quantity: i64,
}

/// A complete return request.
#[derive(Debug, Clone)]
pub struct ReturnRequest {
    pub sale_id: String,
    pub reason: String,
    pub refund_method: PaymentMethod,
    pub lines: Vec<ReturnLineRequest>,
    /// Credit ingredients back to stock. False for defective or consumed
    /// items that cannot be resold.
    pub restore_inventory: bool,
    pub session: Option<CashSession>,
}

/// Service executing returns as single transactions.
#[derive(Debug, Clone)]
pub struct RefundService {
    pool: SqlitePool,
    catalog: CatalogRepository,
    sales: SaleRepository,
}

impl RefundService {
    pub fn new(pool: SqlitePool) -> Self {
        RefundService {
            catalog: CatalogRepository::new(pool.clone()),
            sales: SaleRepository::new(pool.clone()),
            pool,
        }
    }

    /// Executes a return against a completed sale.
    pub async fn refund(&self, request: ReturnRequest) -> TxResult<SaleReturn> {
        ensure_session_for_refund(request.session.as_ref()).map_err(TransactionError::Validation)?;

        if request.lines.is_empty() {
            return Err(TransactionError::Validation(CoreError::EmptySale));
        }
        for line in &request.lines {
            validate_quantity(line.quantity).map_err(|e| TransactionError::Validation(e.into()))?;
        }

        // Merge duplicate request lines so the cap checks the combined
        // quantity, then verify each against what remains returnable.
        let mut merged: Vec<(String, i64)> = Vec::new();
        for line_request in &request.lines {
            match merged.iter_mut().find(|(id, _)| id == &line_request.sale_line_id) {
                Some((_, qty)) => *qty += line_request.quantity,
                None => merged.push((line_request.sale_line_id.clone(), line_request.quantity)),
            }
        }

        // Inventory restoration recomputes from the *current* recipes. The
        // catalog reads happen before the write transaction opens so they
        // never contend with it for pool connections; sale lines are
        // immutable once written. Free-text lines and deleted catalog rows
        // simply restore nothing.
        let mut restoration = ConsumptionMap::new();
        if request.restore_inventory {
            let lines = self.sales.get_lines(&request.sale_id).await?;
            for (sale_line_id, quantity) in &merged {
                let Some(sale_line) = lines.iter().find(|l| &l.id == sale_line_id) else {
                    continue; // unknown ids are rejected by the cap check below
                };
                let sellable = if let Some(product_id) = &sale_line.product_id {
                    self.catalog.load_sellable(product_id).await?
                } else if let Some(variant_id) = &sale_line.variant_id {
                    self.catalog.load_variant_sellable(variant_id).await?
                } else {
                    None
                };
                if let Some(sellable) = sellable {
                    accumulate_consumption(&sellable, *quantity, &mut restoration);
                }
            }
        }

        let mut tx = self.pool.begin().await.map_err(crate::error::DbError::from)?;

        let sale = SaleRepository::get_by_id_tx(tx.as_mut(), &request.sale_id)
            .await?
            .ok_or_else(|| {
                TransactionError::Validation(CoreError::SaleNotFound(request.sale_id.clone()))
            })?;
        if sale.status != SaleStatus::Completed {
            return Err(TransactionError::Validation(CoreError::InvalidSaleStatus {
                sale_id: sale.id.clone(),
                current_status: format!("{:?}", sale.status).to_lowercase(),
            }));
        }

        let sale_lines = SaleRepository::get_lines_tx(tx.as_mut(), &sale.id).await?;
        let already_returned =
            ReturnRepository::returned_quantities_tx(tx.as_mut(), &sale.id).await?;
        let (prior_discount, prior_tax) =
            ReturnRepository::refunded_shares_tx(tx.as_mut(), &sale.id).await?;

        let nothing_returned_before = already_returned.is_empty();
        let mut return_lines: Vec<(SaleLine, i64)> = Vec::with_capacity(merged.len());
        let mut returned_subtotal = Money::zero();
        for (sale_line_id, quantity) in &merged {
            let sale_line = sale_lines
                .iter()
                .find(|l| &l.id == sale_line_id)
                .ok_or_else(|| {
                    TransactionError::Validation(CoreError::SellableNotFound(sale_line_id.clone()))
                })?;

            let prior = already_returned.get(&sale_line.id).copied().unwrap_or(0);
            let returnable = sale_line.quantity - prior;
            if *quantity > returnable {
                return Err(TransactionError::Validation(CoreError::OverReturn {
                    name: sale_line.name_snapshot.clone(),
                    sold: sale_line.quantity,
                    returnable,
                    requested: *quantity,
                }));
            }

            returned_subtotal += sale_line.unit_price().multiply_quantity(*quantity);
            return_lines.push((sale_line.clone(), *quantity));
        }

        // A return is Total when nothing was returned before and this one
        // clears every line completely.
        let is_total = nothing_returned_before
            && sale_lines.iter().all(|sale_line| {
                return_lines
                    .iter()
                    .find(|(l, _)| l.id == sale_line.id)
                    .map(|(_, qty)| *qty == sale_line.quantity)
                    .unwrap_or(false)
            });

        let (subtotal, discount, tax, total) = if is_total {
            // Exact round trip: refund the persisted totals, no re-rounding.
            (
                sale.subtotal() - sale.discount(),
                sale.discount(),
                sale.tax(),
                sale.total(),
            )
        } else {
            // Rounded shares are clamped to what remains of the charged
            // amounts, so successive partial returns can never refund more
            // discount or tax than the sale carried.
            let discount_share = sale
                .discount()
                .proportional_share(returned_subtotal, sale.subtotal())
                .min(sale.discount() - prior_discount);
            let tax_share = sale
                .tax()
                .proportional_share(returned_subtotal, sale.subtotal())
                .min(sale.tax() - prior_tax);
            let net_subtotal = returned_subtotal - discount_share;
            (
                net_subtotal,
                discount_share,
                tax_share,
                (net_subtotal + tax_share).max_zero(),
            )
        };

        let return_id = Uuid::new_v4().to_string();
        let return_number = ReturnRepository::next_return_number_tx(tx.as_mut()).await?;
        let now = Utc::now();
        let ret = SaleReturn {
            id: return_id.clone(),
            sale_id: sale.id.clone(),
            return_number,
            kind: if is_total {
                ReturnKind::Total
            } else {
                ReturnKind::Partial
            },
            status: ReturnStatus::Completed,
            reason: request.reason.clone(),
            refund_method: request.refund_method,
            subtotal_cents: subtotal.cents(),
            discount_cents: discount.cents(),
            tax_cents: tax.cents(),
            total_cents: total.cents(),
            inventory_restored: request.restore_inventory && !restoration.is_empty(),
            // Zero-amount refunds have no cash effect; the flag still records
            // that the ledger side was settled.
            cash_adjusted: true,
            created_at: now,
            updated_at: now,
        };
        ReturnRepository::insert_tx(tx.as_mut(), &ret).await?;

        for (sale_line, quantity) in &return_lines {
            let line = ReturnLine {
                id: Uuid::new_v4().to_string(),
                return_id: return_id.clone(),
                sale_line_id: sale_line.id.clone(),
                quantity: *quantity,
                unit_price_cents: sale_line.unit_price_cents,
                total_cents: sale_line.unit_price().multiply_quantity(*quantity).cents(),
                created_at: now,
            };
            ReturnRepository::insert_line_tx(tx.as_mut(), &line).await?;
        }

        // Journal rows reference the return row, so the credits go in last.
        for (ingredient_id, qty) in &restoration {
            let applied = IngredientRepository::apply_movement_tx(
                tx.as_mut(),
                ingredient_id,
                *qty,
                MOVEMENT_REASON_RETURN,
                Some(&sale.id),
                Some(&return_id),
            )
            .await?;
            if !applied {
                // Credits cannot go negative; a rejection means the
                // ingredient row vanished or was deactivated.
                return Err(TransactionError::Consistency(format!(
                    "stock credit rejected for ingredient {ingredient_id} in return {return_id}"
                )));
            }
        }

        if total.is_positive() {
            let entry = CashRepository::new_entry(
                CashDirection::Outflow,
                CASH_CATEGORY_RETURNS,
                total,
                Some(&sale.id),
                &format!("Devolución {}", ret.return_number),
            );
            CashRepository::insert_tx(tx.as_mut(), &entry).await?;
        }

        tx.commit().await.map_err(crate::error::DbError::from)?;

        info!(
            return_id = %ret.id,
            return_number = %ret.return_number,
            sale_id = %sale.id,
            total_cents = ret.total_cents,
            inventory_restored = ret.inventory_restored,
            "Return committed"
        );

        Ok(ret)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
