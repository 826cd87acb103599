//! # Checkout Service
//!
//! Turns a validated cart into a committed sale: one SQLite transaction
//! covering the sale row, its lines, every stock debit with its journal
//! entry, the table link, and the cash ledger inflow.
//!
//! ## Transaction Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  checkout(request)                                                      │
//! │                                                                         │
//! │  outside the transaction (pure / read-only):                           │
//! │    1. cash session guard (snapshot injected by the caller)             │
//! │    2. resolve lines against the catalog, freeze names and prices       │
//! │    3. compute totals, enforce order minimum                            │
//! │                                                                         │
//! │  BEGIN                                                                 │
//! │    4. re-read stock, walk lines against a working copy                 │
//! │       └── shortfall → InsufficientStock, ROLLBACK                      │
//! │    5. next sale number (COUNT in-transaction, UNIQUE backstop)         │
//! │    6. INSERT sale + lines (journal rows reference the sale)            │
//! │    7. guarded UPDATE per ingredient + journal row                      │
//! │    8. link dining table (dine-in)                                      │
//! │    9. cash inflow (completed sales with a positive total)              │
//! │  COMMIT                                                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Digital-menu orders commit as `pending`: stock is debited at creation so
//! the kitchen can rely on it, and the cash inflow waits for
//! [`CheckoutService::complete_sale`]. [`CheckoutService::cancel_sale`]
//! reverses the journal exactly.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use crate::repository::ingredient::{
    IngredientRepository, MOVEMENT_REASON_SALE, MOVEMENT_REASON_SALE_CANCELLED,
};
use crate::repository::{CashRepository, CatalogRepository, SaleRepository, TableRepository};
use crate::service::{TransactionError, TxResult};
use mesa_core::availability::{accumulate_consumption, ConsumptionMap, Sellable};
use mesa_core::cart::{compute_totals, enforce_minimum_order, CartLine};
use mesa_core::session::ensure_session_for_sale;
use mesa_core::validation::{validate_line_description, validate_unit_price_cents};
use mesa_core::{
    CashDirection, CashSession, CoreError, LineKind, Money, OrderSettings, PaymentMethod, Sale,
    SaleChannel, SaleLine, SaleStatus, StaffRole, CASH_CATEGORY_SALES,
};

/// One requested line of a checkout.
#[derive(Debug, Clone)]
pub enum LineRequest {
    /// A catalog product (simple, menu, or combo).
    Product {
        product_id: String,
        quantity: i64,
        /// Choice option ids for combos; empty otherwise.
        selected_option_ids: Vec<String>,
    },
    /// A specific variant.
    Variant { variant_id: String, quantity: i64 },
    /// Off-menu free-text line: no catalog reference, no stock effect.
    FreeText {
        description: String,
        unit_price: Money,
        quantity: i64,
    },
}

/// A complete checkout request. Session and settings are snapshots the
/// caller loads up front; the service never reaches into ambient state.
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub channel: SaleChannel,
    pub payment_method: PaymentMethod,
    pub role: StaffRole,
    pub lines: Vec<LineRequest>,
    pub discount: Money,
    pub tax: Money,
    pub table_id: Option<String>,
    pub customer_name: Option<String>,
    pub notes: Option<String>,
    pub session: Option<CashSession>,
    pub settings: OrderSettings,
}

/// A cart line with its resolved sellable attached (free-text lines carry
/// no sellable).
struct ResolvedLine {
    cart: CartLine,
    sellable: Option<Sellable>,
}

/// Service executing checkouts as single transactions.
#[derive(Debug, Clone)]
pub struct CheckoutService {
    pool: SqlitePool,
    catalog: CatalogRepository,
}

impl CheckoutService {
    pub fn new(pool: SqlitePool) -> Self {
        CheckoutService {
            catalog: CatalogRepository::new(pool.clone()),
            pool,
        }
    }

    /// Executes a checkout. Counter and dine-in sales commit as completed;
    /// digital-menu orders commit as pending.
    pub async fn checkout(&self, request: CheckoutRequest) -> TxResult<Sale> {
        ensure_session_for_sale(request.channel, request.role, request.session.as_ref())
            .map_err(TransactionError::Validation)?;

        let resolved = self.resolve_lines(&request.lines).await?;
        let cart: Vec<CartLine> = resolved.iter().map(|l| l.cart.clone()).collect();
        let totals =
            compute_totals(&cart, request.discount, request.tax).map_err(TransactionError::Validation)?;

        if request.channel == SaleChannel::DigitalMenu {
            let minimum = request.settings.minimum_order_cents.map(Money::from_cents);
            enforce_minimum_order(&totals, minimum).map_err(TransactionError::Validation)?;
        }

        let status = if request.channel == SaleChannel::DigitalMenu {
            SaleStatus::Pending
        } else {
            SaleStatus::Completed
        };

        let mut tx = self.pool.begin().await.map_err(crate::error::DbError::from)?;

        // Walk the lines against a working copy of the in-transaction stock
        // snapshot: duplicates and shared ingredients both shrink it, so the
        // first line that no longer fits names the right sellable.
        let mut working = IngredientRepository::stock_levels_tx(tx.as_mut()).await?;
        let mut consumption = ConsumptionMap::new();
        for line in &resolved {
            let Some(sellable) = &line.sellable else { continue };

            let available = sellable.available_quantity(&working);
            if available < line.cart.quantity {
                return Err(TransactionError::Validation(CoreError::InsufficientStock {
                    name: sellable.name().to_string(),
                    available,
                    requested: line.cart.quantity,
                }));
            }

            let mut line_consumption = ConsumptionMap::new();
            accumulate_consumption(sellable, line.cart.quantity, &mut line_consumption);
            for (ingredient_id, qty) in line_consumption {
                working.insert(ingredient_id.clone(), working.get(&ingredient_id) - qty);
                let entry = consumption
                    .entry(ingredient_id)
                    .or_insert_with(mesa_core::StockQty::zero);
                *entry += qty;
            }
        }

        // The sale row goes in before its journal rows: stock_movements
        // references sales(id) and SQLite enforces the FK at insert time.
        let sale_id = Uuid::new_v4().to_string();
        let sale_number = SaleRepository::next_sale_number_tx(tx.as_mut(), request.channel).await?;
        let now = Utc::now();
        let sale = Sale {
            id: sale_id.clone(),
            sale_number,
            channel: request.channel,
            status,
            payment_method: request.payment_method,
            subtotal_cents: totals.subtotal.cents(),
            discount_cents: totals.discount.cents(),
            tax_cents: totals.tax.cents(),
            total_cents: totals.total.cents(),
            cash_session_id: request.session.as_ref().map(|s| s.id.clone()),
            table_id: request.table_id.clone(),
            customer_name: request.customer_name.clone(),
            notes: request.notes.clone(),
            created_at: now,
            updated_at: now,
            completed_at: (status == SaleStatus::Completed).then_some(now),
        };
        SaleRepository::insert_tx(tx.as_mut(), &sale).await?;

        for line in &resolved {
            SaleRepository::insert_line_tx(tx.as_mut(), &build_sale_line(&sale.id, line, now))
                .await?;
        }

        for (ingredient_id, qty) in &consumption {
            let applied = IngredientRepository::apply_movement_tx(
                tx.as_mut(),
                ingredient_id,
                -*qty,
                MOVEMENT_REASON_SALE,
                Some(&sale.id),
                None,
            )
            .await?;
            if !applied {
                // The working-copy walk already passed, so a rejected debit
                // means the stored stock contradicts the snapshot.
                return Err(TransactionError::Consistency(format!(
                    "stock debit rejected for ingredient {ingredient_id} in sale {}",
                    sale.id
                )));
            }
        }

        if let Some(table_id) = &request.table_id {
            TableRepository::occupy_tx(tx.as_mut(), table_id, &sale.id).await?;
        }

        // Zero-total tickets (full courtesy) move no cash, so no entry; the
        // ledger CHECK rejects zero amounts.
        if status == SaleStatus::Completed && totals.total.is_positive() {
            let entry = CashRepository::new_entry(
                CashDirection::Inflow,
                CASH_CATEGORY_SALES,
                totals.total,
                Some(&sale.id),
                &format!("Venta {}", sale.sale_number),
            );
            CashRepository::insert_tx(tx.as_mut(), &entry).await?;
        }

        tx.commit().await.map_err(crate::error::DbError::from)?;

        info!(
            sale_id = %sale.id,
            sale_number = %sale.sale_number,
            status = ?sale.status,
            total_cents = sale.total_cents,
            "Checkout committed"
        );

        Ok(sale)
    }

    /// Completes a pending digital-menu sale: status flip plus the deferred
    /// cash inflow, in one transaction. Stock was already debited at
    /// creation.
    pub async fn complete_sale(&self, sale_id: &str) -> TxResult<Sale> {
        let mut tx = self.pool.begin().await.map_err(crate::error::DbError::from)?;

        let sale = SaleRepository::get_by_id_tx(tx.as_mut(), sale_id)
            .await?
            .ok_or_else(|| TransactionError::Validation(CoreError::SaleNotFound(sale_id.to_string())))?;
        if sale.status != SaleStatus::Pending {
            return Err(TransactionError::Validation(CoreError::InvalidSaleStatus {
                sale_id: sale_id.to_string(),
                current_status: format!("{:?}", sale.status).to_lowercase(),
            }));
        }

        SaleRepository::mark_completed_tx(tx.as_mut(), sale_id).await?;

        if sale.total().is_positive() {
            let entry = CashRepository::new_entry(
                CashDirection::Inflow,
                CASH_CATEGORY_SALES,
                sale.total(),
                Some(sale_id),
                &format!("Venta {}", sale.sale_number),
            );
            CashRepository::insert_tx(tx.as_mut(), &entry).await?;
        }

        tx.commit().await.map_err(crate::error::DbError::from)?;

        info!(sale_id = %sale_id, "Pending sale completed");

        let mut sale = sale;
        sale.status = SaleStatus::Completed;
        Ok(sale)
    }

    /// Cancels a pending digital-menu sale and credits its stock debits
    /// back, reversing the journal exactly.
    pub async fn cancel_sale(&self, sale_id: &str) -> TxResult<()> {
        let mut tx = self.pool.begin().await.map_err(crate::error::DbError::from)?;

        let sale = SaleRepository::get_by_id_tx(tx.as_mut(), sale_id)
            .await?
            .ok_or_else(|| TransactionError::Validation(CoreError::SaleNotFound(sale_id.to_string())))?;
        if sale.status != SaleStatus::Pending {
            return Err(TransactionError::Validation(CoreError::InvalidSaleStatus {
                sale_id: sale_id.to_string(),
                current_status: format!("{:?}", sale.status).to_lowercase(),
            }));
        }

        SaleRepository::mark_cancelled_tx(tx.as_mut(), sale_id).await?;

        // Credit back exactly what the sale debited, from its own journal.
        let debits: Vec<(String, i64)> = sqlx::query_as(
            r#"
            SELECT ingredient_id, delta_milli FROM stock_movements
            WHERE sale_id = ?1 AND reason = ?2
            "#,
        )
        .bind(sale_id)
        .bind(MOVEMENT_REASON_SALE)
        .fetch_all(tx.as_mut())
        .await
        .map_err(crate::error::DbError::from)?;

        for (ingredient_id, delta_milli) in debits {
            let applied = IngredientRepository::apply_movement_tx(
                tx.as_mut(),
                &ingredient_id,
                mesa_core::StockQty::from_milli(-delta_milli),
                MOVEMENT_REASON_SALE_CANCELLED,
                Some(sale_id),
                None,
            )
            .await?;
            if !applied {
                return Err(TransactionError::Consistency(format!(
                    "stock credit rejected for ingredient {ingredient_id} while cancelling sale {sale_id}"
                )));
            }
        }

        tx.commit().await.map_err(crate::error::DbError::from)?;

        info!(sale_id = %sale_id, "Pending sale cancelled, stock credited back");

        Ok(())
    }

    /// Resolves line requests against the catalog: prices and names are
    /// frozen here, and combos are priced with their selected options.
    async fn resolve_lines(&self, lines: &[LineRequest]) -> TxResult<Vec<ResolvedLine>> {
        let mut resolved = Vec::with_capacity(lines.len());

        for line in lines {
            match line {
                LineRequest::Product {
                    product_id,
                    quantity,
                    selected_option_ids,
                } => {
                    let sellable = self
                        .catalog
                        .load_sellable(product_id)
                        .await?
                        .ok_or_else(|| {
                            TransactionError::Validation(CoreError::SellableNotFound(
                                product_id.clone(),
                            ))
                        })?;

                    let (kind, unit_price) = match &sellable {
                        Sellable::Simple(p) => (LineKind::Simple, p.price),
                        Sellable::Menu(m) => (LineKind::Menu, m.price),
                        Sellable::Combo(c) => {
                            (LineKind::Combo, price_combo(c, selected_option_ids)?)
                        }
                        Sellable::Variant(_) => {
                            return Err(TransactionError::Consistency(format!(
                                "product {product_id} resolved to a variant"
                            )))
                        }
                    };

                    resolved.push(ResolvedLine {
                        cart: CartLine {
                            sellable_id: Some(product_id.clone()),
                            variant_id: None,
                            description: sellable.name().to_string(),
                            kind,
                            unit_price,
                            quantity: *quantity,
                        },
                        sellable: Some(sellable),
                    });
                }

                LineRequest::Variant {
                    variant_id,
                    quantity,
                } => {
                    let sellable = self
                        .catalog
                        .load_variant_sellable(variant_id)
                        .await?
                        .ok_or_else(|| {
                            TransactionError::Validation(CoreError::SellableNotFound(
                                variant_id.clone(),
                            ))
                        })?;
                    let kind = match self.catalog.variant_parent_kind(variant_id).await?.as_deref()
                    {
                        Some("simple") => LineKind::SimpleVariant,
                        _ => LineKind::Variant,
                    };

                    resolved.push(ResolvedLine {
                        cart: CartLine {
                            sellable_id: None,
                            variant_id: Some(variant_id.clone()),
                            description: sellable.name().to_string(),
                            kind,
                            unit_price: sellable.unit_price(),
                            quantity: *quantity,
                        },
                        sellable: Some(sellable),
                    });
                }

                LineRequest::FreeText {
                    description,
                    unit_price,
                    quantity,
                } => {
                    validate_line_description(description)
                        .map_err(|e| TransactionError::Validation(e.into()))?;
                    validate_unit_price_cents(unit_price.cents())
                        .map_err(|e| TransactionError::Validation(e.into()))?;

                    resolved.push(ResolvedLine {
                        cart: CartLine {
                            sellable_id: None,
                            variant_id: None,
                            description: description.clone(),
                            kind: LineKind::Free,
                            unit_price: *unit_price,
                            quantity: *quantity,
                        },
                        sellable: None,
                    });
                }
            }
        }

        Ok(resolved)
    }
}

/// Prices a combo from its selected options, requiring exactly one pick per
/// required group and validating every id against the combo's own groups.
fn price_combo(
    combo: &mesa_core::availability::Combo,
    selected_option_ids: &[String],
) -> TxResult<Money> {
    let mut selections = Vec::new();
    let mut matched = 0usize;

    for group in &combo.choice_groups {
        let picked: Vec<_> = group
            .options
            .iter()
            .filter(|opt| selected_option_ids.iter().any(|id| id == &opt.id))
            .collect();

        if group.required && picked.len() != 1 {
            return Err(TransactionError::Validation(CoreError::Validation(
                mesa_core::ValidationError::Required {
                    field: format!("combo choice '{}'", group.name),
                },
            )));
        }
        matched += picked.len();
        selections.extend(picked);
    }

    if matched != selected_option_ids.len() {
        return Err(TransactionError::Validation(CoreError::Validation(
            mesa_core::ValidationError::InvalidFormat {
                field: "selected_option_ids".to_string(),
                reason: format!("not all options belong to combo '{}'", combo.name),
            },
        )));
    }

    Ok(combo.price_with(&selections))
}

fn build_sale_line(
    sale_id: &str,
    line: &ResolvedLine,
    now: chrono::DateTime<chrono::Utc>,
) -> SaleLine {
    SaleLine {
        id: Uuid::new_v4().to_string(),
        sale_id: sale_id.to_string(),
        product_id: line.cart.sellable_id.clone(),
        variant_id: line.cart.variant_id.clone(),
        kind: line.cart.kind,
        name_snapshot: line.cart.description.clone(),
        quantity: line.cart.quantity,
        unit_price_cents: line.cart.unit_price.cents(),
        total_price_cents: line.cart.line_total().cents(),
        created_at: now,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{fixture, Fixture};
    use mesa_core::CoreError;

    fn product_line(product_id: &str, quantity: i64) -> LineRequest {
        LineRequest::Product {
            product_id: product_id.to_string(),
            quantity,
            selected_option_ids: Vec::new(),
        }
    }

    async fn request(f: &Fixture, lines: Vec<LineRequest>) -> CheckoutRequest {
        CheckoutRequest {
            channel: SaleChannel::DineIn,
            payment_method: PaymentMethod::Efectivo,
            role: StaffRole::Cashier,
            lines,
            discount: Money::zero(),
            tax: Money::zero(),
            table_id: None,
            customer_name: None,
            notes: None,
            session: Some(f.session().await),
            settings: OrderSettings::default(),
        }
    }

    #[tokio::test]
    async fn test_checkout_debits_stock_and_records_cash() {
        let f = fixture().await;
        let req = request(
            &f,
            vec![
                product_line(&f.tacos, 2),
                product_line(&f.refresco_producto, 1),
            ],
        )
        .await;

        let sale = f.db.checkout().checkout(req).await.unwrap();

        assert_eq!(sale.status, SaleStatus::Completed);
        assert_eq!(sale.subtotal_cents, 2 * 1_800 + 2_500);
        assert_eq!(sale.total_cents, 6_100);

        // 2 orders × 0.2 kg pollo, 2 × 3 tortillas, 1 refresco
        assert_eq!(f.stock_milli(&f.pollo).await, 10_000 - 400);
        assert_eq!(f.stock_milli(&f.tortilla).await, 300_000 - 6_000);
        assert_eq!(f.stock_milli(&f.refresco).await, 3_000 - 1_000);

        // One journal row per ingredient, signed negative
        let movements = f.db.ingredients().movements_for_sale(&sale.id).await.unwrap();
        assert_eq!(movements.len(), 3);
        assert!(movements.iter().all(|m| m.delta_milli < 0));

        // Exactly one inflow equal to the total
        let entries = f.db.cash().entries_for_sale(&sale.id).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].direction, CashDirection::Inflow);
        assert_eq!(entries[0].amount_cents, sale.total_cents);

        // Lines snapshot names and prices
        let lines = f.db.sales().get_lines(&sale.id).await.unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].name_snapshot, "Tacos al pastor");
        assert_eq!(lines[0].unit_price_cents, 1_800);
    }

    #[tokio::test]
    async fn test_sale_number_is_day_scoped_and_sequential() {
        let f = fixture().await;
        let date = Utc::now().format("%Y%m%d").to_string();

        let first = f
            .db
            .checkout()
            .checkout(request(&f, vec![product_line(&f.tacos, 1)]).await)
            .await
            .unwrap();
        let second = f
            .db
            .checkout()
            .checkout(request(&f, vec![product_line(&f.tacos, 1)]).await)
            .await
            .unwrap();

        assert_eq!(first.sale_number, format!("V{date}0001"));
        assert_eq!(second.sale_number, format!("V{date}0002"));
    }

    #[tokio::test]
    async fn test_insufficient_stock_rolls_back_everything() {
        let f = fixture().await;
        // 10 kg of pollo at 0.2 per order allows 50
        let req = request(&f, vec![product_line(&f.tacos, 51)]).await;

        let err = f.db.checkout().checkout(req).await.unwrap_err();
        match err {
            TransactionError::Validation(CoreError::InsufficientStock {
                available,
                requested,
                ..
            }) => {
                assert_eq!(available, 50);
                assert_eq!(requested, 51);
            }
            other => panic!("expected InsufficientStock, got {other:?}"),
        }

        // Nothing written
        assert_eq!(f.stock_milli(&f.pollo).await, 10_000);
        let pending = f.db.sales().list_by_status(SaleStatus::Completed).await.unwrap();
        assert!(pending.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_lines_checked_on_combined_quantity() {
        let f = fixture().await;
        // 3 refrescos in stock; 2 + 2 must fail even though each line fits
        let req = request(
            &f,
            vec![
                product_line(&f.refresco_producto, 2),
                product_line(&f.refresco_producto, 2),
            ],
        )
        .await;

        let err = f.db.checkout().checkout(req).await.unwrap_err();
        match err {
            TransactionError::Validation(CoreError::InsufficientStock {
                available,
                requested,
                ..
            }) => {
                // The working copy already gave 2 to the first line
                assert_eq!(available, 1);
                assert_eq!(requested, 2);
            }
            other => panic!("expected InsufficientStock, got {other:?}"),
        }
        assert_eq!(f.stock_milli(&f.refresco).await, 3_000);
    }

    #[tokio::test]
    async fn test_concurrent_last_units_sell_once() {
        // A file-backed database with a multi-connection pool, so the two
        // checkouts hold separate connections and genuinely contend for
        // SQLite's write lock.
        let path = std::env::temp_dir().join(format!("mesa-race-{}.db", Uuid::new_v4()));
        let db = crate::pool::Database::new(
            crate::pool::DbConfig::new(&path).max_connections(4),
        )
        .await
        .unwrap();

        let refresco = crate::testutil::ingredient("Refresco", "pz", 3_000);
        db.ingredients().insert(&refresco).await.unwrap();
        let producto = db
            .catalog()
            .insert_simple_product(
                "Refresco 600ml",
                Money::from_cents(2_500),
                &refresco.id,
                mesa_core::StockQty::from_units(1),
            )
            .await
            .unwrap();

        let make_request = |session: CashSession| CheckoutRequest {
            channel: SaleChannel::DineIn,
            payment_method: PaymentMethod::Efectivo,
            role: StaffRole::Cashier,
            lines: vec![product_line(&producto, 2)],
            discount: Money::zero(),
            tax: Money::zero(),
            table_id: None,
            customer_name: None,
            notes: None,
            session: Some(session),
            settings: OrderSettings::default(),
        };
        let session_a = db.sessions().open("cajero-a").await.unwrap();
        let session_b = db.sessions().open("cajero-b").await.unwrap();

        // 3 refrescos; two checkouts of 2 each race for them
        let service = db.checkout();
        let (a, b) = tokio::join!(
            service.checkout(make_request(session_a)),
            service.checkout(make_request(session_b)),
        );

        assert_eq!(a.is_ok() as usize + b.is_ok() as usize, 1);
        let stock = db
            .ingredients()
            .get_by_id(&refresco.id)
            .await
            .unwrap()
            .unwrap()
            .quantity_milli;
        assert_eq!(stock, 1_000);

        db.close().await;
        for suffix in ["", "-wal", "-shm"] {
            let _ = std::fs::remove_file(format!("{}{}", path.display(), suffix));
        }
    }

    #[tokio::test]
    async fn test_missing_session_rejected_for_dine_in() {
        let f = fixture().await;
        let mut req = request(&f, vec![product_line(&f.tacos, 1)]).await;
        req.session = None;

        let err = f.db.checkout().checkout(req).await.unwrap_err();
        assert!(matches!(
            err,
            TransactionError::Validation(CoreError::NoOpenCashSession { .. })
        ));
    }

    #[tokio::test]
    async fn test_free_text_line_has_no_stock_effect() {
        let f = fixture().await;
        let mut req = request(&f, vec![product_line(&f.tacos, 1)]).await;
        req.lines.push(LineRequest::FreeText {
            description: "Especial del día".to_string(),
            unit_price: Money::from_cents(3_000),
            quantity: 1,
        });

        let sale = f.db.checkout().checkout(req).await.unwrap();
        assert_eq!(sale.subtotal_cents, 1_800 + 3_000);

        // Only the tacos moved stock
        let movements = f.db.ingredients().movements_for_sale(&sale.id).await.unwrap();
        assert_eq!(movements.len(), 2);

        let lines = f.db.sales().get_lines(&sale.id).await.unwrap();
        assert!(lines.iter().any(|l| l.kind == LineKind::Free && l.product_id.is_none()));
    }

    #[tokio::test]
    async fn test_negative_total_rejected() {
        let f = fixture().await;
        let mut req = request(&f, vec![product_line(&f.tacos, 1)]).await;
        req.discount = Money::from_cents(5_000);

        let err = f.db.checkout().checkout(req).await.unwrap_err();
        assert!(matches!(
            err,
            TransactionError::Validation(CoreError::NegativeTotal { .. })
        ));
    }

    #[tokio::test]
    async fn test_combo_requires_choice_and_consumes_fixed_components() {
        let f = fixture().await;

        // Missing the required drink choice
        let req = request(&f, vec![product_line(&f.combo, 1)]).await;
        let err = f.db.checkout().checkout(req).await.unwrap_err();
        assert!(matches!(err, TransactionError::Validation(CoreError::Validation(_))));

        // With the choice: base price, fixed components deducted, drink not
        let mut req = request(&f, vec![product_line(&f.combo, 1)]).await;
        req.lines = vec![LineRequest::Product {
            product_id: f.combo.clone(),
            quantity: 1,
            selected_option_ids: vec![f.drink_option.clone()],
        }];
        let sale = f.db.checkout().checkout(req).await.unwrap();

        assert_eq!(sale.subtotal_cents, 4_500);
        assert_eq!(f.stock_milli(&f.pollo).await, 10_000 - 200);
        assert_eq!(f.stock_milli(&f.papa).await, 4_000 - 500);
        assert_eq!(f.stock_milli(&f.refresco).await, 3_000);
    }

    #[tokio::test]
    async fn test_digital_menu_order_reserves_stock_until_completed() {
        let f = fixture().await;
        let mut req = request(&f, vec![product_line(&f.tacos, 2)]).await;
        req.channel = SaleChannel::DigitalMenu;
        req.session = None;

        let sale = f.db.checkout().checkout(req).await.unwrap();
        assert_eq!(sale.status, SaleStatus::Pending);
        assert!(sale.sale_number.starts_with('M'));

        // Stock reserved immediately, cash deferred
        assert_eq!(f.stock_milli(&f.pollo).await, 10_000 - 400);
        assert!(f.db.cash().entries_for_sale(&sale.id).await.unwrap().is_empty());

        let completed = f.db.checkout().complete_sale(&sale.id).await.unwrap();
        assert_eq!(completed.status, SaleStatus::Completed);
        let entries = f.db.cash().entries_for_sale(&sale.id).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].amount_cents, sale.total_cents);

        // Completing twice is rejected
        let err = f.db.checkout().complete_sale(&sale.id).await.unwrap_err();
        assert!(matches!(
            err,
            TransactionError::Validation(CoreError::InvalidSaleStatus { .. })
        ));
    }

    #[tokio::test]
    async fn test_cancelling_pending_order_credits_stock_back() {
        let f = fixture().await;
        let mut req = request(&f, vec![product_line(&f.tacos, 3)]).await;
        req.channel = SaleChannel::DigitalMenu;
        req.session = None;

        let sale = f.db.checkout().checkout(req).await.unwrap();
        assert_eq!(f.stock_milli(&f.pollo).await, 10_000 - 600);

        f.db.checkout().cancel_sale(&sale.id).await.unwrap();

        assert_eq!(f.stock_milli(&f.pollo).await, 10_000);
        assert_eq!(f.stock_milli(&f.tortilla).await, 300_000);
        assert!(f.db.cash().entries_for_sale(&sale.id).await.unwrap().is_empty());

        let stored = f.db.sales().get_by_id(&sale.id).await.unwrap().unwrap();
        assert_eq!(stored.status, SaleStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_digital_menu_minimum_order() {
        let f = fixture().await;
        let mut req = request(&f, vec![product_line(&f.refresco_producto, 1)]).await;
        req.channel = SaleChannel::DigitalMenu;
        req.session = None;
        req.settings = OrderSettings {
            minimum_order_cents: Some(3_000),
        };

        let err = f.db.checkout().checkout(req).await.unwrap_err();
        assert!(matches!(
            err,
            TransactionError::Validation(CoreError::BelowMinimumOrder { .. })
        ));
    }

    #[tokio::test]
    async fn test_dine_in_links_table() {
        let f = fixture().await;
        let table_id = f.db.tables().insert("Mesa 1").await.unwrap();

        let mut req = request(&f, vec![product_line(&f.tacos, 1)]).await;
        req.table_id = Some(table_id.clone());

        let sale = f.db.checkout().checkout(req).await.unwrap();

        let table = f.db.tables().get_by_id(&table_id).await.unwrap().unwrap();
        assert!(table.is_occupied);
        assert_eq!(table.current_sale_id.as_deref(), Some(sale.id.as_str()));
    }
}
