//! # Catalog Repository
//!
//! Database operations for products, variants, recipes, and combos, plus the
//! load-time resolution of relational rows into [`Sellable`] shapes.
//!
//! ## Resolution
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  products (kind)                                                        │
//! │  ├── 'simple' ──► Sellable::Simple   (ingredient + cost per unit)      │
//! │  ├── 'menu'   ──► Sellable::Menu     (recipe_lines + variants)         │
//! │  └── 'combo'  ──► Sellable::Combo                                      │
//! │                    ├── combo_components      → fixed Sellables         │
//! │                    ├── combo_choice_groups   → ChoiceGroup             │
//! │                    └── combo_choice_options  → ChoiceOption            │
//! │                                                                         │
//! │  variants ──► Sellable::Variant (own recipe_lines, own price)          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Combo components and choice options reference simple/menu products or
//! variants, never other combos; resolution is therefore one level deep.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use mesa_core::availability::{
    ChoiceGroup, ChoiceOption, Combo, MenuItem, Sellable, SimpleProduct, VariantItem,
};
use mesa_core::{Money, RecipeLine, StockQty};

const KIND_SIMPLE: &str = "simple";
const KIND_MENU: &str = "menu";
const KIND_COMBO: &str = "combo";

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: String,
    name: String,
    kind: String,
    price_cents: i64,
    ingredient_id: Option<String>,
    cost_per_unit_milli: Option<i64>,
    is_available: bool,
    is_active: bool,
}

#[derive(Debug, sqlx::FromRow)]
struct VariantRow {
    id: String,
    name: String,
    price_cents: i64,
    is_available: bool,
}

#[derive(Debug, sqlx::FromRow)]
struct ComponentRow {
    product_id: Option<String>,
    variant_id: Option<String>,
}

#[derive(Debug, sqlx::FromRow)]
struct ChoiceGroupRow {
    id: String,
    name: String,
    required: bool,
}

#[derive(Debug, sqlx::FromRow)]
struct ChoiceOptionRow {
    id: String,
    product_id: Option<String>,
    variant_id: Option<String>,
    price_adjustment_cents: i64,
}

/// Repository for catalog database operations.
#[derive(Debug, Clone)]
pub struct CatalogRepository {
    pool: SqlitePool,
}

impl CatalogRepository {
    /// Creates a new CatalogRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CatalogRepository { pool }
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Inserts a simple product wrapping one ingredient. Returns the new ID.
    pub async fn insert_simple_product(
        &self,
        name: &str,
        price: Money,
        ingredient_id: &str,
        cost_per_unit: StockQty,
    ) -> DbResult<String> {
        let id = Uuid::new_v4().to_string();
        debug!(id = %id, name = %name, "Inserting simple product");

        self.insert_product_row(
            &id,
            name,
            KIND_SIMPLE,
            price,
            Some(ingredient_id),
            Some(cost_per_unit.milli()),
        )
        .await?;

        Ok(id)
    }

    /// Inserts a recipe-based menu item. Returns the new ID.
    pub async fn insert_menu_item(&self, name: &str, price: Money) -> DbResult<String> {
        let id = Uuid::new_v4().to_string();
        debug!(id = %id, name = %name, "Inserting menu item");

        self.insert_product_row(&id, name, KIND_MENU, price, None, None)
            .await?;

        Ok(id)
    }

    /// Inserts a combo shell. Components and choices are added separately.
    pub async fn insert_combo(&self, name: &str, base_price: Money) -> DbResult<String> {
        let id = Uuid::new_v4().to_string();
        debug!(id = %id, name = %name, "Inserting combo");

        self.insert_product_row(&id, name, KIND_COMBO, base_price, None, None)
            .await?;

        Ok(id)
    }

    async fn insert_product_row(
        &self,
        id: &str,
        name: &str,
        kind: &str,
        price: Money,
        ingredient_id: Option<&str>,
        cost_per_unit_milli: Option<i64>,
    ) -> DbResult<()> {
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO products (
                id, name, kind, price_cents,
                ingredient_id, cost_per_unit_milli,
                is_available, is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1, 1, ?7, ?7)
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(kind)
        .bind(price.cents())
        .bind(ingredient_id)
        .bind(cost_per_unit_milli)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Inserts a variant of a product. Returns the new ID.
    pub async fn insert_variant(
        &self,
        product_id: &str,
        name: &str,
        price: Money,
    ) -> DbResult<String> {
        let id = Uuid::new_v4().to_string();

        sqlx::query(
            r#"
            INSERT INTO variants (id, product_id, name, price_cents, is_available, created_at)
            VALUES (?1, ?2, ?3, ?4, 1, ?5)
            "#,
        )
        .bind(&id)
        .bind(product_id)
        .bind(name)
        .bind(price.cents())
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(id)
    }

    /// Adds one recipe line to a product.
    pub async fn add_recipe_line_for_product(
        &self,
        product_id: &str,
        ingredient_id: &str,
        quantity_needed: StockQty,
        unit: &str,
    ) -> DbResult<String> {
        self.insert_recipe_line(Some(product_id), None, ingredient_id, quantity_needed, unit)
            .await
    }

    /// Adds one recipe line to a variant.
    pub async fn add_recipe_line_for_variant(
        &self,
        variant_id: &str,
        ingredient_id: &str,
        quantity_needed: StockQty,
        unit: &str,
    ) -> DbResult<String> {
        self.insert_recipe_line(None, Some(variant_id), ingredient_id, quantity_needed, unit)
            .await
    }

    async fn insert_recipe_line(
        &self,
        product_id: Option<&str>,
        variant_id: Option<&str>,
        ingredient_id: &str,
        quantity_needed: StockQty,
        unit: &str,
    ) -> DbResult<String> {
        let id = Uuid::new_v4().to_string();

        sqlx::query(
            r#"
            INSERT INTO recipe_lines (
                id, product_id, variant_id, ingredient_id, quantity_needed_milli, unit
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&id)
        .bind(product_id)
        .bind(variant_id)
        .bind(ingredient_id)
        .bind(quantity_needed.milli())
        .bind(unit)
        .execute(&self.pool)
        .await?;

        Ok(id)
    }

    /// Adds a fixed component (a product) to a combo.
    pub async fn add_combo_component(&self, combo_id: &str, product_id: &str) -> DbResult<String> {
        let id = Uuid::new_v4().to_string();

        sqlx::query(
            r#"
            INSERT INTO combo_components (id, combo_id, product_id, variant_id)
            VALUES (?1, ?2, ?3, NULL)
            "#,
        )
        .bind(&id)
        .bind(combo_id)
        .bind(product_id)
        .execute(&self.pool)
        .await?;

        Ok(id)
    }

    /// Adds a choice group to a combo. Returns the group ID.
    pub async fn add_choice_group(
        &self,
        combo_id: &str,
        name: &str,
        required: bool,
    ) -> DbResult<String> {
        let id = Uuid::new_v4().to_string();

        sqlx::query(
            r#"
            INSERT INTO combo_choice_groups (id, combo_id, name, required)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(&id)
        .bind(combo_id)
        .bind(name)
        .bind(required)
        .execute(&self.pool)
        .await?;

        Ok(id)
    }

    /// Adds a pickable option (a product) to a choice group.
    pub async fn add_choice_option(
        &self,
        group_id: &str,
        product_id: &str,
        price_adjustment: Money,
    ) -> DbResult<String> {
        let id = Uuid::new_v4().to_string();

        sqlx::query(
            r#"
            INSERT INTO combo_choice_options (id, group_id, product_id, variant_id, price_adjustment_cents)
            VALUES (?1, ?2, ?3, NULL, ?4)
            "#,
        )
        .bind(&id)
        .bind(group_id)
        .bind(product_id)
        .bind(price_adjustment.cents())
        .execute(&self.pool)
        .await?;

        Ok(id)
    }

    /// Toggles a product's manual availability flag.
    pub async fn set_availability(&self, product_id: &str, available: bool) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE products SET is_available = ?2, updated_at = ?3 WHERE id = ?1",
        )
        .bind(product_id)
        .bind(available)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", product_id));
        }

        Ok(())
    }

    // =========================================================================
    // Resolution
    // =========================================================================

    /// Loads one product as a resolved [`Sellable`], or `None` if it does not
    /// exist or is soft-deleted.
    pub async fn load_sellable(&self, product_id: &str) -> DbResult<Option<Sellable>> {
        let row = sqlx::query_as::<_, ProductRow>(
            r#"
            SELECT id, name, kind, price_cents, ingredient_id, cost_per_unit_milli,
                   is_available, is_active
            FROM products WHERE id = ?1
            "#,
        )
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else { return Ok(None) };
        if !row.is_active {
            return Ok(None);
        }

        let sellable = match row.kind.as_str() {
            KIND_COMBO => Sellable::Combo(self.resolve_combo(row).await?),
            _ => self.resolve_non_combo(row).await?,
        };

        Ok(Some(sellable))
    }

    /// Loads one variant as a resolved [`Sellable::Variant`].
    pub async fn load_variant_sellable(&self, variant_id: &str) -> DbResult<Option<Sellable>> {
        let row = sqlx::query_as::<_, VariantRow>(
            "SELECT id, name, price_cents, is_available FROM variants WHERE id = ?1",
        )
        .bind(variant_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else { return Ok(None) };
        let recipe = self.variant_recipe(&row.id).await?;

        Ok(Some(Sellable::Variant(VariantItem {
            id: row.id,
            name: row.name,
            price: Money::from_cents(row.price_cents),
            recipe,
            is_available: row.is_available,
        })))
    }

    /// Kind of the product a variant belongs to ("simple" or "menu"), used
    /// to pick the sale line kind.
    pub async fn variant_parent_kind(&self, variant_id: &str) -> DbResult<Option<String>> {
        let kind: Option<(String,)> = sqlx::query_as(
            r#"
            SELECT p.kind FROM products p
            JOIN variants v ON v.product_id = p.id
            WHERE v.id = ?1
            "#,
        )
        .bind(variant_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(kind.map(|(k,)| k))
    }

    /// Loads every active product as a resolved sellable, name order.
    /// This is the digital-menu listing.
    pub async fn list_active_sellables(&self) -> DbResult<Vec<Sellable>> {
        let ids: Vec<(String,)> = sqlx::query_as(
            "SELECT id FROM products WHERE is_active = 1 ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut sellables = Vec::with_capacity(ids.len());
        for (id,) in ids {
            if let Some(sellable) = self.load_sellable(&id).await? {
                sellables.push(sellable);
            }
        }

        Ok(sellables)
    }

    /// Resolves a simple or menu product row (never a combo).
    async fn resolve_non_combo(&self, row: ProductRow) -> DbResult<Sellable> {
        match row.kind.as_str() {
            KIND_SIMPLE => {
                let ingredient_id = row.ingredient_id.ok_or_else(|| {
                    DbError::QueryFailed(format!("simple product {} has no ingredient", row.id))
                })?;
                Ok(Sellable::Simple(SimpleProduct {
                    id: row.id,
                    name: row.name,
                    price: Money::from_cents(row.price_cents),
                    ingredient_id,
                    cost_per_unit: StockQty::from_milli(row.cost_per_unit_milli.unwrap_or(0)),
                    is_available: row.is_available,
                }))
            }
            KIND_MENU => {
                let recipe = self.product_recipe(&row.id).await?;
                let variants = self.product_variants(&row.id).await?;
                Ok(Sellable::Menu(MenuItem {
                    id: row.id,
                    name: row.name,
                    price: Money::from_cents(row.price_cents),
                    recipe,
                    variants,
                    is_available: row.is_available,
                }))
            }
            other => Err(DbError::QueryFailed(format!(
                "unsupported product kind '{other}' for {}",
                row.id
            ))),
        }
    }

    async fn resolve_combo(&self, row: ProductRow) -> DbResult<Combo> {
        let components = sqlx::query_as::<_, ComponentRow>(
            "SELECT product_id, variant_id FROM combo_components WHERE combo_id = ?1",
        )
        .bind(&row.id)
        .fetch_all(&self.pool)
        .await?;

        let mut fixed_components = Vec::with_capacity(components.len());
        for component in components {
            fixed_components.push(self.resolve_reference(&component.product_id, &component.variant_id).await?);
        }

        let groups = sqlx::query_as::<_, ChoiceGroupRow>(
            "SELECT id, name, required FROM combo_choice_groups WHERE combo_id = ?1",
        )
        .bind(&row.id)
        .fetch_all(&self.pool)
        .await?;

        let mut choice_groups = Vec::with_capacity(groups.len());
        for group in groups {
            let options = sqlx::query_as::<_, ChoiceOptionRow>(
                r#"
                SELECT id, product_id, variant_id, price_adjustment_cents
                FROM combo_choice_options WHERE group_id = ?1
                "#,
            )
            .bind(&group.id)
            .fetch_all(&self.pool)
            .await?;

            let mut resolved = Vec::with_capacity(options.len());
            for option in options {
                resolved.push(ChoiceOption {
                    id: option.id,
                    sellable: self
                        .resolve_reference(&option.product_id, &option.variant_id)
                        .await?,
                    price_adjustment: Money::from_cents(option.price_adjustment_cents),
                });
            }

            choice_groups.push(ChoiceGroup {
                id: group.id,
                name: group.name,
                required: group.required,
                options: resolved,
            });
        }

        Ok(Combo {
            id: row.id,
            name: row.name,
            base_price: Money::from_cents(row.price_cents),
            fixed_components,
            choice_groups,
            is_available: row.is_available,
        })
    }

    /// Resolves a (product_id | variant_id) reference to a non-combo sellable.
    async fn resolve_reference(
        &self,
        product_id: &Option<String>,
        variant_id: &Option<String>,
    ) -> DbResult<Sellable> {
        if let Some(product_id) = product_id {
            let row = sqlx::query_as::<_, ProductRow>(
                r#"
                SELECT id, name, kind, price_cents, ingredient_id, cost_per_unit_milli,
                       is_available, is_active
                FROM products WHERE id = ?1
                "#,
            )
            .bind(product_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Product", product_id.clone()))?;

            return self.resolve_non_combo(row).await;
        }

        if let Some(variant_id) = variant_id {
            return self
                .load_variant_sellable(variant_id)
                .await?
                .ok_or_else(|| DbError::not_found("Variant", variant_id.clone()));
        }

        Err(DbError::QueryFailed(
            "combo reference has neither product nor variant".to_string(),
        ))
    }

    async fn product_recipe(&self, product_id: &str) -> DbResult<Vec<RecipeLine>> {
        let lines = sqlx::query_as::<_, RecipeLine>(
            r#"
            SELECT id, ingredient_id, quantity_needed_milli, unit
            FROM recipe_lines WHERE product_id = ?1
            "#,
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(lines)
    }

    async fn variant_recipe(&self, variant_id: &str) -> DbResult<Vec<RecipeLine>> {
        let lines = sqlx::query_as::<_, RecipeLine>(
            r#"
            SELECT id, ingredient_id, quantity_needed_milli, unit
            FROM recipe_lines WHERE variant_id = ?1
            "#,
        )
        .bind(variant_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(lines)
    }

    async fn product_variants(&self, product_id: &str) -> DbResult<Vec<VariantItem>> {
        let rows = sqlx::query_as::<_, VariantRow>(
            r#"
            SELECT id, name, price_cents, is_available
            FROM variants WHERE product_id = ?1 ORDER BY name
            "#,
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;

        let mut variants = Vec::with_capacity(rows.len());
        for row in rows {
            let recipe = self.variant_recipe(&row.id).await?;
            variants.push(VariantItem {
                id: row.id,
                name: row.name,
                price: Money::from_cents(row.price_cents),
                recipe,
                is_available: row.is_available,
            });
        }

        Ok(variants)
    }
}
