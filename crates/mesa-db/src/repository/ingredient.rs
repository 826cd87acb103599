//! # Ingredient Repository
//!
//! Database operations for ingredient stock and the stock movement journal.
//!
//! ## Ledger Discipline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │               Every stock mutation goes through one gate                │
//! │                                                                         │
//! │  apply_movement_tx(conn, ingredient, delta, reason, ...)               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  UPDATE ingredients                                                    │
//! │     SET quantity_milli = quantity_milli + ?delta                       │
//! │   WHERE id = ? AND quantity_milli + ?delta >= 0                        │
//! │       │                                                                 │
//! │       ├── 0 rows → stock would go negative → caller rejects            │
//! │       │                                                                 │
//! │       └── 1 row  → INSERT INTO stock_movements (signed delta, cause)   │
//! │                                                                         │
//! │  The WHERE guard makes the check-and-debit a single atomic statement:  │
//! │  two concurrent checkouts of the last unit cannot both pass.           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The journal is append-only; replaying the signed deltas from zero always
//! reproduces the current `quantity_milli`.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use mesa_core::{Ingredient, StockLevels, StockMovement, StockQty};

/// Reason strings recorded in the stock movement journal.
pub const MOVEMENT_REASON_SALE: &str = "sale";
pub const MOVEMENT_REASON_SALE_CANCELLED: &str = "sale_cancelled";
pub const MOVEMENT_REASON_RETURN: &str = "return";
pub const MOVEMENT_REASON_RESTOCK: &str = "restock";
pub const MOVEMENT_REASON_ADJUSTMENT: &str = "adjustment";

/// Repository for ingredient database operations.
#[derive(Debug, Clone)]
pub struct IngredientRepository {
    pool: SqlitePool,
}

impl IngredientRepository {
    /// Creates a new IngredientRepository.
    pub fn new(pool: SqlitePool) -> Self {
        IngredientRepository { pool }
    }

    /// Inserts a new ingredient.
    pub async fn insert(&self, ingredient: &Ingredient) -> DbResult<()> {
        debug!(id = %ingredient.id, name = %ingredient.name, "Inserting ingredient");

        sqlx::query(
            r#"
            INSERT INTO ingredients (
                id, name, unit,
                quantity_milli, min_quantity_milli, max_quantity_milli,
                unit_cost_cents, expires_at, is_active,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(&ingredient.id)
        .bind(&ingredient.name)
        .bind(&ingredient.unit)
        .bind(ingredient.quantity_milli)
        .bind(ingredient.min_quantity_milli)
        .bind(ingredient.max_quantity_milli)
        .bind(ingredient.unit_cost_cents)
        .bind(ingredient.expires_at)
        .bind(ingredient.is_active)
        .bind(ingredient.created_at)
        .bind(ingredient.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets an ingredient by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Ingredient>> {
        let ingredient = sqlx::query_as::<_, Ingredient>(
            "SELECT * FROM ingredients WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(ingredient)
    }

    /// Lists active ingredients, name order.
    pub async fn list_active(&self) -> DbResult<Vec<Ingredient>> {
        let ingredients = sqlx::query_as::<_, Ingredient>(
            "SELECT * FROM ingredients WHERE is_active = 1 ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(ingredients)
    }

    /// Active ingredients at or below their reorder threshold.
    pub async fn list_below_minimum(&self) -> DbResult<Vec<Ingredient>> {
        let ingredients = sqlx::query_as::<_, Ingredient>(
            r#"
            SELECT * FROM ingredients
            WHERE is_active = 1 AND quantity_milli <= min_quantity_milli
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(ingredients)
    }

    /// Snapshot of effective stock for the availability resolver.
    ///
    /// Inactive ingredients are omitted, so the resolver reads them as zero.
    pub async fn stock_levels(&self) -> DbResult<StockLevels> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            "SELECT id, quantity_milli FROM ingredients WHERE is_active = 1",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, milli)| (id, StockQty::from_milli(milli)))
            .collect())
    }

    /// Same snapshot, re-read inside an open transaction.
    pub async fn stock_levels_tx(conn: &mut SqliteConnection) -> DbResult<StockLevels> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            "SELECT id, quantity_milli FROM ingredients WHERE is_active = 1",
        )
        .fetch_all(&mut *conn)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, milli)| (id, StockQty::from_milli(milli)))
            .collect())
    }

    /// Applies one signed stock movement inside an open transaction.
    ///
    /// Returns `false` without writing anything if the debit would drive the
    /// stock negative; the caller decides how to surface that. On success the
    /// ingredient row is updated and a journal row is written atomically with
    /// the rest of the transaction.
    pub async fn apply_movement_tx(
        conn: &mut SqliteConnection,
        ingredient_id: &str,
        delta: StockQty,
        reason: &str,
        sale_id: Option<&str>,
        return_id: Option<&str>,
    ) -> DbResult<bool> {
        let now = Utc::now();
        let delta_milli = delta.milli();

        // Guarded in SQL so the read-check-write is one atomic statement.
        let result = sqlx::query(
            r#"
            UPDATE ingredients
            SET quantity_milli = quantity_milli + ?2,
                updated_at = ?3
            WHERE id = ?1
              AND is_active = 1
              AND quantity_milli + ?2 >= 0
            "#,
        )
        .bind(ingredient_id)
        .bind(delta_milli)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            debug!(
                ingredient_id = %ingredient_id,
                delta_milli,
                "Stock movement rejected (missing ingredient or would go negative)"
            );
            return Ok(false);
        }

        sqlx::query(
            r#"
            INSERT INTO stock_movements (
                id, ingredient_id, delta_milli, reason, sale_id, return_id, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(ingredient_id)
        .bind(delta_milli)
        .bind(reason)
        .bind(sale_id)
        .bind(return_id)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        Ok(true)
    }

    /// Restocks an ingredient (delivery received). Own transaction.
    pub async fn restock(&self, ingredient_id: &str, qty: StockQty) -> DbResult<()> {
        if !qty.is_positive() {
            return Err(DbError::QueryFailed(
                "restock quantity must be positive".to_string(),
            ));
        }

        let mut tx = self.pool.begin().await?;
        let applied = Self::apply_movement_tx(
            tx.as_mut(),
            ingredient_id,
            qty,
            MOVEMENT_REASON_RESTOCK,
            None,
            None,
        )
        .await?;
        if !applied {
            return Err(DbError::not_found("Ingredient", ingredient_id));
        }
        tx.commit().await?;

        Ok(())
    }

    /// Manual correction (count discrepancy). Signed delta, own transaction.
    pub async fn adjust(&self, ingredient_id: &str, delta: StockQty) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;
        let applied = Self::apply_movement_tx(
            tx.as_mut(),
            ingredient_id,
            delta,
            MOVEMENT_REASON_ADJUSTMENT,
            None,
            None,
        )
        .await?;
        if !applied {
            return Err(DbError::QueryFailed(format!(
                "adjustment of {} on {} rejected",
                delta, ingredient_id
            )));
        }
        tx.commit().await?;

        Ok(())
    }

    /// Soft-deletes an ingredient. History referencing it stays intact.
    pub async fn deactivate(&self, ingredient_id: &str) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE ingredients SET is_active = 0, updated_at = ?2 WHERE id = ?1",
        )
        .bind(ingredient_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Ingredient", ingredient_id));
        }

        Ok(())
    }

    /// Journal entries for one ingredient, newest first.
    pub async fn movements(&self, ingredient_id: &str) -> DbResult<Vec<StockMovement>> {
        let movements = sqlx::query_as::<_, StockMovement>(
            r#"
            SELECT * FROM stock_movements
            WHERE ingredient_id = ?1
            ORDER BY created_at DESC
            "#,
        )
        .bind(ingredient_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(movements)
    }

    /// Journal entries caused by one sale.
    pub async fn movements_for_sale(&self, sale_id: &str) -> DbResult<Vec<StockMovement>> {
        let movements = sqlx::query_as::<_, StockMovement>(
            "SELECT * FROM stock_movements WHERE sale_id = ?1 ORDER BY created_at",
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(movements)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::fixture;

    #[tokio::test]
    async fn test_guard_rejects_overdraft_without_writing() {
        let f = fixture().await;
        let repo = f.db.ingredients();

        let mut tx = f.db.pool().begin().await.unwrap();
        let applied = IngredientRepository::apply_movement_tx(
            tx.as_mut(),
            &f.refresco,
            StockQty::from_milli(-4_000), // only 3 in stock
            MOVEMENT_REASON_SALE,
            None,
            None,
        )
        .await
        .unwrap();
        tx.commit().await.unwrap();

        assert!(!applied);
        assert_eq!(f.stock_milli(&f.refresco).await, 3_000);
        assert!(repo.movements(&f.refresco).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_debit_to_exactly_zero_is_allowed() {
        let f = fixture().await;

        let mut tx = f.db.pool().begin().await.unwrap();
        let applied = IngredientRepository::apply_movement_tx(
            tx.as_mut(),
            &f.refresco,
            StockQty::from_milli(-3_000),
            MOVEMENT_REASON_SALE,
            None,
            None,
        )
        .await
        .unwrap();
        tx.commit().await.unwrap();

        assert!(applied);
        assert_eq!(f.stock_milli(&f.refresco).await, 0);
    }

    #[tokio::test]
    async fn test_journal_replays_to_current_stock() {
        let f = fixture().await;
        let repo = f.db.ingredients();

        repo.restock(&f.papa, StockQty::from_milli(2_000)).await.unwrap();
        repo.adjust(&f.papa, StockQty::from_milli(-500)).await.unwrap();

        let movements = repo.movements(&f.papa).await.unwrap();
        let replayed: i64 = movements.iter().map(|m| m.delta_milli).sum();
        assert_eq!(4_000 + replayed, f.stock_milli(&f.papa).await);
        assert_eq!(f.stock_milli(&f.papa).await, 5_500);
    }

    #[tokio::test]
    async fn test_deactivated_ingredient_rejects_movements() {
        let f = fixture().await;
        let repo = f.db.ingredients();

        repo.deactivate(&f.papa).await.unwrap();

        let err = repo.restock(&f.papa, StockQty::from_milli(1_000)).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_below_minimum_listing() {
        let f = fixture().await;
        let repo = f.db.ingredients();

        let mut low = crate::testutil::ingredient("Limón", "kg", 500);
        low.min_quantity_milli = 1_000;
        repo.insert(&low).await.unwrap();

        let below = repo.list_below_minimum().await.unwrap();
        assert_eq!(below.len(), 1);
        assert_eq!(below[0].name, "Limón");
    }
}
