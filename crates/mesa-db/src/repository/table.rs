//! # Dining Table Repository
//!
//! Table occupancy state linked from dine-in sales. Occupancy ownership
//! lives with the floor collaborator; checkout only links and releases.

use sqlx::{SqliteConnection, SqlitePool};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use mesa_core::DiningTable;

/// Repository for dining table operations.
#[derive(Debug, Clone)]
pub struct TableRepository {
    pool: SqlitePool,
}

impl TableRepository {
    /// Creates a new TableRepository.
    pub fn new(pool: SqlitePool) -> Self {
        TableRepository { pool }
    }

    /// Inserts a table. Returns the new ID.
    pub async fn insert(&self, name: &str) -> DbResult<String> {
        let id = Uuid::new_v4().to_string();

        sqlx::query(
            "INSERT INTO dining_tables (id, name, is_occupied, current_sale_id) VALUES (?1, ?2, 0, NULL)",
        )
        .bind(&id)
        .bind(name)
        .execute(&self.pool)
        .await?;

        Ok(id)
    }

    /// Gets a table by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<DiningTable>> {
        let table = sqlx::query_as::<_, DiningTable>("SELECT * FROM dining_tables WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(table)
    }

    /// Lists all tables, name order.
    pub async fn list(&self) -> DbResult<Vec<DiningTable>> {
        let tables = sqlx::query_as::<_, DiningTable>("SELECT * FROM dining_tables ORDER BY name")
            .fetch_all(&self.pool)
            .await?;

        Ok(tables)
    }

    /// Marks a table occupied by a sale, inside the checkout transaction.
    pub async fn occupy_tx(
        conn: &mut SqliteConnection,
        table_id: &str,
        sale_id: &str,
    ) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE dining_tables SET is_occupied = 1, current_sale_id = ?2 WHERE id = ?1",
        )
        .bind(table_id)
        .bind(sale_id)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Table", table_id));
        }

        Ok(())
    }

    /// Releases a table when its sale closes.
    pub async fn release(&self, table_id: &str) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE dining_tables SET is_occupied = 0, current_sale_id = NULL WHERE id = ?1",
        )
        .bind(table_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Table", table_id));
        }

        Ok(())
    }
}
