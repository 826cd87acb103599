//! # Return Repository
//!
//! Database operations for returns and return lines.
//!
//! ## The Return Cap
//! The quantity already returned against each sale line is the SUM over all
//! *completed* returns of that sale. The refund service reads that sum inside
//! its write transaction and rejects any line that would push the cumulative
//! total past the quantity originally sold.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use std::collections::HashMap;
use tracing::debug;

use crate::error::DbResult;
use mesa_core::{Money, ReturnLine, SaleReturn};

/// Repository for return database operations.
#[derive(Debug, Clone)]
pub struct ReturnRepository {
    pool: SqlitePool,
}

impl ReturnRepository {
    /// Creates a new ReturnRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ReturnRepository { pool }
    }

    /// Gets a return by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<SaleReturn>> {
        let ret = sqlx::query_as::<_, SaleReturn>("SELECT * FROM returns WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(ret)
    }

    /// Gets all lines for a return.
    pub async fn get_lines(&self, return_id: &str) -> DbResult<Vec<ReturnLine>> {
        let lines = sqlx::query_as::<_, ReturnLine>(
            "SELECT * FROM return_lines WHERE return_id = ?1 ORDER BY created_at, id",
        )
        .bind(return_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(lines)
    }

    /// All returns against one sale, oldest first.
    pub async fn list_for_sale(&self, sale_id: &str) -> DbResult<Vec<SaleReturn>> {
        let returns = sqlx::query_as::<_, SaleReturn>(
            "SELECT * FROM returns WHERE sale_id = ?1 ORDER BY created_at",
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(returns)
    }

    /// Quantity already returned per sale line, summed over completed
    /// returns of the sale. Read inside the refund transaction so the cap
    /// is enforced against a consistent view.
    pub async fn returned_quantities_tx(
        conn: &mut SqliteConnection,
        sale_id: &str,
    ) -> DbResult<HashMap<String, i64>> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            r#"
            SELECT rl.sale_line_id, SUM(rl.quantity)
            FROM return_lines rl
            JOIN returns r ON r.id = rl.return_id
            WHERE r.sale_id = ?1 AND r.status = 'completed'
            GROUP BY rl.sale_line_id
            "#,
        )
        .bind(sale_id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(rows.into_iter().collect())
    }

    /// Discount and tax already refunded against one sale, summed over its
    /// completed returns. The refund service clamps each new share to what
    /// remains of the charged amounts.
    pub async fn refunded_shares_tx(
        conn: &mut SqliteConnection,
        sale_id: &str,
    ) -> DbResult<(Money, Money)> {
        let (discount, tax): (i64, i64) = sqlx::query_as(
            r#"
            SELECT COALESCE(SUM(discount_cents), 0), COALESCE(SUM(tax_cents), 0)
            FROM returns
            WHERE sale_id = ?1 AND status = 'completed'
            "#,
        )
        .bind(sale_id)
        .fetch_one(&mut *conn)
        .await?;

        Ok((Money::from_cents(discount), Money::from_cents(tax)))
    }

    /// Generates the next day-scoped return number inside the write
    /// transaction. Format: `D<YYYYMMDD><4-digit sequence>`.
    pub async fn next_return_number_tx(conn: &mut SqliteConnection) -> DbResult<String> {
        let date_part = Utc::now().format("%Y%m%d").to_string();
        let scope = format!("D{}%", date_part);

        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM returns WHERE return_number LIKE ?1")
                .bind(&scope)
                .fetch_one(&mut *conn)
                .await?;

        Ok(format!("D{}{:04}", date_part, count + 1))
    }

    /// Inserts a return row inside an open transaction.
    pub async fn insert_tx(conn: &mut SqliteConnection, ret: &SaleReturn) -> DbResult<()> {
        debug!(id = %ret.id, return_number = %ret.return_number, "Inserting return");

        sqlx::query(
            r#"
            INSERT INTO returns (
                id, sale_id, return_number, kind, status, reason, refund_method,
                subtotal_cents, discount_cents, tax_cents, total_cents,
                inventory_restored, cash_adjusted,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
            "#,
        )
        .bind(&ret.id)
        .bind(&ret.sale_id)
        .bind(&ret.return_number)
        .bind(ret.kind)
        .bind(ret.status)
        .bind(&ret.reason)
        .bind(ret.refund_method)
        .bind(ret.subtotal_cents)
        .bind(ret.discount_cents)
        .bind(ret.tax_cents)
        .bind(ret.total_cents)
        .bind(ret.inventory_restored)
        .bind(ret.cash_adjusted)
        .bind(ret.created_at)
        .bind(ret.updated_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Inserts a return line inside an open transaction.
    pub async fn insert_line_tx(conn: &mut SqliteConnection, line: &ReturnLine) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO return_lines (
                id, return_id, sale_line_id, quantity, unit_price_cents, total_cents, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&line.id)
        .bind(&line.return_id)
        .bind(&line.sale_line_id)
        .bind(line.quantity)
        .bind(line.unit_price_cents)
        .bind(line.total_cents)
        .bind(line.created_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }
}
