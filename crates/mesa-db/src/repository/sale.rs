//! # Sale Repository
//!
//! Database operations for sales and sale lines.
//!
//! ## Sale Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sale Lifecycle                                    │
//! │                                                                         │
//! │  Counter / table checkout                                              │
//! │     └── one transaction → Sale { status: Completed } + lines +         │
//! │         stock debits + cash inflow                                     │
//! │                                                                         │
//! │  Digital-menu order                                                    │
//! │     └── one transaction → Sale { status: Pending } + lines +           │
//! │         stock debits (reserved)                                        │
//! │         ├── complete_sale() → Completed + cash inflow                  │
//! │         └── cancel_sale()   → Cancelled + stock credited back          │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All lifecycle writes happen inside transactions owned by the checkout
//! service; this repository supplies the statements plus pool-based reads.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use mesa_core::{Sale, SaleChannel, SaleLine, SaleStatus};

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Gets a sale by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Sale>> {
        let sale = sqlx::query_as::<_, Sale>("SELECT * FROM sales WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(sale)
    }

    /// Gets a sale by its human-readable number.
    pub async fn get_by_number(&self, sale_number: &str) -> DbResult<Option<Sale>> {
        let sale = sqlx::query_as::<_, Sale>("SELECT * FROM sales WHERE sale_number = ?1")
            .bind(sale_number)
            .fetch_optional(&self.pool)
            .await?;

        Ok(sale)
    }

    /// Gets all lines for a sale, insertion order.
    pub async fn get_lines(&self, sale_id: &str) -> DbResult<Vec<SaleLine>> {
        let lines = sqlx::query_as::<_, SaleLine>(
            "SELECT * FROM sale_lines WHERE sale_id = ?1 ORDER BY created_at, id",
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(lines)
    }

    /// Lists sales in a status, newest first (kitchen pending queue).
    pub async fn list_by_status(&self, status: SaleStatus) -> DbResult<Vec<Sale>> {
        let sales = sqlx::query_as::<_, Sale>(
            "SELECT * FROM sales WHERE status = ?1 ORDER BY created_at DESC",
        )
        .bind(status)
        .fetch_all(&self.pool)
        .await?;

        Ok(sales)
    }

    /// Same lookup inside an open transaction.
    pub async fn get_by_id_tx(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Sale>> {
        let sale = sqlx::query_as::<_, Sale>("SELECT * FROM sales WHERE id = ?1")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

        Ok(sale)
    }

    pub async fn get_lines_tx(
        conn: &mut SqliteConnection,
        sale_id: &str,
    ) -> DbResult<Vec<SaleLine>> {
        let lines = sqlx::query_as::<_, SaleLine>(
            "SELECT * FROM sale_lines WHERE sale_id = ?1 ORDER BY created_at, id",
        )
        .bind(sale_id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(lines)
    }

    /// Generates the next day-scoped sale number inside the write transaction.
    ///
    /// ## Format
    /// `<channel prefix><YYYYMMDD><4-digit sequence>`, e.g. `V202608260012`.
    ///
    /// The COUNT runs in the same serialized SQLite write transaction as the
    /// INSERT, and the UNIQUE index on `sale_number` backstops any race a
    /// different journal mode could introduce.
    pub async fn next_sale_number_tx(
        conn: &mut SqliteConnection,
        channel: SaleChannel,
    ) -> DbResult<String> {
        let date_part = Utc::now().format("%Y%m%d").to_string();
        let scope = format!("{}{}%", channel.prefix(), date_part);

        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM sales WHERE sale_number LIKE ?1")
                .bind(&scope)
                .fetch_one(&mut *conn)
                .await?;

        Ok(format!("{}{}{:04}", channel.prefix(), date_part, count + 1))
    }

    /// Inserts a sale row inside an open transaction.
    pub async fn insert_tx(conn: &mut SqliteConnection, sale: &Sale) -> DbResult<()> {
        debug!(id = %sale.id, sale_number = %sale.sale_number, "Inserting sale");

        sqlx::query(
            r#"
            INSERT INTO sales (
                id, sale_number, channel, status, payment_method,
                subtotal_cents, discount_cents, tax_cents, total_cents,
                cash_session_id, table_id, customer_name, notes,
                created_at, updated_at, completed_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)
            "#,
        )
        .bind(&sale.id)
        .bind(&sale.sale_number)
        .bind(sale.channel)
        .bind(sale.status)
        .bind(sale.payment_method)
        .bind(sale.subtotal_cents)
        .bind(sale.discount_cents)
        .bind(sale.tax_cents)
        .bind(sale.total_cents)
        .bind(&sale.cash_session_id)
        .bind(&sale.table_id)
        .bind(&sale.customer_name)
        .bind(&sale.notes)
        .bind(sale.created_at)
        .bind(sale.updated_at)
        .bind(sale.completed_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Inserts a sale line inside an open transaction.
    ///
    /// ## Snapshot Pattern
    /// Name and unit price are copied onto the line; catalog edits after the
    /// sale never reprice history.
    pub async fn insert_line_tx(conn: &mut SqliteConnection, line: &SaleLine) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO sale_lines (
                id, sale_id, product_id, variant_id, kind,
                name_snapshot, quantity, unit_price_cents, total_price_cents,
                created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&line.id)
        .bind(&line.sale_id)
        .bind(&line.product_id)
        .bind(&line.variant_id)
        .bind(line.kind)
        .bind(&line.name_snapshot)
        .bind(line.quantity)
        .bind(line.unit_price_cents)
        .bind(line.total_price_cents)
        .bind(line.created_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Moves a pending sale to completed inside an open transaction.
    ///
    /// The status predicate in the WHERE makes the transition atomic: a sale
    /// already completed or cancelled is left untouched and reported.
    pub async fn mark_completed_tx(conn: &mut SqliteConnection, sale_id: &str) -> DbResult<()> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE sales SET
                status = 'completed',
                completed_at = ?2,
                updated_at = ?2
            WHERE id = ?1 AND status = 'pending'
            "#,
        )
        .bind(sale_id)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Sale (pending)", sale_id));
        }

        Ok(())
    }

    /// Moves a pending sale to cancelled inside an open transaction.
    pub async fn mark_cancelled_tx(conn: &mut SqliteConnection, sale_id: &str) -> DbResult<()> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE sales SET
                status = 'cancelled',
                updated_at = ?2
            WHERE id = ?1 AND status = 'pending'
            "#,
        )
        .bind(sale_id)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Sale (pending)", sale_id));
        }

        Ok(())
    }
}
