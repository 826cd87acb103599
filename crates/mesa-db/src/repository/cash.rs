//! # Cash Ledger Repository
//!
//! Append-only cash ledger: inflows from completed sales, outflows from
//! completed returns, plus manual drawer movements.
//!
//! Entries are never updated or deleted; a correction is a new offsetting
//! entry. Daily totals are reproducible from the rows alone.

use chrono::{NaiveDate, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use mesa_core::{CashDirection, CashEntry, Money};

/// Repository for cash ledger operations.
#[derive(Debug, Clone)]
pub struct CashRepository {
    pool: SqlitePool,
}

impl CashRepository {
    /// Creates a new CashRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CashRepository { pool }
    }

    /// Builds a ledger entry for insertion.
    pub fn new_entry(
        direction: CashDirection,
        category: &str,
        amount: Money,
        sale_id: Option<&str>,
        description: &str,
    ) -> CashEntry {
        let now = Utc::now();
        CashEntry {
            id: Uuid::new_v4().to_string(),
            direction,
            category: category.to_string(),
            amount_cents: amount.cents(),
            sale_id: sale_id.map(str::to_string),
            description: description.to_string(),
            effective_date: now.date_naive(),
            created_at: now,
        }
    }

    /// Inserts a ledger entry inside an open transaction.
    ///
    /// The `amount_cents > 0` CHECK rejects zero or negative amounts at the
    /// schema level; direction carries the sign.
    pub async fn insert_tx(conn: &mut SqliteConnection, entry: &CashEntry) -> DbResult<()> {
        debug!(
            id = %entry.id,
            direction = ?entry.direction,
            amount_cents = entry.amount_cents,
            "Inserting cash entry"
        );

        sqlx::query(
            r#"
            INSERT INTO cash_entries (
                id, direction, category, amount_cents, sale_id, description,
                effective_date, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&entry.id)
        .bind(entry.direction)
        .bind(&entry.category)
        .bind(entry.amount_cents)
        .bind(&entry.sale_id)
        .bind(&entry.description)
        .bind(entry.effective_date)
        .bind(entry.created_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Inserts a manual drawer movement in its own transaction.
    pub async fn insert(&self, entry: &CashEntry) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;
        Self::insert_tx(tx.as_mut(), entry).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Ledger entries linked to one sale (its inflow plus any return
    /// outflows), oldest first.
    pub async fn entries_for_sale(&self, sale_id: &str) -> DbResult<Vec<CashEntry>> {
        let entries = sqlx::query_as::<_, CashEntry>(
            "SELECT * FROM cash_entries WHERE sale_id = ?1 ORDER BY created_at",
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    /// All entries for one effective date.
    pub async fn entries_for_date(&self, date: NaiveDate) -> DbResult<Vec<CashEntry>> {
        let entries = sqlx::query_as::<_, CashEntry>(
            "SELECT * FROM cash_entries WHERE effective_date = ?1 ORDER BY created_at",
        )
        .bind(date)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    /// Net cash position for one day: inflows minus outflows.
    pub async fn daily_net(&self, date: NaiveDate) -> DbResult<Money> {
        let net: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(
                CASE direction WHEN 'inflow' THEN amount_cents ELSE -amount_cents END
            ), 0)
            FROM cash_entries WHERE effective_date = ?1
            "#,
        )
        .bind(date)
        .fetch_one(&self.pool)
        .await?;

        Ok(Money::from_cents(net))
    }
}
