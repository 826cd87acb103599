//! # Cash Session Repository
//!
//! Register session state the checkout and refund services consult. The
//! session lifecycle itself (who opens, counts, closes) is owned by the
//! register collaborator; this repository only persists and reads it.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use mesa_core::CashSession;

/// Repository for cash session operations.
#[derive(Debug, Clone)]
pub struct SessionRepository {
    pool: SqlitePool,
}

impl SessionRepository {
    /// Creates a new SessionRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SessionRepository { pool }
    }

    /// Opens a session for a user. At most one open session per user.
    pub async fn open(&self, user_id: &str) -> DbResult<CashSession> {
        if let Some(existing) = self.current_open(user_id).await? {
            return Err(DbError::UniqueViolation {
                field: "cash_sessions.user_id".to_string(),
                value: existing.user_id,
            });
        }

        let session = CashSession {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            opened_at: Utc::now(),
            closed_at: None,
        };

        debug!(id = %session.id, user_id = %user_id, "Opening cash session");

        sqlx::query(
            "INSERT INTO cash_sessions (id, user_id, opened_at, closed_at) VALUES (?1, ?2, ?3, NULL)",
        )
        .bind(&session.id)
        .bind(&session.user_id)
        .bind(session.opened_at)
        .execute(&self.pool)
        .await?;

        Ok(session)
    }

    /// Closes an open session.
    pub async fn close(&self, session_id: &str) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE cash_sessions SET closed_at = ?2 WHERE id = ?1 AND closed_at IS NULL",
        )
        .bind(session_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Cash session (open)", session_id));
        }

        Ok(())
    }

    /// The user's currently open session, if any.
    pub async fn current_open(&self, user_id: &str) -> DbResult<Option<CashSession>> {
        let session = sqlx::query_as::<_, CashSession>(
            r#"
            SELECT * FROM cash_sessions
            WHERE user_id = ?1 AND closed_at IS NULL
            ORDER BY opened_at DESC LIMIT 1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(session)
    }

    /// Gets a session by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<CashSession>> {
        let session = sqlx::query_as::<_, CashSession>("SELECT * FROM cash_sessions WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(session)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
