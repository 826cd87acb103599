//! # Cash Session Guard
//!
//! Decides whether an operation that moves cash may proceed, given a
//! snapshot of the register state.
//!
//! ## Decision Table
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  operation            channel / role          session    verdict       │
//! │  ──────────────────   ───────────────────     ────────   ───────────   │
//! │  checkout             dine-in / takeout       open       allow         │
//! │  checkout             dine-in / takeout       closed     REJECT        │
//! │  checkout             digital menu            any        allow         │
//! │  checkout             kitchen staff           any        allow         │
//! │  refund               any                     open       allow         │
//! │  refund               any                     closed     REJECT        │
//! │  manual cash entry    any                     open       allow         │
//! │  manual cash entry    any                     closed     REJECT        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The guard never looks anything up: callers load the current session (if
//! any) and hand it in, so the same check is testable without a database and
//! runs identically inside a checkout transaction.

use crate::error::{CoreError, CoreResult};
use crate::types::{CashSession, SaleChannel, StaffRole};

/// Guards a checkout against a closed register.
///
/// Digital-menu sales collect no cash at creation, and kitchen staff never
/// touch the drawer, so both bypass the session requirement.
pub fn ensure_session_for_sale(
    channel: SaleChannel,
    role: StaffRole,
    session: Option<&CashSession>,
) -> CoreResult<()> {
    if !channel.requires_cash_session() || !role.requires_cash_session() {
        return Ok(());
    }
    ensure_open(session, "checkout")
}

/// Guards a cash refund. Refunds always pull from the drawer, so there is
/// no channel or role bypass.
pub fn ensure_session_for_refund(session: Option<&CashSession>) -> CoreResult<()> {
    ensure_open(session, "refund")
}

/// Guards a manual cash movement (drawer in/out).
pub fn ensure_session_for_cash_entry(session: Option<&CashSession>) -> CoreResult<()> {
    ensure_open(session, "cash entry")
}

fn ensure_open(session: Option<&CashSession>, operation: &str) -> CoreResult<()> {
    match session {
        Some(session) if session.is_open() => Ok(()),
        _ => Err(CoreError::NoOpenCashSession {
            operation: operation.to_string(),
        }),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
