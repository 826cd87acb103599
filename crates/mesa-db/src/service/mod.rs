//! # Transaction Services
//!
//! Orchestration of multi-table writes: each checkout and each refund is one
//! SQLite transaction that either fully commits or leaves no trace.
//!
//! ## Error Taxonomy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  TransactionError                                                       │
//! │  ├── Validation   - the request broke a business rule; nothing was     │
//! │  │                  written; the caller can fix the request            │
//! │  ├── Consistency  - stored data contradicts an invariant (duplicate    │
//! │  │                  number, vanished row mid-transaction); the         │
//! │  │                  transaction rolled back; needs operator attention  │
//! │  └── Db           - infrastructure failure (connection, constraint,   │
//! │                     migration); the transaction rolled back            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use crate::error::DbError;
use mesa_core::CoreError;

pub mod availability;
pub mod checkout;
pub mod refund;

pub use availability::AvailabilityService;
pub use checkout::CheckoutService;
pub use refund::RefundService;

/// Errors surfaced by the transaction services.
#[derive(Debug, Error)]
pub enum TransactionError {
    /// Business rule violation; the request itself is at fault.
    #[error(transparent)]
    Validation(#[from] CoreError),

    /// Stored state contradicts an invariant the service relies on.
    #[error("Consistency violation: {0}")]
    Consistency(String),

    /// Underlying database failure.
    #[error(transparent)]
    Db(#[from] DbError),
}

/// Result type for transaction services.
pub type TxResult<T> = Result<T, TransactionError>;
