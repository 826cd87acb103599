//! # mesa-db: Database Layer for Mesa POS
//!
//! This crate provides database access and the transactional services for
//! the Mesa POS system. It uses SQLite for local storage with sqlx for async
//! operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Mesa POS Data Flow                               │
//! │                                                                         │
//! │  Caller (admin screen, digital menu, kitchen display)                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     mesa-db (THIS CRATE)                        │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────────┐   ┌───────────────┐   ┌──────────────────┐ │   │
//! │  │   │   Database   │   │  Repositories │   │     Services     │ │   │
//! │  │   │   (pool.rs)  │   │ (ingredient,  │   │ (checkout,       │ │   │
//! │  │   │              │◄──│  catalog,     │◄──│  refund,         │ │   │
//! │  │   │  SqlitePool  │   │  sale, ...)   │   │  availability)   │ │   │
//! │  │   └──────────────┘   └───────────────┘   └──────────────────┘ │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database (WAL mode, embedded migrations)                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//! - [`service`] - Transactional checkout / refund / availability
//!
//! ## Usage
//!
//! ```rust,ignore
//! use mesa_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/mesa.db")).await?;
//!
//! let menu = db.availability().menu().await?;
//! let sale = db.checkout().checkout(request).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod service;

#[cfg(test)]
pub(crate) mod testutil;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::DbError;
pub use pool::{Database, DbConfig};

pub use repository::{
    CashRepository, CatalogRepository, IngredientRepository, ReturnRepository, SaleRepository,
    SessionRepository, TableRepository,
};
pub use service::checkout::{CheckoutRequest, LineRequest};
pub use service::refund::{ReturnLineRequest, ReturnRequest};
pub use service::{AvailabilityService, CheckoutService, RefundService, TransactionError};
