//! # Repository Module
//!
//! Database repository implementations for Mesa POS.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern Explained                         │
//! │                                                                         │
//! │  The Repository pattern abstracts database access behind a clean API.  │
//! │                                                                         │
//! │  Service / caller                                                       │
//! │       │                                                                 │
//! │       │  db.ingredients().stock_levels()                                │
//! │       │  ↓                                                              │
//! │       ▼                                                                 │
//! │  IngredientRepository                                                  │
//! │  ├── stock_levels(&self)                                               │
//! │  ├── apply_movement_tx(conn, ...)                                      │
//! │  ├── restock(&self, id, qty)                                           │
//! │  └── movements(&self, id)                                              │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  `*_tx` methods take an open connection so the transaction services    │
//! │  can compose them into one atomic commit.                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`IngredientRepository`] - Stock levels and the movement journal
//! - [`CatalogRepository`] - Products, variants, recipes, combos
//! - [`SaleRepository`] - Sales and sale lines
//! - [`ReturnRepository`] - Returns and return lines
//! - [`CashRepository`] - Append-only cash ledger
//! - [`SessionRepository`] - Cash register sessions
//! - [`TableRepository`] - Dining table occupancy

pub mod cash;
pub mod catalog;
pub mod ingredient;
pub mod returns;
pub mod sale;
pub mod session;
pub mod table;

pub use cash::CashRepository;
pub use catalog::CatalogRepository;
pub use ingredient::IngredientRepository;
pub use returns::ReturnRepository;
pub use sale::SaleRepository;
pub use session::SessionRepository;
pub use table::TableRepository;
