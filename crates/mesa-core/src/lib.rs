//! # mesa-core: Pure Business Logic for Mesa POS
//!
//! The heart of the restaurant POS: every transactional rule lives here as a
//! pure function with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  Calling surfaces (admin screens, digital menu, kitchen display)    │
//! └──────────────────────────────┬──────────────────────────────────────┘
//!                                │
//! ┌──────────────────────────────▼──────────────────────────────────────┐
//! │                    ★ mesa-core (THIS CRATE) ★                       │
//! │                                                                     │
//! │   money · quantity · types · availability · cart · session · error  │
//! │                                                                     │
//! │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS                │
//! └──────────────────────────────┬──────────────────────────────────────┘
//!                                │
//! ┌──────────────────────────────▼──────────────────────────────────────┐
//! │              mesa-db: SQLite storage + transaction services         │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Ingredient, Sale, Return, CashEntry, ...)
//! - [`money`] - Money type with integer cent arithmetic (no floating point!)
//! - [`quantity`] - Fixed-point ingredient quantities (three fractional digits)
//! - [`availability`] - Sellable shapes and the availability resolver
//! - [`cart`] - Cart totals from caller-supplied unit prices
//! - [`session`] - Cash-register session guard
//! - [`validation`] - Business rule validation
//! - [`error`] - Domain error types
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: same input = same output, always
//! 2. **No I/O**: database, network, file system access is FORBIDDEN here
//! 3. **Integer Arithmetic**: cents for money, milli-units for stock
//! 4. **Explicit Errors**: all errors are typed, never strings or panics

pub mod availability;
pub mod cart;
pub mod error;
pub mod money;
pub mod quantity;
pub mod session;
pub mod types;
pub mod validation;

pub use availability::{Sellable, StockLevels, UNLIMITED_AVAILABILITY};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use quantity::StockQty;
pub use types::*;

/// Maximum quantity of a single sale line.
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10).
/// Deliberately below [`UNLIMITED_AVAILABILITY`] so the no-recipe sentinel
/// can never be reached by a valid order.
pub const MAX_LINE_QUANTITY: i64 = 999;

/// Maximum number of lines in a single sale.
pub const MAX_SALE_LINES: usize = 100;
