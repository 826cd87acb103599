//! # Error Types
//!
//! Domain-specific error types for mesa-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  mesa-core errors (this file)                                          │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  mesa-db errors (separate crate)                                       │
//! │  ├── DbError           - Database operation failures                   │
//! │  └── TransactionError  - Validation / Consistency / Db taxonomy        │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → TransactionError → caller         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (product name, amounts, ids)
//! 3. Errors are enum variants, never String
//! 4. Each error variant maps to a user-facing message

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These errors represent business rule violations or domain logic failures.
/// They should be caught and translated to user-friendly messages.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Sellable (product, variant, or combo) cannot be found.
    #[error("Sellable not found: {0}")]
    SellableNotFound(String),

    /// Ingredient cannot be found or is inactive.
    #[error("Ingredient not found: {0}")]
    IngredientNotFound(String),

    /// Insufficient stock to complete the sale.
    ///
    /// ## When This Occurs
    /// - Requested quantity exceeds the availability resolver's answer
    /// - Another terminal sold the last units between cart and checkout
    ///
    /// ## User Workflow
    /// ```text
    /// Add to cart (qty: 5)
    ///      │
    ///      ▼
    /// Resolve availability: 3
    ///      │
    ///      ▼
    /// InsufficientStock { name: "Tacos", available: 3, requested: 5 }
    ///      │
    ///      ▼
    /// UI shows: "Solo quedan 3 Tacos"
    /// ```
    #[error("Insufficient stock for {name}: available {available}, requested {requested}")]
    InsufficientStock {
        name: String,
        available: i64,
        requested: i64,
    },

    /// Sale not found.
    #[error("Sale not found: {0}")]
    SaleNotFound(String),

    /// Sale is not in a state that allows the requested operation.
    ///
    /// ## When This Occurs
    /// - Returning against a pending or cancelled sale
    /// - Completing a sale that is not pending
    /// - Cancelling a sale that already completed
    #[error("Sale {sale_id} is {current_status}, cannot perform operation")]
    InvalidSaleStatus {
        sale_id: String,
        current_status: String,
    },

    /// Sale has no lines.
    #[error("Sale must contain at least one line")]
    EmptySale,

    /// Sale has exceeded the maximum number of lines.
    #[error("Sale cannot have more than {max} lines")]
    TooManyLines { max: usize },

    /// Line quantity exceeds the maximum allowed.
    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: i64, max: i64 },

    /// Computed sale total would be negative.
    ///
    /// Discounts can never turn a ticket into a payout; the checkout rejects
    /// the whole sale rather than silently clamping.
    #[error("Sale total would be negative: {total_cents} cents")]
    NegativeTotal { total_cents: i64 },

    /// Sale total is below the configured order minimum.
    #[error("Order total {total_cents} cents is below minimum {minimum_cents} cents")]
    BelowMinimumOrder {
        total_cents: i64,
        minimum_cents: i64,
    },

    /// Return quantity exceeds what remains returnable on the line.
    ///
    /// Cumulative across all prior returns of the same sale, so two partial
    /// returns can never add up past the originally sold quantity.
    #[error(
        "Cannot return {requested} of {name}: only {returnable} of {sold} sold remain returnable"
    )]
    OverReturn {
        name: String,
        sold: i64,
        returnable: i64,
        requested: i64,
    },

    /// No open cash session for an operation that moves cash.
    #[error("No open cash session: {operation} requires an open register")]
    NoOpenCashSession { operation: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            name: "Tacos".to_string(),
            available: 3,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for Tacos: available 3, requested 5"
        );

        let err = CoreError::OverReturn {
            name: "Tacos".to_string(),
            sold: 3,
            returnable: 1,
            requested: 2,
        };
        assert_eq!(
            err.to_string(),
            "Cannot return 2 of Tacos: only 1 of 3 sold remain returnable"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "name".to_string(),
        };
        assert_eq!(err.to_string(), "name is required");

        let err = ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: 999,
        };
        assert_eq!(err.to_string(), "quantity must be between 1 and 999");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::MustBePositive {
            field: "unit_price".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
