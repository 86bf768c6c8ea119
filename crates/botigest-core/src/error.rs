//! # Error Types
//!
//! Domain-specific error types for botigest-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  botigest-core errors (this file)                                      │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  botigest-db errors (separate crate)                                   │
//! │  └── StoreError       - NotFound / State / Conflict / Persistence      │
//! │                                                                         │
//! │  botigest-bot errors (separate crate)                                  │
//! │  └── BotError         - Transport + store failures                     │
//! │                                                                         │
//! │  Flow: ValidationError → StoreError → BotError → user-facing message   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (field, bounds, value)
//! 3. Errors are enum variants, never String
//! 4. Validation errors are raised BEFORE any write happens

use thiserror::Error;

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when input doesn't meet business requirements.
/// They are detected before touching the store: if one is returned,
/// nothing has been persisted.
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

    /// Value must be positive (> 0).
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative (>= 0).
    #[error("{field} must not be negative")]
    MustBeNonNegative { field: String },

    /// Invalid format (e.g., price value that isn't a number).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Applying the operation would leave a product with negative stock.
    ///
    /// ## When This Occurs
    /// - Approving a `shrinkage` ticket larger than the current stock
    ///
    /// The engine returns this BEFORE mutating anything; the ticket stays
    /// pending and the ledger is untouched.
    #[error("stock cannot go negative (current {current}, requested -{requested})")]
    StockUnderflow { current: i64, requested: i64 },
}

/// Convenience type alias for validation results.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages() {
        let err = ValidationError::Required {
            field: "title".to_string(),
        };
        assert_eq!(err.to_string(), "title is required");

        let err = ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: 10_000,
        };
        assert_eq!(err.to_string(), "quantity must be between 1 and 10000");

        let err = ValidationError::StockUnderflow {
            current: 20,
            requested: 25,
        };
        assert_eq!(
            err.to_string(),
            "stock cannot go negative (current 20, requested -25)"
        );
    }
}
