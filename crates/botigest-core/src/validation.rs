//! # Validation Module
//!
//! Input validation for BotiGest.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: UI (courtesy checks, immediate feedback)                     │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE - business rule validation, before any write     │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: SQLite - NOT NULL, UNIQUE, FK, CHECK(stock >= 0),            │
//! │           stock guard trigger                                           │
//! │                                                                         │
//! │  Defense in depth: the trigger is the last line against racing writers │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::{ValidationError, ValidationResult};
use crate::money::Money;
use crate::types::CartLine;
use crate::MAX_CART_LINE_QUANTITY;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a product code.
///
/// ## Rules
/// - Must not be empty
/// - At most 50 characters
/// - Only alphanumerics, hyphens, underscores (barcodes and internal SKUs)
pub fn validate_product_code(code: &str) -> ValidationResult<()> {
    let code = code.trim();

    if code.is_empty() {
        return Err(ValidationError::Required {
            field: "code".to_string(),
        });
    }

    if code.len() > 50 {
        return Err(ValidationError::TooLong {
            field: "code".to_string(),
            max: 50,
        });
    }

    if !code
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "code".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a product or customer name: non-empty, at most 200 characters.
pub fn validate_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.chars().count() > 200 {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: 200,
        });
    }

    Ok(())
}

// =============================================================================
// Monetary Validators
// =============================================================================

/// Validates an amount that must not be negative (prices, shift floats).
/// Zero is allowed: a register can open empty, an item can be a giveaway.
pub fn validate_amount(field: &str, amount: Money) -> ValidationResult<()> {
    if amount.is_negative() {
        return Err(ValidationError::MustBeNonNegative {
            field: field.to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Cart Validators
// =============================================================================

/// Validates a cart before the Sale Transaction Processor touches the store.
///
/// ## Rules
/// - Cart must not be empty
/// - Every line quantity must be in `1..=MAX_CART_LINE_QUANTITY`
/// - Every unit price must be non-negative
///
/// The quantity cap keeps `CartLine::subtotal` (a plain `i64` multiply)
/// out of overflow territory.
///
/// Stock sufficiency is deliberately NOT checked here: the UI does that as
/// a courtesy, and the storage layer enforces it transactionally.
pub fn validate_cart(lines: &[CartLine]) -> ValidationResult<()> {
    if lines.is_empty() {
        return Err(ValidationError::Required {
            field: "cart".to_string(),
        });
    }

    for line in lines {
        if line.quantity <= 0 {
            return Err(ValidationError::MustBePositive {
                field: "quantity".to_string(),
            });
        }
        if line.quantity > MAX_CART_LINE_QUANTITY {
            return Err(ValidationError::OutOfRange {
                field: "quantity".to_string(),
                min: 1,
                max: MAX_CART_LINE_QUANTITY,
            });
        }
        validate_amount("unit_price", line.unit_price)?;
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn product_code() {
        assert!(validate_product_code("COCA-350").is_ok());
        assert!(validate_product_code("7801610001").is_ok());
        assert!(validate_product_code("").is_err());
        assert!(validate_product_code("   ").is_err());
        assert!(validate_product_code("has space").is_err());
        assert!(validate_product_code(&"A".repeat(100)).is_err());
    }

    #[test]
    fn name() {
        assert!(validate_name("Coca-Cola 350ml").is_ok());
        assert!(validate_name("").is_err());
        assert!(validate_name(&"A".repeat(300)).is_err());
    }

    #[test]
    fn amount() {
        assert!(validate_amount("price", Money::from_units(0)).is_ok());
        assert!(validate_amount("price", Money::from_units(1990)).is_ok());
        assert!(validate_amount("price", Money::from_units(-1)).is_err());
    }

    #[test]
    fn cart() {
        assert!(validate_cart(&[]).is_err());

        let ok = vec![CartLine {
            product_id: 1,
            quantity: 2,
            unit_price: Money::from_units(1500),
        }];
        assert!(validate_cart(&ok).is_ok());

        let zero_qty = vec![CartLine {
            product_id: 1,
            quantity: 0,
            unit_price: Money::from_units(1500),
        }];
        assert!(validate_cart(&zero_qty).is_err());

        let negative_price = vec![CartLine {
            product_id: 1,
            quantity: 1,
            unit_price: Money::from_units(-10),
        }];
        assert!(validate_cart(&negative_price).is_err());
    }

    #[test]
    fn cart_quantity_is_capped() {
        let at_cap = vec![CartLine {
            product_id: 1,
            quantity: MAX_CART_LINE_QUANTITY,
            unit_price: Money::from_units(1500),
        }];
        assert!(validate_cart(&at_cap).is_ok());

        // i64::MAX would overflow the subtotal multiply if it got through.
        for quantity in [MAX_CART_LINE_QUANTITY + 1, i64::MAX] {
            let oversized = vec![CartLine {
                product_id: 1,
                quantity,
                unit_price: Money::from_units(1500),
            }];
            assert!(matches!(
                validate_cart(&oversized),
                Err(ValidationError::OutOfRange { ref field, .. }) if field == "quantity"
            ));
        }
    }
}
