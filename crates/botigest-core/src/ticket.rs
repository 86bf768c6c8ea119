//! # Ticket Payloads
//!
//! A ticket is a deferred, approval-gated request to mutate inventory state
//! outside the normal sale flow. Each ticket carries a typed payload whose
//! shape depends on the ticket kind.
//!
//! ## Why a tagged union?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  The payload used to be an untyped JSON map keyed by a type string.    │
//! │  Every approval branch re-parsed fields, coerced strings to numbers,   │
//! │  and could silently do the wrong thing on a malformed payload.        │
//! │                                                                         │
//! │  Here the payload IS the type:                                          │
//! │                                                                         │
//! │    TicketPayload::Shrinkage { product_id, quantity, reason }           │
//! │                                                                         │
//! │  Bounds are validated at construction and the approval dispatch in    │
//! │  botigest-db is an exhaustive match - a new ticket kind that forgets  │
//! │  its approval behavior is a compile error, not a runtime surprise.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The payload is persisted in the `tickets.payload` column as tagged JSON
//! (`{"kind": "shrinkage", "product_id": 3, ...}`); the separate `type`
//! column is kept in step for plain SQL filtering.

use serde::{Deserialize, Serialize};

use crate::error::{ValidationError, ValidationResult};
use crate::money::Money;
use crate::types::TicketKind;
use crate::{
    MAX_ARRIVAL_QUANTITY, MAX_SHRINKAGE_QUANTITY, MAX_STOCK_REQUEST, MAX_TICKET_DESCRIPTION,
    MAX_TICKET_TITLE,
};

// =============================================================================
// Product Field (product_update target)
// =============================================================================

/// The single product field a `product_update` ticket may overwrite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductField {
    Name,
    Price,
    Description,
}

impl ProductField {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ProductField::Name => "name",
            ProductField::Price => "price",
            ProductField::Description => "description",
        }
    }
}

// =============================================================================
// Ticket Payload
// =============================================================================

/// The typed payload of a ticket, one case per ticket kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TicketPayload {
    /// Set product stock to an absolute value (physical recount).
    StockRequest { product_id: i64, new_stock: i64 },

    /// Overwrite one named field on the product.
    ProductUpdate {
        product_id: i64,
        field: ProductField,
        value: String,
    },

    /// Stock decrement for inventory loss. Fails at approval time if it
    /// would leave the product with negative stock.
    Shrinkage {
        product_id: i64,
        quantity: i64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },

    /// Stock increment for a goods receipt.
    StockArrival { product_id: i64, quantity: i64 },

    /// No ledger mutation; approval is a pure "mark resolved".
    Observation,
}

impl TicketPayload {
    /// The kind tag this payload belongs to (persisted in the `type` column).
    pub const fn kind(&self) -> TicketKind {
        match self {
            TicketPayload::StockRequest { .. } => TicketKind::StockRequest,
            TicketPayload::ProductUpdate { .. } => TicketKind::ProductUpdate,
            TicketPayload::Shrinkage { .. } => TicketKind::Shrinkage,
            TicketPayload::StockArrival { .. } => TicketKind::StockArrival,
            TicketPayload::Observation => TicketKind::Observation,
        }
    }

    /// The product this payload targets, if any.
    pub const fn product_id(&self) -> Option<i64> {
        match self {
            TicketPayload::StockRequest { product_id, .. }
            | TicketPayload::ProductUpdate { product_id, .. }
            | TicketPayload::Shrinkage { product_id, .. }
            | TicketPayload::StockArrival { product_id, .. } => Some(*product_id),
            TicketPayload::Observation => None,
        }
    }

    /// Whether the Telegram notification should offer approve/reject
    /// buttons. Observations are informational only.
    pub const fn requires_approval(&self) -> bool {
        !matches!(self, TicketPayload::Observation)
    }

    /// Validates kind-specific bounds. Called before a ticket is persisted;
    /// an approved payload that passed here can still fail at approval time
    /// on the live stock level (shrinkage underflow).
    pub fn validate(&self) -> ValidationResult<()> {
        match self {
            TicketPayload::StockRequest { new_stock, .. } => {
                if *new_stock < 0 || *new_stock > MAX_STOCK_REQUEST {
                    return Err(ValidationError::OutOfRange {
                        field: "new_stock".to_string(),
                        min: 0,
                        max: MAX_STOCK_REQUEST,
                    });
                }
            }
            TicketPayload::Shrinkage { quantity, .. } => {
                if *quantity <= 0 || *quantity > MAX_SHRINKAGE_QUANTITY {
                    return Err(ValidationError::OutOfRange {
                        field: "quantity".to_string(),
                        min: 1,
                        max: MAX_SHRINKAGE_QUANTITY,
                    });
                }
            }
            TicketPayload::StockArrival { quantity, .. } => {
                if *quantity <= 0 || *quantity > MAX_ARRIVAL_QUANTITY {
                    return Err(ValidationError::OutOfRange {
                        field: "quantity".to_string(),
                        min: 1,
                        max: MAX_ARRIVAL_QUANTITY,
                    });
                }
            }
            TicketPayload::ProductUpdate { field, value, .. } => {
                if value.trim().is_empty() {
                    return Err(ValidationError::Required {
                        field: "value".to_string(),
                    });
                }
                // Price updates must parse now, not at approval time.
                if *field == ProductField::Price {
                    coerce_price(value)?;
                }
            }
            TicketPayload::Observation => {}
        }
        Ok(())
    }
}

/// Coerces a `product_update` price value into Money.
///
/// Accepts a plain integer amount in pesos; rejects negatives and anything
/// that doesn't parse.
pub fn coerce_price(value: &str) -> ValidationResult<Money> {
    let units: i64 = value
        .trim()
        .parse()
        .map_err(|_| ValidationError::InvalidFormat {
            field: "price".to_string(),
            reason: "must be a whole number of pesos".to_string(),
        })?;

    if units < 0 {
        return Err(ValidationError::MustBeNonNegative {
            field: "price".to_string(),
        });
    }

    Ok(Money::from_units(units))
}

// =============================================================================
// New Ticket (creation input)
// =============================================================================

/// Input to ticket creation. Persisted as `pending` once validated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTicket {
    pub title: String,
    pub description: Option<String>,
    pub payload: TicketPayload,
    pub attachment_path: Option<String>,
    pub created_by: Option<i64>,
}

impl NewTicket {
    /// Validates title/description lengths and the payload bounds.
    pub fn validate(&self) -> ValidationResult<()> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(ValidationError::Required {
                field: "title".to_string(),
            });
        }
        if title.chars().count() > MAX_TICKET_TITLE {
            return Err(ValidationError::TooLong {
                field: "title".to_string(),
                max: MAX_TICKET_TITLE,
            });
        }

        if let Some(description) = &self.description {
            if description.chars().count() > MAX_TICKET_DESCRIPTION {
                return Err(ValidationError::TooLong {
                    field: "description".to_string(),
                    max: MAX_TICKET_DESCRIPTION,
                });
            }
        }

        self.payload.validate()
    }
}

// =============================================================================
// Ticket (persisted)
// =============================================================================

/// A persisted ticket with its parsed payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
    pub id: i64,
    pub status: crate::types::TicketStatus,
    pub title: String,
    pub description: Option<String>,
    pub payload: TicketPayload,
    pub attachment_path: Option<String>,
    pub created_by: Option<i64>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub resolved_by: Option<i64>,
    pub resolved_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl Ticket {
    /// Kind tag, derived from the payload (single source of truth).
    pub const fn kind(&self) -> TicketKind {
        self.payload.kind()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn ticket(payload: TicketPayload) -> NewTicket {
        NewTicket {
            title: "Recuento bodega".to_string(),
            description: None,
            payload,
            attachment_path: None,
            created_by: Some(1),
        }
    }

    #[test]
    fn stock_request_bounds() {
        let ok = ticket(TicketPayload::StockRequest {
            product_id: 1,
            new_stock: 0,
        });
        assert!(ok.validate().is_ok());

        let too_big = ticket(TicketPayload::StockRequest {
            product_id: 1,
            new_stock: MAX_STOCK_REQUEST + 1,
        });
        assert!(too_big.validate().is_err());

        let negative = ticket(TicketPayload::StockRequest {
            product_id: 1,
            new_stock: -1,
        });
        assert!(negative.validate().is_err());
    }

    #[test]
    fn shrinkage_bounds() {
        let zero = ticket(TicketPayload::Shrinkage {
            product_id: 1,
            quantity: 0,
            reason: None,
        });
        assert!(zero.validate().is_err());

        let max = ticket(TicketPayload::Shrinkage {
            product_id: 1,
            quantity: MAX_SHRINKAGE_QUANTITY,
            reason: Some("vencidos".to_string()),
        });
        assert!(max.validate().is_ok());
    }

    #[test]
    fn arrival_bounds() {
        let ok = ticket(TicketPayload::StockArrival {
            product_id: 1,
            quantity: MAX_ARRIVAL_QUANTITY,
        });
        assert!(ok.validate().is_ok());

        let over = ticket(TicketPayload::StockArrival {
            product_id: 1,
            quantity: MAX_ARRIVAL_QUANTITY + 1,
        });
        assert!(over.validate().is_err());
    }

    #[test]
    fn title_bounds() {
        let mut t = ticket(TicketPayload::Observation);
        t.title = "a".repeat(MAX_TICKET_TITLE + 1);
        assert!(t.validate().is_err());

        t.title = String::new();
        assert!(t.validate().is_err());
    }

    #[test]
    fn product_update_price_must_parse() {
        let bad = ticket(TicketPayload::ProductUpdate {
            product_id: 1,
            field: ProductField::Price,
            value: "mil pesos".to_string(),
        });
        assert!(bad.validate().is_err());

        let negative = ticket(TicketPayload::ProductUpdate {
            product_id: 1,
            field: ProductField::Price,
            value: "-100".to_string(),
        });
        assert!(negative.validate().is_err());

        let ok = ticket(TicketPayload::ProductUpdate {
            product_id: 1,
            field: ProductField::Price,
            value: "1990".to_string(),
        });
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn payload_serializes_with_kind_tag() {
        let payload = TicketPayload::Shrinkage {
            product_id: 3,
            quantity: 5,
            reason: Some("merma".to_string()),
        };
        let json = serde_json::to_string(&payload).unwrap();
        assert!(json.contains(r#""kind":"shrinkage""#));

        let back: TicketPayload = serde_json::from_str(&json).unwrap();
        assert_eq!(back, payload);
        assert_eq!(back.kind(), TicketKind::Shrinkage);
    }

    #[test]
    fn observation_needs_no_approval() {
        assert!(!TicketPayload::Observation.requires_approval());
        assert!(TicketPayload::StockArrival {
            product_id: 1,
            quantity: 1
        }
        .requires_approval());
    }
}
