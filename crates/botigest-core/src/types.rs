//! # Domain Types
//!
//! Core domain types used throughout BotiGest.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │      Sale       │   │   CashShift     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (i64)       │   │  id (i64)       │   │  id (i64)       │       │
//! │  │  code (unique)  │   │  total (Money)  │   │  start_amount   │       │
//! │  │  stock (>= 0)   │   │  shift_id (FK)  │   │  status         │       │
//! │  │  price (Money)  │   │  items[]        │   │  open → closed  │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  `Product.stock` is the Stock Ledger: the only writers are the Sale    │
//! │  Transaction Processor (decrement) and the Ticket Workflow Engine      │
//! │  (increment / decrement / overwrite on approval).                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Payment Method
// =============================================================================

/// How a sale was paid. A label only: no gateway integration, no settlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// Physical cash in the drawer (counts toward shift expected amount).
    Cash,
    /// Card payment on an external terminal.
    Card,
}

impl PaymentMethod {
    /// The persisted column value, also used in aggregation SQL.
    pub const fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
        }
    }
}

// =============================================================================
// Sale Status
// =============================================================================

/// The status of a sale.
///
/// Sales are immutable after creation: there is no draft or void path in
/// this system, so `Completed` is the only state. Modeled as an enum anyway
/// so a future refund flow is an explicit extension, not an ad-hoc string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum SaleStatus {
    #[default]
    Completed,
}

// =============================================================================
// Shift Status
// =============================================================================

/// Cash register shift lifecycle: `Open` → `Closed`, exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum ShiftStatus {
    Open,
    Closed,
}

// =============================================================================
// Ticket Status / Kind
// =============================================================================

/// Ticket state machine: `Pending → {Approved, Rejected}`, both terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum TicketStatus {
    Pending,
    Approved,
    Rejected,
}

impl TicketStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Pending => "pending",
            TicketStatus::Approved => "approved",
            TicketStatus::Rejected => "rejected",
        }
    }
}

/// The kind of deferred change a ticket requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum TicketKind {
    /// Absolute stock overwrite.
    StockRequest,
    /// Overwrite one named product field (name / price / description).
    ProductUpdate,
    /// Inventory loss (damage, theft, expiry): stock decrement.
    Shrinkage,
    /// Goods receipt: stock increment.
    StockArrival,
    /// Free-form note; approval only marks it resolved.
    Observation,
}

impl TicketKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            TicketKind::StockRequest => "stock_request",
            TicketKind::ProductUpdate => "product_update",
            TicketKind::Shrinkage => "shrinkage",
            TicketKind::StockArrival => "stock_arrival",
            TicketKind::Observation => "observation",
        }
    }
}

// =============================================================================
// Product
// =============================================================================

/// A product available for sale.
///
/// `stock` is the authoritative on-hand quantity (the Stock Ledger). The
/// schema enforces `stock >= 0` with a CHECK constraint plus a guard
/// trigger; application code checks first, the trigger is the safety net
/// against racing writers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    pub id: i64,
    /// Human-readable unique code (barcode or internal SKU).
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub price: Money,
    pub cost: Option<Money>,
    pub stock: i64,
    pub category_id: Option<i64>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Input to product creation (id and created_at are assigned by the store).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProduct {
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub price: Money,
    pub cost: Option<Money>,
    pub stock: i64,
    pub category_id: Option<i64>,
    pub image_url: Option<String>,
}

// =============================================================================
// Customer
// =============================================================================

/// A loyalty customer. `last_visit` and `total_spent` are derived from the
/// sale history at query time, never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Customer {
    pub id: i64,
    /// Chilean tax id, optional but unique when present.
    pub rut: Option<String>,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub points: i64,
    pub created_at: DateTime<Utc>,
}

/// Input to customer creation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewCustomer {
    pub rut: Option<String>,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

/// Points accrued per sale: one point per this many pesos of sale total.
pub const POINTS_ACCRUAL_UNIT: i64 = 1000;

/// Loyalty points earned by a sale of the given total (floor division).
pub fn points_for_total(total: Money) -> i64 {
    if total.is_negative() {
        return 0;
    }
    total.units() / POINTS_ACCRUAL_UNIT
}

// =============================================================================
// Cash Shift
// =============================================================================

/// A bounded period during which the register is open for sales.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct CashShift {
    pub id: i64,
    /// User who opened the shift.
    pub user_id: i64,
    /// Opening float counted into the drawer.
    pub start_amount: Money,
    /// Counted cash at close.
    pub end_amount: Option<Money>,
    /// Theoretical cash-in-drawer at close (float + cash sales).
    pub expected_amount: Option<Money>,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub status: ShiftStatus,
    pub notes: Option<String>,
    pub closed_by_user_id: Option<i64>,
}

impl CashShift {
    /// Drawer variance at close: counted minus expected. `None` while open.
    pub fn variance(&self) -> Option<Money> {
        match (self.end_amount, self.expected_amount) {
            (Some(end), Some(expected)) => Some(end - expected),
            _ => None,
        }
    }
}

/// Aggregated sale totals for one shift, split by payment method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ShiftTotals {
    pub total_sales: Money,
    pub cash_sales: Money,
    pub card_sales: Money,
}

// =============================================================================
// Sale
// =============================================================================

/// A completed sale transaction. Immutable after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Sale {
    pub id: i64,
    pub user_id: Option<i64>,
    pub customer_id: Option<i64>,
    pub shift_id: Option<i64>,
    /// Invariant: equals the sum of the line subtotals, always.
    pub total: Money,
    pub payment_method: PaymentMethod,
    pub status: SaleStatus,
    pub created_at: DateTime<Utc>,
}

/// A line item of a sale.
///
/// `price` is a snapshot of the unit price at sale time, decoupling sale
/// history from future product price edits. `subtotal = price × quantity`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleItem {
    pub id: i64,
    pub sale_id: i64,
    pub product_id: i64,
    pub quantity: i64,
    pub price: Money,
    pub subtotal: Money,
}

// =============================================================================
// Cart (sale input)
// =============================================================================

/// One line of an unpersisted cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: i64,
    pub quantity: i64,
    /// Unit price to snapshot onto the sale item.
    pub unit_price: Money,
}

impl CartLine {
    /// `unit_price × quantity` for this line.
    pub fn subtotal(&self) -> Money {
        self.unit_price * self.quantity
    }
}

/// Input to the Sale Transaction Processor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSale {
    pub lines: Vec<CartLine>,
    pub payment_method: PaymentMethod,
    pub user_id: Option<i64>,
    pub customer_id: Option<i64>,
    /// The shift this sale is recorded against. Must be open.
    pub shift_id: i64,
}

impl NewSale {
    /// Total of the cart: `Σ unit_price × quantity`.
    pub fn total(&self) -> Money {
        self.lines.iter().map(CartLine::subtotal).sum()
    }
}

// =============================================================================
// Users / Categories
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
}

// =============================================================================
// Reporting
// =============================================================================

/// Today's sales figures with trend vs. yesterday, for the `/resumen`
/// command and the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyStats {
    pub count: i64,
    pub total: Money,
    pub average: Money,
    /// Percentage change of `total` vs. yesterday (0.0 when no baseline).
    pub trend: f64,
    pub count_trend: f64,
    pub average_trend: f64,
}

/// A product at or below the low-stock threshold, for `/alertas`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct LowStockProduct {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub stock: i64,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cart_totals() {
        let sale = NewSale {
            lines: vec![
                CartLine {
                    product_id: 1,
                    quantity: 2,
                    unit_price: Money::from_units(1500),
                },
                CartLine {
                    product_id: 2,
                    quantity: 1,
                    unit_price: Money::from_units(990),
                },
            ],
            payment_method: PaymentMethod::Cash,
            user_id: None,
            customer_id: None,
            shift_id: 1,
        };

        assert_eq!(sale.total().units(), 3990);
        assert_eq!(sale.lines[0].subtotal().units(), 3000);
    }

    #[test]
    fn shift_variance() {
        let shift = CashShift {
            id: 1,
            user_id: 1,
            start_amount: Money::from_units(10_000),
            end_amount: Some(Money::from_units(13_500)),
            expected_amount: Some(Money::from_units(13_000)),
            start_time: Utc::now(),
            end_time: Some(Utc::now()),
            status: ShiftStatus::Closed,
            notes: None,
            closed_by_user_id: Some(1),
        };

        assert_eq!(shift.variance(), Some(Money::from_units(500)));
    }

    #[test]
    fn points_accrual_floors() {
        assert_eq!(points_for_total(Money::from_units(0)), 0);
        assert_eq!(points_for_total(Money::from_units(999)), 0);
        assert_eq!(points_for_total(Money::from_units(3990)), 3);
        assert_eq!(points_for_total(Money::from_units(-100)), 0);
    }

    #[test]
    fn ticket_kind_round_trips_through_str() {
        assert_eq!(TicketKind::StockRequest.as_str(), "stock_request");
        assert_eq!(TicketKind::Observation.as_str(), "observation");
    }
}
