//! # botigest-core: Pure Business Logic for BotiGest
//!
//! This crate is the **heart** of BotiGest, a point-of-sale and inventory
//! system for a single retail store. It contains all business rules as pure
//! functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       BotiGest Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────┐  ┌─────────────────────────────────┐  │
//! │  │     POS / Admin UI          │  │   Telegram Bot (botigest-bot)   │  │
//! │  │   cart ──► checkout         │  │   /stock /resumen /alertas      │  │
//! │  │   shifts, tickets           │  │   approve_ticket_<id> callbacks │  │
//! │  └──────────────┬──────────────┘  └────────────────┬────────────────┘  │
//! │                 │                                  │                    │
//! │  ┌──────────────▼──────────────────────────────────▼────────────────┐  │
//! │  │                ★ botigest-core (THIS CRATE) ★                     │  │
//! │  │                                                                   │  │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐    │  │
//! │  │   │   types   │  │   money   │  │  ticket   │  │ validation│    │  │
//! │  │   │  Product  │  │   Money   │  │  Payload  │  │   rules   │    │  │
//! │  │   │   Sale    │  │  (pesos)  │  │ (tagged)  │  │   checks  │    │  │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘    │  │
//! │  │                                                                   │  │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS             │  │
//! │  └──────────────────────────────┬────────────────────────────────────┘  │
//! │                                 │                                       │
//! │  ┌──────────────────────────────▼────────────────────────────────────┐  │
//! │  │                 botigest-db (Storage Layer)                       │  │
//! │  │          SQLite transactions, migrations, repositories            │  │
//! │  └───────────────────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Sale, CashShift, Customer, ...)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`ticket`] - Ticket payloads as a tagged union, validated at construction
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//! - [`auth`] - Local password hashing (sha256)
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are whole pesos (i64), never floats
//! 4. **Explicit Errors**: All errors are typed, never strings or panics

// =============================================================================
// Module Declarations
// =============================================================================

pub mod auth;
pub mod error;
pub mod money;
pub mod ticket;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use botigest_core::Money` instead of
// `use botigest_core::money::Money`

pub use error::ValidationError;
pub use money::Money;
pub use ticket::{NewTicket, ProductField, Ticket, TicketPayload};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum length of a ticket title.
pub const MAX_TICKET_TITLE: usize = 100;

/// Maximum length of a ticket description / note.
pub const MAX_TICKET_DESCRIPTION: usize = 1000;

/// Upper bound for an absolute stock overwrite (`stock_request` tickets).
///
/// ## Business Reason
/// A single-store backroom never holds a million units of anything; a larger
/// number is a typo, not an order.
pub const MAX_STOCK_REQUEST: i64 = 1_000_000;

/// Upper bound for a single shrinkage write-off (`shrinkage` tickets).
pub const MAX_SHRINKAGE_QUANTITY: i64 = 10_000;

/// Upper bound for a single goods receipt (`stock_arrival` tickets).
pub const MAX_ARRIVAL_QUANTITY: i64 = 100_000;

/// Upper bound for a single cart line quantity. Keeps line subtotals far
/// from `i64` overflow even at absurd unit prices.
pub const MAX_CART_LINE_QUANTITY: i64 = 10_000;

/// Default low-stock alert threshold, used when the `low_stock_threshold`
/// setting is absent.
pub const DEFAULT_LOW_STOCK_THRESHOLD: i64 = 10;
