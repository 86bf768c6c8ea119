//! # botigest-db: Storage Layer for BotiGest
//!
//! This crate provides database access for the BotiGest POS system.
//! It uses SQLite for local storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        BotiGest Data Flow                               │
//! │                                                                         │
//! │  POS checkout / Telegram callback                                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   botigest-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories  │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │◄───│  sale / shift  │    │  (embedded)  │  │   │
//! │  │   │  WAL + busy   │    │  ticket / ...  │    │ 001_init.sql │  │   │
//! │  │   │   timeout     │    │  transactions  │    │ 002_guard    │  │   │
//! │  │   └───────────────┘    └────────────────┘    └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite file (single writer serialization point, stock guard trigger)   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The single source of truth is the database file. The three engines with
//! correctness constraints live in [`repository`]:
//!
//! - [`repository::sale::SaleRepository`] - atomic cart → sale + items + stock
//! - [`repository::shift::ShiftRepository`] - register open/close lifecycle
//! - [`repository::ticket::TicketRepository`] - approval state machine
//!
//! ## Usage
//!
//! ```rust,ignore
//! use botigest_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("botigest.db")).await?;
//! let shift_id = db.shifts().open(user_id, Money::from_units(10_000)).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{StoreError, StoreResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::category::CategoryRepository;
pub use repository::customer::CustomerRepository;
pub use repository::product::ProductRepository;
pub use repository::sale::SaleRepository;
pub use repository::settings::SettingsRepository;
pub use repository::shift::ShiftRepository;
pub use repository::ticket::TicketRepository;
pub use repository::user::UserRepository;
