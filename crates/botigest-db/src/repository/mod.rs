//! # Repository Module
//!
//! Database repository implementations for BotiGest.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern Explained                         │
//! │                                                                         │
//! │  The Repository pattern abstracts database access behind a clean API.  │
//! │                                                                         │
//! │  Caller (UI command or bot handler)                                     │
//! │       │                                                                 │
//! │       │  db.sales().create(&new_sale)                                   │
//! │       ▼                                                                 │
//! │  SaleRepository                                                         │
//! │  ├── create(&self, new_sale)      ← one transaction, all-or-nothing    │
//! │  ├── get_by_id(&self, id)                                               │
//! │  └── daily_stats(&self)                                                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database                                                        │
//! │                                                                         │
//! │  The three repositories with real invariants (sale, shift, ticket)      │
//! │  own their multi-statement transactions end to end: a caller can        │
//! │  never observe or create partial state through this API.                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`sale::SaleRepository`] - Sale Transaction Processor + reporting reads
//! - [`shift::ShiftRepository`] - Cash Shift Manager
//! - [`ticket::TicketRepository`] - Ticket Workflow Engine
//! - [`product::ProductRepository`] - Product CRUD and low-stock queries
//! - [`customer::CustomerRepository`] - Loyalty customers
//! - [`category::CategoryRepository`] - Product categories
//! - [`user::UserRepository`] - Local accounts
//! - [`settings::SettingsRepository`] - Key/value settings

pub mod category;
pub mod customer;
pub mod product;
pub mod sale;
pub mod settings;
pub mod shift;
pub mod ticket;
pub mod user;
