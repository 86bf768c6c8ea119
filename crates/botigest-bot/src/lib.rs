//! # botigest-bot: Telegram Notification Gateway for BotiGest
//!
//! Outbound events (ticket created, ticket resolved, low stock, sale
//! completed) rendered into Spanish chat messages, and inbound commands
//! and approval callbacks wired to the storage engines.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Notification Gateway                             │
//! │                                                                         │
//! │  tickets/sales ─► Gateway ─► Notifier ─► BotTransport ─► Telegram chat │
//! │                                            ▲                            │
//! │  db engines ◄── CommandHandler ◄── Poller ─┘  (getUpdates long-poll)   │
//! │                                                                         │
//! │  Delivery failures never fail the business operation that triggered    │
//! │  them; callbacks resolve each ticket exactly once.                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use botigest_bot::{poller, CommandHandler, Gateway, TelegramClient};
//!
//! let transport = Arc::new(TelegramClient::new(token, chat_id)?);
//! let gateway = Gateway::new(db.clone(), transport.clone());
//! let handler = CommandHandler::new(db, transport.clone());
//! let handle = poller::spawn(transport, handler);
//! let ticket = gateway.create_ticket(&new_ticket).await?;
//! // ...
//! handle.shutdown().await;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod commands;
pub mod error;
pub mod events;
pub mod gateway;
pub mod notifier;
pub mod poller;
pub mod transport;

// =============================================================================
// Re-exports
// =============================================================================

pub use commands::{parse_callback, CallbackAction, CommandHandler};
pub use error::{BotError, BotResult};
pub use events::{LowStockEvent, SaleCompletedEvent, TicketCreatedEvent, TicketResolvedEvent};
pub use gateway::Gateway;
pub use notifier::Notifier;
pub use poller::PollerHandle;
pub use transport::{BotTransport, TelegramClient};
