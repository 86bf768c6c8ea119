//! # Gateway
//!
//! The composed entry point callers use instead of wiring repositories and
//! the notifier by hand: persist first, then announce. The announcement is
//! fire-and-forget — by the time it runs the store transaction has
//! committed, so no notification outcome can undo or fail the operation.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  create_ticket(new)            record_sale(new)                         │
//! │       │                             │                                   │
//! │       ▼                             ▼                                   │
//! │  TicketRepository::create      SaleRepository::create                   │
//! │       │ committed                   │ committed                         │
//! │       ▼                             ▼                                   │
//! │  resolve product name          resolve line names + stock levels        │
//! │       ▼                             ▼                                   │
//! │  Notifier::ticket_created      Notifier::sale_completed                 │
//! │  (buttons when approval        Notifier::low_stock per product at or   │
//! │   is required)                 below the configured threshold          │
//! │                                                                         │
//! │  Everything below "committed" logs-and-swallows on failure.            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use tracing::warn;

use botigest_core::{NewSale, NewTicket, Sale, Ticket, DEFAULT_LOW_STOCK_THRESHOLD};
use botigest_db::{Database, StoreResult};

use crate::events::{LowStockEvent, SaleCompletedEvent, TicketCreatedEvent};
use crate::notifier::Notifier;
use crate::transport::BotTransport;

/// Persists business operations and announces them to the chat.
#[derive(Clone)]
pub struct Gateway<T: BotTransport> {
    db: Database,
    notifier: Notifier<T>,
}

impl<T: BotTransport> Gateway<T> {
    /// Creates a gateway over an injected database and transport.
    pub fn new(db: Database, transport: Arc<T>) -> Self {
        Gateway {
            db,
            notifier: Notifier::new(transport),
        }
    }

    /// Creates a pending ticket and announces it, with approve/reject
    /// buttons when the kind needs approval.
    ///
    /// The announcement is fire-and-forget: a chat outage cannot fail a
    /// ticket that already committed. Store errors from the create itself
    /// propagate as usual.
    pub async fn create_ticket(&self, new_ticket: &NewTicket) -> StoreResult<Ticket> {
        let ticket = self.db.tickets().create(new_ticket).await?;

        let product_name = match ticket.payload.product_id() {
            Some(product_id) => match self.db.products().get_by_id(product_id).await {
                Ok(product) => product.map(|p| p.name),
                Err(e) => {
                    warn!(ticket_id = ticket.id, error = %e, "product lookup for announcement failed");
                    None
                }
            },
            None => None,
        };

        let event = TicketCreatedEvent::from_ticket(&ticket, product_name.as_deref());
        self.notifier.ticket_created(&event).await;

        Ok(ticket)
    }

    /// Records a sale, then broadcasts it and warns about every sold
    /// product the sale left at or below the low-stock threshold.
    pub async fn record_sale(&self, new_sale: &NewSale) -> StoreResult<Sale> {
        let sale = self.db.sales().create(new_sale).await?;

        if let Err(e) = self.announce_sale(new_sale, &sale).await {
            warn!(sale_id = sale.id, error = %e, "post-sale announcements failed");
        }

        Ok(sale)
    }

    async fn announce_sale(&self, new_sale: &NewSale, sale: &Sale) -> StoreResult<()> {
        let threshold = self
            .db
            .settings()
            .low_stock_threshold(DEFAULT_LOW_STOCK_THRESHOLD)
            .await?;

        let mut lines = Vec::with_capacity(new_sale.lines.len());
        let mut alerts = Vec::new();

        for line in &new_sale.lines {
            if let Some(product) = self.db.products().get_by_id(line.product_id).await? {
                lines.push((product.name.clone(), line.quantity));
                if product.stock <= threshold {
                    alerts.push(LowStockEvent {
                        product_name: product.name,
                        current_stock: product.stock,
                    });
                }
            }
        }

        self.notifier
            .sale_completed(&SaleCompletedEvent {
                lines,
                total: sale.total,
            })
            .await;

        for alert in &alerts {
            self.notifier.low_stock(alert).await;
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
