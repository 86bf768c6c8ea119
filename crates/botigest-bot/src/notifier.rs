//! # Notifier
//!
//! Fire-and-forget outbound delivery. A failed send is logged and
//! swallowed: the sale or ticket that triggered it already committed, and
//! a chat outage must never fail a business operation.

use std::sync::Arc;

use tracing::warn;

use crate::events::{LowStockEvent, SaleCompletedEvent, TicketCreatedEvent, TicketResolvedEvent};
use crate::transport::BotTransport;

/// Pushes rendered events to the chat, swallowing delivery failures.
#[derive(Clone)]
pub struct Notifier<T: BotTransport> {
    transport: Arc<T>,
}

impl<T: BotTransport> Notifier<T> {
    /// Creates a notifier over the given transport.
    pub fn new(transport: Arc<T>) -> Self {
        Notifier { transport }
    }

    /// Announces a new ticket, with approve/reject buttons when the kind
    /// needs approval.
    pub async fn ticket_created(&self, event: &TicketCreatedEvent) {
        if let Err(e) = self
            .transport
            .send_message(&event.render(), event.markup())
            .await
        {
            warn!(ticket_id = event.id, error = %e, "ticket notification failed");
        }
    }

    /// Announces a resolution made from the chat.
    pub async fn ticket_resolved(&self, event: &TicketResolvedEvent) {
        if let Err(e) = self.transport.send_message(&event.render(), None).await {
            warn!(ticket_id = event.id, error = %e, "resolution notification failed");
        }
    }

    /// Warns about a product at or below the alert threshold.
    pub async fn low_stock(&self, event: &LowStockEvent) {
        if let Err(e) = self.transport.send_message(&event.render(), None).await {
            warn!(product = %event.product_name, error = %e, "low-stock notification failed");
        }
    }

    /// Optional per-sale broadcast.
    pub async fn sale_completed(&self, event: &SaleCompletedEvent) {
        if let Err(e) = self.transport.send_message(&event.render(), None).await {
            warn!(error = %e, "sale notification failed");
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
