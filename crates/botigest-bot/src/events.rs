//! # Outbound Events
//!
//! Structured payloads produced by the core on ticket creation and low
//! stock, plus their chat rendering. The payload carries key/value pairs
//! already resolved to human-readable values (product names, not ids), so
//! rendering needs no store access.

use botigest_core::{Money, Ticket, TicketKind, TicketPayload};

use crate::transport::ReplyMarkup;

/// Escapes Markdown control characters in user-entered text.
fn escape_markdown(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '_' | '*' | '`' | '[' | ']') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Chat label for a ticket kind.
fn kind_label(kind: TicketKind) -> &'static str {
    match kind {
        TicketKind::StockArrival => "📦 Llegada de Stock",
        TicketKind::StockRequest => "📉 Ajuste de Stock",
        TicketKind::Shrinkage => "🗑 Merma",
        TicketKind::ProductUpdate => "✏️ Actualización Producto",
        TicketKind::Observation => "📝 Observación",
    }
}

// =============================================================================
// Ticket Created
// =============================================================================

/// Event emitted when a ticket is persisted as pending.
#[derive(Debug, Clone)]
pub struct TicketCreatedEvent {
    pub id: i64,
    pub kind: TicketKind,
    pub title: String,
    pub note: Option<String>,
    pub requires_approval: bool,
    /// Kind-specific key/value detail lines, in render order.
    pub details: Vec<(String, String)>,
}

impl TicketCreatedEvent {
    /// Builds the event from a persisted ticket. `product_name` is the
    /// resolved name of the payload's target product, when it has one.
    pub fn from_ticket(ticket: &Ticket, product_name: Option<&str>) -> Self {
        let mut details = Vec::new();
        let product = product_name.unwrap_or("(desconocido)").to_string();

        match &ticket.payload {
            TicketPayload::StockRequest { new_stock, .. } => {
                details.push(("Producto".to_string(), product));
                details.push(("Nuevo Stock".to_string(), new_stock.to_string()));
            }
            TicketPayload::StockArrival { quantity, .. } => {
                details.push(("Producto".to_string(), product));
                details.push(("Cantidad".to_string(), quantity.to_string()));
            }
            TicketPayload::Shrinkage {
                quantity, reason, ..
            } => {
                details.push(("Producto".to_string(), product));
                details.push(("Cantidad".to_string(), quantity.to_string()));
                if let Some(reason) = reason {
                    details.push(("Motivo".to_string(), reason.clone()));
                }
            }
            TicketPayload::ProductUpdate { field, value, .. } => {
                details.push(("Producto".to_string(), product));
                details.push(("Campo".to_string(), field.as_str().to_string()));
                details.push(("Valor".to_string(), value.clone()));
            }
            TicketPayload::Observation => {}
        }

        TicketCreatedEvent {
            id: ticket.id,
            kind: ticket.kind(),
            title: ticket.title.clone(),
            note: ticket.description.clone(),
            requires_approval: ticket.payload.requires_approval(),
            details,
        }
    }

    /// Renders the chat message body.
    pub fn render(&self) -> String {
        let mut message = format!(
            "📝 *Ticket #{}*: {}\n📌 *{}*\n",
            self.id,
            kind_label(self.kind),
            escape_markdown(&self.title)
        );

        for (key, value) in &self.details {
            message.push_str(&format!("\n🔹 *{}*: {}", key, escape_markdown(value)));
        }

        if let Some(note) = &self.note {
            message.push_str(&format!("\n\n📝 *Nota*: {}", escape_markdown(note)));
        }

        message
    }

    /// Approve/reject buttons, only for approval-gated tickets.
    pub fn markup(&self) -> Option<ReplyMarkup> {
        self.requires_approval
            .then(|| ReplyMarkup::approval_row(self.id))
    }
}

// =============================================================================
// Ticket Resolved
// =============================================================================

/// Broadcast after a callback resolved a ticket, naming who pressed the
/// button.
#[derive(Debug, Clone)]
pub struct TicketResolvedEvent {
    pub id: i64,
    pub approved: bool,
    pub resolver_name: String,
}

impl TicketResolvedEvent {
    pub fn render(&self) -> String {
        if self.approved {
            format!(
                "✅ Ticket #{} aprobado por {} desde Telegram.",
                self.id, self.resolver_name
            )
        } else {
            format!(
                "❌ Ticket #{} rechazado por {} desde Telegram.",
                self.id, self.resolver_name
            )
        }
    }
}

// =============================================================================
// Low Stock
// =============================================================================

/// Event emitted when a sale leaves a product at or below the threshold.
#[derive(Debug, Clone)]
pub struct LowStockEvent {
    pub product_name: String,
    pub current_stock: i64,
}

impl LowStockEvent {
    pub fn render(&self) -> String {
        format!(
            "⚠️ *Stock Crítico*: Quedan solo {} unidades de {}.",
            self.current_stock,
            escape_markdown(&self.product_name)
        )
    }
}

// =============================================================================
// Sale Completed
// =============================================================================

/// Event emitted after a sale commits, for the optional per-sale broadcast.
#[derive(Debug, Clone)]
pub struct SaleCompletedEvent {
    /// `(product name, quantity)` per line.
    pub lines: Vec<(String, i64)>,
    pub total: Money,
}

impl SaleCompletedEvent {
    pub fn render(&self) -> String {
        let mut message = String::from("💰 *Nueva Venta*:\n");
        for (name, quantity) in &self.lines {
            message.push_str(&format!("- {} (x{})\n", escape_markdown(name), quantity));
        }
        message.push_str(&format!("Total: {}", self.total));
        message
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
