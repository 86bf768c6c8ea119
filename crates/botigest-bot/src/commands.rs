//! # Inbound Commands & Callbacks
//!
//! The gateway's inbound contract:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Text commands (read-only)          Callbacks (mutating)               │
//! │  ─────────────────────────          ─────────────────────────────────  │
//! │  /stock    product list + stock     approve_ticket_<id> ─► approve()   │
//! │  /resumen  today vs yesterday       reject_ticket_<id>  ─► reject()    │
//! │  /alertas  low-stock listing                                            │
//! │  /ayuda    help text                Each callback resolves to exactly  │
//! │  /start    help text                one engine call; an already-       │
//! │  other     pointer to /ayuda        resolved ticket answers with an    │
//! │                                     error toast, never re-applies.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Commands answer in Spanish; amounts use the `Money` display format.

use std::sync::Arc;

use tracing::{info, warn};

use botigest_core::DEFAULT_LOW_STOCK_THRESHOLD;
use botigest_db::Database;

use crate::error::BotResult;
use crate::events::TicketResolvedEvent;
use crate::transport::{BotTransport, CallbackQuery, Update};

/// A parsed approval callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackAction {
    Approve(i64),
    Reject(i64),
}

/// Parses `approve_ticket_<id>` / `reject_ticket_<id>` callback data.
pub fn parse_callback(data: &str) -> Option<CallbackAction> {
    if let Some(id) = data.strip_prefix("approve_ticket_") {
        return id.parse().ok().map(CallbackAction::Approve);
    }
    if let Some(id) = data.strip_prefix("reject_ticket_") {
        return id.parse().ok().map(CallbackAction::Reject);
    }
    None
}

/// Handles inbound updates against the store.
#[derive(Clone)]
pub struct CommandHandler<T: BotTransport> {
    db: Database,
    transport: Arc<T>,
}

impl<T: BotTransport> CommandHandler<T> {
    /// Creates a handler over an injected database and transport.
    pub fn new(db: Database, transport: Arc<T>) -> Self {
        CommandHandler { db, transport }
    }

    /// Routes one update. Transport failures propagate so the poller can
    /// log them; store failures are already rendered into the reply.
    pub async fn handle_update(&self, update: &Update) -> BotResult<()> {
        if let Some(callback) = &update.callback_query {
            return self.handle_callback(callback).await;
        }

        if let Some(text) = update.message.as_ref().and_then(|m| m.text.as_deref()) {
            if let Some(reply) = self.command_reply(text).await? {
                self.transport.send_message(&reply, None).await?;
            }
        }

        Ok(())
    }

    /// Builds the reply for a text command; `None` for non-command chatter.
    pub async fn command_reply(&self, text: &str) -> BotResult<Option<String>> {
        let command = text.trim();
        if !command.starts_with('/') {
            return Ok(None);
        }

        // "/stock@BotiGestBot" arrives in group chats.
        let command = command
            .split_whitespace()
            .next()
            .unwrap_or(command)
            .split('@')
            .next()
            .unwrap_or(command);

        let reply = match command {
            "/stock" => self.render_stock().await?,
            "/resumen" => self.render_summary().await?,
            "/alertas" => self.render_alerts().await?,
            "/ayuda" | "/start" => help_text(),
            _ => "Comando no reconocido. Usa /ayuda para ver los comandos disponibles."
                .to_string(),
        };

        Ok(Some(reply))
    }

    async fn render_stock(&self) -> BotResult<String> {
        let products = self.db.products().list().await?;
        if products.is_empty() {
            return Ok("No hay productos registrados.".to_string());
        }

        let mut reply = format!("📦 *Inventario* ({} productos)\n", products.len());
        for product in &products {
            reply.push_str(&format!(
                "\n• {} ({}): {} ud — {}",
                product.name, product.code, product.stock, product.price
            ));
        }
        Ok(reply)
    }

    async fn render_summary(&self) -> BotResult<String> {
        let stats = self.db.sales().daily_stats().await?;

        Ok(format!(
            "📊 *Resumen de Hoy*\n\n🧾 Ventas: {} ({})\n💰 Total: {} ({})\n📈 Promedio: {} ({})",
            stats.count,
            format_trend(stats.count_trend),
            stats.total,
            format_trend(stats.trend),
            stats.average,
            format_trend(stats.average_trend),
        ))
    }

    async fn render_alerts(&self) -> BotResult<String> {
        let threshold = self
            .db
            .settings()
            .low_stock_threshold(DEFAULT_LOW_STOCK_THRESHOLD)
            .await?;
        let low = self.db.products().low_stock(threshold).await?;

        if low.is_empty() {
            return Ok(format!(
                "✅ Sin alertas: ningún producto en o bajo el umbral de {threshold}."
            ));
        }

        let mut reply = format!("⚠️ *Stock Bajo* (umbral {threshold})\n");
        for product in &low {
            reply.push_str(&format!(
                "\n• {} ({}): {} ud",
                product.name, product.code, product.stock
            ));
        }
        Ok(reply)
    }

    /// Resolves an approval callback to exactly one engine call.
    ///
    /// Duplicate or stale callbacks (ticket already resolved) answer with
    /// an error toast; the ledger is never touched twice.
    pub async fn handle_callback(&self, callback: &CallbackQuery) -> BotResult<()> {
        let action = callback.data.as_deref().and_then(parse_callback);
        let Some(action) = action else {
            self.transport
                .answer_callback_query(&callback.id, "Acción no reconocida", false)
                .await?;
            return Ok(());
        };

        // Chat-side approvals are attributed to the admin account.
        let resolver = match self.db.users().find_admin().await {
            Ok(admin) => admin,
            Err(e) => {
                warn!(error = %e, "no admin account for callback attribution");
                self.transport
                    .answer_callback_query(&callback.id, &format!("Error: {e}"), true)
                    .await?;
                return Ok(());
            }
        };

        let (ticket_id, result, ack, approved) = match action {
            CallbackAction::Approve(id) => (
                id,
                self.db.tickets().approve(id, resolver.id).await,
                "✅ Ticket Aprobado Correctamente",
                true,
            ),
            CallbackAction::Reject(id) => (
                id,
                self.db.tickets().reject(id, resolver.id).await,
                "❌ Ticket Rechazado",
                false,
            ),
        };

        match result {
            Ok(_) => {
                info!(ticket_id, approved, "ticket resolved from chat");
                self.transport
                    .answer_callback_query(&callback.id, ack, false)
                    .await?;

                let event = TicketResolvedEvent {
                    id: ticket_id,
                    approved,
                    resolver_name: callback.from.first_name.clone(),
                };
                self.transport.send_message(&event.render(), None).await?;
            }
            Err(e) => {
                warn!(ticket_id, error = %e, "callback resolution failed");
                self.transport
                    .answer_callback_query(&callback.id, &format!("Error: {e}"), true)
                    .await?;
            }
        }

        Ok(())
    }
}

fn format_trend(trend: f64) -> String {
    format!("{trend:+.1}%")
}

fn help_text() -> String {
    "🤖 *BotiGest*\n\n\
     /stock — inventario completo con stock y precio\n\
     /resumen — ventas de hoy y tendencia vs. ayer\n\
     /alertas — productos con stock bajo\n\
     /ayuda — esta ayuda\n\n\
     Los tickets pendientes llegan con botones para aprobar o rechazar."
        .to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================
