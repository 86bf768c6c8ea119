//! # Ticket Repository (Ticket Workflow Engine)
//!
//! Pending → {Approved, Rejected}, both terminal. Approval applies the
//! payload's inventory effect and flips the status inside one transaction:
//! either the ledger moved AND the ticket is resolved, or neither happened.
//!
//! ## Approval Dispatch
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                   approve(ticket_id, resolver)                          │
//! │                                                                         │
//! │   BEGIN                                                                 │
//! │   fetch ticket ── missing ─► NotFound    not pending ─► State          │
//! │       │                                                                 │
//! │       ▼ dispatch on payload                                             │
//! │   stock_request   → stock = new_stock       (absolute overwrite)        │
//! │   stock_arrival   → stock = stock + qty                                 │
//! │   shrinkage       → stock = stock - qty     (underflow ─► Validation,   │
//! │                                              ticket STAYS pending)      │
//! │   product_update  → one field overwrite     (price coerced to Money)    │
//! │   observation     → no ledger effect                                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │   status ← approved, resolved_by, resolved_at                           │
//! │   COMMIT                                                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::{debug, info, warn};

use crate::error::{StoreError, StoreResult};
use botigest_core::ticket::coerce_price;
use botigest_core::{
    NewTicket, ProductField, Ticket, TicketPayload, TicketStatus, ValidationError,
};

/// Raw row shape; `payload` is parsed into [`TicketPayload`] on the way out.
#[derive(Debug, sqlx::FromRow)]
struct TicketRow {
    id: i64,
    status: TicketStatus,
    title: String,
    description: Option<String>,
    payload: String,
    attachment_path: Option<String>,
    created_by: Option<i64>,
    created_at: DateTime<Utc>,
    resolved_by: Option<i64>,
    resolved_at: Option<DateTime<Utc>>,
}

impl TryFrom<TicketRow> for Ticket {
    type Error = StoreError;

    fn try_from(row: TicketRow) -> Result<Self, Self::Error> {
        let payload: TicketPayload = serde_json::from_str(&row.payload)?;
        Ok(Ticket {
            id: row.id,
            status: row.status,
            title: row.title,
            description: row.description,
            payload,
            attachment_path: row.attachment_path,
            created_by: row.created_by,
            created_at: row.created_at,
            resolved_by: row.resolved_by,
            resolved_at: row.resolved_at,
        })
    }
}

/// Repository for ticket operations.
#[derive(Debug, Clone)]
pub struct TicketRepository {
    pool: SqlitePool,
}

impl TicketRepository {
    /// Creates a new TicketRepository.
    pub fn new(pool: SqlitePool) -> Self {
        TicketRepository { pool }
    }

    /// Creates a pending ticket.
    ///
    /// The payload is persisted as tagged JSON; the `type` column mirrors
    /// the kind tag for plain SQL filtering.
    pub async fn create(&self, new_ticket: &NewTicket) -> StoreResult<Ticket> {
        new_ticket.validate()?;

        let payload_json = serde_json::to_string(&new_ticket.payload)?;
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO tickets (type, status, title, description, payload, attachment_path, created_by, created_at)
            VALUES (?1, 'pending', ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(new_ticket.payload.kind().as_str())
        .bind(new_ticket.title.trim())
        .bind(&new_ticket.description)
        .bind(payload_json)
        .bind(&new_ticket.attachment_path)
        .bind(new_ticket.created_by)
        .bind(now)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        info!(ticket_id = id, kind = %new_ticket.payload.kind().as_str(), "ticket created");

        self.get_by_id(id)
            .await?
            .ok_or_else(|| StoreError::not_found("Ticket", id))
    }

    /// Gets a ticket by ID.
    pub async fn get_by_id(&self, id: i64) -> StoreResult<Option<Ticket>> {
        let row = sqlx::query_as::<_, TicketRow>("SELECT * FROM tickets WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Ticket::try_from).transpose()
    }

    /// Pending tickets, oldest first (approval queue order).
    pub async fn list_pending(&self) -> StoreResult<Vec<Ticket>> {
        let rows = sqlx::query_as::<_, TicketRow>(
            "SELECT * FROM tickets WHERE status = 'pending' ORDER BY created_at, id",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Ticket::try_from).collect()
    }

    /// Approves a pending ticket, applying its inventory effect.
    ///
    /// Effect and status flip commit together. A shrinkage that would push
    /// stock negative fails with a Validation error and leaves the ticket
    /// pending, so it can be approved later once stock arrives, or rejected.
    ///
    /// ## Errors
    /// * `NotFound` - no such ticket, or its target product is gone
    /// * `State` - ticket already resolved (duplicate approval is rejected,
    ///   never applied twice)
    /// * `Validation` - shrinkage underflow
    pub async fn approve(&self, ticket_id: i64, resolver_user_id: i64) -> StoreResult<Ticket> {
        let mut tx = self.pool.begin().await?;

        let ticket = self.fetch_pending(&mut tx, ticket_id).await?;
        debug!(ticket_id, kind = %ticket.kind().as_str(), "approving ticket");

        apply_payload(&mut tx, &ticket.payload).await?;
        self.resolve(&mut tx, ticket_id, TicketStatus::Approved, resolver_user_id)
            .await?;

        tx.commit().await?;
        info!(ticket_id, resolver = resolver_user_id, "ticket approved");

        self.get_by_id(ticket_id)
            .await?
            .ok_or_else(|| StoreError::not_found("Ticket", ticket_id))
    }

    /// Rejects a pending ticket. No inventory effect, ever.
    pub async fn reject(&self, ticket_id: i64, resolver_user_id: i64) -> StoreResult<Ticket> {
        let mut tx = self.pool.begin().await?;

        self.fetch_pending(&mut tx, ticket_id).await?;
        self.resolve(&mut tx, ticket_id, TicketStatus::Rejected, resolver_user_id)
            .await?;

        tx.commit().await?;
        info!(ticket_id, resolver = resolver_user_id, "ticket rejected");

        self.get_by_id(ticket_id)
            .await?
            .ok_or_else(|| StoreError::not_found("Ticket", ticket_id))
    }

    /// Fetches a ticket inside the transaction, failing unless it is pending.
    async fn fetch_pending(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        ticket_id: i64,
    ) -> StoreResult<Ticket> {
        let row = sqlx::query_as::<_, TicketRow>("SELECT * FROM tickets WHERE id = ?1")
            .bind(ticket_id)
            .fetch_optional(&mut **tx)
            .await?
            .ok_or_else(|| StoreError::not_found("Ticket", ticket_id))?;

        if row.status != TicketStatus::Pending {
            warn!(ticket_id, status = %row.status.as_str(), "ticket already resolved");
            return Err(StoreError::state("Ticket", ticket_id, row.status.as_str()));
        }

        Ticket::try_from(row)
    }

    async fn resolve(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        ticket_id: i64,
        status: TicketStatus,
        resolver_user_id: i64,
    ) -> StoreResult<()> {
        // Guarded on pending so a racing resolver loses cleanly.
        let result = sqlx::query(
            r#"
            UPDATE tickets
            SET status = ?2, resolved_by = ?3, resolved_at = ?4
            WHERE id = ?1 AND status = 'pending'
            "#,
        )
        .bind(ticket_id)
        .bind(status)
        .bind(resolver_user_id)
        .bind(Utc::now())
        .execute(&mut **tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::state("Ticket", ticket_id, "resolved"));
        }
        Ok(())
    }
}

/// Applies the inventory effect of an approved payload inside the caller's
/// transaction.
async fn apply_payload(
    tx: &mut Transaction<'_, Sqlite>,
    payload: &TicketPayload,
) -> StoreResult<()> {
    match payload {
        TicketPayload::StockRequest {
            product_id,
            new_stock,
        } => {
            set_stock_absolute(tx, *product_id, *new_stock).await?;
        }

        TicketPayload::StockArrival {
            product_id,
            quantity,
        } => {
            let result = sqlx::query("UPDATE products SET stock = stock + ?2 WHERE id = ?1")
                .bind(product_id)
                .bind(quantity)
                .execute(&mut **tx)
                .await?;
            require_product(result.rows_affected(), *product_id)?;
        }

        TicketPayload::Shrinkage {
            product_id,
            quantity,
            ..
        } => {
            // Check against the live level so the caller gets a readable
            // underflow error instead of the raw trigger abort.
            let current: Option<i64> = sqlx::query_scalar("SELECT stock FROM products WHERE id = ?1")
                .bind(product_id)
                .fetch_optional(&mut **tx)
                .await?;

            let current = current.ok_or_else(|| StoreError::not_found("Product", *product_id))?;
            if current < *quantity {
                return Err(ValidationError::StockUnderflow {
                    current,
                    requested: *quantity,
                }
                .into());
            }

            sqlx::query("UPDATE products SET stock = stock - ?2 WHERE id = ?1")
                .bind(product_id)
                .bind(quantity)
                .execute(&mut **tx)
                .await?;
        }

        TicketPayload::ProductUpdate {
            product_id,
            field,
            value,
        } => {
            let result = match field {
                ProductField::Name => {
                    sqlx::query("UPDATE products SET name = ?2 WHERE id = ?1")
                        .bind(product_id)
                        .bind(value.trim())
                        .execute(&mut **tx)
                        .await?
                }
                ProductField::Description => {
                    sqlx::query("UPDATE products SET description = ?2 WHERE id = ?1")
                        .bind(product_id)
                        .bind(value.trim())
                        .execute(&mut **tx)
                        .await?
                }
                ProductField::Price => {
                    let price = coerce_price(value)?;
                    sqlx::query("UPDATE products SET price = ?2 WHERE id = ?1")
                        .bind(product_id)
                        .bind(price)
                        .execute(&mut **tx)
                        .await?
                }
            };
            require_product(result.rows_affected(), *product_id)?;
        }

        TicketPayload::Observation => {}
    }

    Ok(())
}

async fn set_stock_absolute(
    tx: &mut Transaction<'_, Sqlite>,
    product_id: i64,
    new_stock: i64,
) -> StoreResult<()> {
    let result = sqlx::query("UPDATE products SET stock = ?2 WHERE id = ?1")
        .bind(product_id)
        .bind(new_stock)
        .execute(&mut **tx)
        .await?;
    require_product(result.rows_affected(), product_id)
}

fn require_product(rows_affected: u64, product_id: i64) -> StoreResult<()> {
    if rows_affected == 0 {
        return Err(StoreError::not_found("Product", product_id));
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
