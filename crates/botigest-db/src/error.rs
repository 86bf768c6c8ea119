//! # Storage Error Types
//!
//! Error types for database operations, realizing the taxonomy every
//! mutating operation reports against:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Taxonomy                                       │
//! │                                                                         │
//! │  Validation      "nothing happened, fix your input"                    │
//! │  NotFound/State  "this state can no longer change"                     │
//! │  Conflict        "business rule conflict" (duplicate open shift, ...)  │
//! │  Constraint      unique / foreign key / stock guard - not retryable    │
//! │  Busy            lock timeout - transient, SAFE TO RETRY               │
//! │                                                                         │
//! │  Every failed transaction rolls back fully; a StoreError means the     │
//! │  database is exactly as it was before the call.                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use botigest_core::ValidationError;
use thiserror::Error;

/// Message raised by the stock guard triggers in `002_stock_guard.sql`.
/// Kept in one place: error mapping below matches on it.
const STOCK_GUARD_MESSAGE: &str = "stock cannot go negative";

/// Database operation errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Malformed or out-of-range input, rejected before any write.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Entity not found in database.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Operation not valid for the entity's current state
    /// (closing a closed shift, resolving a resolved ticket).
    #[error("{entity} {id} is {actual}, cannot perform operation")]
    State {
        entity: String,
        id: String,
        actual: String,
    },

    /// Business-rule conflict (an open shift already exists).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Unique constraint violation (duplicate product code, duplicate rut).
    #[error("duplicate value: {constraint} already exists")]
    UniqueViolation { constraint: String },

    /// Foreign key constraint violation (category still in use,
    /// sale line referencing a missing product).
    #[error("foreign key violation: {0}")]
    ForeignKeyViolation(String),

    /// The write would have left a product with negative stock and was
    /// aborted by the guard trigger. Not retryable.
    #[error("stock cannot go negative: {0}")]
    StockWouldGoNegative(String),

    /// The database was locked longer than the busy timeout. Transient:
    /// the caller may retry with backoff.
    #[error("database is busy, try again")]
    Busy,

    /// Database connection failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("query failed: {0}")]
    QueryFailed(String),
}

impl StoreError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        StoreError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Creates a State error (wrong-state transition attempt).
    pub fn state(entity: impl Into<String>, id: impl ToString, actual: impl Into<String>) -> Self {
        StoreError::State {
            entity: entity.into(),
            id: id.to_string(),
            actual: actual.into(),
        }
    }

    /// Whether the caller may retry the operation as-is.
    /// Only lock timeouts qualify; constraint failures never do.
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Busy)
    }
}

/// Convert sqlx errors to StoreError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::Database + "stock cannot go negative" → StockWouldGoNegative
/// sqlx::Error::Database + UNIQUE constraint          → UniqueViolation
/// sqlx::Error::Database + FOREIGN KEY constraint     → ForeignKeyViolation
/// sqlx::Error::Database + "database is locked"       → Busy
/// sqlx::Error::PoolTimedOut                          → Busy
/// Other                                              → QueryFailed
/// ```
impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StoreError::NotFound {
                entity: "Record".to_string(),
                id: "unknown".to_string(),
            },

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                if msg.contains(STOCK_GUARD_MESSAGE) {
                    StoreError::StockWouldGoNegative(msg.to_string())
                } else if msg.contains("CHECK constraint failed: stock") {
                    // Same invariant, tripped via the column CHECK instead
                    // of the trigger (e.g. direct INSERT).
                    StoreError::StockWouldGoNegative(msg.to_string())
                } else if msg.contains("UNIQUE constraint failed") {
                    let constraint = msg
                        .split("UNIQUE constraint failed: ")
                        .nth(1)
                        .unwrap_or("unknown")
                        .to_string();
                    StoreError::UniqueViolation { constraint }
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    StoreError::ForeignKeyViolation(msg.to_string())
                } else if msg.contains("database is locked") || msg.contains("database table is locked")
                {
                    StoreError::Busy
                } else {
                    StoreError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => StoreError::Busy,

            sqlx::Error::PoolClosed => StoreError::ConnectionFailed("pool is closed".to_string()),

            _ => StoreError::QueryFailed(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for StoreError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        StoreError::MigrationFailed(err.to_string())
    }
}

/// Ticket payloads are stored as JSON; a row that fails to parse is a
/// storage-level problem, not a validation problem.
impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::QueryFailed(format!("malformed payload JSON: {err}"))
    }
}

/// Result type for database operations.
pub type StoreResult<T> = Result<T, StoreError>;
