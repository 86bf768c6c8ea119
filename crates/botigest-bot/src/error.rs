//! Gateway error types.
//!
//! A [`BotError`] never propagates into a business operation: notification
//! sends swallow it (logged), the poller logs it and backs off. It only
//! surfaces to callers driving the gateway directly.

use thiserror::Error;

use botigest_db::StoreError;

/// Notification gateway errors.
#[derive(Debug, Error)]
pub enum BotError {
    /// Network-level failure talking to the Telegram API.
    #[error("telegram http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered `ok: false`.
    #[error("telegram api error: {0}")]
    Api(String),

    /// Gateway is not configured (missing token or chat id).
    #[error("telegram gateway not configured: {0}")]
    NotConfigured(&'static str),

    /// A command or callback handler hit the store.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result type for gateway operations.
pub type BotResult<T> = Result<T, BotError>;
