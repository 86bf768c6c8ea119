//! # Bot Transport
//!
//! The seam between gateway logic and the Telegram Bot API. Commands,
//! callbacks, notifier and poller all talk to a [`BotTransport`], so every
//! one of them is testable against a mock with zero network.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │   commands / notifier / poller                                          │
//! │            │                                                            │
//! │            ▼                                                            │
//! │   trait BotTransport  ◄──────  MockTransport (tests)                    │
//! │            │                                                            │
//! │            ▼                                                            │
//! │   TelegramClient (reqwest) ──► api.telegram.org/bot<token>/<method>     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{BotError, BotResult};

// =============================================================================
// Wire Types (Telegram Bot API subset)
// =============================================================================

/// One update from `getUpdates`. Only the fields the gateway acts on.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub callback_query: Option<CallbackQuery>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: TelegramUser,
    #[serde(default)]
    pub data: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelegramUser {
    #[serde(default)]
    pub first_name: String,
}

/// Inline keyboard attached to an outbound message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplyMarkup {
    pub inline_keyboard: Vec<Vec<InlineKeyboardButton>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InlineKeyboardButton {
    pub text: String,
    pub callback_data: String,
}

impl ReplyMarkup {
    /// The approve/reject row attached to approval-gated ticket messages.
    pub fn approval_row(ticket_id: i64) -> Self {
        ReplyMarkup {
            inline_keyboard: vec![vec![
                InlineKeyboardButton {
                    text: "✅ Aceptar".to_string(),
                    callback_data: format!("approve_ticket_{ticket_id}"),
                },
                InlineKeyboardButton {
                    text: "❌ Rechazar".to_string(),
                    callback_data: format!("reject_ticket_{ticket_id}"),
                },
            ]],
        }
    }
}

// =============================================================================
// Transport Trait
// =============================================================================

/// Outbound and inbound channel to the chat.
#[async_trait]
pub trait BotTransport: Send + Sync {
    /// Sends a Markdown message to the configured chat.
    async fn send_message(&self, text: &str, markup: Option<ReplyMarkup>) -> BotResult<()>;

    /// Acknowledges a callback query with a short toast (or alert popup).
    async fn answer_callback_query(
        &self,
        callback_query_id: &str,
        text: &str,
        show_alert: bool,
    ) -> BotResult<()>;

    /// Long-polls for updates past `offset`.
    async fn get_updates(&self, offset: i64, timeout_secs: u64) -> BotResult<Vec<Update>>;
}

// =============================================================================
// Telegram Client
// =============================================================================

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    #[serde(default)]
    result: Option<T>,
    #[serde(default)]
    description: Option<String>,
}

/// `reqwest`-backed [`BotTransport`] against the real Telegram Bot API.
#[derive(Debug, Clone)]
pub struct TelegramClient {
    http: reqwest::Client,
    token: String,
    chat_id: String,
}

impl TelegramClient {
    /// Creates a client bound to one bot token and one target chat.
    pub fn new(token: impl Into<String>, chat_id: impl Into<String>) -> BotResult<Self> {
        let token = token.into();
        let chat_id = chat_id.into();

        if token.is_empty() {
            return Err(BotError::NotConfigured("bot token is empty"));
        }
        if chat_id.is_empty() {
            return Err(BotError::NotConfigured("chat id is empty"));
        }

        Ok(TelegramClient {
            http: reqwest::Client::new(),
            token,
            chat_id,
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("https://api.telegram.org/bot{}/{}", self.token, method)
    }

    async fn call<T: serde::de::DeserializeOwned + Default>(
        &self,
        method: &str,
        body: &serde_json::Value,
    ) -> BotResult<T> {
        let response = self
            .http
            .post(self.method_url(method))
            .json(body)
            .send()
            .await?;

        let parsed: ApiResponse<T> = response.json().await?;
        if !parsed.ok {
            return Err(BotError::Api(
                parsed.description.unwrap_or_else(|| method.to_string()),
            ));
        }

        parsed
            .result
            .ok_or_else(|| BotError::Api(format!("{method}: ok response without result")))
    }
}

#[async_trait]
impl BotTransport for TelegramClient {
    async fn send_message(&self, text: &str, markup: Option<ReplyMarkup>) -> BotResult<()> {
        let mut body = serde_json::json!({
            "chat_id": self.chat_id,
            "text": text,
            "parse_mode": "Markdown",
        });
        if let Some(markup) = markup {
            body["reply_markup"] = serde_json::to_value(markup)
                .map_err(|e| BotError::Api(format!("markup serialization: {e}")))?;
        }

        debug!(len = text.len(), "sendMessage");
        let _: serde_json::Value = self.call("sendMessage", &body).await?;
        Ok(())
    }

    async fn answer_callback_query(
        &self,
        callback_query_id: &str,
        text: &str,
        show_alert: bool,
    ) -> BotResult<()> {
        let body = serde_json::json!({
            "callback_query_id": callback_query_id,
            "text": text,
            "show_alert": show_alert,
        });

        // Telegram answers plain `true` here.
        let _: serde_json::Value = self.call("answerCallbackQuery", &body).await?;
        Ok(())
    }

    async fn get_updates(&self, offset: i64, timeout_secs: u64) -> BotResult<Vec<Update>> {
        let body = serde_json::json!({
            "offset": offset,
            "timeout": timeout_secs,
        });

        self.call("getUpdates", &body).await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
