//! # Poller
//!
//! The gateway's inbound loop: long-poll `getUpdates`, feed each update to
//! the [`CommandHandler`], advance the offset. Runs as an owned tokio task
//! with an explicit handle; shutdown goes through a watch channel, so stop
//! is a message, not a flag somebody may forget to check.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  PollerHandle                    poll task                              │
//! │  ───────────                     ─────────                              │
//! │  shutdown() ──watch──────────►   select! {                              │
//! │  (awaits task exit)                  _ = shutdown.changed() => break    │
//! │                                      r = get_updates(offset) => {       │
//! │                                          handle each, offset = id + 1   │
//! │                                          on error: log, backoff sleep   │
//! │                                      }                                  │
//! │                                  }                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::commands::CommandHandler;
use crate::transport::BotTransport;

/// Long-poll timeout passed to `getUpdates`.
const POLL_TIMEOUT_SECS: u64 = 10;
/// Pause between successful poll rounds.
const POLL_INTERVAL: Duration = Duration::from_secs(2);
/// Pause after a failed poll round.
const ERROR_BACKOFF: Duration = Duration::from_secs(5);

/// Handle to a running poll task. Dropping it without calling
/// [`PollerHandle::shutdown`] detaches the task.
pub struct PollerHandle {
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl PollerHandle {
    /// Signals the loop to stop and waits for it to exit.
    pub async fn shutdown(self) {
        // Receiver gone means the task already exited.
        let _ = self.shutdown_tx.send(true);
        if let Err(e) = self.task.await {
            error!(error = %e, "poll task panicked");
        }
    }
}

/// Spawns the polling loop.
pub fn spawn<T: BotTransport + 'static>(
    transport: Arc<T>,
    handler: CommandHandler<T>,
) -> PollerHandle {
    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

    let task = tokio::spawn(async move {
        info!("telegram poller started");
        let mut offset: i64 = 0;

        loop {
            let updates = tokio::select! {
                _ = shutdown_rx.changed() => break,
                result = transport.get_updates(offset, POLL_TIMEOUT_SECS) => result,
            };

            match updates {
                Ok(updates) => {
                    for update in updates {
                        if let Err(e) = handler.handle_update(&update).await {
                            warn!(update_id = update.update_id, error = %e, "update handling failed");
                        }
                        // Advance past the update even when handling failed;
                        // replaying it would re-fail the same way.
                        offset = update.update_id + 1;
                    }

                    tokio::select! {
                        _ = shutdown_rx.changed() => break,
                        _ = tokio::time::sleep(POLL_INTERVAL) => {}
                    }
                }
                Err(e) => {
                    warn!(error = %e, "poll round failed, backing off");
                    tokio::select! {
                        _ = shutdown_rx.changed() => break,
                        _ = tokio::time::sleep(ERROR_BACKOFF) => {}
                    }
                }
            }
        }

        info!("telegram poller stopped");
    });

    PollerHandle { shutdown_tx, task }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{BotError, BotResult};
    use crate::transport::{Chat, Message, ReplyMarkup, Update};
    use async_trait::async_trait;
    use botigest_db::{Database, DbConfig};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Serves scripted update batches, then empties forever.
    struct ScriptedTransport {
        batches: Mutex<VecDeque<BotResult<Vec<Update>>>>,
        sent: Mutex<Vec<String>>,
        offsets: Mutex<Vec<i64>>,
    }

    impl ScriptedTransport {
        fn new(batches: Vec<BotResult<Vec<Update>>>) -> Self {
            ScriptedTransport {
                batches: Mutex::new(batches.into()),
                sent: Mutex::new(Vec::new()),
                offsets: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl BotTransport for ScriptedTransport {
        async fn send_message(&self, text: &str, _: Option<ReplyMarkup>) -> BotResult<()> {
            self.sent.lock().unwrap().push(text.to_string());
            Ok(())
        }
        async fn answer_callback_query(&self, _: &str, _: &str, _: bool) -> BotResult<()> {
            Ok(())
        }
        async fn get_updates(&self, offset: i64, _: u64) -> BotResult<Vec<Update>> {
            self.offsets.lock().unwrap().push(offset);
            self.batches
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(Vec::new()))
        }
    }

    fn text_update(update_id: i64, text: &str) -> Update {
        Update {
            update_id,
            message: Some(Message {
                chat: Chat { id: 1 },
                text: Some(text.to_string()),
            }),
            callback_query: None,
        }
    }

    #[tokio::test]
    async fn processes_updates_and_advances_offset() {
        // Pool setup needs real time (sqlx's acquire timeout runs on the
        // tokio clock while the connection opens off it); pause afterwards.
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        tokio::time::pause();
        let transport = Arc::new(ScriptedTransport::new(vec![Ok(vec![
            text_update(5, "/ayuda"),
            text_update(6, "hola"),
        ])]));

        let handler = CommandHandler::new(db, transport.clone());
        let handle = spawn(transport.clone(), handler);

        // Paused time auto-advances through the poll sleeps.
        tokio::time::sleep(Duration::from_secs(30)).await;
        handle.shutdown().await;

        let offsets = transport.offsets.lock().unwrap();
        assert_eq!(offsets[0], 0);
        assert!(offsets.len() >= 2, "poller should keep polling");
        assert_eq!(offsets[1], 7, "offset skips past handled updates");

        let sent = transport.sent.lock().unwrap();
        assert_eq!(sent.len(), 1, "only /ayuda produces a reply");
        assert!(sent[0].contains("/resumen"));
    }

    #[tokio::test]
    async fn transport_errors_back_off_and_continue() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        tokio::time::pause();
        let transport = Arc::new(ScriptedTransport::new(vec![
            Err(BotError::Api("flaky".to_string())),
            Ok(vec![text_update(1, "/ayuda")]),
        ]));

        let handler = CommandHandler::new(db, transport.clone());
        let handle = spawn(transport.clone(), handler);

        tokio::time::sleep(Duration::from_secs(30)).await;
        handle.shutdown().await;

        let sent = transport.sent.lock().unwrap();
        assert_eq!(sent.len(), 1, "loop survives a failed round");
    }

    #[tokio::test]
    async fn shutdown_stops_the_loop() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let transport = Arc::new(ScriptedTransport::new(Vec::new()));

        let handler = CommandHandler::new(db, transport.clone());
        let handle = spawn(transport.clone(), handler);

        // Must resolve promptly even while the loop is mid-poll.
        tokio::time::timeout(Duration::from_secs(5), handle.shutdown())
            .await
            .expect("shutdown should not hang");
    }
}
