//! Poll loop: incremental message sync for one open conversation.
//!
//! DESIGN
//! ======
//! One spawned task per open conversation: fetch immediately, merge, sleep
//! the full interval, repeat. Fetches are strictly serialized, so a slow
//! backend stretches the cadence instead of stacking requests. Each fetch
//! is bounded by the request timeout.
//!
//! CANCELLATION
//! ============
//! `PollHandle::stop` clears the liveness flag while holding the store
//! lock, then aborts the task. The merge re-checks the flag under the same
//! lock, so once `stop` returns no response can reach the store.
//!
//! ERROR HANDLING
//! ==============
//! A failed or timed-out fetch is logged and the loop keeps going.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::error::ChatError;
use super::seen::SeenMarker;
use super::store::SharedStore;
use crate::config::{ClientConfig, clamp_poll_interval};
use crate::net::api::{ApiError, ChatApi};
use crate::net::types::{ConversationId, Message, MessageId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    pub interval: Duration,
    pub request_timeout: Duration,
}

impl PollConfig {
    #[must_use]
    pub fn from_config(config: &ClientConfig) -> Self {
        Self { interval: clamp_poll_interval(config.poll_interval), request_timeout: config.timeouts.request }
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self::from_config(&ClientConfig::default())
    }
}

/// Everything the loop task needs, moved into it on start.
struct PollTask {
    api: Arc<dyn ChatApi>,
    conversation: ConversationId,
    store: Arc<SharedStore>,
    seen: SeenMarker,
    live: Arc<AtomicBool>,
    config: PollConfig,
}

/// Handle to a running poll loop. Dropping it stops the loop.
pub struct PollHandle {
    store: Arc<SharedStore>,
    live: Arc<AtomicBool>,
    task: Option<JoinHandle<()>>,
}

/// Start polling `conversation`. The first fetch runs immediately.
pub fn start(
    api: Arc<dyn ChatApi>,
    conversation: ConversationId,
    store: Arc<SharedStore>,
    seen: SeenMarker,
    config: PollConfig,
) -> PollHandle {
    let live = Arc::new(AtomicBool::new(true));
    let task = PollTask { api, conversation, store: Arc::clone(&store), seen, live: Arc::clone(&live), config };
    info!(%conversation, interval = ?config.interval, "chat poll loop started");
    PollHandle { store, live, task: Some(tokio::spawn(task.run())) }
}

impl PollHandle {
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }

    /// Stop the loop. Idempotent.
    pub fn stop(&mut self) {
        let Some(task) = self.task.take() else {
            return;
        };
        self.store.locked(|_| self.live.store(false, Ordering::SeqCst));
        task.abort();
        debug!("chat poll loop stopped");
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Bound a backend call by `limit`; expiry is reported as [`ApiError::Timeout`].
pub(crate) async fn bounded<T, F>(limit: Duration, request: F) -> Result<T, ApiError>
where
    F: Future<Output = Result<T, ApiError>>,
{
    tokio::time::timeout(limit, request)
        .await
        .map_err(|_| ApiError::Timeout)?
}

impl PollTask {
    async fn run(self) {
        while self.is_live() {
            self.tick().await;
            if !self.is_live() {
                break;
            }
            tokio::time::sleep(self.config.interval).await;
        }
    }

    fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }

    async fn tick(&self) {
        let cursor = self.store.cursor();
        let fetched = self.fetch_after(cursor).await;
        let conversation = self.conversation;

        match fetched {
            Ok(batch) => {
                let received = batch.len();
                let Some(added) = self.merge(batch) else {
                    return;
                };
                debug!(%conversation, %cursor, received, added, "chat poll tick");
            }
            Err(e) => {
                let retryable = e.retryable();
                let error = ChatError::TransientFetch(e);
                warn!(
                    %conversation,
                    %cursor,
                    code = error.error_code(),
                    retryable,
                    error = %error,
                    "chat poll fetch failed"
                );
            }
        }
    }

    async fn fetch_after(&self, cursor: MessageId) -> Result<Vec<Message>, ApiError> {
        let request = self.api.fetch_messages(self.conversation, Some(cursor));
        bounded(self.config.request_timeout, request).await
    }

    /// Merge under the store lock; `None` when the loop was stopped first.
    ///
    /// The revision bump and the seen mark happen under the same lock, so
    /// nothing is signalled once `stop` has returned.
    fn merge(&self, batch: Vec<Message>) -> Option<usize> {
        self.store.locked(|store| {
            if !self.is_live() {
                return None;
            }
            let added = store.append_incremental(batch);
            if added > 0 {
                self.store.bump();
                self.seen.mark();
            }
            Some(added)
        })
    }
}

#[cfg(test)]
#[path = "poll_test.rs"]
mod tests;
