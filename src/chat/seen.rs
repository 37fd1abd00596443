//! Fire-and-forget read receipts.
//!
//! Each mark spawns its own request; nothing waits on it and nothing
//! retries. A failure is logged and otherwise ignored.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::error::ChatError;
use crate::net::api::ChatApi;
use crate::net::types::{ConversationId, UserId};

#[derive(Clone)]
pub struct SeenMarker {
    api: Arc<dyn ChatApi>,
    conversation: ConversationId,
    user: UserId,
}

impl SeenMarker {
    #[must_use]
    pub fn new(api: Arc<dyn ChatApi>, conversation: ConversationId, user: UserId) -> Self {
        Self { api, conversation, user }
    }

    /// Notify the backend that the conversation was viewed.
    ///
    /// The returned handle may be dropped; the request still runs.
    #[allow(clippy::must_use_candidate)]
    pub fn mark(&self) -> JoinHandle<()> {
        let api = Arc::clone(&self.api);
        let conversation = self.conversation;
        let user = self.user;
        tokio::spawn(async move {
            match api.mark_seen(conversation, user).await {
                Ok(()) => debug!(%conversation, %user, "conversation marked seen"),
                Err(e) => {
                    let error = ChatError::SeenMarkerFailure(e);
                    warn!(%conversation, %user, code = error.error_code(), error = %error, "seen marker failed");
                }
            }
        })
    }
}

#[cfg(test)]
#[path = "seen_test.rs"]
mod tests;
