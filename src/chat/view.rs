//! Conversation view: owns one open conversation from open to close.
//!
//! DESIGN
//! ======
//! Opening marks the conversation seen, loads the full history and then
//! starts the poll loop. The view is the only writer besides its own poll
//! loop; renderers read snapshots and wait on the revision receiver.
//!
//! ERROR HANDLING
//! ==============
//! A failed initial load leaves the view usable: the error is recorded and
//! the poll loop, starting from an empty cursor, fills the history on its
//! first successful tick. A failed send restores the draft and raises an
//! error notice; the user resubmits.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{info, warn};

use super::error::ChatError;
use super::poll::{self, PollConfig, PollHandle, bounded};
use super::seen::SeenMarker;
use super::store::{MessageStore, SharedStore};
use crate::config::ClientConfig;
use crate::net::api::ChatApi;
use crate::net::types::{ConversationId, Message, MessageId, OutgoingMessage, UserId};
use crate::notice::{Notice, NoticeMessage};

pub const DEFAULT_TITLE: &str = "Chat";
pub const LOAD_ERROR_TEXT: &str = "Could not load messages.";
pub const SEND_ERROR_TEXT: &str = "Message could not be sent.";

/// What the host knows when navigating to a conversation.
#[derive(Debug, Clone, Default)]
pub struct OpenParams {
    pub user: Option<UserId>,
    pub conversation: Option<ConversationId>,
    pub title: Option<String>,
}

pub struct ConversationView {
    api: Arc<dyn ChatApi>,
    conversation: ConversationId,
    user: UserId,
    title: String,
    store: Arc<SharedStore>,
    poll: Option<PollHandle>,
    draft: String,
    load_error: Option<String>,
    notice: Notice,
    request_timeout: Duration,
}

impl ConversationView {
    /// Open a conversation: mark seen, full fetch, start polling.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::MissingUser`] or [`ChatError::MissingConversation`]
    /// when the host could not resolve them. Fetch failures do not fail open.
    pub async fn open(api: Arc<dyn ChatApi>, params: OpenParams, config: &ClientConfig) -> Result<Self, ChatError> {
        let user = params.user.ok_or(ChatError::MissingUser)?;
        let conversation = params.conversation.ok_or(ChatError::MissingConversation)?;
        let title = params
            .title
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_TITLE.to_owned());

        let seen = SeenMarker::new(Arc::clone(&api), conversation, user);
        seen.mark();

        let store = SharedStore::new();
        let request_timeout = config.timeouts.request;
        let load_error = match bounded(request_timeout, api.fetch_messages(conversation, None)).await {
            Ok(messages) => {
                store.replace_all(messages);
                None
            }
            Err(e) => {
                let error = ChatError::TransientFetch(e);
                warn!(%conversation, code = error.error_code(), error = %error, "initial message load failed");
                Some(LOAD_ERROR_TEXT.to_owned())
            }
        };

        let poll = poll::start(
            Arc::clone(&api),
            conversation,
            Arc::clone(&store),
            seen,
            PollConfig::from_config(config),
        );

        info!(%conversation, %user, loaded = store.read(MessageStore::len), "conversation opened");
        Ok(Self {
            api,
            conversation,
            user,
            title,
            store,
            poll: Some(poll),
            draft: String::new(),
            load_error,
            notice: Notice::new(config.notice_ttl),
            request_timeout,
        })
    }

    // =========================================================================
    // SENDING
    // =========================================================================

    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.draft = text.into();
    }

    #[must_use]
    pub fn draft(&self) -> &str {
        &self.draft
    }

    /// Send the current draft.
    ///
    /// Blank drafts are ignored (`Ok(None)`) without a network call. On
    /// success the confirmed message is merged into the store.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::SendFailure`] after restoring the draft.
    pub async fn send(&mut self) -> Result<Option<Message>, ChatError> {
        let body = self.draft.trim();
        if body.is_empty() {
            return Ok(None);
        }
        let outgoing = OutgoingMessage { sender_id: self.user, body: body.to_owned() };
        let saved = std::mem::take(&mut self.draft);
        let conversation = self.conversation;

        let result = bounded(self.request_timeout, self.api.send_message(conversation, &outgoing)).await;
        match result {
            Ok(created) => {
                let message = created.into_message(&outgoing);
                self.store.append_incremental([message.clone()]);
                Ok(Some(message))
            }
            Err(e) => {
                self.draft = saved;
                self.notice.error(SEND_ERROR_TEXT);
                let error = ChatError::SendFailure(e);
                warn!(%conversation, code = error.error_code(), error = %error, "message send failed");
                Err(error)
            }
        }
    }

    // =========================================================================
    // LIFECYCLE
    // =========================================================================

    /// Stop polling and tear the view down.
    pub fn close(mut self) {
        self.stop_polling();
        info!(conversation = %self.conversation, "conversation closed");
    }

    #[must_use]
    pub fn is_polling(&self) -> bool {
        self.poll.as_ref().is_some_and(PollHandle::is_active)
    }

    fn stop_polling(&mut self) {
        if let Some(mut poll) = self.poll.take() {
            poll.stop();
        }
    }

    // =========================================================================
    // READ SIDE
    // =========================================================================

    #[must_use]
    pub fn conversation(&self) -> ConversationId {
        self.conversation
    }

    #[must_use]
    pub fn user(&self) -> UserId {
        self.user
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn messages(&self) -> Vec<Message> {
        self.store.snapshot()
    }

    #[must_use]
    pub fn messages_after(&self, id: MessageId) -> Vec<Message> {
        self.store.snapshot_after(id)
    }

    #[must_use]
    pub fn cursor(&self) -> MessageId {
        self.store.cursor()
    }

    /// Fires once per change to the message list.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.store.subscribe()
    }

    #[must_use]
    pub fn revision(&self) -> u64 {
        self.store.revision()
    }

    #[must_use]
    pub fn is_my_message(&self, message: &Message) -> bool {
        message.sender_id == self.user
    }

    /// Error text from the initial load, if it failed.
    #[must_use]
    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    #[must_use]
    pub fn notice(&self) -> Option<NoticeMessage> {
        self.notice.current()
    }
}

impl Drop for ConversationView {
    fn drop(&mut self) {
        self.stop_polling();
    }
}

#[cfg(test)]
#[path = "view_test.rs"]
mod tests;
