//! Shared fixtures for chat tests: message builders and a scripted `ChatApi`.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::Notify;

use crate::net::api::{ApiError, ChatApi};
use crate::net::types::{
    ConversationId, ConversationSummary, CreatedMessage, Message, MessageId, OutgoingMessage, UserId,
};

pub(crate) fn msg(id: i64) -> Message {
    Message {
        id: MessageId(id),
        sender_id: UserId(1),
        body: format!("message {id}"),
        sent_at: DateTime::<Utc>::UNIX_EPOCH,
    }
}

pub(crate) fn msgs(ids: &[i64]) -> Vec<Message> {
    ids.iter().copied().map(msg).collect()
}

pub(crate) fn ids(messages: &[Message]) -> Vec<i64> {
    messages.iter().map(|m| m.id.0).collect()
}

/// One scripted answer to `fetch_messages`.
pub(crate) enum FetchStep {
    Reply(Result<Vec<Message>, ApiError>),
    /// Wait for the gate to be notified, then reply.
    Gated(Arc<Notify>, Vec<Message>),
    /// Never resolve.
    Hang,
}

/// `ChatApi` double that replays scripted fetch/send results and records calls.
///
/// An exhausted fetch script answers with an empty batch.
#[derive(Default)]
pub(crate) struct MockChatApi {
    fetch_script: Mutex<VecDeque<FetchStep>>,
    send_script: Mutex<VecDeque<Result<CreatedMessage, ApiError>>>,
    conversations: Mutex<Option<Result<Vec<ConversationSummary>, ApiError>>>,
    seen_fails: AtomicBool,
    pub(crate) fetch_calls: Mutex<Vec<(ConversationId, Option<MessageId>)>>,
    pub(crate) sent: Mutex<Vec<(ConversationId, OutgoingMessage)>>,
    pub(crate) seen_calls: Mutex<Vec<(ConversationId, UserId)>>,
}

impl MockChatApi {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn push_fetch(&self, step: FetchStep) {
        self.fetch_script.lock().unwrap().push_back(step);
    }

    pub(crate) fn push_reply(&self, ids: &[i64]) {
        self.push_fetch(FetchStep::Reply(Ok(msgs(ids))));
    }

    pub(crate) fn push_fetch_error(&self) {
        self.push_fetch(FetchStep::Reply(Err(ApiError::Status { status: 502, body: "bad gateway".into() })));
    }

    pub(crate) fn push_send(&self, result: Result<CreatedMessage, ApiError>) {
        self.send_script.lock().unwrap().push_back(result);
    }

    pub(crate) fn set_conversations(&self, result: Result<Vec<ConversationSummary>, ApiError>) {
        *self.conversations.lock().unwrap() = Some(result);
    }

    pub(crate) fn fail_seen(&self) {
        self.seen_fails.store(true, Ordering::SeqCst);
    }

    pub(crate) fn fetch_count(&self) -> usize {
        self.fetch_calls.lock().unwrap().len()
    }

    pub(crate) fn seen_count(&self) -> usize {
        self.seen_calls.lock().unwrap().len()
    }

    pub(crate) fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl ChatApi for MockChatApi {
    async fn fetch_messages(
        &self,
        conversation: ConversationId,
        after: Option<MessageId>,
    ) -> Result<Vec<Message>, ApiError> {
        self.fetch_calls.lock().unwrap().push((conversation, after));
        let step = self.fetch_script.lock().unwrap().pop_front();
        match step {
            None => Ok(Vec::new()),
            Some(FetchStep::Reply(result)) => result,
            Some(FetchStep::Gated(gate, messages)) => {
                gate.notified().await;
                Ok(messages)
            }
            Some(FetchStep::Hang) => std::future::pending().await,
        }
    }

    async fn send_message(
        &self,
        conversation: ConversationId,
        message: &OutgoingMessage,
    ) -> Result<CreatedMessage, ApiError> {
        self.sent.lock().unwrap().push((conversation, message.clone()));
        self.send_script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(ApiError::Request("no scripted send".into())))
    }

    async fn mark_seen(&self, conversation: ConversationId, user: UserId) -> Result<(), ApiError> {
        self.seen_calls.lock().unwrap().push((conversation, user));
        if self.seen_fails.load(Ordering::SeqCst) {
            return Err(ApiError::Status { status: 500, body: "seen down".into() });
        }
        Ok(())
    }

    async fn list_conversations(&self, _user: UserId) -> Result<Vec<ConversationSummary>, ApiError> {
        self.conversations.lock().unwrap().take().unwrap_or(Ok(Vec::new()))
    }
}

/// Created-message response carrying only the server id.
pub(crate) fn created(id: i64) -> CreatedMessage {
    CreatedMessage { id: MessageId(id), sender_id: None, body: None, sent_at: None }
}

/// Yield to spawned tasks until `cond` holds. Panics after a bounded wait.
pub(crate) async fn wait_until<F: Fn() -> bool>(cond: F) {
    for _ in 0..200 {
        if cond() {
            return;
        }
        tokio::task::yield_now().await;
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    assert!(cond(), "condition not reached in time");
}

/// Let spawned tasks run without advancing past the next timer.
pub(crate) async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}
