//! Message store for one open conversation.
//!
//! DESIGN
//! ======
//! Messages are kept in strictly ascending id order with no duplicates.
//! The cursor is never stored: it is the id of the last element, or
//! `MessageId::NONE` when empty. Anything at or below the cursor is
//! dropped on append, so replayed or overlapping batches are harmless.

use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::watch;

use crate::net::types::{Message, MessageId};

#[derive(Clone, Debug, Default)]
pub struct MessageStore {
    messages: Vec<Message>,
}

impl MessageStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole sequence (fresh load). Out-of-order or duplicate
    /// ids in `messages` are filtered the same way as [`Self::append_incremental`].
    pub fn replace_all(&mut self, messages: Vec<Message>) {
        self.messages.clear();
        self.append_incremental(messages);
    }

    /// Append messages newer than the cursor, in the order given.
    ///
    /// Returns how many were appended; zero means nothing observable changed.
    pub fn append_incremental<I>(&mut self, messages: I) -> usize
    where
        I: IntoIterator<Item = Message>,
    {
        let before = self.messages.len();
        for message in messages {
            if message.id > self.cursor() {
                self.messages.push(message);
            }
        }
        self.messages.len() - before
    }

    /// Id of the newest message, or `MessageId::NONE` for an empty store.
    #[must_use]
    pub fn cursor(&self) -> MessageId {
        self.messages.last().map_or(MessageId::NONE, |m| m.id)
    }

    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Messages with an id strictly greater than `id`.
    #[must_use]
    pub fn messages_after(&self, id: MessageId) -> &[Message] {
        let start = self.messages.partition_point(|m| m.id <= id);
        &self.messages[start..]
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

// =============================================================================
// SHARED STORE
// =============================================================================

/// A [`MessageStore`] shared by a conversation view and its poll loop,
/// with a revision counter that bumps once per observable change.
///
/// The lock is never held across an await.
#[derive(Debug)]
pub struct SharedStore {
    inner: Mutex<MessageStore>,
    revision: watch::Sender<u64>,
}

impl SharedStore {
    #[must_use]
    pub fn new() -> Arc<Self> {
        let (revision, _) = watch::channel(0);
        Arc::new(Self { inner: Mutex::new(MessageStore::new()), revision })
    }

    /// Run `f` with exclusive access. Callers that mutate must report it
    /// through the returned change count so the revision stays accurate.
    pub(crate) fn locked<R>(&self, f: impl FnOnce(&mut MessageStore) -> R) -> R {
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    /// Read-only access to the current contents.
    pub fn read<R>(&self, f: impl FnOnce(&MessageStore) -> R) -> R {
        self.locked(|store| f(store))
    }

    pub fn replace_all(&self, messages: Vec<Message>) {
        self.locked(|store| store.replace_all(messages));
        self.bump();
    }

    /// Append newer messages; bumps the revision only when something was added.
    pub fn append_incremental<I>(&self, messages: I) -> usize
    where
        I: IntoIterator<Item = Message>,
    {
        let added = self.locked(|store| store.append_incremental(messages));
        if added > 0 {
            self.bump();
        }
        added
    }

    #[must_use]
    pub fn cursor(&self) -> MessageId {
        self.read(MessageStore::cursor)
    }

    #[must_use]
    pub fn snapshot(&self) -> Vec<Message> {
        self.read(|store| store.messages().to_vec())
    }

    #[must_use]
    pub fn snapshot_after(&self, id: MessageId) -> Vec<Message> {
        self.read(|store| store.messages_after(id).to_vec())
    }

    #[must_use]
    pub fn revision(&self) -> u64 {
        *self.revision.borrow()
    }

    /// Receiver that observes each revision bump.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    pub(crate) fn bump(&self) {
        self.revision.send_modify(|rev| *rev += 1);
    }
}

#[cfg(test)]
#[path = "store_test.rs"]
mod tests;
