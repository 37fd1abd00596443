//! Expiring status notice owned by a single view.
//!
//! DESIGN
//! ======
//! Each view owns its own `Notice`; nothing is shared across views. Showing
//! a notice arms one expiry timer and cancels the previous one. A
//! generation counter keeps a late timer from clearing a newer message.
//! Dropping the notice releases its timer.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NoticeMessage {
    pub text: String,
    pub kind: NoticeKind,
}

#[derive(Debug, Default)]
struct Slot {
    current: Option<NoticeMessage>,
    generation: u64,
}

#[derive(Debug)]
pub struct Notice {
    slot: Arc<Mutex<Slot>>,
    ttl: Duration,
    timer: Option<JoinHandle<()>>,
}

impl Notice {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self { slot: Arc::default(), ttl, timer: None }
    }

    /// Replace the current notice and restart the expiry timer.
    pub fn show(&mut self, text: impl Into<String>, kind: NoticeKind) {
        self.cancel_timer();
        let generation = {
            let mut slot = lock(&self.slot);
            slot.generation += 1;
            slot.current = Some(NoticeMessage { text: text.into(), kind });
            slot.generation
        };

        let slot = Arc::clone(&self.slot);
        let deadline = Instant::now() + self.ttl;
        self.timer = Some(tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            let mut slot = lock(&slot);
            if slot.generation == generation {
                slot.current = None;
            }
        }));
    }

    pub fn success(&mut self, text: impl Into<String>) {
        self.show(text, NoticeKind::Success);
    }

    pub fn error(&mut self, text: impl Into<String>) {
        self.show(text, NoticeKind::Error);
    }

    #[must_use]
    pub fn current(&self) -> Option<NoticeMessage> {
        lock(&self.slot).current.clone()
    }

    pub fn clear(&mut self) {
        self.cancel_timer();
        let mut slot = lock(&self.slot);
        slot.generation += 1;
        slot.current = None;
    }

    fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

impl Drop for Notice {
    fn drop(&mut self) {
        self.cancel_timer();
    }
}

fn lock(slot: &Mutex<Slot>) -> std::sync::MutexGuard<'_, Slot> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
#[path = "notice_test.rs"]
mod tests;
