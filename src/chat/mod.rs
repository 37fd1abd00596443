//! Live conversation sync: message store, poll loop, seen marker and the
//! conversation view that ties them together.
//!
//! DESIGN
//! ======
//! Split by concern so the store can be tested without timers and the poll
//! loop without a view. The view is the only public entry point most hosts
//! need.

pub mod error;
pub mod poll;
pub mod seen;
pub mod store;
pub mod view;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use error::ChatError;
pub use poll::{PollConfig, PollHandle};
pub use seen::SeenMarker;
pub use store::{MessageStore, SharedStore};
pub use view::{ConversationView, OpenParams};
