//! # bookswap
//!
//! Client-side chat core for the book exchange marketplace. Keeps one open
//! conversation in sync with the REST backend: full load on open,
//! cursor-based incremental polling, seen receipts, and sends that merge
//! the server-confirmed message.
//!
//! The `cli` crate hosts this library in a terminal; any other front end
//! drives the same [`chat::ConversationView`].

pub mod chat;
pub mod config;
pub mod conversations;
pub mod net;
pub mod notice;
