//! Network layer: wire types and the backend client.

pub mod api;
pub mod types;

pub use api::{ApiError, ChatApi, HttpChatApi};
pub use types::{ConversationId, ConversationSummary, Counterparty, CreatedMessage, Message, MessageId, OutgoingMessage, UserId};
