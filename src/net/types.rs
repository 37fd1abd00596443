//! Wire types shared by the chat API client and the conversation core.
//!
//! Field names follow the backend's camelCase contract. Aliases accept the
//! older Spanish field names some backend deployments still emit.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Backend-assigned conversation identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(pub i64);

/// Backend-assigned message identifier, strictly increasing per conversation.
///
/// `MessageId::NONE` (zero) is the cursor of an empty conversation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub i64);

impl MessageId {
    pub const NONE: Self = Self(0);

    #[must_use]
    pub fn is_none(self) -> bool {
        self == Self::NONE
    }
}

/// Backend user identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// =============================================================================
// MESSAGES
// =============================================================================

/// A single chat message. Immutable once created by the backend.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    #[serde(alias = "id_mensaje")]
    pub id: MessageId,
    #[serde(alias = "emisor_id", alias = "id_usuario_emisor")]
    pub sender_id: UserId,
    #[serde(alias = "cuerpo")]
    pub body: String,
    #[serde(alias = "enviado_en")]
    pub sent_at: DateTime<Utc>,
}

/// Request body for `POST /conversations/{id}/messages`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutgoingMessage {
    pub sender_id: UserId,
    pub body: String,
}

/// Response of the create-message call.
///
/// Only `id` is guaranteed; older backends echo nothing else.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedMessage {
    #[serde(alias = "id_mensaje")]
    pub id: MessageId,
    #[serde(default, alias = "emisor_id", alias = "id_usuario_emisor")]
    pub sender_id: Option<UserId>,
    #[serde(default, alias = "cuerpo")]
    pub body: Option<String>,
    #[serde(default, alias = "enviado_en")]
    pub sent_at: Option<DateTime<Utc>>,
}

impl CreatedMessage {
    /// Build the confirmed message, filling fields the backend did not echo
    /// from the draft and the local clock.
    #[must_use]
    pub fn into_message(self, draft: &OutgoingMessage) -> Message {
        Message {
            id: self.id,
            sender_id: self.sender_id.unwrap_or(draft.sender_id),
            body: self.body.unwrap_or_else(|| draft.body.clone()),
            sent_at: self.sent_at.unwrap_or_else(Utc::now),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SeenRequest {
    pub(crate) user_id: UserId,
}

// =============================================================================
// CONVERSATIONS
// =============================================================================

/// The other participant of a conversation, as shown in the list.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Counterparty {
    #[serde(alias = "id_usuario")]
    pub id: UserId,
    #[serde(alias = "nombre_usuario")]
    pub username: String,
}

/// One row of the current user's conversation list.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSummary {
    #[serde(alias = "id_conversacion")]
    pub id: ConversationId,
    #[serde(default, alias = "display_title")]
    pub display_title: Option<String>,
    #[serde(default, alias = "otro_usuario")]
    pub other_user: Option<Counterparty>,
    #[serde(default)]
    pub unread_count: Option<u32>,
}

impl ConversationSummary {
    /// Human-readable title, falling back to the conversation id.
    #[must_use]
    pub fn display_title(&self) -> String {
        match self.display_title.as_deref().map(str::trim) {
            Some(title) if !title.is_empty() => title.to_owned(),
            _ => format!("Conversation {}", self.id),
        }
    }
}

#[cfg(test)]
#[path = "types_test.rs"]
mod tests;
