//! Conversation list for the signed-in user.

use tracing::{info, warn};

use crate::chat::ChatError;
use crate::net::api::ChatApi;
use crate::net::types::{ConversationId, ConversationSummary, UserId};

#[derive(Debug, Clone, Default)]
pub struct ConversationList {
    pub conversations: Vec<ConversationSummary>,
}

impl ConversationList {
    /// Load the current user's conversations.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::MissingUser`] without a user, or
    /// [`ChatError::TransientFetch`] when the backend call fails.
    pub async fn load(api: &dyn ChatApi, user: Option<UserId>) -> Result<Self, ChatError> {
        let user = user.ok_or(ChatError::MissingUser)?;
        match api.list_conversations(user).await {
            Ok(conversations) => {
                info!(%user, count = conversations.len(), "conversations loaded");
                Ok(Self { conversations })
            }
            Err(e) => {
                let error = ChatError::TransientFetch(e);
                warn!(%user, code = error.error_code(), error = %error, "conversation list load failed");
                Err(error)
            }
        }
    }

    #[must_use]
    pub fn find(&self, id: ConversationId) -> Option<&ConversationSummary> {
        self.conversations.iter().find(|c| c.id == id)
    }

    /// Title to hand to the conversation view when navigating to `id`.
    #[must_use]
    pub fn title_for(&self, id: ConversationId) -> Option<String> {
        self.find(id).map(ConversationSummary::display_title)
    }

    #[must_use]
    pub fn total_unread(&self) -> u32 {
        self.conversations
            .iter()
            .filter_map(|c| c.unread_count)
            .fold(0, u32::saturating_add)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.conversations.is_empty()
    }
}

#[cfg(test)]
#[path = "conversations_test.rs"]
mod tests;
