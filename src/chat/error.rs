//! Chat error taxonomy. None of these end the conversation view.

use crate::net::api::ApiError;

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    /// The view was opened without a conversation id.
    #[error("conversation id not found")]
    MissingConversation,

    /// The view was opened without a signed-in user.
    #[error("user not identified")]
    MissingUser,

    /// Initial load or poll fetch failed; synchronization continues.
    #[error("message fetch failed: {0}")]
    TransientFetch(#[source] ApiError),

    /// The backend rejected an outgoing message; the draft is restored.
    #[error("message send failed: {0}")]
    SendFailure(#[source] ApiError),

    /// The seen notification failed; logged only.
    #[error("seen marker failed: {0}")]
    SeenMarkerFailure(#[source] ApiError),
}

impl ChatError {
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::MissingConversation => "E_MISSING_CONVERSATION",
            Self::MissingUser => "E_MISSING_USER",
            Self::TransientFetch(_) => "E_TRANSIENT_FETCH",
            Self::SendFailure(_) => "E_SEND_FAILURE",
            Self::SeenMarkerFailure(_) => "E_SEEN_MARKER",
        }
    }
}
