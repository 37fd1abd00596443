//! Backend client for the chat endpoints.
//!
//! DESIGN
//! ======
//! `ChatApi` is the seam between the conversation core and the network.
//! `HttpChatApi` is the `reqwest` implementation; tests substitute a
//! recording mock. Bodies are read as text first and parsed separately so
//! decode failures carry the raw payload context.
//!
//! ERROR HANDLING
//! ==============
//! Every call returns `ApiError`; nothing here retries. Callers decide
//! whether a failure is soft (poll, seen) or surfaced (send).

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;

use super::types::{
    ConversationId, ConversationSummary, CreatedMessage, Message, MessageId, OutgoingMessage, SeenRequest, UserId,
};
use crate::config::{ClientConfig, Timeouts, normalize_base_url};

// =============================================================================
// ERROR
// =============================================================================

/// Errors produced by backend calls.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    ClientBuild(String),

    /// The configured base URL is unusable.
    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),

    /// The request could not be sent or the body could not be read.
    #[error("request failed: {0}")]
    Request(String),

    /// The request exceeded its timeout.
    #[error("request timed out")]
    Timeout,

    /// The backend returned a non-success status.
    #[error("backend returned status {status}")]
    Status { status: u16, body: String },

    /// The response body was not the expected JSON shape.
    #[error("response decode failed: {0}")]
    Decode(String),
}

impl ApiError {
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ClientBuild(_) => "E_CLIENT_BUILD",
            Self::InvalidBaseUrl(_) => "E_INVALID_BASE_URL",
            Self::Request(_) => "E_REQUEST",
            Self::Timeout => "E_TIMEOUT",
            Self::Status { .. } => "E_STATUS",
            Self::Decode(_) => "E_DECODE",
        }
    }

    /// Whether repeating the same call later could succeed.
    #[must_use]
    pub fn retryable(&self) -> bool {
        matches!(self, Self::Request(_) | Self::Timeout | Self::Status { status: 429 | 500..=599, .. })
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout
        } else {
            Self::Request(error.to_string())
        }
    }
}

// =============================================================================
// TRAIT
// =============================================================================

/// The backend operations the chat core depends on.
#[async_trait::async_trait]
pub trait ChatApi: Send + Sync {
    /// Fetch messages in ascending id order. With `after`, only ids greater
    /// than it are returned.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] on transport, status or decode failure.
    async fn fetch_messages(&self, conversation: ConversationId, after: Option<MessageId>)
    -> Result<Vec<Message>, ApiError>;

    /// Create a message and return the backend's confirmation.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] on transport, status or decode failure.
    async fn send_message(
        &self,
        conversation: ConversationId,
        message: &OutgoingMessage,
    ) -> Result<CreatedMessage, ApiError>;

    /// Tell the backend `user` has viewed `conversation`.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] on transport or status failure.
    async fn mark_seen(&self, conversation: ConversationId, user: UserId) -> Result<(), ApiError>;

    /// List the conversations `user` participates in.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] on transport, status or decode failure.
    async fn list_conversations(&self, user: UserId) -> Result<Vec<ConversationSummary>, ApiError>;
}

// =============================================================================
// HTTP CLIENT
// =============================================================================

pub struct HttpChatApi {
    http: reqwest::Client,
    base_url: String,
}

impl HttpChatApi {
    /// Build a client against `base_url` (e.g. `https://host/api`).
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is not HTTP(S), the token is not a valid
    /// header value, or the HTTP client fails to build.
    pub fn new(base_url: &str, token: Option<&str>, timeouts: Timeouts) -> Result<Self, ApiError> {
        let base_url = normalize_base_url(base_url).map_err(|e| ApiError::InvalidBaseUrl(e.to_string()))?;

        let mut headers = HeaderMap::new();
        if let Some(token) = token {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| ApiError::ClientBuild(e.to_string()))?;
            headers.insert(AUTHORIZATION, value);
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeouts.request)
            .connect_timeout(timeouts.connect)
            .build()
            .map_err(|e| ApiError::ClientBuild(e.to_string()))?;

        Ok(Self { http, base_url })
    }

    /// # Errors
    ///
    /// See [`HttpChatApi::new`].
    pub fn from_config(config: &ClientConfig) -> Result<Self, ApiError> {
        Self::new(&config.base_url, config.token.as_deref(), config.timeouts)
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn messages_url(&self, conversation: ConversationId, after: Option<MessageId>) -> String {
        match after.filter(|id| !id.is_none()) {
            Some(after) => format!("{}/conversations/{conversation}/messages?after={after}", self.base_url),
            None => format!("{}/conversations/{conversation}/messages", self.base_url),
        }
    }
}

#[async_trait::async_trait]
impl ChatApi for HttpChatApi {
    async fn fetch_messages(
        &self,
        conversation: ConversationId,
        after: Option<MessageId>,
    ) -> Result<Vec<Message>, ApiError> {
        let response = self.http.get(self.messages_url(conversation, after)).send().await?;
        read_json(response).await
    }

    async fn send_message(
        &self,
        conversation: ConversationId,
        message: &OutgoingMessage,
    ) -> Result<CreatedMessage, ApiError> {
        let url = format!("{}/conversations/{conversation}/messages", self.base_url);
        let response = self.http.post(url).json(message).send().await?;
        read_json(response).await
    }

    async fn mark_seen(&self, conversation: ConversationId, user: UserId) -> Result<(), ApiError> {
        let url = format!("{}/conversations/{conversation}/seen", self.base_url);
        let response = self
            .http
            .post(url)
            .json(&SeenRequest { user_id: user })
            .send()
            .await?;
        read_text(response).await.map(|_| ())
    }

    async fn list_conversations(&self, user: UserId) -> Result<Vec<ConversationSummary>, ApiError> {
        let url = format!("{}/users/{user}/conversations", self.base_url);
        let response = self.http.get(url).send().await?;
        read_json(response).await
    }
}

async fn read_text(response: reqwest::Response) -> Result<String, ApiError> {
    let status = response.status().as_u16();
    let text = response.text().await?;
    if !(200..300).contains(&status) {
        return Err(ApiError::Status { status, body: text });
    }
    Ok(text)
}

async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
    let text = read_text(response).await?;
    parse_body(&text)
}

fn parse_body<T: DeserializeOwned>(text: &str) -> Result<T, ApiError> {
    serde_json::from_str(text).map_err(|e| ApiError::Decode(e.to_string()))
}

#[cfg(test)]
#[path = "api_test.rs"]
mod tests;
