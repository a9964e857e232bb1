//! Chat transport contract and wire types.
//!
//! The transport is the only component that talks to the chat endpoint.
//! Every outcome is either a [`BotReply`] or a [`TransportError`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;

/// Substituted when the backend answers successfully without a reply text.
pub const FALLBACK_REPLY: &str = "No response.";

/// Request body sent to the chat endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    pub message: String,
    pub client_id: String,
    /// Absent for the preview variant so the backend does not persist the exchange.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    /// Data grid the backend should answer from instead of the stored knowledge base.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temp_context: Option<JsonValue>,
}

/// Response body of the chat endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub reply: Option<String>,
    #[serde(default)]
    pub handoff: bool,
    #[serde(default)]
    pub lead: bool,
}

impl ChatResponse {
    /// Converts the wire response into a reply, applying the fallback text.
    pub fn into_reply(self) -> BotReply {
        let content = match self.reply {
            Some(reply) if !reply.trim().is_empty() => reply,
            _ => FALLBACK_REPLY.to_string(),
        };
        BotReply {
            content,
            handoff: self.handoff,
            lead: self.lead,
        }
    }
}

/// A successful bot turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotReply {
    pub content: String,
    /// The backend escalated the question to a human operator.
    pub handoff: bool,
    /// The backend flagged purchasing intent worth following up.
    pub lead: bool,
}

impl BotReply {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            handoff: false,
            lead: false,
        }
    }
}

/// Any failed exchange. All variants take the same retry-by-resubmission path.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out")]
    Timeout,

    #[error("server returned HTTP {status}")]
    Status { status: u16 },

    #[error("could not decode response: {0}")]
    Decode(String),
}

/// Sends one chat message and waits for the reply.
///
/// Callers guarantee `request.message` is non-empty after trimming.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send(&self, request: ChatRequest) -> Result<BotReply, TransportError>;
}

/// Decodes a successful (2xx) response body.
pub fn decode_reply(body: &[u8]) -> Result<BotReply, TransportError> {
    let value: JsonValue =
        serde_json::from_slice(body).map_err(|err| TransportError::Decode(err.to_string()))?;
    if !value.is_object() {
        return Err(TransportError::Decode(
            "response body is not a JSON object".to_string(),
        ));
    }
    let response: ChatResponse =
        serde_json::from_value(value).map_err(|err| TransportError::Decode(err.to_string()))?;
    Ok(response.into_reply())
}
