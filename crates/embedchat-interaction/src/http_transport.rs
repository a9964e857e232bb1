//! HttpTransport - the chat endpoint over HTTP.
//!
//! POSTs the chat request as JSON and classifies every outcome as a
//! [`BotReply`] or a [`TransportError`].

use async_trait::async_trait;
use embedchat_core::WidgetConfig;
use embedchat_core::transport::{BotReply, ChatRequest, ChatTransport, TransportError, decode_reply};
use reqwest::Client;
use std::time::Duration;

/// Transport implementation that talks to the chat endpoint with reqwest.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    endpoint: String,
}

impl HttpTransport {
    /// Creates a transport for `endpoint` with a per-request timeout.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| TransportError::Network(format!("failed to build HTTP client: {err}")))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    /// Creates a transport from a widget configuration.
    pub fn from_config(config: &WidgetConfig) -> Result<Self, TransportError> {
        Self::new(config.endpoint(), config.request_timeout())
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ChatTransport for HttpTransport {
    async fn send(&self, request: ChatRequest) -> Result<BotReply, TransportError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(classify_send_error)?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), endpoint = %self.endpoint, "chat endpoint returned error status");
            return Err(TransportError::Status {
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(classify_send_error)?;
        decode_reply(&body)
    }
}

fn classify_send_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout
    } else if err.is_decode() {
        TransportError::Decode(err.to_string())
    } else {
        TransportError::Network(err.to_string())
    }
}
