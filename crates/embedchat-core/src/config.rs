//! Widget instance configuration.
//!
//! Resolved once when a host constructs a widget and immutable afterwards.
//! Deeper components receive it by value; nothing below the host looks up
//! configuration on its own.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

pub const DEFAULT_GREETING: &str = "Hi there! How can I help you today?";
pub const DEFAULT_ERROR_MESSAGE: &str = "Sorry, I couldn't reach the server. Please try again.";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Identifier of the chatbot tenant this widget talks for.
///
/// Always non-empty and trimmed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClientId(String);

impl ClientId {
    pub fn parse(raw: impl AsRef<str>) -> Result<Self, ConfigError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(ConfigError::MissingClientId);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ClientId {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<ClientId> for String {
    fn from(value: ClientId) -> Self {
        value.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Configuration for one widget instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetConfig {
    client_id: ClientId,
    endpoint: String,
    greeting: String,
    error_message: String,
    request_timeout: Duration,
}

impl WidgetConfig {
    /// Builds a config from raw host values.
    ///
    /// A missing or blank client id is a [`ConfigError::MissingClientId`].
    pub fn new(client_id: Option<&str>, endpoint: impl Into<String>) -> Result<Self, ConfigError> {
        let client_id = ClientId::parse(client_id.unwrap_or_default())?;
        let endpoint = endpoint.into();
        validate_endpoint(&endpoint)?;

        Ok(Self {
            client_id,
            endpoint,
            greeting: DEFAULT_GREETING.to_string(),
            error_message: DEFAULT_ERROR_MESSAGE.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        })
    }

    pub fn with_greeting(mut self, greeting: impl Into<String>) -> Self {
        self.greeting = greeting.into();
        self
    }

    pub fn with_error_message(mut self, message: impl Into<String>) -> Self {
        self.error_message = message.into();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn client_id(&self) -> &ClientId {
        &self.client_id
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn greeting(&self) -> &str {
        &self.greeting
    }

    pub fn error_message(&self) -> &str {
        &self.error_message
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Scheme and authority of the endpoint, e.g. `https://bot.example.com`.
    ///
    /// Used as the default storage origin for the public widget.
    pub fn origin(&self) -> &str {
        endpoint_origin(&self.endpoint)
    }
}

fn validate_endpoint(endpoint: &str) -> Result<(), ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidEndpoint {
        endpoint: endpoint.to_string(),
        reason: reason.to_string(),
    };

    let rest = endpoint
        .strip_prefix("https://")
        .or_else(|| endpoint.strip_prefix("http://"))
        .ok_or_else(|| invalid("scheme must be http or https"))?;

    let authority = rest.split('/').next().unwrap_or_default();
    if authority.is_empty() {
        return Err(invalid("missing host"));
    }
    Ok(())
}

/// Scheme and authority of an endpoint URL.
pub fn endpoint_origin(endpoint: &str) -> &str {
    let scheme_end = endpoint.find("://").map(|i| i + 3).unwrap_or(0);
    match endpoint[scheme_end..].find('/') {
        Some(path_start) => &endpoint[..scheme_end + path_start],
        None => endpoint,
    }
}
