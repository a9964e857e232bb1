//! Error types for the embedchat widget client.

use thiserror::Error;

/// A shared error type for the embedchat crates.
///
/// Transport failures have their own type ([`crate::transport::TransportError`])
/// because the widget surfaces them inside the conversation instead of
/// propagating them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EmbedchatError {
    /// Widget configuration is missing or malformed
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Durable storage error (identity register)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization {
        format: String, // "TOML", "JSON", etc.
        message: String,
    },

    /// Template rendering error (host markup)
    #[error("Render error: {0}")]
    Render(String),
}

/// Configuration errors. An instance that hits one of these renders inert.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("client id is missing")]
    MissingClientId,

    #[error("invalid endpoint '{endpoint}': {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },
}

impl EmbedchatError {
    /// Creates an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Creates a Storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    /// Creates a Render error
    pub fn render(message: impl Into<String>) -> Self {
        Self::Render(message.into())
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for EmbedchatError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for EmbedchatError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for EmbedchatError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::ser::Error> for EmbedchatError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

/// A type alias for `Result<T, EmbedchatError>`.
pub type Result<T> = std::result::Result<T, EmbedchatError>;
