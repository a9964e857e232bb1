//! Core domain of the embedchat widget client.
//!
//! - [`identity`]: durable visitor identity over a write-if-absent store
//! - [`transport`]: the chat endpoint contract and wire types
//! - [`widget`]: the widget state machine that owns the conversation log
//! - [`message`]: messages and the append-only log
//! - [`config`]: immutable per-instance configuration

pub mod config;
pub mod error;
pub mod identity;
pub mod message;
pub mod transport;
pub mod widget;

pub use config::{ClientId, WidgetConfig};
pub use error::{ConfigError, EmbedchatError, Result};
pub use identity::{DurableStore, IdentityResolver, IdentityStore, MemoryStore, SessionToken};
pub use message::{ConversationLog, Message, Role};
pub use transport::{BotReply, ChatRequest, ChatTransport, TransportError};
pub use widget::{ChatWidget, SessionMode, SharedWidget, SubmitOutcome, WidgetPhase};
