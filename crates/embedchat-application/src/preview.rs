//! In-dashboard preview host.
//!
//! Runs the same state machine and transport as the public widget, but with
//! an ephemeral session: requests carry no `session_id`, so the backend does
//! not persist preview exchanges.

use crate::templates;
use embedchat_core::config::WidgetConfig;
use embedchat_core::error::Result;
use embedchat_core::message::Message;
use embedchat_core::transport::ChatTransport;
use embedchat_core::widget::{ChatWidget, SessionMode, SharedWidget, SubmitOutcome, WidgetPhase};
use serde_json::Value as JsonValue;
use std::sync::Arc;

/// Live preview of a widget configuration.
pub struct PreviewHost {
    shared: SharedWidget,
    client_id: String,
    script_src: String,
}

impl PreviewHost {
    pub fn new(config: WidgetConfig, script_src: impl Into<String>, transport: Arc<dyn ChatTransport>) -> Self {
        Self::build(config, script_src.into(), transport, None)
    }

    /// Preview that answers from `context` instead of the stored knowledge base.
    pub fn with_temp_context(
        config: WidgetConfig,
        script_src: impl Into<String>,
        transport: Arc<dyn ChatTransport>,
        context: JsonValue,
    ) -> Self {
        Self::build(config, script_src.into(), transport, Some(context))
    }

    fn build(
        config: WidgetConfig,
        script_src: String,
        transport: Arc<dyn ChatTransport>,
        context: Option<JsonValue>,
    ) -> Self {
        let client_id = config.client_id().to_string();
        let mut widget = ChatWidget::new(config, SessionMode::Ephemeral);
        if let Some(context) = context {
            widget = widget.with_temp_context(context);
        }
        Self {
            shared: SharedWidget::new(widget, transport),
            client_id,
            script_src,
        }
    }

    pub async fn toggle(&self) -> WidgetPhase {
        self.shared.toggle().await
    }

    pub async fn submit(&self, text: &str) -> SubmitOutcome {
        self.shared.submit(text).await
    }

    pub async fn messages(&self) -> Vec<Message> {
        self.shared.snapshot().await.messages
    }

    pub fn widget(&self) -> &SharedWidget {
        &self.shared
    }

    /// The script tag an operator pastes into their site. Pure formatting.
    pub fn embed_snippet(&self) -> Result<String> {
        templates::embed_snippet(&self.client_id, &self.script_src)
    }
}
