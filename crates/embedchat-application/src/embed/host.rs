use super::page::HostPage;
use crate::templates::{self, CLIENT_ID_ATTR, ROOT_ID, SCRIPT_ID};
use embedchat_core::error::Result;
use embedchat_core::identity::IdentityResolver;
use embedchat_core::transport::ChatTransport;
use embedchat_core::widget::{ChatWidget, SessionMode, SharedWidget, SubmitOutcome, WidgetSnapshot};
use embedchat_infrastructure::Settings;
use std::sync::Arc;

pub const DEFAULT_TITLE: &str = "Chat with us";

/// Result of mounting the public widget on a page.
pub enum Mount {
    /// The page carries no client id; nothing was injected.
    Inert,
    /// The page already contains a widget root; nothing was injected.
    AlreadyMounted,
    Mounted(EmbeddedWidget),
}

impl Mount {
    pub fn widget(&self) -> Option<&EmbeddedWidget> {
        match self {
            Mount::Mounted(widget) => Some(widget),
            _ => None,
        }
    }
}

impl std::fmt::Debug for Mount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mount::Inert => f.write_str("Inert"),
            Mount::AlreadyMounted => f.write_str("AlreadyMounted"),
            Mount::Mounted(_) => f.write_str("Mounted"),
        }
    }
}

/// UI events the injected markup produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomEvent {
    LauncherClicked,
    CloseClicked,
    FormSubmitted(String),
}

/// What the host needs after handling an event.
#[derive(Debug, Clone)]
pub struct EventOutcome {
    /// Set only for form submits.
    pub submit: Option<SubmitOutcome>,
    pub snapshot: WidgetSnapshot,
}

/// Mounts the public widget into host pages.
///
/// Everything except the client id is fixed at construction; the client id
/// is read from the page's script tag.
pub struct EmbedHost {
    settings: Settings,
    transport: Arc<dyn ChatTransport>,
    identity: Arc<dyn IdentityResolver>,
    title: String,
}

impl EmbedHost {
    pub fn new(
        settings: Settings,
        transport: Arc<dyn ChatTransport>,
        identity: Arc<dyn IdentityResolver>,
    ) -> Self {
        Self {
            settings,
            transport,
            identity,
            title: DEFAULT_TITLE.to_string(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Reads the configuration from `page` and injects the widget markup.
    ///
    /// Errors are limited to markup rendering; a missing client id or an
    /// existing widget are reported through [`Mount`].
    pub async fn mount(&self, page: &mut dyn HostPage) -> Result<Mount> {
        if page.has_element(ROOT_ID) {
            tracing::debug!("widget already present on page, skipping injection");
            return Ok(Mount::AlreadyMounted);
        }

        let client_id = page.script_attribute(SCRIPT_ID, CLIENT_ID_ATTR);
        let settings = Settings {
            client_id,
            ..self.settings.clone()
        };
        let config = match settings.widget_config() {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!(error = %err, "widget not mounted");
                return Ok(Mount::Inert);
            }
        };

        let widget = ChatWidget::new(config, SessionMode::Persistent(self.identity.clone()));
        let embedded = EmbeddedWidget {
            shared: SharedWidget::new(widget, self.transport.clone()),
            title: self.title.clone(),
        };

        let markup = embedded.render().await?;
        page.inject(&markup);
        Ok(Mount::Mounted(embedded))
    }
}

/// A mounted public widget.
#[derive(Clone)]
pub struct EmbeddedWidget {
    shared: SharedWidget,
    title: String,
}

impl EmbeddedWidget {
    /// Routes a UI event to the state machine.
    pub async fn dispatch(&self, event: DomEvent) -> EventOutcome {
        let submit = match event {
            DomEvent::LauncherClicked => {
                self.shared.toggle().await;
                None
            }
            DomEvent::CloseClicked => {
                self.shared.close().await;
                None
            }
            DomEvent::FormSubmitted(text) => Some(self.shared.submit(&text).await),
        };
        EventOutcome {
            submit,
            snapshot: self.shared.snapshot().await,
        }
    }

    pub fn widget(&self) -> &SharedWidget {
        &self.shared
    }

    /// Full widget markup for the current state.
    pub async fn render(&self) -> Result<String> {
        templates::render_widget(&self.shared.snapshot().await, &self.title)
    }

    /// Just the conversation log markup.
    pub async fn render_log(&self) -> Result<String> {
        templates::render_messages(&self.shared.snapshot().await.messages)
    }
}
