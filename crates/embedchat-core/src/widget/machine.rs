use super::state::{Activity, Affordances, Visibility, WidgetPhase};
use crate::config::WidgetConfig;
use crate::identity::{IdentityResolver, SessionToken};
use crate::message::{ConversationLog, Message};
use crate::transport::{BotReply, ChatRequest, TransportError};
use serde_json::Value as JsonValue;
use std::sync::Arc;

/// How a widget identifies the visitor to the backend.
#[derive(Clone)]
pub enum SessionMode {
    /// Public embed: a durable token resolved on first activation and sent
    /// with every request.
    Persistent(Arc<dyn IdentityResolver>),
    /// Dashboard preview: no token, so the backend does not persist anything.
    Ephemeral,
}

impl std::fmt::Debug for SessionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionMode::Persistent(_) => f.write_str("Persistent"),
            SessionMode::Ephemeral => f.write_str("Ephemeral"),
        }
    }
}

/// Sequence number of an exchange started by [`ChatWidget::begin_submit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExchangeId(u64);

/// An accepted submit waiting for its transport outcome.
#[derive(Debug, Clone)]
pub struct PendingExchange {
    id: ExchangeId,
    request: ChatRequest,
}

impl PendingExchange {
    pub fn id(&self) -> ExchangeId {
        self.id
    }

    pub fn request(&self) -> &ChatRequest {
        &self.request
    }

    pub fn into_parts(self) -> (ExchangeId, ChatRequest) {
        (self.id, self.request)
    }
}

/// Result of a submit as seen by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Guard rejected the submit (or the completion was stale); nothing changed.
    Ignored,
    Replied(BotReply),
    /// The error message was appended to the log and the widget is idle again.
    Failed(TransportError),
}

/// The chat widget state machine.
///
/// Owns the conversation log and is the only writer to it.
#[derive(Debug)]
pub struct ChatWidget {
    config: WidgetConfig,
    session: SessionMode,
    session_token: Option<SessionToken>,
    identity_attempted: bool,
    temp_context: Option<JsonValue>,
    visibility: Visibility,
    activity: Activity,
    last_error: Option<TransportError>,
    log: ConversationLog,
    next_exchange: u64,
    in_flight: Option<ExchangeId>,
}

impl ChatWidget {
    /// Creates a closed, idle widget whose log holds only the greeting.
    pub fn new(config: WidgetConfig, session: SessionMode) -> Self {
        let log = ConversationLog::with_greeting(config.greeting());
        Self {
            config,
            session,
            session_token: None,
            identity_attempted: false,
            temp_context: None,
            visibility: Visibility::Closed,
            activity: Activity::Idle,
            last_error: None,
            log,
            next_exchange: 0,
            in_flight: None,
        }
    }

    /// Attaches a data grid sent as `temp_context` with every request.
    pub fn with_temp_context(mut self, context: JsonValue) -> Self {
        self.temp_context = Some(context);
        self
    }

    pub fn config(&self) -> &WidgetConfig {
        &self.config
    }

    pub fn log(&self) -> &ConversationLog {
        &self.log
    }

    pub fn session_token(&self) -> Option<&SessionToken> {
        self.session_token.as_ref()
    }

    pub fn last_error(&self) -> Option<&TransportError> {
        self.last_error.as_ref()
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    pub fn activity(&self) -> Activity {
        self.activity
    }

    pub fn phase(&self) -> WidgetPhase {
        match (self.visibility, self.activity) {
            (Visibility::Closed, _) => WidgetPhase::Closed,
            (Visibility::Open, Activity::Sending) => WidgetPhase::Sending,
            (Visibility::Open, Activity::Idle) if self.last_error.is_some() => WidgetPhase::Error,
            (Visibility::Open, Activity::Idle) => WidgetPhase::Idle,
        }
    }

    pub fn affordances(&self) -> Affordances {
        let open = self.visibility == Visibility::Open;
        Affordances {
            launcher_visible: true,
            panel_visible: open,
            input_enabled: open,
            send_enabled: open && self.activity == Activity::Idle,
        }
    }

    /// Launcher toggle.
    pub fn toggle(&mut self) -> WidgetPhase {
        match self.visibility {
            Visibility::Closed => self.open(),
            Visibility::Open => self.close(),
        }
    }

    /// Opens the panel. The first open resolves the visitor identity.
    pub fn open(&mut self) -> WidgetPhase {
        if self.visibility == Visibility::Closed {
            self.visibility = Visibility::Open;
            self.ensure_session();
        }
        self.phase()
    }

    /// Closes the panel. The log is kept, and an in-flight exchange still
    /// completes normally.
    pub fn close(&mut self) -> WidgetPhase {
        self.visibility = Visibility::Closed;
        self.phase()
    }

    fn ensure_session(&mut self) {
        if let Some(resolver) = self.pending_identity() {
            let resolved = resolver.resolve();
            self.attach_session(resolved);
        }
    }

    /// The resolver still to be consulted, if this widget needs a visitor
    /// identity and has not tried to resolve one yet.
    ///
    /// Async hosts resolve it off the event loop and hand the result to
    /// [`ChatWidget::attach_session`] before calling [`ChatWidget::open`].
    pub fn pending_identity(&self) -> Option<Arc<dyn IdentityResolver>> {
        match &self.session {
            SessionMode::Persistent(resolver) if !self.identity_attempted => Some(resolver.clone()),
            _ => None,
        }
    }

    /// Records the outcome of identity resolution. Only the first call counts.
    pub fn attach_session(&mut self, resolved: crate::error::Result<SessionToken>) {
        if self.identity_attempted {
            return;
        }
        self.identity_attempted = true;
        match resolved {
            Ok(token) => self.session_token = Some(token),
            Err(err) => {
                tracing::warn!(error = %err, "could not resolve visitor identity, continuing without session");
            }
        }
    }

    /// Starts an exchange if the guard allows it.
    ///
    /// The guard requires an open panel, non-blank input and no exchange in
    /// flight. On success the user message is already in the log when this
    /// returns; on failure nothing changes.
    pub fn begin_submit(&mut self, input: &str) -> Option<PendingExchange> {
        let text = input.trim();
        if self.visibility != Visibility::Open || text.is_empty() {
            return None;
        }
        if self.activity == Activity::Sending {
            tracing::debug!("submit dropped: exchange already in flight");
            return None;
        }

        let id = ExchangeId(self.next_exchange);
        self.next_exchange += 1;

        self.log.push(Message::user(text));
        self.activity = Activity::Sending;
        self.last_error = None;
        self.in_flight = Some(id);

        let session_id = match self.session {
            SessionMode::Persistent(_) => self.session_token.as_ref().map(|t| t.to_string()),
            SessionMode::Ephemeral => None,
        };

        Some(PendingExchange {
            id,
            request: ChatRequest {
                message: text.to_string(),
                client_id: self.config.client_id().to_string(),
                session_id,
                temp_context: self.temp_context.clone(),
            },
        })
    }

    /// Finishes the exchange `id` with the transport outcome.
    ///
    /// Success appends the bot reply; failure appends the configured error
    /// message. Either way the widget returns to idle. Outcomes for an
    /// exchange that is no longer in flight are ignored.
    pub fn complete(
        &mut self,
        id: ExchangeId,
        outcome: Result<BotReply, TransportError>,
    ) -> SubmitOutcome {
        if self.in_flight != Some(id) {
            tracing::debug!(exchange = id.0, "ignoring stale exchange outcome");
            return SubmitOutcome::Ignored;
        }
        self.in_flight = None;
        self.activity = Activity::Idle;

        match outcome {
            Ok(reply) => {
                self.log.push(Message::bot(reply.content.clone()));
                SubmitOutcome::Replied(reply)
            }
            Err(err) => {
                tracing::warn!(error = %err, "chat exchange failed");
                self.log.push(Message::bot(self.config.error_message()));
                self.last_error = Some(err.clone());
                SubmitOutcome::Failed(err)
            }
        }
    }
}
