use super::machine::{ChatWidget, SubmitOutcome};
use super::state::{Affordances, WidgetPhase};
use crate::error::EmbedchatError;
use crate::message::Message;
use crate::transport::{ChatTransport, TransportError};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Point-in-time copy of what a host needs to render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WidgetSnapshot {
    pub phase: WidgetPhase,
    pub affordances: Affordances,
    pub messages: Vec<Message>,
}

/// A widget wired to its transport, shareable between event handlers.
///
/// The lock is held only to start and to finish an exchange; the request
/// itself runs unlocked, so a second submit during it reaches the guard and
/// is dropped. Each exchange runs as its own task, so a caller that stops
/// waiting does not leave the widget sending.
#[derive(Clone)]
pub struct SharedWidget {
    widget: Arc<Mutex<ChatWidget>>,
    transport: Arc<dyn ChatTransport>,
}

impl SharedWidget {
    pub fn new(widget: ChatWidget, transport: Arc<dyn ChatTransport>) -> Self {
        Self {
            widget: Arc::new(Mutex::new(widget)),
            transport,
        }
    }

    pub async fn toggle(&self) -> WidgetPhase {
        self.prepare_session().await;
        self.widget.lock().await.toggle()
    }

    pub async fn open(&self) -> WidgetPhase {
        self.prepare_session().await;
        self.widget.lock().await.open()
    }

    /// Resolves the visitor identity on the blocking pool, outside the lock.
    async fn prepare_session(&self) {
        let Some(resolver) = self.widget.lock().await.pending_identity() else {
            return;
        };
        let resolved = match tokio::task::spawn_blocking(move || resolver.resolve()).await {
            Ok(resolved) => resolved,
            Err(err) => Err(EmbedchatError::storage(format!("identity task failed: {err}"))),
        };
        self.widget.lock().await.attach_session(resolved);
    }

    pub async fn close(&self) -> WidgetPhase {
        self.widget.lock().await.close()
    }

    pub async fn phase(&self) -> WidgetPhase {
        self.widget.lock().await.phase()
    }

    /// Submits `input` and waits for the exchange to finish.
    ///
    /// A request that outlives the configured timeout fails with
    /// [`TransportError::Timeout`]. Dropping the returned future does not
    /// cancel the exchange; it still completes into the log.
    pub async fn submit(&self, input: &str) -> SubmitOutcome {
        let (pending, timeout) = {
            let mut widget = self.widget.lock().await;
            match widget.begin_submit(input) {
                Some(pending) => (pending, widget.config().request_timeout()),
                None => return SubmitOutcome::Ignored,
            }
        };

        let (id, request) = pending.into_parts();
        tracing::debug!(client_id = %request.client_id, "sending chat message");

        let widget = Arc::clone(&self.widget);
        let transport = Arc::clone(&self.transport);
        let exchange = tokio::spawn(async move {
            let outcome = match tokio::time::timeout(timeout, transport.send(request)).await {
                Ok(result) => result,
                Err(_) => Err(TransportError::Timeout),
            };
            widget.lock().await.complete(id, outcome)
        });

        match exchange.await {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::error!(error = %err, "chat exchange task failed");
                let failure = TransportError::Network(format!("exchange aborted: {err}"));
                self.widget.lock().await.complete(id, Err(failure))
            }
        }
    }

    pub async fn snapshot(&self) -> WidgetSnapshot {
        let widget = self.widget.lock().await;
        WidgetSnapshot {
            phase: widget.phase(),
            affordances: widget.affordances(),
            messages: widget.log().as_slice().to_vec(),
        }
    }

    /// Runs `f` with read access to the widget.
    pub async fn inspect<R>(&self, f: impl FnOnce(&ChatWidget) -> R) -> R {
        let widget = self.widget.lock().await;
        f(&widget)
    }
}
