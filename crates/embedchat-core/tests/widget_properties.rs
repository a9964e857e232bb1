use async_trait::async_trait;
use embedchat_core::transport::FALLBACK_REPLY;
use embedchat_core::widget::SharedWidget;
use embedchat_core::{
    BotReply, ChatRequest, ChatTransport, ChatWidget, IdentityResolver, IdentityStore,
    MemoryStore, Message, SessionMode, SessionToken, SubmitOutcome, TransportError, WidgetConfig,
    WidgetPhase,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, Notify};

fn config() -> WidgetConfig {
    WidgetConfig::new(Some("acme"), "https://bot.example.com/api/chat").unwrap()
}

/// Answers every message with "echo: <message>" and counts calls.
#[derive(Default)]
struct EchoTransport {
    calls: AtomicUsize,
}

#[async_trait]
impl ChatTransport for EchoTransport {
    async fn send(&self, request: ChatRequest) -> Result<BotReply, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(BotReply::text(format!("echo: {}", request.message)))
    }
}

/// Always fails.
#[derive(Default)]
struct FailingTransport {
    calls: AtomicUsize,
}

#[async_trait]
impl ChatTransport for FailingTransport {
    async fn send(&self, _request: ChatRequest) -> Result<BotReply, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(TransportError::Network("connection refused".into()))
    }
}

/// Returns a fixed reply.
struct FixedTransport(BotReply);

#[async_trait]
impl ChatTransport for FixedTransport {
    async fn send(&self, _request: ChatRequest) -> Result<BotReply, TransportError> {
        Ok(self.0.clone())
    }
}

/// Blocks until released, recording the requests it saw.
#[derive(Default)]
struct GatedTransport {
    entered: Notify,
    release: Notify,
    requests: Mutex<Vec<ChatRequest>>,
}

#[async_trait]
impl ChatTransport for GatedTransport {
    async fn send(&self, request: ChatRequest) -> Result<BotReply, TransportError> {
        self.requests.lock().await.push(request);
        self.entered.notify_one();
        self.release.notified().await;
        Ok(BotReply::text("finally"))
    }
}

/// Yields once before answering, so concurrent submits overlap.
struct YieldingTransport;

#[async_trait]
impl ChatTransport for YieldingTransport {
    async fn send(&self, request: ChatRequest) -> Result<BotReply, TransportError> {
        tokio::task::yield_now().await;
        Ok(BotReply::text(format!("echo: {}", request.message)))
    }
}

/// Answers after a fixed delay.
struct SlowTransport(Duration);

#[async_trait]
impl ChatTransport for SlowTransport {
    async fn send(&self, request: ChatRequest) -> Result<BotReply, TransportError> {
        tokio::time::sleep(self.0).await;
        Ok(BotReply::text(format!("late: {}", request.message)))
    }
}

/// Resolves through a blocking call, like a file store waiting on its lock.
struct BlockingResolver {
    delay: Duration,
    inner: IdentityStore<MemoryStore>,
}

impl IdentityResolver for BlockingResolver {
    fn resolve(&self) -> embedchat_core::Result<SessionToken> {
        std::thread::sleep(self.delay);
        self.inner.resolve()
    }
}

/// Never answers.
struct HangingTransport;

#[async_trait]
impl ChatTransport for HangingTransport {
    async fn send(&self, _request: ChatRequest) -> Result<BotReply, TransportError> {
        std::future::pending().await
    }
}

async fn open_shared(transport: Arc<dyn ChatTransport>) -> SharedWidget {
    let shared = SharedWidget::new(ChatWidget::new(config(), SessionMode::Ephemeral), transport);
    shared.open().await;
    shared
}

#[tokio::test]
async fn test_log_grows_by_two_per_successful_submit() {
    let shared = open_shared(Arc::new(EchoTransport::default())).await;

    for n in 1..=5 {
        let outcome = shared.submit(&format!("message {n}")).await;
        assert!(matches!(outcome, SubmitOutcome::Replied(_)));
        let snapshot = shared.snapshot().await;
        assert_eq!(snapshot.messages.len(), 1 + 2 * n);
    }

    let snapshot = shared.snapshot().await;
    for n in 1..=5 {
        assert_eq!(snapshot.messages[2 * n - 1], Message::user(format!("message {n}")));
        assert_eq!(snapshot.messages[2 * n], Message::bot(format!("echo: message {n}")));
    }
}

#[tokio::test]
async fn test_blank_submit_never_calls_transport() {
    let transport = Arc::new(EchoTransport::default());
    let shared = open_shared(transport.clone()).await;

    for input in ["", " ", "\t\n  "] {
        assert_eq!(shared.submit(input).await, SubmitOutcome::Ignored);
    }

    assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
    assert_eq!(shared.phase().await, WidgetPhase::Idle);
    assert_eq!(shared.snapshot().await.messages.len(), 1);
}

#[tokio::test]
async fn test_submit_while_sending_is_noop() {
    let transport = Arc::new(GatedTransport::default());
    let shared = open_shared(transport.clone()).await;

    let first = tokio::spawn({
        let shared = shared.clone();
        async move { shared.submit("hello").await }
    });
    transport.entered.notified().await;

    let before = shared.snapshot().await;
    assert_eq!(before.phase, WidgetPhase::Sending);
    assert_eq!(before.messages.len(), 2);

    assert_eq!(shared.submit("second").await, SubmitOutcome::Ignored);
    let during = shared.snapshot().await;
    assert_eq!(during, before);

    transport.release.notify_one();
    let outcome = first.await.unwrap();
    assert_eq!(outcome, SubmitOutcome::Replied(BotReply::text("finally")));
    assert_eq!(transport.requests.lock().await.len(), 1);

    let after = shared.snapshot().await;
    assert_eq!(after.phase, WidgetPhase::Idle);
    assert_eq!(after.messages.len(), 3);
}

#[tokio::test]
async fn test_burst_of_submits_accepts_exactly_one() {
    let shared = open_shared(Arc::new(YieldingTransport)).await;

    let outcomes = futures::future::join_all(
        (0..5).map(|n| {
            let shared = shared.clone();
            async move { shared.submit(&format!("burst {n}")).await }
        }),
    )
    .await;

    let replied = outcomes
        .iter()
        .filter(|o| matches!(o, SubmitOutcome::Replied(_)))
        .count();
    assert_eq!(replied, 1);
    assert_eq!(outcomes.len() - replied, 4);
    assert!(outcomes[1..].iter().all(|o| *o == SubmitOutcome::Ignored));

    let snapshot = shared.snapshot().await;
    assert_eq!(snapshot.messages.len(), 3);
    assert_eq!(snapshot.messages[1], Message::user("burst 0"));
}

#[tokio::test]
async fn test_failing_transport_appends_one_error_per_submit() {
    let transport = Arc::new(FailingTransport::default());
    let shared = open_shared(transport.clone()).await;
    let error_message = config().error_message().to_string();

    for n in 1..=3 {
        let outcome = shared.submit("hello").await;
        assert!(matches!(outcome, SubmitOutcome::Failed(TransportError::Network(_))));

        let snapshot = shared.snapshot().await;
        assert_eq!(snapshot.phase, WidgetPhase::Error);
        assert!(snapshot.affordances.send_enabled);
        assert_eq!(snapshot.messages.len(), 1 + 2 * n);
        assert_eq!(snapshot.messages.last(), Some(&Message::bot(error_message.clone())));
    }
    assert_eq!(transport.calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_hello_scenario() {
    let shared = open_shared(Arc::new(FixedTransport(BotReply::text("Hi there")))).await;

    shared.submit("hello").await;

    let snapshot = shared.snapshot().await;
    assert_eq!(snapshot.phase, WidgetPhase::Idle);
    assert_eq!(
        snapshot.messages,
        vec![
            Message::bot(config().greeting()),
            Message::user("hello"),
            Message::bot("Hi there"),
        ]
    );
}

#[tokio::test]
async fn test_empty_reply_scenario_uses_fallback() {
    let reply = embedchat_core::transport::decode_reply(b"{}").unwrap();
    let shared = open_shared(Arc::new(FixedTransport(reply))).await;

    shared.submit("hello").await;

    let snapshot = shared.snapshot().await;
    assert_eq!(snapshot.messages.last(), Some(&Message::bot(FALLBACK_REPLY)));
}

#[tokio::test(start_paused = true)]
async fn test_hanging_request_times_out_to_error() {
    let widget = ChatWidget::new(
        config().with_request_timeout(Duration::from_secs(10)),
        SessionMode::Ephemeral,
    );
    let shared = SharedWidget::new(widget, Arc::new(HangingTransport));
    shared.open().await;

    let outcome = shared.submit("hello").await;
    assert_eq!(outcome, SubmitOutcome::Failed(TransportError::Timeout));
    assert_eq!(shared.phase().await, WidgetPhase::Error);

    // the widget accepts input again
    let pending = shared.inspect(|w| w.affordances().send_enabled).await;
    assert!(pending);
}

#[tokio::test]
async fn test_public_widget_sends_persistent_session() {
    let store = MemoryStore::new();
    let identity = Arc::new(IdentityStore::new(store.clone(), "https://shop.example.com"));
    let transport = Arc::new(GatedTransport::default());
    let shared = SharedWidget::new(
        ChatWidget::new(config(), SessionMode::Persistent(identity)),
        transport.clone(),
    );
    shared.toggle().await;

    let submit = tokio::spawn({
        let shared = shared.clone();
        async move { shared.submit("hello").await }
    });
    transport.entered.notified().await;
    transport.release.notify_one();
    submit.await.unwrap();

    // a reload on the same origin resolves the same token
    let reloaded = IdentityStore::new(store, "https://shop.example.com").resolve().unwrap();
    let requests = transport.requests.lock().await;
    assert_eq!(requests[0].session_id.as_deref(), Some(reloaded.as_str()));
}

#[tokio::test(start_paused = true)]
async fn test_abandoned_submit_still_returns_to_idle() {
    let shared = open_shared(Arc::new(SlowTransport(Duration::from_secs(1)))).await;

    let abandoned = tokio::time::timeout(Duration::from_millis(10), shared.submit("hello")).await;
    assert!(abandoned.is_err());
    assert_eq!(shared.phase().await, WidgetPhase::Sending);

    tokio::time::sleep(Duration::from_secs(3600)).await;
    assert_eq!(shared.phase().await, WidgetPhase::Idle);
    let snapshot = shared.snapshot().await;
    assert_eq!(snapshot.messages.len(), 3);
    assert_eq!(snapshot.messages[2], Message::bot("late: hello"));

    let outcome = shared.submit("again").await;
    assert_eq!(outcome, SubmitOutcome::Replied(BotReply::text("late: again")));
}

#[tokio::test]
async fn test_identity_resolution_does_not_block_event_loop() {
    let resolver = Arc::new(BlockingResolver {
        delay: Duration::from_millis(400),
        inner: IdentityStore::new(MemoryStore::new(), "https://shop.example.com"),
    });
    let shared = SharedWidget::new(
        ChatWidget::new(config(), SessionMode::Persistent(resolver)),
        Arc::new(EchoTransport::default()),
    );

    let started = Instant::now();
    let ticker = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        started.elapsed()
    });

    assert_eq!(shared.open().await, WidgetPhase::Idle);
    let ticked_after = ticker.await.unwrap();
    assert!(
        ticked_after < Duration::from_millis(300),
        "timer starved for {ticked_after:?} while the identity resolved"
    );
    assert!(shared.inspect(|w| w.session_token().is_some()).await);
}
