//! End-to-end reconciliation tests against scripted providers.
//!
//! Time is paused (`start_paused`), so the 3-second poll cadence runs
//! instantly while keeping the attempt/grace arithmetic exact.

use async_trait::async_trait;
use checkout_core::{
    CartLine, CheckoutError, CheckoutResult, CommercePlatform, FinancialStatus, OrderDraft,
    PaymentGateway, PaymentRequest, PaymentSession, PaymentStatus, PendingOrder, PromotionQuote,
    ReconciliationState, SelectedOption, ShippingInfo, ShippingMethod, TrackingContext,
    VariantOption,
};
use checkout_engine::{
    AnalyticsSink, CartStore, CheckoutFlow, CheckoutOutcome, EngineSettings, PaymentSurface,
    PaymentWindow, PollSettings, PurchaseEvent,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

// =============================================================================
// Scripted providers
// =============================================================================

#[derive(Clone)]
enum Scripted {
    Status(PaymentStatus),
    TransportError,
}

struct ScriptedGateway {
    script: Mutex<VecDeque<Scripted>>,
    create_calls: AtomicU32,
    status_calls: AtomicU32,
    fail_create: bool,
}

impl ScriptedGateway {
    /// The last script entry repeats forever.
    fn new(script: Vec<Scripted>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            create_calls: AtomicU32::new(0),
            status_calls: AtomicU32::new(0),
            fail_create: false,
        })
    }

    fn always(status: PaymentStatus) -> Arc<Self> {
        Self::new(vec![Scripted::Status(status)])
    }

    fn failing_create() -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(VecDeque::new()),
            create_calls: AtomicU32::new(0),
            status_calls: AtomicU32::new(0),
            fail_create: true,
        })
    }

    fn status_calls(&self) -> u32 {
        self.status_calls.load(Ordering::SeqCst)
    }

    fn create_calls(&self) -> u32 {
        self.create_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentGateway for ScriptedGateway {
    async fn create_payment(&self, _request: &PaymentRequest) -> CheckoutResult<PaymentSession> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_create {
            return Err(CheckoutError::ProviderError {
                provider: "test_gateway".into(),
                message: "session refused".into(),
            });
        }
        Ok(PaymentSession::new(
            "PAY-TEST",
            "https://gateway.test/pay/PAY-TEST",
        ))
    }

    async fn payment_status(&self, _payment_id: &str) -> CheckoutResult<PaymentStatus> {
        tokio::task::yield_now().await;
        self.status_calls.fetch_add(1, Ordering::SeqCst);

        let mut script = self.script.lock().unwrap();
        let entry = if script.len() > 1 {
            script.pop_front().unwrap()
        } else {
            script
                .front()
                .cloned()
                .unwrap_or(Scripted::Status(PaymentStatus::Pending))
        };
        match entry {
            Scripted::Status(status) => Ok(status),
            Scripted::TransportError => {
                Err(CheckoutError::NetworkError("connection reset".into()))
            }
        }
    }

    fn gateway_name(&self) -> &'static str {
        "test_gateway"
    }
}

fn stub_order(financial_status: FinancialStatus) -> PendingOrder {
    PendingOrder {
        id: 9001,
        name: "#1001".into(),
        order_number: 1001,
        email: "ana@example.com".into(),
        total_price: "30000.00".into(),
        financial_status,
        created_at: chrono::Utc::now(),
        status_url: None,
    }
}

#[derive(Default)]
struct RecordingCommerce {
    create_calls: AtomicU32,
    commit_calls: AtomicU32,
    fail_create: bool,
    fail_commit: bool,
}

impl RecordingCommerce {
    fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn failing_create() -> Arc<Self> {
        Arc::new(Self {
            fail_create: true,
            ..Self::default()
        })
    }

    fn failing_commit() -> Arc<Self> {
        Arc::new(Self {
            fail_commit: true,
            ..Self::default()
        })
    }

    fn create_calls(&self) -> u32 {
        self.create_calls.load(Ordering::SeqCst)
    }

    fn commit_calls(&self) -> u32 {
        self.commit_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CommercePlatform for RecordingCommerce {
    async fn create_pending_order(&self, _draft: &OrderDraft) -> CheckoutResult<PendingOrder> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_create {
            return Err(CheckoutError::ProviderError {
                provider: "test_platform".into(),
                message: "order write refused".into(),
            });
        }
        Ok(stub_order(FinancialStatus::Pending))
    }

    async fn mark_order_paid(
        &self,
        _order_id: i64,
        _payment_id: &str,
    ) -> CheckoutResult<PendingOrder> {
        self.commit_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_commit {
            return Err(CheckoutError::CommitFailed("update timed out".into()));
        }
        Ok(stub_order(FinancialStatus::Paid))
    }

    async fn find_order_by_payment(
        &self,
        _payment_id: &str,
    ) -> CheckoutResult<Option<PendingOrder>> {
        Ok(None)
    }

    fn platform_name(&self) -> &'static str {
        "test_platform"
    }
}

// =============================================================================
// Scripted surface
// =============================================================================

#[derive(Default)]
struct WindowState {
    liveness_checks: AtomicU32,
    closed: AtomicBool,
    /// The window reports closed after this many liveness checks
    closes_after: Option<u32>,
    open_calls: AtomicU32,
}

impl WindowState {
    fn open_forever() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn closing_after(checks: u32) -> Arc<Self> {
        Arc::new(Self {
            closes_after: Some(checks),
            ..Self::default()
        })
    }

    fn was_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

struct TestWindow(Arc<WindowState>);

impl PaymentWindow for TestWindow {
    fn is_closed(&self) -> bool {
        if self.0.closed.load(Ordering::SeqCst) {
            return true;
        }
        let checks = self.0.liveness_checks.fetch_add(1, Ordering::SeqCst) + 1;
        match self.0.closes_after {
            Some(limit) => checks > limit,
            None => false,
        }
    }

    fn close(&mut self) {
        self.0.closed.store(true, Ordering::SeqCst);
    }
}

struct TestSurface {
    state: Arc<WindowState>,
    blocked: bool,
}

impl TestSurface {
    fn new(state: Arc<WindowState>) -> Arc<Self> {
        Arc::new(Self {
            state,
            blocked: false,
        })
    }

    fn blocked() -> Arc<Self> {
        Arc::new(Self {
            state: WindowState::open_forever(),
            blocked: true,
        })
    }
}

impl PaymentSurface for TestSurface {
    fn open(&self, _redirect_url: &str) -> CheckoutResult<Box<dyn PaymentWindow>> {
        self.state.open_calls.fetch_add(1, Ordering::SeqCst);
        if self.blocked {
            return Err(CheckoutError::PopupBlocked(
                "popups are blocked for this site".into(),
            ));
        }
        Ok(Box::new(TestWindow(self.state.clone())))
    }
}

// =============================================================================
// Analytics / cart fixtures
// =============================================================================

#[derive(Default)]
struct RecordingSink {
    events: AtomicU32,
    fail: bool,
}

#[async_trait]
impl AnalyticsSink for RecordingSink {
    async fn purchase_completed(&self, _event: &PurchaseEvent) -> CheckoutResult<()> {
        self.events.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(CheckoutError::NetworkError("pixel endpoint down".into()));
        }
        Ok(())
    }
}

#[derive(Default)]
struct FlagCartStore {
    cleared: AtomicBool,
}

impl CartStore for FlagCartStore {
    fn clear(&self) {
        self.cleared.store(true, Ordering::SeqCst);
    }
}

fn sized_variant(id: u64, size: &str) -> VariantOption {
    VariantOption {
        id: format!("gid://shopify/ProductVariant/{}", id),
        title: Some(size.to_string()),
        selected_options: vec![SelectedOption {
            name: "Size".into(),
            value: size.into(),
        }],
    }
}

fn cart() -> Vec<CartLine> {
    vec![
        CartLine {
            product_id: "home-jersey".into(),
            name: "Home Jersey".into(),
            size: "M".into(),
            color: None,
            quantity: 1,
            unit_price: 18000.0,
            image: None,
            variants: vec![sized_variant(11, "M")],
            personalization: None,
            in_bundle: true,
        },
        CartLine {
            product_id: "away-jersey".into(),
            name: "Away Jersey".into(),
            size: "L".into(),
            color: None,
            quantity: 1,
            unit_price: 18000.0,
            image: None,
            variants: vec![sized_variant(22, "L")],
            personalization: None,
            in_bundle: true,
        },
    ]
}

fn cart_with_unavailable_size() -> Vec<CartLine> {
    let mut lines = cart();
    lines[1].size = "XXL".into();
    lines
}

fn shipping() -> ShippingInfo {
    ShippingInfo {
        first_name: "Ana".into(),
        last_name: "Gomez".into(),
        email: "ana@example.com".into(),
        document: "20123456".into(),
        phone: None,
        address1: "Av. Siempre Viva 742".into(),
        address2: None,
        city: "Buenos Aires".into(),
        province: "CABA".into(),
        zip: "C1414".into(),
        country: "AR".into(),
    }
}

fn quote() -> PromotionQuote {
    PromotionQuote {
        promotional_total: 30000.0,
        savings: 6000.0,
        bundle_active: true,
        shipping_cost: 0.0,
        shipping_method: ShippingMethod::Standard,
    }
}

fn settings(poll: PollSettings) -> EngineSettings {
    let mut settings = EngineSettings::default();
    settings.poll = poll;
    settings.urls = checkout_engine::CheckoutUrls::new("https://shop.test");
    settings
}

fn flow_with(
    gateway: Arc<ScriptedGateway>,
    commerce: Arc<RecordingCommerce>,
    surface: Arc<TestSurface>,
    poll: PollSettings,
) -> CheckoutFlow {
    CheckoutFlow::new(gateway, commerce, surface, settings(poll))
}

async fn run(flow: &CheckoutFlow) -> CheckoutOutcome {
    flow.pay_with_gateway(shipping(), cart(), quote(), TrackingContext::default())
        .await
}

// =============================================================================
// Tests
// =============================================================================

#[tokio::test(start_paused = true)]
async fn paid_outcome_commits_once_and_navigates() {
    let gateway = ScriptedGateway::new(vec![
        Scripted::Status(PaymentStatus::Pending),
        Scripted::Status(PaymentStatus::Pending),
        Scripted::Status(PaymentStatus::Paid),
    ]);
    let commerce = RecordingCommerce::shared();
    let window = WindowState::open_forever();
    let sink = Arc::new(RecordingSink::default());
    let cart_store = Arc::new(FlagCartStore::default());

    let flow = flow_with(
        gateway.clone(),
        commerce.clone(),
        TestSurface::new(window.clone()),
        PollSettings::default(),
    )
    .with_analytics(sink.clone())
    .with_cart_store(cart_store.clone());

    let outcome = run(&flow).await;

    assert!(matches!(outcome.state, ReconciliationState::Success { .. }));
    assert_eq!(commerce.commit_calls(), 1);
    assert_eq!(gateway.status_calls(), 3);
    assert_eq!(
        outcome.navigate_to.as_deref(),
        Some("https://shop.test/checkout/success?order=1001")
    );
    assert_eq!(sink.events.load(Ordering::SeqCst), 1);
    assert!(cart_store.cleared.load(Ordering::SeqCst));
    assert!(window.was_closed());
}

#[tokio::test(start_paused = true)]
async fn paid_on_every_tick_still_commits_once() {
    // The gateway would report PAID on every further tick; the loop must
    // stop at the first one so only a single commit can ever be issued.
    let gateway = ScriptedGateway::always(PaymentStatus::Paid);
    let commerce = RecordingCommerce::shared();

    let flow = flow_with(
        gateway.clone(),
        commerce.clone(),
        TestSurface::new(WindowState::open_forever()),
        PollSettings::default(),
    );

    let outcome = run(&flow).await;

    assert!(matches!(outcome.state, ReconciliationState::Success { .. }));
    assert_eq!(gateway.status_calls(), 1);
    assert_eq!(commerce.commit_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn rejected_stops_polling_immediately() {
    let gateway = ScriptedGateway::new(vec![
        Scripted::Status(PaymentStatus::Pending),
        Scripted::Status(PaymentStatus::Rejected),
        // Anything after the terminal status must never be fetched
        Scripted::Status(PaymentStatus::Paid),
    ]);
    let commerce = RecordingCommerce::shared();
    let window = WindowState::open_forever();

    let flow = flow_with(
        gateway.clone(),
        commerce.clone(),
        TestSurface::new(window.clone()),
        PollSettings::default(),
    );

    let outcome = run(&flow).await;

    assert!(matches!(outcome.state, ReconciliationState::Failed { .. }));
    assert_eq!(gateway.status_calls(), 2);
    // The pending order is preserved untouched for audit/cleanup
    assert_eq!(commerce.create_calls(), 1);
    assert_eq!(commerce.commit_calls(), 0);
    assert!(window.was_closed());
}

#[tokio::test(start_paused = true)]
async fn closed_window_grace_ends_as_pending_confirmation() {
    let gateway = ScriptedGateway::always(PaymentStatus::Pending);
    let commerce = RecordingCommerce::shared();
    // Window reports closed from the third liveness check onward
    let window = WindowState::closing_after(2);

    let flow = flow_with(
        gateway.clone(),
        commerce.clone(),
        TestSurface::new(window.clone()),
        PollSettings {
            interval_secs: 3,
            max_attempts: 100,
            close_grace_attempts: 5,
        },
    );

    let outcome = run(&flow).await;

    // Closing the window is not evidence of failure
    assert_eq!(outcome.state, ReconciliationState::PendingConfirmation);
    assert_eq!(commerce.commit_calls(), 0);
    // Closed at attempt 3; grace expires at attempt 8 before its fetch
    assert_eq!(gateway.status_calls(), 7);
    // The engine never closes the window on a timeout
    assert!(!window.was_closed());
}

#[tokio::test(start_paused = true)]
async fn transient_errors_poll_to_the_hard_cap() {
    let gateway = ScriptedGateway::new(vec![Scripted::TransportError]);
    let commerce = RecordingCommerce::shared();

    let flow = flow_with(
        gateway.clone(),
        commerce.clone(),
        TestSurface::new(WindowState::open_forever()),
        PollSettings {
            interval_secs: 3,
            max_attempts: 6,
            close_grace_attempts: 10,
        },
    );

    let outcome = run(&flow).await;

    // Errors are swallowed; every attempt up to the cap still polls
    assert_eq!(gateway.status_calls(), 6);
    assert_eq!(outcome.state, ReconciliationState::PendingConfirmation);
    assert_eq!(commerce.commit_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn variant_not_found_creates_no_session_and_no_order() {
    let gateway = ScriptedGateway::always(PaymentStatus::Paid);
    let commerce = RecordingCommerce::shared();

    let flow = flow_with(
        gateway.clone(),
        commerce.clone(),
        TestSurface::new(WindowState::open_forever()),
        PollSettings::default(),
    );

    let outcome = flow
        .pay_with_gateway(
            shipping(),
            cart_with_unavailable_size(),
            quote(),
            TrackingContext::default(),
        )
        .await;

    assert!(matches!(outcome.state, ReconciliationState::Failed { .. }));
    assert_eq!(gateway.create_calls(), 0);
    assert_eq!(commerce.create_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn commit_failure_downgrades_to_pending_confirmation() {
    let gateway = ScriptedGateway::always(PaymentStatus::Paid);
    let commerce = RecordingCommerce::failing_commit();
    let sink = Arc::new(RecordingSink::default());

    let flow = flow_with(
        gateway,
        commerce.clone(),
        TestSurface::new(WindowState::open_forever()),
        PollSettings::default(),
    )
    .with_analytics(sink.clone());

    let outcome = run(&flow).await;

    // Money was taken; this must never read as a failed payment
    assert_eq!(outcome.state, ReconciliationState::PendingConfirmation);
    assert_eq!(commerce.commit_calls(), 1);
    assert_eq!(sink.events.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn analytics_failure_never_blocks_success() {
    let gateway = ScriptedGateway::always(PaymentStatus::Paid);
    let commerce = RecordingCommerce::shared();
    let sink = Arc::new(RecordingSink {
        fail: true,
        ..Default::default()
    });

    let flow = flow_with(
        gateway,
        commerce.clone(),
        TestSurface::new(WindowState::open_forever()),
        PollSettings::default(),
    )
    .with_analytics(sink.clone());

    let outcome = run(&flow).await;

    assert!(matches!(outcome.state, ReconciliationState::Success { .. }));
    assert_eq!(sink.events.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn blocked_popup_fails_after_order_exists() {
    let gateway = ScriptedGateway::always(PaymentStatus::Paid);
    let commerce = RecordingCommerce::shared();

    let flow = flow_with(
        gateway.clone(),
        commerce.clone(),
        TestSurface::blocked(),
        PollSettings::default(),
    );

    let outcome = run(&flow).await;

    // The attempt fails, but session and pending order were already made;
    // the order stays for out-of-band resolution.
    assert!(matches!(outcome.state, ReconciliationState::Failed { .. }));
    assert_eq!(gateway.create_calls(), 1);
    assert_eq!(commerce.create_calls(), 1);
    assert_eq!(commerce.commit_calls(), 0);
    assert!(outcome.order.is_some());
}

#[tokio::test(start_paused = true)]
async fn order_write_failure_reports_without_session_rollback() {
    let gateway = ScriptedGateway::always(PaymentStatus::Paid);
    let commerce = RecordingCommerce::failing_create();

    let flow = flow_with(
        gateway.clone(),
        commerce.clone(),
        TestSurface::new(WindowState::open_forever()),
        PollSettings::default(),
    );

    let outcome = run(&flow).await;

    assert!(matches!(outcome.state, ReconciliationState::Failed { .. }));
    // The session was created and is simply left to expire gateway-side
    assert_eq!(gateway.create_calls(), 1);
    assert_eq!(gateway.status_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn session_failure_aborts_before_any_order() {
    let gateway = ScriptedGateway::failing_create();
    let commerce = RecordingCommerce::shared();

    let flow = flow_with(
        gateway.clone(),
        commerce.clone(),
        TestSurface::new(WindowState::open_forever()),
        PollSettings::default(),
    );

    let outcome = run(&flow).await;

    assert!(matches!(outcome.state, ReconciliationState::Failed { .. }));
    assert_eq!(commerce.create_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn concurrent_attempt_is_rejected_while_first_runs() {
    let gateway = ScriptedGateway::always(PaymentStatus::Pending);
    let commerce = RecordingCommerce::shared();

    let flow = flow_with(
        gateway,
        commerce.clone(),
        TestSurface::new(WindowState::open_forever()),
        PollSettings {
            interval_secs: 3,
            max_attempts: 3,
            close_grace_attempts: 10,
        },
    );

    let (first, second) = tokio::join!(run(&flow), run(&flow));

    assert_eq!(first.state, ReconciliationState::PendingConfirmation);
    match second.state {
        ReconciliationState::Failed { reason } => {
            assert!(reason.contains("already in progress"), "{}", reason)
        }
        other => panic!("expected rejection, got {:?}", other),
    }
    // Only the first attempt ever reached the providers
    assert_eq!(commerce.create_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn flow_is_reusable_after_an_attempt_ends() {
    let gateway = ScriptedGateway::always(PaymentStatus::Paid);
    let commerce = RecordingCommerce::shared();

    let flow = flow_with(
        gateway,
        commerce.clone(),
        TestSurface::new(WindowState::open_forever()),
        PollSettings::default(),
    );

    let first = run(&flow).await;
    let second = run(&flow).await;

    assert!(matches!(first.state, ReconciliationState::Success { .. }));
    assert!(matches!(second.state, ReconciliationState::Success { .. }));
    assert_eq!(commerce.commit_calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn progress_updates_are_observable() {
    let gateway = ScriptedGateway::always(PaymentStatus::Paid);
    let commerce = RecordingCommerce::shared();

    let flow = flow_with(
        gateway,
        commerce,
        TestSurface::new(WindowState::open_forever()),
        PollSettings::default(),
    );

    let progress = flow.subscribe();
    assert_eq!(progress.borrow().state, ReconciliationState::Idle);

    let outcome = run(&flow).await;

    assert!(matches!(outcome.state, ReconciliationState::Success { .. }));
    let last = progress.borrow();
    assert!(matches!(last.state, ReconciliationState::Success { .. }));
    assert!(last.order.is_some());
}
