//! # Checkout Flow
//!
//! The single entry point the surrounding application drives:
//! `pay_with_gateway` runs one checkout attempt end to end — allocate
//! prices, map lines, create the payment session, write the pending order,
//! open the payment surface, poll for the outcome, then commit or classify.
//!
//! Progress is observable through a watch channel; the returned future is
//! the attempt itself, so dropping it (component teardown) cancels the poll
//! loop and releases the in-flight guard. The pending order is never rolled
//! back: whatever happens after it exists, it remains the durable record.

use crate::analytics::{AnalyticsSink, LoggingAnalyticsSink, PurchaseEvent};
use crate::poller::{poll_payment, PollEvent, PollOutcome};
use crate::settings::EngineSettings;
use crate::surface::{PaymentSurface, PaymentWindow};
use checkout_core::{
    map_cart_lines, BoxedCommercePlatform, BoxedPaymentGateway, CartLine, CheckoutError,
    CheckoutProgress, CheckoutResult, OrderDraft, Payer, PayerAddress, PaymentRequest,
    PendingOrder, PriceAllocation, PromotionQuote, ReconciliationState, ShippingInfo,
    TrackingContext,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info, warn};

pub const MSG_CREATING_ORDER: &str = "Creating your order...";
pub const MSG_OPENING_PAYMENT: &str = "Opening the payment window...";
pub const MSG_POLLING: &str = "Waiting for payment confirmation...";
pub const MSG_WINDOW_CLOSED: &str = "Payment window closed. Verifying payment...";
pub const MSG_UPDATING_ORDER: &str = "Payment confirmed. Updating your order...";
pub const MSG_SUCCESS: &str = "Payment successful. Redirecting...";
pub const MSG_FAILED: &str = "Payment declined. Please try again.";
pub const MSG_PENDING_CONFIRMATION: &str =
    "Your order was created. You will receive an email once the payment is confirmed.";
pub const MSG_PENDING_PAID: &str = "Payment received. Your order is being processed.";

/// Local cart/bundle state cleared after a confirmed purchase
pub trait CartStore: Send + Sync {
    fn clear(&self);
}

/// No-op store for hosts that manage cart state themselves
pub struct NoopCartStore;

impl CartStore for NoopCartStore {
    fn clear(&self) {}
}

/// Terminal result of one checkout attempt
#[derive(Debug, Clone)]
pub struct CheckoutOutcome {
    pub state: ReconciliationState,
    pub order: Option<PendingOrder>,
    /// Navigation instruction for the surrounding application
    pub navigate_to: Option<String>,
}

/// The payment-reconciliation flow. One instance drives one attempt at a
/// time; construct it once and reuse it across attempts.
pub struct CheckoutFlow {
    gateway: BoxedPaymentGateway,
    commerce: BoxedCommercePlatform,
    surface: Arc<dyn PaymentSurface>,
    analytics: Arc<dyn AnalyticsSink>,
    cart_store: Arc<dyn CartStore>,
    settings: EngineSettings,
    progress: watch::Sender<CheckoutProgress>,
    in_flight: AtomicBool,
}

impl CheckoutFlow {
    pub fn new(
        gateway: BoxedPaymentGateway,
        commerce: BoxedCommercePlatform,
        surface: Arc<dyn PaymentSurface>,
        settings: EngineSettings,
    ) -> Self {
        let (progress, _) = watch::channel(CheckoutProgress::idle());
        Self {
            gateway,
            commerce,
            surface,
            analytics: Arc::new(LoggingAnalyticsSink),
            cart_store: Arc::new(NoopCartStore),
            settings,
            progress,
            in_flight: AtomicBool::new(false),
        }
    }

    /// Builder: set the purchase-event sink
    pub fn with_analytics(mut self, analytics: Arc<dyn AnalyticsSink>) -> Self {
        self.analytics = analytics;
        self
    }

    /// Builder: set the cart store cleared on success
    pub fn with_cart_store(mut self, cart_store: Arc<dyn CartStore>) -> Self {
        self.cart_store = cart_store;
        self
    }

    /// Observe state/message/order updates for UI binding
    pub fn subscribe(&self) -> watch::Receiver<CheckoutProgress> {
        self.progress.subscribe()
    }

    /// Run one checkout attempt end to end.
    ///
    /// The cart is frozen at this call; the quote comes from the external
    /// promotion rule. Cancellation is dropping the returned future — the
    /// poll loop stops and no commit can follow.
    pub async fn pay_with_gateway(
        &self,
        shipping: ShippingInfo,
        cart: Vec<CartLine>,
        quote: PromotionQuote,
        tracking: TrackingContext,
    ) -> CheckoutOutcome {
        // One attempt at a time: the UI disables its trigger once an
        // attempt starts, and this guard backs that up.
        if self.in_flight.swap(true, Ordering::SeqCst) {
            warn!("Rejecting concurrent checkout attempt");
            return CheckoutOutcome {
                state: ReconciliationState::Failed {
                    reason: "A checkout attempt is already in progress".to_string(),
                },
                order: None,
                navigate_to: None,
            };
        }
        let _guard = InFlightGuard(&self.in_flight);

        let mut state = ReconciliationState::Idle;
        let mut order: Option<PendingOrder> = None;

        match self
            .attempt(&mut state, &mut order, shipping, cart, quote, tracking)
            .await
        {
            Ok(outcome) => outcome,
            Err(err) => {
                let reason = err.to_string();
                error!("Checkout attempt failed: {}", reason);

                let failed = ReconciliationState::Failed {
                    reason: reason.clone(),
                };
                if self.advance(&mut state, failed.clone(), &reason, &order).is_err() {
                    state = failed;
                }
                self.outcome(&state, &order, None)
            }
        }
    }

    async fn attempt(
        &self,
        state: &mut ReconciliationState,
        order_slot: &mut Option<PendingOrder>,
        shipping: ShippingInfo,
        cart: Vec<CartLine>,
        quote: PromotionQuote,
        tracking: TrackingContext,
    ) -> CheckoutResult<CheckoutOutcome> {
        self.advance(
            state,
            ReconciliationState::CreatingOrder,
            MSG_CREATING_ORDER,
            order_slot,
        )?;

        // Pre-flight: pricing and variant mapping. Failures here abort with
        // no external side effects.
        let allocation = PriceAllocation::compute(&cart, quote.promotional_total)?;
        let mapped = map_cart_lines(&cart, &allocation, &quote)?;

        // Payment session first: the order stores the payment reference.
        let request = self.build_payment_request(&shipping, mapped.len(), &quote, &tracking);
        let session = self.gateway.create_payment(&request).await?;
        info!("Payment session created: {}", session.payment_id);

        let draft = OrderDraft {
            email: shipping.email.clone(),
            line_items: mapped,
            shipping,
            payment_id: session.payment_id.clone(),
            total_amount: quote.grand_total(),
            currency: self.settings.currency,
            shipping_cost: quote.shipping_cost,
            shipping_method: quote.shipping_method,
            bundle_active: quote.bundle_active,
            savings: quote.savings,
            tracking,
        };

        // The durability anchor. An orphaned payment session with no order
        // is harmless (gateway sessions expire on their own), so a failure
        // here is surfaced without rolling the session back.
        let order = self.commerce.create_pending_order(&draft).await?;
        info!("Pending order created: {}", order.name);
        *order_slot = Some(order);

        self.advance(
            state,
            ReconciliationState::OpeningPayment,
            MSG_OPENING_PAYMENT,
            order_slot,
        )?;
        let mut window = self.surface.open(&session.redirect_url)?;

        self.advance(state, ReconciliationState::Polling, MSG_POLLING, order_slot)?;

        let order_snapshot = order_slot.clone();
        let outcome = poll_payment(
            self.gateway.as_ref(),
            &session.payment_id,
            &mut *window,
            &self.settings.poll,
            |event| match event {
                PollEvent::WindowClosed { .. } => {
                    self.progress.send_replace(CheckoutProgress {
                        state: ReconciliationState::Polling,
                        message: MSG_WINDOW_CLOSED.to_string(),
                        order: order_snapshot.clone(),
                    });
                }
            },
        )
        .await;

        match outcome {
            PollOutcome::Paid => {
                self.commit(state, order_slot, &mut *window, &draft).await
            }
            PollOutcome::Rejected | PollOutcome::Cancelled => {
                if !window.is_closed() {
                    window.close();
                }
                // The pending order is left as-is for audit and cleanup.
                self.advance(
                    state,
                    ReconciliationState::Failed {
                        reason: MSG_FAILED.to_string(),
                    },
                    MSG_FAILED,
                    order_slot,
                )?;
                Ok(self.outcome(state, order_slot, None))
            }
            PollOutcome::HardTimeout | PollOutcome::CloseGraceTimeout => {
                // A timeout is not a terminal verdict: the order exists and
                // will be confirmed out-of-band. The window is left alone.
                self.advance(
                    state,
                    ReconciliationState::PendingConfirmation,
                    MSG_PENDING_CONFIRMATION,
                    order_slot,
                )?;
                Ok(self.outcome(state, order_slot, None))
            }
        }
    }

    async fn commit(
        &self,
        state: &mut ReconciliationState,
        order_slot: &mut Option<PendingOrder>,
        window: &mut dyn PaymentWindow,
        draft: &OrderDraft,
    ) -> CheckoutResult<CheckoutOutcome> {
        // The poll loop has already returned, so this is the only commit
        // this attempt can ever issue.
        self.advance(
            state,
            ReconciliationState::UpdatingOrder,
            MSG_UPDATING_ORDER,
            order_slot,
        )?;

        let order_id = order_slot
            .as_ref()
            .map(|order| order.id)
            .ok_or_else(|| CheckoutError::Internal("no pending order at commit".to_string()))?;

        match self
            .commerce
            .mark_order_paid(order_id, &draft.payment_id)
            .await
        {
            Ok(paid_order) => {
                let event = PurchaseEvent {
                    order_name: paid_order.name.clone(),
                    order_number: paid_order.order_number,
                    payment_id: draft.payment_id.clone(),
                    value: draft.total_amount,
                    currency: draft.currency,
                    savings: draft.savings,
                    bundle_active: draft.bundle_active,
                    shipping_method: draft.shipping_method,
                    email: draft.email.clone(),
                    tracking: draft.tracking.clone(),
                };
                if let Err(err) = self.analytics.purchase_completed(&event).await {
                    warn!("Purchase event emission failed (ignored): {}", err);
                }

                if !window.is_closed() {
                    window.close();
                }
                self.cart_store.clear();

                let navigate = self.settings.urls.success_url_for_order(&paid_order.name);
                let order_name = paid_order.name.clone();
                *order_slot = Some(paid_order);

                self.advance(
                    state,
                    ReconciliationState::Success { order_name },
                    MSG_SUCCESS,
                    order_slot,
                )?;
                Ok(self.outcome(state, order_slot, Some(navigate)))
            }
            Err(err) => {
                // The gateway said PAID; a commerce-side failure must read
                // as pending confirmation, never as a failed payment.
                warn!(
                    "Order commit failed, downgrading to pending confirmation: {}",
                    err
                );
                self.advance(
                    state,
                    ReconciliationState::PendingConfirmation,
                    MSG_PENDING_PAID,
                    order_slot,
                )?;
                Ok(self.outcome(state, order_slot, None))
            }
        }
    }

    fn advance(
        &self,
        state: &mut ReconciliationState,
        next: ReconciliationState,
        message: &str,
        order: &Option<PendingOrder>,
    ) -> CheckoutResult<()> {
        let previous = std::mem::take(state);
        *state = previous.transition(next)?;
        info!("Checkout state -> {}", state.label());
        self.progress.send_replace(CheckoutProgress {
            state: state.clone(),
            message: message.to_string(),
            order: order.clone(),
        });
        Ok(())
    }

    fn outcome(
        &self,
        state: &ReconciliationState,
        order: &Option<PendingOrder>,
        navigate_to: Option<String>,
    ) -> CheckoutOutcome {
        CheckoutOutcome {
            state: state.clone(),
            order: order.clone(),
            navigate_to,
        }
    }

    fn build_payment_request(
        &self,
        shipping: &ShippingInfo,
        item_count: usize,
        quote: &PromotionQuote,
        tracking: &TrackingContext,
    ) -> PaymentRequest {
        build_payment_request(&self.settings, shipping, item_count, quote, tracking)
    }
}

/// Build the gateway payment request for one checkout attempt.
///
/// Shared between the in-process flow and the HTTP API, so both surfaces
/// produce identical sessions for the same checkout data.
pub fn build_payment_request(
    settings: &EngineSettings,
    shipping: &ShippingInfo,
    item_count: usize,
    quote: &PromotionQuote,
    tracking: &TrackingContext,
) -> PaymentRequest {
    let payer = Payer {
        name: shipping.full_name(),
        email: shipping.email.clone(),
        document: shipping.document.clone(),
        address: Some(PayerAddress {
            state: if shipping.province.is_empty() {
                shipping.city.clone()
            } else {
                shipping.province.clone()
            },
            city: shipping.city.clone(),
            zip_code: shipping.zip.clone(),
            full_address: shipping.full_address(),
        }),
    };

    let description = if quote.bundle_active {
        format!(
            "{} item(s) - bundle (savings {:.0})",
            item_count, quote.savings
        )
    } else {
        format!("{} item(s)", item_count)
    };

    let urls = &settings.urls;
    let mut request = PaymentRequest::new(quote.grand_total(), settings.currency, payer)
        .with_description(description)
        .with_urls(
            Some(urls.notification_url()),
            Some(urls.success_url()),
            Some(urls.back_url()),
        )
        .with_metadata("source", "storefront_checkout")
        .with_metadata("bundle_active", quote.bundle_active.to_string())
        .with_metadata("shipping_method", quote.shipping_method.code())
        .with_metadata("item_count", item_count.to_string())
        .with_metadata("subtotal", format!("{:.2}", quote.promotional_total))
        .with_metadata("shipping_cost", format!("{:.2}", quote.shipping_cost))
        .with_metadata("total", format!("{:.2}", quote.grand_total()));

    if let Some(session_id) = &tracking.session_id {
        request = request.with_metadata("session_id", session_id.clone());
    }
    if let Some(utm_source) = &tracking.utm_source {
        request = request.with_metadata("utm_source", utm_source.clone());
    }
    if let Some(utm_campaign) = &tracking.utm_campaign {
        request = request.with_metadata("utm_campaign", utm_campaign.clone());
    }

    request
}

/// Releases the in-flight flag when the attempt ends or its future is dropped
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}
