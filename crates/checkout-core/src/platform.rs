//! # Provider Traits
//!
//! Seams for the two external systems the checkout engine composes: the
//! payment gateway (owns authorization) and the commerce platform (owns the
//! order of record). Each provider crate implements one of these, so the
//! engine and its tests run against trait objects.

use crate::error::CheckoutResult;
use crate::order::{OrderDraft, PendingOrder};
use crate::session::{PaymentRequest, PaymentSession, PaymentStatus};
use async_trait::async_trait;
use std::sync::Arc;

/// A payment gateway that authorizes payments out-of-band on a hosted page.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create a payment session and return its id and redirect URL.
    ///
    /// Called once per checkout attempt. No retries at this layer — a
    /// failure aborts the attempt with the transport error surfaced.
    async fn create_payment(&self, request: &PaymentRequest) -> CheckoutResult<PaymentSession>;

    /// Fetch the current status of a payment (used by the poll loop).
    async fn payment_status(&self, payment_id: &str) -> CheckoutResult<PaymentStatus>;

    /// Gateway name for logging and order annotations.
    fn gateway_name(&self) -> &'static str;
}

/// Type alias for a shared payment gateway (dynamic dispatch)
pub type BoxedPaymentGateway = Arc<dyn PaymentGateway>;

/// The commerce platform that records orders.
#[async_trait]
pub trait CommercePlatform: Send + Sync {
    /// Create a durable pending order carrying the payment reference.
    ///
    /// Must be called strictly after the payment session exists. Once this
    /// succeeds the attempt is recoverable out-of-band even if the client
    /// disappears.
    async fn create_pending_order(&self, draft: &OrderDraft) -> CheckoutResult<PendingOrder>;

    /// Commit a pending order to paid, keyed by order id and payment id.
    ///
    /// Implementations must be idempotent: committing an already-paid order
    /// returns it unchanged without a second write.
    async fn mark_order_paid(
        &self,
        order_id: i64,
        payment_id: &str,
    ) -> CheckoutResult<PendingOrder>;

    /// Locate a recent order by its payment reference (webhook reconciliation).
    async fn find_order_by_payment(
        &self,
        payment_id: &str,
    ) -> CheckoutResult<Option<PendingOrder>>;

    /// Platform name for logging.
    fn platform_name(&self) -> &'static str;
}

/// Type alias for a shared commerce platform (dynamic dispatch)
pub type BoxedCommercePlatform = Arc<dyn CommercePlatform>;
