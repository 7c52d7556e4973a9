//! # Purchase Analytics
//!
//! The conversion event emitted exactly once per confirmed purchase. An
//! emission failure is logged and swallowed; it must never block the
//! customer-facing success flow.

use async_trait::async_trait;
use checkout_core::{CheckoutResult, Currency, ShippingMethod, TrackingContext};
use serde::Serialize;
use tracing::info;

/// Conversion event for a confirmed purchase
#[derive(Debug, Clone, Serialize)]
pub struct PurchaseEvent {
    /// Human-readable order name (e.g. "#1001")
    pub order_name: String,
    pub order_number: i64,

    /// Gateway payment identifier (transaction id for attribution)
    pub payment_id: String,

    /// Total charged, shipping included
    pub value: f64,
    pub currency: Currency,

    pub savings: f64,
    pub bundle_active: bool,
    pub shipping_method: ShippingMethod,

    pub email: String,
    pub tracking: TrackingContext,
}

/// Sink for purchase conversion events
#[async_trait]
pub trait AnalyticsSink: Send + Sync {
    async fn purchase_completed(&self, event: &PurchaseEvent) -> CheckoutResult<()>;
}

/// Default sink that records the conversion in the logs
pub struct LoggingAnalyticsSink;

#[async_trait]
impl AnalyticsSink for LoggingAnalyticsSink {
    async fn purchase_completed(&self, event: &PurchaseEvent) -> CheckoutResult<()> {
        info!(
            "Purchase confirmed: order={} payment={} value={:.2} {}",
            event.order_name, event.payment_id, event.value, event.currency
        );
        Ok(())
    }
}
