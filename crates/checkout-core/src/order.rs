//! # Order Types
//!
//! The pending order is the durability anchor of the whole design: it is
//! written to the commerce platform before the customer can complete payment,
//! carrying the payment reference, so a paid-but-unrecorded order can never
//! exist. Once created it transitions pending→paid exactly once.

use crate::cart::{Currency, ShippingInfo, ShippingMethod};
use crate::mapping::MappedLineItem;
use crate::tracking::TrackingContext;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Financial status of an order, as far as the checkout engine cares
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinancialStatus {
    Pending,
    Paid,
}

impl FinancialStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FinancialStatus::Pending => "pending",
            FinancialStatus::Paid => "paid",
        }
    }
}

impl Default for FinancialStatus {
    fn default() -> Self {
        FinancialStatus::Pending
    }
}

/// An order record on the commerce platform
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingOrder {
    /// Platform order id
    pub id: i64,

    /// Human-readable order name (e.g. "#1001")
    pub name: String,

    pub order_number: i64,
    pub email: String,

    /// Total as the platform reports it
    pub total_price: String,

    #[serde(default)]
    pub financial_status: FinancialStatus,

    pub created_at: DateTime<Utc>,

    /// Customer-facing order status page
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_url: Option<String>,
}

impl PendingOrder {
    pub fn is_paid(&self) -> bool {
        self.financial_status == FinancialStatus::Paid
    }
}

/// Everything the commerce platform needs to record a pending order.
///
/// Built once per attempt, strictly after the payment session exists, since
/// the order stores the payment reference for later reconciliation.
#[derive(Debug, Clone)]
pub struct OrderDraft {
    pub email: String,
    pub line_items: Vec<MappedLineItem>,
    pub shipping: ShippingInfo,

    /// Gateway payment identifier this order reconciles against
    pub payment_id: String,

    /// Grand total the customer pays, shipping included
    pub total_amount: f64,
    pub currency: Currency,

    pub shipping_cost: f64,
    pub shipping_method: ShippingMethod,

    pub bundle_active: bool,
    pub savings: f64,

    pub tracking: TrackingContext,
}
