//! # Payment Session Types
//!
//! Gateway-facing types: the payment request, the session it yields, and the
//! status values the poller classifies.

use crate::cart::Currency;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Payment status as reported by the gateway.
///
/// Only `Paid`, `Rejected` and `Cancelled` are terminal; anything the
/// gateway reports that we do not recognize flows through as `Other` and
/// keeps the poll loop running.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Rejected,
    Cancelled,
    Other(String),
}

impl PaymentStatus {
    /// Parse a provider status string (case-insensitive)
    pub fn from_provider(status: &str) -> Self {
        match status.to_ascii_uppercase().as_str() {
            "PENDING" => PaymentStatus::Pending,
            "PAID" => PaymentStatus::Paid,
            "REJECTED" => PaymentStatus::Rejected,
            "CANCELLED" => PaymentStatus::Cancelled,
            _ => PaymentStatus::Other(status.to_string()),
        }
    }

    /// Provider wire form
    pub fn as_str(&self) -> &str {
        match self {
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::Paid => "PAID",
            PaymentStatus::Rejected => "REJECTED",
            PaymentStatus::Cancelled => "CANCELLED",
            PaymentStatus::Other(other) => other.as_str(),
        }
    }

    /// A terminal status will not change further and ends the poll loop
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PaymentStatus::Paid | PaymentStatus::Rejected | PaymentStatus::Cancelled
        )
    }
}

impl Default for PaymentStatus {
    fn default() -> Self {
        PaymentStatus::Pending
    }
}

impl From<String> for PaymentStatus {
    fn from(status: String) -> Self {
        PaymentStatus::from_provider(&status)
    }
}

impl From<PaymentStatus> for String {
    fn from(status: PaymentStatus) -> Self {
        status.as_str().to_string()
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A payment session issued by the gateway.
///
/// Created at most once per checkout attempt; immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentSession {
    /// Gateway payment identifier
    pub payment_id: String,

    /// Hosted payment page to open in the detached surface
    pub redirect_url: String,

    /// Status at creation time
    #[serde(default)]
    pub status: PaymentStatus,

    pub created_at: DateTime<Utc>,
}

impl PaymentSession {
    pub fn new(payment_id: impl Into<String>, redirect_url: impl Into<String>) -> Self {
        Self {
            payment_id: payment_id.into(),
            redirect_url: redirect_url.into(),
            status: PaymentStatus::Pending,
            created_at: Utc::now(),
        }
    }
}

/// Payer details forwarded to the gateway
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payer {
    pub name: String,
    pub email: String,
    /// National identity/tax document
    pub document: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<PayerAddress>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayerAddress {
    pub state: String,
    pub city: String,
    pub zip_code: String,
    pub full_address: String,
}

/// Everything the gateway needs to create a payment session
#[derive(Debug, Clone)]
pub struct PaymentRequest {
    /// Amount in decimal currency units (total the customer pays)
    pub amount: f64,
    pub currency: Currency,
    /// ISO country for the gateway's local payment methods
    pub country: String,
    /// Our unique reference for this attempt
    pub order_ref: String,
    pub description: String,
    pub payer: Payer,
    /// Gateway webhook URL
    pub notification_url: Option<String>,
    /// Where the hosted page sends the customer on success
    pub success_url: Option<String>,
    /// Where the hosted page sends the customer if they back out
    pub back_url: Option<String>,
    /// Opaque metadata stored with the payment
    pub metadata: HashMap<String, String>,
}

impl PaymentRequest {
    /// Create a request with a generated order reference
    pub fn new(amount: f64, currency: Currency, payer: Payer) -> Self {
        Self {
            amount,
            currency,
            country: currency.default_country().to_string(),
            order_ref: Uuid::new_v4().to_string(),
            description: String::new(),
            payer,
            notification_url: None,
            success_url: None,
            back_url: None,
            metadata: HashMap::new(),
        }
    }

    /// Builder: set description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Builder: set redirect URLs
    pub fn with_urls(
        mut self,
        notification_url: Option<String>,
        success_url: Option<String>,
        back_url: Option<String>,
    ) -> Self {
        self.notification_url = notification_url;
        self.success_url = success_url;
        self.back_url = back_url;
        self
    }

    /// Builder: add metadata
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parsing() {
        assert_eq!(PaymentStatus::from_provider("PAID"), PaymentStatus::Paid);
        assert_eq!(PaymentStatus::from_provider("paid"), PaymentStatus::Paid);
        assert_eq!(
            PaymentStatus::from_provider("REJECTED"),
            PaymentStatus::Rejected
        );
        assert_eq!(
            PaymentStatus::from_provider("VERIFIED"),
            PaymentStatus::Other("VERIFIED".to_string())
        );
    }

    #[test]
    fn test_terminal_classification() {
        assert!(PaymentStatus::Paid.is_terminal());
        assert!(PaymentStatus::Rejected.is_terminal());
        assert!(PaymentStatus::Cancelled.is_terminal());
        assert!(!PaymentStatus::Pending.is_terminal());
        assert!(!PaymentStatus::Other("AUTHORIZED".into()).is_terminal());
    }

    #[test]
    fn test_status_serde_round_trip() {
        let json = serde_json::to_string(&PaymentStatus::Paid).unwrap();
        assert_eq!(json, "\"PAID\"");

        let parsed: PaymentStatus = serde_json::from_str("\"cancelled\"").unwrap();
        assert_eq!(parsed, PaymentStatus::Cancelled);
    }

    #[test]
    fn test_payment_request_builder() {
        let payer = Payer {
            name: "Ana Gomez".into(),
            email: "ana@example.com".into(),
            document: "20123456".into(),
            address: None,
        };
        let request = PaymentRequest::new(42400.0, Currency::ARS, payer)
            .with_description("2 item(s)")
            .with_metadata("source", "storefront");

        assert_eq!(request.country, "AR");
        assert!(!request.order_ref.is_empty());
        assert_eq!(request.metadata.get("source").map(String::as_str), Some("storefront"));
    }
}
