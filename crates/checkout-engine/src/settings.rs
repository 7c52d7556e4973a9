//! # Engine Settings
//!
//! Poll cadence, caps and redirect URLs for the reconciliation flow.
//! Loaded from `config/checkout.toml` when present; every field has a
//! default so a missing file means stock behavior, not a startup failure.

use checkout_core::Currency;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Poll cadence and caps for the status poller
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollSettings {
    /// Seconds between gateway status checks
    pub interval_secs: u64,

    /// Hard cap on poll attempts; reaching it classifies the attempt as
    /// pending confirmation, not failure
    pub max_attempts: u32,

    /// Further attempts allowed once the payment window is detected closed
    pub close_grace_attempts: u32,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval_secs: 3,
            max_attempts: 100,
            close_grace_attempts: 10,
        }
    }
}

impl PollSettings {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

/// URLs used around the hosted payment page
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckoutUrls {
    /// Base URL of the storefront (e.g. "https://shop.example.com")
    pub base_url: String,
    /// Success page path
    pub success_path: String,
    /// Where the hosted page sends a customer who backs out
    pub back_path: String,
    /// Gateway webhook path
    pub webhook_path: String,
}

impl Default for CheckoutUrls {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            success_path: "/checkout/success".to_string(),
            back_path: "/cart".to_string(),
            webhook_path: "/webhook/dlocal".to_string(),
        }
    }
}

impl CheckoutUrls {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn success_url(&self) -> String {
        format!("{}{}", self.base_url, self.success_path)
    }

    pub fn back_url(&self) -> String {
        format!("{}{}", self.base_url, self.back_path)
    }

    pub fn notification_url(&self) -> String {
        format!("{}{}", self.base_url, self.webhook_path)
    }

    /// Success view for a confirmed order. Order names carry a leading `#`
    /// which would read as a fragment in a URL, so it is stripped.
    pub fn success_url_for_order(&self, order_name: &str) -> String {
        format!(
            "{}?order={}",
            self.success_url(),
            order_name.trim_start_matches('#')
        )
    }
}

/// Full engine configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    pub poll: PollSettings,
    pub urls: CheckoutUrls,
    pub currency: Currency,
}

impl EngineSettings {
    /// Parse settings from a TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }
}
