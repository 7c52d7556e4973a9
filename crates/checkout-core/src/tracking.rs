//! # Tracking Context
//!
//! Attribution and session metadata attached to the pending order as opaque
//! note attributes. The reconciliation flow never reads these back; they
//! exist for campaign reporting on the commerce platform.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Attribution metadata captured by the storefront at checkout time
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingContext {
    pub session_id: Option<String>,
    pub client_id: Option<String>,

    // UTM parameters
    pub utm_source: Option<String>,
    pub utm_medium: Option<String>,
    pub utm_campaign: Option<String>,
    pub utm_content: Option<String>,
    pub utm_term: Option<String>,

    // Ad-click identifiers
    pub fbclid: Option<String>,
    pub fbc: Option<String>,
    pub fbp: Option<String>,
    pub gclid: Option<String>,
    pub campaign_id: Option<String>,
    pub adset_id: Option<String>,
    pub ad_id: Option<String>,

    // Session and device info
    pub referrer: Option<String>,
    pub landing_page: Option<String>,
    pub device_type: Option<String>,
    pub user_agent: Option<String>,
    pub language: Option<String>,
    pub timezone: Option<String>,

    pub captured_at: Option<DateTime<Utc>>,
}

impl TrackingContext {
    /// Flatten present fields to note-attribute pairs, skipping absent ones
    pub fn note_attributes(&self) -> Vec<(String, String)> {
        let mut attributes = Vec::new();
        let mut push = |key: &str, value: &Option<String>| {
            if let Some(value) = value {
                if !value.is_empty() {
                    attributes.push((key.to_string(), value.clone()));
                }
            }
        };

        push("session_id", &self.session_id);
        push("client_id", &self.client_id);
        push("utm_source", &self.utm_source);
        push("utm_medium", &self.utm_medium);
        push("utm_campaign", &self.utm_campaign);
        push("utm_content", &self.utm_content);
        push("utm_term", &self.utm_term);
        push("fbclid", &self.fbclid);
        push("fbc", &self.fbc);
        push("fbp", &self.fbp);
        push("gclid", &self.gclid);
        push("campaign_id", &self.campaign_id);
        push("adset_id", &self.adset_id);
        push("ad_id", &self.ad_id);
        push("referrer", &self.referrer);
        push("landing_page", &self.landing_page);
        push("device_type", &self.device_type);
        push("user_agent", &self.user_agent);
        push("language", &self.language);
        push("timezone", &self.timezone);

        if let Some(captured_at) = self.captured_at {
            attributes.push(("tracking_timestamp".to_string(), captured_at.to_rfc3339()));
        }

        attributes
    }

    /// True when no attribution field is set
    pub fn is_empty(&self) -> bool {
        self.note_attributes().is_empty()
    }
}
