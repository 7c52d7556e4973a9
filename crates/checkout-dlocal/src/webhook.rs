//! # dlocal Go Webhook Verification
//!
//! The gateway notifies the `notification_url` when a payment changes state.
//! Signatures are `HMAC-SHA256(api_key + raw_body, secret_key)` hex, carried
//! in the `X-Signature` header. Verification happens against the raw body
//! bytes, before any JSON parsing.

use crate::config::DlocalConfig;
use checkout_core::{CheckoutError, CheckoutResult};
use serde::Deserialize;
use tracing::debug;

/// Header carrying the webhook signature
pub const SIGNATURE_HEADER: &str = "X-Signature";

/// Verify a webhook signature against the raw request body.
pub fn verify_signature(
    config: &DlocalConfig,
    payload: &[u8],
    signature: &str,
) -> CheckoutResult<()> {
    let signed = [config.api_key.as_bytes(), payload].concat();
    let expected = compute_hmac_sha256(&config.secret_key, &signed);

    if constant_time_compare(signature, &expected) {
        debug!("Webhook signature verified");
        Ok(())
    } else {
        Err(CheckoutError::WebhookVerificationFailed(
            "signature mismatch".to_string(),
        ))
    }
}

/// A parsed gateway notification
#[derive(Debug, Clone)]
pub struct DlocalWebhookEvent {
    /// Event label, when the gateway sends one
    pub event: Option<String>,
    /// Payment the notification refers to
    pub payment_id: String,
}

/// Parse a webhook body into its payment reference.
///
/// The gateway has sent the id both nested (`data.id`) and flat
/// (`payment_id`) over time; accept either.
pub fn parse_webhook(payload: &[u8]) -> CheckoutResult<DlocalWebhookEvent> {
    let wire: WebhookWire = serde_json::from_slice(payload)
        .map_err(|e| CheckoutError::WebhookParseError(format!("invalid JSON: {}", e)))?;

    let payment_id = wire
        .data
        .and_then(|d| d.id)
        .or(wire.payment_id)
        .ok_or_else(|| {
            CheckoutError::WebhookParseError("missing payment id".to_string())
        })?;

    Ok(DlocalWebhookEvent {
        event: wire.event,
        payment_id,
    })
}

#[derive(Debug, Deserialize)]
struct WebhookWire {
    #[serde(default)]
    event: Option<String>,
    #[serde(default)]
    data: Option<WebhookData>,
    #[serde(default)]
    payment_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WebhookData {
    #[serde(default)]
    id: Option<String>,
}

fn compute_hmac_sha256(secret: &str, message: &[u8]) -> String {
    use hmac::{Hmac, Mac};
    use sha2::Sha256;

    type HmacSha256 = Hmac<Sha256>;

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC can take key of any size");
    mac.update(message);
    let result = mac.finalize();
    hex::encode(result.into_bytes())
}

fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes()
        .zip(b.bytes())
        .fold(0, |acc, (x, y)| acc | (x ^ y))
        == 0
}
