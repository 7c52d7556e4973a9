//! # dlocal Go Payment Client
//!
//! Implementation of the dlocal Go payments API: session creation against
//! `/v1/payments` and status retrieval for the poll loop. The gateway hosts
//! the actual payment page; we only hold the session id and redirect URL.

use crate::config::DlocalConfig;
use async_trait::async_trait;
use checkout_core::{
    CheckoutError, CheckoutResult, PaymentGateway, PaymentRequest, PaymentSession, PaymentStatus,
};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, error, info, instrument};

/// dlocal Go payment gateway
pub struct DlocalGateway {
    config: DlocalConfig,
    client: Client,
}

impl DlocalGateway {
    /// Create a new gateway client
    pub fn new(config: DlocalConfig) -> CheckoutResult<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| CheckoutError::Configuration(format!("HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// Create from environment variables
    pub fn from_env() -> CheckoutResult<Self> {
        let config = DlocalConfig::from_env()?;
        Self::new(config)
    }

    /// Retrieve the full payment record (status plus payer/amount details).
    ///
    /// The `PaymentGateway` trait only needs the status; the webhook handler
    /// uses the richer record for its manual-action report.
    #[instrument(skip(self), fields(payment_id = %payment_id))]
    pub async fn retrieve_payment(&self, payment_id: &str) -> CheckoutResult<DlocalPayment> {
        let url = format!("{}/v1/payments/{}", self.config.api_base_url, payment_id);

        let response = self
            .client
            .get(&url)
            .header("Authorization", self.config.auth_header())
            .send()
            .await
            .map_err(|e| CheckoutError::NetworkError(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| CheckoutError::NetworkError(e.to_string()))?;

        if !status.is_success() {
            error!("dlocal retrieve error: status={}, body={}", status, body);
            return Err(provider_error(status, &body));
        }

        let wire: DlocalPaymentWire = serde_json::from_str(&body).map_err(|e| {
            CheckoutError::Serialization(format!("Failed to parse dlocal payment: {}", e))
        })?;

        debug!("Retrieved payment {} status={}", wire.id, wire.status);
        Ok(wire.into())
    }
}

#[async_trait]
impl PaymentGateway for DlocalGateway {
    #[instrument(skip(self, request), fields(order_ref = %request.order_ref))]
    async fn create_payment(&self, request: &PaymentRequest) -> CheckoutResult<PaymentSession> {
        let payload = DlocalPaymentPayload::from_request(request);

        debug!(
            "Creating dlocal payment: amount={} {} country={}",
            payload.amount, payload.currency, payload.country
        );

        let url = format!("{}/v1/payments", self.config.api_base_url);

        let response = self
            .client
            .post(&url)
            .header("Authorization", self.config.auth_header())
            .json(&payload)
            .send()
            .await
            .map_err(|e| CheckoutError::NetworkError(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| CheckoutError::NetworkError(e.to_string()))?;

        if !status.is_success() {
            error!("dlocal API error: status={}, body={}", status, body);
            return Err(provider_error(status, &body));
        }

        let created: DlocalPaymentCreated = serde_json::from_str(&body).map_err(|e| {
            CheckoutError::Serialization(format!("Failed to parse dlocal response: {}", e))
        })?;

        info!(
            "Created dlocal payment: id={}, redirect_url={}",
            created.id, created.redirect_url
        );

        Ok(PaymentSession::new(created.id, created.redirect_url))
    }

    async fn payment_status(&self, payment_id: &str) -> CheckoutResult<PaymentStatus> {
        Ok(self.retrieve_payment(payment_id).await?.status)
    }

    fn gateway_name(&self) -> &'static str {
        "dlocal_go"
    }
}

fn provider_error(status: reqwest::StatusCode, body: &str) -> CheckoutError {
    // dlocal errors come as {"code": ..., "message": "..."}
    if let Ok(parsed) = serde_json::from_str::<DlocalErrorResponse>(body) {
        if let Some(message) = parsed.message {
            return CheckoutError::ProviderError {
                provider: "dlocal_go".to_string(),
                message,
            };
        }
    }

    CheckoutError::ProviderError {
        provider: "dlocal_go".to_string(),
        message: format!("HTTP {}: {}", status, body),
    }
}

// =============================================================================
// dlocal API Types
// =============================================================================

#[derive(Debug, Serialize)]
struct DlocalPaymentPayload {
    amount: f64,
    currency: String,
    country: String,
    order_id: String,
    description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    notification_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    success_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    back_url: Option<String>,
    payer: DlocalPayerPayload,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    metadata: HashMap<String, String>,
}

#[derive(Debug, Serialize)]
struct DlocalPayerPayload {
    name: String,
    email: String,
    document: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    address: Option<DlocalAddressPayload>,
}

#[derive(Debug, Serialize)]
struct DlocalAddressPayload {
    state: String,
    city: String,
    zip_code: String,
    full_address: String,
}

impl DlocalPaymentPayload {
    fn from_request(request: &PaymentRequest) -> Self {
        Self {
            // Two-decimal wire amount; the gateway rejects sub-cent noise
            amount: (request.amount * 100.0).round() / 100.0,
            currency: request.currency.as_str().to_string(),
            country: request.country.clone(),
            order_id: request.order_ref.clone(),
            description: request.description.clone(),
            notification_url: request.notification_url.clone(),
            success_url: request.success_url.clone(),
            back_url: request.back_url.clone(),
            payer: DlocalPayerPayload {
                name: request.payer.name.clone(),
                email: request.payer.email.clone(),
                document: request.payer.document.clone(),
                address: request.payer.address.as_ref().map(|a| DlocalAddressPayload {
                    state: a.state.clone(),
                    city: a.city.clone(),
                    zip_code: a.zip_code.clone(),
                    full_address: a.full_address.clone(),
                }),
            },
            metadata: request.metadata.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct DlocalPaymentCreated {
    id: String,
    redirect_url: String,
}

#[derive(Debug, Deserialize)]
struct DlocalErrorResponse {
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DlocalPaymentWire {
    id: String,
    status: String,
    #[serde(default)]
    status_detail: Option<String>,
    #[serde(default)]
    amount: Option<f64>,
    #[serde(default)]
    currency: Option<String>,
    #[serde(default)]
    payment_method_type: Option<String>,
    #[serde(default)]
    payer: Option<DlocalPayerWire>,
}

#[derive(Debug, Deserialize)]
struct DlocalPayerWire {
    #[serde(default)]
    email: Option<String>,
}

/// A payment record as the gateway reports it
#[derive(Debug, Clone)]
pub struct DlocalPayment {
    pub id: String,
    pub status: PaymentStatus,
    pub status_detail: Option<String>,
    pub amount: Option<f64>,
    pub currency: Option<String>,
    pub payment_method_type: Option<String>,
    pub payer_email: Option<String>,
}

impl From<DlocalPaymentWire> for DlocalPayment {
    fn from(wire: DlocalPaymentWire) -> Self {
        Self {
            id: wire.id,
            status: PaymentStatus::from_provider(&wire.status),
            status_detail: wire.status_detail,
            amount: wire.amount,
            currency: wire.currency,
            payment_method_type: wire.payment_method_type,
            payer_email: wire.payer.and_then(|p| p.email),
        }
    }
}
