//! # Shopify Order Operations
//!
//! Pending-order creation and the pending→paid commit against the Admin
//! REST API. The pending order carries the gateway payment reference in its
//! operator note and note attributes, which is also how the webhook path
//! finds an order again when only the payment id is known.

use crate::config::ShopifyConfig;
use async_trait::async_trait;
use checkout_core::{
    CheckoutError, CheckoutResult, CommercePlatform, FinancialStatus, OrderDraft, PendingOrder,
};
use chrono::{DateTime, Utc};
use reqwest::{Client, Method};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, error, info, instrument};

/// Gateway label recorded on order transactions and note attributes
const GATEWAY_LABEL: &str = "dlocal_go";

/// Tags applied to an order while payment is outstanding
const PENDING_TAGS: [&str; 2] = ["pending_payment", "awaiting_payment"];

/// How many recent orders the payment-reference lookup scans
const PAYMENT_LOOKUP_LIMIT: u32 = 50;

/// Shopify Admin API commerce platform
pub struct ShopifyCommerce {
    config: ShopifyConfig,
    client: Client,
}

impl ShopifyCommerce {
    /// Create a new Admin API client
    pub fn new(config: ShopifyConfig) -> CheckoutResult<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| CheckoutError::Configuration(format!("HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// Create from environment variables
    pub fn from_env() -> CheckoutResult<Self> {
        let config = ShopifyConfig::from_env()?;
        Self::new(config)
    }

    async fn send(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<Value>,
    ) -> CheckoutResult<Value> {
        let url = format!("{}{}", self.config.api_base_url, endpoint);

        let mut request = self
            .client
            .request(method, &url)
            .header("X-Shopify-Access-Token", &self.config.admin_token);

        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| CheckoutError::NetworkError(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| CheckoutError::NetworkError(e.to_string()))?;

        if !status.is_success() {
            error!("Shopify Admin API error: status={}, body={}", status, text);
            return Err(CheckoutError::ProviderError {
                provider: "shopify".to_string(),
                message: format!("HTTP {}: {}", status, text),
            });
        }

        serde_json::from_str(&text).map_err(|e| {
            CheckoutError::Serialization(format!("Failed to parse Shopify response: {}", e))
        })
    }

    async fn fetch_order(&self, order_id: i64) -> CheckoutResult<OrderWire> {
        let value = self
            .send(Method::GET, &format!("/orders/{}.json", order_id), None)
            .await?;
        parse_order_envelope(value)
    }
}

#[async_trait]
impl CommercePlatform for ShopifyCommerce {
    #[instrument(skip(self, draft), fields(payment_id = %draft.payment_id, lines = draft.line_items.len()))]
    async fn create_pending_order(&self, draft: &OrderDraft) -> CheckoutResult<PendingOrder> {
        let payload = build_order_payload(draft);

        debug!("Creating pending order on Shopify");

        let value = self
            .send(Method::POST, "/orders.json", Some(payload))
            .await?;
        let order = parse_order_envelope(value)?;

        info!(
            "Created pending order {} for payment {}",
            order.name, draft.payment_id
        );

        Ok(order.into())
    }

    #[instrument(skip(self), fields(order_id = order_id, payment_id = %payment_id))]
    async fn mark_order_paid(
        &self,
        order_id: i64,
        payment_id: &str,
    ) -> CheckoutResult<PendingOrder> {
        let current = self.fetch_order(order_id).await?;

        // The commit is idempotent: an order that is already paid is
        // returned unchanged, so a duplicate commit (second tab, webhook
        // racing the poll loop) never issues a second write.
        if current.financial_status.as_deref() == Some("paid") {
            info!("Order {} already paid, skipping update", current.name);
            return Ok(current.into());
        }

        let tags = rewrite_tags_paid(current.tags.as_deref().unwrap_or_default());
        let note = format!(
            "{}\n\nPayment confirmed.\nUpdated at: {}\nPayment ID: {}\nStatus: PAID\n",
            current.note.clone().unwrap_or_default(),
            Utc::now().to_rfc3339(),
            payment_id,
        );

        let payload = json!({
            "order": {
                "id": order_id,
                "financial_status": "paid",
                "tags": tags,
                "note": note,
            }
        });

        let value = self
            .send(Method::PUT, &format!("/orders/{}.json", order_id), Some(payload))
            .await?;
        let order = parse_order_envelope(value)?;

        info!("Order {} committed to paid", order.name);

        Ok(order.into())
    }

    #[instrument(skip(self), fields(payment_id = %payment_id))]
    async fn find_order_by_payment(
        &self,
        payment_id: &str,
    ) -> CheckoutResult<Option<PendingOrder>> {
        let endpoint = format!("/orders.json?status=any&limit={}", PAYMENT_LOOKUP_LIMIT);
        let value = self.send(Method::GET, &endpoint, None).await?;

        let envelope: OrdersEnvelope = serde_json::from_value(value).map_err(|e| {
            CheckoutError::Serialization(format!("Failed to parse orders list: {}", e))
        })?;

        let marker = payment_marker(payment_id);
        let found = envelope
            .orders
            .into_iter()
            .find(|order| {
                order
                    .note
                    .as_deref()
                    .map(|note| note.contains(&marker))
                    .unwrap_or(false)
            })
            .map(PendingOrder::from);

        if found.is_none() {
            debug!("No order carries payment reference {}", payment_id);
        }

        Ok(found)
    }

    fn platform_name(&self) -> &'static str {
        "shopify"
    }
}

/// The line the operator note uses to carry the payment reference.
/// `find_order_by_payment` scans for exactly this marker.
fn payment_marker(payment_id: &str) -> String {
    format!("Payment ID: {}", payment_id)
}

fn build_order_payload(draft: &OrderDraft) -> Value {
    let line_items: Vec<Value> = draft
        .line_items
        .iter()
        .map(|item| {
            let mut line = json!({
                "variant_id": item.variant_id,
                "quantity": item.quantity,
                "title": item.title(),
                "price": format!("{:.2}", item.charged_unit_price),
            });
            if !item.attributes.is_empty() {
                line["properties"] = Value::Array(
                    item.attributes
                        .iter()
                        .map(|attr| json!({ "name": attr.key, "value": attr.value }))
                        .collect(),
                );
            }
            line
        })
        .collect();

    let shipping = &draft.shipping;
    let shipping_address = json!({
        "first_name": shipping.first_name,
        "last_name": shipping.last_name,
        "address1": shipping.address1,
        "address2": shipping.address2.clone().unwrap_or_default(),
        "city": shipping.city,
        "province": shipping.province,
        "zip": shipping.zip,
        "country": shipping.country,
        "phone": shipping.phone.clone().unwrap_or_default(),
    });

    let mut tags: Vec<&str> = vec![GATEWAY_LABEL];
    tags.extend(PENDING_TAGS);
    if draft.bundle_active {
        tags.push("bundle_promo");
    }

    let mut note_attributes = vec![
        json!({ "name": "payment_method", "value": GATEWAY_LABEL }),
        json!({ "name": "payment_id", "value": draft.payment_id }),
        json!({ "name": "payment_status", "value": "PENDING" }),
    ];
    for (name, value) in draft.tracking.note_attributes() {
        note_attributes.push(json!({ "name": name, "value": value }));
    }

    let mut customer = json!({
        "email": draft.email,
        "first_name": shipping.first_name,
        "last_name": shipping.last_name,
    });
    if let Some(phone) = shipping.phone.as_deref().filter(|p| !p.trim().is_empty()) {
        customer["phone"] = json!(phone);
    }

    json!({
        "order": {
            "email": draft.email,
            "line_items": line_items,
            "shipping_address": shipping_address,
            "billing_address": shipping_address,
            "financial_status": "pending",
            "tags": tags.join(","),
            "note": build_operator_note(draft),
            "shipping_lines": [{
                "title": draft.shipping_method.display_name(),
                "price": format!("{:.2}", draft.shipping_cost),
                "code": draft.shipping_method.code(),
            }],
            "transactions": [{
                "kind": "sale",
                "status": "pending",
                "amount": format!("{:.2}", draft.total_amount),
                "gateway": GATEWAY_LABEL,
                "authorization": draft.payment_id,
            }],
            "send_receipt": false,
            "send_fulfillment_receipt": false,
            "customer": customer,
            "note_attributes": note_attributes,
        }
    })
}

fn build_operator_note(draft: &OrderDraft) -> String {
    let mut note = String::new();
    note.push_str("PENDING payment - awaiting customer payment at the gateway.\n");
    note.push_str("DO NOT SHIP until payment is confirmed.\n\n");
    note.push_str(&payment_marker(&draft.payment_id));
    note.push('\n');
    note.push_str("Status: PENDING\n");
    note.push_str(&format!(
        "Amount: {} {:.2}\n",
        draft.currency, draft.total_amount
    ));
    if draft.bundle_active && draft.savings > 0.0 {
        note.push_str(&format!(
            "Promo: bundle active, savings {} {:.2}\n",
            draft.currency, draft.savings
        ));
    }
    note.push_str(&format!(
        "Shipping: {} {:.2} ({})\n",
        draft.currency,
        draft.shipping_cost,
        draft.shipping_method.display_name()
    ));
    note.push_str(
        "\nThis order was created before payment to prevent data loss. \
         It is updated to PAID automatically once the gateway confirms.\n",
    );
    note
}

/// Strip the pending markers and append the paid tag
fn rewrite_tags_paid(tags: &str) -> String {
    let mut kept: Vec<&str> = tags
        .split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty() && !PENDING_TAGS.contains(tag))
        .collect();
    if !kept.contains(&"paid") {
        kept.push("paid");
    }
    kept.join(",")
}

// =============================================================================
// Shopify API Types
// =============================================================================

#[derive(Debug, Deserialize)]
struct OrderEnvelope {
    order: OrderWire,
}

#[derive(Debug, Deserialize)]
struct OrdersEnvelope {
    #[serde(default)]
    orders: Vec<OrderWire>,
}

#[derive(Debug, Deserialize)]
struct OrderWire {
    id: i64,
    name: String,
    order_number: i64,
    #[serde(default)]
    email: Option<String>,
    total_price: String,
    #[serde(default)]
    financial_status: Option<String>,
    created_at: DateTime<Utc>,
    #[serde(default)]
    order_status_url: Option<String>,
    #[serde(default)]
    note: Option<String>,
    #[serde(default)]
    tags: Option<String>,
}

impl From<OrderWire> for PendingOrder {
    fn from(wire: OrderWire) -> Self {
        let financial_status = match wire.financial_status.as_deref() {
            Some("paid") => FinancialStatus::Paid,
            _ => FinancialStatus::Pending,
        };
        Self {
            id: wire.id,
            name: wire.name,
            order_number: wire.order_number,
            email: wire.email.unwrap_or_default(),
            total_price: wire.total_price,
            financial_status,
            created_at: wire.created_at,
            status_url: wire.order_status_url,
        }
    }
}

fn parse_order_envelope(value: Value) -> CheckoutResult<OrderWire> {
    let envelope: OrderEnvelope = serde_json::from_value(value).map_err(|e| {
        CheckoutError::Serialization(format!("Failed to parse Shopify order: {}", e))
    })?;
    Ok(envelope.order)
}
