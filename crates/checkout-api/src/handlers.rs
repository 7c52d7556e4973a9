//! # Request Handlers
//!
//! Axum handlers for browser-hosted checkouts that drive their own poll
//! loop: payment-session creation, status retrieval, pending-order writes,
//! the pending→paid commit, and the gateway webhook for out-of-band
//! reconciliation.

use crate::state::AppState;
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use checkout_core::{
    map_cart_lines, CartLine, CheckoutError, CheckoutResult, CommercePlatform, OrderDraft,
    PaymentGateway, PaymentStatus, PendingOrder, PriceAllocation, PromotionQuote, ShippingInfo,
    TrackingContext,
};
use checkout_dlocal::{parse_webhook, verify_signature, SIGNATURE_HEADER};
use checkout_engine::build_payment_request;
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};

// =============================================================================
// Request/Response Types
// =============================================================================

/// The checkout payload the storefront submits: the frozen cart, the
/// shipping/contact details, and the promotion quote.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutData {
    pub cart: Vec<CartLine>,
    pub shipping: ShippingInfo,
    pub quote: PromotionQuote,
    #[serde(default)]
    pub tracking: TrackingContext,
}

/// Create payment-session request
#[derive(Debug, Deserialize)]
pub struct CreatePaymentRequest {
    pub checkout: CheckoutData,
}

/// Create payment-session response
#[derive(Debug, Serialize)]
pub struct CreatePaymentResponse {
    pub payment_id: String,
    pub redirect_url: String,
}

/// Pending-order creation request
#[derive(Debug, Deserialize)]
pub struct CreatePendingOrderRequest {
    pub checkout: CheckoutData,
    pub payment_id: String,
}

/// Pending-order response
#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub order: PendingOrder,
}

/// Commit request: the payment the order should be reconciled against
#[derive(Debug, Deserialize)]
pub struct MarkPaidRequest {
    pub payment_id: String,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: u16) -> Self {
        Self {
            error: error.into(),
            code,
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

fn checkout_error_to_response(err: CheckoutError) -> (StatusCode, Json<ErrorResponse>) {
    let code = err.status_code();
    let response = ErrorResponse::new(err.to_string(), code);
    (
        StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        Json(response),
    )
}

// =============================================================================
// Handlers
// =============================================================================

/// Health check endpoint
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "anchor-checkout",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Create a payment session at the gateway
#[instrument(skip(state, request), fields(items = request.checkout.cart.len()))]
pub async fn create_payment(
    State(state): State<AppState>,
    Json(request): Json<CreatePaymentRequest>,
) -> Result<Json<CreatePaymentResponse>, (StatusCode, Json<ErrorResponse>)> {
    let checkout = request.checkout;
    validate_checkout(&checkout).map_err(checkout_error_to_response)?;

    let payment_request = build_payment_request(
        &state.settings,
        &checkout.shipping,
        checkout.cart.len(),
        &checkout.quote,
        &checkout.tracking,
    );

    info!(
        "Creating payment session: {} item(s), total {:.2}",
        checkout.cart.len(),
        checkout.quote.grand_total()
    );

    let session = state
        .gateway
        .create_payment(&payment_request)
        .await
        .map_err(|e| {
            error!("Failed to create payment session: {}", e);
            checkout_error_to_response(e)
        })?;

    Ok(Json(CreatePaymentResponse {
        payment_id: session.payment_id,
        redirect_url: session.redirect_url,
    }))
}

/// Poll proxy: current status of a payment
#[instrument(skip(state))]
pub async fn get_payment_status(
    State(state): State<AppState>,
    Path(payment_id): Path<String>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<ErrorResponse>)> {
    let payment = state
        .gateway
        .retrieve_payment(&payment_id)
        .await
        .map_err(checkout_error_to_response)?;

    Ok(Json(serde_json::json!({
        "id": payment.id,
        "status": payment.status,
        "status_detail": payment.status_detail,
        "amount": payment.amount,
        "currency": payment.currency,
        "payment_method_type": payment.payment_method_type,
    })))
}

/// Create the durable pending order for a payment session
#[instrument(skip(state, request), fields(payment_id = %request.payment_id))]
pub async fn create_pending_order(
    State(state): State<AppState>,
    Json(request): Json<CreatePendingOrderRequest>,
) -> Result<Json<OrderResponse>, (StatusCode, Json<ErrorResponse>)> {
    if request.payment_id.is_empty() {
        return Err(checkout_error_to_response(CheckoutError::InvalidRequest(
            "payment_id is required".to_string(),
        )));
    }
    validate_checkout(&request.checkout).map_err(checkout_error_to_response)?;

    let draft = build_order_draft(&state, request.checkout, request.payment_id)
        .map_err(checkout_error_to_response)?;

    let order = state
        .commerce
        .create_pending_order(&draft)
        .await
        .map_err(|e| {
            error!("Failed to create pending order: {}", e);
            checkout_error_to_response(e)
        })?;

    Ok(Json(OrderResponse { order }))
}

/// Commit a pending order once its payment is confirmed.
///
/// The gateway is re-checked here: a commit request for a payment that is
/// not PAID is refused, so a misbehaving client cannot flip an unpaid order.
#[instrument(skip(state, request), fields(order_id = order_id, payment_id = %request.payment_id))]
pub async fn mark_order_paid(
    State(state): State<AppState>,
    Path(order_id): Path<i64>,
    Json(request): Json<MarkPaidRequest>,
) -> Result<Json<OrderResponse>, (StatusCode, Json<ErrorResponse>)> {
    let status = state
        .gateway
        .payment_status(&request.payment_id)
        .await
        .map_err(checkout_error_to_response)?;

    if status != PaymentStatus::Paid {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(
                ErrorResponse::new("Payment not yet confirmed", 400)
                    .with_details(status.as_str().to_string()),
            ),
        ));
    }

    let order = state
        .commerce
        .mark_order_paid(order_id, &request.payment_id)
        .await
        .map_err(|e| {
            error!("Order commit failed: {}", e);
            checkout_error_to_response(e)
        })?;

    info!("Order {} committed to paid", order.name);

    Ok(Json(OrderResponse { order }))
}

/// Handle a gateway notification: the out-of-band reconciliation path.
///
/// When the poll loop never saw the terminal status (closed tab, hard
/// timeout), this is what moves the pending order to paid.
#[instrument(skip(state, headers, body))]
pub async fn dlocal_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<ErrorResponse>)> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::new("Missing X-Signature header", 400)),
            )
        })?;

    verify_signature(&state.dlocal_config, &body, signature).map_err(|e| {
        error!("Webhook verification failed: {}", e);
        checkout_error_to_response(e)
    })?;

    let event = parse_webhook(&body).map_err(checkout_error_to_response)?;

    info!(
        "Webhook received: event={:?}, payment={}",
        event.event, event.payment_id
    );

    // Re-fetch from the gateway rather than trusting the notification body
    let payment = state
        .gateway
        .retrieve_payment(&event.payment_id)
        .await
        .map_err(checkout_error_to_response)?;

    if payment.status != PaymentStatus::Paid {
        info!("Payment {} is {}, no action", payment.id, payment.status);
        return Ok(Json(serde_json::json!({
            "success": true,
            "message": "Webhook received",
            "payment_id": payment.id,
            "status": payment.status,
        })));
    }

    match state.commerce.find_order_by_payment(&payment.id).await {
        Ok(Some(order)) => {
            let updated = state
                .commerce
                .mark_order_paid(order.id, &payment.id)
                .await
                .map_err(|e| {
                    error!("Webhook commit failed: {}", e);
                    checkout_error_to_response(e)
                })?;

            info!("Webhook committed order {} to paid", updated.name);

            Ok(Json(serde_json::json!({
                "success": true,
                "message": "Order updated from pending to paid",
                "payment_id": payment.id,
                "order_id": updated.id,
                "order_name": updated.name,
                "financial_status": updated.financial_status,
            })))
        }
        Ok(None) => {
            // Paid at the gateway, but no order carries the reference:
            // someone has to look at this by hand.
            warn!(
                "Payment {} is PAID but no order carries the reference",
                payment.id
            );
            Ok(Json(serde_json::json!({
                "success": false,
                "warning": "Payment confirmed but no order carries this reference",
                "action_required": "manual review",
                "payment_id": payment.id,
                "customer_email": payment.payer_email,
                "amount": payment.amount,
                "currency": payment.currency,
            })))
        }
        Err(e) => {
            error!("Order lookup failed during webhook: {}", e);
            Err(checkout_error_to_response(e))
        }
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Contact/address checks before any provider call
fn validate_checkout(checkout: &CheckoutData) -> CheckoutResult<()> {
    if checkout.cart.is_empty() {
        return Err(CheckoutError::InvalidCartState("cart is empty".to_string()));
    }
    if checkout.shipping.email.trim().is_empty() {
        return Err(CheckoutError::InvalidRequest("email is required".to_string()));
    }
    if checkout.shipping.document.trim().is_empty() {
        return Err(CheckoutError::InvalidRequest(
            "identity document is required".to_string(),
        ));
    }
    if checkout.shipping.first_name.trim().is_empty()
        || checkout.shipping.last_name.trim().is_empty()
    {
        return Err(CheckoutError::InvalidRequest(
            "shipping name is required".to_string(),
        ));
    }
    if checkout.shipping.address1.trim().is_empty() || checkout.shipping.city.trim().is_empty() {
        return Err(CheckoutError::InvalidRequest(
            "shipping address is required".to_string(),
        ));
    }
    Ok(())
}

/// Allocate, map and assemble the order draft for a checkout payload
fn build_order_draft(
    state: &AppState,
    checkout: CheckoutData,
    payment_id: String,
) -> CheckoutResult<OrderDraft> {
    let allocation = PriceAllocation::compute(&checkout.cart, checkout.quote.promotional_total)?;
    let line_items = map_cart_lines(&checkout.cart, &allocation, &checkout.quote)?;

    Ok(OrderDraft {
        email: checkout.shipping.email.clone(),
        line_items,
        shipping: checkout.shipping,
        payment_id,
        total_amount: checkout.quote.grand_total(),
        currency: state.settings.currency,
        shipping_cost: checkout.quote.shipping_cost,
        shipping_method: checkout.quote.shipping_method,
        bundle_active: checkout.quote.bundle_active,
        savings: checkout.quote.savings,
        tracking: checkout.tracking,
    })
}
