//! # Routes
//!
//! Axum router configuration for the checkout API.

use crate::handlers;
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Create the main application router
///
/// Routes:
/// - Checkout:
///   - POST /api/v1/payments - Create a gateway payment session
///   - GET  /api/v1/payments/{payment_id} - Payment status (poll proxy)
///   - POST /api/v1/orders/pending - Create the durable pending order
///   - POST /api/v1/orders/{order_id}/mark-paid - Commit pending → paid
///
/// - Webhooks:
///   - POST /webhook/dlocal - Gateway notification handler
pub fn create_router(state: AppState) -> Router {
    // CORS configuration - the storefront runs on its own origin
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/payments", post(handlers::create_payment))
        .route("/payments/{payment_id}", get(handlers::get_payment_status))
        .route("/orders/pending", post(handlers::create_pending_order))
        .route(
            "/orders/{order_id}/mark-paid",
            post(handlers::mark_order_paid),
        );

    // Webhook routes (no CORS requirements, must accept raw body)
    let webhook_routes = Router::new().route("/dlocal", post(handlers::dlocal_webhook));

    Router::new()
        // Health check at root
        .route("/health", get(handlers::health))
        .route("/", get(handlers::health))
        // API v1
        .nest("/api/v1", api_routes)
        // Webhooks
        .nest("/webhook", webhook_routes)
        // Middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        // State
        .with_state(state)
}
