//! # checkout-api
//!
//! HTTP API layer for anchor-checkout-rs.
//!
//! This crate provides:
//! - Axum-based HTTP server
//! - REST endpoints driving the checkout payment flow
//! - The gateway webhook handler for out-of-band reconciliation
//!
//! ## Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/health` | Health check |
//! | POST | `/api/v1/payments` | Create a gateway payment session |
//! | GET | `/api/v1/payments/{id}` | Payment status (poll proxy) |
//! | POST | `/api/v1/orders/pending` | Create the durable pending order |
//! | POST | `/api/v1/orders/{id}/mark-paid` | Commit pending → paid |
//! | POST | `/webhook/dlocal` | Gateway notification |

pub mod handlers;
pub mod routes;
pub mod state;

pub use routes::create_router;
pub use state::{AppConfig, AppState};
