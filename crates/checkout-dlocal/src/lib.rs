//! # checkout-dlocal
//!
//! dlocal Go payment-gateway binding for anchor-checkout-rs.
//!
//! The gateway authorizes payments out-of-band on a hosted page; this crate
//! covers the three touch points the reconciliation engine needs:
//!
//! 1. **Session creation** — `POST /v1/payments` returns a payment id and
//!    the redirect URL for the detached payment window.
//! 2. **Status retrieval** — `GET /v1/payments/{id}`, driven by the poll
//!    loop until a terminal status arrives.
//! 3. **Webhook verification** — HMAC-signed notifications for the
//!    out-of-band reconciliation path.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use checkout_dlocal::DlocalGateway;
//! use checkout_core::PaymentGateway;
//!
//! let gateway = DlocalGateway::from_env()?;
//! let session = gateway.create_payment(&request).await?;
//!
//! // Open session.redirect_url in the payment surface, then poll:
//! let status = gateway.payment_status(&session.payment_id).await?;
//! ```

pub mod client;
pub mod config;
pub mod webhook;

// Re-exports
pub use client::{DlocalGateway, DlocalPayment};
pub use config::DlocalConfig;
pub use webhook::{parse_webhook, verify_signature, DlocalWebhookEvent, SIGNATURE_HEADER};
