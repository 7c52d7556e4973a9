//! # checkout-engine
//!
//! The payment-reconciliation flow for anchor-checkout-rs: given a frozen
//! cart, a promotion quote and shipping details, it creates a payment
//! session, anchors a pending order on the commerce platform, opens the
//! hosted payment page in a detached surface, polls the gateway for a
//! terminal outcome under bounded time, and commits the order to paid
//! exactly once.
//!
//! ## Flow
//!
//! ```text
//! allocate prices → map lines → create payment session → create pending order
//!        → open payment surface → poll gateway ─┬→ commit (PAID)
//!                                               ├→ failed (REJECTED/CANCELLED)
//!                                               └→ pending confirmation (timeouts)
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use checkout_engine::{CheckoutFlow, EngineSettings, SystemBrowserSurface};
//! use std::sync::Arc;
//!
//! let flow = CheckoutFlow::new(gateway, commerce, Arc::new(SystemBrowserSurface), EngineSettings::default());
//! let mut progress = flow.subscribe();
//!
//! let outcome = flow.pay_with_gateway(shipping, cart, quote, tracking).await;
//! if let Some(url) = outcome.navigate_to {
//!     // show the success view
//! }
//! ```
//!
//! Cancellation is dropping the `pay_with_gateway` future: the poll loop
//! stops immediately and no commit can follow.

pub mod analytics;
pub mod flow;
pub mod poller;
pub mod settings;
pub mod surface;

// Re-exports
pub use analytics::{AnalyticsSink, LoggingAnalyticsSink, PurchaseEvent};
pub use flow::{
    build_payment_request, CartStore, CheckoutFlow, CheckoutOutcome, NoopCartStore, MSG_FAILED,
    MSG_PENDING_CONFIRMATION, MSG_PENDING_PAID, MSG_SUCCESS, MSG_WINDOW_CLOSED,
};
pub use poller::{poll_payment, PollEvent, PollOutcome};
pub use settings::{CheckoutUrls, EngineSettings, PollSettings};
pub use surface::{DetachedWindow, PaymentSurface, PaymentWindow, SystemBrowserSurface};
