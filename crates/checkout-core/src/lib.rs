//! # checkout-core
//!
//! Core types and traits for the anchor-checkout payment-reconciliation
//! engine.
//!
//! This crate provides:
//! - `CartLine`, `ShippingInfo` and `Personalization` for the frozen cart
//! - `PriceAllocation` for drift-free promotional pricing
//! - `MappedLineItem` for platform variant/attribute mapping
//! - `PaymentSession`, `PaymentStatus` and `PaymentRequest` for the gateway
//! - `PendingOrder` and `OrderDraft` for the commerce platform
//! - `ReconciliationState` for the per-attempt state machine
//! - `PaymentGateway` / `CommercePlatform` traits for provider bindings
//! - `CheckoutError` for typed error handling
//!
//! ## Example
//!
//! ```rust,ignore
//! use checkout_core::{PriceAllocation, PromotionQuote, map_cart_lines};
//!
//! // Allocate the quoted bundle total across the cart
//! let allocation = PriceAllocation::compute(&cart_lines, quote.promotional_total)?;
//!
//! // Resolve variants and attach attributes
//! let mapped = map_cart_lines(&cart_lines, &allocation, &quote)?;
//!
//! // The engine then creates the payment session and the pending order,
//! // polls the gateway, and commits the order exactly once.
//! ```

pub mod cart;
pub mod error;
pub mod mapping;
pub mod order;
pub mod platform;
pub mod pricing;
pub mod session;
pub mod state;
pub mod tracking;

// Re-exports for convenience
pub use cart::{
    CartLine, Currency, Personalization, SelectedOption, ShippingInfo, ShippingMethod,
    VariantOption, MAX_PERSONALIZATION_NAME, MAX_PERSONALIZATION_NUMBER,
};
pub use error::{CheckoutError, CheckoutResult};
pub use mapping::{map_cart_lines, LineAttribute, MappedLineItem};
pub use order::{FinancialStatus, OrderDraft, PendingOrder};
pub use platform::{
    BoxedCommercePlatform, BoxedPaymentGateway, CommercePlatform, PaymentGateway,
};
pub use pricing::{AllocatedPrice, PriceAllocation, PromotionQuote};
pub use session::{Payer, PayerAddress, PaymentRequest, PaymentSession, PaymentStatus};
pub use state::{CheckoutProgress, ReconciliationState};
pub use tracking::TrackingContext;
