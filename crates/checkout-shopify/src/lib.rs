//! # checkout-shopify
//!
//! Shopify Admin API binding for anchor-checkout-rs.
//!
//! This crate writes the durable pending order — the anchor that makes a
//! checkout attempt recoverable even if the client disappears mid-payment —
//! and commits it to paid exactly once when the gateway confirms:
//!
//! 1. **Pending order creation** — `POST /orders.json` with the payment
//!    reference embedded in the transaction authorization, operator note
//!    and note attributes.
//! 2. **Commit** — `PUT /orders/{id}.json` flipping `pending` → `paid`,
//!    idempotent against already-paid orders.
//! 3. **Payment-reference lookup** — scans recent orders for the payment
//!    marker, used by the webhook reconciliation path.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use checkout_shopify::ShopifyCommerce;
//! use checkout_core::CommercePlatform;
//!
//! let commerce = ShopifyCommerce::from_env()?;
//! let order = commerce.create_pending_order(&draft).await?;
//!
//! // ...after the gateway reports PAID:
//! let paid = commerce.mark_order_paid(order.id, &draft.payment_id).await?;
//! ```

pub mod config;
pub mod orders;

// Re-exports
pub use config::ShopifyConfig;
pub use orders::ShopifyCommerce;
