//! # Shopify Admin Configuration
//!
//! Configuration for the Shopify Admin API binding. The admin token is a
//! secret; everything is loaded from environment variables.

use checkout_core::CheckoutError;
use std::env;

/// Admin API version this binding is written against
pub const DEFAULT_API_VERSION: &str = "2024-10";

/// Shopify Admin API configuration
#[derive(Debug, Clone)]
pub struct ShopifyConfig {
    /// Shop domain (e.g. "example.myshopify.com")
    pub domain: String,

    /// Admin API access token
    pub admin_token: String,

    /// Admin API version segment
    pub api_version: String,

    /// Full API base URL (overridable for testing/mocking)
    pub api_base_url: String,
}

impl ShopifyConfig {
    /// Load configuration from environment variables.
    ///
    /// Required env vars:
    /// - `SHOPIFY_DOMAIN`
    /// - `SHOPIFY_ADMIN_API_TOKEN`
    ///
    /// Optional:
    /// - `SHOPIFY_API_VERSION` (defaults to a pinned version)
    pub fn from_env() -> Result<Self, CheckoutError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let domain = env::var("SHOPIFY_DOMAIN")
            .map_err(|_| CheckoutError::Configuration("SHOPIFY_DOMAIN not set".to_string()))?;

        let admin_token = env::var("SHOPIFY_ADMIN_API_TOKEN").map_err(|_| {
            CheckoutError::Configuration("SHOPIFY_ADMIN_API_TOKEN not set".to_string())
        })?;

        let api_version =
            env::var("SHOPIFY_API_VERSION").unwrap_or_else(|_| DEFAULT_API_VERSION.to_string());

        if domain.is_empty() || admin_token.is_empty() {
            return Err(CheckoutError::Configuration(
                "Shopify domain and admin token must not be empty".to_string(),
            ));
        }

        let api_base_url = format!("https://{}/admin/api/{}", domain, api_version);

        Ok(Self {
            domain,
            admin_token,
            api_version,
            api_base_url,
        })
    }

    /// Create config with explicit values (for testing)
    pub fn new(domain: impl Into<String>, admin_token: impl Into<String>) -> Self {
        let domain: String = domain.into();
        let api_version = DEFAULT_API_VERSION.to_string();
        let api_base_url = format!("https://{}/admin/api/{}", domain, api_version);
        Self {
            domain,
            admin_token: admin_token.into(),
            api_version,
            api_base_url,
        }
    }

    /// Builder: set custom API base URL (for testing)
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }
}
