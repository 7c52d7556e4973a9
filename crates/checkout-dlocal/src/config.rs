//! # dlocal Go Configuration
//!
//! Configuration management for the dlocal Go integration.
//! All secrets are loaded from environment variables; the environment flag
//! selects which key pair and API host are used.

use checkout_core::CheckoutError;
use std::env;

const PRODUCTION_API_URL: &str = "https://api.dlocalgo.com";
const SANDBOX_API_URL: &str = "https://api-sbx.dlocalgo.com";

/// dlocal Go API configuration
#[derive(Debug, Clone)]
pub struct DlocalConfig {
    /// API key for the selected environment
    pub api_key: String,

    /// Secret key for the selected environment
    pub secret_key: String,

    /// "production" or "sandbox"
    pub environment: String,

    /// API base URL (overridable for testing/mocking)
    pub api_base_url: String,
}

impl DlocalConfig {
    /// Load configuration from environment variables.
    ///
    /// `DLOCAL_ENVIRONMENT` selects the key pair (defaults to "production"):
    /// - production: `DLOCAL_PRODUCTION_API_KEY`, `DLOCAL_PRODUCTION_SECRET_KEY`
    /// - sandbox: `DLOCAL_SANDBOX_API_KEY`, `DLOCAL_SANDBOX_SECRET_KEY`
    pub fn from_env() -> Result<Self, CheckoutError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let environment =
            env::var("DLOCAL_ENVIRONMENT").unwrap_or_else(|_| "production".to_string());

        let (key_var, secret_var, api_base_url) = match environment.as_str() {
            "production" => (
                "DLOCAL_PRODUCTION_API_KEY",
                "DLOCAL_PRODUCTION_SECRET_KEY",
                PRODUCTION_API_URL,
            ),
            "sandbox" => (
                "DLOCAL_SANDBOX_API_KEY",
                "DLOCAL_SANDBOX_SECRET_KEY",
                SANDBOX_API_URL,
            ),
            other => {
                return Err(CheckoutError::Configuration(format!(
                    "DLOCAL_ENVIRONMENT must be 'production' or 'sandbox', got '{}'",
                    other
                )))
            }
        };

        let api_key = env::var(key_var)
            .map_err(|_| CheckoutError::Configuration(format!("{} not set", key_var)))?;
        let secret_key = env::var(secret_var)
            .map_err(|_| CheckoutError::Configuration(format!("{} not set", secret_var)))?;

        if api_key.is_empty() || secret_key.is_empty() {
            return Err(CheckoutError::Configuration(
                "dlocal credentials must not be empty".to_string(),
            ));
        }

        Ok(Self {
            api_key,
            secret_key,
            environment,
            api_base_url: api_base_url.to_string(),
        })
    }

    /// Create config with explicit values (for testing)
    pub fn new(api_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            secret_key: secret_key.into(),
            environment: "sandbox".to_string(),
            api_base_url: SANDBOX_API_URL.to_string(),
        }
    }

    /// Check if pointed at the sandbox environment
    pub fn is_sandbox(&self) -> bool {
        self.environment == "sandbox"
    }

    /// Authorization header value (`Bearer api_key:secret_key`)
    pub fn auth_header(&self) -> String {
        format!("Bearer {}:{}", self.api_key, self.secret_key)
    }

    /// Builder: set custom API base URL (for testing)
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }
}
