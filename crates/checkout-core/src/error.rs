//! # Checkout Error Types
//!
//! Typed error handling for the anchor-checkout engine.
//! All checkout operations return `Result<T, CheckoutError>`.

use thiserror::Error;

/// Core error type for all checkout operations
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Configuration errors (missing keys, invalid config)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Cart cannot be priced or submitted (empty, zero subtotal, bad personalization)
    #[error("Invalid cart state: {0}")]
    InvalidCartState(String),

    /// No purchasable variant matches the chosen size
    #[error("No variant matches size {size} for {product}")]
    VariantNotFound { product: String, size: String },

    /// The detached payment window could not be opened
    #[error("Payment window blocked: {0}")]
    PopupBlocked(String),

    /// Network/HTTP error communicating with a provider
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Provider-side API error (gateway or commerce platform)
    #[error("Provider error [{provider}]: {message}")]
    ProviderError { provider: String, message: String },

    /// Webhook signature verification failed
    #[error("Webhook verification failed: {0}")]
    WebhookVerificationFailed(String),

    /// Webhook payload parsing error
    #[error("Webhook parse error: {0}")]
    WebhookParseError(String),

    /// The pending→paid order commit did not go through
    #[error("Order commit failed: {0}")]
    CommitFailed(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Internal error (should not happen)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CheckoutError {
    /// Returns true if this error is transient and worth retrying
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CheckoutError::NetworkError(_) | CheckoutError::ProviderError { .. }
        )
    }

    /// Returns true if this error occurs before any external side effect.
    ///
    /// Pre-flight failures abort the attempt with no payment session and no
    /// pending order created.
    pub fn is_preflight(&self) -> bool {
        matches!(
            self,
            CheckoutError::InvalidCartState(_) | CheckoutError::VariantNotFound { .. }
        )
    }

    /// Returns the HTTP status code appropriate for this error
    pub fn status_code(&self) -> u16 {
        match self {
            CheckoutError::Configuration(_) => 500,
            CheckoutError::InvalidRequest(_) => 400,
            CheckoutError::InvalidCartState(_) => 422,
            CheckoutError::VariantNotFound { .. } => 404,
            CheckoutError::PopupBlocked(_) => 409,
            CheckoutError::NetworkError(_) => 503,
            CheckoutError::ProviderError { .. } => 502,
            CheckoutError::WebhookVerificationFailed(_) => 401,
            CheckoutError::WebhookParseError(_) => 400,
            CheckoutError::CommitFailed(_) => 502,
            CheckoutError::Serialization(_) => 500,
            CheckoutError::Internal(_) => 500,
        }
    }
}

/// Result type alias for checkout operations
pub type CheckoutResult<T> = Result<T, CheckoutError>;
