//! # Application State
//!
//! Shared state for the Axum application: the gateway and commerce clients,
//! the engine settings, and the server configuration.

use checkout_dlocal::{DlocalConfig, DlocalGateway};
use checkout_engine::EngineSettings;
use checkout_shopify::ShopifyCommerce;
use std::sync::Arc;

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Environment (development, staging, production)
    pub environment: String,
}

impl AppConfig {
    /// Load from environment variables
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            environment: std::env::var("ENVIRONMENT")
                .unwrap_or_else(|_| "development".to_string()),
        }
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> std::net::SocketAddr {
        format!("{}:{}", self.host, self.port)
            .parse()
            .expect("Invalid socket address")
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Payment gateway client
    pub gateway: Arc<DlocalGateway>,
    /// Gateway config, kept for webhook signature verification
    pub dlocal_config: DlocalConfig,
    /// Commerce platform client
    pub commerce: Arc<ShopifyCommerce>,
    /// Engine settings (poll caps, URLs, currency)
    pub settings: EngineSettings,
    /// Server config
    pub config: AppConfig,
}

impl AppState {
    /// Create state from the environment and `config/checkout.toml`
    pub fn new() -> anyhow::Result<Self> {
        let config = AppConfig::from_env();
        let settings = load_engine_settings();

        let dlocal_config = DlocalConfig::from_env()
            .map_err(|e| anyhow::anyhow!("Failed to configure dlocal: {}", e))?;
        let gateway = DlocalGateway::new(dlocal_config.clone())
            .map_err(|e| anyhow::anyhow!("Failed to initialize dlocal client: {}", e))?;

        let commerce = ShopifyCommerce::from_env()
            .map_err(|e| anyhow::anyhow!("Failed to initialize Shopify client: {}", e))?;

        Ok(Self {
            gateway: Arc::new(gateway),
            dlocal_config,
            commerce: Arc::new(commerce),
            settings,
            config,
        })
    }
}

/// Load engine settings from config/checkout.toml, falling back to defaults
fn load_engine_settings() -> EngineSettings {
    let config_paths = [
        "config/checkout.toml",
        "../config/checkout.toml",
        "../../config/checkout.toml",
    ];

    for path in config_paths {
        if let Ok(content) = std::fs::read_to_string(path) {
            match EngineSettings::from_toml(&content) {
                Ok(settings) => {
                    tracing::info!("Loaded engine settings from {}", path);
                    return settings;
                }
                Err(e) => {
                    tracing::warn!("Ignoring malformed {}: {}", path, e);
                }
            }
        }
    }

    tracing::warn!("No checkout config found, using defaults");
    EngineSettings::default()
}
