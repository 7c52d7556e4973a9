//! # Anchor-Checkout RS
//!
//! Payment-reconciliation service for storefront checkouts.
//!
//! ## Usage
//!
//! ```bash
//! # Set environment variables
//! export DLOCAL_ENVIRONMENT=sandbox
//! export DLOCAL_SANDBOX_API_KEY=...
//! export DLOCAL_SANDBOX_SECRET_KEY=...
//! export SHOPIFY_DOMAIN=example.myshopify.com
//! export SHOPIFY_ADMIN_API_TOKEN=...
//!
//! # Run the server
//! anchor-checkout
//! ```

use checkout_api::{routes, state::AppState};
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    // Print banner
    print_banner();

    // Initialize application state
    let state = AppState::new()?;

    let addr = state.config.socket_addr();
    let is_prod = state.config.is_production();

    info!("Environment: {}", state.config.environment);
    info!(
        "Poll cadence: every {}s, cap {} attempts",
        state.settings.poll.interval_secs, state.settings.poll.max_attempts
    );

    // Create router
    let app = routes::create_router(state);

    // Start server
    info!("⚓ Anchor-Checkout starting on http://{}", addr);

    if !is_prod {
        info!("📝 Health: http://{}/health", addr);
        info!("💳 Payments: POST http://{}/api/v1/payments", addr);
        info!("🔔 Webhook: POST http://{}/webhook/dlocal", addr);
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn print_banner() {
    println!(
        r#"
  ⚓ Anchor-Checkout RS ⚓
  ━━━━━━━━━━━━━━━━━━━━━━━
  Durable checkout reconciliation
  Version: {}

"#,
        env!("CARGO_PKG_VERSION")
    );
}
