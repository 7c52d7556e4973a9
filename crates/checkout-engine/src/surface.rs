//! # Payment Surface
//!
//! The gateway hosts its own payment page; the engine opens it in a
//! detached surface and tracks whether that surface is still alive. The
//! surface never decides success or failure — window liveness only feeds
//! the poller's grace window.

use checkout_core::{CheckoutError, CheckoutResult};
use std::process::Command;
use tracing::info;

/// A detached window showing the gateway's hosted payment page.
///
/// Only the reconciliation flow closes the window, and only after a
/// terminal or near-terminal transition — never speculatively.
pub trait PaymentWindow: Send {
    /// Whether the customer has closed the window.
    fn is_closed(&self) -> bool;

    /// Close the window if still open.
    fn close(&mut self);
}

/// Opens the gateway redirect URL in a detached surface.
pub trait PaymentSurface: Send + Sync {
    /// Open the hosted payment page.
    ///
    /// Failure is `PopupBlocked`: terminal for this attempt, but
    /// user-correctable (allow popups and pay again).
    fn open(&self, redirect_url: &str) -> CheckoutResult<Box<dyn PaymentWindow>>;
}

/// Window handle for surfaces that cannot observe liveness.
///
/// `close` only releases our handle; the customer may keep the page open,
/// which is fine — the poll caps bound the attempt either way.
pub struct DetachedWindow {
    released: bool,
}

impl DetachedWindow {
    pub fn new() -> Self {
        Self { released: false }
    }
}

impl Default for DetachedWindow {
    fn default() -> Self {
        Self::new()
    }
}

impl PaymentWindow for DetachedWindow {
    fn is_closed(&self) -> bool {
        self.released
    }

    fn close(&mut self) {
        self.released = true;
    }
}

/// Opens the payment page in the system browser.
///
/// Browser-tab liveness is unobservable from here, so the window never
/// reports closed on its own and the close-grace cap never arms; the hard
/// poll cap still bounds the attempt.
pub struct SystemBrowserSurface;

impl PaymentSurface for SystemBrowserSurface {
    fn open(&self, redirect_url: &str) -> CheckoutResult<Box<dyn PaymentWindow>> {
        let mut command = opener_command(redirect_url);
        command.spawn().map_err(|e| {
            CheckoutError::PopupBlocked(format!(
                "could not open the payment page ({}); open it manually: {}",
                e, redirect_url
            ))
        })?;

        info!("Opened payment page in system browser");
        Ok(Box::new(DetachedWindow::new()))
    }
}

#[cfg(target_os = "macos")]
fn opener_command(url: &str) -> Command {
    let mut command = Command::new("open");
    command.arg(url);
    command
}

#[cfg(target_os = "windows")]
fn opener_command(url: &str) -> Command {
    let mut command = Command::new("cmd");
    command.args(["/C", "start", ""]).arg(url);
    command
}

#[cfg(all(unix, not(target_os = "macos")))]
fn opener_command(url: &str) -> Command {
    let mut command = Command::new("xdg-open");
    command.arg(url);
    command
}
