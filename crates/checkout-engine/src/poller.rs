//! # Status Poller
//!
//! Waits for a terminal payment outcome under bounded time: a fixed tick
//! interval, a hard attempt cap, and a shorter grace cap once the payment
//! window is detected closed. Transient gateway errors are swallowed — a
//! failed status check is not evidence about the payment, only about the
//! network — and the next tick retries.
//!
//! The loop returns before any commit happens, and dropping the future
//! cancels it; together these give the at-most-one-commit guarantee.

use crate::settings::PollSettings;
use crate::surface::PaymentWindow;
use checkout_core::{PaymentGateway, PaymentStatus};
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

/// Why the poll loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// Gateway confirmed the payment; advance to commit
    Paid,
    /// Gateway rejected the payment
    Rejected,
    /// Customer cancelled at the gateway
    Cancelled,
    /// Hard attempt cap reached without a terminal status
    HardTimeout,
    /// Window closed and the grace window elapsed without a terminal status
    CloseGraceTimeout,
}

impl PollOutcome {
    /// Timeouts classify as pending confirmation, not failure: the order
    /// exists and will be reconciled out-of-band.
    pub fn is_timeout(&self) -> bool {
        matches!(self, PollOutcome::HardTimeout | PollOutcome::CloseGraceTimeout)
    }
}

/// Mid-poll notifications surfaced to the progress channel
#[derive(Debug, Clone, Copy)]
pub enum PollEvent {
    /// The payment window was first detected closed
    WindowClosed { attempt: u32 },
}

/// Poll the gateway until a terminal status or a cap is hit.
pub async fn poll_payment(
    gateway: &dyn PaymentGateway,
    payment_id: &str,
    window: &mut dyn PaymentWindow,
    settings: &PollSettings,
    mut on_event: impl FnMut(PollEvent),
) -> PollOutcome {
    let mut ticker = tokio::time::interval(settings.interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick resolves immediately; consume it so polling starts one
    // interval after the window opens, giving the customer time to land on
    // the hosted page.
    ticker.tick().await;

    let mut attempts: u32 = 0;
    let mut window_closed_at: Option<u32> = None;

    loop {
        ticker.tick().await;
        attempts += 1;
        debug!("Poll attempt {}/{}", attempts, settings.max_attempts);

        if window.is_closed() && window_closed_at.is_none() {
            window_closed_at = Some(attempts);
            warn!("Payment window closed at attempt {}", attempts);
            on_event(PollEvent::WindowClosed { attempt: attempts });
        }

        // Closing the window is not evidence of failure, only of reduced
        // confidence: keep checking for a short grace window.
        if let Some(closed_at) = window_closed_at {
            if attempts - closed_at >= settings.close_grace_attempts {
                return PollOutcome::CloseGraceTimeout;
            }
        }

        match gateway.payment_status(payment_id).await {
            Ok(PaymentStatus::Paid) => return PollOutcome::Paid,
            Ok(PaymentStatus::Rejected) => return PollOutcome::Rejected,
            Ok(PaymentStatus::Cancelled) => return PollOutcome::Cancelled,
            Ok(status) => debug!("Payment still {}", status),
            Err(error) => debug!("Status check failed, retrying next tick: {}", error),
        }

        if attempts >= settings.max_attempts {
            return PollOutcome::HardTimeout;
        }
    }
}
