//! # Reconciliation State Machine
//!
//! One state-machine value per checkout attempt, advanced only through
//! validated transitions. Modeling the attempt as an explicit value object
//! (rather than scattered flags) is what makes the exactly-once-commit and
//! never-double-failure invariants checkable in unit tests.
//!
//! ```text
//! Idle → CreatingOrder → OpeningPayment → Polling ─┬→ UpdatingOrder ─┬→ Success
//!                                                  │                 └→ PendingConfirmation
//!                                                  ├→ Failed
//!                                                  └→ PendingConfirmation
//! ```
//!
//! `Failed` is reachable from every non-terminal state except
//! `UpdatingOrder`: once the gateway has said PAID, a commit problem must
//! downgrade to `PendingConfirmation`, never claim the payment failed.

use crate::error::{CheckoutError, CheckoutResult};
use crate::order::PendingOrder;
use serde::{Deserialize, Serialize};

/// State of one checkout attempt. Ephemeral; a restart begins at `Idle` and
/// the pending order itself is the durable record of progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ReconciliationState {
    Idle,
    CreatingOrder,
    OpeningPayment,
    Polling,
    UpdatingOrder,
    Success { order_name: String },
    Failed { reason: String },
    PendingConfirmation,
}

impl ReconciliationState {
    /// Terminal states end the attempt
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ReconciliationState::Success { .. }
                | ReconciliationState::Failed { .. }
                | ReconciliationState::PendingConfirmation
        )
    }

    /// Whether `next` is a legal transition from this state
    pub fn can_transition_to(&self, next: &ReconciliationState) -> bool {
        use ReconciliationState::*;
        match (self, next) {
            (Idle, CreatingOrder) => true,
            (CreatingOrder, OpeningPayment) => true,
            (OpeningPayment, Polling) => true,
            (Polling, UpdatingOrder) => true,
            (UpdatingOrder, Success { .. }) => true,
            (UpdatingOrder, PendingConfirmation) => true,
            (Polling, PendingConfirmation) => true,
            // A paid attempt must never be reported as failed
            (UpdatingOrder, Failed { .. }) => false,
            (from, Failed { .. }) if !from.is_terminal() => true,
            _ => false,
        }
    }

    /// Advance to `next`, rejecting illegal transitions
    pub fn transition(self, next: ReconciliationState) -> CheckoutResult<ReconciliationState> {
        if self.can_transition_to(&next) {
            Ok(next)
        } else {
            Err(CheckoutError::Internal(format!(
                "illegal state transition: {} -> {}",
                self.label(),
                next.label()
            )))
        }
    }

    /// Stable snake_case label for logs and UI bindings
    pub fn label(&self) -> &'static str {
        match self {
            ReconciliationState::Idle => "idle",
            ReconciliationState::CreatingOrder => "creating_order",
            ReconciliationState::OpeningPayment => "opening_payment",
            ReconciliationState::Polling => "polling",
            ReconciliationState::UpdatingOrder => "updating_order",
            ReconciliationState::Success { .. } => "success",
            ReconciliationState::Failed { .. } => "failed",
            ReconciliationState::PendingConfirmation => "pending_confirmation",
        }
    }
}

impl Default for ReconciliationState {
    fn default() -> Self {
        ReconciliationState::Idle
    }
}

/// Observable progress of a checkout attempt, published on every transition
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutProgress {
    pub state: ReconciliationState,
    pub message: String,
    /// Set once the pending order exists
    pub order: Option<PendingOrder>,
}

impl CheckoutProgress {
    /// Initial value before the attempt starts
    pub fn idle() -> Self {
        Self {
            state: ReconciliationState::Idle,
            message: String::new(),
            order: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path_transitions() {
        let state = ReconciliationState::Idle
            .transition(ReconciliationState::CreatingOrder)
            .and_then(|s| s.transition(ReconciliationState::OpeningPayment))
            .and_then(|s| s.transition(ReconciliationState::Polling))
            .and_then(|s| s.transition(ReconciliationState::UpdatingOrder))
            .and_then(|s| {
                s.transition(ReconciliationState::Success {
                    order_name: "#1001".into(),
                })
            })
            .unwrap();

        assert!(state.is_terminal());
        assert_eq!(state.label(), "success");
    }

    #[test]
    fn test_commit_failure_downgrades_not_fails() {
        // UpdatingOrder may go to PendingConfirmation...
        assert!(ReconciliationState::UpdatingOrder
            .can_transition_to(&ReconciliationState::PendingConfirmation));

        // ...but never to Failed: the gateway already confirmed the payment.
        assert!(!ReconciliationState::UpdatingOrder.can_transition_to(
            &ReconciliationState::Failed {
                reason: "commit failed".into()
            }
        ));
    }

    #[test]
    fn test_failure_reachable_before_commit() {
        for from in [
            ReconciliationState::Idle,
            ReconciliationState::CreatingOrder,
            ReconciliationState::OpeningPayment,
            ReconciliationState::Polling,
        ] {
            assert!(
                from.can_transition_to(&ReconciliationState::Failed {
                    reason: "x".into()
                }),
                "failure should be reachable from {}",
                from.label()
            );
        }
    }

    #[test]
    fn test_terminal_states_are_final() {
        let terminals = [
            ReconciliationState::Success {
                order_name: "#1".into(),
            },
            ReconciliationState::Failed { reason: "x".into() },
            ReconciliationState::PendingConfirmation,
        ];
        for terminal in terminals {
            assert!(terminal.is_terminal());
            assert!(!terminal.can_transition_to(&ReconciliationState::Polling));
            assert!(!terminal.can_transition_to(&ReconciliationState::Failed {
                reason: "again".into()
            }));
        }
    }

    #[test]
    fn test_no_skipping_ahead() {
        assert!(!ReconciliationState::Idle.can_transition_to(&ReconciliationState::Polling));
        assert!(
            !ReconciliationState::CreatingOrder
                .can_transition_to(&ReconciliationState::UpdatingOrder)
        );
        assert!(!ReconciliationState::Polling.can_transition_to(&ReconciliationState::Success {
            order_name: "#1".into()
        }));
    }
}
