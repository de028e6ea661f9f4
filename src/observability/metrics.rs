//! Dispatch counters.
//!
//! # Metrics
//! - `diagnostics_actions_dispatched_total` (counter): callback invocations by action
//! - `diagnostics_actions_dropped_total` (counter): discarded requests by action, reason

use crate::signals::action::DiagnosticAction;

/// Why a request did not reach the callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// The trigger source is disabled for this action.
    Filtered,
    /// No callback is stored (before enable or after disable).
    NoCallback,
    /// The callback panicked.
    Panicked,
}

impl DropReason {
    pub const fn as_str(self) -> &'static str {
        match self {
            DropReason::Filtered => "filtered",
            DropReason::NoCallback => "no_callback",
            DropReason::Panicked => "panicked",
        }
    }
}

pub fn record_dispatched(action: DiagnosticAction) {
    metrics::counter!("diagnostics_actions_dispatched_total", "action" => action.as_str()).increment(1);
}

pub fn record_dropped(action: DiagnosticAction, reason: DropReason) {
    metrics::counter!(
        "diagnostics_actions_dropped_total",
        "action" => action.as_str(),
        "reason" => reason.as_str()
    )
    .increment(1);
}
