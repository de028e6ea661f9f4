//! Error definitions for the signal bridge.

use libc::c_int;
use thiserror::Error;

use crate::signals::action::DiagnosticAction;
use crate::triggers::TriggerSource;

/// Errors returned by the registration and request API.
///
/// Runtime dispatch failures never appear here: a dropped event is logged
/// and counted, not propagated.
#[derive(Debug, Error)]
pub enum DiagnosticsError {
    /// No callback was supplied to `enable`.
    #[error("no diagnostics callback supplied")]
    InvalidCallback,

    /// Installing an OS handler failed. Handlers installed by the same call
    /// have been removed again.
    #[error("failed to register handler for signal {signal}: {source}")]
    RegistrationFailed {
        signal: c_int,
        #[source]
        source: std::io::Error,
    },

    /// `enable` was called outside a tokio runtime.
    #[error("diagnostics must be enabled from within a tokio runtime")]
    NoReactor,

    /// The options file does not allow `trigger` to request `action`.
    #[error("{trigger} trigger is disabled for {action}")]
    TriggerDisabled {
        action: DiagnosticAction,
        trigger: TriggerSource,
    },

    /// A request was made while no handlers are armed.
    #[error("diagnostics are not enabled")]
    NotEnabled,

    /// Creating the signal wake-up pipe failed.
    #[error("signal pipe error: {0}")]
    Io(#[from] std::io::Error),
}
