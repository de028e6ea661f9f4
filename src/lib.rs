//! Signal-triggered process diagnostics.
//!
//! Operators request a report, heap snapshot or core dump from a live process
//! with `kill -RTMIN+0`, `-RTMIN+1` or `-RTMIN+2`. The request reaches the
//! host's callback on the tokio runtime, never inside the signal handler.
//!
//! ```no_run
//! # async fn run() -> Result<(), cloud_diagnostics::DiagnosticsError> {
//! cloud_diagnostics::enable_diagnostics(|action| {
//!     println!("requested {action}");
//! })?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod observability;
pub mod platform;
pub mod signals;
pub mod triggers;

pub use config::DiagnosticsConfig;
pub use signals::{
    disable_diagnostics, enable_diagnostics, registrar, Callback, DiagnosticAction, DiagnosticsError,
    SignalRegistrar,
};
pub use triggers::install_panic_trigger;
