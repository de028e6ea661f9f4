//! Platform signal backends.
//!
//! # Data Flow
//! ```text
//! SignalRegistrar
//!     → SignalBackend::realtime_range() (capability query)
//!     → None:    nothing is installed, enable is a logged no-op
//!     → Some(r): SignalBackend::arm() once per binding
//!                → raw handler runs SignalCapture::on_signal
//! ```
//!
//! # Design Decisions
//! - One capability trait, two implementations chosen by `cfg`
//! - The no-op backend is compiled everywhere so its policy is testable
//! - Real-time numbering is only trusted where libc exposes `SIGRTMIN()`

use std::io;

use libc::c_int;

use crate::signals::binding::BindingTable;
use crate::signals::dispatch::SignalCapture;

pub mod noop;
#[cfg(any(target_os = "linux", target_os = "android"))]
pub mod realtime;

/// OS-level signal installation.
pub trait SignalBackend: Send + Sync + 'static {
    /// Handle for one installed handler.
    type Watcher: Send + 'static;

    /// Inclusive range of application-defined signals with stable numbering,
    /// or `None` if the platform has no such range.
    fn realtime_range(&self) -> Option<(c_int, c_int)>;

    /// Install a handler for `signal` that forwards to `capture`.
    fn arm(&self, signal: c_int, capture: SignalCapture) -> io::Result<Self::Watcher>;

    /// Remove a handler. Returns once the handler can no longer run.
    fn disarm(&self, watcher: Self::Watcher);
}

/// Backend selected for this build target.
#[cfg(any(target_os = "linux", target_os = "android"))]
pub type NativeBackend = realtime::RealtimeBackend;

/// Backend selected for this build target.
#[cfg(not(any(target_os = "linux", target_os = "android")))]
pub type NativeBackend = noop::NoopBackend;

/// Bindings starting at the lowest real-time signal, if `backend` has room
/// for all three.
pub fn binding_table<B: SignalBackend>(backend: &B) -> Option<BindingTable> {
    let range = backend.realtime_range()?;
    BindingTable::within(range.0, range)
}
