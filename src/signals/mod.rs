//! Signal-to-callback bridge.
//!
//! # Data Flow
//! ```text
//! kill -RTMIN+N <pid>
//!     → raw handler (signal context)
//!         → binding.rs  (BindingTable::lookup, O(3), no allocation)
//!         → dispatch.rs (SignalCapture: write action ordinal to pipe)
//!     → tokio runtime (normal context)
//!         → dispatch.rs (run: read ordinal → Dispatcher::deliver)
//!         → host callback(DiagnosticAction)
//! ```
//!
//! # Design Decisions
//! - Only the lookup and a write(2) run inside the handler
//! - registrar.rs is the single owner of handlers, pipe and dispatch task
//! - The callback slot is an atomic swap, so a late dispatch after disable
//!   sees an empty slot and drops the event
//! - Signal coalescing under load is inherited from the OS

pub mod action;
pub mod binding;
pub mod dispatch;
pub mod registrar;
pub mod types;

pub use action::DiagnosticAction;
pub use binding::{BindingTable, SignalBinding};
pub use dispatch::{Callback, DispatchStats};
pub use registrar::{disable_diagnostics, enable_diagnostics, registrar, SignalRegistrar, SignalState};
pub use types::DiagnosticsError;
