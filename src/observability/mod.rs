//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Registrar and dispatcher produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (dispatched / dropped counters)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Whatever metrics recorder the host installs
//! ```
//!
//! # Design Decisions
//! - Nothing here runs in signal context; the raw handler never logs
//! - Metrics go through the `metrics` facade and cost nothing without a recorder
//! - Log level comes from the options file unless RUST_LOG is set

pub mod logging;
pub mod metrics;
