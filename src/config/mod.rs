//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! cloud-diagnostics.json (or .toml)
//!     → loader.rs (parse & deserialize, missing file → defaults)
//!     → validation.rs (semantic checks)
//!     → DiagnosticsConfig (validated, immutable)
//!     → SignalRegistrar::configure (atomic swap of the snapshot)
//!
//! When `watch` is set:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → SignalRegistrar::configure
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - All fields have defaults so an absent or partial file still works
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, load_or_default, ConfigError};
pub use schema::{DiagnosticsConfig, DEFAULT_CONFIG_FILE};
