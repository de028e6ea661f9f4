//! Configuration schema definitions.
//!
//! The layout follows the `cloud-diagnostics.json` options file: one trigger
//! string per action at the top level. Storage keys such as `volume` and
//! `objectstorage` belong to the dump producers and are ignored here.

use serde::{Deserialize, Serialize};

use crate::signals::action::DiagnosticAction;
use crate::triggers::TriggerSet;

/// Default options file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "cloud-diagnostics.json";

/// Root configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DiagnosticsConfig {
    /// Prefix used in log output.
    pub name: String,

    /// Triggers allowed to request a report.
    pub nodereport: TriggerSet,

    /// Triggers allowed to request a heap snapshot.
    pub heapdump: TriggerSet,

    /// Triggers allowed to request a core dump.
    pub coredump: TriggerSet,

    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit JSON log lines instead of the human-readable format.
    pub log_json: bool,

    /// Reload this file when it changes.
    pub watch: bool,
}

impl DiagnosticsConfig {
    pub fn triggers_for(&self, action: DiagnosticAction) -> TriggerSet {
        match action {
            DiagnosticAction::Report => self.nodereport,
            DiagnosticAction::HeapDump => self.heapdump,
            DiagnosticAction::CoreDump => self.coredump,
        }
    }
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            name: "cloud-diagnostics".to_string(),
            nodereport: TriggerSet::API_AND_SIGNAL,
            heapdump: TriggerSet::API_AND_SIGNAL,
            coredump: TriggerSet::API_AND_SIGNAL,
            log_level: "info".to_string(),
            log_json: false,
            watch: false,
        }
    }
}
