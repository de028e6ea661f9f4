//! Diagnostic action identifiers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A diagnostic request delivered to the host callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticAction {
    /// Lightweight process report.
    #[serde(rename = "nodereport")]
    Report,
    /// Heap snapshot.
    HeapDump,
    /// Full process core dump.
    CoreDump,
}

impl DiagnosticAction {
    /// All actions in ordinal order.
    pub const ALL: [DiagnosticAction; 3] = [
        DiagnosticAction::Report,
        DiagnosticAction::HeapDump,
        DiagnosticAction::CoreDump,
    ];

    /// Offset of this action from the base signal number.
    pub const fn ordinal(self) -> u8 {
        match self {
            DiagnosticAction::Report => 0,
            DiagnosticAction::HeapDump => 1,
            DiagnosticAction::CoreDump => 2,
        }
    }

    pub const fn from_ordinal(ordinal: u8) -> Option<Self> {
        match ordinal {
            0 => Some(DiagnosticAction::Report),
            1 => Some(DiagnosticAction::HeapDump),
            2 => Some(DiagnosticAction::CoreDump),
            _ => None,
        }
    }

    /// Identifier handed to dump producers.
    pub const fn as_str(self) -> &'static str {
        match self {
            DiagnosticAction::Report => "nodereport",
            DiagnosticAction::HeapDump => "heapdump",
            DiagnosticAction::CoreDump => "coredump",
        }
    }
}

impl fmt::Display for DiagnosticAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string names no known action.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown diagnostic action: {0:?}")]
pub struct UnknownAction(pub String);

impl FromStr for DiagnosticAction {
    type Err = UnknownAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "nodereport" => Ok(DiagnosticAction::Report),
            "heapdump" => Ok(DiagnosticAction::HeapDump),
            "coredump" => Ok(DiagnosticAction::CoreDump),
            other => Err(UnknownAction(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordinals_follow_signal_offsets() {
        for (i, action) in DiagnosticAction::ALL.iter().enumerate() {
            assert_eq!(action.ordinal() as usize, i);
            assert_eq!(DiagnosticAction::from_ordinal(i as u8), Some(*action));
        }
        assert_eq!(DiagnosticAction::from_ordinal(3), None);
    }

    #[test]
    fn test_identifiers() {
        assert_eq!(DiagnosticAction::Report.to_string(), "nodereport");
        assert_eq!("heapdump".parse::<DiagnosticAction>(), Ok(DiagnosticAction::HeapDump));
        assert!("core".parse::<DiagnosticAction>().is_err());
    }

    #[test]
    fn test_serde_uses_identifiers() {
        let json = serde_json::to_string(&DiagnosticAction::Report).unwrap();
        assert_eq!(json, "\"nodereport\"");
        let back: DiagnosticAction = serde_json::from_str("\"coredump\"").unwrap();
        assert_eq!(back, DiagnosticAction::CoreDump);
    }
}
