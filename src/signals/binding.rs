//! Fixed mapping from signal numbers to diagnostic actions.
//!
//! The table is built once from a base signal number and is `Copy`, so the
//! raw handler can own its own copy and look signals up without touching
//! shared state.

use libc::c_int;

use crate::signals::action::DiagnosticAction;

/// One signal number bound to one action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignalBinding {
    pub signal: c_int,
    pub action: DiagnosticAction,
}

/// The three bindings `base+0 → Report`, `base+1 → HeapDump`,
/// `base+2 → CoreDump`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BindingTable {
    bindings: [SignalBinding; 3],
}

impl BindingTable {
    /// Number of signals the table claims.
    pub const LEN: usize = DiagnosticAction::ALL.len();

    /// Callers guarantee `base + 2` does not overflow; see [`Self::within`].
    const fn from_base(base: c_int) -> Self {
        Self {
            bindings: [
                SignalBinding { signal: base, action: DiagnosticAction::Report },
                SignalBinding { signal: base + 1, action: DiagnosticAction::HeapDump },
                SignalBinding { signal: base + 2, action: DiagnosticAction::CoreDump },
            ],
        }
    }

    /// Build a table if `base..base+3` fits in `range` (inclusive bounds).
    pub fn within(base: c_int, range: (c_int, c_int)) -> Option<Self> {
        let (low, high) = range;
        let last = base.checked_add(Self::LEN as c_int - 1)?;
        if base < low || last > high {
            return None;
        }
        Some(Self::from_base(base))
    }

    /// Async-signal-safe: a linear scan over three entries.
    #[inline]
    pub fn lookup(&self, signal: c_int) -> Option<DiagnosticAction> {
        let mut i = 0;
        while i < Self::LEN {
            if self.bindings[i].signal == signal {
                return Some(self.bindings[i].action);
            }
            i += 1;
        }
        None
    }

    pub fn signal_for(&self, action: DiagnosticAction) -> c_int {
        self.bindings[action.ordinal() as usize].signal
    }

    pub fn bindings(&self) -> &[SignalBinding; 3] {
        &self.bindings
    }

    pub fn base(&self) -> c_int {
        self.bindings[0].signal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_maps_offsets() {
        let table = BindingTable::from_base(34);
        assert_eq!(table.lookup(34), Some(DiagnosticAction::Report));
        assert_eq!(table.lookup(35), Some(DiagnosticAction::HeapDump));
        assert_eq!(table.lookup(36), Some(DiagnosticAction::CoreDump));
        assert_eq!(table.lookup(33), None);
        assert_eq!(table.lookup(37), None);
        assert_eq!(table.lookup(libc::SIGTERM), None);
    }

    #[test]
    fn test_signal_for_inverts_lookup() {
        let table = BindingTable::from_base(40);
        for action in DiagnosticAction::ALL {
            assert_eq!(table.lookup(table.signal_for(action)), Some(action));
        }
        assert_eq!(table.base(), 40);
    }

    #[test]
    fn test_within_rejects_short_ranges() {
        assert!(BindingTable::within(34, (34, 64)).is_some());
        assert!(BindingTable::within(62, (34, 64)).is_some());
        assert!(BindingTable::within(63, (34, 64)).is_none());
        assert!(BindingTable::within(33, (34, 64)).is_none());
        assert!(BindingTable::within(c_int::MAX, (0, c_int::MAX)).is_none());
        assert!(BindingTable::within(c_int::MAX - 1, (0, c_int::MAX)).is_none());
        let top = BindingTable::within(c_int::MAX - 2, (0, c_int::MAX)).unwrap();
        assert_eq!(top.signal_for(DiagnosticAction::CoreDump), c_int::MAX);
    }
}
