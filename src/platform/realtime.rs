//! POSIX real-time signal backend (Linux, Android).

use std::io;

use libc::c_int;
use signal_hook::SigId;

use crate::platform::SignalBackend;
use crate::signals::dispatch::SignalCapture;

#[derive(Debug, Clone, Copy, Default)]
pub struct RealtimeBackend;

impl SignalBackend for RealtimeBackend {
    type Watcher = SigId;

    fn realtime_range(&self) -> Option<(c_int, c_int)> {
        let (low, high) = (libc::SIGRTMIN(), libc::SIGRTMAX());
        (low <= high).then_some((low, high))
    }

    fn arm(&self, signal: c_int, capture: SignalCapture) -> io::Result<SigId> {
        // SAFETY: the action only performs a table lookup and a write(2) on a
        // non-blocking fd, both async-signal-safe. signal-hook saves and
        // restores errno around it.
        unsafe {
            signal_hook::low_level::register(signal, move || capture.on_signal(signal))
        }
    }

    fn disarm(&self, watcher: SigId) {
        if !signal_hook::low_level::unregister(watcher) {
            tracing::debug!("Signal handler was already removed");
        }
    }
}
