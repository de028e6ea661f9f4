//! Backend for platforms without POSIX real-time signals (macOS, BSDs).
//!
//! It reports no signal range, so the registrar never asks it to install
//! anything and diagnostics signals simply never arrive.

use std::io;

use libc::c_int;

use crate::platform::SignalBackend;
use crate::signals::dispatch::SignalCapture;

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopBackend;

impl SignalBackend for NoopBackend {
    type Watcher = ();

    fn realtime_range(&self) -> Option<(c_int, c_int)> {
        None
    }

    fn arm(&self, _signal: c_int, _capture: SignalCapture) -> io::Result<()> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "real-time signals are not available on this platform",
        ))
    }

    fn disarm(&self, _watcher: ()) {}
}
