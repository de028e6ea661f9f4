//! Deferred dispatch of diagnostic actions.
//!
//! Two halves:
//! - [`SignalCapture`] runs inside the raw signal handler. It maps the signal
//!   to an action and writes the action's ordinal as a single byte into a
//!   non-blocking socket pair. Nothing else.
//! - [`run`] is a tokio task that reads those bytes (and API requests) and
//!   hands each action to the [`Dispatcher`], which invokes the host callback.
//!
//! A full pipe drops the byte, the same way the kernel coalesces pending
//! signals during a storm. Delivery order across different signals is not
//! guaranteed.

use std::cell::Cell;
use std::fmt;
use std::os::fd::RawFd;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use arc_swap::{ArcSwap, ArcSwapOption};
use libc::c_int;
use tokio::io::AsyncReadExt;
use tokio::net::UnixStream;
use tokio::sync::mpsc;

use crate::config::DiagnosticsConfig;
use crate::observability::metrics::{self, DropReason};
use crate::signals::action::DiagnosticAction;
use crate::signals::binding::BindingTable;
use crate::triggers::TriggerSource;

/// Signal-context half of the dispatcher.
#[derive(Debug, Clone, Copy)]
pub struct SignalCapture {
    table: BindingTable,
    sink: RawFd,
}

impl SignalCapture {
    /// `sink` must be a non-blocking descriptor that stays open for as long as
    /// any handler holding this capture is installed.
    pub fn new(table: BindingTable, sink: RawFd) -> Self {
        Self { table, sink }
    }

    /// Called from the raw handler. Async-signal-safe: no allocation, no
    /// locks, no logging.
    #[inline]
    pub fn on_signal(&self, signal: c_int) {
        let Some(action) = self.table.lookup(signal) else {
            return;
        };
        let byte = action.ordinal();
        // SAFETY: write(2) is async-signal-safe and `byte` outlives the call.
        // A failed write (EAGAIN on a full pipe) drops the event.
        unsafe {
            libc::write(self.sink, (&byte as *const u8).cast(), 1);
        }
    }
}

/// Host callback receiving diagnostic actions.
pub struct Callback(Box<dyn Fn(DiagnosticAction) + Send + Sync>);

impl Callback {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(DiagnosticAction) + Send + Sync + 'static,
    {
        Self(Box::new(f))
    }

    fn call(&self, action: DiagnosticAction) {
        (self.0)(action)
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Callback")
    }
}

thread_local! {
    static IN_CALLBACK: Cell<bool> = const { Cell::new(false) };
}

/// True while this thread is running the host callback. A panic raised there
/// is already contained by the dispatcher and must not request another report.
pub(crate) fn in_callback() -> bool {
    IN_CALLBACK.with(Cell::get)
}

/// Outcome of a single delivery attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Invoked,
    Dropped(DropReason),
}

/// Counters snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub dispatched: u64,
    pub dropped: u64,
}

/// Normal-context half: owns the callback slot and applies trigger filters.
#[derive(Debug)]
pub struct Dispatcher {
    callback: ArcSwapOption<Callback>,
    config: Arc<ArcSwap<DiagnosticsConfig>>,
    dispatched: AtomicU64,
    dropped: AtomicU64,
}

impl Dispatcher {
    pub fn new(config: Arc<ArcSwap<DiagnosticsConfig>>) -> Self {
        Self {
            callback: ArcSwapOption::empty(),
            config,
            dispatched: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
        }
    }

    /// Store the callback. A concurrent delivery sees either the old or the
    /// new value, never a partial one.
    pub fn set_callback(&self, callback: Arc<Callback>) {
        self.callback.store(Some(callback));
    }

    pub fn clear_callback(&self) -> Option<Arc<Callback>> {
        self.callback.swap(None)
    }

    pub fn has_callback(&self) -> bool {
        self.callback.load().is_some()
    }

    /// Invoke the callback for `action`, unless the trigger is disabled or no
    /// callback is stored. Never panics.
    pub fn deliver(&self, action: DiagnosticAction, source: TriggerSource) -> Delivery {
        let config = self.config.load();
        if !config.triggers_for(action).contains(source) {
            tracing::debug!(%action, %source, "Trigger disabled for action, ignoring request");
            return self.drop_event(action, DropReason::Filtered);
        }

        let Some(callback) = self.callback.load_full() else {
            tracing::warn!(%action, %source, "No diagnostics callback registered, dropping request");
            return self.drop_event(action, DropReason::NoCallback);
        };

        tracing::info!(name = %config.name, %action, %source, "Dispatching diagnostic request");
        IN_CALLBACK.with(|flag| flag.set(true));
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| callback.call(action)));
        IN_CALLBACK.with(|flag| flag.set(false));

        match outcome {
            Ok(()) => {
                self.dispatched.fetch_add(1, Ordering::Relaxed);
                metrics::record_dispatched(action);
                Delivery::Invoked
            }
            Err(_) => {
                tracing::error!(%action, "Diagnostics callback panicked");
                self.drop_event(action, DropReason::Panicked)
            }
        }
    }

    pub fn stats(&self) -> DispatchStats {
        DispatchStats {
            dispatched: self.dispatched.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
        }
    }

    fn drop_event(&self, action: DiagnosticAction, reason: DropReason) -> Delivery {
        self.dropped.fetch_add(1, Ordering::Relaxed);
        metrics::record_dropped(action, reason);
        Delivery::Dropped(reason)
    }
}

/// A request queued through the API channel.
pub type Request = (DiagnosticAction, TriggerSource);

/// Dispatch loop. Runs until the request channel closes; the signal pipe
/// closing on its own only stops signal delivery.
pub async fn run(
    dispatcher: Arc<Dispatcher>,
    mut pipe: UnixStream,
    mut requests: mpsc::UnboundedReceiver<Request>,
) {
    let mut buf = [0u8; 64];
    let mut pipe_open = true;

    tracing::debug!("Diagnostics dispatch loop started");
    loop {
        tokio::select! {
            read = pipe.read(&mut buf), if pipe_open => match read {
                Ok(0) => pipe_open = false,
                Ok(n) => {
                    for &ordinal in &buf[..n] {
                        match DiagnosticAction::from_ordinal(ordinal) {
                            Some(action) => {
                                dispatcher.deliver(action, TriggerSource::Signal);
                            }
                            None => tracing::debug!(ordinal, "Ignoring unknown action ordinal"),
                        }
                    }
                }
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {}
                Err(e) => {
                    tracing::error!(error = %e, "Signal pipe failed, signal triggers stopped");
                    pipe_open = false;
                }
            },
            request = requests.recv() => match request {
                Some((action, source)) => {
                    dispatcher.deliver(action, source);
                }
                None => break,
            },
        }
    }
    tracing::debug!("Diagnostics dispatch loop stopped");
}
