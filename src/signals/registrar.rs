//! Signal registrar: the single owner of the installed handlers.
//!
//! # Responsibilities
//! - Arm the three diagnostic signals exactly once (idempotent enable)
//! - Roll back partially installed handlers on failure
//! - Own the signal pipe, the API channel and the dispatch task
//! - Tear everything down on disable
//!
//! # Lifecycle
//! ```text
//! Unregistered ──enable──▶ Armed ──disable──▶ Unregistered
//! ```

use std::fmt;
use std::os::fd::AsRawFd;
use std::os::unix::net::UnixStream as StdUnixStream;
use std::sync::{Arc, Mutex, MutexGuard, Once, OnceLock, PoisonError};

use arc_swap::{ArcSwap, ArcSwapOption};
use libc::c_int;
use tokio::sync::mpsc;

use crate::config::DiagnosticsConfig;
use crate::platform::{self, NativeBackend, SignalBackend};
use crate::signals::action::DiagnosticAction;
use crate::signals::binding::{BindingTable, SignalBinding};
use crate::signals::dispatch::{self, Callback, DispatchStats, Dispatcher, Request, SignalCapture};
use crate::signals::types::DiagnosticsError;
use crate::triggers::TriggerSource;

/// Per-signal registration state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalState {
    Unregistered,
    Armed,
}

/// One installed OS handler.
#[derive(Debug)]
pub struct HandlerRegistration<W> {
    pub binding: SignalBinding,
    watcher: W,
}

struct Armed<W> {
    registrations: Vec<HandlerRegistration<W>>,
    /// Write end of the signal pipe. Must outlive `registrations`.
    sink: StdUnixStream,
}

/// Installs and owns the diagnostic signal handlers.
pub struct SignalRegistrar<B: SignalBackend = NativeBackend> {
    backend: B,
    config: Arc<ArcSwap<DiagnosticsConfig>>,
    dispatcher: Arc<Dispatcher>,
    /// Sender side of the API channel; lock-free so the panic hook can use it.
    requests: ArcSwapOption<mpsc::UnboundedSender<Request>>,
    state: Mutex<Option<Armed<B::Watcher>>>,
    /// Guards the `exception` trigger hook so it is chained at most once.
    pub(crate) panic_hook: Once,
}

impl SignalRegistrar<NativeBackend> {
    pub fn new(config: DiagnosticsConfig) -> Self {
        Self::with_backend(NativeBackend::default(), config)
    }
}

impl<B: SignalBackend> SignalRegistrar<B> {
    pub fn with_backend(backend: B, config: DiagnosticsConfig) -> Self {
        let config = Arc::new(ArcSwap::from_pointee(config));
        let dispatcher = Arc::new(Dispatcher::new(config.clone()));
        Self {
            backend,
            config,
            dispatcher,
            requests: ArcSwapOption::empty(),
            state: Mutex::new(None),
            panic_hook: Once::new(),
        }
    }

    /// The bindings this platform supports, or `None` when real-time
    /// signals are unavailable.
    pub fn binding_table(&self) -> Option<BindingTable> {
        platform::binding_table(&self.backend)
    }

    /// Arm the diagnostic signals and store `callback`.
    ///
    /// Must be called from within a tokio runtime; the dispatch loop is
    /// spawned onto it as a detached task, so it never keeps the process
    /// alive. A second call while armed changes nothing. On platforms without
    /// real-time signals no handler is installed, but API requests still work.
    pub fn enable(&self, callback: Option<Callback>) -> Result<(), DiagnosticsError> {
        let callback = callback.ok_or(DiagnosticsError::InvalidCallback)?;

        let mut state = self.lock_state();
        if state.is_some() {
            tracing::debug!("Diagnostics already enabled, keeping existing handlers");
            return Ok(());
        }

        let runtime = tokio::runtime::Handle::try_current().map_err(|_| DiagnosticsError::NoReactor)?;

        let (reader, sink) = StdUnixStream::pair()?;
        reader.set_nonblocking(true)?;
        sink.set_nonblocking(true)?;
        let pipe = {
            let _guard = runtime.enter();
            tokio::net::UnixStream::from_std(reader)?
        };

        let registrations = match self.binding_table() {
            Some(table) => self.arm_all(table, &sink)?,
            None => {
                tracing::info!("Real-time signals unavailable on this platform, signal triggers disabled");
                Vec::new()
            }
        };

        let (requests, request_rx) = mpsc::unbounded_channel();
        self.dispatcher.set_callback(Arc::new(callback));
        self.requests.store(Some(Arc::new(requests)));
        runtime.spawn(dispatch::run(self.dispatcher.clone(), pipe, request_rx));

        let signals: Vec<c_int> = registrations.iter().map(|r| r.binding.signal).collect();
        tracing::info!(?signals, "Diagnostics enabled");

        *state = Some(Armed { registrations, sink });
        Ok(())
    }

    /// Remove every handler and clear the callback. Requests already queued
    /// are dropped by the dispatch loop. No-op when not enabled.
    pub fn disable(&self) {
        let Some(armed) = self.lock_state().take() else {
            return;
        };

        for registration in armed.registrations {
            self.backend.disarm(registration.watcher);
        }
        self.dispatcher.clear_callback();
        self.requests.store(None);
        // Handlers are gone, so the descriptor they wrote to can close.
        drop(armed.sink);

        tracing::info!("Diagnostics disabled");
    }

    pub fn is_enabled(&self) -> bool {
        self.lock_state().is_some()
    }

    pub fn state(&self, signal: c_int) -> SignalState {
        let armed = self
            .lock_state()
            .as_ref()
            .is_some_and(|a| a.registrations.iter().any(|r| r.binding.signal == signal));
        if armed {
            SignalState::Armed
        } else {
            SignalState::Unregistered
        }
    }

    pub fn armed_signals(&self) -> Vec<c_int> {
        self.lock_state()
            .as_ref()
            .map(|a| a.registrations.iter().map(|r| r.binding.signal).collect())
            .unwrap_or_default()
    }

    /// Request `action` programmatically. Delivered on the dispatch loop like
    /// a signal.
    pub fn request(&self, action: DiagnosticAction) -> Result<(), DiagnosticsError> {
        self.request_from(action, TriggerSource::Api)
    }

    pub(crate) fn request_from(&self, action: DiagnosticAction, source: TriggerSource) -> Result<(), DiagnosticsError> {
        if !self.config.load().triggers_for(action).contains(source) {
            return Err(DiagnosticsError::TriggerDisabled { action, trigger: source });
        }
        let requests = self.requests.load();
        let Some(tx) = &*requests else {
            return Err(DiagnosticsError::NotEnabled);
        };
        tx.send((action, source)).map_err(|_| DiagnosticsError::NotEnabled)
    }

    /// Replace the active configuration. Takes effect for the next delivery.
    pub fn configure(&self, config: DiagnosticsConfig) {
        tracing::info!(
            nodereport = %config.nodereport,
            heapdump = %config.heapdump,
            coredump = %config.coredump,
            "Diagnostics configuration updated"
        );
        self.config.store(Arc::new(config));
    }

    pub fn config(&self) -> Arc<DiagnosticsConfig> {
        self.config.load_full()
    }

    pub fn dispatch_stats(&self) -> DispatchStats {
        self.dispatcher.stats()
    }

    /// Install one handler per binding; on failure remove the ones already
    /// installed by this call.
    fn arm_all(
        &self,
        table: BindingTable,
        sink: &StdUnixStream,
    ) -> Result<Vec<HandlerRegistration<B::Watcher>>, DiagnosticsError> {
        let capture = SignalCapture::new(table, sink.as_raw_fd());
        let mut registrations = Vec::with_capacity(BindingTable::LEN);

        for binding in table.bindings() {
            match self.backend.arm(binding.signal, capture) {
                Ok(watcher) => registrations.push(HandlerRegistration {
                    binding: *binding,
                    watcher,
                }),
                Err(source) => {
                    tracing::error!(
                        signal = binding.signal,
                        action = %binding.action,
                        error = %source,
                        rolled_back = registrations.len(),
                        "Failed to install diagnostics signal handler"
                    );
                    for registration in registrations.into_iter().rev() {
                        self.backend.disarm(registration.watcher);
                    }
                    return Err(DiagnosticsError::RegistrationFailed {
                        signal: binding.signal,
                        source,
                    });
                }
            }
        }
        Ok(registrations)
    }

    fn lock_state(&self) -> MutexGuard<'_, Option<Armed<B::Watcher>>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<B: SignalBackend> fmt::Debug for SignalRegistrar<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignalRegistrar")
            .field("armed_signals", &self.armed_signals())
            .field("dispatch", &self.dispatcher.stats())
            .finish_non_exhaustive()
    }
}

impl<B: SignalBackend> Drop for SignalRegistrar<B> {
    fn drop(&mut self) {
        self.disable();
    }
}

static REGISTRAR: OnceLock<SignalRegistrar> = OnceLock::new();

/// The process-wide registrar, created with default options on first use.
pub fn registrar() -> &'static SignalRegistrar {
    REGISTRAR.get_or_init(|| SignalRegistrar::new(DiagnosticsConfig::default()))
}

/// Arm the diagnostic signals on the process-wide registrar.
pub fn enable_diagnostics<F>(callback: F) -> Result<(), DiagnosticsError>
where
    F: Fn(DiagnosticAction) + Send + Sync + 'static,
{
    registrar().enable(Some(Callback::new(callback)))
}

pub fn disable_diagnostics() {
    registrar().disable();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::noop::NoopBackend;
    use crate::triggers::TriggerSet;
    use std::io;

    /// Records arm/disarm calls; fails on one chosen signal.
    #[derive(Debug, Default)]
    struct FakeBackend {
        fail_on: Option<c_int>,
        live: Arc<Mutex<Vec<c_int>>>,
        arm_calls: Arc<Mutex<usize>>,
    }

    impl SignalBackend for FakeBackend {
        type Watcher = c_int;

        fn realtime_range(&self) -> Option<(c_int, c_int)> {
            Some((50, 60))
        }

        fn arm(&self, signal: c_int, _capture: SignalCapture) -> io::Result<c_int> {
            *self.arm_calls.lock().unwrap() += 1;
            if self.fail_on == Some(signal) {
                return Err(io::Error::new(io::ErrorKind::OutOfMemory, "no handler slots"));
            }
            self.live.lock().unwrap().push(signal);
            Ok(signal)
        }

        fn disarm(&self, watcher: c_int) {
            self.live.lock().unwrap().retain(|s| *s != watcher);
        }
    }

    fn noop_callback() -> Option<Callback> {
        Some(Callback::new(|_| {}))
    }

    #[tokio::test]
    async fn test_missing_callback_installs_nothing() {
        let backend = FakeBackend::default();
        let arm_calls = backend.arm_calls.clone();
        let registrar = SignalRegistrar::with_backend(backend, DiagnosticsConfig::default());

        let err = registrar.enable(None).unwrap_err();
        assert!(matches!(err, DiagnosticsError::InvalidCallback));
        assert_eq!(*arm_calls.lock().unwrap(), 0);
        assert!(!registrar.is_enabled());
    }

    #[tokio::test]
    async fn test_enable_arms_each_binding_once() {
        let backend = FakeBackend::default();
        let live = backend.live.clone();
        let arm_calls = backend.arm_calls.clone();
        let registrar = SignalRegistrar::with_backend(backend, DiagnosticsConfig::default());

        registrar.enable(noop_callback()).unwrap();
        registrar.enable(noop_callback()).unwrap();

        assert_eq!(*live.lock().unwrap(), vec![50, 51, 52]);
        assert_eq!(*arm_calls.lock().unwrap(), 3);
        assert_eq!(registrar.armed_signals(), vec![50, 51, 52]);
        assert_eq!(registrar.state(51), SignalState::Armed);
        assert_eq!(registrar.state(53), SignalState::Unregistered);
    }

    #[tokio::test]
    async fn test_failure_rolls_back_partial_registration() {
        let backend = FakeBackend {
            fail_on: Some(52),
            ..Default::default()
        };
        let live = backend.live.clone();
        let registrar = SignalRegistrar::with_backend(backend, DiagnosticsConfig::default());

        match registrar.enable(noop_callback()) {
            Err(DiagnosticsError::RegistrationFailed { signal, .. }) => assert_eq!(signal, 52),
            other => panic!("expected RegistrationFailed, got {:?}", other),
        }
        assert!(live.lock().unwrap().is_empty());
        assert!(!registrar.is_enabled());
        assert!(registrar.armed_signals().is_empty());
    }

    #[tokio::test]
    async fn test_disable_returns_signals_to_unregistered() {
        let backend = FakeBackend::default();
        let live = backend.live.clone();
        let registrar = SignalRegistrar::with_backend(backend, DiagnosticsConfig::default());

        registrar.enable(noop_callback()).unwrap();
        registrar.disable();
        registrar.disable();

        assert!(live.lock().unwrap().is_empty());
        assert_eq!(registrar.state(50), SignalState::Unregistered);
        assert!(matches!(
            registrar.request(DiagnosticAction::Report),
            Err(DiagnosticsError::NotEnabled)
        ));

        registrar.enable(noop_callback()).unwrap();
        assert_eq!(*live.lock().unwrap(), vec![50, 51, 52]);
    }

    #[tokio::test]
    async fn test_drop_disarms() {
        let backend = FakeBackend::default();
        let live = backend.live.clone();
        {
            let registrar = SignalRegistrar::with_backend(backend, DiagnosticsConfig::default());
            registrar.enable(noop_callback()).unwrap();
        }
        assert!(live.lock().unwrap().is_empty());
    }

    #[test]
    fn test_enable_outside_runtime_fails() {
        let backend = FakeBackend::default();
        let live = backend.live.clone();
        let registrar = SignalRegistrar::with_backend(backend, DiagnosticsConfig::default());

        assert!(matches!(
            registrar.enable(noop_callback()),
            Err(DiagnosticsError::NoReactor)
        ));
        assert!(live.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unsupported_platform_is_noop() {
        let registrar = SignalRegistrar::with_backend(NoopBackend, DiagnosticsConfig::default());
        assert!(registrar.binding_table().is_none());

        registrar.enable(noop_callback()).unwrap();
        assert!(registrar.is_enabled());
        assert!(registrar.armed_signals().is_empty());
    }

    #[tokio::test]
    async fn test_request_respects_trigger_config() {
        let registrar = SignalRegistrar::with_backend(
            FakeBackend::default(),
            DiagnosticsConfig {
                heapdump: TriggerSet::NONE.with(TriggerSource::Signal),
                ..Default::default()
            },
        );
        registrar.enable(noop_callback()).unwrap();

        assert!(matches!(
            registrar.request(DiagnosticAction::HeapDump),
            Err(DiagnosticsError::TriggerDisabled { .. })
        ));
        assert!(registrar.request(DiagnosticAction::Report).is_ok());
    }
}
