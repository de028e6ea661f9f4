//! Report on panic (`exception` trigger).

use std::panic;

use crate::platform::SignalBackend;
use crate::signals::action::DiagnosticAction;
use crate::signals::dispatch;
use crate::signals::registrar::{registrar, SignalRegistrar};
use crate::signals::types::DiagnosticsError;
use crate::triggers::TriggerSource;

/// Install a panic hook on the process-wide registrar.
pub fn install_panic_trigger() {
    install_panic_trigger_for(registrar());
}

/// Install a panic hook that queues a report on `registrar` whenever the
/// `nodereport` triggers include `exception`. The previous hook still runs.
/// Repeated calls for the same registrar install nothing further.
///
/// Panics raised by the diagnostics callback itself are only logged; the
/// dispatcher already contains them. The report is delivered on the dispatch
/// loop, so it only arrives if the runtime outlives the panicking thread.
pub fn install_panic_trigger_for<B: SignalBackend>(registrar: &'static SignalRegistrar<B>) {
    registrar.panic_hook.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if !dispatch::in_callback() {
                request_report(registrar);
            }
            previous(info);
        }));
        tracing::debug!("Panic trigger installed");
    });
}

fn request_report<B: SignalBackend>(registrar: &SignalRegistrar<B>) {
    match registrar.request_from(DiagnosticAction::Report, TriggerSource::Exception) {
        Ok(()) => tracing::error!("Panic detected, diagnostic report requested"),
        Err(DiagnosticsError::TriggerDisabled { .. }) | Err(DiagnosticsError::NotEnabled) => {}
        Err(e) => tracing::warn!(error = %e, "Could not request report on panic"),
    }
}
