//! Shared utilities for integration tests.

use std::time::Duration;

use cloud_diagnostics::{Callback, DiagnosticAction};
use tokio::sync::mpsc;

/// A callback that forwards every action into a channel.
pub fn recording_callback() -> (Callback, mpsc::UnboundedReceiver<DiagnosticAction>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let callback = Callback::new(move |action| {
        let _ = tx.send(action);
    });
    (callback, rx)
}

/// Wait for the next delivered action.
pub async fn next_action(rx: &mut mpsc::UnboundedReceiver<DiagnosticAction>) -> Option<DiagnosticAction> {
    tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .ok()
        .flatten()
}

/// Assert nothing else arrives within a short window.
pub async fn assert_quiet(rx: &mut mpsc::UnboundedReceiver<DiagnosticAction>) {
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(rx.try_recv().is_err(), "unexpected extra callback invocation");
}
