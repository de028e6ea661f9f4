//! cloud-diagnostics agent.
//!
//! # Architecture Overview
//!
//! ```text
//!   operator                         ┌──────────────────────────────────────────┐
//!   kill -RTMIN+N / diag-trigger ───▶│ raw handler ─▶ pipe ─▶ dispatch loop ──┐ │
//!                                    │                                        ▼ │
//!   registrar.request(action) ──────▶│ api channel ───────▶ Dispatcher ─▶ callback
//!   panic (exception trigger) ──────▶│                                          │
//!                                    │  config (options file, hot reload)       │
//!                                    │  observability (tracing, metrics)        │
//!                                    └──────────────────────────────────────────┘
//! ```
//!
//! Dump producers are not part of this crate; the agent's callback logs
//! each request so the signal path can be exercised end to end.

use std::path::PathBuf;

use clap::Parser;
use cloud_diagnostics::config::{load_or_default, watcher::OptionsWatcher, DEFAULT_CONFIG_FILE};
use cloud_diagnostics::observability::logging;
use cloud_diagnostics::{disable_diagnostics, install_panic_trigger, registrar, Callback, DiagnosticAction};

#[derive(Parser)]
#[command(name = "cloud-diagnostics")]
#[command(about = "Arm diagnostic signal handlers and log each request", long_about = None)]
struct Cli {
    /// Options file (JSON, or TOML with a .toml extension).
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = load_or_default(&cli.config)?;
    logging::init(&config)?;

    tracing::info!(
        pid = std::process::id(),
        options = %cli.config.display(),
        nodereport = %config.nodereport,
        heapdump = %config.heapdump,
        coredump = %config.coredump,
        "cloud-diagnostics starting"
    );

    let registrar = registrar();
    registrar.configure(config.clone());
    install_panic_trigger();

    registrar.enable(Some(Callback::new(|action: DiagnosticAction| {
        tracing::info!(%action, "Diagnostic requested, no producer attached");
    })))?;

    match registrar.binding_table() {
        Some(table) => {
            for binding in table.bindings() {
                tracing::info!(
                    signal = binding.signal,
                    action = %binding.action,
                    "Send `kill -RTMIN+{}` to request", binding.action.ordinal()
                );
            }
        }
        None => tracing::warn!("Signal triggers unavailable on this platform"),
    }

    // Keep the watcher alive until shutdown.
    let _watcher = if config.watch {
        let (watcher, mut updates) = OptionsWatcher::start(&cli.config, config.clone())?;
        tokio::spawn(async move {
            while let Some(new_config) = updates.recv().await {
                registrar.configure(new_config);
            }
        });
        Some(watcher)
    } else {
        None
    };

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received");

    disable_diagnostics();
    let stats = registrar.dispatch_stats();
    tracing::info!(dispatched = stats.dispatched, dropped = stats.dropped, "Shutdown complete");
    Ok(())
}
