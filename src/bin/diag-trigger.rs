use std::io;

use clap::Parser;
use cloud_diagnostics::platform::{self, NativeBackend};
use cloud_diagnostics::DiagnosticAction;

/// Ask a running process for a diagnostic by sending it SIGRTMIN+N.
///
/// SIGRTMIN is read from this process's libc; it matches the target as long
/// as both use the same C library.
#[derive(Parser)]
#[command(name = "diag-trigger")]
#[command(about = "Request a report, heap dump or core dump from a running process", long_about = None)]
struct Cli {
    /// Target process id.
    #[arg(short, long, value_parser = clap::value_parser!(i32).range(1..))]
    pid: i32,

    /// Print the signal that would be sent without sending it.
    #[arg(long)]
    dry_run: bool,

    /// One of: nodereport, heapdump, coredump.
    action: DiagnosticAction,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let Some(table) = platform::binding_table(&NativeBackend::default()) else {
        eprintln!("Error: real-time signals are not available on this platform");
        std::process::exit(2);
    };

    let signal = table.signal_for(cli.action);
    println!(
        "{} -> pid {}: signal {} (SIGRTMIN+{})",
        cli.action,
        cli.pid,
        signal,
        cli.action.ordinal()
    );
    if cli.dry_run {
        return Ok(());
    }

    // SAFETY: kill(2) has no memory-safety preconditions; pid was checked > 0.
    if unsafe { libc::kill(cli.pid, signal) } != 0 {
        return Err(io::Error::last_os_error().into());
    }
    Ok(())
}
