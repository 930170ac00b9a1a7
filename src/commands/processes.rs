//! Processes command implementation.

use anyhow::Result;

use crate::cli::ProcessesArgs;
use crate::config::Config;
use crate::guard::ProcessGuard;

use super::{confirm, EXIT_LOCK_HOLDERS};

/// Run the processes command.
pub fn run(args: ProcessesArgs, config: &Config) -> Result<()> {
    let guard = ProcessGuard::system(&config.guard);
    let blocking = guard.list_blocking();

    if blocking.is_empty() {
        println!("No editor processes running.");
        return Ok(());
    }

    println!("  {:>8}  {}", "PID", "NAME");
    for handle in &blocking {
        println!("  {:>8}  {}", handle.pid, handle.name);
    }

    if !args.kill {
        return Ok(());
    }

    if !args.force && !confirm("\nStop these processes?")? {
        println!("Aborted.");
        return Ok(());
    }

    let report = guard.terminate(&blocking, guard.grace_period());
    println!(
        "\nStopped {} gracefully, killed {}.",
        report.graceful.len(),
        report.forced.len()
    );
    for (handle, error) in &report.errors {
        eprintln!("  Error signalling {} (pid {}): {}", handle.name, handle.pid, error);
    }

    if !report.is_clear() {
        eprintln!("Still running:");
        for handle in &report.remaining {
            eprintln!("  {:>8}  {}", handle.pid, handle.name);
        }
        std::process::exit(EXIT_LOCK_HOLDERS);
    }
    Ok(())
}
