//! Clean command implementation.

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::mpsc::RecvTimeoutError;
use std::time::Duration;

use crate::cli::CleanArgs;
use crate::config::Config;
use crate::engine::{
    CleanRequest, CleanSummary, CleaningEngine, EngineEvent, LogLevel, RunFailure, RunHandle,
    RunState,
};
use crate::rules::{CategorySet, CleanCategory};
use crate::signals;

use super::{
    confirm, plural, remember, resolve, EXIT_CANCELLED, EXIT_LOCK_HOLDERS, EXIT_PARTIAL,
    EXIT_REFUSED,
};

/// How often the event loop checks for Ctrl+C.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Run the clean command.
pub fn run(args: CleanArgs, config: &Config) -> Result<()> {
    let engine = CleaningEngine::from_config(config)?;
    let path = resolve(&args.path);
    let mut categories = args.categories();

    if categories.is_empty() {
        eprintln!("Error: no category selected");
        eprintln!("Choose at least one of --temp, --library, --editor, --sign-out");
        std::process::exit(EXIT_REFUSED);
    }

    let validation = engine.validator().validate(&path);
    if let Some(reason) = &validation.reason {
        eprintln!("Error: {} is not a valid project: {}", path.display(), reason);
        std::process::exit(EXIT_REFUSED);
    }
    remember(config, &path);

    if args.json && args.count_only {
        println!("{}", serde_json::to_string_pretty(&plan_json(&engine, &path, &categories))?);
        return Ok(());
    }

    if !args.json {
        println!("Project: {}", path.display());
        print_plan(&engine, &path, &categories);
    }

    if args.count_only {
        return Ok(());
    }

    if !args.force && !confirm("\nProceed with cleaning?")? {
        println!("Aborted.");
        return Ok(());
    }

    let mut sign_out_confirmed = args.confirm_sign_out;
    if categories.contains(CleanCategory::SignOut) && !sign_out_confirmed {
        sign_out_confirmed =
            confirm("Signing out removes stored credentials and cannot be undone. Continue?")?;
        if !sign_out_confirmed {
            println!("Skipping sign-out.");
            categories = categories
                .iter()
                .filter(|c| *c != CleanCategory::SignOut)
                .collect::<CategorySet>();
            if categories.is_empty() {
                println!("Aborted.");
                return Ok(());
            }
        }
    }

    let terminate = match engine.guard().map(|g| g.list_blocking()) {
        Some(blocking) if !blocking.is_empty() => {
            println!("\nThese processes may hold files in the project open:");
            for handle in &blocking {
                println!("  {:>8}  {}", handle.pid, handle.name);
            }
            if args.kill || confirm("Stop them now?")? {
                true
            } else {
                eprintln!("Close them and try again, or pass --kill.");
                std::process::exit(EXIT_LOCK_HOLDERS);
            }
        }
        _ => false,
    };

    if let Err(e) = signals::install_interrupt_handler() {
        tracing::warn!("Failed to install interrupt handler: {}", e);
    }

    let mut request = CleanRequest::new(&path, categories);
    request.sign_out_confirmed = sign_out_confirmed;
    request.terminate_lock_holders = terminate;

    let handle = match engine.start_clean(request) {
        Ok(handle) => handle,
        Err(refusal) => {
            eprintln!("Error: {}", refusal);
            std::process::exit(EXIT_REFUSED);
        }
    };

    let summary = follow(handle, args.json)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }

    match summary.state {
        RunState::Cancelled => std::process::exit(EXIT_CANCELLED),
        RunState::Failed => match summary.failure {
            Some(RunFailure::LockHolders(_)) => std::process::exit(EXIT_LOCK_HOLDERS),
            Some(failure) => anyhow::bail!("cleaning failed: {}", failure),
            None => anyhow::bail!("cleaning failed"),
        },
        _ if summary.is_partial() => std::process::exit(EXIT_PARTIAL),
        _ => Ok(()),
    }
}

fn print_plan(engine: &CleaningEngine, path: &std::path::Path, categories: &CategorySet) {
    println!();
    for plan in engine.count(path, categories) {
        println!(
            "  {:<16} {:>8} item{}",
            plan.category.display_name(),
            plan.len(),
            plural(plan.len())
        );
        for dir in &plan.downgraded {
            println!("    {} holds protected files, cleaned file by file", dir);
        }
    }

    if categories.contains(CleanCategory::SignOut) {
        let files = engine.credential_files().len() as u64;
        println!(
            "  {:<16} {:>8} credential file{}",
            CleanCategory::SignOut.display_name(),
            files,
            plural(files)
        );
    }
}

fn plan_json(
    engine: &CleaningEngine,
    path: &std::path::Path,
    categories: &CategorySet,
) -> serde_json::Value {
    let plans: Vec<serde_json::Value> = engine
        .count(path, categories)
        .iter()
        .map(|plan| {
            serde_json::json!({
                "category": plan.category,
                "items": plan.len(),
                "downgraded": plan.downgraded,
            })
        })
        .collect();

    let credential_files = categories
        .contains(CleanCategory::SignOut)
        .then(|| engine.credential_files().len());

    serde_json::json!({
        "project": path,
        "categories": plans,
        "credential_files": credential_files,
    })
}

/// Render the event stream until the run ends, cancelling on Ctrl+C.
fn follow(handle: RunHandle, hidden: bool) -> Result<CleanSummary> {
    let progress = if hidden {
        ProgressBar::hidden()
    } else {
        ProgressBar::new(0)
    };
    progress.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")?
            .progress_chars("##-"),
    );

    let mut cancel_sent = false;
    loop {
        match handle.events().recv_timeout(POLL_INTERVAL) {
            Ok(EngineEvent::Progress(p)) => {
                progress.set_length(p.total);
                progress.set_position(p.processed);
            }
            Ok(EngineEvent::Log(record)) => match record.level {
                LogLevel::Info => progress.set_message(record.message),
                LogLevel::Success => progress.println(format!("  {}", record.message)),
                LogLevel::Error => progress.println(format!("  error: {}", record.message)),
            },
            Ok(EngineEvent::State(state)) if state.is_terminal() => break,
            Ok(EngineEvent::State(_)) => {}
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }

        if !cancel_sent && signals::interrupted() {
            progress.println("  Cancelling after the current item...");
            handle.cancel();
            cancel_sent = true;
        }
    }

    progress.finish_and_clear();
    Ok(handle.wait())
}

fn print_summary(summary: &CleanSummary) {
    println!("\nResults:");
    for line in summary.lines() {
        println!("  {}", line);
    }
    println!(
        "  Processed: {} of {} item{}",
        summary.processed,
        summary.total,
        plural(summary.total)
    );

    if let Some(report) = &summary.termination {
        let stopped = (report.graceful.len() + report.forced.len()) as u64;
        println!("  Stopped {} process{}", stopped, if stopped == 1 { "" } else { "es" });
    }

    match summary.state {
        RunState::Completed if summary.is_partial() => {
            println!("\nCompleted with {} skipped item(s).", summary.skipped())
        }
        RunState::Completed => println!("\nDone."),
        RunState::Cancelled => println!("\nCancelled. Items already deleted stay deleted."),
        RunState::Failed => {
            if let Some(failure) = &summary.failure {
                eprintln!("\nCleaning did not run: {}", failure);
            }
        }
        _ => {}
    }
}
