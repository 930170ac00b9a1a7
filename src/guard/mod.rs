//! Detection and termination of editor processes that hold project locks.
//!
//! A run must not start while the editor or its helpers are alive. The
//! guard lists them by name and, when the user agrees, stops them: first
//! politely, then by force once the grace period is over.

mod table;

pub use table::{name_matches, ProcessHandle, ProcessTable, SystemProcessTable};

use serde::Serialize;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::config::GuardConfig;

/// Upper bound on the pause between force kill and re-enumeration.
const SETTLE_LIMIT: Duration = Duration::from_secs(1);

/// Outcome of [`ProcessGuard::terminate`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct TerminationReport {
    /// Processes that exited after the stop request
    pub graceful: Vec<ProcessHandle>,
    /// Processes that had to be killed
    pub forced: Vec<ProcessHandle>,
    /// Signals that could not be delivered
    pub errors: Vec<(ProcessHandle, String)>,
    /// Matching processes still alive afterwards
    pub remaining: Vec<ProcessHandle>,
}

impl TerminationReport {
    /// No matching process survived.
    pub fn is_clear(&self) -> bool {
        self.remaining.is_empty()
    }
}

/// Lists and terminates lock-holding processes.
pub struct ProcessGuard {
    table: Arc<dyn ProcessTable>,
    names: Vec<String>,
    grace_period: Duration,
    poll_interval: Duration,
}

impl ProcessGuard {
    pub fn new(table: Arc<dyn ProcessTable>, names: Vec<String>) -> Self {
        Self {
            table,
            names,
            grace_period: Duration::from_secs(5),
            poll_interval: Duration::from_millis(100),
        }
    }

    /// Guard over the live process table, configured from `config`.
    pub fn system(config: &GuardConfig) -> Self {
        Self::new(
            Arc::new(SystemProcessTable::new()),
            config.process_names.clone(),
        )
        .with_grace_period(config.grace_period())
        .with_poll_interval(config.poll_interval())
    }

    pub fn with_grace_period(mut self, grace_period: Duration) -> Self {
        self.grace_period = grace_period;
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval.max(Duration::from_millis(1));
        self
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn grace_period(&self) -> Duration {
        self.grace_period
    }

    /// Running processes matching the configured names.
    pub fn list_blocking(&self) -> Vec<ProcessHandle> {
        self.list_blocking_processes(&self.names)
    }

    /// Running processes matching any of `names`. Empty means clear.
    pub fn list_blocking_processes(&self, names: &[String]) -> Vec<ProcessHandle> {
        if names.is_empty() {
            return Vec::new();
        }
        let found = self.table.find_by_name(names);
        if !found.is_empty() {
            tracing::debug!(count = found.len(), "Found lock-holding processes");
        }
        found
    }

    /// Stop `handles`, waiting up to `grace` before killing survivors.
    ///
    /// Afterwards the table is enumerated again by name, so a helper that
    /// respawned during the wait shows up in `remaining`.
    pub fn terminate(&self, handles: &[ProcessHandle], grace: Duration) -> TerminationReport {
        let mut report = TerminationReport::default();
        let mut pending: Vec<ProcessHandle> = Vec::new();

        for handle in handles {
            tracing::info!("Stopping {} (pid {})", handle.name, handle.pid);
            match self.table.request_stop(handle) {
                Ok(()) => pending.push(handle.clone()),
                Err(e) => {
                    tracing::warn!("Failed to stop pid {}: {}", handle.pid, e);
                    report.errors.push((handle.clone(), e.to_string()));
                    // Still try to kill it below
                    pending.push(handle.clone());
                }
            }
        }

        let deadline = Instant::now() + grace;
        loop {
            let (exited, alive): (Vec<_>, Vec<_>) =
                pending.into_iter().partition(|h| !self.table.is_running(h));
            report.graceful.extend(exited);
            pending = alive;

            if pending.is_empty() || Instant::now() >= deadline {
                break;
            }
            thread::sleep(
                self.poll_interval
                    .min(deadline.saturating_duration_since(Instant::now())),
            );
        }

        // Handles that errored on stop but then exited are not graceful
        report
            .graceful
            .retain(|h| !report.errors.iter().any(|(e, _)| e == h));

        if !pending.is_empty() {
            for handle in &pending {
                tracing::warn!(
                    "{} (pid {}) ignored the stop request, killing",
                    handle.name,
                    handle.pid
                );
                match self.table.force_kill(handle) {
                    Ok(()) => report.forced.push(handle.clone()),
                    Err(e) => {
                        tracing::warn!("Failed to kill pid {}: {}", handle.pid, e);
                        report.errors.push((handle.clone(), e.to_string()));
                    }
                }
            }
            thread::sleep(grace.min(SETTLE_LIMIT));
        }

        let mut names = self.names.clone();
        for handle in handles {
            if !names.iter().any(|n| name_matches(&handle.name, n)) {
                names.push(handle.name.clone());
            }
        }
        report.remaining = self.list_blocking_processes(&names);

        if report.is_clear() {
            tracing::info!("All lock-holding processes stopped");
        } else {
            tracing::warn!(
                count = report.remaining.len(),
                "Lock-holding processes still running"
            );
        }
        report
    }

    /// Terminate everything currently blocking and report what is left.
    pub fn clear(&self) -> TerminationReport {
        let blocking = self.list_blocking();
        if blocking.is_empty() {
            return TerminationReport::default();
        }
        self.terminate(&blocking, self.grace_period)
    }
}

impl std::fmt::Debug for ProcessGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessGuard")
            .field("names", &self.names)
            .field("grace_period", &self.grace_period)
            .field("poll_interval", &self.poll_interval)
            .finish()
    }
}
