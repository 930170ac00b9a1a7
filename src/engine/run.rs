//! One cleaning run, executed on the engine's worker thread.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::guard::ProcessGuard;
use crate::locations::ProfileLocations;
use crate::rules::{CategorySet, CleanCategory, RuleSet, ScanBase};

use super::cancel::CancelToken;
use super::events::EventSink;
use super::plan::{plan_category, CategoryPlan, DeletionUnit};
use super::signout::sign_out;
use super::summary::{CategorySummary, CleanSummary, RunFailure, RunState};

/// Everything a run needs, owned for its duration.
pub(crate) struct Run {
    pub id: u64,
    pub project: PathBuf,
    pub categories: CategorySet,
    pub terminate_lock_holders: bool,
    pub rules: Arc<RuleSet>,
    pub guard: Option<Arc<ProcessGuard>>,
    pub locations: ProfileLocations,
    pub credential_markers: Vec<String>,
    pub cancel: CancelToken,
    pub sink: EventSink,
    pub state: Arc<Mutex<RunState>>,
}

impl Run {
    /// Drive the run to a terminal state.
    pub fn execute(self) -> CleanSummary {
        let mut summary = CleanSummary::new(self.id, self.project.clone());

        self.enter(RunState::Counting, &mut summary);

        if let Err(failure) = self.clear_lock_holders(&mut summary) {
            self.sink.error(format!("Cleaning refused: {}", failure));
            summary.failure = Some(failure);
            return self.finish(RunState::Failed, summary);
        }

        let mut plans: Vec<CategoryPlan> = Vec::new();
        for category in self.categories.file_categories() {
            if self.cancel.is_cancelled() {
                return self.finish(RunState::Cancelled, summary);
            }
            let base = self.base_for(category);
            let plan = plan_category(&self.rules, category, &base, &self.cancel);
            if self.cancel.is_cancelled() {
                return self.finish(RunState::Cancelled, summary);
            }
            tracing::debug!(
                units = plan.len(),
                "Counted {} under {}",
                category,
                base.display()
            );
            plans.push(plan);
        }

        self.record_plans(&plans, &mut summary);

        let sign_out_requested = self.categories.contains(CleanCategory::SignOut);
        if summary.total == 0 && !sign_out_requested {
            self.sink.info("Nothing to clean");
            return self.finish(RunState::Completed, summary);
        }

        self.sink
            .info(format!("Found {} items to clean", summary.total));
        self.enter(RunState::Cleaning, &mut summary);
        self.sink.progress(0, summary.total);

        for (index, plan) in plans.iter().enumerate() {
            if !plan.is_empty() {
                self.sink.info(format!("Cleaning {}...", plan.category));
            }
            for path in &plan.downgraded {
                self.sink.info(format!(
                    "{} contains protected files, deleting file by file",
                    path
                ));
            }

            for unit in &plan.units {
                if self.cancel.is_cancelled() {
                    self.sink.info("Cleaning cancelled");
                    return self.finish(RunState::Cancelled, summary);
                }

                let outcome = delete_unit(unit);
                let counts = &mut summary.categories[index];
                match outcome {
                    Ok(()) => {
                        counts.deleted += 1;
                        summary.processed += 1;
                    }
                    Err(e) if e.kind() == ErrorKind::NotFound => {
                        counts.skipped += 1;
                        tracing::debug!("Already gone: {}", unit.path().display());
                    }
                    Err(e) => {
                        counts.skipped += 1;
                        self.sink.error(format!(
                            "Failed to delete {}: {}",
                            unit.path().display(),
                            e
                        ));
                    }
                }
                self.sink.progress(summary.processed, summary.total);
            }

            let counts = &summary.categories[index];
            if counts.attempted > 0 {
                self.sink.success(format!(
                    "{}: {} of {} deleted",
                    plan.category, counts.deleted, counts.attempted
                ));
            }
        }

        if sign_out_requested {
            if self.cancel.is_cancelled() {
                self.sink.info("Cleaning cancelled");
                return self.finish(RunState::Cancelled, summary);
            }
            self.sink.info("Signing out...");
            let result = sign_out(
                &self.locations.credential_roots,
                &self.credential_markers,
                &self.cancel,
                &self.sink,
            );
            let interrupted = result.interrupted;
            summary.sign_out = Some(result);
            if interrupted {
                self.sink.info("Cleaning cancelled");
                return self.finish(RunState::Cancelled, summary);
            }
        }

        self.finish(RunState::Completed, summary)
    }

    /// Fix the total and per-category counts, and log what the walk could
    /// not read.
    fn record_plans(&self, plans: &[CategoryPlan], summary: &mut CleanSummary) {
        summary.total = plans.iter().map(|p| p.len()).sum();
        summary.categories = plans
            .iter()
            .map(|p| {
                let mut c = CategorySummary::new(p.category);
                c.attempted = p.len();
                c.unreadable = p.unreadable.len() as u64;
                c.downgraded = p.downgraded.clone();
                c
            })
            .collect();

        for plan in plans {
            for entry in &plan.unreadable {
                self.sink.error(format!("{}: cannot read {}", plan.category, entry));
            }
        }
    }

    fn base_for(&self, category: CleanCategory) -> PathBuf {
        match category.base() {
            ScanBase::Project => self.project.clone(),
            ScanBase::EditorData => self.locations.editor_data.clone(),
            // Sign-out walks its own roots
            ScanBase::Profile => self.project.clone(),
        }
    }

    /// Make sure no lock-holder is alive, terminating them if allowed.
    fn clear_lock_holders(&self, summary: &mut CleanSummary) -> Result<(), RunFailure> {
        let Some(guard) = &self.guard else {
            return Ok(());
        };

        let blocking = guard.list_blocking();
        if blocking.is_empty() {
            return Ok(());
        }

        if !self.terminate_lock_holders {
            return Err(RunFailure::LockHolders(blocking));
        }

        self.sink.info(format!(
            "Stopping {} running editor processes",
            blocking.len()
        ));
        let report = guard.terminate(&blocking, guard.grace_period());
        let remaining = report.remaining.clone();
        summary.termination = Some(report);

        if remaining.is_empty() {
            Ok(())
        } else {
            Err(RunFailure::LockHolders(remaining))
        }
    }

    fn enter(&self, state: RunState, summary: &mut CleanSummary) {
        summary.state = state;
        if let Ok(mut shared) = self.state.lock() {
            *shared = state;
        }
        self.sink.state(state);
    }

    fn finish(&self, state: RunState, mut summary: CleanSummary) -> CleanSummary {
        self.enter(state, &mut summary);
        tracing::info!(
            run = summary.run_id,
            processed = summary.processed,
            total = summary.total,
            skipped = summary.skipped(),
            "Run finished: {:?}",
            state
        );
        summary
    }
}

fn delete_unit(unit: &DeletionUnit) -> std::io::Result<()> {
    match unit {
        DeletionUnit::File(path) => fs::remove_file(path),
        DeletionUnit::Subtree(path) => remove_subtree(path),
    }
}

fn remove_subtree(path: &Path) -> std::io::Result<()> {
    // A symlink in place of the cache dir is removed, never followed
    let meta = fs::symlink_metadata(path)?;
    if meta.file_type().is_symlink() {
        fs::remove_file(path)
    } else {
        fs::remove_dir_all(path)
    }
}
