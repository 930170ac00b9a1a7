//! The cleaning engine.
//!
//! A run goes `Idle -> Counting -> Cleaning -> {Completed | Cancelled | Failed}`
//! and back to `Idle`. At most one run is active at a time. Each run lives
//! on its own worker thread; progress and log lines stream back over a
//! channel and the final [`CleanSummary`] is returned when the run is
//! waited on.

mod cancel;
mod events;
mod plan;
mod run;
mod signout;
mod summary;

pub use cancel::CancelToken;
pub use events::{EngineEvent, LogLevel, LogRecord, ProgressEvent};
pub use plan::{plan_category, CategoryPlan, DeletionUnit, UnreadableEntry};
pub use signout::{find_credential_files, is_credential_file};
pub use summary::{CategorySummary, CleanSummary, RunFailure, RunState, SignOutSummary};

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use crate::config::Config;
use crate::error::{CleanRefusal, Result, SweeperError};
use crate::guard::ProcessGuard;
use crate::layout::{layout_by_id, ProjectLayout};
use crate::locations::ProfileLocations;
use crate::project::ProjectValidator;
use crate::rules::{CategorySet, CleanCategory, RuleSet, ScanBase};

use events::EventSink;
use run::Run;

/// Parameters of one cleaning run.
#[derive(Debug, Clone)]
pub struct CleanRequest {
    pub project: PathBuf,
    pub categories: CategorySet,
    /// The separate confirmation that sign-out requires
    pub sign_out_confirmed: bool,
    /// Stop lock-holding processes instead of failing the run
    pub terminate_lock_holders: bool,
}

impl CleanRequest {
    pub fn new(project: impl Into<PathBuf>, categories: CategorySet) -> Self {
        Self {
            project: project.into(),
            categories,
            sign_out_confirmed: false,
            terminate_lock_holders: false,
        }
    }

    pub fn confirm_sign_out(mut self) -> Self {
        self.sign_out_confirmed = true;
        self
    }

    pub fn terminate_lock_holders(mut self) -> Self {
        self.terminate_lock_holders = true;
        self
    }
}

/// A started run: its cancellation token, event stream and completion.
pub struct RunHandle {
    id: u64,
    cancel: CancelToken,
    events: Receiver<EngineEvent>,
    worker: JoinHandle<CleanSummary>,
    project: PathBuf,
}

impl RunHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Request cooperative cancellation.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// A token that cancels this run, for signal handlers and other threads.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn events(&self) -> &Receiver<EngineEvent> {
        &self.events
    }

    /// Block until the run reaches a terminal state.
    ///
    /// A worker that panicked still resolves to a `Failed` summary.
    pub fn wait(self) -> CleanSummary {
        match self.worker.join() {
            Ok(summary) => summary,
            Err(panic) => {
                let msg = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "worker panicked".to_string());
                tracing::error!("Run {} worker failed: {}", self.id, msg);

                let mut summary = CleanSummary::new(self.id, self.project);
                summary.state = RunState::Failed;
                summary.failure = Some(RunFailure::Internal(msg));
                summary
            }
        }
    }
}

/// Releases the engine's single-run slot when a run ends, however it ends.
struct ActiveSlot {
    active: Arc<AtomicBool>,
    state: Arc<Mutex<RunState>>,
}

impl Drop for ActiveSlot {
    fn drop(&mut self) {
        match self.state.lock() {
            Ok(mut state) => *state = RunState::Idle,
            Err(poisoned) => *poisoned.into_inner() = RunState::Idle,
        }
        self.active.store(false, Ordering::SeqCst);
    }
}

/// Orchestrates cleaning runs against one rule set.
pub struct CleaningEngine {
    rules: Arc<RuleSet>,
    validator: ProjectValidator,
    guard: Option<Arc<ProcessGuard>>,
    locations: ProfileLocations,
    credential_markers: Vec<String>,
    active: Arc<AtomicBool>,
    state: Arc<Mutex<RunState>>,
    next_id: AtomicU64,
}

impl CleaningEngine {
    /// Engine for the validator's layout, with its rule tables.
    pub fn new(validator: ProjectValidator, locations: ProfileLocations) -> Self {
        let rules = RuleSet::from_layout(validator.layout(), &[]);
        Self::with_rules(rules, validator, locations)
    }

    pub fn with_rules(
        rules: RuleSet,
        validator: ProjectValidator,
        locations: ProfileLocations,
    ) -> Self {
        let credential_markers = validator
            .layout()
            .credential_markers()
            .iter()
            .map(|m| m.to_lowercase())
            .collect();

        Self {
            rules: Arc::new(rules),
            validator,
            guard: None,
            locations,
            credential_markers,
            active: Arc::new(AtomicBool::new(false)),
            state: Arc::new(Mutex::new(RunState::Idle)),
            next_id: AtomicU64::new(1),
        }
    }

    /// Check for lock-holders before every run.
    pub fn with_guard(mut self, guard: ProcessGuard) -> Self {
        self.guard = Some(Arc::new(guard));
        self
    }

    /// Engine configured from `config`, guarding against live processes.
    pub fn from_config(config: &Config) -> Result<Self> {
        let layout: Arc<dyn ProjectLayout> = layout_by_id(&config.cleaner.layout)
            .map(Arc::<dyn ProjectLayout>::from)
            .ok_or_else(|| {
                SweeperError::Other(format!("unknown layout '{}'", config.cleaner.layout))
            })?;

        let rules = RuleSet::from_layout(layout.as_ref(), &config.cleaner.extra_protected);
        let validator = ProjectValidator::from_config(layout, &config.validator);

        Ok(Self::with_rules(rules, validator, config.profile_locations())
            .with_guard(ProcessGuard::system(&config.guard)))
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn validator(&self) -> &ProjectValidator {
        &self.validator
    }

    pub fn guard(&self) -> Option<&ProcessGuard> {
        self.guard.as_deref()
    }

    pub fn locations(&self) -> &ProfileLocations {
        &self.locations
    }

    pub fn state(&self) -> RunState {
        match self.state.lock() {
            Ok(state) => *state,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Count the units a run over `project` would delete, without deleting.
    pub fn count(&self, project: &Path, categories: &CategorySet) -> Vec<CategoryPlan> {
        categories
            .file_categories()
            .map(|category| {
                let base = match category.base() {
                    ScanBase::EditorData => self.locations.editor_data.as_path(),
                    _ => project,
                };
                plan_category(&self.rules, category, base, &CancelToken::new())
            })
            .collect()
    }

    /// Credential files a sign-out would remove.
    pub fn credential_files(&self) -> Vec<PathBuf> {
        find_credential_files(&self.locations.credential_roots, &self.credential_markers)
    }

    /// Start a run on a worker thread.
    ///
    /// Refusals happen before any state change and touch nothing on disk.
    pub fn start_clean(&self, request: CleanRequest) -> std::result::Result<RunHandle, CleanRefusal> {
        if request.categories.is_empty() {
            return Err(CleanRefusal::NoCategorySelected);
        }
        if request.categories.contains(CleanCategory::SignOut) && !request.sign_out_confirmed {
            return Err(CleanRefusal::SignOutNotConfirmed);
        }

        let validation = self.validator.validate(&request.project);
        if let Some(reason) = validation.reason {
            return Err(CleanRefusal::InvalidProject {
                path: request.project,
                reason,
            });
        }

        if self
            .active
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(CleanRefusal::RunActive);
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let cancel = CancelToken::new();
        let (tx, rx) = mpsc::channel();

        tracing::info!(
            run = id,
            categories = request.categories.len(),
            "Starting clean of {}",
            request.project.display()
        );

        let slot = ActiveSlot {
            active: Arc::clone(&self.active),
            state: Arc::clone(&self.state),
        };
        let run = Run {
            id,
            project: request.project.clone(),
            categories: request.categories,
            terminate_lock_holders: request.terminate_lock_holders,
            rules: Arc::clone(&self.rules),
            guard: self.guard.clone(),
            locations: self.locations.clone(),
            credential_markers: self.credential_markers.clone(),
            cancel: cancel.clone(),
            sink: EventSink::new(tx),
            state: Arc::clone(&self.state),
        };

        let worker = thread::spawn(move || {
            let _slot = slot;
            run.execute()
        });

        Ok(RunHandle {
            id,
            cancel,
            events: rx,
            worker,
            project: request.project,
        })
    }

    /// Request cancellation of `handle`'s run.
    pub fn cancel(&self, handle: &RunHandle) {
        tracing::info!("Cancelling run {}", handle.id());
        handle.cancel();
    }
}

impl std::fmt::Debug for CleaningEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CleaningEngine")
            .field("layout", &self.validator.layout().id())
            .field("locations", &self.locations)
            .field("state", &self.state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::test_support::create_unity_project;
    use std::fs;
    use tempfile::TempDir;

    fn engine(profile: &TempDir) -> CleaningEngine {
        CleaningEngine::new(
            ProjectValidator::unity(),
            ProfileLocations {
                editor_data: profile.path().join("Unity"),
                credential_roots: vec![profile.path().join("UnityHub")],
            },
        )
    }

    #[test]
    fn test_zero_categories_refused() {
        let profile = TempDir::new().unwrap();
        let project = create_unity_project();
        let engine = engine(&profile);

        let result = engine.start_clean(CleanRequest::new(project.path(), CategorySet::new()));

        assert!(matches!(result, Err(CleanRefusal::NoCategorySelected)));
        assert_eq!(engine.state(), RunState::Idle);
        assert!(!engine.is_active());
    }

    #[test]
    fn test_invalid_project_refused() {
        let profile = TempDir::new().unwrap();
        let project = create_unity_project();
        fs::remove_dir_all(project.path().join("Packages")).unwrap();
        let engine = engine(&profile);

        let result = engine.start_clean(CleanRequest::new(
            project.path(),
            CategorySet::new().with(CleanCategory::TemporaryFiles),
        ));

        assert!(matches!(result, Err(CleanRefusal::InvalidProject { .. })));
        assert!(!engine.is_active());
    }

    #[test]
    fn test_sign_out_needs_confirmation() {
        let profile = TempDir::new().unwrap();
        let project = create_unity_project();
        let engine = engine(&profile);
        let categories = CategorySet::new().with(CleanCategory::SignOut);

        let refused = engine.start_clean(CleanRequest::new(project.path(), categories.clone()));
        assert!(matches!(refused, Err(CleanRefusal::SignOutNotConfirmed)));

        let handle = engine
            .start_clean(CleanRequest::new(project.path(), categories).confirm_sign_out())
            .unwrap();
        assert_eq!(handle.wait().state, RunState::Completed);
    }

    #[test]
    fn test_second_run_rejected_while_active() {
        let profile = TempDir::new().unwrap();
        let project = create_unity_project();
        let engine = engine(&profile);
        // Hold the slot as a running worker would
        engine.active.store(true, Ordering::SeqCst);

        let result = engine.start_clean(CleanRequest::new(
            project.path(),
            CategorySet::new().with(CleanCategory::TemporaryFiles),
        ));
        assert!(matches!(result, Err(CleanRefusal::RunActive)));

        engine.active.store(false, Ordering::SeqCst);
        let handle = engine
            .start_clean(CleanRequest::new(
                project.path(),
                CategorySet::new().with(CleanCategory::TemporaryFiles),
            ))
            .unwrap();
        handle.wait();
    }

    #[test]
    fn test_engine_returns_to_idle_after_run() {
        let profile = TempDir::new().unwrap();
        let project = create_unity_project();
        fs::create_dir_all(project.path().join("Temp")).unwrap();
        fs::write(project.path().join("Temp/a.tmp"), "x").unwrap();
        let engine = engine(&profile);

        let handle = engine
            .start_clean(CleanRequest::new(
                project.path(),
                CategorySet::new().with(CleanCategory::TemporaryFiles),
            ))
            .unwrap();
        let summary = handle.wait();

        assert_eq!(summary.state, RunState::Completed);
        assert_eq!(summary.processed, 1);
        assert_eq!(engine.state(), RunState::Idle);
        assert!(!engine.is_active());

        // A new run is accepted with a fresh id
        let next = engine
            .start_clean(CleanRequest::new(
                project.path(),
                CategorySet::new().with(CleanCategory::TemporaryFiles),
            ))
            .unwrap();
        assert_eq!(next.id(), summary.run_id + 1);
        next.wait();
    }

    #[test]
    fn test_count_matches_plan() {
        let profile = TempDir::new().unwrap();
        let project = create_unity_project();
        fs::create_dir_all(project.path().join("Temp")).unwrap();
        fs::write(project.path().join("Temp/a.tmp"), "x").unwrap();
        let engine = engine(&profile);

        let plans = engine.count(
            project.path(),
            &CategorySet::new()
                .with(CleanCategory::TemporaryFiles)
                .with(CleanCategory::SignOut),
        );
        assert_eq!(plans.len(), 1);
        assert_eq!(plans[0].len(), 1);
        assert!(project.path().join("Temp/a.tmp").exists());
    }
}
