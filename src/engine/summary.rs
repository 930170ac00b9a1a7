//! Run states and the end-of-run summary.

use serde::Serialize;
use std::path::PathBuf;

use crate::guard::{ProcessHandle, TerminationReport};
use crate::rules::CleanCategory;

/// Engine state machine.
///
/// `Idle -> Counting -> Cleaning -> {Completed | Cancelled | Failed} -> Idle`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    Idle,
    Counting,
    Cleaning,
    Completed,
    Cancelled,
    Failed,
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunState::Completed | RunState::Cancelled | RunState::Failed
        )
    }
}

/// Why a run ended in [`RunState::Failed`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "kebab-case")]
pub enum RunFailure {
    /// Lock-holding processes are still running; nothing was deleted.
    LockHolders(Vec<ProcessHandle>),
    /// The run worker stopped unexpectedly.
    Internal(String),
}

impl std::fmt::Display for RunFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunFailure::LockHolders(handles) => {
                let names: Vec<String> = handles
                    .iter()
                    .map(|h| format!("{} (pid {})", h.name, h.pid))
                    .collect();
                write!(f, "processes still running: {}", names.join(", "))
            }
            RunFailure::Internal(msg) => write!(f, "internal error: {}", msg),
        }
    }
}

/// Per-category unit counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategorySummary {
    pub category: CleanCategory,
    /// Units counted for deletion
    pub attempted: u64,
    /// Units removed
    pub deleted: u64,
    /// Units that failed or had already vanished
    pub skipped: u64,
    /// Entries that could not be read while counting
    pub unreadable: u64,
    /// Cache subtrees deleted file by file because they held protected paths
    pub downgraded: Vec<String>,
}

impl CategorySummary {
    pub fn new(category: CleanCategory) -> Self {
        Self {
            category,
            attempted: 0,
            deleted: 0,
            skipped: 0,
            unreadable: 0,
            downgraded: Vec::new(),
        }
    }
}

/// Outcome of the sign-out action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SignOutSummary {
    /// Credential files found
    pub matched: u64,
    /// Credential files removed
    pub deleted: u64,
    /// Credential files that could not be removed
    pub failed: u64,
    /// Stopped early by cancellation
    pub interrupted: bool,
}

/// What a run attempted, what succeeded and what was skipped.
///
/// Produced for every run, whatever its terminal state.
#[derive(Debug, Clone, Serialize)]
pub struct CleanSummary {
    pub run_id: u64,
    pub project: PathBuf,
    pub state: RunState,
    /// Units counted before any deletion
    pub total: u64,
    /// Units deleted so far
    pub processed: u64,
    pub categories: Vec<CategorySummary>,
    pub sign_out: Option<SignOutSummary>,
    /// Lock-holder termination, when one was attempted
    pub termination: Option<TerminationReport>,
    pub failure: Option<RunFailure>,
}

impl CleanSummary {
    pub fn new(run_id: u64, project: PathBuf) -> Self {
        Self {
            run_id,
            project,
            state: RunState::Idle,
            total: 0,
            processed: 0,
            categories: Vec::new(),
            sign_out: None,
            termination: None,
            failure: None,
        }
    }

    pub fn category(&self, category: CleanCategory) -> Option<&CategorySummary> {
        self.categories.iter().find(|c| c.category == category)
    }

    /// Units skipped or left unread across all categories, plus failed
    /// credential files.
    pub fn skipped(&self) -> u64 {
        let files: u64 = self.categories.iter().map(|c| c.skipped + c.unreadable).sum();
        files + self.sign_out.as_ref().map(|s| s.failed).unwrap_or(0)
    }

    /// Completed, but something was left behind.
    pub fn is_partial(&self) -> bool {
        self.state == RunState::Completed && self.skipped() > 0
    }

    /// One line per category for display.
    pub fn lines(&self) -> Vec<String> {
        let mut lines: Vec<String> = self
            .categories
            .iter()
            .map(|c| {
                let mut line = format!(
                    "{}: {} attempted, {} deleted, {} skipped",
                    c.category, c.attempted, c.deleted, c.skipped
                );
                if c.unreadable > 0 {
                    line.push_str(&format!(", {} unreadable", c.unreadable));
                }
                line
            })
            .collect();

        if let Some(sign_out) = &self.sign_out {
            lines.push(format!(
                "{}: {} credential files found, {} deleted, {} failed",
                CleanCategory::SignOut,
                sign_out.matched,
                sign_out.deleted,
                sign_out.failed
            ));
        }
        lines
    }
}
