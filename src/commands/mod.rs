//! Subcommand implementations.

pub mod build;
pub mod clean;
pub mod discover;
pub mod processes;
pub mod recent;
pub mod status;
pub mod validate;

use anyhow::{anyhow, Result};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::Config;
use crate::layout::{layout_by_id, ProjectLayout};
use crate::project::{ProjectValidator, RecentProjects};

/// Precondition refusal or invalid input.
pub const EXIT_REFUSED: i32 = 2;
/// Lock-holding processes are still running.
pub const EXIT_LOCK_HOLDERS: i32 = 3;
/// The external build failed.
pub const EXIT_BUILD_FAILED: i32 = 4;
/// Completed, but some items were skipped.
pub const EXIT_PARTIAL: i32 = 5;
/// Cancelled by the user.
pub const EXIT_CANCELLED: i32 = 130;

/// Ask a yes/no question on stdin. Anything but `y` is no.
pub fn confirm(prompt: &str) -> Result<bool> {
    print!("{} [y/N] ", prompt);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().eq_ignore_ascii_case("y"))
}

/// Absolute form of a user-supplied path, or the path itself if it does
/// not resolve.
pub fn resolve(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

/// Validator for the configured layout.
pub fn validator(config: &Config) -> Result<ProjectValidator> {
    let layout: Arc<dyn ProjectLayout> = layout_by_id(&config.cleaner.layout)
        .map(Arc::<dyn ProjectLayout>::from)
        .ok_or_else(|| anyhow!("unknown layout '{}'", config.cleaner.layout))?;
    Ok(ProjectValidator::from_config(layout, &config.validator))
}

/// Put `project` at the front of the recent list.
///
/// Failing to save is not worth failing the command over.
pub fn remember(config: &Config, project: &Path) {
    let mut recent = RecentProjects::load(config.recent_file());
    recent.add(project);
    if let Err(e) = recent.save() {
        tracing::warn!("Failed to update recent projects: {}", e);
    }
}

fn plural(n: u64) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}
