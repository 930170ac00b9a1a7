//! Searching conventional folders for projects.

use rayon::prelude::*;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::recent::RecentProjects;
use super::validator::ProjectValidator;

/// Options for discovery.
#[derive(Debug, Clone)]
pub struct DiscoveryOptions {
    /// Maximum directory depth below each search path.
    pub max_depth: usize,
    /// Whether to follow symbolic links.
    pub follow_symlinks: bool,
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self {
            max_depth: 4,
            follow_symlinks: false,
        }
    }
}

/// Finds project roots below a set of search paths.
pub struct ProjectDiscovery {
    validator: ProjectValidator,
    options: DiscoveryOptions,
}

impl ProjectDiscovery {
    pub fn new(validator: ProjectValidator, options: DiscoveryOptions) -> Self {
        Self { validator, options }
    }

    /// Projects under `search_paths` that are not already in `recent`.
    ///
    /// Each search path is scanned independently; one that is missing or
    /// unreadable contributes nothing and does not stop the others.
    pub fn discover(&self, search_paths: &[PathBuf], recent: &RecentProjects) -> Vec<PathBuf> {
        let per_path: Vec<Vec<PathBuf>> = search_paths
            .par_iter()
            .map(|root| self.scan(root))
            .collect();

        let mut seen: HashSet<PathBuf> = recent.entries().iter().map(|p| identity(p)).collect();
        let mut found = Vec::new();

        for path in per_path.into_iter().flatten() {
            if seen.insert(identity(&path)) {
                found.push(path);
            }
        }

        tracing::info!(count = found.len(), "Discovered projects");
        found
    }

    /// Project roots below one search path, without descending into them.
    pub fn scan(&self, root: &Path) -> Vec<PathBuf> {
        if !root.is_dir() {
            tracing::debug!("Search path not available: {}", root.display());
            return Vec::new();
        }

        let mut projects = Vec::new();
        let mut walker = WalkDir::new(root)
            .max_depth(self.options.max_depth)
            .follow_links(self.options.follow_symlinks)
            .sort_by_file_name()
            .into_iter();

        while let Some(entry) = walker.next() {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    tracing::debug!("Skipping unreadable entry under {}: {}", root.display(), e);
                    continue;
                }
            };

            if !entry.file_type().is_dir() {
                continue;
            }

            if self.validator.is_project_root(entry.path()) {
                projects.push(entry.path().to_path_buf());
                // Don't recurse into this project
                walker.skip_current_dir();
            }
        }

        tracing::debug!(
            count = projects.len(),
            "Found projects in {}",
            root.display()
        );
        projects
    }
}

fn identity(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}
