//! Recently used projects, persisted one path per line.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::{Result, SweeperError};

/// Maximum number of remembered projects.
pub const MAX_RECENT_PROJECTS: usize = 10;

/// Most-recently-used-first list of project paths.
#[derive(Debug, Clone)]
pub struct RecentProjects {
    file: PathBuf,
    entries: Vec<PathBuf>,
}

impl RecentProjects {
    /// Load the list from `file`.
    ///
    /// Entries that no longer exist are dropped from memory only; the file
    /// keeps them until the next [`save`](Self::save). A missing or
    /// unreadable file yields an empty list.
    pub fn load(file: impl Into<PathBuf>) -> Self {
        let file = file.into();
        let content = match fs::read_to_string(&file) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => String::new(),
            Err(e) => {
                tracing::warn!("Failed to read recent projects '{}': {}", file.display(), e);
                String::new()
            }
        };

        let mut entries: Vec<PathBuf> = Vec::new();
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let path = PathBuf::from(line);
            if !path.exists() {
                tracing::debug!("Skipping missing recent project: {}", line);
                continue;
            }
            if !entries.contains(&path) {
                entries.push(path);
            }
        }
        entries.truncate(MAX_RECENT_PROJECTS);

        tracing::debug!(count = entries.len(), "Loaded recent projects");
        Self { file, entries }
    }

    pub fn file(&self) -> &Path {
        &self.file
    }

    pub fn entries(&self) -> &[PathBuf] {
        &self.entries
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.entries.iter().any(|p| p == path)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Move `path` to the front, evicting the oldest entry past the cap.
    pub fn add(&mut self, path: &Path) {
        self.entries.retain(|p| p != path);
        self.entries.insert(0, path.to_path_buf());
        self.entries.truncate(MAX_RECENT_PROJECTS);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Overwrite the file with the current list.
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.file.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| SweeperError::Io {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
            }
        }

        let mut content = String::new();
        for entry in &self.entries {
            content.push_str(&entry.to_string_lossy());
            content.push('\n');
        }

        fs::write(&self.file, content).map_err(|e| SweeperError::Io {
            path: self.file.clone(),
            source: e,
        })?;

        tracing::debug!(count = self.entries.len(), "Saved recent projects");
        Ok(())
    }
}
