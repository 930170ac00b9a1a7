//! Well-known per-user directories the engine reads outside the project.

use std::path::PathBuf;

/// Used only when the platform cannot report a special folder.
pub const FALLBACK_ROOT: &str = "/tmp/unity-sweeper";

/// Editor data and credential locations for the current user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileLocations {
    /// Editor data directory; the editor cache lives beneath it.
    pub editor_data: PathBuf,
    /// Directories searched for credential files on sign-out.
    pub credential_roots: Vec<PathBuf>,
}

impl ProfileLocations {
    /// Resolve the locations from platform special-folder lookups.
    pub fn detect() -> Self {
        let local = dirs::data_local_dir().unwrap_or_else(fallback);
        let roaming = dirs::config_dir().unwrap_or_else(fallback);

        Self {
            editor_data: local.join("Unity"),
            credential_roots: vec![
                roaming.join("Unity"),
                local.join("Unity"),
                roaming.join("UnityHub"),
            ],
        }
    }

    /// Apply overrides from configuration.
    pub fn with_overrides(
        mut self,
        editor_data: Option<PathBuf>,
        credential_roots: &[PathBuf],
    ) -> Self {
        if let Some(editor_data) = editor_data {
            self.editor_data = editor_data;
        }
        if !credential_roots.is_empty() {
            self.credential_roots = credential_roots.to_vec();
        }
        self
    }
}

impl Default for ProfileLocations {
    fn default() -> Self {
        Self::detect()
    }
}

fn fallback() -> PathBuf {
    tracing::warn!("Special folder lookup failed, using {}", FALLBACK_ROOT);
    PathBuf::from(FALLBACK_ROOT)
}

/// Default file holding the recent-projects list.
pub fn recent_projects_file() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(fallback)
        .join("unity-sweeper")
        .join("recent_projects.txt")
}

/// Conventional folders where projects are usually kept.
pub fn default_search_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Some(docs) = dirs::document_dir() {
        paths.push(docs.join("Unity Projects"));
        paths.push(docs);
    }
    if let Some(home) = dirs::home_dir() {
        paths.push(home.join("Unity Projects"));
    }

    paths
}
