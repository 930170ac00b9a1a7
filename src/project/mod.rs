//! Project validation and discovery.
//!
//! This module provides:
//! - Structural validation of a project root, with optional diagnostics
//! - The recently used projects list
//! - Discovery of projects in conventional folders

mod diagnostics;
mod discovery;
mod recent;
mod validator;

pub use diagnostics::{is_manifest_cache_corrupted, Diagnostic, DiagnosticOptions};
pub use discovery::{DiscoveryOptions, ProjectDiscovery};
pub use recent::{RecentProjects, MAX_RECENT_PROJECTS};
pub use validator::{InvalidReason, ProjectValidator, ValidationResult};

#[cfg(test)]
pub(crate) mod test_support {
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    /// Lay out a minimal valid Unity project at `root`.
    pub fn populate_unity_project(root: &Path) {
        fs::create_dir_all(root.join("Assets/Scenes")).unwrap();
        fs::write(root.join("Assets/Scenes/Main.unity"), "%YAML 1.1").unwrap();
        fs::create_dir_all(root.join("Packages")).unwrap();
        fs::write(root.join("Packages/manifest.json"), "{}").unwrap();
        fs::create_dir_all(root.join("ProjectSettings")).unwrap();
        fs::write(
            root.join("ProjectSettings/ProjectVersion.txt"),
            "m_EditorVersion: 2022.3.10f1\n",
        )
        .unwrap();
        fs::create_dir_all(root.join("Library")).unwrap();
        fs::write(root.join("Library/LastSceneManagerSetup.txt"), "scene").unwrap();
    }

    pub fn create_unity_project() -> TempDir {
        let tmp = TempDir::new().unwrap();
        populate_unity_project(tmp.path());
        tmp
    }
}
