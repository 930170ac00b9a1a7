//! Project root validation.

use serde::Serialize;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

use crate::config::ValidatorConfig;
use crate::layout::{ProjectLayout, UnityLayout};

use super::diagnostics::{collect_diagnostics, Diagnostic, DiagnosticOptions};

/// Why a directory is not a project root.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "kebab-case")]
pub enum InvalidReason {
    #[error("no path given")]
    EmptyPath,

    #[error("path does not exist")]
    NotFound,

    #[error("path is not a directory")]
    NotADirectory,

    #[error("cannot access path: {0}")]
    Inaccessible(String),

    #[error("missing required folder '{0}'")]
    MissingFolder(String),

    #[error("missing version marker '{0}'")]
    MissingVersionMarker(String),

    #[error("version marker '{0}' is empty")]
    EmptyVersionMarker(String),
}

/// Result of validating a candidate project root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    pub path: PathBuf,
    pub valid: bool,
    pub reason: Option<InvalidReason>,
    /// Editor version recorded in the version marker, when readable.
    pub editor_version: Option<String>,
    /// Informational findings. Only filled by [`ProjectValidator::inspect`].
    pub diagnostics: Vec<Diagnostic>,
}

/// Checks directories against a project layout.
///
/// Validation never mutates anything and never fails: an unreadable or
/// missing path is reported as invalid with a reason.
#[derive(Clone)]
pub struct ProjectValidator {
    layout: Arc<dyn ProjectLayout>,
    options: DiagnosticOptions,
}

impl ProjectValidator {
    pub fn new(layout: Arc<dyn ProjectLayout>, options: DiagnosticOptions) -> Self {
        Self { layout, options }
    }

    /// Validator for Unity projects with default diagnostic settings.
    pub fn unity() -> Self {
        Self::new(Arc::new(UnityLayout), DiagnosticOptions::default())
    }

    /// Validator configured from the `[validator]` section.
    pub fn from_config(layout: Arc<dyn ProjectLayout>, config: &ValidatorConfig) -> Self {
        Self::new(layout, DiagnosticOptions::from(config))
    }

    pub fn layout(&self) -> &dyn ProjectLayout {
        self.layout.as_ref()
    }

    /// Fast structural check, cheap enough to poll.
    pub fn is_project_root(&self, path: &Path) -> bool {
        self.check(path).is_ok()
    }

    /// Validate without diagnostics.
    pub fn validate(&self, path: &Path) -> ValidationResult {
        let reason = self.check(path).err();
        let editor_version = if reason.is_none() {
            self.editor_version(path)
        } else {
            None
        };

        ValidationResult {
            path: path.to_path_buf(),
            valid: reason.is_none(),
            reason,
            editor_version,
            diagnostics: Vec::new(),
        }
    }

    /// Validate and collect structural diagnostics.
    pub fn inspect(&self, path: &Path) -> ValidationResult {
        let mut result = self.validate(path);
        if path.is_dir() {
            result.diagnostics = collect_diagnostics(
                self.layout.as_ref(),
                path,
                result.editor_version.as_deref(),
                &self.options,
            );
        }
        result
    }

    /// Editor version recorded in the version marker.
    pub fn editor_version(&self, path: &Path) -> Option<String> {
        let content = fs::read_to_string(path.join(self.layout.version_marker())).ok()?;
        let key = self.layout.version_key();

        content
            .lines()
            .find_map(|line| line.trim().strip_prefix(key))
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn check(&self, path: &Path) -> Result<(), InvalidReason> {
        if path.as_os_str().is_empty() {
            return Err(InvalidReason::EmptyPath);
        }

        let metadata = fs::metadata(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => InvalidReason::NotFound,
            _ => InvalidReason::Inaccessible(e.to_string()),
        })?;

        if !metadata.is_dir() {
            return Err(InvalidReason::NotADirectory);
        }

        for folder in self.layout.required_folders() {
            if !path.join(folder).is_dir() {
                return Err(InvalidReason::MissingFolder(folder.to_string()));
            }
        }

        let marker = self.layout.version_marker();
        match fs::metadata(path.join(marker)) {
            Ok(m) if m.is_file() && m.len() > 0 => Ok(()),
            Ok(m) if m.is_file() => Err(InvalidReason::EmptyVersionMarker(marker.to_string())),
            _ => Err(InvalidReason::MissingVersionMarker(marker.to_string())),
        }
    }
}

impl std::fmt::Debug for ProjectValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProjectValidator")
            .field("layout", &self.layout.id())
            .field("options", &self.options)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::test_support::create_unity_project;
    use tempfile::TempDir;

    #[test]
    fn test_valid_project() {
        let tmp = create_unity_project();
        let result = ProjectValidator::unity().validate(tmp.path());

        assert!(result.valid);
        assert!(result.reason.is_none());
        assert_eq!(result.editor_version.as_deref(), Some("2022.3.10f1"));
        assert!(result.diagnostics.is_empty());
    }

    #[test]
    fn test_missing_packages_is_cited() {
        let tmp = create_unity_project();
        fs::remove_dir_all(tmp.path().join("Packages")).unwrap();

        let result = ProjectValidator::unity().validate(tmp.path());

        assert!(!result.valid);
        assert_eq!(
            result.reason,
            Some(InvalidReason::MissingFolder("Packages".to_string()))
        );
    }

    #[test]
    fn test_missing_library_is_invalid() {
        let tmp = create_unity_project();
        fs::remove_dir_all(tmp.path().join("Library")).unwrap();

        let result = ProjectValidator::unity().validate(tmp.path());
        assert_eq!(
            result.reason,
            Some(InvalidReason::MissingFolder("Library".to_string()))
        );
    }

    #[test]
    fn test_empty_version_marker() {
        let tmp = create_unity_project();
        fs::write(tmp.path().join("ProjectSettings/ProjectVersion.txt"), "").unwrap();

        let result = ProjectValidator::unity().validate(tmp.path());
        assert!(matches!(
            result.reason,
            Some(InvalidReason::EmptyVersionMarker(_))
        ));
    }

    #[test]
    fn test_missing_version_marker() {
        let tmp = create_unity_project();
        fs::remove_file(tmp.path().join("ProjectSettings/ProjectVersion.txt")).unwrap();

        let result = ProjectValidator::unity().validate(tmp.path());
        assert!(matches!(
            result.reason,
            Some(InvalidReason::MissingVersionMarker(_))
        ));
    }

    #[test]
    fn test_nonexistent_path() {
        let result = ProjectValidator::unity().validate(Path::new("/no/such/project/here"));
        assert!(!result.valid);
        assert_eq!(result.reason, Some(InvalidReason::NotFound));
    }

    #[test]
    fn test_file_is_not_a_directory() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("file.txt");
        fs::write(&file, "x").unwrap();

        let result = ProjectValidator::unity().validate(&file);
        assert_eq!(result.reason, Some(InvalidReason::NotADirectory));
    }

    #[test]
    fn test_empty_path() {
        let result = ProjectValidator::unity().validate(Path::new(""));
        assert_eq!(result.reason, Some(InvalidReason::EmptyPath));
    }

    #[test]
    fn test_validate_is_idempotent() {
        let tmp = create_unity_project();
        let validator = ProjectValidator::unity();

        assert_eq!(validator.validate(tmp.path()), validator.validate(tmp.path()));
        assert_eq!(validator.inspect(tmp.path()), validator.inspect(tmp.path()));
    }

    #[test]
    fn test_inspect_reports_missing_recommended_folders() {
        let tmp = create_unity_project();
        let result = ProjectValidator::unity().inspect(tmp.path());

        assert!(result.valid);
        assert!(result.diagnostics.iter().any(|d| matches!(
            d,
            Diagnostic::MissingRecommendedFolder { folder } if folder == "Assets/Audio"
        )));
    }

    #[test]
    fn test_editor_version_parsing_tolerates_extra_lines() {
        let tmp = create_unity_project();
        fs::write(
            tmp.path().join("ProjectSettings/ProjectVersion.txt"),
            "m_EditorVersion: 6000.0.23f1\nm_EditorVersionWithRevision: 6000.0.23f1 (1c4764c07fb4)\n",
        )
        .unwrap();

        let version = ProjectValidator::unity().editor_version(tmp.path());
        assert_eq!(version.as_deref(), Some("6000.0.23f1"));
    }
}
