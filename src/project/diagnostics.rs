//! Informational project diagnostics.

use humansize::{format_size, BINARY};
use serde::Serialize;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::ValidatorConfig;
use crate::layout::ProjectLayout;

/// Settings for the diagnostic pass.
#[derive(Debug, Clone)]
pub struct DiagnosticOptions {
    /// Files strictly larger than this are reported.
    pub large_file_threshold: u64,
    /// Maximum entries per diagnostic kind.
    pub limit: usize,
    /// Where editors are installed, one folder per version.
    pub editor_install_root: Option<PathBuf>,
}

impl Default for DiagnosticOptions {
    fn default() -> Self {
        Self::from(&ValidatorConfig::default())
    }
}

impl From<&ValidatorConfig> for DiagnosticOptions {
    fn from(config: &ValidatorConfig) -> Self {
        Self {
            large_file_threshold: config.large_file_threshold,
            limit: config.diagnostic_limit,
            editor_install_root: config.editor_install_root.clone(),
        }
    }
}

/// A non-fatal finding about a project's structure.
///
/// Paths are relative to the project root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Diagnostic {
    MissingRecommendedFolder { folder: String },
    LooseAssetFile { path: PathBuf },
    CorruptedPackageCache { dir: PathBuf },
    EditorVersionNotInstalled { version: String, expected: PathBuf },
    LargeFile { path: PathBuf, size: u64 },
    EmptyFolder { path: PathBuf },
}

impl Diagnostic {
    pub fn message(&self) -> String {
        match self {
            Diagnostic::MissingRecommendedFolder { folder } => {
                format!("Recommended folder missing: {}", folder)
            }
            Diagnostic::LooseAssetFile { path } => {
                format!("Loose file in asset root: {}", path.display())
            }
            Diagnostic::CorruptedPackageCache { dir } => {
                format!("Package cache might be corrupted: {}", dir.display())
            }
            Diagnostic::EditorVersionNotInstalled { version, expected } => format!(
                "Editor version {} is not installed (expected {})",
                version,
                expected.display()
            ),
            Diagnostic::LargeFile { path, size } => format!(
                "Large file: {} ({})",
                path.display(),
                format_size(*size, BINARY)
            ),
            Diagnostic::EmptyFolder { path } => format!("Empty folder: {}", path.display()),
        }
    }

    pub fn recommendation(&self) -> &'static str {
        match self {
            Diagnostic::MissingRecommendedFolder { .. } => {
                "Consider organizing assets into conventional folders"
            }
            Diagnostic::LooseAssetFile { .. } => {
                "Move files out of the asset root into appropriate subfolders"
            }
            Diagnostic::CorruptedPackageCache { .. } => {
                "Clean the library cache and let the editor rebuild it"
            }
            Diagnostic::EditorVersionNotInstalled { .. } => {
                "Ensure everyone on the project uses the same editor version"
            }
            Diagnostic::LargeFile { .. } => "Consider asset bundles or splitting large assets",
            Diagnostic::EmptyFolder { .. } => "Remove empty folders or add a .keep file",
        }
    }
}

/// Check a package-cache style directory for consistency.
///
/// Corrupted when any immediate child directory lacks `manifest`. A missing
/// directory is not corrupted; one that exists but cannot be read is.
pub fn is_manifest_cache_corrupted(dir: &Path, manifest: &str) -> bool {
    match fs::metadata(dir) {
        Err(e) if e.kind() == ErrorKind::NotFound => return false,
        Err(_) => return true,
        Ok(m) if !m.is_dir() => return false,
        Ok(_) => {}
    }

    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(_) => return true,
    };

    for entry in entries {
        let entry = match entry {
            Ok(e) => e,
            Err(_) => return true,
        };
        let path = entry.path();
        if path.is_dir() && !path.join(manifest).is_file() {
            return true;
        }
    }

    false
}

/// Run every diagnostic for a project directory.
pub fn collect_diagnostics(
    layout: &dyn ProjectLayout,
    root: &Path,
    editor_version: Option<&str>,
    options: &DiagnosticOptions,
) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    for folder in layout.recommended_folders() {
        if !root.join(folder).is_dir() {
            diagnostics.push(Diagnostic::MissingRecommendedFolder {
                folder: folder.to_string(),
            });
        }
    }

    diagnostics.extend(loose_asset_files(layout, root, options.limit));

    if let Some(check) = layout.manifest_check() {
        if is_manifest_cache_corrupted(&root.join(check.dir), check.manifest) {
            diagnostics.push(Diagnostic::CorruptedPackageCache {
                dir: PathBuf::from(check.dir),
            });
        }
    }

    if let (Some(install_root), Some(version)) = (&options.editor_install_root, editor_version) {
        if install_root.is_dir() {
            let expected = install_root.join(version);
            if !expected.is_dir() {
                diagnostics.push(Diagnostic::EditorVersionNotInstalled {
                    version: version.to_string(),
                    expected,
                });
            }
        }
    }

    diagnostics.extend(tree_diagnostics(layout, root, options));

    tracing::debug!(
        path = %root.display(),
        count = diagnostics.len(),
        "Collected project diagnostics"
    );

    diagnostics
}

fn loose_asset_files(layout: &dyn ProjectLayout, root: &Path, limit: usize) -> Vec<Diagnostic> {
    let asset_root = root.join(layout.asset_root());
    let entries = match fs::read_dir(&asset_root) {
        Ok(entries) => entries,
        Err(_) => return Vec::new(),
    };

    let mut files: Vec<PathBuf> = entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.is_file())
        .filter(|p| {
            p.extension()
                .map(|ext| ext != layout.sidecar_extension())
                .unwrap_or(true)
        })
        .collect();
    files.sort();

    files
        .into_iter()
        .take(limit)
        .filter_map(|p| p.strip_prefix(root).ok().map(Path::to_path_buf))
        .map(|path| Diagnostic::LooseAssetFile { path })
        .collect()
}

/// Large files and empty folders, skipping the generated cache root.
fn tree_diagnostics(
    layout: &dyn ProjectLayout,
    root: &Path,
    options: &DiagnosticOptions,
) -> Vec<Diagnostic> {
    let generated = root.join(layout.generated_root());
    let mut large = Vec::new();
    let mut empty = Vec::new();

    let walker = WalkDir::new(root)
        .min_depth(1)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.path() != generated);

    for entry in walker.flatten() {
        let rel = match entry.path().strip_prefix(root) {
            Ok(rel) => rel.to_path_buf(),
            Err(_) => continue,
        };

        if entry.file_type().is_file() {
            if large.len() >= options.limit {
                continue;
            }
            if let Ok(metadata) = entry.metadata() {
                if metadata.len() > options.large_file_threshold {
                    large.push(Diagnostic::LargeFile {
                        path: rel,
                        size: metadata.len(),
                    });
                }
            }
        } else if entry.file_type().is_dir() && empty.len() < options.limit {
            let is_empty = fs::read_dir(entry.path())
                .map(|mut rd| rd.next().is_none())
                .unwrap_or(false);
            if is_empty {
                empty.push(Diagnostic::EmptyFolder { path: rel });
            }
        }
    }

    large.extend(empty);
    large
}
