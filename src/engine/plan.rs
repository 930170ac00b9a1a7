//! Counting: turning the rule tables into an ordered list of deletion units.

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::rules::{relative_key, same_key, CleanCategory, Classification, RuleSet};

use super::cancel::CancelToken;

/// One step of deletion, counted as one unit of progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeletionUnit {
    /// A single file or symlink.
    File(PathBuf),
    /// A cache directory removed recursively.
    Subtree(PathBuf),
}

impl DeletionUnit {
    pub fn path(&self) -> &Path {
        match self {
            DeletionUnit::File(p) | DeletionUnit::Subtree(p) => p,
        }
    }
}

/// An entry the walk could not read, left out of the plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnreadableEntry {
    pub path: Option<PathBuf>,
    pub error: String,
}

impl std::fmt::Display for UnreadableEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.path {
            Some(path) => write!(f, "{}: {}", path.display(), self.error),
            None => write!(f, "{}", self.error),
        }
    }
}

/// The deletion units of one category, in walk order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryPlan {
    pub category: CleanCategory,
    pub units: Vec<DeletionUnit>,
    /// Cache subtrees that hold protected paths and fall back to per-file.
    pub downgraded: Vec<String>,
    /// Entries that could not be read while walking.
    pub unreadable: Vec<UnreadableEntry>,
}

impl CategoryPlan {
    pub fn len(&self) -> u64 {
        self.units.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

/// Build the plan for one file category rooted at `base`.
///
/// Only Safe paths become units. Protected directories are not descended
/// into. A configured cache subtree becomes a single unit only when it is
/// itself Safe and no protected rule lies inside it; otherwise its files
/// are planned one by one and the protected ones left out.
///
/// The walk stops early once `cancel` is set; the partial plan is returned
/// and must not be executed.
pub fn plan_category(
    rules: &RuleSet,
    category: CleanCategory,
    base: &Path,
    cancel: &CancelToken,
) -> CategoryPlan {
    let mut plan = CategoryPlan {
        category,
        units: Vec::new(),
        downgraded: Vec::new(),
        unreadable: Vec::new(),
    };

    let Some(table) = rules.category(category) else {
        return plan;
    };

    for root in &table.scan_roots {
        let dir = base.join(root);
        if !dir.is_dir() {
            tracing::debug!("Scan root not present: {}", dir.display());
            continue;
        }

        let mut walker = WalkDir::new(&dir)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter();

        while let Some(entry) = walker.next() {
            if cancel.is_cancelled() {
                tracing::debug!("Counting interrupted in {}", dir.display());
                return plan;
            }

            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    tracing::debug!("Skipping unreadable entry: {}", e);
                    plan.unreadable.push(UnreadableEntry {
                        path: e.path().map(Path::to_path_buf),
                        error: e.to_string(),
                    });
                    continue;
                }
            };

            let Some(rel) = relative_key(base, entry.path()) else {
                continue;
            };
            let class = rules.classify(&rel, category);

            if entry.file_type().is_dir() {
                if class == Classification::Protected {
                    tracing::trace!("Protected directory: {}", rel);
                    walker.skip_current_dir();
                    continue;
                }

                if table.subtrees.iter().any(|s| same_key(s, &rel)) {
                    let nested = rules.protected_within(&rel);
                    if class == Classification::Safe && nested.is_empty() {
                        plan.units.push(DeletionUnit::Subtree(entry.into_path()));
                        walker.skip_current_dir();
                    } else {
                        tracing::debug!(
                            protected = nested.len(),
                            "Cache {} holds protected paths, deleting per file",
                            rel
                        );
                        plan.downgraded.push(rel);
                    }
                }
                continue;
            }

            match class {
                Classification::Safe => plan.units.push(DeletionUnit::File(entry.into_path())),
                Classification::Protected => tracing::trace!("Protected: {}", rel),
                Classification::Unclassified => tracing::trace!("Unclassified: {}", rel),
            }
        }
    }

    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::UnityLayout;
    use crate::project::test_support::create_unity_project;
    use crate::rules::CategoryRules;
    use std::fs;

    fn unity_rules() -> RuleSet {
        RuleSet::from_layout(&UnityLayout, &[])
    }

    fn write(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "x").unwrap();
    }

    #[test]
    fn test_temp_files_planned_per_file() {
        let tmp = create_unity_project();
        write(tmp.path(), "Temp/a.tmp");
        write(tmp.path(), "Temp/sub/b.tmp");

        let plan = plan_category(
            &unity_rules(),
            CleanCategory::TemporaryFiles,
            tmp.path(),
            &CancelToken::new(),
        );

        assert_eq!(
            plan.units,
            vec![
                DeletionUnit::File(tmp.path().join("Temp/a.tmp")),
                DeletionUnit::File(tmp.path().join("Temp/sub/b.tmp")),
            ]
        );
    }

    #[test]
    fn test_cache_subtree_is_one_unit() {
        let tmp = create_unity_project();
        for i in 0..5 {
            write(tmp.path(), &format!("Library/ShaderCache/{}.bin", i));
        }

        let plan = plan_category(
            &unity_rules(),
            CleanCategory::LibraryCache,
            tmp.path(),
            &CancelToken::new(),
        );

        assert!(plan
            .units
            .contains(&DeletionUnit::Subtree(tmp.path().join("Library/ShaderCache"))));
        assert!(!plan
            .units
            .iter()
            .any(|u| u.path().starts_with(tmp.path().join("Library/ShaderCache/0.bin"))));
        assert!(plan.downgraded.is_empty());
    }

    #[test]
    fn test_protected_paths_never_planned() {
        let tmp = create_unity_project();
        write(tmp.path(), "Library/ScriptAssemblies/Game.dll");
        write(tmp.path(), "Library/misc.db");

        let plan = plan_category(
            &unity_rules(),
            CleanCategory::LibraryCache,
            tmp.path(),
            &CancelToken::new(),
        );
        let paths: Vec<&Path> = plan.units.iter().map(|u| u.path()).collect();

        assert!(paths.contains(&tmp.path().join("Library/misc.db").as_path()));
        assert!(!paths
            .iter()
            .any(|p| p.starts_with(tmp.path().join("Library/ScriptAssemblies"))));
    }

    #[test]
    fn test_subtree_with_protected_path_is_downgraded() {
        let tmp = create_unity_project();
        for i in 0..10 {
            write(tmp.path(), &format!("Library/ShaderCache/{}.bin", i));
        }
        write(tmp.path(), "Library/ShaderCache/keep/important.bin");

        let rules = RuleSet::from_layout(
            &UnityLayout,
            &["Library/ShaderCache/keep/important.bin".to_string()],
        );
        let plan = plan_category(
            &rules,
            CleanCategory::LibraryCache,
            tmp.path(),
            &CancelToken::new(),
        );

        assert_eq!(plan.downgraded, vec!["Library/ShaderCache".to_string()]);
        let shader_units: Vec<&DeletionUnit> = plan
            .units
            .iter()
            .filter(|u| u.path().starts_with(tmp.path().join("Library/ShaderCache")))
            .collect();
        assert_eq!(shader_units.len(), 10);
        assert!(shader_units.iter().all(|u| matches!(u, DeletionUnit::File(_))));
    }

    #[test]
    fn test_unclassified_files_excluded() {
        let tmp = create_unity_project();
        write(tmp.path(), "Cache/a.bin");
        write(tmp.path(), "Cache/unknown/b.bin");

        let rules = RuleSet::new().with_category(
            CategoryRules::new(CleanCategory::TemporaryFiles)
                .scan("Cache")
                .safe("Cache/a.bin"),
        );
        let plan = plan_category(
            &rules,
            CleanCategory::TemporaryFiles,
            tmp.path(),
            &CancelToken::new(),
        );

        assert_eq!(
            plan.units,
            vec![DeletionUnit::File(tmp.path().join("Cache/a.bin"))]
        );
    }

    #[test]
    fn test_missing_scan_root_is_empty() {
        let tmp = create_unity_project();
        let plan = plan_category(
            &unity_rules(),
            CleanCategory::TemporaryFiles,
            tmp.path(),
            &CancelToken::new(),
        );
        assert!(plan.is_empty());
    }

    #[test]
    fn test_plan_is_deterministic() {
        let tmp = create_unity_project();
        for name in ["z", "a", "m", "b"] {
            write(tmp.path(), &format!("Temp/{}.tmp", name));
        }

        let first = plan_category(
            &unity_rules(),
            CleanCategory::TemporaryFiles,
            tmp.path(),
            &CancelToken::new(),
        );
        let second = plan_category(
            &unity_rules(),
            CleanCategory::TemporaryFiles,
            tmp.path(),
            &CancelToken::new(),
        );
        assert_eq!(first, second);
        assert_eq!(first.units[0].path(), tmp.path().join("Temp/a.tmp"));
    }

    #[test]
    fn test_cache_subtree_matches_ignoring_case() {
        let tmp = create_unity_project();
        write(tmp.path(), "Library/shadercache/a.bin");
        write(tmp.path(), "Library/shadercache/b.bin");

        let plan = plan_category(
            &unity_rules(),
            CleanCategory::LibraryCache,
            tmp.path(),
            &CancelToken::new(),
        );

        assert!(plan
            .units
            .contains(&DeletionUnit::Subtree(tmp.path().join("Library/shadercache"))));
    }

    #[test]
    fn test_cancelled_walk_stops_early() {
        let tmp = create_unity_project();
        for i in 0..50 {
            write(tmp.path(), &format!("Temp/{}.tmp", i));
        }
        let cancel = CancelToken::new();
        cancel.cancel();

        let plan = plan_category(
            &unity_rules(),
            CleanCategory::TemporaryFiles,
            tmp.path(),
            &cancel,
        );

        assert!(plan.is_empty());
    }

    #[test]
    fn test_unreadable_directory_is_recorded() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = create_unity_project();
        write(tmp.path(), "Temp/a.tmp");
        write(tmp.path(), "Temp/locked/b.tmp");
        let locked = tmp.path().join("Temp/locked");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        // Permission bits do not stop a privileged user
        if fs::read_dir(&locked).is_ok() {
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let plan = plan_category(
            &unity_rules(),
            CleanCategory::TemporaryFiles,
            tmp.path(),
            &CancelToken::new(),
        );
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        assert_eq!(
            plan.units,
            vec![DeletionUnit::File(tmp.path().join("Temp/a.tmp"))]
        );
        assert_eq!(plan.unreadable.len(), 1);
        assert_eq!(plan.unreadable[0].path.as_deref(), Some(locked.as_path()));
    }
}
