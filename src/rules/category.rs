//! Cleaning categories.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// An independently selectable group of cache locations.
///
/// Declaration order is the fixed order in which a run processes them.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum CleanCategory {
    /// The project's `Temp` folder.
    TemporaryFiles,
    /// Regenerable data under `Library`.
    LibraryCache,
    /// The per-user editor cache, outside the project.
    EditorCache,
    /// Credential files in the user's profile.
    SignOut,
}

/// Where a category's relative paths are anchored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanBase {
    /// The selected project root.
    Project,
    /// The editor's per-user data directory.
    EditorData,
    /// The user's credential directories.
    Profile,
}

impl CleanCategory {
    /// All categories in processing order.
    pub const ALL: [CleanCategory; 4] = [
        CleanCategory::TemporaryFiles,
        CleanCategory::LibraryCache,
        CleanCategory::EditorCache,
        CleanCategory::SignOut,
    ];

    /// Short identifier used on the command line and in config.
    pub fn id(&self) -> &'static str {
        match self {
            CleanCategory::TemporaryFiles => "temp",
            CleanCategory::LibraryCache => "library",
            CleanCategory::EditorCache => "editor",
            CleanCategory::SignOut => "sign-out",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            CleanCategory::TemporaryFiles => "Temporary Files",
            CleanCategory::LibraryCache => "Library Cache",
            CleanCategory::EditorCache => "Editor Cache",
            CleanCategory::SignOut => "Sign Out",
        }
    }

    /// Whether this category contributes to the file total of a run.
    pub fn counts_files(&self) -> bool {
        !matches!(self, CleanCategory::SignOut)
    }

    pub fn base(&self) -> ScanBase {
        match self {
            CleanCategory::TemporaryFiles | CleanCategory::LibraryCache => ScanBase::Project,
            CleanCategory::EditorCache => ScanBase::EditorData,
            CleanCategory::SignOut => ScanBase::Profile,
        }
    }

    /// Parse a category from its identifier.
    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.id() == id)
    }
}

impl fmt::Display for CleanCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// A set of selected categories, iterated in processing order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategorySet {
    inner: BTreeSet<CleanCategory>,
}

impl CategorySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, category: CleanCategory) -> bool {
        self.inner.insert(category)
    }

    pub fn with(mut self, category: CleanCategory) -> Self {
        self.inner.insert(category);
        self
    }

    pub fn contains(&self, category: CleanCategory) -> bool {
        self.inner.contains(&category)
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Categories in processing order.
    pub fn iter(&self) -> impl Iterator<Item = CleanCategory> + '_ {
        self.inner.iter().copied()
    }

    /// Selected categories that delete files, in processing order.
    pub fn file_categories(&self) -> impl Iterator<Item = CleanCategory> + '_ {
        self.iter().filter(|c| c.counts_files())
    }
}

impl FromIterator<CleanCategory> for CategorySet {
    fn from_iter<I: IntoIterator<Item = CleanCategory>>(iter: I) -> Self {
        Self {
            inner: iter.into_iter().collect(),
        }
    }
}
