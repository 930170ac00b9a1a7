//! Project layouts: the rule tables describing one kind of project.
//!
//! A layout is the single place where a project type's structure and its
//! safe/protected path tables live. Everything else (classification,
//! validation, cleaning) is driven from these tables.

mod unity;

pub use unity::UnityLayout;

/// A cache subtree that may be deleted recursively in one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheSubtree {
    /// Path relative to the project root.
    pub path: &'static str,
}

/// A directory whose immediate children must each contain a manifest file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManifestCheck {
    /// Directory to inspect, relative to the project root.
    pub dir: &'static str,
    /// File expected inside every immediate child directory.
    pub manifest: &'static str,
}

/// Trait for project layouts.
///
/// Implement this trait to add support for a new project type. The layout
/// is responsible for:
/// - Describing the folders that make a directory a project root
/// - Listing protected paths that must never be deleted
/// - Listing the per-category cache locations that may be cleaned
pub trait ProjectLayout: Send + Sync {
    /// Unique identifier for this layout (e.g., "unity").
    fn id(&self) -> &'static str;

    /// Human-readable name (e.g., "Unity").
    fn display_name(&self) -> &'static str;

    /// Folders that must all exist directly under the project root.
    fn required_folders(&self) -> &'static [&'static str];

    /// Non-empty marker file that must exist, relative to the root.
    fn version_marker(&self) -> &'static str;

    /// Key inside the version marker holding the editor version.
    fn version_key(&self) -> &'static str;

    /// Folders a tidy project usually has. Missing ones are diagnostics only.
    fn recommended_folders(&self) -> &'static [&'static str];

    /// Folder whose top level should not hold loose files.
    fn asset_root(&self) -> &'static str;

    /// File extension allowed to sit loose in the asset root.
    fn sidecar_extension(&self) -> &'static str;

    /// Paths protected in every category, relative to the scan base.
    fn protected_paths(&self) -> &'static [&'static str];

    /// Temporary-file roots, deleted file by file.
    fn temp_roots(&self) -> &'static [&'static str];

    /// Library roots, deleted file by file except for the cache subtrees.
    fn library_roots(&self) -> &'static [&'static str];

    /// Named caches deleted recursively as one unit.
    fn cache_subtrees(&self) -> &'static [CacheSubtree];

    /// Editor cache folder, relative to the editor data directory.
    fn editor_cache_roots(&self) -> &'static [&'static str];

    /// Case-insensitive file-name fragments identifying credential files.
    fn credential_markers(&self) -> &'static [&'static str];

    /// Manifest consistency check for a package cache, if the layout has one.
    fn manifest_check(&self) -> Option<ManifestCheck>;

    /// Folder excluded from large-file and empty-folder diagnostics.
    fn generated_root(&self) -> &'static str;
}

/// Look up a built-in layout by its identifier.
pub fn layout_by_id(id: &str) -> Option<Box<dyn ProjectLayout>> {
    match id {
        "unity" => Some(Box::new(UnityLayout)),
        _ => None,
    }
}

/// Identifiers of all built-in layouts.
pub fn layout_ids() -> Vec<&'static str> {
    vec![UnityLayout.id()]
}
