//! Unity project layout.

use super::{CacheSubtree, ManifestCheck, ProjectLayout};

/// Layout for Unity editor projects.
///
/// The protected table is the union of every path any version of the
/// cleaner has ever protected, `Library/ScriptAssemblies` included.
pub struct UnityLayout;

impl ProjectLayout for UnityLayout {
    fn id(&self) -> &'static str {
        "unity"
    }

    fn display_name(&self) -> &'static str {
        "Unity"
    }

    fn required_folders(&self) -> &'static [&'static str] {
        &["Assets", "Packages", "ProjectSettings", "Library"]
    }

    fn version_marker(&self) -> &'static str {
        "ProjectSettings/ProjectVersion.txt"
    }

    fn version_key(&self) -> &'static str {
        "m_EditorVersion:"
    }

    fn recommended_folders(&self) -> &'static [&'static str] {
        &[
            "Assets/Animations",
            "Assets/Audio",
            "Assets/Materials",
            "Assets/Prefabs",
            "Assets/Resources",
            "Assets/Scenes",
            "Assets/Scripts",
            "Assets/Sprites",
            "Assets/UI",
        ]
    }

    fn asset_root(&self) -> &'static str {
        "Assets"
    }

    fn sidecar_extension(&self) -> &'static str {
        "meta"
    }

    fn protected_paths(&self) -> &'static [&'static str] {
        &[
            "ProjectSettings",
            "Assets",
            "Packages",
            "Library/LastSceneManagerSetup.txt",
            "Library/EditorUserBuildSettings.asset",
            "Library/BuildPlayer.prefs",
            "Library/assetservercachev3",
            "Library/unity default resources",
            "Library/unity editor resources",
            "Library/ScriptMapper",
            "Library/ScriptAssemblies",
        ]
    }

    fn temp_roots(&self) -> &'static [&'static str] {
        &["Temp"]
    }

    fn library_roots(&self) -> &'static [&'static str] {
        &["Library"]
    }

    fn cache_subtrees(&self) -> &'static [CacheSubtree] {
        &[
            CacheSubtree { path: "Library/ShaderCache" },
            CacheSubtree { path: "Library/TempArtifacts" },
            CacheSubtree { path: "Library/BuildCache" },
            CacheSubtree { path: "Library/ArtifactDB" },
            CacheSubtree { path: "Library/SourceAssetDB" },
            CacheSubtree { path: "Library/APIUpdater" },
            CacheSubtree { path: "Library/BurstCache" },
            CacheSubtree { path: "Library/PackageCache" },
        ]
    }

    fn editor_cache_roots(&self) -> &'static [&'static str] {
        &["Editor"]
    }

    fn credential_markers(&self) -> &'static [&'static str] {
        &["unity.sso", "accesstoken", "refreshtoken", "credentials"]
    }

    fn manifest_check(&self) -> Option<ManifestCheck> {
        Some(ManifestCheck {
            dir: "Library/PackageCache",
            manifest: "package.json",
        })
    }

    fn generated_root(&self) -> &'static str {
        "Library"
    }
}
