use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;
use crate::layout::layout_by_id;
use crate::locations::ProfileLocations;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub cleaner: CleanerConfig,
    pub validator: ValidatorConfig,
    pub guard: GuardConfig,
    pub discovery: DiscoveryConfig,
    pub build: BuildConfig,
    pub locations: LocationsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanerConfig {
    /// Project layout: unity
    pub layout: String,
    /// Extra protected paths, relative to the project root
    pub extra_protected: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorConfig {
    /// Files above this size are reported (bytes)
    pub large_file_threshold: u64,
    /// Maximum entries reported per diagnostic kind
    pub diagnostic_limit: usize,
    /// Directory holding installed editors, one folder per version
    pub editor_install_root: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardConfig {
    /// Process names that may hold locks on a project
    pub process_names: Vec<String>,
    /// Seconds to wait for a graceful exit before killing
    pub grace_period_secs: u64,
    /// Milliseconds between liveness checks while waiting
    pub poll_interval_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Directories searched for projects (empty = platform defaults)
    pub search_paths: Vec<PathBuf>,
    /// Maximum search depth below each directory
    pub max_depth: usize,
    /// Recent projects file (default: data dir)
    pub recent_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Build command and arguments, run from the project root
    pub command: Vec<String>,
    /// Artifact that must exist after a successful build, relative to the project
    pub artifact: PathBuf,
    /// Directory for build logs
    pub log_dir: PathBuf,
    /// Number of build log pairs kept
    pub keep_logs: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationsConfig {
    /// Editor data directory override
    pub editor_data: Option<PathBuf>,
    /// Credential directories override
    pub credential_roots: Vec<PathBuf>,
}

impl Default for CleanerConfig {
    fn default() -> Self {
        Self {
            layout: "unity".to_string(),
            extra_protected: vec![],
        }
    }
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            large_file_threshold: 100 * 1024 * 1024, // 100 MB
            diagnostic_limit: 5,
            editor_install_root: None,
        }
    }
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            process_names: vec![
                "Unity".to_string(),
                "Unity Hub".to_string(),
                "UnityCrashHandler".to_string(),
            ],
            grace_period_secs: 5,
            poll_interval_ms: 100,
        }
    }
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            search_paths: vec![],
            max_depth: 4,
            recent_file: None,
        }
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            command: vec!["./build.sh".to_string()],
            artifact: PathBuf::from("Build/Game"),
            log_dir: PathBuf::from("logs"),
            keep_logs: 10,
        }
    }
}

impl GuardConfig {
    pub fn grace_period(&self) -> Duration {
        Duration::from_secs(self.grace_period_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Config {
    /// Load configuration from `path`, or from the default location.
    ///
    /// An explicit path must exist. A missing default file yields defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => match Self::default_path() {
                Some(p) if p.exists() => p,
                _ => return Ok(Self::default()),
            },
        };

        let content = fs::read_to_string(&path).map_err(|e| ConfigError::ReadError {
            path: path.clone(),
            source: e,
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.clone(),
            source: e,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// `$XDG_CONFIG_HOME/unity-sweeper/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("unity-sweeper").join("config.toml"))
    }

    /// Reject settings the engine cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if layout_by_id(&self.cleaner.layout).is_none() {
            return Err(ConfigError::Invalid(format!(
                "unknown layout '{}'",
                self.cleaner.layout
            )));
        }

        for entry in &self.cleaner.extra_protected {
            let trimmed = entry.trim();
            if trimmed.is_empty() || trimmed.split(['/', '\\']).any(|seg| seg == "..") {
                return Err(ConfigError::Invalid(format!(
                    "protected path '{}' must be a non-empty path inside the project",
                    entry
                )));
            }
        }

        if self.validator.diagnostic_limit == 0 {
            return Err(ConfigError::Invalid(
                "diagnostic_limit must be at least 1".into(),
            ));
        }

        if self.guard.grace_period_secs == 0 {
            return Err(ConfigError::Invalid(
                "grace_period_secs must be positive".into(),
            ));
        }

        if self.guard.process_names.iter().any(|n| n.trim().is_empty()) {
            return Err(ConfigError::Invalid("process names must not be empty".into()));
        }

        if self.build.command.is_empty() || self.build.command[0].trim().is_empty() {
            return Err(ConfigError::Invalid("build command must not be empty".into()));
        }

        if self.build.keep_logs == 0 {
            return Err(ConfigError::Invalid("keep_logs must be at least 1".into()));
        }

        Ok(())
    }

    /// Profile locations with configured overrides applied.
    pub fn profile_locations(&self) -> ProfileLocations {
        ProfileLocations::detect().with_overrides(
            self.locations.editor_data.clone(),
            &self.locations.credential_roots,
        )
    }

    /// Recent projects file, configured or default.
    pub fn recent_file(&self) -> PathBuf {
        self.discovery
            .recent_file
            .clone()
            .unwrap_or_else(crate::locations::recent_projects_file)
    }

    /// Project search directories, configured or platform defaults.
    pub fn search_paths(&self) -> Vec<PathBuf> {
        if self.discovery.search_paths.is_empty() {
            crate::locations::default_search_paths()
        } else {
            self.discovery.search_paths.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.guard.grace_period(), Duration::from_secs(5));
    }

    #[test]
    fn config_serializes_to_toml() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[guard]"));
        assert!(toml_str.contains("[cleaner]"));
    }

    #[test]
    fn default_guard_watches_editor_and_hub() {
        let config = GuardConfig::default();
        assert!(config.process_names.contains(&"Unity".to_string()));
        assert!(config.process_names.contains(&"Unity Hub".to_string()));
    }

    #[test]
    fn unknown_layout_is_rejected() {
        let mut config = Config::default();
        config.cleaner.layout = "unreal".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn escaping_protected_path_is_rejected() {
        let mut config = Config::default();
        config.cleaner.extra_protected = vec!["../outside".into()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_grace_period_is_rejected() {
        let mut config = Config::default();
        config.guard.grace_period_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn configured_search_paths_win() {
        let mut config = Config::default();
        config.discovery.search_paths = vec![PathBuf::from("/work")];
        assert_eq!(config.search_paths(), vec![PathBuf::from("/work")]);
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let result = Config::load(Some(Path::new("/definitely/not/here.toml")));
        assert!(matches!(result, Err(ConfigError::ReadError { .. })));
    }
}
