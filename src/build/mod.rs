//! Runs the external build command for a project.
//!
//! The command runs with the project root as its working directory. Its
//! stdout and stderr go to a pair of timestamped log files; only the newest
//! pairs are kept. A build succeeds when the command exits with status 0
//! AND the configured artifact exists afterwards.

use chrono::Local;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use crate::config::BuildConfig;
use crate::error::BuildError;

/// Lines of stderr carried in a failed build's error.
const STDERR_TAIL_LINES: usize = 20;

const BUILD_LOG_PREFIX: &str = "build_";
const ERROR_LOG_PREFIX: &str = "error_";

/// A finished, successful build.
#[derive(Debug, Clone)]
pub struct BuildOutcome {
    pub artifact: PathBuf,
    pub log_file: PathBuf,
    pub error_file: PathBuf,
    pub duration: Duration,
}

/// Invokes the configured build command.
#[derive(Debug, Clone)]
pub struct BuildRunner {
    command: Vec<String>,
    artifact: PathBuf,
    log_dir: PathBuf,
    keep_logs: usize,
}

impl BuildRunner {
    pub fn new(command: Vec<String>, artifact: impl Into<PathBuf>) -> Self {
        Self {
            command,
            artifact: artifact.into(),
            log_dir: PathBuf::from("logs"),
            keep_logs: 10,
        }
    }

    pub fn from_config(config: &BuildConfig) -> Self {
        Self::new(config.command.clone(), config.artifact.clone())
            .with_log_dir(config.log_dir.clone())
            .with_keep_logs(config.keep_logs)
    }

    /// Log directory; relative paths are resolved against the project.
    pub fn with_log_dir(mut self, log_dir: impl Into<PathBuf>) -> Self {
        self.log_dir = log_dir.into();
        self
    }

    pub fn with_keep_logs(mut self, keep_logs: usize) -> Self {
        self.keep_logs = keep_logs.max(1);
        self
    }

    pub fn log_dir_for(&self, project: &Path) -> PathBuf {
        if self.log_dir.is_absolute() {
            self.log_dir.clone()
        } else {
            project.join(&self.log_dir)
        }
    }

    /// Run the build for `project`.
    pub fn run(&self, project: &Path) -> Result<BuildOutcome, BuildError> {
        let (program, args) = self.command.split_first().ok_or(BuildError::EmptyCommand)?;

        let log_dir = self.log_dir_for(project);
        fs::create_dir_all(&log_dir).map_err(|e| BuildError::Log {
            path: log_dir.clone(),
            source: e,
        })?;

        let stamp = unique_stamp(&log_dir, Local::now().format("%Y%m%d_%H%M%S_%3f").to_string());
        let log_file = log_dir.join(format!("{}{}.log", BUILD_LOG_PREFIX, stamp));
        let error_file = log_dir.join(format!("{}{}.log", ERROR_LOG_PREFIX, stamp));
        let stdout = create_log(&log_file)?;
        let stderr = create_log(&error_file)?;

        tracing::info!(?args, "Running build '{}' in {}", program, project.display());
        let started = Instant::now();

        let status = Command::new(program)
            .args(args)
            .current_dir(project)
            .stdin(Stdio::null())
            .stdout(stdout)
            .stderr(stderr)
            .status()
            .map_err(|e| BuildError::Spawn {
                program: program.clone(),
                source: e,
            })?;

        let duration = started.elapsed();
        tracing::debug!(?status, ?duration, "Build finished");
        rotate_logs(&log_dir, self.keep_logs);

        if !status.success() {
            return Err(BuildError::Exit {
                code: status.code(),
                stderr_tail: read_tail(&error_file, STDERR_TAIL_LINES),
            });
        }

        let artifact = project.join(&self.artifact);
        if !artifact.exists() {
            return Err(BuildError::MissingArtifact(artifact));
        }

        Ok(BuildOutcome {
            artifact,
            log_file,
            error_file,
            duration,
        })
    }
}

/// `stamp`, suffixed with a counter while either log for it already exists.
fn unique_stamp(log_dir: &Path, stamp: String) -> String {
    let taken = |s: &str| {
        log_dir.join(format!("{}{}.log", BUILD_LOG_PREFIX, s)).exists()
            || log_dir.join(format!("{}{}.log", ERROR_LOG_PREFIX, s)).exists()
    };
    if !taken(&stamp) {
        return stamp;
    }
    (1..)
        .map(|n| format!("{}_{}", stamp, n))
        .find(|s| !taken(s))
        .unwrap_or(stamp)
}

fn create_log(path: &Path) -> Result<File, BuildError> {
    File::create(path).map_err(|e| BuildError::Log {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Last `lines` non-empty lines of a log file.
fn read_tail(path: &Path, lines: usize) -> Vec<String> {
    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            tracing::debug!("Cannot read {}: {}", path.display(), e);
            return Vec::new();
        }
    };

    let all: Vec<&str> = content.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = all.len().saturating_sub(lines);
    all[start..].iter().map(|l| l.to_string()).collect()
}

/// Keep only the newest `keep` logs of each kind in `dir`.
pub fn rotate_logs(dir: &Path, keep: usize) {
    for prefix in [BUILD_LOG_PREFIX, ERROR_LOG_PREFIX] {
        let mut logs: Vec<PathBuf> = match fs::read_dir(dir) {
            Ok(entries) => entries
                .flatten()
                .map(|e| e.path())
                .filter(|p| {
                    p.file_name()
                        .and_then(|n| n.to_str())
                        .map(|n| n.starts_with(prefix) && n.ends_with(".log"))
                        .unwrap_or(false)
                })
                .collect(),
            Err(e) => {
                tracing::debug!("Cannot list {}: {}", dir.display(), e);
                return;
            }
        };

        // Timestamps sort lexically
        logs.sort();
        let excess = logs.len().saturating_sub(keep);
        for old in &logs[..excess] {
            if let Err(e) = fs::remove_file(old) {
                tracing::warn!("Failed to remove old log {}: {}", old.display(), e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sh(script: &str) -> Vec<String> {
        vec!["sh".to_string(), "-c".to_string(), script.to_string()]
    }

    #[test]
    fn test_successful_build() {
        let tmp = TempDir::new().unwrap();
        let runner = BuildRunner::new(
            sh("mkdir -p Build && echo built > Build/Game && echo done"),
            "Build/Game",
        );

        let outcome = runner.run(tmp.path()).unwrap();

        assert_eq!(outcome.artifact, tmp.path().join("Build/Game"));
        assert!(fs::read_to_string(&outcome.log_file).unwrap().contains("done"));
        assert!(outcome.error_file.exists());
    }

    #[test]
    fn test_nonzero_exit_carries_stderr_tail() {
        let tmp = TempDir::new().unwrap();
        let runner = BuildRunner::new(sh("echo first >&2; echo boom >&2; exit 3"), "Build/Game");

        let err = runner.run(tmp.path()).unwrap_err();

        match err {
            BuildError::Exit { code, stderr_tail } => {
                assert_eq!(code, Some(3));
                assert_eq!(stderr_tail, vec!["first".to_string(), "boom".to_string()]);
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_zero_exit_without_artifact_fails() {
        let tmp = TempDir::new().unwrap();
        let runner = BuildRunner::new(sh("true"), "Build/Game");

        let err = runner.run(tmp.path()).unwrap_err();
        assert!(matches!(err, BuildError::MissingArtifact(_)));
    }

    #[test]
    fn test_empty_command() {
        let tmp = TempDir::new().unwrap();
        let runner = BuildRunner::new(Vec::new(), "Build/Game");
        assert!(matches!(
            runner.run(tmp.path()),
            Err(BuildError::EmptyCommand)
        ));
    }

    #[test]
    fn test_missing_program() {
        let tmp = TempDir::new().unwrap();
        let runner = BuildRunner::new(
            vec!["definitely-not-a-real-build-tool".to_string()],
            "Build/Game",
        );
        assert!(matches!(
            runner.run(tmp.path()),
            Err(BuildError::Spawn { .. })
        ));
    }

    #[test]
    fn test_stamp_skips_existing_logs() {
        let tmp = TempDir::new().unwrap();
        let stamp = "20240105_120000_000".to_string();
        assert_eq!(unique_stamp(tmp.path(), stamp.clone()), stamp);

        fs::write(tmp.path().join("build_20240105_120000_000.log"), "").unwrap();
        assert_eq!(unique_stamp(tmp.path(), stamp.clone()), "20240105_120000_000_1");

        fs::write(tmp.path().join("error_20240105_120000_000_1.log"), "").unwrap();
        assert_eq!(unique_stamp(tmp.path(), stamp), "20240105_120000_000_2");
    }

    #[test]
    fn test_back_to_back_builds_keep_both_logs() {
        let tmp = TempDir::new().unwrap();
        let runner = BuildRunner::new(
            sh("mkdir -p Build && touch Build/Game && echo built"),
            "Build/Game",
        );

        let first = runner.run(tmp.path()).unwrap();
        let second = runner.run(tmp.path()).unwrap();

        assert_ne!(first.log_file, second.log_file);
        assert!(fs::read_to_string(&first.log_file).unwrap().contains("built"));
        assert!(fs::read_to_string(&second.log_file).unwrap().contains("built"));
    }

    #[test]
    fn test_rotation_keeps_newest() {
        let tmp = TempDir::new().unwrap();
        for day in 1..=5 {
            fs::write(tmp.path().join(format!("build_2024010{}_120000.log", day)), "").unwrap();
            fs::write(tmp.path().join(format!("error_2024010{}_120000.log", day)), "").unwrap();
        }
        fs::write(tmp.path().join("notes.txt"), "").unwrap();

        rotate_logs(tmp.path(), 2);

        let mut left: Vec<String> = fs::read_dir(tmp.path())
            .unwrap()
            .flatten()
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        left.sort();
        assert_eq!(
            left,
            vec![
                "build_20240104_120000.log",
                "build_20240105_120000.log",
                "error_20240104_120000.log",
                "error_20240105_120000.log",
                "notes.txt",
            ]
        );
    }
}
