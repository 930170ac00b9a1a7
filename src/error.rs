use std::path::PathBuf;
use thiserror::Error;

use crate::project::InvalidReason;

/// Core library errors
#[derive(Error, Debug)]
pub enum SweeperError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error at path '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Clean refused: {0}")]
    Refused(#[from] CleanRefusal),

    #[error("Build failed: {0}")]
    Build(#[from] BuildError),

    #[error("System call failed: {0}")]
    Nix(#[from] nix::Error),

    #[error("{0}")]
    Other(String),
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{path}': {source}")]
    ParseError {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Reasons a cleaning run is rejected before it starts.
///
/// A refusal never changes engine state and never touches the filesystem.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CleanRefusal {
    #[error("no cleaning category selected")]
    NoCategorySelected,

    #[error("'{path}' is not a valid project: {reason}")]
    InvalidProject { path: PathBuf, reason: InvalidReason },

    #[error("a cleaning run is already active")]
    RunActive,

    #[error("sign-out requires its own confirmation")]
    SignOutNotConfirmed,
}

/// Failures of the external build collaborator
#[derive(Error, Debug)]
pub enum BuildError {
    #[error("build command is empty")]
    EmptyCommand,

    #[error("failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write build log '{path}': {source}")]
    Log {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("build exited with {}{}", format_code(.code), format_tail(.stderr_tail))]
    Exit {
        code: Option<i32>,
        stderr_tail: Vec<String>,
    },

    #[error("build succeeded but artifact '{0}' is missing")]
    MissingArtifact(PathBuf),
}

fn format_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "no exit code (terminated by signal)".to_string(),
    }
}

fn format_tail(tail: &[String]) -> String {
    if tail.is_empty() {
        String::new()
    } else {
        format!("\n{}", tail.join("\n"))
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, SweeperError>;
