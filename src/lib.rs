//! Unity Sweeper - Cleans regenerable caches out of Unity projects
//!
//! This crate provides functionality for:
//! - Validating project roots and reporting structural diagnostics
//! - Classifying project paths as protected, safe or unclassified
//! - Cancellable, progress-reporting cache deletion
//! - Stopping editor processes that hold project files open
//! - Finding projects and remembering recently used ones

pub mod build;
pub mod cli;
pub mod commands;
pub mod config;
pub mod engine;
pub mod error;
pub mod guard;
pub mod layout;
pub mod locations;
pub mod project;
pub mod rules;
pub mod signals;

// Re-export commonly used types
pub use config::Config;
pub use engine::{CleanRequest, CleanSummary, CleaningEngine, RunHandle, RunState};
pub use error::{CleanRefusal, Result, SweeperError};
pub use project::{ProjectValidator, ValidationResult};
pub use rules::{CategorySet, CleanCategory};
