//! Events streamed from a running clean to its observer.

use serde::Serialize;
use std::sync::mpsc::Sender;

use super::summary::RunState;

/// Severity of a log record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Success,
    Error,
}

/// A human-readable line for the session log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogRecord {
    pub level: LogLevel,
    pub message: String,
}

/// Progress through the units counted for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProgressEvent {
    pub processed: u64,
    pub total: u64,
}

/// Updates sent during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum EngineEvent {
    /// The run moved to a new state
    State(RunState),
    /// A unit was deleted or skipped
    Progress(ProgressEvent),
    /// A log line
    Log(LogRecord),
}

/// Sending half of a run's event stream.
///
/// Sends never block and never fail the run: an observer that hung up
/// simply stops receiving. Log records are mirrored to `tracing`.
#[derive(Debug, Clone)]
pub(crate) struct EventSink {
    tx: Sender<EngineEvent>,
}

impl EventSink {
    pub fn new(tx: Sender<EngineEvent>) -> Self {
        Self { tx }
    }

    pub fn state(&self, state: RunState) {
        tracing::debug!(?state, "Run state changed");
        let _ = self.tx.send(EngineEvent::State(state));
    }

    pub fn progress(&self, processed: u64, total: u64) {
        let _ = self
            .tx
            .send(EngineEvent::Progress(ProgressEvent { processed, total }));
    }

    pub fn info(&self, message: impl Into<String>) {
        self.log(LogLevel::Info, message.into());
    }

    pub fn success(&self, message: impl Into<String>) {
        self.log(LogLevel::Success, message.into());
    }

    pub fn error(&self, message: impl Into<String>) {
        self.log(LogLevel::Error, message.into());
    }

    fn log(&self, level: LogLevel, message: String) {
        match level {
            LogLevel::Error => tracing::warn!("{}", message),
            LogLevel::Info | LogLevel::Success => tracing::info!("{}", message),
        }
        let _ = self.tx.send(EngineEvent::Log(LogRecord { level, message }));
    }
}
