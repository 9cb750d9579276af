//! Error types shared by the supervision tiers

use crate::config::ConfigError;
use crate::types::{ProcessId, TaskId};
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Typed failure answering one control request.
///
/// Travels inside reply messages, so it is cheap to clone and comparable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ControlError {
    /// No task with this index in the current generation
    #[error("invalid task id: {0}")]
    InvalidTaskId(TaskId),
    /// No process with this index in the addressed task
    #[error("invalid process id: {0}")]
    InvalidProcessId(ProcessId),
    /// Start requested on a process that already has a start time
    #[error("process already started, use restart instead if this is on purpose")]
    AlreadyStarted,
    /// Start requested after a user stop
    #[error("process already stopped, use restart instead if this is on purpose")]
    AlreadyStopped,
    /// Start requested after a forced kill
    #[error("process was killed, use restart instead if this is on purpose")]
    Killed,
    /// Start requested after a failed spawn
    #[error("process previously failed to start, use restart instead if this is on purpose")]
    PreviouslyFailed,
    /// Stop requested while no process is running
    #[error("process is not running")]
    NotRunning,
    /// The OS refused to spawn the command
    #[error("failed to spawn process: {0}")]
    Spawn(String),
    /// The addressed supervisor has already terminated
    #[error("supervisor is shutting down")]
    ShuttingDown,
}

/// Errors raised while building or talking to a supervisor tree
#[derive(Debug, Error)]
pub enum SupervisorError {
    /// Configuration could not be loaded or validated
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// A per-process log file could not be opened
    #[error("failed to open log file {path}: {source}")]
    LogFile {
        /// File that was being opened
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },
    /// The master supervisor is no longer accepting requests
    #[error("supervisor '{0}' is shutting down - operation not permitted")]
    ShuttingDown(String),
}
