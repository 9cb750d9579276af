//! Common types used throughout the supervision tree

use serde::{Deserialize, Serialize};
use std::fmt;

/// Index of a task in the loaded configuration
pub type TaskId = usize;

/// Index of a process instance inside its task
pub type ProcessId = usize;

/// Addressed operation a front end can request on a single process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    /// Spawn the process
    Start,
    /// Deliver the stop signal
    Stop,
    /// Stop, then start a fresh incarnation
    Restart,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Start => f.write_str("start"),
            Operation::Stop => f.write_str("stop"),
            Operation::Restart => f.write_str("restart"),
        }
    }
}

/// Routing class of a message travelling through the hierarchy.
///
/// `Local` messages answer exactly one addressed request and are forwarded
/// upward as soon as they arrive. `Global` messages are produced by a broadcast
/// and are aggregated from every child before being forwarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Scope {
    /// Targeted reply
    Local,
    /// Broadcast fragment
    Global,
}

/// Stream a child's output is attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    /// Standard output
    Stdout,
    /// Standard error
    Stderr,
}

impl OutputStream {
    /// Lowercase name used in log file names
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputStream::Stdout => "stdout",
            OutputStream::Stderr => "stderr",
        }
    }
}
