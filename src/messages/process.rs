//! Messages between a task supervisor and its process supervisors

use crate::error::ControlError;
use crate::types::{Operation, ProcessId};

/// Requests a process supervisor accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessInput {
    /// Report the derived status
    Status,
    /// Manual start
    Start,
    /// Deliver the stop signal
    Stop,
    /// Stop then start a fresh incarnation
    Restart,
    /// Stop for good and release resources
    Shutdown,
}

impl ProcessInput {
    pub(crate) fn from_operation(operation: Operation) -> Self {
        match operation {
            Operation::Start => ProcessInput::Start,
            Operation::Stop => ProcessInput::Stop,
            Operation::Restart => ProcessInput::Restart,
        }
    }
}

/// Status fragment of one process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessStatus {
    /// Index inside the task
    pub process_id: ProcessId,
    /// Derived textual state, e.g. `RUNNING` or `FAILURE 1 [Restarted 2/2]`
    pub state: String,
}

/// Answer to one addressed operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessReply {
    /// Process that handled the request
    pub process_id: ProcessId,
    /// Operation that was requested
    pub operation: Operation,
    /// Outcome
    pub result: Result<(), ControlError>,
}

/// Everything a process supervisor emits
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessOutput {
    /// Reply to an addressed request, forwarded immediately
    Local(ProcessReply),
    /// Broadcast fragment, aggregated by the task supervisor
    Global(ProcessStatus),
}
