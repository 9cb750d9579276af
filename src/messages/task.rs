//! Messages between the master supervisor and its task supervisors

use super::process::{ProcessReply, ProcessStatus};
use crate::error::ControlError;
use crate::types::{Operation, ProcessId, TaskId};
use std::fmt;

/// Requests a task supervisor accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskInput {
    /// Collect the status of every process
    Status,
    /// Manual start of one process
    StartProcess(ProcessId),
    /// Stop one process
    StopProcess(ProcessId),
    /// Restart one process
    RestartProcess(ProcessId),
    /// Shut down every process and terminate
    Shutdown,
}

impl TaskInput {
    pub(crate) fn addressed(operation: Operation, process_id: ProcessId) -> Self {
        match operation {
            Operation::Start => TaskInput::StartProcess(process_id),
            Operation::Stop => TaskInput::StopProcess(process_id),
            Operation::Restart => TaskInput::RestartProcess(process_id),
        }
    }
}

/// Aggregated status of every process of one task, in process id order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskStatus {
    /// Index of the task
    pub task_id: TaskId,
    /// Configured task name
    pub name: String,
    /// One fragment per process
    pub processes: Vec<ProcessStatus>,
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -- {}", self.task_id, self.name)?;
        for process in &self.processes {
            write!(f, "\n  {} -- {}", process.process_id, process.state)?;
        }
        Ok(())
    }
}

/// Answer to one addressed operation, tagged with both ids
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskReply {
    /// Task that routed the request
    pub task_id: TaskId,
    /// Process the request was addressed to
    pub process_id: ProcessId,
    /// Operation that was requested
    pub operation: Operation,
    /// Outcome
    pub result: Result<(), ControlError>,
}

impl TaskReply {
    pub(crate) fn from_process(task_id: TaskId, reply: ProcessReply) -> Self {
        Self {
            task_id,
            process_id: reply.process_id,
            operation: reply.operation,
            result: reply.result,
        }
    }
}

impl fmt::Display for TaskReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.result {
            Ok(()) => write!(
                f,
                "{} {}/{}: ok",
                self.operation, self.task_id, self.process_id
            ),
            Err(err) => write!(
                f,
                "{} {}/{} failed: {}",
                self.operation, self.task_id, self.process_id, err
            ),
        }
    }
}

/// Everything a task supervisor emits
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutput {
    /// Reply to an addressed request, forwarded immediately
    Local(TaskReply),
    /// Aggregated broadcast answer
    Global(TaskStatus),
}
