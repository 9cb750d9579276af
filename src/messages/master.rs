//! Control requests accepted by the master supervisor and the responses it emits

use super::task::{TaskReply, TaskStatus};
use crate::types::{Operation, ProcessId, Scope, TaskId};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Control request from the front end
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
    /// Status of every process of every task
    Status,
    /// Manual start of one process
    StartProcess {
        /// Task index
        task_id: TaskId,
        /// Process index inside the task
        process_id: ProcessId,
    },
    /// Stop one process
    StopProcess {
        /// Task index
        task_id: TaskId,
        /// Process index inside the task
        process_id: ProcessId,
    },
    /// Restart one process
    RestartProcess {
        /// Task index
        task_id: TaskId,
        /// Process index inside the task
        process_id: ProcessId,
    },
    /// Reload the configuration and reconcile the running tree
    Reload,
    /// Stop everything and close the response channel
    Shutdown,
}

impl Request {
    /// Routing class of the request
    pub fn scope(&self) -> Scope {
        match self {
            Request::Status | Request::Shutdown => Scope::Global,
            Request::StartProcess { .. }
            | Request::StopProcess { .. }
            | Request::RestartProcess { .. }
            | Request::Reload => Scope::Local,
        }
    }

    /// Operation and address of a process-level request
    pub fn target(&self) -> Option<(Operation, TaskId, ProcessId)> {
        match *self {
            Request::StartProcess {
                task_id,
                process_id,
            } => Some((Operation::Start, task_id, process_id)),
            Request::StopProcess {
                task_id,
                process_id,
            } => Some((Operation::Stop, task_id, process_id)),
            Request::RestartProcess {
                task_id,
                process_id,
            } => Some((Operation::Restart, task_id, process_id)),
            Request::Status | Request::Reload | Request::Shutdown => None,
        }
    }
}

/// Malformed textual control input
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseRequestError {
    /// Nothing but whitespace
    #[error("empty command")]
    Empty,
    /// First word is not a known command
    #[error("invalid command: {0}")]
    UnknownCommand(String),
    /// Wrong number of arguments
    #[error("usage: {0} <task-id> <process-id>")]
    Usage(&'static str),
    /// Ids are not non-negative integers
    #[error("task-id and process-id must be valid positive integers")]
    InvalidId,
    /// Arguments given to a command that takes none
    #[error("{0} takes no arguments")]
    UnexpectedArguments(&'static str),
}

impl FromStr for Request {
    type Err = ParseRequestError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let (&command, args) = tokens.split_first().ok_or(ParseRequestError::Empty)?;

        let no_args = |request: Request, name: &'static str| {
            if args.is_empty() {
                Ok(request)
            } else {
                Err(ParseRequestError::UnexpectedArguments(name))
            }
        };
        let ids = |name: &'static str| -> Result<(TaskId, ProcessId), ParseRequestError> {
            match args {
                [task, process] => {
                    let task_id = task.parse().map_err(|_| ParseRequestError::InvalidId)?;
                    let process_id = process.parse().map_err(|_| ParseRequestError::InvalidId)?;
                    Ok((task_id, process_id))
                }
                _ => Err(ParseRequestError::Usage(name)),
            }
        };

        match command {
            "status" => no_args(Request::Status, "status"),
            "reload" => no_args(Request::Reload, "reload"),
            "shutdown" => no_args(Request::Shutdown, "shutdown"),
            "start" => ids("start").map(|(task_id, process_id)| Request::StartProcess {
                task_id,
                process_id,
            }),
            "stop" => ids("stop").map(|(task_id, process_id)| Request::StopProcess {
                task_id,
                process_id,
            }),
            "restart" => ids("restart").map(|(task_id, process_id)| Request::RestartProcess {
                task_id,
                process_id,
            }),
            other => Err(ParseRequestError::UnknownCommand(other.to_string())),
        }
    }
}

/// Status of the whole fleet, one entry per task in id order
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FleetStatus {
    /// Aggregated task statuses
    pub tasks: Vec<TaskStatus>,
}

impl fmt::Display for FleetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for task in &self.tasks {
            if !first {
                writeln!(f)?;
            }
            write!(f, "{task}")?;
            first = false;
        }
        Ok(())
    }
}

/// Response delivered to the front end
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Answer to [`Request::Status`]
    Status(FleetStatus),
    /// Answer to [`Request::StartProcess`]
    StartProcess(TaskReply),
    /// Answer to [`Request::StopProcess`]
    StopProcess(TaskReply),
    /// Answer to [`Request::RestartProcess`]
    RestartProcess(TaskReply),
    /// Outcome of a reload, with the failure reason
    Reload(Result<(), String>),
    /// Control input that could not be understood
    BadRequest(String),
}

impl Response {
    /// Routing class of the response
    pub fn scope(&self) -> Scope {
        match self {
            Response::Status(_) => Scope::Global,
            Response::StartProcess(_)
            | Response::StopProcess(_)
            | Response::RestartProcess(_)
            | Response::Reload(_)
            | Response::BadRequest(_) => Scope::Local,
        }
    }

    pub(crate) fn from_reply(reply: TaskReply) -> Self {
        match reply.operation {
            Operation::Start => Response::StartProcess(reply),
            Operation::Stop => Response::StopProcess(reply),
            Operation::Restart => Response::RestartProcess(reply),
        }
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Response::Status(status) => write!(f, "{status}"),
            Response::StartProcess(reply)
            | Response::StopProcess(reply)
            | Response::RestartProcess(reply) => write!(f, "{reply}"),
            Response::Reload(Ok(())) => f.write_str("Successfully reloaded configuration."),
            Response::Reload(Err(reason)) => {
                write!(f, "Failed to reload configuration: {reason}.")
            }
            Response::BadRequest(reason) => write!(f, "Invalid request: {reason}"),
        }
    }
}
