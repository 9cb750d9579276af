//! Task supervisor handle

use super::runtime::TaskRuntime;
use crate::config::TaskConfig;
use crate::error::SupervisorError;
use crate::messages::{TaskInput, TaskOutput};
use crate::types::TaskId;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// A task supervisor whose resources are acquired but which runs nothing yet
pub(crate) struct PreparedTask {
    runtime: TaskRuntime,
    input_tx: mpsc::UnboundedSender<TaskInput>,
}

impl PreparedTask {
    /// Starts the control loop and the process supervisors
    pub(crate) fn launch(self) -> TaskHandle {
        let join = tokio::spawn(self.runtime.run());
        TaskHandle {
            input_tx: self.input_tx,
            join,
        }
    }
}

/// Input side of a running task supervisor
pub(crate) struct TaskHandle {
    input_tx: mpsc::UnboundedSender<TaskInput>,
    join: JoinHandle<()>,
}

impl TaskHandle {
    /// Builds the supervisor subtree of one task. Fails when a log file
    /// cannot be opened; nothing is spawned in that case.
    pub(crate) fn prepare(
        task_id: TaskId,
        config: Arc<TaskConfig>,
        log_dir: &Path,
        output_tx: mpsc::UnboundedSender<TaskOutput>,
    ) -> Result<PreparedTask, SupervisorError> {
        let (input_tx, input_rx) = mpsc::unbounded_channel();
        let runtime = TaskRuntime::new(task_id, config, log_dir, input_rx, output_tx)?;
        Ok(PreparedTask { runtime, input_tx })
    }

    /// Forwards `input`; false once the supervisor has terminated
    pub(crate) fn send(&self, input: TaskInput) -> bool {
        self.input_tx.send(input).is_ok()
    }

    /// Requests shutdown and waits until every process of the task is gone
    pub(crate) async fn shutdown(self) {
        self.send(TaskInput::Shutdown);
        if let Err(err) = self.join.await {
            slog::error!(slog_scope::logger(), "task supervisor panicked"; "error" => %err);
        }
    }
}
