//! Process supervisor handle

use super::runtime::ProcessRuntime;
use crate::messages::ProcessInput;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Input side of a running process supervisor
pub(crate) struct ProcessHandle {
    input_tx: mpsc::UnboundedSender<ProcessInput>,
    join: JoinHandle<()>,
}

impl ProcessHandle {
    /// Spawns the control loop of a prepared runtime
    pub(crate) fn launch(runtime: ProcessRuntime, input_tx: mpsc::UnboundedSender<ProcessInput>) -> Self {
        let join = tokio::spawn(runtime.run());
        Self { input_tx, join }
    }

    /// Forwards `input`; false once the supervisor has terminated
    pub(crate) fn send(&self, input: ProcessInput) -> bool {
        self.input_tx.send(input).is_ok()
    }

    /// Waits for the control loop to finish
    pub(crate) async fn join(self) {
        if let Err(err) = self.join.await {
            slog::error!(slog_scope::logger(), "process supervisor panicked"; "error" => %err);
        }
    }
}
