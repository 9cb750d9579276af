//! Task supervisor runtime - fans requests out to process supervisors and
//! aggregates their answers

use crate::config::TaskConfig;
use crate::error::{ControlError, SupervisorError};
use crate::messages::{
    ProcessInput, ProcessOutput, ProcessStatus, TaskInput, TaskOutput, TaskReply, TaskStatus,
};
use crate::process::{ProcessHandle, ProcessRuntime};
use crate::types::{Operation, ProcessId, TaskId};
use std::collections::VecDeque;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Sequential control loop owning the process supervisors of one task
pub(crate) struct TaskRuntime {
    task_id: TaskId,
    config: Arc<TaskConfig>,
    prepared: Vec<(ProcessRuntime, mpsc::UnboundedSender<ProcessInput>)>,
    children: Vec<ProcessHandle>,
    pending: Vec<VecDeque<ProcessStatus>>,
    input_rx: mpsc::UnboundedReceiver<TaskInput>,
    children_rx: mpsc::UnboundedReceiver<ProcessOutput>,
    output_tx: mpsc::UnboundedSender<TaskOutput>,
}

impl TaskRuntime {
    /// Builds every process supervisor of the task, opening their log files
    pub(crate) fn new(
        task_id: TaskId,
        config: Arc<TaskConfig>,
        log_dir: &Path,
        input_rx: mpsc::UnboundedReceiver<TaskInput>,
        output_tx: mpsc::UnboundedSender<TaskOutput>,
    ) -> Result<Self, SupervisorError> {
        let (children_tx, children_rx) = mpsc::unbounded_channel();
        let mut prepared = Vec::with_capacity(config.instances);

        for process_id in 0..config.instances {
            let (process_tx, process_rx) = mpsc::unbounded_channel();
            let runtime = ProcessRuntime::new(
                task_id,
                process_id,
                Arc::clone(&config),
                log_dir,
                process_rx,
                children_tx.clone(),
            )?;
            prepared.push((runtime, process_tx));
        }

        Ok(Self {
            task_id,
            pending: vec![VecDeque::new(); config.instances],
            config,
            prepared,
            children: Vec::new(),
            input_rx,
            children_rx,
            output_tx,
        })
    }

    pub(crate) async fn run(mut self) {
        self.children = std::mem::take(&mut self.prepared)
            .into_iter()
            .map(|(runtime, input_tx)| ProcessHandle::launch(runtime, input_tx))
            .collect();

        slog::debug!(slog_scope::logger(), "task supervisor started";
            "task" => self.task_id,
            "name" => &self.config.name,
            "instances" => self.children.len()
        );

        loop {
            tokio::select! {
                input = self.input_rx.recv() => match input {
                    Some(TaskInput::Shutdown) | None => break,
                    Some(input) => self.handle_input(input),
                },
                Some(output) = self.children_rx.recv() => self.handle_child_output(output),
            }
        }

        self.shutdown().await;
    }

    fn handle_input(&mut self, input: TaskInput) {
        match input {
            TaskInput::Status => self.broadcast(ProcessInput::Status),
            TaskInput::StartProcess(process_id) => self.route(Operation::Start, process_id),
            TaskInput::StopProcess(process_id) => self.route(Operation::Stop, process_id),
            TaskInput::RestartProcess(process_id) => self.route(Operation::Restart, process_id),
            TaskInput::Shutdown => {}
        }
    }

    fn route(&mut self, operation: Operation, process_id: ProcessId) {
        let error = match self.children.get(process_id) {
            None => ControlError::InvalidProcessId(process_id),
            Some(child) if child.send(ProcessInput::from_operation(operation)) => return,
            Some(_) => ControlError::ShuttingDown,
        };
        self.emit(TaskOutput::Local(TaskReply {
            task_id: self.task_id,
            process_id,
            operation,
            result: Err(error),
        }));
    }

    fn broadcast(&self, input: ProcessInput) {
        for child in &self.children {
            child.send(input);
        }
    }

    fn handle_child_output(&mut self, output: ProcessOutput) {
        match output {
            ProcessOutput::Local(reply) => {
                self.emit(TaskOutput::Local(TaskReply::from_process(self.task_id, reply)));
            }
            ProcessOutput::Global(status) => {
                let Some(queue) = self.pending.get_mut(status.process_id) else {
                    return;
                };
                queue.push_back(status);
                if self.pending.iter().all(|queue| !queue.is_empty()) {
                    let processes = self
                        .pending
                        .iter_mut()
                        .filter_map(VecDeque::pop_front)
                        .collect();
                    self.emit(TaskOutput::Global(TaskStatus {
                        task_id: self.task_id,
                        name: self.config.name.clone(),
                        processes,
                    }));
                }
            }
        }
    }

    /// Shuts every child down and forwards what they emit until all are gone
    async fn shutdown(mut self) {
        self.broadcast(ProcessInput::Shutdown);
        // The runtimes hold the only senders, so this ends once they all return
        while let Some(output) = self.children_rx.recv().await {
            self.handle_child_output(output);
        }
        for child in self.children.drain(..) {
            child.join().await;
        }

        slog::debug!(slog_scope::logger(), "task supervisor stopped";
            "task" => self.task_id,
            "name" => &self.config.name
        );
    }

    fn emit(&self, output: TaskOutput) {
        if self.output_tx.send(output).is_err() {
            slog::debug!(slog_scope::logger(), "master supervisor gone, dropping output";
                "task" => self.task_id
            );
        }
    }
}
