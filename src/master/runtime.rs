//! Master supervisor runtime - routes control requests, aggregates task
//! statuses and reconciles configuration reloads

use super::spec::MasterSpec;
use crate::cell::ReactiveCell;
use crate::config::{Config, ConfigError, ConfigSource, TaskConfig};
use crate::error::{ControlError, SupervisorError};
use crate::messages::{FleetStatus, Request, Response, TaskInput, TaskOutput, TaskReply, TaskStatus};
use crate::signals;
use crate::task::{PreparedTask, TaskHandle};
use crate::types::TaskId;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Commands accepted by the master control loop
#[derive(Debug)]
pub(crate) enum MasterCommand {
    /// Well-formed control request
    Request(Request),
    /// Control input that failed to parse, answered with `BadRequest`
    Rejected(String),
}

/// Notifications from helpers of the master loop
#[derive(Debug)]
pub(crate) enum MasterEvent {
    /// A configuration load finished
    Loaded(Result<Config, ConfigError>),
    /// SIGHUP received
    Hangup,
}

/// Sequential control loop owning every task supervisor of a generation
pub(crate) struct MasterRuntime {
    pub(super) name: String,
    source: Arc<dyn ConfigSource>,
    pub(super) config: Arc<ReactiveCell<Arc<Config>>>,
    prepared: Vec<PreparedTask>,
    pub(super) tasks: Vec<TaskHandle>,
    pub(super) pending: Vec<VecDeque<TaskStatus>>,
    control_rx: mpsc::UnboundedReceiver<MasterCommand>,
    tasks_rx: mpsc::UnboundedReceiver<TaskOutput>,
    pub(super) tasks_tx: mpsc::UnboundedSender<TaskOutput>,
    events_rx: mpsc::UnboundedReceiver<MasterEvent>,
    events_tx: mpsc::UnboundedSender<MasterEvent>,
    response_tx: mpsc::UnboundedSender<Response>,
    hangup_watcher: Option<JoinHandle<()>>,
}

impl MasterRuntime {
    /// Prepares the first generation from an already loaded configuration
    pub(crate) fn new(
        spec: &MasterSpec,
        config: Arc<ReactiveCell<Arc<Config>>>,
        control_rx: mpsc::UnboundedReceiver<MasterCommand>,
        response_tx: mpsc::UnboundedSender<Response>,
    ) -> Result<Self, SupervisorError> {
        let (tasks_tx, tasks_rx) = mpsc::unbounded_channel();
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let installed = config.get();
        let prepared = prepare_generation(&installed, &tasks_tx)?;

        let mut runtime = Self {
            name: spec.name.clone(),
            source: Arc::clone(&spec.source),
            config,
            prepared,
            tasks: Vec::new(),
            pending: vec![VecDeque::new(); installed.tasks.len()],
            control_rx,
            tasks_rx,
            tasks_tx,
            events_rx,
            events_tx,
            response_tx,
            hangup_watcher: None,
        };
        // Registered before `start` returns so no hangup is missed
        if spec.hangup_reload {
            runtime.watch_hangups();
        }
        Ok(runtime)
    }

    pub(crate) async fn run(mut self) {
        self.tasks = std::mem::take(&mut self.prepared)
            .into_iter()
            .map(PreparedTask::launch)
            .collect();

        slog::info!(slog_scope::logger(), "master supervisor started";
            "supervisor" => &self.name,
            "tasks" => self.tasks.len()
        );

        loop {
            tokio::select! {
                command = self.control_rx.recv() => match command {
                    Some(MasterCommand::Request(Request::Shutdown)) | None => break,
                    Some(command) => self.handle_command(command),
                },
                Some(output) = self.tasks_rx.recv() => self.handle_task_output(output),
                Some(event) = self.events_rx.recv() => self.handle_event(event).await,
            }
        }

        self.shutdown().await;
    }

    fn handle_command(&mut self, command: MasterCommand) {
        let request = match command {
            MasterCommand::Request(request) => request,
            MasterCommand::Rejected(reason) => {
                self.emit(Response::BadRequest(reason));
                return;
            }
        };

        match request {
            Request::Status => {
                for task in &self.tasks {
                    task.send(TaskInput::Status);
                }
            }
            Request::Reload => self.reload(),
            // Handled by the loop
            Request::Shutdown => {}
            Request::StartProcess { .. }
            | Request::StopProcess { .. }
            | Request::RestartProcess { .. } => {
                if let Some((operation, task_id, process_id)) = request.target() {
                    let error = match self.tasks.get(task_id) {
                        None => ControlError::InvalidTaskId(task_id),
                        Some(task) if task.send(TaskInput::addressed(operation, process_id)) => {
                            return
                        }
                        Some(_) => ControlError::ShuttingDown,
                    };
                    self.emit(Response::from_reply(TaskReply {
                        task_id,
                        process_id,
                        operation,
                        result: Err(error),
                    }));
                }
            }
        }
    }

    pub(super) fn handle_task_output(&mut self, output: TaskOutput) {
        match output {
            TaskOutput::Local(reply) => self.emit(Response::from_reply(reply)),
            TaskOutput::Global(status) => {
                let Some(queue) = self.pending.get_mut(status.task_id) else {
                    return;
                };
                queue.push_back(status);
                if self.pending.iter().all(|queue| !queue.is_empty()) {
                    let tasks = self
                        .pending
                        .iter_mut()
                        .filter_map(VecDeque::pop_front)
                        .collect();
                    self.emit(Response::Status(FleetStatus { tasks }));
                }
            }
        }
    }

    async fn handle_event(&mut self, event: MasterEvent) {
        match event {
            MasterEvent::Hangup => {
                slog::info!(slog_scope::logger(), "hangup received, reloading";
                    "supervisor" => &self.name
                );
                self.reload();
            }
            MasterEvent::Loaded(Err(err)) => {
                slog::error!(slog_scope::logger(), "configuration reload failed";
                    "supervisor" => &self.name,
                    "error" => %err
                );
                self.emit(Response::Reload(Err(err.to_string())));
            }
            MasterEvent::Loaded(Ok(config)) => {
                let result = self.apply(config).await.map_err(|err| {
                    slog::error!(slog_scope::logger(), "configuration reload failed";
                        "supervisor" => &self.name,
                        "error" => %err
                    );
                    err.to_string()
                });
                self.emit(Response::Reload(result));
            }
        }
    }

    /// Loads the configuration off the loop; the result comes back as an event
    fn reload(&self) {
        let source = Arc::clone(&self.source);
        let events_tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = source.load().await;
            let _ = events_tx.send(MasterEvent::Loaded(result));
        });
    }

    fn watch_hangups(&mut self) {
        let mut hangups = match signals::hangups() {
            Ok(hangups) => hangups,
            Err(err) => {
                slog::warn!(slog_scope::logger(), "cannot listen for SIGHUP";
                    "supervisor" => &self.name,
                    "error" => %err
                );
                return;
            }
        };
        let events_tx = self.events_tx.clone();
        self.hangup_watcher = Some(tokio::spawn(async move {
            while hangups.recv().await.is_some() {
                if events_tx.send(MasterEvent::Hangup).is_err() {
                    break;
                }
            }
        }));
    }

    /// Processes everything the task supervisors already emitted
    pub(super) fn drain_tasks(&mut self) {
        while let Ok(output) = self.tasks_rx.try_recv() {
            self.handle_task_output(output);
        }
    }

    async fn shutdown(mut self) {
        if let Some(watcher) = self.hangup_watcher.take() {
            watcher.abort();
        }
        let tasks = std::mem::take(&mut self.tasks);
        shutdown_tasks(tasks).await;
        self.drain_tasks();

        slog::info!(slog_scope::logger(), "master supervisor stopped";
            "supervisor" => &self.name
        );
        // Dropping the runtime closes the response channel
    }

    pub(super) fn emit(&self, response: Response) {
        if self.response_tx.send(response).is_err() {
            slog::debug!(slog_scope::logger(), "response receiver gone, dropping response";
                "supervisor" => &self.name
            );
        }
    }
}

/// Prepares one task supervisor per configured task
pub(super) fn prepare_generation(
    config: &Config,
    tasks_tx: &mpsc::UnboundedSender<TaskOutput>,
) -> Result<Vec<PreparedTask>, SupervisorError> {
    config
        .tasks
        .iter()
        .enumerate()
        .map(|(task_id, task)| prepare_task(config, task_id, task, tasks_tx))
        .collect()
}

pub(super) fn prepare_task(
    config: &Config,
    task_id: TaskId,
    task: &TaskConfig,
    tasks_tx: &mpsc::UnboundedSender<TaskOutput>,
) -> Result<PreparedTask, SupervisorError> {
    TaskHandle::prepare(
        task_id,
        Arc::new(task.clone()),
        &config.log_dir,
        tasks_tx.clone(),
    )
}

/// Shuts down all `tasks` concurrently and waits for every one of them
pub(super) async fn shutdown_tasks(tasks: Vec<TaskHandle>) {
    for task in &tasks {
        task.send(TaskInput::Shutdown);
    }
    for task in tasks {
        task.shutdown().await;
    }
}
