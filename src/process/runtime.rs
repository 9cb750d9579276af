//! Process supervisor runtime - lifecycle state machine of one process

use super::spawn::{build_command, LogFiles};
use super::state::{assign, LiveProcess, ProcessState};
use super::watch::{after, watch_exit};
use crate::cell::SubscriberError;
use crate::config::TaskConfig;
use crate::error::{ControlError, SupervisorError};
use crate::messages::{ProcessInput, ProcessOutput, ProcessReply, ProcessStatus};
use crate::restart::ExitContext;
use crate::types::{Operation, ProcessId, TaskId};
use chrono::Local;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Notifications from the watchers of the current incarnation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ProcessEvent {
    /// The exit watcher recorded an exit code
    Exited { code: i32 },
    /// The start grace period of `incarnation` elapsed
    Confirmed { incarnation: u64 },
    /// The stop grace period of `incarnation` elapsed
    KillDeadline { incarnation: u64 },
}

/// Sequential control loop owning one [`ProcessState`]
pub(crate) struct ProcessRuntime {
    task_id: TaskId,
    process_id: ProcessId,
    config: Arc<TaskConfig>,
    state: Arc<ProcessState>,
    logs: LogFiles,
    input_rx: mpsc::UnboundedReceiver<ProcessInput>,
    output_tx: mpsc::UnboundedSender<ProcessOutput>,
    events_rx: mpsc::UnboundedReceiver<ProcessEvent>,
    events_tx: mpsc::UnboundedSender<ProcessEvent>,
    incarnation: u64,
    pending_exit: bool,
}

impl ProcessRuntime {
    /// Opens the log files and wires the exit notification; spawns nothing
    pub(crate) fn new(
        task_id: TaskId,
        process_id: ProcessId,
        config: Arc<TaskConfig>,
        log_dir: &Path,
        input_rx: mpsc::UnboundedReceiver<ProcessInput>,
        output_tx: mpsc::UnboundedSender<ProcessOutput>,
    ) -> Result<Self, SupervisorError> {
        let logs = LogFiles::open(&config, log_dir, task_id, process_id)?;
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        let state = Arc::new(ProcessState::new());
        let exit_tx = events_tx.clone();
        state.exit_code.subscribe(move |_, new| match new {
            Some(code) => exit_tx
                .send(ProcessEvent::Exited { code: *code })
                .map_err(|_| SubscriberError::new("process supervisor has terminated")),
            None => Ok(()),
        });

        Ok(Self {
            task_id,
            process_id,
            config,
            state,
            logs,
            input_rx,
            output_tx,
            events_rx,
            events_tx,
            incarnation: 0,
            pending_exit: false,
        })
    }

    pub(crate) async fn run(mut self) {
        if self.config.start_at_launch {
            // Failures are recorded in the state and visible through status
            let _ = self.start();
        }

        loop {
            tokio::select! {
                input = self.input_rx.recv() => match input {
                    Some(ProcessInput::Shutdown) | None => break,
                    Some(input) => self.handle_input(input),
                },
                Some(event) = self.events_rx.recv() => self.handle_event(event),
            }
        }

        self.shutdown().await;
    }

    fn handle_input(&mut self, input: ProcessInput) {
        let (operation, result) = match input {
            ProcessInput::Status => {
                let state = self.state.status(&self.config);
                self.emit(ProcessOutput::Global(ProcessStatus {
                    process_id: self.process_id,
                    state,
                }));
                return;
            }
            ProcessInput::Start => (Operation::Start, self.manual_start()),
            ProcessInput::Stop => (Operation::Stop, self.stop()),
            ProcessInput::Restart => (Operation::Restart, self.restart()),
            // Handled by the loop
            ProcessInput::Shutdown => return,
        };

        self.emit(ProcessOutput::Local(ProcessReply {
            process_id: self.process_id,
            operation,
            result,
        }));
    }

    fn handle_event(&mut self, event: ProcessEvent) {
        match event {
            ProcessEvent::Exited { code } => self.handle_exit(code),
            ProcessEvent::Confirmed { incarnation } => {
                if incarnation == self.incarnation
                    && self.pending_exit
                    && self.state.exit_code.with(Option::is_none)
                {
                    self.confirm();
                }
            }
            ProcessEvent::KillDeadline { incarnation } => {
                if incarnation != self.incarnation || !self.pending_exit {
                    return;
                }
                if let Some(process) = self.state.process.get() {
                    slog::warn!(slog_scope::logger(), "stop grace period elapsed, killing process";
                        "task" => self.task_id,
                        "process" => self.process_id,
                        "pid" => process.pid
                    );
                    process.kill();
                }
            }
        }
    }

    fn manual_start(&mut self) -> Result<(), ControlError> {
        self.state.check_manual_start()?;
        self.start()
    }

    /// Spawns a new incarnation without checking manual-start preconditions
    fn start(&mut self) -> Result<(), ControlError> {
        let spawned = build_command(&self.config, &self.logs).and_then(|mut command| command.spawn());
        let child = match spawned {
            Ok(child) => child,
            Err(err) => {
                assign(&self.state.failed_to_start, true);
                slog::error!(slog_scope::logger(), "failed to start process";
                    "task" => self.task_id,
                    "process" => self.process_id,
                    "command" => &self.config.command,
                    "error" => %err
                );
                return Err(ControlError::Spawn(err.to_string()));
            }
        };

        self.incarnation += 1;
        self.pending_exit = true;
        let pid = child.id().unwrap_or_default();
        let (control_tx, control_rx) = mpsc::unbounded_channel();
        assign(&self.state.start_time, Some(Local::now()));
        assign(&self.state.process, Some(LiveProcess::new(pid, control_tx)));

        slog::info!(slog_scope::logger(), "process started";
            "task" => self.task_id,
            "process" => self.process_id,
            "pid" => pid
        );

        tokio::spawn(watch_exit(child, control_rx, Arc::clone(&self.state)));

        if self.config.start_grace.is_zero() {
            self.confirm();
        } else {
            after(
                self.config.start_grace,
                self.events_tx.clone(),
                ProcessEvent::Confirmed {
                    incarnation: self.incarnation,
                },
            );
        }
        Ok(())
    }

    fn confirm(&self) {
        assign(&self.state.confirmed_time, Some(Local::now()));
        assign(&self.state.stopped_early, false);
        slog::debug!(slog_scope::logger(), "process confirmed running";
            "task" => self.task_id,
            "process" => self.process_id
        );
    }

    fn stop(&mut self) -> Result<(), ControlError> {
        let Some(process) = self.state.process.get() else {
            return Err(ControlError::NotRunning);
        };
        if self.state.user_stop_time.with(Option::is_some) {
            return Ok(());
        }

        assign(&self.state.user_stop_time, Some(Local::now()));
        let signal = self.config.stop_signal;
        slog::info!(slog_scope::logger(), "stopping process";
            "task" => self.task_id,
            "process" => self.process_id,
            "signal" => signal.name()
        );
        process.signal(signal.signal());

        after(
            self.config.stop_grace,
            self.events_tx.clone(),
            ProcessEvent::KillDeadline {
                incarnation: self.incarnation,
            },
        );
        Ok(())
    }

    fn restart(&mut self) -> Result<(), ControlError> {
        if !self.pending_exit {
            self.state.reset_all();
            return self.start();
        }

        // The fresh start happens once the exit is observed
        assign(&self.state.restart_in_progress, true);
        match self.stop() {
            Ok(()) | Err(ControlError::NotRunning) => Ok(()),
            Err(err) => Err(err),
        }
    }

    fn handle_exit(&mut self, code: i32) {
        if !self.pending_exit {
            return;
        }
        self.pending_exit = false;

        let stopped_early = self.state.confirmed_time.with(Option::is_none);
        if stopped_early {
            assign(&self.state.stopped_early, true);
        }

        slog::info!(slog_scope::logger(), "process exited";
            "task" => self.task_id,
            "process" => self.process_id,
            "code" => code,
            "killed" => self.state.killed.get(),
            "stopped_early" => stopped_early
        );

        if self.state.shutdown_requested.get() {
            return;
        }

        if self.state.restart_in_progress.get() {
            self.state.reset_all();
            let _ = self.start();
            return;
        }

        let context = ExitContext {
            policy: self.config.restart,
            max_attempts: self.config.restart_attempts,
            attempts: self.state.restart_attempts.get(),
            stopped_early,
            user_stopped: self.state.user_stop_time.with(Option::is_some),
            exit_code: code,
            expected_exit_code: self.config.expected_exit_code,
        };
        if !context.should_retry() {
            return;
        }

        if let Err(err) = self.state.restart_attempts.update(|attempts| attempts + 1) {
            slog::warn!(slog_scope::logger(), "state subscriber failed"; "error" => %err);
        }
        slog::info!(slog_scope::logger(), "retrying process";
            "task" => self.task_id,
            "process" => self.process_id,
            "policy" => %self.config.restart,
            "attempt" => self.state.restart_attempts.get(),
            "max_attempts" => self.config.restart_attempts
        );
        self.state.reset_incarnation();
        let _ = self.start();
    }

    /// Stops the live incarnation, waits for its exit and releases the log files
    async fn shutdown(mut self) {
        assign(&self.state.shutdown_requested, true);

        if self.pending_exit {
            let _ = self.stop();
            while self.pending_exit {
                match self.events_rx.recv().await {
                    Some(event) => self.handle_event(event),
                    None => break,
                }
            }
        }

        slog::debug!(slog_scope::logger(), "process supervisor stopped";
            "task" => self.task_id,
            "process" => self.process_id
        );
    }

    fn emit(&self, output: ProcessOutput) {
        if self.output_tx.send(output).is_err() {
            slog::debug!(slog_scope::logger(), "task supervisor gone, dropping output";
                "task" => self.task_id,
                "process" => self.process_id
            );
        }
    }
}
