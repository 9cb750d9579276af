//! Per-process lifecycle state and derived status

use crate::cell::ReactiveCell;
use crate::config::TaskConfig;
use crate::error::ControlError;
use chrono::{DateTime, Local};
use nix::sys::signal::Signal;
use tokio::sync::mpsc;

/// Command routed to the exit watcher, which owns the OS handle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WatcherCommand {
    /// Deliver a signal to the child
    Signal(Signal),
    /// Force-kill the child
    Kill,
}

/// Handle to the live OS process of the current incarnation
#[derive(Debug, Clone)]
pub(crate) struct LiveProcess {
    pub pid: u32,
    control: mpsc::UnboundedSender<WatcherCommand>,
}

impl LiveProcess {
    pub(crate) fn new(pid: u32, control: mpsc::UnboundedSender<WatcherCommand>) -> Self {
        Self { pid, control }
    }

    /// Asks the watcher to deliver `signal`; false once the child was reaped
    pub(crate) fn signal(&self, signal: Signal) -> bool {
        self.control.send(WatcherCommand::Signal(signal)).is_ok()
    }

    /// Asks the watcher to force-kill the child; false once the child was reaped
    pub(crate) fn kill(&self) -> bool {
        self.control.send(WatcherCommand::Kill).is_ok()
    }
}

type Timestamp = Option<DateTime<Local>>;

/// Lifecycle fields of one process supervisor.
///
/// Shared with the detached watchers of the current incarnation. Fields are
/// reset between incarnations except the attempt counter, the stopped-early
/// flag and the shutdown flag.
#[derive(Debug, Default)]
pub(crate) struct ProcessState {
    pub start_time: ReactiveCell<Timestamp>,
    pub confirmed_time: ReactiveCell<Timestamp>,
    pub user_stop_time: ReactiveCell<Timestamp>,
    pub exit_time: ReactiveCell<Timestamp>,
    pub exit_code: ReactiveCell<Option<i32>>,
    pub killed: ReactiveCell<bool>,
    pub restart_attempts: ReactiveCell<u32>,
    pub stopped_early: ReactiveCell<bool>,
    pub failed_to_start: ReactiveCell<bool>,
    pub restart_in_progress: ReactiveCell<bool>,
    pub shutdown_requested: ReactiveCell<bool>,
    pub process: ReactiveCell<Option<LiveProcess>>,
}

/// Stores `value`, logging subscriber failures instead of propagating them
pub(crate) fn assign<T: Clone>(cell: &ReactiveCell<T>, value: T) {
    if let Err(err) = cell.set(value) {
        slog::warn!(slog_scope::logger(), "state subscriber failed"; "error" => %err);
    }
}

impl ProcessState {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Rejects a manual start that would break the lifecycle
    pub(crate) fn check_manual_start(&self) -> Result<(), ControlError> {
        if self.failed_to_start.get() {
            return Err(ControlError::PreviouslyFailed);
        }
        if self.killed.get() {
            return Err(ControlError::Killed);
        }
        if self.user_stop_time.with(Option::is_some) {
            return Err(ControlError::AlreadyStopped);
        }
        if self.start_time.with(Option::is_some) {
            return Err(ControlError::AlreadyStarted);
        }
        Ok(())
    }

    /// Clears everything tied to one incarnation before an automatic retry
    pub(crate) fn reset_incarnation(&self) {
        assign(&self.start_time, None);
        assign(&self.confirmed_time, None);
        assign(&self.user_stop_time, None);
        assign(&self.exit_time, None);
        assign(&self.exit_code, None);
        assign(&self.killed, false);
        assign(&self.failed_to_start, false);
        assign(&self.restart_in_progress, false);
        assign(&self.process, None);
    }

    /// Full reset performed by a manual restart; only the shutdown flag survives
    pub(crate) fn reset_all(&self) {
        self.reset_incarnation();
        assign(&self.restart_attempts, 0);
        assign(&self.stopped_early, false);
    }

    /// Textual status derived from the current fields
    pub(crate) fn status(&self, config: &TaskConfig) -> String {
        let mut status = if self.failed_to_start.get() {
            String::from("FAILED_TO_START")
        } else if let Some(code) = self.exit_code.get() {
            let outcome = if code == config.expected_exit_code {
                "SUCCESS"
            } else {
                "FAILURE"
            };
            let mut terminal = format!("{outcome} {code}");
            if self.killed.get() {
                terminal.push_str(" KILLED");
            } else if self.user_stop_time.with(Option::is_some) {
                terminal.push_str(" STOPPED");
            }
            terminal
        } else if self.start_time.with(Option::is_none) {
            String::from("NOT_STARTED")
        } else if self.confirmed_time.with(Option::is_none) {
            String::from("STARTING")
        } else {
            String::from("RUNNING")
        };

        let attempts = self.restart_attempts.get();
        if config.restart_attempts > 0 && attempts > 0 {
            status.push_str(&format!(
                " [Restarted {}/{}]",
                attempts, config.restart_attempts
            ));
        }
        if self.stopped_early.get() {
            status.push_str(" (stopped early)");
        }
        status
    }
}
