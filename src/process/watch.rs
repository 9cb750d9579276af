//! Detached watchers of one incarnation

use super::runtime::ProcessEvent;
use super::state::{assign, ProcessState, WatcherCommand};
use chrono::Local;
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Child;
use tokio::sync::mpsc;

/// Owns the OS handle until the child terminates.
///
/// Signals and kills arrive through `control_rx`, so nothing is ever sent to
/// a pid that was already reaped. On exit the live handle is cleared, then the
/// exit time and finally the exit code are recorded; the exit-code cell
/// notifies the control loop.
pub(crate) async fn watch_exit(
    mut child: Child,
    mut control_rx: mpsc::UnboundedReceiver<WatcherCommand>,
    state: Arc<ProcessState>,
) {
    let status = loop {
        tokio::select! {
            biased;
            status = child.wait() => break status,
            command = control_rx.recv() => match command {
                Some(WatcherCommand::Signal(sig)) => deliver(&child, sig),
                Some(WatcherCommand::Kill) => {
                    if let Ok(None) = child.try_wait() {
                        assign(&state.killed, true);
                        if let Err(err) = child.start_kill() {
                            slog::warn!(slog_scope::logger(), "failed to kill process";
                                "pid" => child.id(),
                                "error" => %err
                            );
                        }
                    }
                }
                None => break child.wait().await,
            },
        }
    };

    let code = match status {
        // Death by signal has no exit code
        Ok(status) => status.code().unwrap_or(-1),
        Err(err) => {
            slog::warn!(slog_scope::logger(), "failed to wait for process"; "error" => %err);
            -1
        }
    };

    assign(&state.process, None);
    assign(&state.exit_time, Some(Local::now()));
    assign(&state.exit_code, Some(code));
}

fn deliver(child: &Child, sig: Signal) {
    let Some(pid) = child.id() else {
        return;
    };
    if let Err(errno) = signal::kill(Pid::from_raw(pid as i32), sig) {
        slog::warn!(slog_scope::logger(), "failed to signal process";
            "pid" => pid,
            "signal" => sig.as_str(),
            "error" => %errno
        );
    }
}

/// Posts `event` to the control loop once `delay` has elapsed
pub(crate) fn after(delay: Duration, events_tx: mpsc::UnboundedSender<ProcessEvent>, event: ProcessEvent) {
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        let _ = events_tx.send(event);
    });
}
