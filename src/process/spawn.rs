//! OS process description and per-process log files

use crate::config::{StdioMode, TaskConfig};
use crate::error::SupervisorError;
use crate::types::{OutputStream, ProcessId, TaskId};
use chrono::Local;
use std::fs::{File, OpenOptions};
use std::io;
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

/// Output targets of one process supervisor, opened once and shared by every
/// incarnation
#[derive(Debug)]
pub(crate) struct LogFiles {
    stdout: Option<File>,
    stderr: Option<File>,
}

impl LogFiles {
    /// Opens the `redirect` targets of `config` under `log_dir`
    pub(crate) fn open(
        config: &TaskConfig,
        log_dir: &Path,
        task_id: TaskId,
        process_id: ProcessId,
    ) -> Result<Self, SupervisorError> {
        let open = |mode: StdioMode, stream: OutputStream| -> Result<Option<File>, SupervisorError> {
            if mode != StdioMode::Redirect {
                return Ok(None);
            }
            let path = log_file_path(log_dir, task_id, process_id, stream);
            OpenOptions::new()
                .create(true)
                .append(true)
                .mode(0o666)
                .open(&path)
                .map(Some)
                .map_err(|source| SupervisorError::LogFile { path, source })
        };

        Ok(Self {
            stdout: open(config.stdout, OutputStream::Stdout)?,
            stderr: open(config.stderr, OutputStream::Stderr)?,
        })
    }

    fn stdio(&self, mode: StdioMode, stream: OutputStream) -> io::Result<Stdio> {
        let file = match stream {
            OutputStream::Stdout => self.stdout.as_ref(),
            OutputStream::Stderr => self.stderr.as_ref(),
        };
        match (mode, file) {
            (StdioMode::Redirect, Some(file)) => Ok(Stdio::from(file.try_clone()?)),
            (StdioMode::Inherit, _) => Ok(Stdio::inherit()),
            _ => Ok(Stdio::null()),
        }
    }
}

/// `<log_dir>/<task>-<process>_<YYMMDD_HHMMSS>-<stream>.log`
fn log_file_path(
    log_dir: &Path,
    task_id: TaskId,
    process_id: ProcessId,
    stream: OutputStream,
) -> PathBuf {
    log_dir.join(format!(
        "{}-{}_{}-{}.log",
        task_id,
        process_id,
        Local::now().format("%y%m%d_%H%M%S"),
        stream.as_str()
    ))
}

/// Builds a fresh command for one incarnation.
///
/// The environment is overlaid on the supervisor's own and the umask, when
/// configured, is applied in the child between fork and exec.
pub(crate) fn build_command(config: &TaskConfig, logs: &LogFiles) -> io::Result<Command> {
    let mut command = Command::new(&config.command);
    command
        .args(&config.args)
        .envs(&config.env)
        .current_dir(&config.working_dir)
        .stdin(Stdio::null())
        .stdout(logs.stdio(config.stdout, OutputStream::Stdout)?)
        .stderr(logs.stdio(config.stderr, OutputStream::Stderr)?)
        .kill_on_drop(true);

    if let Some(mask) = config.umask {
        let mode = nix::sys::stat::Mode::from_bits_truncate(mask as nix::libc::mode_t);
        // SAFETY: umask(2) is async-signal-safe and touches no shared state
        unsafe {
            command.pre_exec(move || {
                nix::sys::stat::umask(mode);
                Ok(())
            });
        }
    }

    Ok(command)
}
