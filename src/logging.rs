//! Logger construction for the binary
//!
//! Records go to stderr and, once the configuration is known, are duplicated
//! into `<log_dir>/taskmaster_<YYMMDD_HHMMSS>.log`. The supervision tree only
//! ever logs through `slog_scope::logger()`; installing a logger is left to
//! the program embedding it.

use chrono::Local;
use slog::Drain;
use std::fs::{File, OpenOptions};
use std::io;
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};

/// Builds a logger writing to stderr, and also to `log_file` when given.
///
/// Both outputs sit behind one `slog_async` worker. Dropping the last clone
/// of the logger flushes pending records.
pub fn build(level: slog::Level, log_file: Option<File>) -> slog::Logger {
    let decorator = slog_term::TermDecorator::new().stderr().build();
    let term = slog_term::FullFormat::new(decorator).build().fuse();

    match log_file {
        Some(file) => {
            let decorator = slog_term::PlainDecorator::new(file);
            let plain = slog_term::FullFormat::new(decorator).build().fuse();
            root(slog::Duplicate::new(term, plain).ignore_res(), level)
        }
        None => root(term, level),
    }
}

fn root<D>(drain: D, level: slog::Level) -> slog::Logger
where
    D: Drain<Ok = (), Err = slog::Never> + Send + 'static,
{
    let drain = slog_async::Async::new(drain).build().fuse();
    let drain = slog::LevelFilter::new(drain, level).fuse();
    slog::Logger::root(drain, slog::o!("app" => "taskmaster"))
}

/// `<log_dir>/taskmaster_<YYMMDD_HHMMSS>.log`
pub fn log_file_path(log_dir: &Path) -> PathBuf {
    log_dir.join(format!("taskmaster_{}.log", Local::now().format("%y%m%d_%H%M%S")))
}

/// Opens the supervisor's own log file for appending
pub fn open_log_file(log_dir: &Path) -> io::Result<(PathBuf, File)> {
    let path = log_file_path(log_dir);
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .mode(0o666)
        .open(&path)?;
    Ok((path, file))
}

/// Parses a level name such as `info` or `debug`
pub fn parse_level(name: &str) -> Result<slog::Level, String> {
    name.parse::<slog::Level>()
        .map_err(|()| format!("unknown log level '{name}'"))
}
