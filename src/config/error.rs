//! Configuration errors

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Reasons a configuration cannot be installed
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file is not a JSON document
    #[error("invalid config file format for {0} (expected a json file)")]
    Format(PathBuf),
    /// The file could not be read
    #[error("failed to read {path}: {source}")]
    Read {
        /// Configuration file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },
    /// The document does not match the schema
    #[error("error while parsing {path}: {reason}")]
    Parse {
        /// Configuration file
        path: PathBuf,
        /// Parser message
        reason: String,
    },
    /// The document defines no task
    #[error("no task to run")]
    NoTasks,
    /// Two tasks share a name
    #[error("duplicate task name '{0}'")]
    DuplicateName(String),
    /// A property holds a value outside its domain
    #[error("invalid value for property {property} of task '{task}': {value} ({info})")]
    InvalidProperty {
        /// Task name
        task: String,
        /// Property name as written in the file
        property: &'static str,
        /// Offending value
        value: String,
        /// What was expected instead
        info: String,
    },
    /// A working directory is missing or not a directory
    #[error("invalid working directory {path} for task '{task}': {reason}")]
    WorkingDirectory {
        /// Task name
        task: String,
        /// Configured directory
        path: PathBuf,
        /// What went wrong
        reason: String,
    },
    /// The log directory could not be created
    #[error("failed to open log directory {path}: {source}")]
    LogDirectory {
        /// Configured directory
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },
}
