//! Configuration model, validation and loading

mod error;
mod signal;
mod source;
mod task;

pub use error::ConfigError;
pub use signal::{StopSignal, UnknownSignal};
pub use source::{ConfigSource, JsonFileSource};
pub use task::{StdioMode, TaskConfig};

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;

/// Largest umask accepted (`777` octal)
const MAX_UMASK: u32 = 0o777;

/// One generation of configuration: the ordered task list and the log directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Tasks in id order
    pub tasks: Vec<TaskConfig>,
    /// Directory receiving redirected output
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
}

impl Config {
    /// Creates a configuration from tasks and a log directory
    pub fn new(tasks: Vec<TaskConfig>, log_dir: impl Into<PathBuf>) -> Self {
        Self {
            tasks,
            log_dir: log_dir.into(),
        }
    }

    /// Checks every invariant that does not need the filesystem
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tasks.is_empty() {
            return Err(ConfigError::NoTasks);
        }

        let mut names = HashSet::with_capacity(self.tasks.len());
        for task in &self.tasks {
            validate_task(task)?;
            if !names.insert(task.name.as_str()) {
                return Err(ConfigError::DuplicateName(task.name.clone()));
            }
        }
        Ok(())
    }

    /// True when the change from `self` to `next` needs a whole new generation
    pub fn requires_full_rebuild(&self, next: &Config) -> bool {
        self.tasks.len() != next.tasks.len() || self.log_dir != next.log_dir
    }

    /// Ids of the tasks whose definition differs between `self` and `next`.
    ///
    /// Only meaningful when both configurations have the same task count.
    pub fn changed_tasks(&self, next: &Config) -> Vec<usize> {
        self.tasks
            .iter()
            .zip(&next.tasks)
            .enumerate()
            .filter(|(_, (old, new))| old != new)
            .map(|(id, _)| id)
            .collect()
    }
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("/var/log/taskmaster")
}

fn validate_task(task: &TaskConfig) -> Result<(), ConfigError> {
    let invalid = |property: &'static str, value: String, info: &str| ConfigError::InvalidProperty {
        task: task.name.clone(),
        property,
        value,
        info: info.to_string(),
    };

    let valid_name = !task.name.is_empty()
        && task
            .name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if !valid_name {
        return Err(invalid(
            "name",
            task.name.clone(),
            "must match the pattern /^[a-zA-Z0-9_-]+$/",
        ));
    }
    if task.command.is_empty() {
        return Err(invalid("command", String::new(), "must not be empty"));
    }
    if task.instances == 0 {
        return Err(invalid("instances", "0".into(), "must be 1 or greater"));
    }
    if let Some(mask) = task.umask {
        if mask > MAX_UMASK {
            return Err(invalid(
                "permissions",
                format!("{mask:o}"),
                "umask value cannot be greater than 777",
            ));
        }
    }
    Ok(())
}
