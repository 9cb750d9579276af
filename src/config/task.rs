//! Task definitions

use super::signal::StopSignal;
use crate::restart::RestartPolicy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

/// Where a child's output stream goes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StdioMode {
    /// Discard the stream
    Ignore,
    /// Share the supervisor's own stream
    Inherit,
    /// Write into a per-process log file under the log directory
    #[default]
    Redirect,
}

/// Immutable description of one task, compared field-wise on reload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskConfig {
    /// Unique task name
    pub name: String,
    /// Program to execute
    pub command: String,
    /// Arguments passed to the program
    #[serde(default, rename = "arguments")]
    pub args: Vec<String>,
    /// Spawn every instance as soon as the task supervisor launches
    #[serde(default = "default_start_at_launch")]
    pub start_at_launch: bool,
    /// Number of process instances
    #[serde(default = "default_instances")]
    pub instances: usize,
    /// Automatic restart policy
    #[serde(default)]
    pub restart: RestartPolicy,
    /// Cap on automatic retries, 0 = unlimited
    #[serde(default = "default_restart_attempts")]
    pub restart_attempts: u32,
    /// Exit code considered a success
    #[serde(default, rename = "expectedExitStatus")]
    pub expected_exit_code: i32,
    /// Time a process must stay up to count as started
    #[serde(default, rename = "startTime", with = "millis")]
    pub start_grace: Duration,
    /// Time between the stop signal and a forced kill
    #[serde(default = "default_stop_grace", rename = "stopTime", with = "millis")]
    pub stop_grace: Duration,
    /// Signal delivered on stop
    #[serde(default)]
    pub stop_signal: StopSignal,
    /// Standard output handling
    #[serde(default)]
    pub stdout: StdioMode,
    /// Standard error handling
    #[serde(default)]
    pub stderr: StdioMode,
    /// Variables added to the child's environment
    #[serde(default, rename = "environment")]
    pub env: BTreeMap<String, String>,
    /// Working directory of the child
    #[serde(default = "default_working_dir", rename = "workingDirectory")]
    pub working_dir: PathBuf,
    /// Umask applied to the child, `None` keeps the supervisor's
    #[serde(default, rename = "permissions", with = "umask")]
    pub umask: Option<u32>,
}

impl TaskConfig {
    /// Creates a task with the same defaults as the configuration file
    pub fn new(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            command: command.into(),
            args: Vec::new(),
            start_at_launch: default_start_at_launch(),
            instances: default_instances(),
            restart: RestartPolicy::default(),
            restart_attempts: default_restart_attempts(),
            expected_exit_code: 0,
            start_grace: Duration::ZERO,
            stop_grace: default_stop_grace(),
            stop_signal: StopSignal::default(),
            stdout: StdioMode::default(),
            stderr: StdioMode::default(),
            env: BTreeMap::new(),
            working_dir: default_working_dir(),
            umask: None,
        }
    }

    /// Sets the program arguments.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the instance count.
    pub fn with_instances(mut self, instances: usize) -> Self {
        self.instances = instances;
        self
    }

    /// Sets the restart policy and the attempt cap.
    pub fn with_restart(mut self, policy: RestartPolicy, attempts: u32) -> Self {
        self.restart = policy;
        self.restart_attempts = attempts;
        self
    }

    /// Sets the start and stop grace periods.
    pub fn with_grace(mut self, start: Duration, stop: Duration) -> Self {
        self.start_grace = start;
        self.stop_grace = stop;
        self
    }

    /// Sets the stdio mode of both output streams.
    pub fn with_stdio(mut self, mode: StdioMode) -> Self {
        self.stdout = mode;
        self.stderr = mode;
        self
    }

    /// Sets whether processes are started when the task is launched.
    pub fn with_start_at_launch(mut self, start: bool) -> Self {
        self.start_at_launch = start;
        self
    }

    /// Sets the exit code counted as success.
    pub fn with_expected_exit_code(mut self, code: i32) -> Self {
        self.expected_exit_code = code;
        self
    }

    /// Sets the signal delivered on stop.
    pub fn with_stop_signal(mut self, signal: StopSignal) -> Self {
        self.stop_signal = signal;
        self
    }
}

fn default_start_at_launch() -> bool {
    true
}

fn default_instances() -> usize {
    1
}

fn default_restart_attempts() -> u32 {
    5
}

fn default_stop_grace() -> Duration {
    Duration::from_millis(5000)
}

fn default_working_dir() -> PathBuf {
    PathBuf::from(".")
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

/// Umask values are written as octal digits, either `"022"` or `22`.
mod umask {
    use serde::{de, Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u64),
        Text(String),
    }

    pub fn serialize<S: Serializer>(value: &Option<u32>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(mask) => serializer.serialize_str(&format!("{mask:03o}")),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<u32>, D::Error> {
        let Some(raw) = Option::<Raw>::deserialize(deserializer)? else {
            return Ok(None);
        };
        let digits = match raw {
            Raw::Number(n) => n.to_string(),
            Raw::Text(s) => s,
        };
        u32::from_str_radix(&digits, 8).map(Some).map_err(|_| {
            de::Error::custom(format!("invalid permissions '{digits}': expected octal digits"))
        })
    }
}
