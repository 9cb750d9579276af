//! Restart policies and the automatic-retry decision

use serde::{Deserialize, Serialize};
use std::fmt;

/// When a process that exited on its own is spawned again
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RestartPolicy {
    /// Restart after every exit (`always`)
    Always,
    /// Never restart (`never`)
    Never,
    /// Restart when the exit code differs from the expected one (`on-failure`)
    OnFailure,
    /// Like `on-failure`, but never after a user stop (`unless-stopped`)
    UnlessStopped,
}

impl Default for RestartPolicy {
    fn default() -> Self {
        Self::OnFailure
    }
}

impl fmt::Display for RestartPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RestartPolicy::Always => "always",
            RestartPolicy::Never => "never",
            RestartPolicy::OnFailure => "on-failure",
            RestartPolicy::UnlessStopped => "unless-stopped",
        };
        f.write_str(name)
    }
}

/// Everything the retry decision looks at when an incarnation exits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitContext {
    /// Configured policy
    pub policy: RestartPolicy,
    /// Configured attempt cap, 0 = unlimited
    pub max_attempts: u32,
    /// Automatic retries already used
    pub attempts: u32,
    /// Process exited before its start grace period elapsed
    pub stopped_early: bool,
    /// A user stop was recorded before the exit
    pub user_stopped: bool,
    /// Observed exit code
    pub exit_code: i32,
    /// Configured expected exit code
    pub expected_exit_code: i32,
}

impl ExitContext {
    /// Whether the attempt cap still allows another retry
    pub fn attempts_remain(&self) -> bool {
        self.max_attempts == 0 || self.attempts < self.max_attempts
    }

    /// Decides whether this exit schedules an automatic retry
    pub fn should_retry(&self) -> bool {
        if !self.attempts_remain() {
            return false;
        }
        let unexpected = self.exit_code != self.expected_exit_code;

        if self.stopped_early {
            return match self.policy {
                RestartPolicy::Never => false,
                RestartPolicy::UnlessStopped => !self.user_stopped,
                RestartPolicy::Always | RestartPolicy::OnFailure => true,
            };
        }

        match self.policy {
            RestartPolicy::Always => true,
            RestartPolicy::Never => false,
            RestartPolicy::OnFailure => unexpected,
            RestartPolicy::UnlessStopped => !self.user_stopped && unexpected,
        }
    }
}
