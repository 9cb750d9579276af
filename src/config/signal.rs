//! Stop-signal names accepted in task definitions

use nix::sys::signal::Signal;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Signals a task may use as its graceful stop signal
const STOP_SIGNALS: &[(&str, Signal)] = &[
    ("SIGINT", Signal::SIGINT),
    ("SIGQUIT", Signal::SIGQUIT),
    ("SIGTERM", Signal::SIGTERM),
    ("SIGUSR1", Signal::SIGUSR1),
    ("SIGUSR2", Signal::SIGUSR2),
    ("SIGSTOP", Signal::SIGSTOP),
    ("SIGTSTP", Signal::SIGTSTP),
];

/// Signal delivered to a process when a stop is requested
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StopSignal(Signal);

impl StopSignal {
    /// Underlying OS signal
    pub fn signal(&self) -> Signal {
        self.0
    }

    /// Configuration name of the signal, e.g. `SIGTERM`
    pub fn name(&self) -> &'static str {
        self.0.as_str()
    }

    /// Names accepted by [`StopSignal::from_str`]
    pub fn accepted_names() -> impl Iterator<Item = &'static str> {
        STOP_SIGNALS.iter().map(|(name, _)| *name)
    }
}

impl Default for StopSignal {
    fn default() -> Self {
        Self(Signal::SIGQUIT)
    }
}

impl fmt::Display for StopSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error for a signal name outside the accepted table
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported stop signal '{0}'")]
pub struct UnknownSignal(pub String);

impl FromStr for StopSignal {
    type Err = UnknownSignal;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        STOP_SIGNALS
            .iter()
            .find(|(name, _)| *name == s)
            .map(|(_, signal)| StopSignal(*signal))
            .ok_or_else(|| UnknownSignal(s.to_string()))
    }
}

impl Serialize for StopSignal {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for StopSignal {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(|err: UnknownSignal| {
            let accepted: Vec<_> = StopSignal::accepted_names().collect();
            de::Error::custom(format!("{err}, must be one of {}", accepted.join(", ")))
        })
    }
}
