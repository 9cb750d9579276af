//! Process supervisor: lifecycle of one OS process instance.
//!
//! A process supervisor owns a [`state::ProcessState`] and a sequential
//! control loop. Spawning, exit watching and grace-period timers run on
//! detached tasks that report back through the state cells and an internal
//! event channel.

mod handle;
mod runtime;
mod spawn;
mod state;
mod watch;

pub(crate) use handle::ProcessHandle;
pub(crate) use runtime::ProcessRuntime;
