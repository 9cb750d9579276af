//! A process supervisor that keeps a fleet of OS processes running according
//! to a declarative configuration.
//!
//! The supervision tree has three tiers. The master supervisor owns one task
//! supervisor per configured task, each task supervisor owns one process
//! supervisor per instance, and each process supervisor drives the lifecycle
//! of a single OS process: spawning, start confirmation, restart policies,
//! stop with kill escalation, and status reporting. Every supervisor runs a
//! sequential control loop; tiers talk through unbounded channels.
//!
//! Control requests enter through a [`MasterHandle`], responses come back on
//! the channel returned by [`MasterHandle::start`].

pub mod cell;
pub mod config;
mod error;
pub mod logging;
mod master;
pub mod messages;
mod process;
mod restart;
pub mod shell;
pub mod signals;
mod task;
mod types;

// Re-export public API
pub use cell::{ReactiveCell, SubscriberError};
pub use config::{Config, ConfigError, ConfigSource, JsonFileSource, StdioMode, StopSignal, TaskConfig};
pub use error::{ControlError, SupervisorError};
pub use master::{MasterHandle, MasterSpec};
pub use messages::{FleetStatus, ParseRequestError, Request, Response};
pub use restart::{ExitContext, RestartPolicy};
pub use types::{Operation, OutputStream, ProcessId, Scope, TaskId};
