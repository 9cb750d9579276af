//! Message protocol binding the three supervision tiers.
//!
//! Each tier has one closed enum per direction. Outputs carry their routing
//! class in their shape: `Local` replies answer a single addressed request and
//! are forwarded upward immediately, `Global` fragments come from a broadcast
//! and are aggregated from every child before going further up.

mod master;
mod process;
mod task;

pub use master::{FleetStatus, ParseRequestError, Request, Response};
pub use process::{ProcessInput, ProcessOutput, ProcessReply, ProcessStatus};
pub use task::{TaskInput, TaskOutput, TaskReply, TaskStatus};
