//! Task supervisor: owns the process supervisors of one configured task

mod handle;
mod runtime;

pub(crate) use handle::{PreparedTask, TaskHandle};
