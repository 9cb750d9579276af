//! Master supervisor: root of the tree, one task supervisor per configured task

mod handle;
mod reload;
mod runtime;
mod spec;

pub use handle::MasterHandle;
pub use spec::MasterSpec;
