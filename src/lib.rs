//! Work queue device model and the virtual-time primitives that drive it.
//!
//! This crate only re-exports the workspace members so hosts can depend on a single package.

pub use aero_time as time;
pub use aero_work_queue as work_queue;
