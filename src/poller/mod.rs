//! Recurring job controller.
//!
//! Owns the single-flight repeating-refresh lifecycle: start/stop, the
//! configurable interval (floor of 5 seconds), cooperative cancellation at
//! loop checkpoints, and per-iteration error containment.

mod controller;
mod task;

pub use controller::{LoopPhase, RefreshController, MIN_WAIT_SECS};
pub use task::{RecurringTask, RefreshTask};
