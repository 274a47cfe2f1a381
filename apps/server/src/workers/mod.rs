//! Background workers
//!
//! The operation guard watches the admin database for long-running
//! client operations and kills them once they exceed the configured timeout.

mod classifier;
mod op_guard;

pub use classifier::{is_killable, skip_reason, SkipReason, KILLABLE_OP_KINDS};
pub use op_guard::{
    spawn_op_guard, GuardConfig, GuardHandle, OpGuard, TickReport, MIN_POLL_INTERVAL,
};
