//! The rotation override controller.
//!
//! - [`RotationOverrideController`]: the arm / follow / restore state machine
//!   together with the detectors feeding it. Synchronous and clock-injected.
//! - `ControlLoop`: the single task that owns the controller and serializes
//!   source events, the poll tick and timers onto it.
//! - [`RotationOverrideService`]: `start` / `stop` and the query surface.

mod control_loop;
mod message;
mod service;
mod state;

pub use message::{ControlMessage, ControlSender};
pub use service::RotationOverrideService;
pub use state::{
    DisarmReason, EvaluateOutcome, OverrideSnapshot, RotationOverrideController, FOLLOW_REASON,
    RESTORE_REASON,
};
