//! Foreground task tracking.
//!
//! Resolves "what owns the display right now" into a [`ForegroundState`]:
//! the top task, its owning subject, and whether it is exclusive
//! fullscreen.

mod identity;
mod task;
mod tracker;

pub use identity::IdentityCache;
pub use task::{ForegroundState, TaskInfo, WindowingMode};
pub use tracker::ForegroundTracker;
