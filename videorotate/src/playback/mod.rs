//! Playback detection.
//!
//! Two views over the same playback-configuration stream:
//!
//! - [`PlaybackClassifier`]: "is video likely playing for subject X", using
//!   per-subject evidence timestamps and a grace window. Drives the override.
//! - [`ActivePlaybackSet`]: "is subject X playing anything", a debounced
//!   membership set for callers that make their own rotation decisions.

mod active_set;
mod classifier;
mod types;

pub use active_set::{ActivePlaybackSet, DEFAULT_PLAYING_DEBOUNCE};
pub use classifier::{PlaybackClassifier, ScanSource, DEFAULT_VIDEO_GRACE};
pub use types::{AudioUsage, ContentType, PlaybackConfig, PlaybackFlags};
