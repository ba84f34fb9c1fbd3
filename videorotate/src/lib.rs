//! videorotate - Sensor-following rotation override for fullscreen video
//!
//! While the user has rotation locked and a fullscreen app is playing video,
//! the display follows the orientation sensor. As soon as that stops being
//! true (app switch, task removal, playback stop, lock off, or service stop)
//! the rotation that was locked before the override is written back.
//!
//! # Architecture
//!
//! ```text
//!  ForegroundTaskSource ─┐
//!  PlaybackConfigSource ─┼─► ControlSender ─► ControlLoop ─► RotationOverrideController
//!  OrientationSensor ────┘                                    │  ForegroundTracker
//!                                                             │  PlaybackClassifier
//!                                                             │  OrientationTracker
//!                                                             ▼
//!                                   RotationLockPolicy writes + SharedPlaybackFlag
//! ```
//!
//! Platform access is injected through the traits in [`sources`]; the crate
//! itself performs no I/O besides reading its optional INI config.

pub mod config;
pub mod controller;
pub mod error;
pub mod foreground;
pub mod logging;
pub mod mapper;
pub mod playback;
pub mod rotation;
pub mod shared;
pub mod sources;
pub mod types;

pub use config::OverrideConfig;
pub use controller::{
    ControlMessage, ControlSender, EvaluateOutcome, OverrideSnapshot, RotationOverrideController,
    RotationOverrideService,
};
pub use error::{ConfigError, ControllerError, PolicyError, SourceError};
pub use foreground::{ForegroundState, ForegroundTracker, TaskInfo, WindowingMode};
pub use mapper::{OrientationTracker, RotationMapper, ORIENTATION_UNKNOWN};
pub use playback::{
    ActivePlaybackSet, AudioUsage, ContentType, PlaybackClassifier, PlaybackConfig, PlaybackFlags,
};
pub use rotation::Rotation;
pub use shared::SharedPlaybackFlag;
pub use sources::{
    Collaborators, DisplayRotationSource, ForegroundTaskSource, IdentityResolver,
    OrientationSensor, PlaybackConfigSource, RotationLockPolicy, Subscription,
};
pub use types::{SubjectId, TaskId};
