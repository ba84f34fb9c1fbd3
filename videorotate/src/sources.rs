//! External capabilities the rotation override consumes.
//!
//! The controller never talks to the platform directly. Each collaborator is
//! a trait object so hosts can plug in their own backends and tests can use
//! fakes:
//!
//! | Trait | Provides |
//! |-------|----------|
//! | [`RotationLockPolicy`] | Lock state and lock-at-angle writes |
//! | [`DisplayRotationSource`] | Current display rotation |
//! | [`ForegroundTaskSource`] | Top task lookup + task-stack notifications |
//! | [`PlaybackConfigSource`] | Playback snapshot + change notifications |
//! | [`OrientationSensor`] | Raw degree samples |
//! | [`IdentityResolver`] | Owner name to subject id |
//!
//! # Threading
//!
//! Sources may call back from any thread. They never touch controller state;
//! instead they push messages through the [`ControlSender`] handed to
//! `subscribe`, and the control loop processes them serially.

use std::fmt;
use std::sync::Arc;

use crate::controller::ControlSender;
use crate::error::{PolicyError, SourceError};
use crate::foreground::TaskInfo;
use crate::playback::PlaybackConfig;
use crate::rotation::Rotation;
use crate::types::SubjectId;

/// The user's rotation-lock policy store.
pub trait RotationLockPolicy: Send + Sync {
    /// Whether the user has locked rotation.
    fn is_locked(&self) -> Result<bool, PolicyError>;

    /// Locks rotation at `rotation`. `reason` identifies the caller in
    /// platform logs.
    fn set_lock_at_angle(
        &self,
        enabled: bool,
        rotation: Rotation,
        reason: &str,
    ) -> Result<(), PolicyError>;
}

/// Read access to the display's current rotation.
pub trait DisplayRotationSource: Send + Sync {
    fn current_rotation(&self) -> Result<Rotation, SourceError>;
}

/// The foreground task stack.
pub trait ForegroundTaskSource: Send + Sync {
    /// The current top task, at most one. `Ok(None)` when the stack is empty.
    fn current_top_task(&self) -> Result<Option<TaskInfo>, SourceError>;

    /// Registers for moved-to-front, stack-changed and removed notifications.
    fn subscribe(&self, sender: ControlSender) -> Result<Subscription, SourceError>;
}

/// The platform's audio playback configurations.
pub trait PlaybackConfigSource: Send + Sync {
    /// Full list of current playback configurations.
    fn active_playback_configs(&self) -> Result<Vec<PlaybackConfig>, SourceError>;

    /// Registers for change notifications. Each notification carries the full
    /// current list.
    ///
    /// Returns [`SourceError::Unavailable`] when the audio service is not up
    /// yet; the control loop retries later.
    fn subscribe(&self, sender: ControlSender) -> Result<Subscription, SourceError>;
}

/// The device orientation sensor.
pub trait OrientationSensor: Send + Sync {
    /// Whether the device has a sensor able to report orientation.
    fn can_detect_orientation(&self) -> bool;

    /// Starts delivering raw degree samples.
    fn subscribe(&self, sender: ControlSender) -> Result<Subscription, SourceError>;
}

/// Resolves owner (package) names to subject ids.
pub trait IdentityResolver: Send + Sync {
    fn resolve(&self, owner_name: &str) -> Result<SubjectId, SourceError>;
}

/// The full set of collaborators the control loop needs.
#[derive(Clone)]
pub struct Collaborators {
    pub policy: Arc<dyn RotationLockPolicy>,
    pub display: Arc<dyn DisplayRotationSource>,
    pub tasks: Arc<dyn ForegroundTaskSource>,
    pub playback: Arc<dyn PlaybackConfigSource>,
    pub sensor: Arc<dyn OrientationSensor>,
    pub identity: Arc<dyn IdentityResolver>,
}

impl fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}

/// A registration with an external source.
///
/// Dropping the subscription (or calling [`Subscription::cancel`]) runs the
/// source's unregister hook exactly once.
pub struct Subscription {
    name: &'static str,
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    /// Creates a subscription that runs `cancel` when released.
    pub fn new(name: &'static str, cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            name,
            cancel: Some(Box::new(cancel)),
        }
    }

    /// A subscription with nothing to unregister.
    pub fn detached(name: &'static str) -> Self {
        Self { name, cancel: None }
    }

    /// Name given at registration.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Unregisters now.
    pub fn cancel(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            tracing::debug!(listener = self.name, "Unregistering listener");
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("name", &self.name)
            .field("active", &self.cancel.is_some())
            .finish()
    }
}
