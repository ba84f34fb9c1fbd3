//! The arm / follow / restore state machine.
//!
//! Every trigger funnels into one [`RotationOverrideController::evaluate`]
//! pass. That pass is the only place that arms, and every disarm goes
//! through a single restore routine that writes the rotation captured when
//! the cycle was armed.
//!
//! ```text
//!                    lock on + fullscreen foreground + recent video
//!   ┌──────────┐ ─────────────────────────────────────────────────► ┌─────────┐
//!   │ Disarmed │   capture restore rotation, publish flag            │  Armed  │──┐
//!   └──────────┘ ◄───────────────────────────────────────────────── └─────────┘  │ follow
//!                    lock off | foreground invalid | other task       ▲          │ sensor
//!                    video gone | armed task removed | stop           └──────────┘
//!                    (write restore rotation, clear flag)
//! ```
//!
//! Reads that fail leave the machine untouched; the next event re-evaluates.

use std::fmt;
use std::sync::Arc;

use tokio::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::config::OverrideConfig;
use crate::foreground::{ForegroundState, ForegroundTracker};
use crate::mapper::{OrientationTracker, RotationMapper, SampleOutcome};
use crate::playback::{ActivePlaybackSet, PlaybackClassifier, PlaybackConfig};
use crate::rotation::Rotation;
use crate::shared::SharedPlaybackFlag;
use crate::sources::{Collaborators, DisplayRotationSource, PlaybackConfigSource, RotationLockPolicy};
use crate::types::{SubjectId, TaskId};

/// Caller tag for lock writes that follow the sensor.
pub const FOLLOW_REASON: &str = "videorotate#followSensor";

/// Caller tag for lock writes that restore the user's rotation.
pub const RESTORE_REASON: &str = "videorotate#restore";

/// Data for one open arm cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ArmedCycle {
    /// Foreground task the cycle was armed for.
    pub task_id: TaskId,
    /// Display rotation captured at arm time.
    pub restore_rotation: Rotation,
    /// Last rotation written or observed as already applied.
    pub last_applied: Option<Rotation>,
}

/// Override state. At most one cycle is open at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum OverridePhase {
    #[default]
    Disarmed,
    Armed(ArmedCycle),
}

/// Why an armed cycle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisarmReason {
    LockOff,
    /// Disabled by config or no usable orientation sensor.
    Inert,
    ForegroundInvalid,
    TaskSwitched,
    VideoStopped,
    TaskRemoved,
    Stopped,
}

impl fmt::Display for DisarmReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DisarmReason::LockOff => "lock off",
            DisarmReason::Inert => "inert",
            DisarmReason::ForegroundInvalid => "foreground invalid",
            DisarmReason::TaskSwitched => "task switched",
            DisarmReason::VideoStopped => "video stopped",
            DisarmReason::TaskRemoved => "task removed",
            DisarmReason::Stopped => "stopped",
        };
        f.write_str(s)
    }
}

/// Result of one evaluation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvaluateOutcome {
    /// A read or write failed; state unchanged.
    Skipped,
    /// Disarmed and staying disarmed.
    Idle,
    /// A new cycle was armed in this pass.
    Armed { task_id: TaskId, restore: Rotation },
    /// Armed, nothing to write.
    Holding,
    /// Armed, wrote a new lock angle.
    Applied(Rotation),
    /// Restored the captured rotation and disarmed.
    Restored(Rotation),
    /// The restore write failed; the cycle stays open.
    RestoreFailed,
}

/// Copy of the controller state for diagnostics and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverrideSnapshot {
    pub armed: bool,
    pub armed_task_id: Option<TaskId>,
    pub restore_rotation: Option<Rotation>,
    pub desired_rotation: Rotation,
    pub last_applied_rotation: Option<Rotation>,
    pub foreground: ForegroundState,
    pub sensor_available: bool,
}

/// The rotation override state machine and the detectors feeding it.
///
/// Single-threaded by construction: the control loop owns it and calls into
/// it once per message. All time-dependent operations take `now`.
pub struct RotationOverrideController {
    policy: Arc<dyn RotationLockPolicy>,
    display: Arc<dyn DisplayRotationSource>,
    playback: Arc<dyn PlaybackConfigSource>,
    shared: Arc<SharedPlaybackFlag>,
    foreground: ForegroundTracker,
    classifier: PlaybackClassifier,
    active: ActivePlaybackSet,
    orientation: OrientationTracker,
    video_grace: Duration,
    enabled: bool,
    sensor_available: bool,
    phase: OverridePhase,
}

impl RotationOverrideController {
    pub fn new(
        config: &OverrideConfig,
        collaborators: &Collaborators,
        shared: Arc<SharedPlaybackFlag>,
    ) -> Self {
        Self {
            policy: Arc::clone(&collaborators.policy),
            display: Arc::clone(&collaborators.display),
            playback: Arc::clone(&collaborators.playback),
            shared,
            foreground: ForegroundTracker::new(
                Arc::clone(&collaborators.tasks),
                Arc::clone(&collaborators.identity),
            ),
            classifier: PlaybackClassifier::new(),
            active: ActivePlaybackSet::new(config.playing_debounce),
            orientation: OrientationTracker::new(
                RotationMapper::new(config.sector_half_width_deg),
                config.orientation_debounce,
            ),
            video_grace: config.video_grace,
            enabled: config.enabled,
            sensor_available: true,
            phase: OverridePhase::Disarmed,
        }
    }

    pub fn is_armed(&self) -> bool {
        matches!(self.phase, OverridePhase::Armed(_))
    }

    pub fn snapshot(&self) -> OverrideSnapshot {
        let cycle = match self.phase {
            OverridePhase::Armed(cycle) => Some(cycle),
            OverridePhase::Disarmed => None,
        };
        OverrideSnapshot {
            armed: cycle.is_some(),
            armed_task_id: cycle.map(|c| c.task_id),
            restore_rotation: cycle.map(|c| c.restore_rotation),
            desired_rotation: self.orientation.desired(),
            last_applied_rotation: cycle.and_then(|c| c.last_applied),
            foreground: self.foreground.state().clone(),
            sensor_available: self.sensor_available,
        }
    }

    // =========================================================================
    // Event handlers
    // =========================================================================

    pub fn on_task_stack_changed(&mut self, now: Instant) -> EvaluateOutcome {
        self.foreground.on_task_stack_changed();
        self.evaluate(now)
    }

    pub fn on_task_moved_to_front(&mut self, task_id: TaskId, now: Instant) -> EvaluateOutcome {
        self.foreground.on_task_moved_to_front(task_id);
        self.evaluate(now)
    }

    /// Handles a task removal. Removing the armed task restores right away,
    /// before the foreground is re-read.
    pub fn on_task_removed(&mut self, task_id: TaskId, now: Instant) -> EvaluateOutcome {
        let restored = match self.phase {
            OverridePhase::Armed(cycle) if cycle.task_id == task_id => {
                Some(self.restore_and_disarm(DisarmReason::TaskRemoved))
            }
            _ => None,
        };

        self.foreground.on_task_removed(task_id);
        let outcome = self.evaluate(now);
        restored.unwrap_or(outcome)
    }

    pub fn on_playback_configs_changed(
        &mut self,
        configs: &[PlaybackConfig],
        now: Instant,
    ) -> EvaluateOutcome {
        self.classifier.on_playback_configs_changed(configs, now);
        self.active.update(configs, now);
        self.evaluate(now)
    }

    /// Feeds a raw orientation sample. Returns `None` when the sample was
    /// filtered out or changed nothing while disarmed.
    pub fn on_orientation_sample(&mut self, degrees: i32, now: Instant) -> Option<EvaluateOutcome> {
        match self.orientation.on_sample(degrees, now) {
            SampleOutcome::Ignored => None,
            SampleOutcome::Changed { from, to } => {
                debug!(from = %from, to = %to, "Desired rotation changed");
                Some(self.evaluate(now))
            }
            SampleOutcome::Unchanged(_) if self.is_armed() => Some(self.evaluate(now)),
            SampleOutcome::Unchanged(_) => None,
        }
    }

    /// Marks the orientation sensor as present or gone. Without a sensor the
    /// controller never arms.
    pub fn set_sensor_available(&mut self, available: bool, now: Instant) -> EvaluateOutcome {
        if self.sensor_available != available {
            if available {
                info!("Orientation sensor available");
            } else {
                warn!("Orientation sensor unavailable, rotation override inert");
            }
            self.sensor_available = available;
        }
        self.evaluate(now)
    }

    /// Periodic safety net: re-scans the playback snapshot while a foreground
    /// subject is known, then evaluates.
    pub fn poll(&mut self, now: Instant) -> EvaluateOutcome {
        if self.foreground.state().is_valid() {
            match self.playback.active_playback_configs() {
                Ok(snapshot) => {
                    self.classifier.rescan(&snapshot, now);
                    self.active.update(&snapshot, now);
                }
                Err(err) => debug!(error = %err, "Playback snapshot unavailable"),
            }
        }
        self.evaluate(now)
    }

    /// Earliest pending removal from the playing set.
    pub fn next_playing_deadline(&self) -> Option<Instant> {
        self.active.next_deadline()
    }

    /// Drops subjects whose removal deadline passed. Evaluates only if the
    /// set changed.
    pub fn expire_playing(&mut self, now: Instant) -> Option<EvaluateOutcome> {
        let removed = self.active.expire(now);
        if removed.is_empty() {
            return None;
        }
        Some(self.evaluate(now))
    }

    /// Whether `subject` is in the debounced playing set.
    pub fn is_subject_playing(&self, subject: SubjectId) -> bool {
        self.active.contains(subject)
    }

    // =========================================================================
    // Evaluation
    // =========================================================================

    /// Runs one evaluation pass.
    pub fn evaluate(&mut self, now: Instant) -> EvaluateOutcome {
        let locked = match self.policy.is_locked() {
            Ok(locked) => locked,
            Err(err) => {
                warn!(error = %err, "Rotation lock read failed, skipping evaluation");
                return EvaluateOutcome::Skipped;
            }
        };

        let task_id = match self.check_conditions(locked, now) {
            Ok(task_id) => task_id,
            Err(reason) => {
                return match self.phase {
                    OverridePhase::Disarmed => EvaluateOutcome::Idle,
                    OverridePhase::Armed(_) => self.restore_and_disarm(reason),
                };
            }
        };

        if self.is_armed() {
            return self.apply_desired_rotation();
        }

        let restore = match self.display.current_rotation() {
            Ok(rotation) => rotation,
            Err(err) => {
                warn!(error = %err, "Display rotation read failed, not arming");
                return EvaluateOutcome::Skipped;
            }
        };

        self.phase = OverridePhase::Armed(ArmedCycle {
            task_id,
            restore_rotation: restore,
            last_applied: None,
        });
        self.shared.set_playing_fullscreen_video(true);
        info!(
            task_id = %task_id,
            subject = ?self.foreground.state().subject.map(|s| s.0),
            restore = %restore,
            "Arming rotation override"
        );

        self.apply_desired_rotation();
        EvaluateOutcome::Armed { task_id, restore }
    }

    /// Returns the foreground task to arm for, or why the override must not
    /// be active.
    fn check_conditions(&self, locked: bool, now: Instant) -> Result<TaskId, DisarmReason> {
        if !locked {
            return Err(DisarmReason::LockOff);
        }
        if !self.enabled || !self.sensor_available {
            return Err(DisarmReason::Inert);
        }

        let state = self.foreground.state();
        let (task_id, subject) = match (state.task_id, state.subject) {
            (Some(task_id), Some(subject)) if state.is_exclusive_fullscreen => (task_id, subject),
            _ => return Err(DisarmReason::ForegroundInvalid),
        };

        if let OverridePhase::Armed(cycle) = self.phase {
            if cycle.task_id != task_id {
                return Err(DisarmReason::TaskSwitched);
            }
        }

        if !self
            .classifier
            .is_video_likely_active(subject, self.video_grace, now)
        {
            return Err(DisarmReason::VideoStopped);
        }

        Ok(task_id)
    }

    fn apply_desired_rotation(&mut self) -> EvaluateOutcome {
        let OverridePhase::Armed(cycle) = &mut self.phase else {
            return EvaluateOutcome::Idle;
        };

        let desired = self.orientation.desired();
        let current = match self.display.current_rotation() {
            Ok(rotation) => rotation,
            Err(err) => {
                warn!(error = %err, "Display rotation read failed");
                return EvaluateOutcome::Skipped;
            }
        };

        // The app may already have rotated on its own.
        if current == desired {
            cycle.last_applied = Some(current);
            return EvaluateOutcome::Holding;
        }
        if cycle.last_applied == Some(desired) {
            return EvaluateOutcome::Holding;
        }

        match self.policy.set_lock_at_angle(true, desired, FOLLOW_REASON) {
            Ok(()) => {
                cycle.last_applied = Some(desired);
                info!(task_id = %cycle.task_id, from = %current, to = %desired, "Following sensor");
                EvaluateOutcome::Applied(desired)
            }
            Err(err) => {
                warn!(rotation = %desired, error = %err, "Failed to apply rotation");
                EvaluateOutcome::Skipped
            }
        }
    }

    fn restore_and_disarm(&mut self, reason: DisarmReason) -> EvaluateOutcome {
        let OverridePhase::Armed(cycle) = self.phase else {
            return EvaluateOutcome::Idle;
        };

        match self
            .policy
            .set_lock_at_angle(true, cycle.restore_rotation, RESTORE_REASON)
        {
            Ok(()) => {
                info!(
                    task_id = %cycle.task_id,
                    rotation = %cycle.restore_rotation,
                    reason = %reason,
                    "Restored locked rotation"
                );
                self.disarm();
                EvaluateOutcome::Restored(cycle.restore_rotation)
            }
            Err(err) => {
                warn!(
                    task_id = %cycle.task_id,
                    rotation = %cycle.restore_rotation,
                    reason = %reason,
                    error = %err,
                    "Restore failed, staying armed"
                );
                EvaluateOutcome::RestoreFailed
            }
        }
    }

    fn disarm(&mut self) {
        self.phase = OverridePhase::Disarmed;
        self.shared.set_playing_fullscreen_video(false);
        if let Some(saved) = self.shared.consume_saved_lock_rotation() {
            debug!(rotation = %saved, "Discarded saved lock rotation");
        }
    }

    /// Final restore plus a full reset. The state is cleared even if the
    /// restore write fails.
    pub fn shutdown(&mut self) -> EvaluateOutcome {
        let outcome = self.restore_and_disarm(DisarmReason::Stopped);
        self.disarm();
        self.classifier.clear();
        self.active.clear();
        self.foreground.reset();
        self.orientation.reset();
        outcome
    }
}

impl fmt::Debug for RotationOverrideController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RotationOverrideController")
            .field("phase", &self.phase)
            .field("foreground", self.foreground.state())
            .field("enabled", &self.enabled)
            .field("sensor_available", &self.sensor_available)
            .finish_non_exhaustive()
    }
}
