//! The control-queue actor.
//!
//! One task owns the [`RotationOverrideController`] and processes, in order:
//!
//! ```text
//!  sources ──► ControlSender ──► ┌──────────────┐
//!                                │              │──► evaluate()
//!  poll interval ──────────────► │ ControlLoop  │
//!  playing-set deadline ───────► │              │──► lock writes
//!  registration retry ─────────► └──────────────┘
//!                                      ▲
//!  shutdown token ─────────────────────┘ final restore, unregister
//! ```
//!
//! Timers are select branches on the same loop, not separate tasks, so they
//! interleave with source events in a single order.

use std::future::Future;

use tokio::sync::mpsc;
use tokio::time::{self, Duration, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::message::{ControlMessage, ControlSender};
use super::state::RotationOverrideController;
use crate::config::OverrideConfig;
use crate::sources::{Collaborators, Subscription};

/// Owns the controller and its source registrations for one service run.
pub(crate) struct ControlLoop {
    controller: RotationOverrideController,
    collaborators: Collaborators,
    config: OverrideConfig,
    sender: ControlSender,
    inbox: mpsc::UnboundedReceiver<ControlMessage>,
    subscriptions: Vec<Subscription>,
}

impl ControlLoop {
    pub(crate) fn new(
        controller: RotationOverrideController,
        collaborators: Collaborators,
        config: OverrideConfig,
        sender: ControlSender,
        inbox: mpsc::UnboundedReceiver<ControlMessage>,
    ) -> Self {
        Self {
            controller,
            collaborators,
            config,
            sender,
            inbox,
            subscriptions: Vec::new(),
        }
    }

    /// Runs until `shutdown` is cancelled, then restores and unregisters.
    pub(crate) async fn run(mut self, shutdown: CancellationToken) {
        info!(enabled = self.config.enabled, "Rotation override control loop starting");

        self.register_sensor();
        self.register_tasks();
        let mut retry_at = if self.register_playback() {
            None
        } else {
            Some(Instant::now() + self.config.registration_retry)
        };

        // Sources do not replay current state to new listeners.
        self.controller.on_task_stack_changed(Instant::now());
        self.controller.poll(Instant::now());

        // interval_at panics on a zero period.
        let period = self.config.poll_interval.max(Duration::from_millis(1));
        let mut poll = time::interval_at(Instant::now() + period, period);
        poll.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let playing_deadline = self.controller.next_playing_deadline();

            tokio::select! {
                biased;

                _ = shutdown.cancelled() => {
                    debug!("Rotation override control loop shutting down");
                    break;
                }

                Some(message) = self.inbox.recv() => {
                    self.handle(message);
                }

                _ = poll.tick() => {
                    self.controller.poll(Instant::now());
                }

                _ = sleep_until_opt(playing_deadline) => {
                    self.controller.expire_playing(Instant::now());
                }

                _ = sleep_until_opt(retry_at) => {
                    retry_at = if self.register_playback() {
                        None
                    } else {
                        Some(Instant::now() + self.config.registration_retry)
                    };
                }
            }
        }

        let outcome = self.controller.shutdown();
        debug!(?outcome, "Final restore");
        let count = self.subscriptions.len();
        self.subscriptions.clear();
        info!(unregistered = count, "Rotation override control loop stopped");
    }

    fn handle(&mut self, message: ControlMessage) {
        let now = Instant::now();
        match message {
            ControlMessage::TaskStackChanged => {
                self.controller.on_task_stack_changed(now);
            }
            ControlMessage::TaskMovedToFront(task_id) => {
                self.controller.on_task_moved_to_front(task_id, now);
            }
            ControlMessage::TaskRemoved(task_id) => {
                self.controller.on_task_removed(task_id, now);
            }
            ControlMessage::PlaybackConfigsChanged(configs) => {
                self.controller.on_playback_configs_changed(&configs, now);
            }
            ControlMessage::OrientationChanged(degrees) => {
                self.controller.on_orientation_sample(degrees, now);
            }
            ControlMessage::SensorUnavailable => {
                self.controller.set_sensor_available(false, now);
            }
            ControlMessage::IsSubjectPlaying { subject, reply } => {
                let _ = reply.send(self.controller.is_subject_playing(subject));
            }
            ControlMessage::Snapshot { reply } => {
                let _ = reply.send(self.controller.snapshot());
            }
        }
    }

    fn register_sensor(&mut self) {
        let now = Instant::now();
        if !self.collaborators.sensor.can_detect_orientation() {
            self.controller.set_sensor_available(false, now);
            return;
        }
        match self.collaborators.sensor.subscribe(self.sender.clone()) {
            Ok(subscription) => self.subscriptions.push(subscription),
            Err(err) => {
                warn!(error = %err, "Orientation sensor registration failed");
                self.controller.set_sensor_available(false, now);
            }
        }
    }

    fn register_tasks(&mut self) {
        match self.collaborators.tasks.subscribe(self.sender.clone()) {
            Ok(subscription) => self.subscriptions.push(subscription),
            Err(err) => warn!(error = %err, "Task stack registration failed"),
        }
    }

    /// Returns `false` if the playback source refused; the caller schedules a
    /// retry.
    fn register_playback(&mut self) -> bool {
        match self.collaborators.playback.subscribe(self.sender.clone()) {
            Ok(subscription) => {
                debug!("Playback listener registered");
                self.subscriptions.push(subscription);
                true
            }
            Err(err) => {
                warn!(
                    error = %err,
                    retry_ms = self.config.registration_retry.as_millis() as u64,
                    "Playback registration failed, will retry"
                );
                false
            }
        }
    }
}

/// Sleeps until `deadline`, or forever when there is none.
fn sleep_until_opt(deadline: Option<Instant>) -> impl Future<Output = ()> {
    async move {
        match deadline {
            Some(deadline) => time::sleep_until(deadline).await,
            None => std::future::pending::<()>().await,
        }
    }
}
