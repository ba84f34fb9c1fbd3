//! Control-queue messages.
//!
//! External sources call back from arbitrary threads. They never touch
//! controller state directly; they push a [`ControlMessage`] through a
//! [`ControlSender`] and the control loop processes messages serially, in
//! delivery order.

use tokio::sync::{mpsc, oneshot};

use super::state::OverrideSnapshot;
use crate::playback::PlaybackConfig;
use crate::types::{SubjectId, TaskId};

/// A unit of work for the control loop.
#[derive(Debug)]
pub enum ControlMessage {
    /// The task stack changed in some way.
    TaskStackChanged,

    /// A task was moved to the front.
    TaskMovedToFront(TaskId),

    /// A task was removed from the stack.
    TaskRemoved(TaskId),

    /// The playback source reported its full current configuration list.
    PlaybackConfigsChanged(Vec<PlaybackConfig>),

    /// Raw orientation sample, in degrees (or `-1` when unknown).
    OrientationChanged(i32),

    /// The orientation sensor went away.
    SensorUnavailable,

    /// Asks whether `subject` is in the debounced playing set.
    IsSubjectPlaying {
        subject: SubjectId,
        reply: oneshot::Sender<bool>,
    },

    /// Asks for a copy of the controller state.
    Snapshot {
        reply: oneshot::Sender<OverrideSnapshot>,
    },
}

/// Cloneable handle sources use to enqueue messages.
///
/// All methods return `false` once the control loop has gone away; sources
/// can use that to stop delivering.
#[derive(Debug, Clone)]
pub struct ControlSender {
    tx: mpsc::UnboundedSender<ControlMessage>,
}

impl ControlSender {
    /// Creates a sender and the receiving end of the control queue.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ControlMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Enqueues an arbitrary message.
    pub fn send(&self, message: ControlMessage) -> bool {
        self.tx.send(message).is_ok()
    }

    /// Also the signal for activity pin and unpin events.
    pub fn task_stack_changed(&self) -> bool {
        self.send(ControlMessage::TaskStackChanged)
    }

    pub fn task_moved_to_front(&self, task_id: TaskId) -> bool {
        self.send(ControlMessage::TaskMovedToFront(task_id))
    }

    pub fn task_removed(&self, task_id: TaskId) -> bool {
        self.send(ControlMessage::TaskRemoved(task_id))
    }

    pub fn playback_configs_changed(&self, configs: Vec<PlaybackConfig>) -> bool {
        self.send(ControlMessage::PlaybackConfigsChanged(configs))
    }

    pub fn orientation_changed(&self, degrees: i32) -> bool {
        self.send(ControlMessage::OrientationChanged(degrees))
    }

    pub fn sensor_unavailable(&self) -> bool {
        self.send(ControlMessage::SensorUnavailable)
    }

    /// Whether the control loop has dropped its receiver.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
