//! Lifecycle surface for the rotation override.

use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::control_loop::ControlLoop;
use super::message::{ControlMessage, ControlSender};
use super::state::{OverrideSnapshot, RotationOverrideController};
use crate::config::OverrideConfig;
use crate::error::ControllerError;
use crate::shared::SharedPlaybackFlag;
use crate::sources::Collaborators;
use crate::types::SubjectId;

struct RunningLoop {
    sender: ControlSender,
    shutdown: CancellationToken,
    handle: JoinHandle<()>,
}

/// Starts and stops the control loop and answers queries against it.
///
/// # Example
///
/// ```ignore
/// let shared = Arc::new(SharedPlaybackFlag::new());
/// let mut service = RotationOverrideService::new(OverrideConfig::default(), collaborators, shared);
/// service.start()?;
///
/// // Later, from the host's teardown path:
/// service.stop().await?;
/// ```
pub struct RotationOverrideService {
    config: OverrideConfig,
    collaborators: Collaborators,
    shared: Arc<SharedPlaybackFlag>,
    running: Option<RunningLoop>,
}

impl RotationOverrideService {
    pub fn new(
        config: OverrideConfig,
        collaborators: Collaborators,
        shared: Arc<SharedPlaybackFlag>,
    ) -> Self {
        Self {
            config,
            collaborators,
            shared,
            running: None,
        }
    }

    /// Spawns the control loop on the current Tokio runtime. Calling it while
    /// already running does nothing.
    pub fn start(&mut self) -> Result<(), ControllerError> {
        if self.running.is_some() {
            tracing::debug!("Rotation override already running");
            return Ok(());
        }

        let runtime = Handle::try_current().map_err(|_| ControllerError::NoRuntime)?;

        let (sender, inbox) = ControlSender::channel();
        let controller =
            RotationOverrideController::new(&self.config, &self.collaborators, Arc::clone(&self.shared));
        let control_loop = ControlLoop::new(
            controller,
            self.collaborators.clone(),
            self.config.clone(),
            sender.clone(),
            inbox,
        );

        let shutdown = CancellationToken::new();
        let handle = runtime.spawn(control_loop.run(shutdown.clone()));

        self.running = Some(RunningLoop {
            sender,
            shutdown,
            handle,
        });
        Ok(())
    }

    /// Stops the control loop, waiting for its final restore and listener
    /// teardown. Calling it while stopped does nothing.
    pub async fn stop(&mut self) -> Result<(), ControllerError> {
        let Some(running) = self.running.take() else {
            return Ok(());
        };

        running.shutdown.cancel();
        running
            .handle
            .await
            .map_err(|e| ControllerError::Join(e.to_string()))
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Handle for delivering source events, if running.
    pub fn sender(&self) -> Option<ControlSender> {
        self.running.as_ref().map(|r| r.sender.clone())
    }

    /// The flag shared with the rotation-proposal path.
    pub fn shared_flag(&self) -> Arc<SharedPlaybackFlag> {
        Arc::clone(&self.shared)
    }

    /// Whether `subject` currently has media or game playback, debounced.
    pub async fn is_subject_playing(&self, subject: SubjectId) -> Result<bool, ControllerError> {
        self.request(|reply| ControlMessage::IsSubjectPlaying { subject, reply })
            .await
    }

    /// A copy of the controller state, taken after all earlier messages were
    /// processed.
    pub async fn snapshot(&self) -> Result<OverrideSnapshot, ControllerError> {
        self.request(|reply| ControlMessage::Snapshot { reply }).await
    }

    async fn request<T>(
        &self,
        message: impl FnOnce(oneshot::Sender<T>) -> ControlMessage,
    ) -> Result<T, ControllerError> {
        let running = self.running.as_ref().ok_or(ControllerError::NotRunning)?;
        let (tx, rx) = oneshot::channel();
        if !running.sender.send(message(tx)) {
            return Err(ControllerError::ChannelClosed);
        }
        rx.await.map_err(|_| ControllerError::ChannelClosed)
    }
}

impl Drop for RotationOverrideService {
    fn drop(&mut self) {
        // The loop still runs its final restore after cancellation.
        if let Some(running) = self.running.take() {
            running.shutdown.cancel();
        }
    }
}

impl std::fmt::Debug for RotationOverrideService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RotationOverrideService")
            .field("config", &self.config)
            .field("running", &self.running.is_some())
            .finish_non_exhaustive()
    }
}
