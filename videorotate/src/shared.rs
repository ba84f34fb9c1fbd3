//! Playback flag shared with the platform's rotation-proposal path.
//!
//! The controller publishes whether it is currently overriding the lock. An
//! unrelated reader, the code that decides whether to accept a sensor-driven
//! rotation proposal, uses the flag plus two small slots:
//!
//! - a single-entry proposal mailbox `(rotation, window rotation, recorded at)`
//!   that is cleared whenever the flag drops, so a proposal from one video
//!   session is never seen by the next;
//! - a first-write-wins "saved lock rotation" slot remembering the rotation
//!   that was locked before an auto-accepted proposal.
//!
//! One instance is created by the composition root and handed to both sides
//! as an `Arc`.

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tokio::time::{Duration, Instant};

use crate::rotation::Rotation;

#[derive(Debug, Clone, Copy)]
struct Proposal {
    rotation: Rotation,
    recorded_at: Instant,
}

#[derive(Debug, Default)]
struct Mailbox {
    proposal: Option<Proposal>,
    window_rotation: Option<Rotation>,
}

/// Armed flag plus the proposal mailbox and saved-lock slot.
#[derive(Debug, Default)]
pub struct SharedPlaybackFlag {
    playing: AtomicBool,
    mailbox: Mutex<Mailbox>,
    saved_lock: Mutex<Option<Rotation>>,
}

impl SharedPlaybackFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the override is currently armed.
    pub fn is_playing_fullscreen_video(&self) -> bool {
        self.playing.load(Ordering::Acquire)
    }

    /// Publishes the armed state. Dropping to `false` clears the proposal
    /// mailbox.
    pub fn set_playing_fullscreen_video(&self, active: bool) {
        let was = self.playing.swap(active, Ordering::AcqRel);
        if was && !active {
            *self.mailbox.lock() = Mailbox::default();
            tracing::debug!("Fullscreen video flag cleared, proposal mailbox reset");
        } else if !was && active {
            tracing::debug!("Fullscreen video flag set");
        }
    }

    /// Records the latest rotation proposal, replacing any previous one.
    pub fn record_rotation_proposal(&self, rotation: Rotation, window_rotation: Rotation) {
        self.record_rotation_proposal_at(rotation, window_rotation, Instant::now());
    }

    /// [`record_rotation_proposal`](Self::record_rotation_proposal) with an
    /// explicit timestamp.
    pub fn record_rotation_proposal_at(
        &self,
        rotation: Rotation,
        window_rotation: Rotation,
        now: Instant,
    ) {
        let mut mailbox = self.mailbox.lock();
        mailbox.proposal = Some(Proposal {
            rotation,
            recorded_at: now,
        });
        mailbox.window_rotation = Some(window_rotation);
    }

    /// Takes the proposed rotation if it was recorded no more than `max_age`
    /// ago.
    ///
    /// An expired proposal is left in place and `None` is returned.
    pub fn consume_recent_proposal_rotation(&self, max_age: Duration) -> Option<Rotation> {
        self.consume_recent_proposal_rotation_at(max_age, Instant::now())
    }

    /// [`consume_recent_proposal_rotation`](Self::consume_recent_proposal_rotation)
    /// evaluated at `now`.
    pub fn consume_recent_proposal_rotation_at(
        &self,
        max_age: Duration,
        now: Instant,
    ) -> Option<Rotation> {
        let mut mailbox = self.mailbox.lock();
        let proposal = mailbox.proposal?;
        if now.saturating_duration_since(proposal.recorded_at) > max_age {
            return None;
        }
        mailbox.proposal = None;
        Some(proposal.rotation)
    }

    /// Takes the window rotation recorded alongside the last proposal.
    pub fn consume_recent_proposal_window_rotation(&self) -> Option<Rotation> {
        self.mailbox.lock().window_rotation.take()
    }

    /// Saves `rotation` unless a value is already saved. Returns `true` if
    /// it was stored.
    pub fn save_lock_rotation_if_unset(&self, rotation: Rotation) -> bool {
        let mut slot = self.saved_lock.lock();
        if slot.is_some() {
            return false;
        }
        *slot = Some(rotation);
        true
    }

    /// Takes the saved lock rotation.
    pub fn consume_saved_lock_rotation(&self) -> Option<Rotation> {
        self.saved_lock.lock().take()
    }
}
