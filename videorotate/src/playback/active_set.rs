//! Debounced set of subjects with audible playback.
//!
//! Backs the direct `is_subject_playing` query for callers that make their
//! own fullscreen and lock decisions. Every change notification carries the
//! full list of active players, so membership is recomputed from it:
//!
//! ```text
//!  appears in list        missing from list          deadline passes
//!  ───────────────► IN ─────────────────► LEAVING ─────────────────► OUT
//!                    ▲                        │
//!                    └──── reappears ─────────┘
//! ```
//!
//! Subjects enter immediately and leave only after the debounce delay, so a
//! short buffer stall doesn't read as "stopped". A subject has at most one
//! pending deadline; later misses don't push it further out.

use std::collections::{HashMap, HashSet};

use tokio::time::{Duration, Instant};

use super::types::PlaybackConfig;
use crate::types::SubjectId;

/// Default delay before a silent subject leaves the set.
pub const DEFAULT_PLAYING_DEBOUNCE: Duration = Duration::from_millis(2000);

/// Debounced membership of subjects currently playing media or game audio.
#[derive(Debug)]
pub struct ActivePlaybackSet {
    debounce: Duration,
    members: HashSet<SubjectId>,
    pending_removal: HashMap<SubjectId, Instant>,
}

impl ActivePlaybackSet {
    /// Creates an empty set with the given leave delay.
    pub fn new(debounce: Duration) -> Self {
        Self {
            debounce,
            members: HashSet::new(),
            pending_removal: HashMap::new(),
        }
    }

    /// Applies a full playback list observed at `now`.
    ///
    /// Returns the subjects that newly entered the set.
    pub fn update(&mut self, configs: &[PlaybackConfig], now: Instant) -> Vec<SubjectId> {
        let playing: HashSet<SubjectId> = configs
            .iter()
            .filter(|c| c.is_audible_playback())
            .map(|c| c.subject)
            .collect();

        let mut entered = Vec::new();
        for subject in &playing {
            if self.pending_removal.remove(subject).is_some() {
                tracing::trace!(subject = %subject, "Pending playback removal cancelled");
            }
            if self.members.insert(*subject) {
                tracing::debug!(subject = %subject, "Subject playing start");
                entered.push(*subject);
            }
        }

        for subject in self.members.difference(&playing) {
            self.pending_removal
                .entry(*subject)
                .or_insert_with(|| now + self.debounce);
        }

        entered
    }

    /// Earliest pending removal deadline.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending_removal.values().min().copied()
    }

    /// Removes every subject whose deadline is at or before `now`.
    ///
    /// Returns the removed subjects.
    pub fn expire(&mut self, now: Instant) -> Vec<SubjectId> {
        let due: Vec<SubjectId> = self
            .pending_removal
            .iter()
            .filter(|(_, deadline)| **deadline <= now)
            .map(|(subject, _)| *subject)
            .collect();

        for subject in &due {
            self.pending_removal.remove(subject);
            if self.members.remove(subject) {
                tracing::debug!(subject = %subject, "Subject playing end (debounced)");
            }
        }
        due
    }

    /// Whether `subject` counts as playing.
    pub fn contains(&self, subject: SubjectId) -> bool {
        self.members.contains(&subject)
    }

    /// Number of members, including those with a pending removal.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Drops all members and pending removals.
    pub fn clear(&mut self) {
        self.members.clear();
        self.pending_removal.clear();
    }
}

impl Default for ActivePlaybackSet {
    fn default() -> Self {
        Self::new(DEFAULT_PLAYING_DEBOUNCE)
    }
}
