//! Video-likely classification of playback events.
//!
//! Keeps, per subject, the last instant a video-like stream was observed.
//! Evidence is never expired proactively; "recent" is computed lazily against
//! a grace window when the controller asks. The grace window lets playback
//! survive pause, seek and buffering gaps without the override flapping.

use std::collections::HashMap;

use tokio::time::{Duration, Instant};

use super::types::{ContentType, PlaybackConfig};
use crate::types::SubjectId;

/// Default grace window for video evidence.
pub const DEFAULT_VIDEO_GRACE: Duration = Duration::from_millis(2000);

/// Where a batch of playback configurations came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanSource {
    /// A change notification from the playback source.
    ChangeEvent,
    /// The periodic safety-net snapshot.
    Poll,
}

/// Per-subject "last seen video-like playback" table.
#[derive(Debug, Default)]
pub struct PlaybackClassifier {
    last_seen: HashMap<SubjectId, Instant>,
}

impl PlaybackClassifier {
    /// Creates an empty classifier.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records evidence from a batch of playback configurations observed at
    /// `now`. Returns the number of entries classified as video-like.
    pub fn observe(&mut self, configs: &[PlaybackConfig], source: ScanSource, now: Instant) -> usize {
        let mut recorded = 0;
        for config in configs.iter().filter(|c| c.active) {
            tracing::trace!(
                subject = %config.subject,
                usage = ?config.usage,
                content = ?config.content_type,
                flags = %config.flags,
                ?source,
                "Playback config"
            );

            if !config.is_video_like() {
                continue;
            }

            self.last_seen.insert(config.subject, now);
            recorded += 1;
            tracing::debug!(
                subject = %config.subject,
                movie = config.content_type == ContentType::Movie,
                av_sync = config.has_av_sync(),
                ?source,
                "Video playback detected"
            );
        }
        recorded
    }

    /// Handles a playback-configuration change notification.
    pub fn on_playback_configs_changed(&mut self, configs: &[PlaybackConfig], now: Instant) -> usize {
        self.observe(configs, ScanSource::ChangeEvent, now)
    }

    /// Re-scans a full playback snapshot from the periodic poll.
    pub fn rescan(&mut self, snapshot: &[PlaybackConfig], now: Instant) -> usize {
        self.observe(snapshot, ScanSource::Poll, now)
    }

    /// Whether video-like playback for `subject` was seen within `grace` of `now`.
    pub fn is_video_likely_active(&self, subject: SubjectId, grace: Duration, now: Instant) -> bool {
        self.last_seen
            .get(&subject)
            .map(|seen| now.saturating_duration_since(*seen) <= grace)
            .unwrap_or(false)
    }

    /// Last instant video-like playback was seen for `subject`.
    pub fn last_seen(&self, subject: SubjectId) -> Option<Instant> {
        self.last_seen.get(&subject).copied()
    }

    /// Number of subjects with evidence.
    pub fn len(&self) -> usize {
        self.last_seen.len()
    }

    /// Whether no evidence has been recorded.
    pub fn is_empty(&self) -> bool {
        self.last_seen.is_empty()
    }

    /// Drops all evidence.
    pub fn clear(&mut self) {
        self.last_seen.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playback::{AudioUsage, PlaybackFlags};

    const PLAYER: SubjectId = SubjectId(10_200);
    const OTHER: SubjectId = SubjectId(10_300);

    fn movie(subject: SubjectId) -> PlaybackConfig {
        PlaybackConfig::media(subject, ContentType::Movie)
    }

    #[test]
    fn test_no_evidence_is_inactive() {
        let classifier = PlaybackClassifier::new();
        assert!(!classifier.is_video_likely_active(PLAYER, DEFAULT_VIDEO_GRACE, Instant::now()));
    }

    #[test]
    fn test_movie_records_evidence() {
        let mut classifier = PlaybackClassifier::new();
        let now = Instant::now();
        assert_eq!(classifier.on_playback_configs_changed(&[movie(PLAYER)], now), 1);
        assert_eq!(classifier.last_seen(PLAYER), Some(now));
        assert!(classifier.is_video_likely_active(PLAYER, DEFAULT_VIDEO_GRACE, now));
        assert!(!classifier.is_video_likely_active(OTHER, DEFAULT_VIDEO_GRACE, now));
    }

    #[test]
    fn test_grace_window_boundary() {
        let mut classifier = PlaybackClassifier::new();
        let seen = Instant::now();
        classifier.on_playback_configs_changed(&[movie(PLAYER)], seen);

        let grace = Duration::from_millis(2000);
        assert!(classifier.is_video_likely_active(PLAYER, grace, seen + grace));
        assert!(!classifier.is_video_likely_active(
            PLAYER,
            grace,
            seen + grace + Duration::from_millis(1)
        ));
    }

    #[test]
    fn test_filters_non_video_entries() {
        let mut classifier = PlaybackClassifier::new();
        let now = Instant::now();
        let configs = [
            PlaybackConfig::media(PLAYER, ContentType::Unknown),
            PlaybackConfig::media(PLAYER, ContentType::Music).with_flags(PlaybackFlags::HW_AV_SYNC),
            movie(PLAYER).with_usage(AudioUsage::Game),
            movie(PLAYER).with_active(false),
            movie(SubjectId(-1)),
        ];
        assert_eq!(classifier.on_playback_configs_changed(&configs, now), 0);
        assert!(classifier.is_empty());
    }

    #[test]
    fn test_av_sync_alone_suffices() {
        let mut classifier = PlaybackClassifier::new();
        let now = Instant::now();
        let config = PlaybackConfig::media(PLAYER, ContentType::Unknown)
            .with_flags(PlaybackFlags::HW_AV_SYNC);
        assert_eq!(classifier.rescan(&[config], now), 1);
        assert!(classifier.is_video_likely_active(PLAYER, DEFAULT_VIDEO_GRACE, now));
    }

    #[test]
    fn test_refresh_extends_window() {
        let mut classifier = PlaybackClassifier::new();
        let start = Instant::now();
        let grace = Duration::from_millis(2000);
        classifier.on_playback_configs_changed(&[movie(PLAYER)], start);
        classifier.rescan(&[movie(PLAYER)], start + Duration::from_millis(1500));

        assert!(classifier.is_video_likely_active(PLAYER, grace, start + Duration::from_millis(3000)));
    }

    #[test]
    fn test_clear_drops_evidence() {
        let mut classifier = PlaybackClassifier::new();
        let now = Instant::now();
        classifier.on_playback_configs_changed(&[movie(PLAYER), movie(OTHER)], now);
        assert_eq!(classifier.len(), 2);
        classifier.clear();
        assert!(!classifier.is_video_likely_active(PLAYER, DEFAULT_VIDEO_GRACE, now));
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Evidence for each subject depends only on that subject's most
            /// recent video-like event, whatever the interleaving.
            #[test]
            fn test_active_iff_latest_video_event_within_grace(
                events in prop::collection::vec((0usize..3, any::<bool>(), 0u64..1500), 1..40),
                query_gap_ms in 0u64..4000,
            ) {
                let subjects = [SubjectId(10_001), SubjectId(10_002), SubjectId(10_003)];
                let grace = Duration::from_millis(2000);
                let start = Instant::now();
                let mut classifier = PlaybackClassifier::new();
                let mut expected_last: [Option<Instant>; 3] = [None; 3];
                let mut now = start;

                for (idx, is_movie, step_ms) in events {
                    now += Duration::from_millis(step_ms);
                    let content = if is_movie { ContentType::Movie } else { ContentType::Unknown };
                    classifier.on_playback_configs_changed(
                        &[PlaybackConfig::media(subjects[idx], content)],
                        now,
                    );
                    if is_movie {
                        expected_last[idx] = Some(now);
                    }
                }

                let query = now + Duration::from_millis(query_gap_ms);
                for (idx, subject) in subjects.iter().enumerate() {
                    let expected = expected_last[idx]
                        .map(|seen| query.duration_since(seen) <= grace)
                        .unwrap_or(false);
                    prop_assert_eq!(
                        classifier.is_video_likely_active(*subject, grace, query),
                        expected
                    );
                }
            }
        }
    }
}
