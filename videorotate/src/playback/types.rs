//! Playback-configuration event model.

use std::fmt;

use crate::types::SubjectId;

/// What an audio stream is used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AudioUsage {
    Unknown,
    Media,
    VoiceCommunication,
    Alarm,
    Notification,
    Game,
    Assistant,
    Other,
}

/// What an audio stream carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentType {
    Unknown,
    Speech,
    Music,
    Movie,
    Sonification,
}

/// Audio attribute flags attached to a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PlaybackFlags(pub u32);

impl PlaybackFlags {
    /// The stream is rendered through a hardware A/V sync path, which only
    /// video players request.
    pub const HW_AV_SYNC: PlaybackFlags = PlaybackFlags(1 << 4);

    /// No flags.
    pub const NONE: PlaybackFlags = PlaybackFlags(0);

    /// Whether every bit of `other` is set.
    pub fn contains(self, other: PlaybackFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl fmt::Display for PlaybackFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:x}", self.0)
    }
}

/// One entry of the platform's active playback-configuration list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackConfig {
    /// Who owns the stream.
    pub subject: SubjectId,
    /// Whether the player is currently started.
    pub active: bool,
    pub usage: AudioUsage,
    pub content_type: ContentType,
    pub flags: PlaybackFlags,
}

impl PlaybackConfig {
    /// Creates an active media stream with no flags.
    pub fn media(subject: SubjectId, content_type: ContentType) -> Self {
        Self {
            subject,
            active: true,
            usage: AudioUsage::Media,
            content_type,
            flags: PlaybackFlags::NONE,
        }
    }

    /// Sets `active`.
    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    /// Sets the usage.
    pub fn with_usage(mut self, usage: AudioUsage) -> Self {
        self.usage = usage;
        self
    }

    /// Sets the flags.
    pub fn with_flags(mut self, flags: PlaybackFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Whether the stream is on the hardware A/V sync path.
    pub fn has_av_sync(&self) -> bool {
        self.flags.contains(PlaybackFlags::HW_AV_SYNC)
    }

    /// Whether this entry looks like video playback.
    ///
    /// Requires an active media stream from a valid subject that is not music,
    /// and at least one strong video signal: movie content or A/V sync.
    /// Unknown content without A/V sync is not video.
    pub fn is_video_like(&self) -> bool {
        if !self.active || !self.subject.is_valid() {
            return false;
        }
        if self.usage != AudioUsage::Media || self.content_type == ContentType::Music {
            return false;
        }
        self.content_type == ContentType::Movie || self.has_av_sync()
    }

    /// Whether this entry counts towards "subject is playing" (media or game).
    pub fn is_audible_playback(&self) -> bool {
        self.active
            && self.subject.is_valid()
            && matches!(self.usage, AudioUsage::Media | AudioUsage::Game)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const APP: SubjectId = SubjectId(10_100);

    #[test]
    fn test_movie_is_video() {
        assert!(PlaybackConfig::media(APP, ContentType::Movie).is_video_like());
    }

    #[test]
    fn test_unknown_needs_av_sync() {
        let unknown = PlaybackConfig::media(APP, ContentType::Unknown);
        assert!(!unknown.is_video_like());
        assert!(unknown
            .with_flags(PlaybackFlags::HW_AV_SYNC)
            .is_video_like());
    }

    #[test]
    fn test_music_is_never_video() {
        let music = PlaybackConfig::media(APP, ContentType::Music)
            .with_flags(PlaybackFlags::HW_AV_SYNC);
        assert!(!music.is_video_like());
    }

    #[test]
    fn test_non_media_usage_is_not_video() {
        let game = PlaybackConfig::media(APP, ContentType::Movie).with_usage(AudioUsage::Game);
        assert!(!game.is_video_like());
        let notification =
            PlaybackConfig::media(APP, ContentType::Movie).with_usage(AudioUsage::Notification);
        assert!(!notification.is_video_like());
    }

    #[test]
    fn test_inactive_or_invalid_subject_is_not_video() {
        assert!(!PlaybackConfig::media(APP, ContentType::Movie)
            .with_active(false)
            .is_video_like());
        assert!(!PlaybackConfig::media(SubjectId(0), ContentType::Movie).is_video_like());
    }

    #[test]
    fn test_audible_playback_includes_games() {
        let game = PlaybackConfig::media(APP, ContentType::Unknown).with_usage(AudioUsage::Game);
        assert!(game.is_audible_playback());
        let alarm = PlaybackConfig::media(APP, ContentType::Unknown).with_usage(AudioUsage::Alarm);
        assert!(!alarm.is_audible_playback());
    }

    #[test]
    fn test_flags_display() {
        assert_eq!(PlaybackFlags::HW_AV_SYNC.to_string(), "0x10");
    }
}
