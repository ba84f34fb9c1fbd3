//! Configuration for the rotation override.
//!
//! All timing knobs have defaults tuned for phone-class hardware; hosts
//! normally only flip `enabled`.
//!
//! # Example Configuration (INI)
//!
//! ```ini
//! [rotation]
//! enabled = true
//! video_grace_ms = 2000
//! poll_interval_ms = 2000
//! orientation_debounce_ms = 120
//! sector_half_width = 30
//! playing_debounce_ms = 2000
//! registration_retry_ms = 5000
//! ```

use std::path::{Path, PathBuf};
use std::str::FromStr;

use ini::{Ini, Properties};
use tokio::time::Duration;

use crate::error::ConfigError;
use crate::mapper::{DEFAULT_SECTOR_HALF_WIDTH_DEG, MAX_SECTOR_HALF_WIDTH_DEG};
use crate::playback::{DEFAULT_PLAYING_DEBOUNCE, DEFAULT_VIDEO_GRACE};

/// INI section holding the override settings.
pub const CONFIG_SECTION: &str = "rotation";

/// Default interval of the safety-net playback poll.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2000);

/// Default minimum spacing between accepted orientation samples.
pub const DEFAULT_ORIENTATION_DEBOUNCE: Duration = Duration::from_millis(120);

/// Default delay before retrying a failed playback-source registration.
pub const DEFAULT_REGISTRATION_RETRY: Duration = Duration::from_millis(5000);

/// Rotation override settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverrideConfig {
    /// Master switch. A disabled service runs but never arms.
    pub enabled: bool,

    /// How long video evidence stays "recent" after the last sighting.
    pub video_grace: Duration,

    /// Interval of the playback snapshot re-scan.
    pub poll_interval: Duration,

    /// Minimum spacing between accepted orientation samples.
    pub orientation_debounce: Duration,

    /// Half-width of each rotation sector, in degrees.
    pub sector_half_width_deg: u16,

    /// Delay before a silent subject leaves the playing set.
    pub playing_debounce: Duration,

    /// Delay before retrying a failed playback-source registration.
    pub registration_retry: Duration,
}

impl Default for OverrideConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            video_grace: DEFAULT_VIDEO_GRACE,
            poll_interval: DEFAULT_POLL_INTERVAL,
            orientation_debounce: DEFAULT_ORIENTATION_DEBOUNCE,
            sector_half_width_deg: DEFAULT_SECTOR_HALF_WIDTH_DEG,
            playing_debounce: DEFAULT_PLAYING_DEBOUNCE,
            registration_retry: DEFAULT_REGISTRATION_RETRY,
        }
    }
}

impl OverrideConfig {
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_video_grace(mut self, grace: Duration) -> Self {
        self.video_grace = grace;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_orientation_debounce(mut self, debounce: Duration) -> Self {
        self.orientation_debounce = debounce;
        self
    }

    pub fn with_sector_half_width(mut self, degrees: u16) -> Self {
        self.sector_half_width_deg = degrees;
        self
    }

    pub fn with_playing_debounce(mut self, debounce: Duration) -> Self {
        self.playing_debounce = debounce;
        self
    }

    pub fn with_registration_retry(mut self, retry: Duration) -> Self {
        self.registration_retry = retry;
        self
    }

    /// Loads settings from an INI file.
    pub fn from_ini_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_ini_str(&text)
    }

    /// Loads settings from INI text. Keys missing from the `[rotation]`
    /// section keep their defaults.
    pub fn from_ini_str(text: &str) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        let mut config = Self::default();

        let Some(section) = ini.section(Some(CONFIG_SECTION)) else {
            return Ok(config);
        };

        if let Some(enabled) = parse_bool(section, "enabled")? {
            config.enabled = enabled;
        }
        if let Some(ms) = parse_key::<u64>(section, "video_grace_ms")? {
            config.video_grace = Duration::from_millis(ms);
        }
        if let Some(ms) = parse_key::<u64>(section, "poll_interval_ms")? {
            if ms == 0 {
                return Err(ConfigError::InvalidValue {
                    key: "poll_interval_ms",
                    value: ms.to_string(),
                });
            }
            config.poll_interval = Duration::from_millis(ms);
        }
        if let Some(ms) = parse_key::<u64>(section, "orientation_debounce_ms")? {
            config.orientation_debounce = Duration::from_millis(ms);
        }
        if let Some(degrees) = parse_key::<u16>(section, "sector_half_width")? {
            if degrees == 0 || degrees > MAX_SECTOR_HALF_WIDTH_DEG {
                return Err(ConfigError::InvalidValue {
                    key: "sector_half_width",
                    value: degrees.to_string(),
                });
            }
            config.sector_half_width_deg = degrees;
        }
        if let Some(ms) = parse_key::<u64>(section, "playing_debounce_ms")? {
            config.playing_debounce = Duration::from_millis(ms);
        }
        if let Some(ms) = parse_key::<u64>(section, "registration_retry_ms")? {
            config.registration_retry = Duration::from_millis(ms);
        }

        Ok(config)
    }
}

/// Default location of the config file, `~/.videorotate/config.ini`.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".videorotate").join("config.ini"))
}

fn parse_key<T: FromStr>(section: &Properties, key: &'static str) -> Result<Option<T>, ConfigError> {
    match section.get(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue {
                key,
                value: raw.to_string(),
            }),
    }
}

fn parse_bool(section: &Properties, key: &'static str) -> Result<Option<bool>, ConfigError> {
    let Some(raw) = section.get(key) else {
        return Ok(None);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(Some(true)),
        "false" | "no" | "off" | "0" => Ok(Some(false)),
        _ => Err(ConfigError::InvalidValue {
            key,
            value: raw.to_string(),
        }),
    }
}
