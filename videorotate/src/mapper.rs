//! Orientation-sensor sample to display-rotation mapping.
//!
//! The sensor reports raw degrees. Four sectors, centred on 0°, 90°, 180° and
//! 270°, each accept samples within a fixed half-width. Samples in the dead
//! zones between sectors keep the previous rotation, so the output only moves
//! once the device clearly commits to a new orientation.
//!
//! ```text
//!            0° (ROTATION_0)
//!        330° ─┼─ 30°
//!              │
//!  270° ───────┼─────── 90°
//!  ROTATION_90 │   ROTATION_270
//!              │
//!       150° ──┼── 210°
//!          180° (ROTATION_180)
//! ```
//!
//! The landscape sectors map to the *opposite* surface rotation: a sensor
//! reading of 90° means the display must be drawn at `ROTATION_270`, and 270°
//! at `ROTATION_90`.

use tokio::time::{Duration, Instant};

use crate::rotation::Rotation;

/// Sample value reported by the sensor when the orientation can't be determined
/// (device flat, free fall).
pub const ORIENTATION_UNKNOWN: i32 = -1;

/// Default half-width of each rotation sector, in degrees.
pub const DEFAULT_SECTOR_HALF_WIDTH_DEG: u16 = 30;

/// Largest usable half-width. Wider sectors would overlap and leave no dead
/// zone for hysteresis.
pub const MAX_SECTOR_HALF_WIDTH_DEG: u16 = 44;

/// Sector centres and the rotation each one selects, in match order.
const SECTORS: [(i32, Rotation); 4] = [
    (0, Rotation::Rotation0),
    (90, Rotation::Rotation270),
    (180, Rotation::Rotation180),
    (270, Rotation::Rotation90),
];

/// Maps raw sensor degrees to a discrete rotation with hysteresis.
#[derive(Debug, Clone, Copy)]
pub struct RotationMapper {
    half_width_deg: i32,
}

impl RotationMapper {
    /// Creates a mapper with the given sector half-width.
    ///
    /// The width is clamped to `1..=MAX_SECTOR_HALF_WIDTH_DEG`.
    pub fn new(half_width_deg: u16) -> Self {
        Self {
            half_width_deg: i32::from(half_width_deg.clamp(1, MAX_SECTOR_HALF_WIDTH_DEG)),
        }
    }

    /// Sector half-width in degrees.
    pub fn half_width_deg(&self) -> u16 {
        self.half_width_deg as u16
    }

    /// Maps `degrees` to a rotation, returning `previous` in dead zones.
    pub fn map(&self, degrees: i32, previous: Rotation) -> Rotation {
        let d = degrees.rem_euclid(360);
        SECTORS
            .iter()
            .find(|(center, _)| angular_distance(d, *center) <= self.half_width_deg)
            .map(|(_, rotation)| *rotation)
            .unwrap_or(previous)
    }
}

impl Default for RotationMapper {
    fn default() -> Self {
        Self::new(DEFAULT_SECTOR_HALF_WIDTH_DEG)
    }
}

/// Shortest distance between two angles in `[0, 360)`.
fn angular_distance(a: i32, b: i32) -> i32 {
    let diff = (a - b).abs();
    diff.min(360 - diff)
}

/// Result of feeding one sensor sample to an [`OrientationTracker`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleOutcome {
    /// Unknown orientation or inside the debounce window; nothing changed.
    Ignored,
    /// Accepted, and the desired rotation stayed the same.
    Unchanged(Rotation),
    /// Accepted, and the desired rotation moved.
    Changed { from: Rotation, to: Rotation },
}

/// Tracks the rotation the device is physically held in.
///
/// Wraps a [`RotationMapper`] with two filters: unknown samples are dropped,
/// and accepted samples must be at least `debounce` apart.
#[derive(Debug)]
pub struct OrientationTracker {
    mapper: RotationMapper,
    debounce: Duration,
    desired: Rotation,
    last_decision: Option<Instant>,
}

impl OrientationTracker {
    /// Creates a tracker starting at `ROTATION_0`.
    pub fn new(mapper: RotationMapper, debounce: Duration) -> Self {
        Self {
            mapper,
            debounce,
            desired: Rotation::Rotation0,
            last_decision: None,
        }
    }

    /// The most recent rotation the sensor committed to.
    pub fn desired(&self) -> Rotation {
        self.desired
    }

    /// Feeds one raw sample taken at `now`.
    pub fn on_sample(&mut self, degrees: i32, now: Instant) -> SampleOutcome {
        if degrees == ORIENTATION_UNKNOWN {
            return SampleOutcome::Ignored;
        }

        if let Some(last) = self.last_decision {
            if now.saturating_duration_since(last) < self.debounce {
                return SampleOutcome::Ignored;
            }
        }
        self.last_decision = Some(now);

        let previous = self.desired;
        let mapped = self.mapper.map(degrees, previous);
        tracing::trace!(degrees, prev = %previous, rotation = %mapped, "Orientation sample");

        if mapped == previous {
            SampleOutcome::Unchanged(mapped)
        } else {
            self.desired = mapped;
            SampleOutcome::Changed {
                from: previous,
                to: mapped,
            }
        }
    }

    /// Forgets the debounce anchor. The desired rotation is kept.
    pub fn reset(&mut self) {
        self.last_decision = None;
    }
}
