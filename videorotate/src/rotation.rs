//! Discrete display rotations.

use std::fmt;

/// A discrete display rotation, in the platform's surface-constant space.
///
/// The numeric value ([`Rotation::as_surface`]) is the rotation index the
/// display and the rotation-lock policy speak: 0, 1, 2, 3 for 0°, 90°, 180°
/// and 270°.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Rotation {
    /// Natural orientation.
    #[default]
    Rotation0,
    /// Rotated 90°.
    Rotation90,
    /// Upside down.
    Rotation180,
    /// Rotated 270°.
    Rotation270,
}

impl Rotation {
    /// All rotations in surface-constant order.
    pub const ALL: [Rotation; 4] = [
        Rotation::Rotation0,
        Rotation::Rotation90,
        Rotation::Rotation180,
        Rotation::Rotation270,
    ];

    /// The surface constant for this rotation.
    pub fn as_surface(self) -> i32 {
        match self {
            Rotation::Rotation0 => 0,
            Rotation::Rotation90 => 1,
            Rotation::Rotation180 => 2,
            Rotation::Rotation270 => 3,
        }
    }

    /// The rotation angle in degrees.
    pub fn degrees(self) -> u16 {
        match self {
            Rotation::Rotation0 => 0,
            Rotation::Rotation90 => 90,
            Rotation::Rotation180 => 180,
            Rotation::Rotation270 => 270,
        }
    }
}

impl fmt::Display for Rotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ROTATION_{}", self.degrees())
    }
}
