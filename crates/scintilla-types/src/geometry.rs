//! Three-component vectors for positions and directions.
//!
//! Positions are in millimetres in the detector frame. Directions are unit
//! vectors but nothing here enforces normalisation; the transport engine
//! supplies them as-is.

use serde::{Deserialize, Serialize};

/// A point or direction in 3D space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ThreeVector {
    /// X component.
    pub x: f64,
    /// Y component.
    pub y: f64,
    /// Z component.
    pub z: f64,
}

impl ThreeVector {
    /// The origin.
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    /// Build a vector from its components.
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Component-wise difference `self - other`.
    pub fn sub(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }

    /// Euclidean length.
    pub fn magnitude(self) -> f64 {
        self.x.hypot(self.y).hypot(self.z)
    }

    /// Euclidean distance between two points.
    pub fn distance(self, other: Self) -> f64 {
        self.sub(other).magnitude()
    }

    /// Bit patterns of the three components, with `-0.0` folded into `0.0`.
    ///
    /// Used wherever vectors need exact structural equality and hashing.
    pub fn to_bits(self) -> [u64; 3] {
        [fold_zero(self.x), fold_zero(self.y), fold_zero(self.z)]
    }
}

/// `0.0` and `-0.0` compare equal as floats, so they must hash equal too.
fn fold_zero(value: f64) -> u64 {
    if value == 0.0 { 0.0_f64.to_bits() } else { value.to_bits() }
}
