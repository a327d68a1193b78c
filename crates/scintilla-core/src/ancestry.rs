//! Ancestry keys: how a stepping track finds its lineage.
//!
//! A track is identified by its number together with its creation vertex and
//! initial direction. Both vectors are fixed for the life of the track and
//! are already known when the parent's step lists the track as a secondary,
//! so the same key can be registered at birth and looked up on every later
//! step. Vectors compare by exact bit pattern; no tolerance is applied.

use scintilla_types::{ThreeVector, TrackId, TrackInfo};

/// Structural lookup key for a track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AncestryKey {
    track: TrackId,
    origin: [u64; 3],
    direction: [u64; 3],
}

impl AncestryKey {
    /// Build a key from its parts.
    pub fn new(track: TrackId, origin: ThreeVector, direction: ThreeVector) -> Self {
        Self {
            track,
            origin: origin.to_bits(),
            direction: direction.to_bits(),
        }
    }

    /// The key of `track`.
    pub fn of(track: &TrackInfo) -> Self {
        Self::new(track.id, track.vertex, track.direction)
    }

    /// The track number in the key.
    pub const fn track(&self) -> TrackId {
        self.track
    }
}

#[cfg(test)]
mod tests {
    use scintilla_types::ParticleKind;

    use super::*;

    #[test]
    fn same_track_same_key() {
        let track = TrackInfo::primary(
            TrackId::new(1),
            ParticleKind::Gamma,
            ThreeVector::new(1.0, 2.0, 3.0),
            ThreeVector::new(0.0, 0.0, 1.0),
        );
        assert_eq!(AncestryKey::of(&track), AncestryKey::of(&track.clone()));
    }

    #[test]
    fn vertex_distinguishes_reused_track_numbers() {
        let dir = ThreeVector::new(0.0, 0.0, 1.0);
        let a = AncestryKey::new(TrackId::new(4), ThreeVector::new(0.0, 0.0, 0.0), dir);
        let b = AncestryKey::new(TrackId::new(4), ThreeVector::new(0.0, 0.0, 1.0), dir);
        assert_ne!(a, b);
        assert_eq!(a.track(), b.track());
    }

    #[test]
    fn signed_zero_does_not_split_keys() {
        let dir = ThreeVector::new(0.0, 0.0, 1.0);
        let a = AncestryKey::new(TrackId::new(2), ThreeVector::new(0.0, 0.0, 0.0), dir);
        let b = AncestryKey::new(TrackId::new(2), ThreeVector::new(-0.0, 0.0, 0.0), dir);
        assert_eq!(a, b);
    }
}
