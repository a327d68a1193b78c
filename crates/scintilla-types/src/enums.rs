//! Enumeration types shared by the tracker, the ledger, and the yield model.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Interaction classification
// ---------------------------------------------------------------------------

/// The physical interaction class a lineage is attributed to.
///
/// The yield model picks its quenching and recombination behaviour from this
/// tag, so every lineage carries exactly one.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub enum InteractionType {
    /// Electron recoil from an ionizing electron (beta, Compton electron).
    Beta,
    /// Full gamma absorption (photoelectric chain).
    GammaRay,
    /// Alpha particle.
    Alpha,
    /// Nuclear recoil from elastic neutron scattering.
    NuclearRecoil,
    /// Heavy ion other than an alpha.
    Ion,
    /// Unclassified. Still tracked, but the yield model may decline it.
    #[default]
    None,
}

impl InteractionType {
    /// Whether the interaction is an electron recoil.
    pub const fn is_electron_recoil(self) -> bool {
        matches!(self, Self::Beta | Self::GammaRay)
    }
}

// ---------------------------------------------------------------------------
// Host particle descriptors
// ---------------------------------------------------------------------------

/// Particle species, as far as lineage classification cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParticleKind {
    /// Photon.
    Gamma,
    /// Electron.
    Electron,
    /// Positron.
    Positron,
    /// Helium-4 nucleus.
    Alpha,
    /// Neutron.
    Neutron,
    /// Any other nucleus.
    Ion,
    /// Optical photon. Ignored by the tracker.
    OpticalPhoton,
    /// Resonances and other particles that decay before being transported.
    /// Ignored by the tracker.
    ShortLived,
    /// Anything else (muons, pions, neutrinos...).
    Other,
}

impl ParticleKind {
    /// Whether steps of this species take part in lineage building.
    pub const fn is_applicable(self) -> bool {
        !matches!(self, Self::OpticalPhoton | Self::ShortLived)
    }
}

/// The physics process that created a track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CreatorProcess {
    /// Not a secondary: injected by the event generator.
    Primary,
    /// Compton scattering.
    Compton,
    /// Photoelectric absorption.
    PhotoElectric,
    /// Gamma conversion to an electron-positron pair.
    Conversion,
    /// Ionisation (delta rays).
    Ionisation,
    /// Bremsstrahlung.
    Bremsstrahlung,
    /// Hadronic elastic scattering.
    HadronElastic,
    /// Neutron inelastic scattering.
    NeutronInelastic,
    /// Radioactive decay.
    RadioactiveDecay,
    /// Any other process.
    Other,
}
