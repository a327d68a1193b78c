//! Interaction classification of new lineages.

use scintilla_types::{CreatorProcess, InteractionType, ParticleKind, TrackInfo};

/// The interaction tag for a lineage opened by `secondary`, given the track
/// that produced it (`None` when `secondary` is itself a primary).
///
/// Pure and deterministic: the same two descriptors always give the same tag.
pub fn child_type(parent: Option<&TrackInfo>, secondary: &TrackInfo) -> InteractionType {
    let parent_is_neutron = parent.is_some_and(|p| p.particle == ParticleKind::Neutron);
    let nucleus = matches!(secondary.particle, ParticleKind::Ion | ParticleKind::Alpha);

    match secondary.creator {
        CreatorProcess::HadronElastic if parent_is_neutron && nucleus => {
            InteractionType::NuclearRecoil
        }
        CreatorProcess::Compton | CreatorProcess::Conversion => InteractionType::Beta,
        CreatorProcess::PhotoElectric => InteractionType::GammaRay,
        CreatorProcess::RadioactiveDecay if secondary.particle == ParticleKind::Alpha => {
            InteractionType::Alpha
        }
        CreatorProcess::NeutronInelastic if secondary.particle == ParticleKind::Ion => {
            InteractionType::Ion
        }
        _ if parent.is_none() => primary_type(secondary.particle),
        _ => InteractionType::None,
    }
}

/// Tag for a track with no known parent.
const fn primary_type(particle: ParticleKind) -> InteractionType {
    match particle {
        ParticleKind::Electron | ParticleKind::Positron => InteractionType::Beta,
        ParticleKind::Gamma => InteractionType::GammaRay,
        ParticleKind::Alpha => InteractionType::Alpha,
        ParticleKind::Ion => InteractionType::Ion,
        ParticleKind::Neutron
        | ParticleKind::OpticalPhoton
        | ParticleKind::ShortLived
        | ParticleKind::Other => InteractionType::None,
    }
}

#[cfg(test)]
mod tests {
    use scintilla_types::{ThreeVector, TrackId};

    use super::*;

    fn primary(particle: ParticleKind) -> TrackInfo {
        TrackInfo::primary(
            TrackId::new(1),
            particle,
            ThreeVector::ZERO,
            ThreeVector::new(0.0, 0.0, 1.0),
        )
    }

    fn secondary(particle: ParticleKind, creator: CreatorProcess) -> TrackInfo {
        TrackInfo::secondary(
            TrackId::new(2),
            TrackId::new(1),
            particle,
            creator,
            ThreeVector::new(1.0, 0.0, 0.0),
            ThreeVector::new(1.0, 0.0, 0.0),
        )
    }

    #[test]
    fn neutron_elastic_recoil_is_nuclear_recoil() {
        let neutron = primary(ParticleKind::Neutron);
        let recoil = secondary(ParticleKind::Ion, CreatorProcess::HadronElastic);
        assert_eq!(child_type(Some(&neutron), &recoil), InteractionType::NuclearRecoil);
    }

    #[test]
    fn elastic_recoil_from_non_neutron_is_unclassified() {
        let proton_like = primary(ParticleKind::Other);
        let recoil = secondary(ParticleKind::Ion, CreatorProcess::HadronElastic);
        assert_eq!(child_type(Some(&proton_like), &recoil), InteractionType::None);
    }

    #[test]
    fn gamma_products() {
        let gamma = primary(ParticleKind::Gamma);
        let compton = secondary(ParticleKind::Electron, CreatorProcess::Compton);
        let photo = secondary(ParticleKind::Electron, CreatorProcess::PhotoElectric);
        let pair = secondary(ParticleKind::Positron, CreatorProcess::Conversion);
        assert_eq!(child_type(Some(&gamma), &compton), InteractionType::Beta);
        assert_eq!(child_type(Some(&gamma), &photo), InteractionType::GammaRay);
        assert_eq!(child_type(Some(&gamma), &pair), InteractionType::Beta);
    }

    #[test]
    fn decay_and_inelastic_products() {
        let parent = primary(ParticleKind::Ion);
        let alpha = secondary(ParticleKind::Alpha, CreatorProcess::RadioactiveDecay);
        assert_eq!(child_type(Some(&parent), &alpha), InteractionType::Alpha);

        let neutron = primary(ParticleKind::Neutron);
        let ion = secondary(ParticleKind::Ion, CreatorProcess::NeutronInelastic);
        assert_eq!(child_type(Some(&neutron), &ion), InteractionType::Ion);
    }

    #[test]
    fn primaries_by_species() {
        assert_eq!(child_type(None, &primary(ParticleKind::Electron)), InteractionType::Beta);
        assert_eq!(child_type(None, &primary(ParticleKind::Gamma)), InteractionType::GammaRay);
        assert_eq!(child_type(None, &primary(ParticleKind::Alpha)), InteractionType::Alpha);
        assert_eq!(child_type(None, &primary(ParticleKind::Neutron)), InteractionType::None);
    }

    #[test]
    fn delta_rays_and_brems_are_unclassified() {
        let electron = primary(ParticleKind::Electron);
        let delta = secondary(ParticleKind::Electron, CreatorProcess::Ionisation);
        let brems = secondary(ParticleKind::Gamma, CreatorProcess::Bremsstrahlung);
        assert_eq!(child_type(Some(&electron), &delta), InteractionType::None);
        assert_eq!(child_type(Some(&electron), &brems), InteractionType::None);
    }

    #[test]
    fn deterministic() {
        let gamma = primary(ParticleKind::Gamma);
        let compton = secondary(ParticleKind::Electron, CreatorProcess::Compton);
        assert_eq!(child_type(Some(&gamma), &compton), child_type(Some(&gamma), &compton));
    }
}
