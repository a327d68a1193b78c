//! Core data structs: deposits, hits, lineages, materials, and the host's
//! track and step descriptors.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::enums::{CreatorProcess, InteractionType, ParticleKind};
use crate::geometry::ThreeVector;
use crate::ids::{LineageId, TrackId};
use crate::DepositError;

// ---------------------------------------------------------------------------
// Energy deposits and hits
// ---------------------------------------------------------------------------

/// A single energy loss observed in one transport step.
///
/// Immutable once built: the fields are private and only readable through
/// getters. Ownership moves into whichever ledger or hit consumes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnergyDeposit {
    /// Deposited energy in keV.
    energy: f64,
    /// Where the energy was deposited (mm).
    position: ThreeVector,
    /// Global time of the deposit (ns).
    time: f64,
    /// Interaction class of the lineage the deposit was attributed to.
    interaction: InteractionType,
}

impl EnergyDeposit {
    /// Build a deposit record.
    ///
    /// # Errors
    ///
    /// Returns [`DepositError::NonPositiveEnergy`] unless `energy` is finite
    /// and strictly positive.
    pub fn new(
        energy: f64,
        position: ThreeVector,
        time: f64,
        interaction: InteractionType,
    ) -> Result<Self, DepositError> {
        if !energy.is_finite() || energy <= 0.0 {
            return Err(DepositError::NonPositiveEnergy { energy });
        }
        Ok(Self {
            energy,
            position,
            time,
            interaction,
        })
    }

    /// Deposited energy in keV.
    pub const fn energy(&self) -> f64 {
        self.energy
    }

    /// Deposit position.
    pub const fn position(&self) -> ThreeVector {
        self.position
    }

    /// Deposit time in ns.
    pub const fn time(&self) -> f64 {
        self.time
    }

    /// Interaction tag.
    pub const fn interaction(&self) -> InteractionType {
        self.interaction
    }
}

/// Quanta produced by the yield model, per hit or per lineage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QuantaResult {
    /// Scintillation photons.
    pub photons: u64,
    /// Ionization electrons escaping recombination.
    pub electrons: u64,
    /// Initial excitons.
    pub excitons: u64,
    /// Initial ions.
    pub ions: u64,
}

impl QuantaResult {
    /// Whether every count is zero.
    pub const fn is_zero(&self) -> bool {
        self.photons == 0 && self.electrons == 0 && self.excitons == 0 && self.ions == 0
    }

    /// Split these counts across `weights.len()` shares proportionally to the
    /// weights, using the largest-remainder method so that each field of the
    /// shares sums exactly to the same field of `self`.
    ///
    /// Non-finite or non-positive weights receive nothing. If no weight is
    /// positive, the first share receives everything.
    pub fn apportion(&self, weights: &[f64]) -> Vec<Self> {
        let photons = split_count(self.photons, weights);
        let electrons = split_count(self.electrons, weights);
        let excitons = split_count(self.excitons, weights);
        let ions = split_count(self.ions, weights);

        photons
            .into_iter()
            .zip(electrons)
            .zip(excitons)
            .zip(ions)
            .map(|(((photons, electrons), excitons), ions)| Self {
                photons,
                electrons,
                excitons,
                ions,
            })
            .collect()
    }
}

/// Largest-remainder split of an integer count.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn split_count(total: u64, weights: &[f64]) -> Vec<u64> {
    let usable = |w: f64| if w.is_finite() && w > 0.0 { w } else { 0.0 };
    let sum: f64 = weights.iter().copied().map(usable).sum();

    let mut shares = vec![0_u64; weights.len()];
    if sum <= 0.0 {
        if let Some(first) = shares.first_mut() {
            *first = total;
        }
        return shares;
    }

    let mut remainders = Vec::with_capacity(weights.len());
    let mut assigned: u64 = 0;
    for ((index, &weight), share) in weights.iter().enumerate().zip(shares.iter_mut()) {
        let exact = total as f64 * usable(weight) / sum;
        let floor = exact.floor();
        *share = floor as u64;
        assigned = assigned.saturating_add(*share);
        remainders.push((exact - floor, index));
    }

    // Largest fractional part first; ties go to the earlier share.
    remainders.sort_by(|a, b| b.0.total_cmp(&a.0).then(a.1.cmp(&b.1)));
    let mut leftover = total.saturating_sub(assigned);
    for &(_, index) in remainders.iter().cycle().take(weights.len()) {
        if leftover == 0 {
            break;
        }
        if let Some(share) = shares.get_mut(index) {
            *share = share.saturating_add(1);
            leftover = leftover.saturating_sub(1);
        }
    }
    if leftover > 0 {
        if let Some(&(_, index)) = remainders.first() {
            if let Some(share) = shares.get_mut(index) {
                *share = share.saturating_add(leftover);
            }
        }
    }
    shares
}

/// One point-like contribution to a lineage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hit {
    /// Energy in keV.
    pub energy: f64,
    /// Time in ns.
    pub time: f64,
    /// Position in mm.
    pub position: ThreeVector,
    /// Quanta attributed to this hit. Zero until the lineage closes.
    pub result: QuantaResult,
}

impl From<&EnergyDeposit> for Hit {
    fn from(deposit: &EnergyDeposit) -> Self {
        Self {
            energy: deposit.energy(),
            time: deposit.time(),
            position: deposit.position(),
            result: QuantaResult::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Lineage
// ---------------------------------------------------------------------------

/// A causal chain of hits treated as one physical interaction.
///
/// A lineage is open from creation until [`seal`](Lineage::seal) succeeds.
/// Every mutator refuses to act on a closed lineage, so the cached result is
/// written at most once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lineage {
    id: LineageId,
    interaction: InteractionType,
    hits: Vec<Hit>,
    origin: ThreeVector,
    density: Option<f64>,
    mass_number: Option<u32>,
    atomic_number: Option<u32>,
    result: QuantaResult,
    result_calculated: bool,
}

impl Lineage {
    /// Open a lineage whose first contribution is `first`. The hit's position
    /// becomes the lineage origin.
    pub fn open(id: LineageId, interaction: InteractionType, first: Hit) -> Self {
        Self {
            id,
            interaction,
            origin: first.position,
            hits: vec![first],
            density: None,
            mass_number: None,
            atomic_number: None,
            result: QuantaResult::default(),
            result_calculated: false,
        }
    }

    /// Lineage identifier.
    pub const fn id(&self) -> LineageId {
        self.id
    }

    /// Interaction class.
    pub const fn interaction(&self) -> InteractionType {
        self.interaction
    }

    /// Hits in observation order.
    pub fn hits(&self) -> &[Hit] {
        &self.hits
    }

    /// Position of the first hit.
    pub const fn origin(&self) -> ThreeVector {
        self.origin
    }

    /// Medium density (g/cm³) of the final step, once derived.
    pub const fn density(&self) -> Option<f64> {
        self.density
    }

    /// Effective mass number of the final step's material, once derived.
    pub const fn mass_number(&self) -> Option<u32> {
        self.mass_number
    }

    /// Effective atomic number of the final step's material, once derived.
    pub const fn atomic_number(&self) -> Option<u32> {
        self.atomic_number
    }

    /// Aggregate quanta from the yield model. Zero until closed.
    pub const fn result(&self) -> QuantaResult {
        self.result
    }

    /// Whether the yield has been computed. Never goes back to `false`.
    pub const fn result_calculated(&self) -> bool {
        self.result_calculated
    }

    /// Alias for [`result_calculated`](Self::result_calculated).
    pub const fn is_closed(&self) -> bool {
        self.result_calculated
    }

    /// Sum of hit energies in keV.
    pub fn total_energy(&self) -> f64 {
        self.hits.iter().map(|hit| hit.energy).sum()
    }

    /// Append a hit. Returns `false` (and drops the hit) if closed.
    pub fn push_hit(&mut self, hit: Hit) -> bool {
        if self.result_calculated {
            return false;
        }
        self.hits.push(hit);
        true
    }

    /// Derive density, A, and Z from `material`. Returns `false` if closed.
    pub fn apply_material(&mut self, material: &Material) -> bool {
        if self.result_calculated {
            return false;
        }
        self.density = Some(material.density);
        self.mass_number = material.effective_mass_number();
        self.atomic_number = material.effective_atomic_number();
        true
    }

    /// Store the yield and close the lineage.
    ///
    /// When `per_hit` has one entry per hit it is used as-is; otherwise
    /// `total` is apportioned across hits by energy. Returns `false` without
    /// touching anything if the lineage was already closed.
    pub fn seal(&mut self, total: QuantaResult, per_hit: Vec<QuantaResult>) -> bool {
        if self.result_calculated {
            return false;
        }
        let per_hit = if per_hit.len() == self.hits.len() {
            per_hit
        } else {
            let weights: Vec<f64> = self.hits.iter().map(|hit| hit.energy).collect();
            total.apportion(&weights)
        };
        for (hit, quanta) in self.hits.iter_mut().zip(per_hit) {
            hit.result = quanta;
        }
        self.result = total;
        self.result_calculated = true;
        true
    }
}

// ---------------------------------------------------------------------------
// Materials
// ---------------------------------------------------------------------------

/// One element of a material's composition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    /// Atomic number Z.
    pub atomic_number: u32,
    /// Mass number A.
    pub mass_number: u32,
    /// Fraction of the material's mass carried by this element.
    pub mass_fraction: f64,
}

/// Bulk material at the location of a step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    /// Material name as known to the host geometry.
    pub name: String,
    /// Density in g/cm³.
    pub density: f64,
    /// Elemental composition.
    pub elements: Vec<Element>,
}

impl Material {
    /// A single-element material.
    pub fn single(
        name: impl Into<String>,
        density: f64,
        atomic_number: u32,
        mass_number: u32,
    ) -> Self {
        Self {
            name: name.into(),
            density,
            elements: vec![Element {
                atomic_number,
                mass_number,
                mass_fraction: 1.0,
            }],
        }
    }

    /// Mass-fraction-weighted mean Z, rounded. `None` with no usable elements.
    pub fn effective_atomic_number(&self) -> Option<u32> {
        self.weighted_mean(|element| element.atomic_number)
    }

    /// Mass-fraction-weighted mean A, rounded. `None` with no usable elements.
    pub fn effective_mass_number(&self) -> Option<u32> {
        self.weighted_mean(|element| element.mass_number)
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn weighted_mean(&self, value: impl Fn(&Element) -> u32) -> Option<u32> {
        let (weighted, total) = self
            .elements
            .iter()
            .filter(|element| element.mass_fraction.is_finite() && element.mass_fraction > 0.0)
            .fold((0.0_f64, 0.0_f64), |(weighted, total), element| {
                (
                    weighted + f64::from(value(element)) * element.mass_fraction,
                    total + element.mass_fraction,
                )
            });
        if total <= 0.0 {
            return None;
        }
        Some((weighted / total).round() as u32)
    }
}

// ---------------------------------------------------------------------------
// Host descriptors
// ---------------------------------------------------------------------------

/// The transport engine's description of a track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackInfo {
    /// Track number within the event.
    pub id: TrackId,
    /// Parent track, `None` for primaries.
    pub parent_id: Option<TrackId>,
    /// Particle species.
    pub particle: ParticleKind,
    /// Process that created the track.
    pub creator: CreatorProcess,
    /// Creation vertex (mm).
    pub vertex: ThreeVector,
    /// Momentum direction at creation.
    pub direction: ThreeVector,
}

impl TrackInfo {
    /// Describe a primary track.
    pub const fn primary(
        id: TrackId,
        particle: ParticleKind,
        vertex: ThreeVector,
        direction: ThreeVector,
    ) -> Self {
        Self {
            id,
            parent_id: None,
            particle,
            creator: CreatorProcess::Primary,
            vertex,
            direction,
        }
    }

    /// Describe a secondary of `parent`.
    pub const fn secondary(
        id: TrackId,
        parent: TrackId,
        particle: ParticleKind,
        creator: CreatorProcess,
        vertex: ThreeVector,
        direction: ThreeVector,
    ) -> Self {
        Self {
            id,
            parent_id: Some(parent),
            particle,
            creator,
            vertex,
            direction,
        }
    }

    /// Whether the track was injected by the event generator.
    pub const fn is_primary(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// Everything the tracker needs to know about one transport step.
#[derive(Debug, Clone)]
pub struct StepObservation {
    /// The stepping track.
    pub track: TrackInfo,
    /// Position at the start of the step (mm).
    pub pre_position: ThreeVector,
    /// Position at the end of the step (mm). Deposits are placed here.
    pub post_position: ThreeVector,
    /// Global time at the end of the step (ns).
    pub time: f64,
    /// Energy deposited during the step (keV).
    pub energy_deposit: f64,
    /// Secondaries created during the step.
    pub secondaries: Vec<TrackInfo>,
    /// Material of the volume the step was taken in.
    pub material: Arc<Material>,
}

impl StepObservation {
    /// Whether this step deposited any energy.
    pub fn has_deposit(&self) -> bool {
        self.energy_deposit.is_finite() && self.energy_deposit > 0.0
    }
}
