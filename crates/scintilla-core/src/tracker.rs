//! The lineage tracker: groups step deposits into lineages and closes them.
//!
//! # Algorithm
//!
//! Every track is looked up by its [`AncestryKey`]. A key is in one of two
//! states:
//!
//! - **Linked** to an open lineage. The track either opened that lineage
//!   (its originator) or was merged into it at birth.
//! - **Pending**: a secondary that will open its own lineage, with a tag
//!   already decided, on its first deposit.
//!
//! Unknown keys belong to primaries (or tracks the host never announced) and
//! open a lineage on their first deposit.
//!
//! Optical photons and short-lived particles are not applicable: their steps
//! are ignored and they are never registered as secondaries.
//!
//! When a step lists secondaries, each one is linked to the stepping track's
//! lineage if its creation vertex lies within `gamma_break` of the lineage
//! origin, and registered as pending otherwise. With
//! `detailed_secondaries` off, all of them are linked.
//!
//! A lineage closes when its originating track finishes, or when the event
//! ends. Closing derives density/A/Z from the latest material seen, calls the
//! yield model once, and removes the lineage from the working set.
//!
//! # Ownership
//!
//! A tracker belongs to one worker and is mutated through `&mut self`. It
//! holds no locks.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use tracing::{debug, trace, warn};

use scintilla_types::{
    EnergyDeposit, EventId, Hit, InteractionType, Lineage, LineageId, Material, StepObservation,
    TrackId, TrackInfo,
};

use crate::ancestry::AncestryKey;
use crate::classify::child_type;
use crate::config::{ConfigError, TrackerConfig, validate_gamma_break};
use crate::error::TrackerError;
use crate::yield_model::{LineageYield, YieldModel};

/// What the tracker knows about a track key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyState {
    /// Steps of the track contribute to this lineage.
    Linked {
        /// The lineage.
        lineage: LineageId,
        /// Whether this track opened the lineage.
        originator: bool,
    },
    /// Secondary that opens a lineage with this tag on its first deposit.
    Pending {
        /// Tag for the lineage it will open.
        interaction: InteractionType,
    },
}

/// A lineage in the working set plus the bookkeeping needed to close it.
#[derive(Debug)]
struct OpenLineage {
    lineage: Lineage,
    originator: AncestryKey,
    /// Keys of secondaries merged into this lineage.
    members: Vec<AncestryKey>,
    /// Material of the latest step linked to the lineage.
    material: Option<Arc<Material>>,
}

/// Result of observing one step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepOutcome {
    /// Lineage the step's track belongs to after the step, if any.
    pub lineage: Option<LineageId>,
    /// Whether this step opened that lineage.
    pub opened: bool,
    /// Deposit built from the step, ready for the ledger. `None` when the
    /// step deposited no energy.
    pub deposit: Option<EnergyDeposit>,
    /// Secondaries linked to the step's lineage.
    pub merged: Vec<TrackId>,
    /// Secondaries that will open lineages of their own.
    pub pending: Vec<TrackId>,
}

/// Per-worker lineage state machine.
pub struct LineageTracker {
    config: TrackerConfig,
    yield_model: Option<Box<dyn YieldModel>>,
    keys: HashMap<AncestryKey, KeyState>,
    /// Open lineages by id, which is also creation order.
    open: BTreeMap<LineageId, OpenLineage>,
    next_id: u64,
    event: Option<EventId>,
}

impl fmt::Debug for LineageTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LineageTracker")
            .field("config", &self.config)
            .field("has_yield_model", &self.yield_model.is_some())
            .field("open_lineages", &self.open.len())
            .field("tracked_keys", &self.keys.len())
            .field("event", &self.event)
            .finish()
    }
}

impl Default for LineageTracker {
    fn default() -> Self {
        Self {
            config: TrackerConfig::default(),
            yield_model: None,
            keys: HashMap::new(),
            open: BTreeMap::new(),
            next_id: 0,
            event: None,
        }
    }
}

impl LineageTracker {
    /// Create a tracker with `config` and no yield model.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the configuration is invalid.
    pub fn new(config: TrackerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::default()
        })
    }

    /// Builder-style variant of [`set_yield_model`](Self::set_yield_model).
    #[must_use]
    pub fn with_yield_model(mut self, model: Box<dyn YieldModel>) -> Self {
        self.yield_model = Some(model);
        self
    }

    /// Install or replace the yield model.
    pub fn set_yield_model(&mut self, model: Box<dyn YieldModel>) {
        self.yield_model = Some(model);
    }

    /// Current configuration.
    pub const fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Toggle per-secondary lineages.
    pub const fn set_detailed_secondaries(&mut self, detailed: bool) {
        self.config.detailed_secondaries = detailed;
    }

    /// Change the merge distance.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidGammaBreak`] for a negative or
    /// non-finite value; the previous value stays in effect.
    pub fn set_gamma_break(&mut self, gamma_break: f64) -> Result<(), ConfigError> {
        if let Err(err) = validate_gamma_break(gamma_break) {
            warn!(
                rejected = gamma_break,
                kept = self.config.gamma_break,
                "gamma_break change rejected"
            );
            return Err(err);
        }
        self.config.gamma_break = gamma_break;
        Ok(())
    }

    /// The event currently being processed, if announced.
    pub const fn event_id(&self) -> Option<EventId> {
        self.event
    }

    /// Number of lineages in the working set.
    pub fn open_lineage_count(&self) -> usize {
        self.open.len()
    }

    /// Look at an open lineage.
    pub fn open_lineage(&self, id: LineageId) -> Option<&Lineage> {
        self.open.get(&id).map(|open| &open.lineage)
    }

    /// Start a new event, discarding anything left over from the previous
    /// one. Leftover lineages are dropped without computing their yield.
    pub fn begin_event(&mut self, event: EventId) {
        if !self.open.is_empty() {
            warn!(
                %event,
                previous = ?self.event,
                dropped = self.open.len(),
                "Discarding open lineages from previous event"
            );
        }
        self.open.clear();
        self.keys.clear();
        self.event = Some(event);
    }

    /// Feed one transport step.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::Deposit`] if the step's deposit cannot be
    /// recorded.
    pub fn observe(&mut self, step: &StepObservation) -> Result<StepOutcome, TrackerError> {
        let mut outcome = StepOutcome::default();
        if !step.track.particle.is_applicable() {
            return Ok(outcome);
        }
        let key = AncestryKey::of(&step.track);

        let mut current = match self.keys.get(&key) {
            Some(KeyState::Linked { lineage, .. }) if self.open.contains_key(lineage) => {
                Some(*lineage)
            }
            _ => None,
        };

        if step.has_deposit() {
            let interaction = match current.and_then(|id| self.open.get(&id)) {
                Some(open) => open.lineage.interaction(),
                None => self.opening_tag(&key, &step.track),
            };
            let deposit = EnergyDeposit::new(
                step.energy_deposit,
                step.post_position,
                step.time,
                interaction,
            )?;
            let hit = Hit::from(&deposit);

            match current.and_then(|id| self.open.get_mut(&id)) {
                Some(open) => {
                    trace!(
                        lineage = %open.lineage.id(),
                        track = %step.track.id,
                        energy_kev = hit.energy,
                        "Hit appended"
                    );
                    open.lineage.push_hit(hit);
                }
                None => {
                    current = Some(self.open_lineage_for(key, interaction, hit));
                    outcome.opened = true;
                }
            }
            outcome.deposit = Some(deposit);
        }

        if let Some(open) = current.and_then(|id| self.open.get_mut(&id)) {
            open.material = Some(Arc::clone(&step.material));
        }

        for secondary in &step.secondaries {
            self.register_secondary(&step.track, current, secondary, &mut outcome);
        }

        outcome.lineage = current;
        Ok(outcome)
    }

    /// Signal that `track` will take no more steps.
    ///
    /// Closes the lineage the track originated, if any, and returns it.
    /// Finishing a merged secondary only forgets its key. Finishing an
    /// unknown or already-finished track does nothing.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::MissingYieldModel`] or
    /// [`TrackerError::Yield`] if the lineage cannot be closed; it then
    /// stays open and the call can be retried.
    pub fn finish_track(&mut self, track: &TrackInfo) -> Result<Vec<Lineage>, TrackerError> {
        let key = AncestryKey::of(track);
        match self.keys.get(&key).copied() {
            Some(KeyState::Linked {
                lineage,
                originator: true,
            }) => match self.compute(lineage)? {
                Some(computed) => Ok(self.seal(lineage, computed).into_iter().collect()),
                None => Ok(Vec::new()),
            },
            Some(_) => {
                self.keys.remove(&key);
                Ok(Vec::new())
            }
            None => Ok(Vec::new()),
        }
    }

    /// Close every lineage still open, oldest first, and forget all keys.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::MissingYieldModel`] or [`TrackerError::Yield`]
    /// if any lineage cannot be closed. Yields are computed for every lineage
    /// before any is sealed, so on error nothing closes and every lineage
    /// stays open.
    pub fn end_event(&mut self) -> Result<Vec<Lineage>, TrackerError> {
        let ids: Vec<LineageId> = self.open.keys().copied().collect();
        let mut computed = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(result) = self.compute(id)? {
                computed.push((id, result));
            }
        }

        let closed: Vec<Lineage> = computed
            .into_iter()
            .filter_map(|(id, result)| self.seal(id, result))
            .collect();
        self.keys.clear();

        debug!(event = ?self.event, closed = closed.len(), "Event flushed");
        Ok(closed)
    }

    /// Tag for a lineage about to be opened by the track with `key`.
    fn opening_tag(&self, key: &AncestryKey, track: &TrackInfo) -> InteractionType {
        match self.keys.get(key) {
            Some(KeyState::Pending { interaction }) => *interaction,
            _ => {
                if !track.is_primary() {
                    debug!(
                        track = %track.id,
                        parent = ?track.parent_id,
                        "Unannounced secondary classified as a primary"
                    );
                }
                child_type(None, track)
            }
        }
    }

    fn open_lineage_for(
        &mut self,
        key: AncestryKey,
        interaction: InteractionType,
        first: Hit,
    ) -> LineageId {
        self.next_id = self.next_id.saturating_add(1);
        let id = LineageId::new(self.next_id);
        let lineage = Lineage::open(id, interaction, first);

        debug!(
            lineage = %id,
            track = %key.track(),
            ?interaction,
            origin = ?lineage.origin(),
            "Lineage opened"
        );

        self.keys.insert(
            key,
            KeyState::Linked {
                lineage: id,
                originator: true,
            },
        );
        self.open.insert(
            id,
            OpenLineage {
                lineage,
                originator: key,
                members: Vec::new(),
                material: None,
            },
        );
        id
    }

    fn register_secondary(
        &mut self,
        parent: &TrackInfo,
        parent_lineage: Option<LineageId>,
        secondary: &TrackInfo,
        outcome: &mut StepOutcome,
    ) {
        if !secondary.particle.is_applicable() {
            return;
        }
        let key = AncestryKey::of(secondary);

        if let Some(open) = parent_lineage.and_then(|id| self.open.get_mut(&id)) {
            let distance = secondary.vertex.distance(open.lineage.origin());
            if !self.config.detailed_secondaries || distance <= self.config.gamma_break {
                let lineage = open.lineage.id();
                open.members.push(key);
                let previous = self.keys.insert(
                    key,
                    KeyState::Linked {
                        lineage,
                        originator: false,
                    },
                );
                warn_on_collision(previous, secondary.id);
                debug!(
                    %lineage,
                    secondary = %secondary.id,
                    distance_mm = distance,
                    "Secondary merged into parent lineage"
                );
                outcome.merged.push(secondary.id);
                return;
            }
        }

        let interaction = child_type(Some(parent), secondary);
        let previous = self.keys.insert(key, KeyState::Pending { interaction });
        warn_on_collision(previous, secondary.id);
        trace!(
            parent = %parent.id,
            secondary = %secondary.id,
            ?interaction,
            "Secondary will open its own lineage"
        );
        outcome.pending.push(secondary.id);
    }

    /// Compute the yield of an open lineage without closing it. Returns
    /// `None` if the lineage is not open or already sealed.
    fn compute(&mut self, id: LineageId) -> Result<Option<LineageYield>, TrackerError> {
        let Some(open) = self.open.get_mut(&id) else {
            return Ok(None);
        };
        if open.lineage.is_closed() {
            return Ok(None);
        }
        let Some(model) = self.yield_model.as_deref() else {
            return Err(TrackerError::MissingYieldModel { lineage: id });
        };

        if let Some(material) = &open.material {
            open.lineage.apply_material(material);
        }
        model
            .compute_yield(&open.lineage)
            .map(Some)
            .map_err(|source| TrackerError::Yield { lineage: id, source })
    }

    /// Store `computed` on the lineage and remove it from the working set.
    fn seal(&mut self, id: LineageId, computed: LineageYield) -> Option<Lineage> {
        let mut open = self.open.remove(&id)?;
        open.lineage.seal(computed.total, computed.per_hit);
        self.keys.remove(&open.originator);

        // Merged secondaries still in flight open a fresh lineage of the same
        // class if they deposit again.
        let interaction = open.lineage.interaction();
        for member in &open.members {
            if let Some(state) = self.keys.get_mut(member) {
                if matches!(*state, KeyState::Linked { lineage, .. } if lineage == id) {
                    *state = KeyState::Pending { interaction };
                }
            }
        }

        debug!(
            lineage = %id,
            ?interaction,
            hits = open.lineage.hits().len(),
            energy_kev = open.lineage.total_energy(),
            photons = open.lineage.result().photons,
            electrons = open.lineage.result().electrons,
            "Lineage closed"
        );
        Some(open.lineage)
    }
}

/// Two live tracks sharing a key breaks the host's identification scheme.
fn warn_on_collision(previous: Option<KeyState>, track: TrackId) {
    if let Some(previous) = previous {
        warn!(%track, ?previous, "Ancestry key collision, previous association replaced");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use scintilla_types::{CreatorProcess, ParticleKind, QuantaResult, ThreeVector};

    use crate::yield_model::{LineageYield, LinearYieldModel, YieldError};

    use super::*;

    const Z_AXIS: ThreeVector = ThreeVector::new(0.0, 0.0, 1.0);

    /// Yield model that counts its calls.
    struct Counting(Arc<AtomicUsize>);

    impl YieldModel for Counting {
        fn compute_yield(&self, lineage: &Lineage) -> Result<LineageYield, YieldError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(LineageYield {
                total: QuantaResult {
                    photons: lineage.hits().len() as u64,
                    ..QuantaResult::default()
                },
                per_hit: Vec::new(),
            })
        }
    }

    /// Yield model that always fails.
    struct Failing;

    impl YieldModel for Failing {
        fn compute_yield(&self, lineage: &Lineage) -> Result<LineageYield, YieldError> {
            Err(YieldError::Unsupported {
                interaction: lineage.interaction(),
            })
        }
    }

    /// Yield model that succeeds on its first `budget` calls, then fails.
    struct FailsAfter {
        budget: usize,
        calls: Arc<AtomicUsize>,
    }

    impl YieldModel for FailsAfter {
        fn compute_yield(&self, lineage: &Lineage) -> Result<LineageYield, YieldError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.budget {
                Ok(LineageYield::default())
            } else {
                Err(YieldError::Model {
                    message: format!("out of budget at {}", lineage.id()),
                })
            }
        }
    }

    fn xenon() -> Arc<Material> {
        Arc::new(Material::single("LXe", 2.888, 54, 131))
    }

    fn electron() -> TrackInfo {
        TrackInfo::primary(TrackId::new(1), ParticleKind::Electron, ThreeVector::ZERO, Z_AXIS)
    }

    fn step(track: &TrackInfo, z: f64, energy: f64) -> StepObservation {
        StepObservation {
            track: track.clone(),
            pre_position: ThreeVector::new(0.0, 0.0, z - 1.0),
            post_position: ThreeVector::new(0.0, 0.0, z),
            time: z,
            energy_deposit: energy,
            secondaries: Vec::new(),
            material: xenon(),
        }
    }

    fn counting_tracker() -> (LineageTracker, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let tracker =
            LineageTracker::default().with_yield_model(Box::new(Counting(Arc::clone(&calls))));
        (tracker, calls)
    }

    #[test]
    fn single_track_builds_one_lineage_in_step_order() {
        let (mut tracker, _) = counting_tracker();
        let track = electron();

        let first = tracker.observe(&step(&track, 1.0, 3.0)).unwrap();
        assert!(first.opened);
        let id = first.lineage.unwrap();

        for (z, energy) in [(2.0, 2.0), (3.0, 0.0), (4.0, 1.0)] {
            let outcome = tracker.observe(&step(&track, z, energy)).unwrap();
            assert_eq!(outcome.lineage, Some(id));
            assert!(!outcome.opened);
            assert_eq!(outcome.deposit.is_some(), energy > 0.0);
        }

        assert_eq!(tracker.open_lineage_count(), 1);
        let lineage = tracker.open_lineage(id).unwrap();
        let energies: Vec<f64> = lineage.hits().iter().map(|h| h.energy).collect();
        assert_eq!(energies, vec![3.0, 2.0, 1.0]);
        assert_eq!(lineage.interaction(), InteractionType::Beta);
    }

    #[test]
    fn zero_deposit_opens_nothing() {
        let (mut tracker, _) = counting_tracker();
        let outcome = tracker.observe(&step(&electron(), 1.0, 0.0)).unwrap();
        assert_eq!(outcome.lineage, None);
        assert!(outcome.deposit.is_none());
        assert_eq!(tracker.open_lineage_count(), 0);
    }

    #[test]
    fn finish_track_closes_once() {
        let (mut tracker, calls) = counting_tracker();
        let track = electron();
        let id = tracker.observe(&step(&track, 1.0, 3.0)).unwrap().lineage.unwrap();
        assert!(!tracker.open_lineage(id).unwrap().result_calculated());

        let closed = tracker.finish_track(&track).unwrap();
        assert_eq!(closed.len(), 1);
        assert!(closed[0].result_calculated());
        assert_eq!(closed[0].atomic_number(), Some(54));
        assert_eq!(closed[0].mass_number(), Some(131));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // Second finish of the same track is a no-op.
        assert!(tracker.finish_track(&track).unwrap().is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.open_lineage_count(), 0);
    }

    #[test]
    fn missing_yield_model_fails_and_keeps_lineage_open() {
        let mut tracker = LineageTracker::default();
        let track = electron();
        let id = tracker.observe(&step(&track, 1.0, 3.0)).unwrap().lineage.unwrap();

        let result = tracker.finish_track(&track);
        assert!(
            matches!(result, Err(TrackerError::MissingYieldModel { lineage }) if lineage == id)
        );
        assert_eq!(tracker.open_lineage_count(), 1);
        assert!(!tracker.open_lineage(id).unwrap().result_calculated());

        tracker.set_yield_model(Box::new(LinearYieldModel::default()));
        let closed = tracker.finish_track(&track).unwrap();
        assert_eq!(closed.len(), 1);
        assert!(closed[0].result_calculated());
    }

    #[test]
    fn yield_error_keeps_lineage_open() {
        let mut tracker = LineageTracker::default().with_yield_model(Box::new(Failing));
        let track = electron();
        tracker.observe(&step(&track, 1.0, 3.0)).unwrap();
        assert!(matches!(tracker.finish_track(&track), Err(TrackerError::Yield { .. })));
        assert_eq!(tracker.open_lineage_count(), 1);
    }

    #[test]
    fn coarse_mode_merges_distant_secondaries() {
        let (mut tracker, _) = counting_tracker();
        tracker.set_detailed_secondaries(false);
        let parent = electron();
        let far = TrackInfo::secondary(
            TrackId::new(2),
            TrackId::new(1),
            ParticleKind::Gamma,
            CreatorProcess::Bremsstrahlung,
            ThreeVector::new(0.0, 0.0, 100.0),
            Z_AXIS,
        );
        let mut first = step(&parent, 1.0, 3.0);
        first.secondaries.push(far.clone());

        let outcome = tracker.observe(&first).unwrap();
        assert_eq!(outcome.merged, vec![TrackId::new(2)]);

        let child = tracker.observe(&step(&far, 101.0, 1.0)).unwrap();
        assert_eq!(child.lineage, outcome.lineage);
        assert!(!child.opened);
    }

    #[test]
    fn secondary_of_track_without_lineage_is_pending() {
        let (mut tracker, _) = counting_tracker();
        let neutron = TrackInfo::primary(
            TrackId::new(1),
            ParticleKind::Neutron,
            ThreeVector::ZERO,
            Z_AXIS,
        );
        let recoil = TrackInfo::secondary(
            TrackId::new(2),
            TrackId::new(1),
            ParticleKind::Ion,
            CreatorProcess::HadronElastic,
            ThreeVector::new(0.0, 0.0, 5.0),
            Z_AXIS,
        );
        let mut scatter = step(&neutron, 5.0, 0.0);
        scatter.secondaries.push(recoil.clone());

        let outcome = tracker.observe(&scatter).unwrap();
        assert_eq!(outcome.lineage, None);
        assert_eq!(outcome.pending, vec![TrackId::new(2)]);

        let recoil_step = tracker.observe(&step(&recoil, 5.0, 20.0)).unwrap();
        let id = recoil_step.lineage.unwrap();
        assert_eq!(
            tracker.open_lineage(id).unwrap().interaction(),
            InteractionType::NuclearRecoil
        );
        assert_eq!(
            recoil_step.deposit.unwrap().interaction(),
            InteractionType::NuclearRecoil
        );
    }

    #[test]
    fn merged_secondary_outliving_its_lineage_opens_a_new_one() {
        let (mut tracker, _) = counting_tracker();
        let parent = electron();
        let delta = TrackInfo::secondary(
            TrackId::new(2),
            TrackId::new(1),
            ParticleKind::Electron,
            CreatorProcess::Ionisation,
            ThreeVector::new(0.0, 0.0, 1.0),
            Z_AXIS,
        );
        let mut first = step(&parent, 1.0, 3.0);
        first.secondaries.push(delta.clone());
        let parent_lineage = tracker.observe(&first).unwrap().lineage;

        tracker.finish_track(&parent).unwrap();
        let late = tracker.observe(&step(&delta, 2.0, 1.0)).unwrap();
        assert!(late.opened);
        assert_ne!(late.lineage, parent_lineage);
        let id = late.lineage.unwrap();
        assert_eq!(tracker.open_lineage(id).unwrap().interaction(), InteractionType::Beta);
    }

    #[test]
    fn finishing_merged_secondary_leaves_lineage_open() {
        let (mut tracker, calls) = counting_tracker();
        let parent = electron();
        let delta = TrackInfo::secondary(
            TrackId::new(2),
            TrackId::new(1),
            ParticleKind::Electron,
            CreatorProcess::Ionisation,
            ThreeVector::new(0.0, 0.0, 1.0),
            Z_AXIS,
        );
        let mut first = step(&parent, 1.0, 3.0);
        first.secondaries.push(delta.clone());
        tracker.observe(&first).unwrap();

        assert!(tracker.finish_track(&delta).unwrap().is_empty());
        assert_eq!(tracker.open_lineage_count(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn end_event_closes_everything_in_creation_order() {
        let (mut tracker, calls) = counting_tracker();
        tracker.begin_event(EventId::new(7));
        let a = electron();
        let b = TrackInfo::primary(
            TrackId::new(5),
            ParticleKind::Alpha,
            ThreeVector::new(50.0, 0.0, 0.0),
            Z_AXIS,
        );
        tracker.observe(&step(&a, 1.0, 1.0)).unwrap();
        tracker.observe(&step(&b, 1.0, 1.0)).unwrap();

        let closed = tracker.end_event().unwrap();
        assert_eq!(closed.len(), 2);
        assert!(closed[0].id() < closed[1].id());
        assert!(closed.iter().all(Lineage::result_calculated));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.open_lineage_count(), 0);
        assert_eq!(tracker.event_id(), Some(EventId::new(7)));
    }

    #[test]
    fn end_event_without_model_closes_nothing() {
        let mut tracker = LineageTracker::default();
        tracker.observe(&step(&electron(), 1.0, 1.0)).unwrap();
        assert!(tracker.end_event().is_err());
        assert_eq!(tracker.open_lineage_count(), 1);
    }

    #[test]
    fn failed_flush_keeps_every_lineage_open() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut tracker = LineageTracker::default().with_yield_model(Box::new(FailsAfter {
            budget: 1,
            calls: Arc::clone(&calls),
        }));
        let a = electron();
        let b = TrackInfo::primary(
            TrackId::new(5),
            ParticleKind::Alpha,
            ThreeVector::new(50.0, 0.0, 0.0),
            Z_AXIS,
        );
        let first = tracker.observe(&step(&a, 1.0, 1.0)).unwrap().lineage.unwrap();
        let second = tracker.observe(&step(&b, 1.0, 1.0)).unwrap().lineage.unwrap();

        let result = tracker.end_event();
        assert!(matches!(result, Err(TrackerError::Yield { lineage, .. }) if lineage == second));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.open_lineage_count(), 2);
        assert!(!tracker.open_lineage(first).unwrap().result_calculated());
        assert!(!tracker.open_lineage(second).unwrap().result_calculated());

        // A working model closes both on retry, and the originators are still
        // linked so no key state was lost.
        tracker.set_yield_model(Box::new(LinearYieldModel::default()));
        let closed = tracker.end_event().unwrap();
        let ids: Vec<LineageId> = closed.iter().map(Lineage::id).collect();
        assert_eq!(ids, vec![first, second]);
        assert!(closed.iter().all(Lineage::result_calculated));
    }

    #[test]
    fn optical_photons_are_ignored() {
        let (mut tracker, calls) = counting_tracker();
        let parent = electron();
        let photons: Vec<TrackInfo> = (2..1002)
            .map(|id| {
                TrackInfo::secondary(
                    TrackId::new(id),
                    TrackId::new(1),
                    ParticleKind::OpticalPhoton,
                    CreatorProcess::Other,
                    ThreeVector::new(0.0, 0.0, 1.0),
                    Z_AXIS,
                )
            })
            .collect();
        let mut first = step(&parent, 1.0, 3.0);
        first.secondaries.clone_from(&photons);

        let outcome = tracker.observe(&first).unwrap();
        assert!(outcome.merged.is_empty());
        assert!(outcome.pending.is_empty());
        assert_eq!(tracker.keys.len(), 1);

        let absorbed = tracker.observe(&step(&photons[0], 2.0, 3e-6)).unwrap();
        assert!(!absorbed.opened);
        assert_eq!(absorbed.lineage, None);
        assert!(absorbed.deposit.is_none());
        assert_eq!(tracker.open_lineage_count(), 1);

        assert!(tracker.finish_track(&photons[0]).unwrap().is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn short_lived_tracks_are_ignored() {
        let (mut tracker, _) = counting_tracker();
        let resonance = TrackInfo::primary(
            TrackId::new(9),
            ParticleKind::ShortLived,
            ThreeVector::ZERO,
            Z_AXIS,
        );
        let outcome = tracker.observe(&step(&resonance, 1.0, 4.0)).unwrap();
        assert_eq!(outcome, StepOutcome::default());
        assert_eq!(tracker.open_lineage_count(), 0);
    }

    #[test]
    fn begin_event_discards_leftovers() {
        let (mut tracker, calls) = counting_tracker();
        tracker.begin_event(EventId::new(1));
        tracker.observe(&step(&electron(), 1.0, 1.0)).unwrap();
        tracker.begin_event(EventId::new(2));
        assert_eq!(tracker.open_lineage_count(), 0);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn rejected_gamma_break_keeps_previous_value() {
        let mut tracker = LineageTracker::default();
        assert!(tracker.set_gamma_break(4.0).is_ok());
        assert!(tracker.set_gamma_break(-1.0).is_err());
        assert!(tracker.set_gamma_break(f64::NAN).is_err());
        assert!((tracker.config().gamma_break - 4.0).abs() < f64::EPSILON);
    }

    #[test]
    fn new_rejects_invalid_config() {
        let config = TrackerConfig {
            gamma_break: -3.0,
            ..TrackerConfig::default()
        };
        assert!(LineageTracker::new(config).is_err());
    }

    #[test]
    fn hits_get_apportioned_results() {
        let mut tracker = LineageTracker::default().with_yield_model(Box::new(LinearYieldModel {
            w_value_ev: 10.0,
            ..LinearYieldModel::default()
        }));
        let track = electron();
        tracker.observe(&step(&track, 1.0, 10.0)).unwrap();
        tracker.observe(&step(&track, 2.0, 5.0)).unwrap();

        let closed = tracker.finish_track(&track).unwrap();
        let lineage = &closed[0];
        let summed: u64 = lineage.hits().iter().map(|h| h.result.ions).sum();
        assert_eq!(summed, lineage.result().ions);
        assert!(lineage.hits()[0].result.ions > lineage.hits()[1].result.ions);
    }
}
