//! The yield model seam and a linear reference model.
//!
//! When a lineage closes, the tracker hands it to a [`YieldModel`] exactly
//! once. The model sees the fully populated lineage (interaction type,
//! density, A, Z, ordered hits) and returns quanta counts. What the model
//! does internally (recombination, fluctuations, field dependence) is none
//! of the tracker's business.

use scintilla_types::{InteractionType, Lineage, QuantaResult};

/// Errors a yield model may report.
#[derive(Debug, thiserror::Error)]
pub enum YieldError {
    /// The model has no parametrisation for this interaction class.
    #[error("yield model does not support {interaction:?} lineages")]
    Unsupported {
        /// The rejected interaction class.
        interaction: InteractionType,
    },

    /// Any other model failure.
    #[error("yield model error: {message}")]
    Model {
        /// Description of the failure.
        message: String,
    },
}

/// Output of one yield computation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LineageYield {
    /// Quanta for the whole lineage.
    pub total: QuantaResult,
    /// Optional per-hit breakdown, used as-is when it has exactly one entry
    /// per hit. Otherwise `total` is split across hits by energy.
    pub per_hit: Vec<QuantaResult>,
}

/// Converts a closing lineage into quanta.
pub trait YieldModel: Send {
    /// Compute the yield of `lineage`. Called once per lineage, right before
    /// it closes.
    ///
    /// # Errors
    ///
    /// Returns [`YieldError`] if the model cannot handle the lineage. The
    /// lineage then stays open.
    fn compute_yield(&self, lineage: &Lineage) -> Result<LineageYield, YieldError>;
}

/// Deterministic yield: one quantum per `w_value_ev` of deposited energy,
/// split between excitons and ions by a fixed ratio per interaction class.
///
/// No recombination is modelled: every exciton becomes a photon and every
/// ion an electron. Useful as a reference and for tests.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearYieldModel {
    /// Mean energy per quantum in eV.
    pub w_value_ev: f64,
    /// Exciton-to-ion ratio for electron recoils.
    pub electron_recoil_ratio: f64,
    /// Exciton-to-ion ratio for nuclear recoils, alphas, and ions.
    pub nuclear_recoil_ratio: f64,
}

impl Default for LinearYieldModel {
    fn default() -> Self {
        Self {
            w_value_ev: 13.7,
            electron_recoil_ratio: 0.2,
            nuclear_recoil_ratio: 1.0,
        }
    }
}

impl LinearYieldModel {
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    fn quanta(&self, energy_kev: f64, ratio: f64) -> QuantaResult {
        let total = (energy_kev * 1000.0 / self.w_value_ev).floor();
        if !total.is_finite() || total <= 0.0 {
            return QuantaResult::default();
        }
        let total = total as u64;
        let ions = (total as f64 / (1.0 + ratio)).round() as u64;
        let excitons = total.saturating_sub(ions);
        QuantaResult {
            photons: excitons,
            electrons: ions,
            excitons,
            ions,
        }
    }
}

impl YieldModel for LinearYieldModel {
    fn compute_yield(&self, lineage: &Lineage) -> Result<LineageYield, YieldError> {
        if !self.w_value_ev.is_finite() || self.w_value_ev <= 0.0 {
            return Err(YieldError::Model {
                message: format!("W-value must be positive, got {}", self.w_value_ev),
            });
        }
        let interaction = lineage.interaction();
        let total = if interaction == InteractionType::None {
            QuantaResult::default()
        } else if interaction.is_electron_recoil() {
            self.quanta(lineage.total_energy(), self.electron_recoil_ratio)
        } else {
            self.quanta(lineage.total_energy(), self.nuclear_recoil_ratio)
        };
        Ok(LineageYield {
            total,
            per_hit: Vec::new(),
        })
    }
}
