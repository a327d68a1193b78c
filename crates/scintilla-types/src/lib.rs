//! Shared type definitions for the Scintilla lineage aggregation core.
//!
//! This crate is the single source of truth for the data shapes passed
//! between the transport host, the lineage tracker, the deposit ledger, and
//! the yield model.
//!
//! # Modules
//!
//! - [`ids`] -- Integer newtypes for events, tracks, and lineages
//! - [`geometry`] -- [`ThreeVector`] positions and directions
//! - [`enums`] -- Interaction tags, particle species, creator processes
//! - [`structs`] -- Deposits, hits, lineages, materials, step descriptors
//!
//! # Units
//!
//! Lengths are millimetres, energies keV, times nanoseconds, densities g/cm³.

pub mod enums;
pub mod geometry;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{CreatorProcess, InteractionType, ParticleKind};
pub use geometry::ThreeVector;
pub use ids::{EventId, LineageId, TrackId};
pub use structs::{
    Element, EnergyDeposit, Hit, Lineage, Material, QuantaResult, StepObservation, TrackInfo,
};

/// Errors raised while building data records.
#[derive(Debug, thiserror::Error)]
pub enum DepositError {
    /// Deposited energy must be finite and strictly positive.
    #[error("deposit energy must be positive, got {energy}")]
    NonPositiveEnergy {
        /// The rejected energy.
        energy: f64,
    },
}
