//! Lineage tracking and yield hand-off for the Scintilla aggregation core.
//!
//! The transport host feeds every step into a [`LineageTracker`], which
//! decides whether the step's deposit extends an existing lineage (an
//! electron and its delta rays, a gamma and its Compton electrons) or starts
//! a new one. When the track that opened a lineage finishes, the lineage is
//! closed and handed to a [`YieldModel`] exactly once.
//!
//! # Modules
//!
//! - [`ancestry`] -- [`AncestryKey`] lookup keys for in-flight tracks.
//! - [`classify`] -- [`child_type`] interaction classification.
//! - [`config`] -- [`TrackerConfig`] and its YAML loader.
//! - [`error`] -- [`TrackerError`].
//! - [`tracker`] -- The [`LineageTracker`] state machine.
//! - [`yield_model`] -- The [`YieldModel`] trait and [`LinearYieldModel`].
//!
//! # Usage
//!
//! ```
//! use std::sync::Arc;
//!
//! use scintilla_core::{LineageTracker, LinearYieldModel, TrackerConfig};
//! use scintilla_types::{Material, ParticleKind, StepObservation, ThreeVector, TrackId, TrackInfo};
//!
//! let mut tracker = LineageTracker::new(TrackerConfig::default())
//!     .map(|t| t.with_yield_model(Box::new(LinearYieldModel::default())));
//! let Ok(tracker) = tracker.as_mut() else { return };
//!
//! let electron = TrackInfo::primary(
//!     TrackId::new(1),
//!     ParticleKind::Electron,
//!     ThreeVector::ZERO,
//!     ThreeVector::new(0.0, 0.0, 1.0),
//! );
//! let step = StepObservation {
//!     track: electron.clone(),
//!     pre_position: ThreeVector::ZERO,
//!     post_position: ThreeVector::new(0.0, 0.0, 0.1),
//!     time: 0.01,
//!     energy_deposit: 5.0,
//!     secondaries: Vec::new(),
//!     material: Arc::new(Material::single("LXe", 2.888, 54, 131)),
//! };
//! let _ = tracker.observe(&step);
//! let closed = tracker.finish_track(&electron).unwrap_or_default();
//! assert_eq!(closed.len(), 1);
//! assert!(closed.iter().all(|lineage| lineage.result_calculated()));
//! ```

pub mod ancestry;
pub mod classify;
pub mod config;
pub mod error;
pub mod tracker;
pub mod yield_model;

pub use ancestry::AncestryKey;
pub use classify::child_type;
pub use config::{ConfigError, DEFAULT_GAMMA_BREAK_MM, TrackerConfig};
pub use error::TrackerError;
pub use tracker::{LineageTracker, StepOutcome};
pub use yield_model::{LineageYield, LinearYieldModel, YieldError, YieldModel};
