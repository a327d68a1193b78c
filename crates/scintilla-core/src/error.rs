//! Error types for the `scintilla-core` crate.

use scintilla_types::{DepositError, LineageId};

use crate::yield_model::YieldError;

/// Errors that can occur while tracking or closing lineages.
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    /// A lineage had to close but no yield model is installed. The lineage
    /// stays open.
    #[error("no yield model configured, lineage {lineage} cannot close")]
    MissingYieldModel {
        /// The lineage that could not close.
        lineage: LineageId,
    },

    /// The yield model rejected a lineage. The lineage stays open.
    #[error("yield model failed for lineage {lineage}: {source}")]
    Yield {
        /// The lineage being closed.
        lineage: LineageId,
        /// The model's error.
        source: YieldError,
    },

    /// A step's deposit could not be recorded.
    #[error(transparent)]
    Deposit(#[from] DepositError),
}
