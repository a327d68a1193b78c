//! Process-wide ledger of raw energy deposits for the Scintilla core.
//!
//! Every energy deposit the transport host observes can be recorded here
//! against the simulated event that produced it. The ledger is pure
//! bookkeeping: it knows nothing about lineages or yields, and it is the one
//! piece of state shared across parallel event workers.
//!
//! # Usage
//!
//! ```
//! use std::sync::Arc;
//!
//! use scintilla_ledger::DepositLedger;
//! use scintilla_types::{EnergyDeposit, EventId, InteractionType, ThreeVector};
//!
//! let ledger = Arc::new(DepositLedger::new());
//! let deposit = EnergyDeposit::new(10.0, ThreeVector::ZERO, 0.0, InteractionType::GammaRay);
//! if let Ok(deposit) = deposit {
//!     ledger.record(EventId::new(1), deposit);
//! }
//! assert_eq!(ledger.deposits_for(EventId::new(1)).len(), 1);
//! ```

pub mod ledger;

// Re-export primary types at crate root.
pub use ledger::{DepositLedger, LedgerEntry};
