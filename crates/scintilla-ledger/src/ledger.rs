//! The deposit ledger: an append-only log of raw energy deposits.
//!
//! # Design
//!
//! - **Append-only**: entries for an event are never modified or reordered.
//!   The only removal is [`DepositLedger::take_event`], which hands a whole
//!   event to a downstream consumer.
//! - **Shared**: `record` takes `&self` and serialises appends behind an
//!   internal mutex, so workers processing different events can hold the
//!   same ledger (via `Arc` or [`DepositLedger::global`]) without locking.
//! - **Infallible**: recording never fails. A lock poisoned by a panicking
//!   worker is recovered instead of dropping deposits.

use std::collections::BTreeSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use scintilla_types::{EnergyDeposit, EventId};

/// One ledger row: the event a deposit belongs to, and the deposit itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Simulated event that produced the deposit.
    pub event: EventId,
    /// The deposit, owned by the ledger.
    pub deposit: EnergyDeposit,
}

/// Store of raw deposits keyed by event.
#[derive(Debug, Default)]
pub struct DepositLedger {
    /// All entries, in insertion order.
    entries: Mutex<Vec<LedgerEntry>>,
}

/// The process-wide ledger returned by [`DepositLedger::global`].
static GLOBAL: DepositLedger = DepositLedger::new();

impl DepositLedger {
    /// Create a new empty ledger. No storage is allocated until the first
    /// record.
    pub const fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
        }
    }

    /// The single ledger shared by the whole process.
    ///
    /// Lives until process exit. Prefer passing an explicit
    /// `Arc<DepositLedger>` where the host allows it; this accessor exists
    /// for hosts whose callbacks cannot carry state.
    pub fn global() -> &'static Self {
        &GLOBAL
    }

    fn lock(&self) -> MutexGuard<'_, Vec<LedgerEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a deposit for `event`. Ownership of the deposit moves into the
    /// ledger.
    pub fn record(&self, event: EventId, deposit: EnergyDeposit) {
        trace!(
            %event,
            energy_kev = deposit.energy(),
            time_ns = deposit.time(),
            interaction = ?deposit.interaction(),
            "Deposit recorded"
        );
        self.lock().push(LedgerEntry { event, deposit });
    }

    /// Total number of entries across all events.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the ledger holds no entries.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Copies of every entry, in insertion order.
    pub fn entries(&self) -> Vec<LedgerEntry> {
        self.lock().clone()
    }

    /// Copies of the deposits recorded for `event`, in recording order.
    pub fn deposits_for(&self, event: EventId) -> Vec<EnergyDeposit> {
        self.lock()
            .iter()
            .filter(|entry| entry.event == event)
            .map(|entry| entry.deposit.clone())
            .collect()
    }

    /// Distinct events that have at least one entry, ascending.
    pub fn event_ids(&self) -> Vec<EventId> {
        self.lock()
            .iter()
            .map(|entry| entry.event)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Sum of deposited energy (keV) for `event`.
    pub fn total_energy(&self, event: EventId) -> f64 {
        self.lock()
            .iter()
            .filter(|entry| entry.event == event)
            .map(|entry| entry.deposit.energy())
            .sum()
    }

    /// Remove and return every deposit of `event`, in recording order.
    ///
    /// Entries of other events keep their relative order.
    pub fn take_event(&self, event: EventId) -> Vec<EnergyDeposit> {
        let mut entries = self.lock();
        let (taken, kept): (Vec<LedgerEntry>, Vec<LedgerEntry>) =
            std::mem::take(&mut *entries)
                .into_iter()
                .partition(|entry| entry.event == event);
        *entries = kept;
        drop(entries);

        debug!(%event, deposits = taken.len(), "Event taken from ledger");
        taken.into_iter().map(|entry| entry.deposit).collect()
    }
}
