mod availability;
mod error;
mod mutations;
mod queries;
mod store;

pub use availability::{AvailabilityTracker, QuotaError};
pub use error::{EngineError, RecordKey};
pub use queries::GateVerdict;
pub use store::{InMemoryStore, RecordStore, StoreError};

use std::path::Path;

use tracing::{debug, info, warn};

use crate::model::*;
use crate::wal::Journal;

/// Reservation engine for one car park.
///
/// Owns the availability counters and the record store. When opened on a
/// journal, every state change is appended (and fsynced) before it is
/// applied, so a schedule write and its counter move survive or vanish
/// together.
pub struct Engine<S: RecordStore = InMemoryStore> {
    store: S,
    availability: AvailabilityTracker,
    journal: Option<Journal>,
    compact_threshold: u64,
}

/// Apply an event to the store and counters. Used both live and on replay.
fn apply_event<S: RecordStore>(
    store: &mut S,
    availability: &mut AvailabilityTracker,
    event: &Event,
) -> Result<(), EngineError> {
    match event {
        Event::RecordInserted { record } => store.insert(record.clone())?,
        Event::RecordDeleted { id } => {
            store.delete(*id)?;
        }
        Event::RecordUpdated { id, changes } => store.update(*id, changes)?,
        Event::ScheduleCommitted {
            id,
            reserved_dates,
            status,
            quota,
        } => {
            store.update(*id, &[FieldChange::new(Field::ReservedDates, reserved_dates.as_str())])?;
            match quota {
                QuotaMove::Take => {
                    if !availability.try_take(*status) {
                        warn!(%status, employee = *id, "committed reservation found its quota empty");
                    }
                }
                QuotaMove::Release => {
                    availability.release(*status);
                }
            }
            metrics::gauge!(crate::observability::FREE_SPACES).set(f64::from(availability.free_spaces()));
        }
        Event::AvailabilitySnapshot { counters } => availability.restore(counters),
    }
    Ok(())
}

impl<S: RecordStore> Engine<S> {
    /// Engine without a journal: state lives only as long as `store` does.
    pub fn new(store: S, availability: AvailabilityTracker) -> Self {
        Self {
            store,
            availability,
            journal: None,
            compact_threshold: 0,
        }
    }

    /// Open the journal at `path`, replaying it onto `store` and the seeded
    /// `availability`. A `compact_threshold` of 0 disables compaction.
    pub fn open(
        path: &Path,
        mut store: S,
        mut availability: AvailabilityTracker,
        compact_threshold: u64,
    ) -> Result<Self, EngineError> {
        let events = Journal::replay(path).map_err(|e| EngineError::JournalError(e.to_string()))?;
        for event in &events {
            // Entries were validated before they were written; a failure here
            // means the store was seeded with conflicting rows.
            if let Err(e) = apply_event(&mut store, &mut availability, event) {
                warn!("replay: skipping {event:?}: {e}");
            }
        }
        let journal = Journal::open(path).map_err(|e| EngineError::JournalError(e.to_string()))?;
        info!(
            path = %path.display(),
            events = events.len(),
            free_spaces = availability.free_spaces(),
            "journal replayed"
        );
        metrics::gauge!(crate::observability::FREE_SPACES).set(f64::from(availability.free_spaces()));

        Ok(Self {
            store,
            availability,
            journal: Some(journal),
            compact_threshold,
        })
    }

    /// Journal-append + apply in one call.
    pub(super) fn persist_and_apply(&mut self, event: Event) -> Result<(), EngineError> {
        if let Some(journal) = self.journal.as_mut() {
            journal
                .append(&event)
                .map_err(|e| EngineError::JournalError(e.to_string()))?;
            metrics::counter!(crate::observability::JOURNAL_APPENDS_TOTAL).increment(1);
        }
        apply_event(&mut self.store, &mut self.availability, &event)?;
        debug!(?event, "applied");
        self.maybe_compact();
        Ok(())
    }

    /// Rewrite the journal as a snapshot once enough appends pile up.
    /// Failure leaves the long journal in place, which is still correct.
    fn maybe_compact(&mut self) {
        let Some(journal) = self.journal.as_mut() else { return };
        if self.compact_threshold == 0 || journal.appends_since_compact() < self.compact_threshold {
            return;
        }
        let records = match self.store.all() {
            Ok(records) => records,
            Err(e) => {
                warn!("compaction skipped, store unreadable: {e}");
                return;
            }
        };
        let mut snapshot: Vec<Event> = records
            .into_iter()
            .map(|record| Event::RecordInserted { record })
            .collect();
        snapshot.push(Event::AvailabilitySnapshot {
            counters: self.availability.snapshot(),
        });
        match journal.compact(&snapshot) {
            Ok(()) => {
                metrics::counter!(crate::observability::JOURNAL_COMPACTIONS_TOTAL).increment(1);
                info!(entries = snapshot.len(), "journal compacted");
            }
            Err(e) => warn!("journal compaction failed: {e}"),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn availability(&self) -> &AvailabilityTracker {
        &self.availability
    }
}
