use tracing::info;

use crate::dates::CalendarDate;
use crate::ledger::{DateRequest, Schedule};
use crate::model::*;

use super::{Engine, EngineError, RecordKey, RecordStore};

fn record_outcome(metric: &'static str, result: &Result<Schedule, EngineError>) {
    let outcome = crate::observability::outcome_label(result);
    metrics::counter!(metric, "outcome" => outcome).increment(1);
}

impl<S: RecordStore> Engine<S> {
    /// Reserve a space for `id`, overwriting whatever schedule it held.
    ///
    /// A single day is stored as the bare date; only "Other" holders may
    /// reserve a range; `always` cannot be reserved here.
    pub fn reserve(&mut self, id: EmployeeId, request: DateRequest) -> Result<Schedule, EngineError> {
        let result = self.try_reserve(id, request);
        record_outcome(crate::observability::RESERVATIONS_TOTAL, &result);
        result
    }

    fn try_reserve(&mut self, id: EmployeeId, request: DateRequest) -> Result<Schedule, EngineError> {
        if self.availability.free_spaces() == 0 {
            return Err(EngineError::NoCapacity);
        }
        let record = self.record(id)?;
        let status = record.status;

        let schedule = match request {
            DateRequest::Always => {
                return Err(EngineError::InvalidRequest(
                    "a permanent space cannot be reserved, only specific dates".into(),
                ));
            }
            DateRequest::Day(day) => Schedule::Day(day),
            DateRequest::Range(start, end) => {
                if !status.is_discretionary() {
                    return Err(EngineError::NotEligible(status));
                }
                if end < start {
                    return Err(EngineError::InvalidRequest(format!("range ends ({end}) before it starts ({start})")));
                }
                Schedule::range(start, end)
            }
        };

        if !self.availability.can_take(status) {
            return Err(EngineError::NoCapacity);
        }

        self.persist_and_apply(Event::ScheduleCommitted {
            id,
            reserved_dates: schedule.to_string(),
            status,
            quota: QuotaMove::Take,
        })?;
        info!(employee = id, %status, schedule = %schedule, "space reserved");
        Ok(schedule)
    }

    /// Open up `id`'s space for `request`, as of today.
    pub fn opt_out(&mut self, id: EmployeeId, request: DateRequest) -> Result<Schedule, EngineError> {
        self.opt_out_on(id, request, CalendarDate::today())
    }

    /// Open up `id`'s space for `request`, taking `today` as the first day of
    /// the rewritten schedule. See [`Schedule::split_out`].
    pub fn opt_out_on(
        &mut self,
        id: EmployeeId,
        request: DateRequest,
        today: CalendarDate,
    ) -> Result<Schedule, EngineError> {
        let result = self.try_opt_out(id, request, today);
        record_outcome(crate::observability::OPT_OUTS_TOTAL, &result);
        result
    }

    fn try_opt_out(&mut self, id: EmployeeId, request: DateRequest, today: CalendarDate) -> Result<Schedule, EngineError> {
        let record = self.record(id)?;
        let status = record.status;
        let current = self.schedule_of(id)?;
        if current.is_none() {
            return Err(EngineError::InvalidRequest("no dates are reserved".into()));
        }

        let schedule = current
            .split_out(request, status, today)
            .map_err(|e| EngineError::InvalidRequest(e.to_string()))?;

        self.persist_and_apply(Event::ScheduleCommitted {
            id,
            reserved_dates: schedule.to_string(),
            status,
            quota: QuotaMove::Release,
        })?;
        info!(employee = id, %status, %request, schedule = %schedule, "space opened up");
        Ok(schedule)
    }

    // ── Provisioning ─────────────────────────────────────────

    pub fn insert_record(&mut self, record: EmployeeRecord) -> Result<(), EngineError> {
        if self.store.get(record.employee_id)?.is_some() {
            return Err(super::StoreError::DuplicateKey(record.employee_id).into());
        }
        if let Err(e) = record.reserved_dates.parse::<Schedule>() {
            return Err(EngineError::InvalidRequest(format!("reserved dates: {e}")));
        }
        let id = record.employee_id;
        self.persist_and_apply(Event::RecordInserted { record })?;
        info!(employee = id, "record inserted");
        Ok(())
    }

    pub fn delete_record(&mut self, id: EmployeeId) -> Result<(), EngineError> {
        if self.store.get(id)?.is_none() {
            return Err(EngineError::RecordNotFound(RecordKey::Employee(id)));
        }
        self.persist_and_apply(Event::RecordDeleted { id })?;
        info!(employee = id, "record deleted");
        Ok(())
    }

    /// Change record fields other than the key and the reserved dates,
    /// which move only through [`reserve`](Self::reserve) and
    /// [`opt_out`](Self::opt_out).
    pub fn update_record(&mut self, id: EmployeeId, changes: Vec<FieldChange>) -> Result<(), EngineError> {
        if changes.iter().any(|c| c.field == Field::ReservedDates) {
            return Err(EngineError::InvalidRequest(
                "reserved dates change only by reserving or opting out".into(),
            ));
        }
        if changes.iter().any(|c| c.field == Field::EmployeeId) {
            return Err(super::StoreError::KeyImmutable.into());
        }
        let Some(record) = self.store.get(id)? else {
            return Err(EngineError::RecordNotFound(RecordKey::Employee(id)));
        };
        // A held space belongs to the old status's quota; release it first.
        let status_moves = changes.iter().any(|c| {
            c.field == Field::Status
                && matches!(&c.value, FieldValue::Text(text) if text.parse::<Status>().ok() != Some(record.status))
        });
        if status_moves && !self.schedule_of(id)?.is_none() {
            return Err(EngineError::InvalidRequest(
                "status cannot change while a space is reserved; open it up first".into(),
            ));
        }
        // Dry-run against a scratch copy so a bad change never reaches the journal.
        let mut scratch = super::InMemoryStore::new();
        scratch.insert(record)?;
        scratch.update(id, &changes)?;

        self.persist_and_apply(Event::RecordUpdated { id, changes })
    }
}
