use crate::dates::CalendarDate;
use crate::ledger::{has_active_reservation, Schedule};
use crate::model::*;

use super::{Engine, EngineError, RecordKey, RecordStore};

/// Gate-check answer for one record holding the registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateVerdict {
    pub employee_id: EmployeeId,
    pub reserved: bool,
}

impl<S: RecordStore> Engine<S> {
    pub fn record(&self, id: EmployeeId) -> Result<EmployeeRecord, EngineError> {
        self.store
            .get(id)?
            .ok_or(EngineError::RecordNotFound(RecordKey::Employee(id)))
    }

    pub fn status_of(&self, id: EmployeeId) -> Result<Status, EngineError> {
        Ok(self.record(id)?.status)
    }

    /// Decoded schedule of `id`. Undecodable text is reported, never guessed at.
    pub fn schedule_of(&self, id: EmployeeId) -> Result<Schedule, EngineError> {
        let record = self.record(id)?;
        decode_schedule(&record)
    }

    pub fn free_spaces(&self) -> u32 {
        self.availability.free_spaces()
    }

    pub fn query(&self, predicates: &[Predicate]) -> Result<Vec<EmployeeRecord>, EngineError> {
        Ok(self.store.query(predicates)?)
    }

    /// Does each record registered to `registration` hold a space on `on`?
    pub fn gate_check(&self, registration: &str, on: CalendarDate) -> Result<Vec<GateVerdict>, EngineError> {
        let records = self
            .store
            .query(&[Predicate::equals(Field::RegistrationNo, registration)])?;
        if records.is_empty() {
            metrics::counter!(crate::observability::GATE_CHECKS_TOTAL, "verdict" => "unknown").increment(1);
            return Err(EngineError::RecordNotFound(RecordKey::Registration(registration.to_string())));
        }

        let mut verdicts = Vec::with_capacity(records.len());
        for record in &records {
            let schedule = decode_schedule(record)?;
            let reserved = has_active_reservation(&schedule, on);
            let verdict = if reserved { "reserved" } else { "not_reserved" };
            metrics::counter!(crate::observability::GATE_CHECKS_TOTAL, "verdict" => verdict).increment(1);
            verdicts.push(GateVerdict {
                employee_id: record.employee_id,
                reserved,
            });
        }
        Ok(verdicts)
    }
}

fn decode_schedule(record: &EmployeeRecord) -> Result<Schedule, EngineError> {
    record
        .reserved_dates
        .parse()
        .map_err(|e: crate::ledger::ScheduleParseError| EngineError::DataCorruption {
            id: record.employee_id,
            reason: e.to_string(),
        })
}
