use std::collections::BTreeMap;

use crate::model::*;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    DuplicateKey(EmployeeId),
    NotFound(EmployeeId),
    TypeMismatch { field: Field, expected: FieldType },
    KeyImmutable,
    InvalidValue { field: Field, reason: String },
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::DuplicateKey(id) => write!(f, "EmployeeID {id} already exists"),
            StoreError::NotFound(id) => write!(f, "EmployeeID {id} not found"),
            StoreError::TypeMismatch { field, expected } => {
                write!(f, "field {field} takes {expected:?} values")
            }
            StoreError::KeyImmutable => write!(f, "EmployeeID cannot be changed"),
            StoreError::InvalidValue { field, reason } => write!(f, "bad value for {field}: {reason}"),
        }
    }
}

impl std::error::Error for StoreError {}

/// CRUD over employee records keyed by `EmployeeID`.
///
/// Predicates and changes carry typed values; implementations bind them and
/// never splice them into query text.
pub trait RecordStore {
    fn insert(&mut self, record: EmployeeRecord) -> Result<(), StoreError>;

    fn delete(&mut self, id: EmployeeId) -> Result<EmployeeRecord, StoreError>;

    /// Apply every change or none of them.
    fn update(&mut self, id: EmployeeId, changes: &[FieldChange]) -> Result<(), StoreError>;

    /// Records matching all predicates, in key order. No predicates matches everything.
    fn query(&self, predicates: &[Predicate]) -> Result<Vec<EmployeeRecord>, StoreError>;

    fn get(&self, id: EmployeeId) -> Result<Option<EmployeeRecord>, StoreError> {
        Ok(self.query(&[Predicate::equals(Field::EmployeeId, id)])?.into_iter().next())
    }

    fn all(&self) -> Result<Vec<EmployeeRecord>, StoreError> {
        self.query(&[])
    }
}

fn check_type(field: Field, value: &FieldValue) -> Result<(), StoreError> {
    let expected = field.field_type();
    if value.field_type() != expected {
        return Err(StoreError::TypeMismatch { field, expected });
    }
    Ok(())
}

fn check_change(change: &FieldChange) -> Result<(), StoreError> {
    check_type(change.field, &change.value)?;
    match (change.field, &change.value) {
        (Field::EmployeeId, _) => Err(StoreError::KeyImmutable),
        (Field::Status, FieldValue::Text(text)) => text
            .parse::<Status>()
            .map(|_| ())
            .map_err(|reason| StoreError::InvalidValue { field: Field::Status, reason }),
        _ => Ok(()),
    }
}

/// Write one already-checked change into a record.
fn apply_change(record: &mut EmployeeRecord, change: &FieldChange) {
    match (change.field, &change.value) {
        (Field::RegistrationNo, FieldValue::Text(v)) => record.registration_no = v.clone(),
        (Field::Status, FieldValue::Text(v)) => {
            if let Ok(status) = v.parse() {
                record.status = status;
            }
        }
        (Field::EcoCar, FieldValue::Boolean(v)) => record.eco_car = *v,
        (Field::Distance, FieldValue::Integer(v)) => record.distance_km = *v,
        (Field::ReservedDates, FieldValue::Text(v)) => record.reserved_dates = v.clone(),
        _ => {}
    }
}

fn matches(record: &EmployeeRecord, predicates: &[Predicate]) -> bool {
    predicates
        .iter()
        .all(|p| p.op.holds(record.value(p.field).cmp(&p.value)))
}

/// Table held in memory, ordered by key.
#[derive(Debug, Default, Clone)]
pub struct InMemoryStore {
    records: BTreeMap<EmployeeId, EmployeeRecord>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl RecordStore for InMemoryStore {
    fn insert(&mut self, record: EmployeeRecord) -> Result<(), StoreError> {
        if self.records.contains_key(&record.employee_id) {
            return Err(StoreError::DuplicateKey(record.employee_id));
        }
        self.records.insert(record.employee_id, record);
        Ok(())
    }

    fn delete(&mut self, id: EmployeeId) -> Result<EmployeeRecord, StoreError> {
        self.records.remove(&id).ok_or(StoreError::NotFound(id))
    }

    fn update(&mut self, id: EmployeeId, changes: &[FieldChange]) -> Result<(), StoreError> {
        for change in changes {
            check_change(change)?;
        }
        let record = self.records.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        for change in changes {
            apply_change(record, change);
        }
        Ok(())
    }

    fn query(&self, predicates: &[Predicate]) -> Result<Vec<EmployeeRecord>, StoreError> {
        for p in predicates {
            check_type(p.field, &p.value)?;
        }
        // Key equality is the hot path: skip the scan.
        if let [Predicate { field: Field::EmployeeId, op: CompareOp::Eq, value: FieldValue::Integer(id) }] =
            predicates
        {
            return Ok(self.records.get(id).cloned().into_iter().collect());
        }
        Ok(self
            .records
            .values()
            .filter(|r| matches(r, predicates))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: EmployeeId, reg: &str, status: Status, distance: i64) -> EmployeeRecord {
        EmployeeRecord {
            employee_id: id,
            registration_no: reg.into(),
            status,
            eco_car: id % 2 == 0,
            distance_km: distance,
            reserved_dates: "None".into(),
        }
    }

    fn populated() -> InMemoryStore {
        let mut store = InMemoryStore::new();
        store.insert(record(1, "AB12CDE", Status::Other, 12)).unwrap();
        store.insert(record(2, "XY99ZZZ", Status::Disabled, 40)).unwrap();
        store.insert(record(3, "LM55NOP", Status::Other, 25)).unwrap();
        store.insert(record(4, "AB12CDE", Status::EdMd, 3)).unwrap();
        store
    }

    fn ids(records: &[EmployeeRecord]) -> Vec<EmployeeId> {
        records.iter().map(|r| r.employee_id).collect()
    }

    #[test]
    fn insert_rejects_duplicate_key() {
        let mut store = populated();
        let err = store.insert(record(1, "NEW", Status::Other, 1)).unwrap_err();
        assert_eq!(err, StoreError::DuplicateKey(1));
        assert_eq!(store.len(), 4);
    }

    #[test]
    fn get_by_key() {
        let store = populated();
        assert_eq!(store.get(3).unwrap().unwrap().registration_no, "LM55NOP");
        assert!(store.get(99).unwrap().is_none());
    }

    #[test]
    fn query_conjunction_of_predicates() {
        let store = populated();
        let hits = store
            .query(&[
                Predicate::equals(Field::Status, Status::Other),
                Predicate::new(Field::Distance, CompareOp::Gt, 20),
            ])
            .unwrap();
        assert_eq!(ids(&hits), vec![3]);

        let not_other = store.query(&[Predicate::new(Field::Status, CompareOp::Ne, "Other")]).unwrap();
        assert_eq!(ids(&not_other), vec![2, 4]);
    }

    #[test]
    fn query_by_registration_returns_every_match() {
        let store = populated();
        let hits = store.query(&[Predicate::equals(Field::RegistrationNo, "AB12CDE")]).unwrap();
        assert_eq!(ids(&hits), vec![1, 4]);
    }

    #[test]
    fn query_values_are_bound_not_spliced() {
        let store = populated();
        let hits = store
            .query(&[Predicate::equals(Field::RegistrationNo, "x' OR '1'='1")])
            .unwrap();
        assert!(hits.is_empty());
    }

    #[test]
    fn query_rejects_type_mismatch() {
        let store = populated();
        let err = store.query(&[Predicate::equals(Field::Distance, "far")]).unwrap_err();
        assert_eq!(err, StoreError::TypeMismatch { field: Field::Distance, expected: FieldType::Integer });
    }

    #[test]
    fn empty_predicate_set_matches_all() {
        assert_eq!(ids(&populated().all().unwrap()), vec![1, 2, 3, 4]);
    }

    #[test]
    fn update_applies_all_changes() {
        let mut store = populated();
        store
            .update(
                1,
                &[
                    FieldChange::new(Field::ReservedDates, "12-01-2024"),
                    FieldChange::new(Field::Status, "ED/MD"),
                    FieldChange::new(Field::EcoCar, true),
                ],
            )
            .unwrap();
        let r = store.get(1).unwrap().unwrap();
        assert_eq!(r.reserved_dates, "12-01-2024");
        assert_eq!(r.status, Status::EdMd);
        assert!(r.eco_car);
    }

    #[test]
    fn update_is_all_or_nothing() {
        let mut store = populated();
        let err = store
            .update(
                1,
                &[
                    FieldChange::new(Field::ReservedDates, "12-01-2024"),
                    FieldChange::new(Field::Distance, "near"),
                ],
            )
            .unwrap_err();
        assert!(matches!(err, StoreError::TypeMismatch { .. }));
        assert_eq!(store.get(1).unwrap().unwrap().reserved_dates, "None");
    }

    #[test]
    fn update_rejects_key_change_and_unknown_status() {
        let mut store = populated();
        assert_eq!(
            store.update(1, &[FieldChange::new(Field::EmployeeId, 9)]).unwrap_err(),
            StoreError::KeyImmutable
        );
        assert!(matches!(
            store.update(1, &[FieldChange::new(Field::Status, "Visitor")]).unwrap_err(),
            StoreError::InvalidValue { field: Field::Status, .. }
        ));
        assert_eq!(
            store.update(77, &[FieldChange::new(Field::Distance, 1)]).unwrap_err(),
            StoreError::NotFound(77)
        );
    }

    #[test]
    fn delete_returns_record() {
        let mut store = populated();
        let removed = store.delete(2).unwrap();
        assert_eq!(removed.registration_no, "XY99ZZZ");
        assert_eq!(store.delete(2).unwrap_err(), StoreError::NotFound(2));
        assert_eq!(store.len(), 3);
    }
}
