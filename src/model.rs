use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Employee identifier, the record key.
pub type EmployeeId = i64;

/// Status category deciding eligibility and which quota a space is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Status {
    Disabled,
    EdMd,
    CriticalWorker,
    Other,
}

impl Status {
    pub const ALL: [Status; 4] = [Status::Disabled, Status::EdMd, Status::CriticalWorker, Status::Other];

    /// The text stored in the `Status` column.
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Disabled => "Disabled",
            Status::EdMd => "ED / MD",
            Status::CriticalWorker => "Critical Worker / Tenure",
            Status::Other => "Other",
        }
    }

    /// Only "Other" holders book explicit ranges; everyone else is treated
    /// as permanently reserved.
    pub fn is_discretionary(self) -> bool {
        self == Status::Other
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let compact: String = s.chars().filter(|c| !c.is_whitespace()).collect::<String>().to_lowercase();
        match compact.as_str() {
            "disabled" => Ok(Status::Disabled),
            "ed/md" => Ok(Status::EdMd),
            "criticalworker/tenure" => Ok(Status::CriticalWorker),
            "other" => Ok(Status::Other),
            _ => Err(format!("unknown status: {s:?}")),
        }
    }
}

/// One row of the `RegisteredEmployees` table. `reserved_dates` holds the
/// encoded schedule text exactly as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeRecord {
    pub employee_id: EmployeeId,
    pub registration_no: String,
    pub status: Status,
    pub eco_car: bool,
    pub distance_km: i64,
    pub reserved_dates: String,
}

/// Columns of the employee table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Field {
    EmployeeId,
    RegistrationNo,
    Status,
    EcoCar,
    Distance,
    ReservedDates,
}

/// Column types, used to type-check bound values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Integer,
    Text,
    Boolean,
}

impl Field {
    pub const ALL: [Field; 6] = [
        Field::EmployeeId,
        Field::RegistrationNo,
        Field::Status,
        Field::EcoCar,
        Field::Distance,
        Field::ReservedDates,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Field::EmployeeId => "EmployeeID",
            Field::RegistrationNo => "RegistrationNo",
            Field::Status => "Status",
            Field::EcoCar => "EcoCar",
            Field::Distance => "Distance",
            Field::ReservedDates => "ReservedDates",
        }
    }

    pub fn field_type(self) -> FieldType {
        match self {
            Field::EmployeeId | Field::Distance => FieldType::Integer,
            Field::RegistrationNo | Field::Status | Field::ReservedDates => FieldType::Text,
            Field::EcoCar => FieldType::Boolean,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A typed value bound to a field.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FieldValue {
    Integer(i64),
    Text(String),
    Boolean(bool),
}

impl FieldValue {
    pub fn field_type(&self) -> FieldType {
        match self {
            FieldValue::Integer(_) => FieldType::Integer,
            FieldValue::Text(_) => FieldType::Text,
            FieldValue::Boolean(_) => FieldType::Boolean,
        }
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Integer(v)
    }
}

impl From<i32> for FieldValue {
    fn from(v: i32) -> Self {
        FieldValue::Integer(i64::from(v))
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Text(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Text(v)
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Boolean(v)
    }
}

impl From<Status> for FieldValue {
    fn from(v: Status) -> Self {
        FieldValue::Text(v.as_str().to_string())
    }
}

impl EmployeeRecord {
    /// A newly registered employee. Non-discretionary statuses hold a
    /// permanent space from the start; "Other" holders start with nothing.
    pub fn register(
        employee_id: EmployeeId,
        registration_no: impl Into<String>,
        status: Status,
        eco_car: bool,
        distance_km: i64,
    ) -> Self {
        let schedule = if status.is_discretionary() {
            crate::ledger::Schedule::None
        } else {
            crate::ledger::Schedule::Always
        };
        Self {
            employee_id,
            registration_no: registration_no.into(),
            status,
            eco_car,
            distance_km,
            reserved_dates: schedule.to_string(),
        }
    }

    pub fn value(&self, field: Field) -> FieldValue {
        match field {
            Field::EmployeeId => FieldValue::Integer(self.employee_id),
            Field::RegistrationNo => FieldValue::Text(self.registration_no.clone()),
            Field::Status => self.status.into(),
            Field::EcoCar => FieldValue::Boolean(self.eco_car),
            Field::Distance => FieldValue::Integer(self.distance_km),
            Field::ReservedDates => FieldValue::Text(self.reserved_dates.clone()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompareOp {
    pub fn symbol(self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "<>",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
        }
    }

    pub fn holds(self, ordering: std::cmp::Ordering) -> bool {
        use std::cmp::Ordering::*;
        match self {
            CompareOp::Eq => ordering == Equal,
            CompareOp::Ne => ordering != Equal,
            CompareOp::Lt => ordering == Less,
            CompareOp::Le => ordering != Greater,
            CompareOp::Gt => ordering == Greater,
            CompareOp::Ge => ordering != Less,
        }
    }
}

/// `field op value`, with the value bound rather than spliced into text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Predicate {
    pub field: Field,
    pub op: CompareOp,
    pub value: FieldValue,
}

impl Predicate {
    pub fn new(field: Field, op: CompareOp, value: impl Into<FieldValue>) -> Self {
        Self { field, op, value: value.into() }
    }

    pub fn equals(field: Field, value: impl Into<FieldValue>) -> Self {
        Self::new(field, CompareOp::Eq, value)
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ?", self.field, self.op.symbol())
    }
}

/// `field = value` in an update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldChange {
    pub field: Field,
    pub value: FieldValue,
}

impl FieldChange {
    pub fn new(field: Field, value: impl Into<FieldValue>) -> Self {
        Self { field, value: value.into() }
    }
}

/// Direction of a quota move that accompanies a schedule write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuotaMove {
    Take,
    Release,
}

/// The event types. This is the journal record format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    RecordInserted {
        record: EmployeeRecord,
    },
    RecordDeleted {
        id: EmployeeId,
    },
    RecordUpdated {
        id: EmployeeId,
        changes: Vec<FieldChange>,
    },
    /// A schedule overwrite and its counter move, applied together.
    ScheduleCommitted {
        id: EmployeeId,
        reserved_dates: String,
        status: Status,
        quota: QuotaMove,
    },
    /// Absolute counter values, written by compaction.
    AvailabilitySnapshot {
        counters: Vec<(Status, u32)>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_stored_text() {
        for status in Status::ALL {
            assert_eq!(status.as_str().parse::<Status>().unwrap(), status);
        }
    }

    #[test]
    fn status_parse_is_lenient_about_spacing_and_case() {
        assert_eq!("ED/MD".parse::<Status>().unwrap(), Status::EdMd);
        assert_eq!("critical worker/tenure".parse::<Status>().unwrap(), Status::CriticalWorker);
        assert_eq!(" other ".parse::<Status>().unwrap(), Status::Other);
        assert!("Visitor".parse::<Status>().is_err());
    }

    #[test]
    fn only_other_is_discretionary() {
        assert!(Status::Other.is_discretionary());
        assert!(!Status::Disabled.is_discretionary());
        assert!(!Status::EdMd.is_discretionary());
        assert!(!Status::CriticalWorker.is_discretionary());
    }

    #[test]
    fn registration_seeds_schedule_from_status() {
        assert_eq!(EmployeeRecord::register(1, "A1", Status::Other, false, 3).reserved_dates, "None");
        for status in [Status::Disabled, Status::EdMd, Status::CriticalWorker] {
            assert_eq!(EmployeeRecord::register(2, "B2", status, true, 0).reserved_dates, "Always");
        }
    }

    #[test]
    fn field_types_match_table() {
        assert_eq!(Field::EmployeeId.field_type(), FieldType::Integer);
        assert_eq!(Field::Distance.field_type(), FieldType::Integer);
        assert_eq!(Field::EcoCar.field_type(), FieldType::Boolean);
        assert_eq!(Field::ReservedDates.field_type(), FieldType::Text);
        assert_eq!(Field::Status.field_type(), FieldType::Text);
    }

    #[test]
    fn compare_op_semantics() {
        use std::cmp::Ordering::*;
        assert!(CompareOp::Ne.holds(Less));
        assert!(!CompareOp::Ne.holds(Equal));
        assert!(CompareOp::Le.holds(Equal));
        assert!(!CompareOp::Gt.holds(Equal));
        assert!(CompareOp::Ge.holds(Greater));
    }

    #[test]
    fn predicate_display_never_contains_value() {
        let p = Predicate::equals(Field::RegistrationNo, "AB12 'CDE");
        assert_eq!(p.to_string(), "RegistrationNo = ?");
    }

    #[test]
    fn event_serialization_roundtrip() {
        let event = Event::ScheduleCommitted {
            id: 4,
            reserved_dates: "10-01-2024--20-01-2024".into(),
            status: Status::Other,
            quota: QuotaMove::Take,
        };
        let bytes = bincode::serialize(&event).unwrap();
        let decoded: Event = bincode::deserialize(&bytes).unwrap();
        assert_eq!(event, decoded);
    }
}
