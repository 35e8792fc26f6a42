use crate::model::{EmployeeId, Status};

use super::store::StoreError;

/// How a caller identified the record it wanted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordKey {
    Employee(EmployeeId),
    Registration(String),
}

impl std::fmt::Display for RecordKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordKey::Employee(id) => write!(f, "employee {id}"),
            RecordKey::Registration(reg) => write!(f, "registration {reg}"),
        }
    }
}

#[derive(Debug)]
pub enum EngineError {
    NoCapacity,
    InvalidRequest(String),
    NotEligible(Status),
    RecordNotFound(RecordKey),
    DataCorruption { id: EmployeeId, reason: String },
    Store(StoreError),
    JournalError(String),
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::NoCapacity => write!(f, "no free spaces left"),
            EngineError::InvalidRequest(msg) => write!(f, "invalid request: {msg}"),
            EngineError::NotEligible(status) => {
                write!(f, "status {status} holds a permanent space and cannot reserve date ranges")
            }
            EngineError::RecordNotFound(key) => write!(f, "no record for {key}"),
            EngineError::DataCorruption { id, reason } => {
                write!(f, "reserved dates of employee {id} are corrupt: {reason}")
            }
            EngineError::Store(e) => write!(f, "record store: {e}"),
            EngineError::JournalError(e) => write!(f, "journal error: {e}"),
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EngineError::Store(e) => Some(e),
            _ => None,
        }
    }
}

impl From<StoreError> for EngineError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(id) => EngineError::RecordNotFound(RecordKey::Employee(id)),
            other => EngineError::Store(other),
        }
    }
}
