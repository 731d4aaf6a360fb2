//! Error taxonomy for the parking core.
//!
//! Every variant except `Storage` is a caller-visible, non-retryable business
//! outcome. `Storage` wraps failures from the repository collaborator and is
//! propagated unchanged.

/// Broad classification used by transports to pick a response status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    BusinessRule,
    NotFound,
    Infrastructure,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::BusinessRule => "business_rule",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Infrastructure => "infrastructure",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ParkingError {
    #[error("{0}")]
    Validation(String),
    #[error("Invalid or unknown token")]
    InvalidToken,
    #[error("Attendant {0} not found")]
    AttendantNotFound(String),
    #[error("Attendant is not active")]
    AttendantInactive,
    #[error("Area {0} not found")]
    AreaNotFound(String),
    #[error("Location is {distance_meters:.1} m from the parking area (limit {max_meters:.0} m)")]
    OutOfRange { distance_meters: f64, max_meters: f64 },
    #[error("Parking session not found")]
    SessionNotFound,
    #[error("Parking session is already completed")]
    SessionAlreadyCompleted,
    #[error("Parking session is not active")]
    SessionNotActive,
    #[error("Vehicle already has an active parking session")]
    ActiveSessionExists,
    #[error("Session belongs to a different area than the attendant")]
    CrossAreaMismatch,
    #[error("Session was checked in by a different attendant")]
    AttendantMismatch,
    #[error("Session was not created manually")]
    NotManualRecord,
    #[error("Attendant still has active parking sessions")]
    AttendantHasActiveSessions,
    #[error("Storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

impl ParkingError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ParkingError::Validation(_) => ErrorKind::Validation,
            ParkingError::InvalidToken
            | ParkingError::AttendantNotFound(_)
            | ParkingError::AreaNotFound(_)
            | ParkingError::SessionNotFound => ErrorKind::NotFound,
            ParkingError::AttendantInactive
            | ParkingError::OutOfRange { .. }
            | ParkingError::SessionAlreadyCompleted
            | ParkingError::SessionNotActive
            | ParkingError::ActiveSessionExists
            | ParkingError::CrossAreaMismatch
            | ParkingError::AttendantMismatch
            | ParkingError::NotManualRecord
            | ParkingError::AttendantHasActiveSessions => ErrorKind::BusinessRule,
            ParkingError::Storage(_) => ErrorKind::Infrastructure,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ParkingError::Validation(message.into())
    }
}

pub type ParkingResult<T> = Result<T, ParkingError>;
