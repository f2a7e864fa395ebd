//! The acting party of a request, passed explicitly into every guarded
//! operation.
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Principal {
    Doctor { doctor_id: i64 },
    Patient { patient_id: i64 },
    /// Clinic staff with administrative rights
    Staff,
}

impl Principal {
    pub fn is_staff(&self) -> bool {
        matches!(self, Principal::Staff)
    }

    /// True for staff or for the given doctor
    pub fn acts_for_doctor(&self, doctor_id: i64) -> bool {
        match self {
            Principal::Staff => true,
            Principal::Doctor { doctor_id: id } => *id == doctor_id,
            Principal::Patient { .. } => false,
        }
    }

    /// True for staff or for the given patient
    pub fn acts_for_patient(&self, patient_id: i64) -> bool {
        match self {
            Principal::Staff => true,
            Principal::Patient { patient_id: id } => *id == patient_id,
            Principal::Doctor { .. } => false,
        }
    }

    /// Builds a principal from a role name and an optional identifier.
    /// Staff carries no identifier; doctors and patients require one.
    pub fn from_parts(role: &str, id: Option<&str>) -> Result<Self, PrincipalParseError> {
        let role = ActorRole::from_str(role)?;
        let parse_id = |raw: Option<&str>| -> Result<i64, PrincipalParseError> {
            let raw = raw.ok_or(PrincipalParseError::MissingId)?;
            raw.trim()
                .parse::<i64>()
                .map_err(|_| PrincipalParseError::InvalidId(raw.to_string()))
        };

        Ok(match role {
            ActorRole::Staff => Principal::Staff,
            ActorRole::Doctor => Principal::Doctor { doctor_id: parse_id(id)? },
            ActorRole::Patient => Principal::Patient { patient_id: parse_id(id)? },
        })
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Principal::Doctor { doctor_id } => write!(f, "doctor:{}", doctor_id),
            Principal::Patient { patient_id } => write!(f, "patient:{}", patient_id),
            Principal::Staff => write!(f, "staff"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ActorRole {
    Doctor,
    Patient,
    Staff,
}

impl FromStr for ActorRole {
    type Err = PrincipalParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "doctor" => Ok(ActorRole::Doctor),
            "patient" => Ok(ActorRole::Patient),
            "staff" => Ok(ActorRole::Staff),
            other => Err(PrincipalParseError::UnknownRole(other.to_string())),
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum PrincipalParseError {
    #[error("Unknown actor role: {0}")]
    UnknownRole(String),
    #[error("Actor id is required for this role")]
    MissingId,
    #[error("Invalid actor id: {0}")]
    InvalidId(String),
}
