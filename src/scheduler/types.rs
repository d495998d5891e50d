use crate::config::RosterConfig;
use crate::model::{AssignmentId, EmployeeId, Role, SlotNumber};
use crate::rules::CapacityTable;
use crate::storage::StoreError;
use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

/// Options d'assignation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssignOptions {
    pub capacity: CapacityTable,
    pub max_consecutive_days: u32,
    pub booking_horizon_months: u32,
}

impl Default for AssignOptions {
    fn default() -> Self {
        Self::from(&RosterConfig::default())
    }
}

impl From<&RosterConfig> for AssignOptions {
    fn from(config: &RosterConfig) -> Self {
        Self {
            capacity: config.capacity,
            max_consecutive_days: config.max_consecutive_days,
            booking_horizon_months: config.booking_horizon_months,
        }
    }
}

/// Famille d'erreur, pour le mapping côté appelant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    Input,
    Rejection,
    Storage,
}

#[derive(Error, Debug)]
pub enum SchedError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("date {date} is in the past (today is {today})")]
    PastDate { date: NaiveDate, today: NaiveDate },
    #[error("date {date} is beyond the booking horizon (last bookable day {limit})")]
    TooFarAhead { date: NaiveDate, limit: NaiveDate },
    #[error("assignment would create {run} consecutive duty days (max {max})")]
    ConsecutiveLimitExceeded { run: u32, max: u32 },
    #[error("employee {employee} already holds slot {slot} on {date}")]
    AlreadyAssigned {
        employee: EmployeeId,
        date: NaiveDate,
        slot: SlotNumber,
    },
    #[error("{role} capacity reached on {date} slot {slot} (max {capacity})")]
    CapacityReached {
        role: Role,
        date: NaiveDate,
        slot: SlotNumber,
        capacity: u32,
    },
    #[error("storage failure")]
    Storage(#[source] StoreError),
}

impl SchedError {
    pub fn class(&self) -> ErrorClass {
        match self {
            SchedError::NotFound(_) | SchedError::InvalidInput(_) => ErrorClass::Input,
            SchedError::Storage(_) => ErrorClass::Storage,
            _ => ErrorClass::Rejection,
        }
    }
}

/// Accusé d'une assignation réussie (date et créneau normalisés).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssignmentReceipt {
    pub id: AssignmentId,
    pub employee: EmployeeId,
    pub date: NaiveDate,
    pub slot: SlotNumber,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleAvailability {
    pub role: Role,
    pub capacity: u32,
    pub assigned: u32,
    pub remaining: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotAvailability {
    pub slot: SlotNumber,
    pub roles: Vec<RoleAvailability>,
}

/// Une journée de la grille de disponibilité, créneaux dans l'ordre 1..=3.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayAvailability {
    pub date: NaiveDate,
    pub slots: Vec<SlotAvailability>,
}
