//! Persistance des créneaux et des assignations.
//!
//! Seul ce module parle à la base ; le scheduler passe toujours par les traits.

mod sqlite;

pub use sqlite::SqliteStore;

use crate::model::{
    Assignment, AssignmentId, Employee, EmployeeId, Role, ShiftSlot, SlotId, SlotNumber,
};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use rusqlite::ErrorCode;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("storage timed out waiting for the database lock")]
    Timeout,
    #[error("no assignment for employee {employee} on {date} slot {slot}")]
    NotFound {
        employee: EmployeeId,
        date: NaiveDate,
        slot: SlotNumber,
    },
    #[error("invalid row: {0}")]
    InvalidRow(String),
    #[error("database error: {0}")]
    Database(rusqlite::Error),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match err.sqlite_error_code() {
            Some(ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked) => StoreError::Timeout,
            _ => StoreError::Database(err),
        }
    }
}

/// Résultat de la séquence atomique créneau → doublon → capacité → insertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    Committed(Assignment),
    AlreadyAssigned(ShiftSlot),
    CapacityReached { slot: ShiftSlot, occupied: u32 },
}

/// Comptage des assignations par (date, créneau, rôle).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlotCounts(BTreeMap<(NaiveDate, SlotNumber, Role), u32>);

impl SlotCounts {
    pub fn insert(&mut self, date: NaiveDate, slot: SlotNumber, role: Role, count: u32) {
        self.0.insert((date, slot, role), count);
    }

    /// Zéro quand aucune ligne n'existe pour ce triplet.
    pub fn get(&self, date: NaiveDate, slot: SlotNumber, role: Role) -> u32 {
        self.0.get(&(date, slot, role)).copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Annuaire du personnel (collaborateur externe : id → rôle).
pub trait EmployeeDirectory {
    fn find_employee(&self, id: EmployeeId) -> Result<Option<Employee>, StoreError>;
    fn register_employee(&self, name: &str, role: Role) -> Result<Employee, StoreError>;
    fn list_employees(&self) -> Result<Vec<Employee>, StoreError>;
}

pub trait ShiftStore {
    /// Upsert idempotent : renvoie le créneau existant ou le crée.
    fn get_or_create_slot(&self, date: NaiveDate, number: SlotNumber)
        -> Result<ShiftSlot, StoreError>;

    fn is_assigned(&self, employee: EmployeeId, slot: SlotId) -> Result<bool, StoreError>;

    fn count_by_role(&self, slot: SlotId, role: Role) -> Result<u32, StoreError>;

    fn create_assignment(
        &self,
        employee: EmployeeId,
        slot: SlotId,
        role: Role,
    ) -> Result<AssignmentId, StoreError>;

    /// Obtient le créneau, vérifie doublon et capacité puis insère, le tout
    /// sous un même verrou d'écriture. Aucune écriture si l'issue n'est pas
    /// `Committed`.
    fn commit_assignment(
        &self,
        employee: EmployeeId,
        date: NaiveDate,
        number: SlotNumber,
        role: Role,
        capacity: u32,
    ) -> Result<CommitOutcome, StoreError>;

    /// `StoreError::NotFound` si aucune assignation ne correspond.
    fn remove_assignment(
        &self,
        employee: EmployeeId,
        date: NaiveDate,
        number: SlotNumber,
    ) -> Result<(), StoreError>;

    /// Triées par date puis numéro de créneau ; bornes incluses.
    fn list_assignments(
        &self,
        employee: EmployeeId,
        range: Option<(NaiveDate, NaiveDate)>,
    ) -> Result<Vec<Assignment>, StoreError>;

    /// Une seule requête groupée sur [from, to].
    fn aggregate_counts(&self, from: NaiveDate, to: NaiveDate) -> Result<SlotCounts, StoreError>;

    /// Personnel du créneau actif à `instant`, vide si ce créneau se termine
    /// dans moins de `buffer`.
    fn resolve_on_duty(
        &self,
        instant: DateTime<Utc>,
        buffer: Duration,
    ) -> Result<Vec<Employee>, StoreError>;
}
