mod assignment;
mod availability;
mod oncall;
mod types;
mod util;

pub use availability::MAX_AVAILABILITY_DAYS;
pub use types::{
    AssignOptions, AssignmentReceipt, DayAvailability, ErrorClass, RoleAvailability, SchedError,
    SlotAvailability,
};

use crate::clock::{Clock, SystemClock};
use crate::model::{Assignment, Employee, EmployeeId};
use crate::storage::{EmployeeDirectory, ShiftStore};
use chrono::{DateTime, Duration, NaiveDate, Utc};

/// Stockage complet attendu par le scheduler : créneaux + annuaire.
pub trait RosterStore: ShiftStore + EmployeeDirectory {}

impl<T: ShiftStore + EmployeeDirectory> RosterStore for T {}

/// Scheduler : applique les règles d'assignation au-dessus d'un stockage.
///
/// Sans état entre deux appels ; chaque opération est une unité de travail.
pub struct Scheduler<S, C = SystemClock> {
    store: S,
    clock: C,
    opts: AssignOptions,
}

impl<S: RosterStore> Scheduler<S> {
    pub fn new(store: S, opts: AssignOptions) -> Self {
        Self::with_clock(store, SystemClock, opts)
    }
}

impl<S: RosterStore, C: Clock> Scheduler<S, C> {
    pub fn with_clock(store: S, clock: C, opts: AssignOptions) -> Self {
        Self { store, clock, opts }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn options(&self) -> &AssignOptions {
        &self.opts
    }

    /// Assigne un employé à (date `YYYY-MM-DD`, créneau 1..=3).
    pub fn assign_shift(
        &self,
        employee: EmployeeId,
        date: &str,
        slot: u8,
    ) -> Result<AssignmentReceipt, SchedError> {
        assignment::assign_shift(self, employee, date, slot)
    }

    /// Annule une réservation ; `NotFound` si elle n'existe pas.
    pub fn remove_shift(&self, employee: EmployeeId, date: &str, slot: u8) -> Result<(), SchedError> {
        assignment::remove_shift(self, employee, date, slot)
    }

    pub fn list_shifts(
        &self,
        employee: EmployeeId,
        range: Option<(NaiveDate, NaiveDate)>,
    ) -> Result<Vec<Assignment>, SchedError> {
        assignment::list_shifts(self, employee, range)
    }

    /// Grille de places restantes sur `days` jours à partir de `start`.
    pub fn availability(&self, start: &str, days: u32) -> Result<Vec<DayAvailability>, SchedError> {
        availability::availability(self, start, days)
    }

    pub fn on_call(&self, at: DateTime<Utc>, buffer: Duration) -> Result<Vec<Employee>, SchedError> {
        oncall::on_call(self, at, buffer)
    }

    pub fn on_call_now(&self, buffer: Duration) -> Result<Vec<Employee>, SchedError> {
        oncall::on_call(self, self.clock.now(), buffer)
    }
}
