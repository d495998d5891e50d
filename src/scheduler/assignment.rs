use super::{types::AssignmentReceipt, util, ErrorClass, RosterStore, SchedError, Scheduler};
use crate::clock::Clock;
use crate::model::{Assignment, Employee, EmployeeId};
use crate::rules::ConsecutiveDutyRule;
use crate::storage::{CommitOutcome, StoreError};
use chrono::{Duration, NaiveDate};
use std::collections::BTreeSet;
use tracing::{debug, info, info_span, warn};

pub(super) fn assign_shift<S: RosterStore, C: Clock>(
    scheduler: &Scheduler<S, C>,
    employee: EmployeeId,
    raw_date: &str,
    slot: u8,
) -> Result<AssignmentReceipt, SchedError> {
    let _span = info_span!("assign_shift", %employee, date = raw_date, slot).entered();

    let result = try_assign(scheduler, employee, raw_date, slot);
    if let Err(err) = &result {
        match err.class() {
            ErrorClass::Rejection => warn!(error = %err, "assignment rejected"),
            ErrorClass::Input => debug!(error = %err, "assignment input refused"),
            ErrorClass::Storage => {}
        }
    }
    result
}

fn try_assign<S: RosterStore, C: Clock>(
    scheduler: &Scheduler<S, C>,
    employee_id: EmployeeId,
    raw_date: &str,
    slot: u8,
) -> Result<AssignmentReceipt, SchedError> {
    let store = &scheduler.store;
    let opts = &scheduler.opts;

    let employee = lookup_employee(store, employee_id)?;
    let date = util::parse_date(raw_date)?;
    let number = util::parse_slot(slot)?;

    util::check_window(date, scheduler.clock.today(), opts.booking_horizon_months)?;
    debug!("booking window ok");

    let rule = ConsecutiveDutyRule::new(opts.max_consecutive_days);
    let on_duty = on_duty_dates_around(store, employee.id, date, rule.lookaround_days())?;
    if let Err(run) = rule.check(&on_duty, date) {
        return Err(SchedError::ConsecutiveLimitExceeded {
            run,
            max: rule.max_days,
        });
    }
    debug!("consecutive duty rule ok");

    let capacity = opts.capacity.capacity(employee.role);
    let outcome = store
        .commit_assignment(employee.id, date, number, employee.role, capacity)
        .map_err(|e| util::storage_failure("commit_assignment", e))?;

    match outcome {
        CommitOutcome::Committed(assignment) => {
            info!(assignment = assignment.id.get(), role = %employee.role, "shift assigned");
            Ok(AssignmentReceipt {
                id: assignment.id,
                employee: employee.id,
                date,
                slot: number,
            })
        }
        CommitOutcome::AlreadyAssigned(_) => Err(SchedError::AlreadyAssigned {
            employee: employee.id,
            date,
            slot: number,
        }),
        CommitOutcome::CapacityReached { occupied, .. } => {
            debug!(occupied, capacity, "slot full for role");
            Err(SchedError::CapacityReached {
                role: employee.role,
                date,
                slot: number,
                capacity,
            })
        }
    }
}

pub(super) fn remove_shift<S: RosterStore, C: Clock>(
    scheduler: &Scheduler<S, C>,
    employee: EmployeeId,
    raw_date: &str,
    slot: u8,
) -> Result<(), SchedError> {
    let _span = info_span!("remove_shift", %employee, date = raw_date, slot).entered();

    let date = util::parse_date(raw_date)?;
    let number = util::parse_slot(slot)?;

    match scheduler.store.remove_assignment(employee, date, number) {
        Ok(()) => {
            info!("shift removed");
            Ok(())
        }
        Err(StoreError::NotFound { .. }) => Err(SchedError::NotFound(format!(
            "no assignment for employee {employee} on {date} slot {number}"
        ))),
        Err(e) => Err(util::storage_failure("remove_assignment", e)),
    }
}

pub(super) fn list_shifts<S: RosterStore, C: Clock>(
    scheduler: &Scheduler<S, C>,
    employee: EmployeeId,
    range: Option<(NaiveDate, NaiveDate)>,
) -> Result<Vec<Assignment>, SchedError> {
    if let Some((from, to)) = range {
        if to < from {
            return Err(SchedError::InvalidInput(format!(
                "range end {to} is before start {from}"
            )));
        }
    }
    let employee = lookup_employee(&scheduler.store, employee)?;
    scheduler
        .store
        .list_assignments(employee.id, range)
        .map_err(|e| util::storage_failure("list_assignments", e))
}

fn lookup_employee<S: RosterStore>(store: &S, id: EmployeeId) -> Result<Employee, SchedError> {
    store
        .find_employee(id)
        .map_err(|e| util::storage_failure("find_employee", e))?
        .ok_or_else(|| SchedError::NotFound(format!("unknown employee {id}")))
}

/// Dates d'astreinte existantes dans [date - radius, date + radius].
fn on_duty_dates_around<S: RosterStore>(
    store: &S,
    employee: EmployeeId,
    date: NaiveDate,
    radius_days: i64,
) -> Result<BTreeSet<NaiveDate>, SchedError> {
    let radius = Duration::days(radius_days);
    let from = date.checked_sub_signed(radius).unwrap_or(NaiveDate::MIN);
    let to = date.checked_add_signed(radius).unwrap_or(NaiveDate::MAX);
    let assignments = store
        .list_assignments(employee, Some((from, to)))
        .map_err(|e| util::storage_failure("list_assignments", e))?;
    Ok(assignments.into_iter().map(|a| a.date).collect())
}
