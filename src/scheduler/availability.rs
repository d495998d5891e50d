use super::types::{DayAvailability, RoleAvailability, SlotAvailability};
use super::{util, RosterStore, SchedError, Scheduler};
use crate::clock::Clock;
use crate::model::SlotNumber;
use chrono::Days;
use tracing::debug;

/// Étendue maximale d'une requête de disponibilité, en jours.
pub const MAX_AVAILABILITY_DAYS: u32 = 90;

pub(super) fn availability<S: RosterStore, C: Clock>(
    scheduler: &Scheduler<S, C>,
    raw_start: &str,
    days: u32,
) -> Result<Vec<DayAvailability>, SchedError> {
    if !(1..=MAX_AVAILABILITY_DAYS).contains(&days) {
        return Err(SchedError::InvalidInput(format!(
            "day count must be between 1 and {MAX_AVAILABILITY_DAYS} (got {days})"
        )));
    }
    let start = util::parse_date(raw_start)?;
    let end = start
        .checked_add_days(Days::new(u64::from(days - 1)))
        .ok_or_else(|| SchedError::InvalidInput(format!("range from {start} overflows")))?;

    let counts = scheduler
        .store
        .aggregate_counts(start, end)
        .map_err(|e| util::storage_failure("aggregate_counts", e))?;
    debug!(%start, %end, "availability counts loaded");

    let table = scheduler.opts.capacity;
    let roles = table.assignable_roles();

    let grid = start
        .iter_days()
        .take(days as usize)
        .map(|date| DayAvailability {
            date,
            slots: SlotNumber::ALL
                .iter()
                .map(|&slot| SlotAvailability {
                    slot,
                    roles: roles
                        .iter()
                        .map(|&role| {
                            let assigned = counts.get(date, slot, role);
                            RoleAvailability {
                                role,
                                capacity: table.capacity(role),
                                assigned,
                                remaining: table.remaining(role, assigned),
                            }
                        })
                        .collect(),
                })
                .collect(),
        })
        .collect();

    Ok(grid)
}
