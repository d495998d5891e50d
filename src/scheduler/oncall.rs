use super::{util, RosterStore, SchedError, Scheduler};
use crate::clock::Clock;
use crate::model::Employee;
use chrono::{DateTime, Duration, Utc};
use tracing::debug;

/// Qui est d'astreinte à `at`, hors personnes dont le créneau finit dans moins de `buffer`.
pub(super) fn on_call<S: RosterStore, C: Clock>(
    scheduler: &Scheduler<S, C>,
    at: DateTime<Utc>,
    buffer: Duration,
) -> Result<Vec<Employee>, SchedError> {
    let buffer = buffer.max(Duration::zero());
    let on_duty = scheduler
        .store
        .resolve_on_duty(at, buffer)
        .map_err(|e| util::storage_failure("resolve_on_duty", e))?;
    debug!(at = %at.to_rfc3339(), buffer_min = buffer.num_minutes(), count = on_duty.len(), "on-call resolved");
    Ok(on_duty)
}
