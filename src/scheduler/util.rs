use super::SchedError;
use crate::model::SlotNumber;
use crate::storage::StoreError;
use chrono::{Months, NaiveDate};
use tracing::error;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Format strict `YYYY-MM-DD`.
pub(super) fn parse_date(raw: &str) -> Result<NaiveDate, SchedError> {
    if raw.len() != 10 {
        return Err(SchedError::InvalidInput(format!(
            "expected date as YYYY-MM-DD, got {raw:?}"
        )));
    }
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .map_err(|e| SchedError::InvalidInput(format!("invalid date {raw:?}: {e}")))
}

pub(super) fn parse_slot(n: u8) -> Result<SlotNumber, SchedError> {
    SlotNumber::new(n).map_err(SchedError::InvalidInput)
}

/// Dernier jour réservable : aujourd'hui + `horizon_months` mois calendaires.
pub(super) fn booking_limit(today: NaiveDate, horizon_months: u32) -> NaiveDate {
    today
        .checked_add_months(Months::new(horizon_months))
        .unwrap_or(NaiveDate::MAX)
}

pub(super) fn check_window(
    date: NaiveDate,
    today: NaiveDate,
    horizon_months: u32,
) -> Result<(), SchedError> {
    if date < today {
        return Err(SchedError::PastDate { date, today });
    }
    let limit = booking_limit(today, horizon_months);
    if date > limit {
        return Err(SchedError::TooFarAhead { date, limit });
    }
    Ok(())
}

/// Journalise l'échec de stockage (dans le span de l'opération) et le rend opaque.
pub(super) fn storage_failure(op: &'static str, err: StoreError) -> SchedError {
    error!(op, error = %err, "storage failure");
    SchedError::Storage(err)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn parse_date_is_strict() {
        assert_eq!(parse_date("2025-03-10").unwrap(), d(2025, 3, 10));
        assert!(matches!(parse_date("2025-3-10"), Err(SchedError::InvalidInput(_))));
        assert!(matches!(parse_date("10/03/2025"), Err(SchedError::InvalidInput(_))));
        assert!(matches!(parse_date("2025-02-30"), Err(SchedError::InvalidInput(_))));
    }

    #[test]
    fn window_bounds() {
        let today = d(2025, 3, 10);
        assert!(check_window(today, today, 3).is_ok());
        assert!(check_window(d(2025, 6, 10), today, 3).is_ok());
        assert!(matches!(
            check_window(d(2025, 3, 9), today, 3),
            Err(SchedError::PastDate { .. })
        ));
        assert!(matches!(
            check_window(d(2025, 6, 11), today, 3),
            Err(SchedError::TooFarAhead { .. })
        ));
    }

    #[test]
    fn booking_limit_clamps_month_end() {
        assert_eq!(booking_limit(d(2025, 11, 30), 3), d(2026, 2, 28));
    }
}
