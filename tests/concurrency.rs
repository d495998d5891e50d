#![forbid(unsafe_code)]
use chrono::{TimeZone, Utc};
use secours::{
    AssignOptions, EmployeeDirectory, ErrorClass, FixedClock, Role, SchedError, Scheduler,
    SqliteStore, StoreError,
};
use std::thread;
use std::time::Duration;
use tempfile::tempdir;

#[test]
fn concurrent_writers_never_overrun_capacity() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("roster.db");
    let store = SqliteStore::open(&path, Duration::from_secs(10)).unwrap();
    let medics: Vec<_> = (0..6)
        .map(|n| store.register_employee(&format!("Medic {n}"), Role::Medic).unwrap().id)
        .collect();

    let clock = FixedClock(Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap());
    let handles: Vec<_> = medics
        .iter()
        .map(|&medic| {
            let conn = store.reopen().unwrap();
            thread::spawn(move || {
                let s = Scheduler::with_clock(conn, clock, AssignOptions::default());
                s.assign_shift(medic, "2025-03-10", 1)
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let ok = results.iter().filter(|r| r.is_ok()).count();
    let full = results
        .iter()
        .filter(|r| matches!(r, Err(SchedError::CapacityReached { .. })))
        .count();
    assert_eq!(ok, 2);
    assert_eq!(full, 4);

    let s = Scheduler::with_clock(store, clock, AssignOptions::default());
    let grid = s.availability("2025-03-10", 1).unwrap();
    assert_eq!(grid[0].slots[0].roles[0].assigned, 2);
}

#[test]
fn same_employee_racing_gets_one_booking() {
    let dir = tempdir().unwrap();
    let store = SqliteStore::open(dir.path().join("roster.db"), Duration::from_secs(10)).unwrap();
    let tech = store.register_employee("Luc", Role::Technical).unwrap().id;
    let clock = FixedClock(Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap());

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let conn = store.reopen().unwrap();
            thread::spawn(move || {
                Scheduler::with_clock(conn, clock, AssignOptions::default())
                    .assign_shift(tech, "2025-03-10", 2)
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results
        .iter()
        .filter(|r| r.is_err())
        .all(|r| matches!(r, Err(SchedError::AlreadyAssigned { .. }))));
}

#[test]
fn held_write_lock_surfaces_as_opaque_storage_timeout() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("roster.db");
    let store = SqliteStore::open(&path, Duration::from_millis(100)).unwrap();
    let medic = store.register_employee("Medic", Role::Medic).unwrap().id;

    // Un autre processus garde le verrou d'écriture.
    let holder = rusqlite::Connection::open(&path).unwrap();
    holder.execute_batch("BEGIN IMMEDIATE;").unwrap();

    let clock = FixedClock(Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap());
    let scheduler = Scheduler::with_clock(store, clock, AssignOptions::default());
    let err = scheduler.assign_shift(medic, "2025-03-10", 1).unwrap_err();

    assert!(matches!(err, SchedError::Storage(StoreError::Timeout)), "{err:?}");
    assert_eq!(err.class(), ErrorClass::Storage);
    assert_eq!(err.to_string(), "storage failure");

    holder.execute_batch("ROLLBACK;").unwrap();
    assert!(scheduler.assign_shift(medic, "2025-03-10", 1).is_ok());
}
