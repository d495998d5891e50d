use super::{CommitOutcome, EmployeeDirectory, ShiftStore, SlotCounts, StoreError};
use crate::model::{
    Assignment, AssignmentId, Employee, EmployeeId, Role, ShiftSlot, SlotId, SlotNumber,
};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use std::path::{Path, PathBuf};
use std::time::Duration as StdDuration;
use tracing::{debug, info, warn};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS employee (
        employee_id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        role TEXT NOT NULL CHECK(role IN ('medic', 'technical', 'administrator'))
    );

    CREATE TABLE IF NOT EXISTS shift_slot (
        slot_id INTEGER PRIMARY KEY AUTOINCREMENT,
        shift_date TEXT NOT NULL,
        slot_number INTEGER NOT NULL CHECK(slot_number BETWEEN 1 AND 3),
        UNIQUE(shift_date, slot_number)
    );

    CREATE TABLE IF NOT EXISTS assignment (
        assignment_id INTEGER PRIMARY KEY AUTOINCREMENT,
        employee_id INTEGER NOT NULL REFERENCES employee(employee_id),
        slot_id INTEGER NOT NULL REFERENCES shift_slot(slot_id),
        role TEXT NOT NULL,
        UNIQUE(employee_id, slot_id)
    );

    CREATE INDEX IF NOT EXISTS idx_assignment_slot_role
        ON assignment(slot_id, role);
";

const DEFAULT_TIMEOUT: StdDuration = StdDuration::from_secs(5);

/// Stockage SQLite (fichier ou mémoire).
pub struct SqliteStore {
    conn: Connection,
    path: Option<PathBuf>,
    timeout: StdDuration,
}

impl SqliteStore {
    /// Ouvre (ou crée) une base fichier ; `timeout` borne l'attente des verrous.
    pub fn open<P: AsRef<Path>>(path: P, timeout: StdDuration) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let conn = Connection::open(&path)?;
        conn.busy_timeout(timeout)?;
        // WAL uniquement pour les vrais fichiers ; sans lui les lecteurs attendent les écrivains.
        if let Err(err) = conn.execute_batch("PRAGMA journal_mode=WAL;") {
            warn!(path = %path.display(), error = %err, "could not enable WAL journal");
        }
        let store = Self {
            conn,
            path: Some(path),
            timeout,
        };
        store.initialize()?;
        Ok(store)
    }

    /// Base en mémoire, isolée (tests).
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        conn.busy_timeout(DEFAULT_TIMEOUT)?;
        let store = Self {
            conn,
            path: None,
            timeout: DEFAULT_TIMEOUT,
        };
        store.initialize()?;
        Ok(store)
    }

    /// Nouvelle connexion vers la même base.
    /// En mémoire, renvoie une base neuve et isolée.
    pub fn reopen(&self) -> Result<Self, StoreError> {
        match &self.path {
            Some(p) => Self::open(p, self.timeout),
            None => Self::in_memory(),
        }
    }

    fn initialize(&self) -> Result<(), StoreError> {
        self.conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        self.conn.execute_batch(SCHEMA)?;
        info!(path = ?self.path, "roster schema ready");
        Ok(())
    }
}

fn role_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Role> {
    let raw: String = row.get(idx)?;
    raw.parse::<Role>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, e.into()))
}

fn slot_number_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<SlotNumber> {
    let raw: i64 = row.get(idx)?;
    let byte = u8::try_from(raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Integer, Box::new(e)))?;
    SlotNumber::new(byte)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Integer, e.into()))
}

fn employee_from_row(row: &Row<'_>) -> rusqlite::Result<Employee> {
    Ok(Employee {
        id: EmployeeId::new(row.get(0)?),
        name: row.get(1)?,
        role: role_at(row, 2)?,
    })
}

fn count_to_u32(count: i64) -> Result<u32, StoreError> {
    u32::try_from(count).map_err(|_| StoreError::InvalidRow(format!("negative count {count}")))
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

// Requêtes partagées entre les appels isolés et la transaction d'assignation.

fn upsert_slot(conn: &Connection, date: NaiveDate, number: SlotNumber) -> rusqlite::Result<ShiftSlot> {
    conn.execute(
        "INSERT INTO shift_slot (shift_date, slot_number) VALUES (?1, ?2)
         ON CONFLICT(shift_date, slot_number) DO NOTHING",
        params![date, number.get()],
    )?;
    let id: i64 = conn.query_row(
        "SELECT slot_id FROM shift_slot WHERE shift_date = ?1 AND slot_number = ?2",
        params![date, number.get()],
        |r| r.get(0),
    )?;
    Ok(ShiftSlot {
        id: SlotId::new(id),
        date,
        number,
    })
}

fn assigned(conn: &Connection, employee: EmployeeId, slot: SlotId) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM assignment WHERE employee_id = ?1 AND slot_id = ?2)",
        params![employee.get(), slot.get()],
        |r| r.get(0),
    )
}

fn role_count(conn: &Connection, slot: SlotId, role: Role) -> rusqlite::Result<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM assignment WHERE slot_id = ?1 AND role = ?2",
        params![slot.get(), role.as_str()],
        |r| r.get(0),
    )
}

fn insert_assignment(
    conn: &Connection,
    employee: EmployeeId,
    slot: SlotId,
    role: Role,
) -> rusqlite::Result<AssignmentId> {
    conn.execute(
        "INSERT INTO assignment (employee_id, slot_id, role) VALUES (?1, ?2, ?3)",
        params![employee.get(), slot.get(), role.as_str()],
    )?;
    Ok(AssignmentId::new(conn.last_insert_rowid()))
}

impl EmployeeDirectory for SqliteStore {
    fn find_employee(&self, id: EmployeeId) -> Result<Option<Employee>, StoreError> {
        let employee = self
            .conn
            .query_row(
                "SELECT employee_id, name, role FROM employee WHERE employee_id = ?1",
                params![id.get()],
                employee_from_row,
            )
            .optional()?;
        Ok(employee)
    }

    fn register_employee(&self, name: &str, role: Role) -> Result<Employee, StoreError> {
        self.conn.execute(
            "INSERT INTO employee (name, role) VALUES (?1, ?2)",
            params![name, role.as_str()],
        )?;
        let id = EmployeeId::new(self.conn.last_insert_rowid());
        debug!(employee = %id, %role, "employee registered");
        Ok(Employee {
            id,
            name: name.to_string(),
            role,
        })
    }

    fn list_employees(&self) -> Result<Vec<Employee>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT employee_id, name, role FROM employee ORDER BY employee_id")?;
        let employees = stmt
            .query_map([], employee_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(employees)
    }
}

impl ShiftStore for SqliteStore {
    fn get_or_create_slot(
        &self,
        date: NaiveDate,
        number: SlotNumber,
    ) -> Result<ShiftSlot, StoreError> {
        Ok(upsert_slot(&self.conn, date, number)?)
    }

    fn is_assigned(&self, employee: EmployeeId, slot: SlotId) -> Result<bool, StoreError> {
        Ok(assigned(&self.conn, employee, slot)?)
    }

    fn count_by_role(&self, slot: SlotId, role: Role) -> Result<u32, StoreError> {
        count_to_u32(role_count(&self.conn, slot, role)?)
    }

    fn create_assignment(
        &self,
        employee: EmployeeId,
        slot: SlotId,
        role: Role,
    ) -> Result<AssignmentId, StoreError> {
        Ok(insert_assignment(&self.conn, employee, slot, role)?)
    }

    fn commit_assignment(
        &self,
        employee: EmployeeId,
        date: NaiveDate,
        number: SlotNumber,
        role: Role,
        capacity: u32,
    ) -> Result<CommitOutcome, StoreError> {
        // IMMEDIATE : le verrou d'écriture est pris avant les vérifications,
        // les écrivains concurrents attendent (busy_timeout) puis revalident.
        let tx = Transaction::new_unchecked(&self.conn, TransactionBehavior::Immediate)?;

        let slot = upsert_slot(&tx, date, number)?;

        if assigned(&tx, employee, slot.id)? {
            return Ok(CommitOutcome::AlreadyAssigned(slot));
        }

        let occupied = count_to_u32(role_count(&tx, slot.id, role)?)?;
        if occupied >= capacity {
            return Ok(CommitOutcome::CapacityReached { slot, occupied });
        }

        let id = match insert_assignment(&tx, employee, slot.id, role) {
            Ok(id) => id,
            Err(err) if is_unique_violation(&err) => {
                return Ok(CommitOutcome::AlreadyAssigned(slot));
            }
            Err(err) => return Err(err.into()),
        };
        tx.commit()?;

        Ok(CommitOutcome::Committed(Assignment {
            id,
            employee,
            slot: slot.id,
            date,
            number,
            role,
        }))
    }

    fn remove_assignment(
        &self,
        employee: EmployeeId,
        date: NaiveDate,
        number: SlotNumber,
    ) -> Result<(), StoreError> {
        let removed = self.conn.execute(
            "DELETE FROM assignment
             WHERE employee_id = ?1
               AND slot_id IN (
                   SELECT slot_id FROM shift_slot WHERE shift_date = ?2 AND slot_number = ?3
               )",
            params![employee.get(), date, number.get()],
        )?;
        if removed == 0 {
            return Err(StoreError::NotFound {
                employee,
                date,
                slot: number,
            });
        }
        Ok(())
    }

    fn list_assignments(
        &self,
        employee: EmployeeId,
        range: Option<(NaiveDate, NaiveDate)>,
    ) -> Result<Vec<Assignment>, StoreError> {
        let (from, to) = match range {
            Some((from, to)) => (Some(from), Some(to)),
            None => (None, None),
        };
        let mut stmt = self.conn.prepare(
            "SELECT a.assignment_id, a.employee_id, a.slot_id, s.shift_date, s.slot_number, a.role
             FROM assignment a
             JOIN shift_slot s ON s.slot_id = a.slot_id
             WHERE a.employee_id = ?1
               AND (?2 IS NULL OR s.shift_date >= ?2)
               AND (?3 IS NULL OR s.shift_date <= ?3)
             ORDER BY s.shift_date ASC, s.slot_number ASC",
        )?;
        let assignments = stmt
            .query_map(params![employee.get(), from, to], |r| {
                Ok(Assignment {
                    id: AssignmentId::new(r.get(0)?),
                    employee: EmployeeId::new(r.get(1)?),
                    slot: SlotId::new(r.get(2)?),
                    date: r.get(3)?,
                    number: slot_number_at(r, 4)?,
                    role: role_at(r, 5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(assignments)
    }

    fn aggregate_counts(&self, from: NaiveDate, to: NaiveDate) -> Result<SlotCounts, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT s.shift_date, s.slot_number, a.role, COUNT(*)
             FROM assignment a
             JOIN shift_slot s ON s.slot_id = a.slot_id
             WHERE s.shift_date BETWEEN ?1 AND ?2
             GROUP BY s.shift_date, s.slot_number, a.role",
        )?;
        let rows = stmt.query_map(params![from, to], |r| {
            Ok((
                r.get::<_, NaiveDate>(0)?,
                slot_number_at(r, 1)?,
                role_at(r, 2)?,
                r.get::<_, i64>(3)?,
            ))
        })?;

        let mut counts = SlotCounts::default();
        for row in rows {
            let (date, slot, role, count) = row?;
            counts.insert(date, slot, role, count_to_u32(count)?);
        }
        Ok(counts)
    }

    fn resolve_on_duty(
        &self,
        instant: DateTime<Utc>,
        buffer: Duration,
    ) -> Result<Vec<Employee>, StoreError> {
        let (date, number) = SlotNumber::containing(instant);
        let (_, end) = number.window_on(date);
        if end - instant < buffer {
            return Ok(Vec::new());
        }

        let mut stmt = self.conn.prepare(
            "SELECT e.employee_id, e.name, e.role
             FROM assignment a
             JOIN shift_slot s ON s.slot_id = a.slot_id
             JOIN employee e ON e.employee_id = a.employee_id
             WHERE s.shift_date = ?1 AND s.slot_number = ?2
             ORDER BY e.employee_id",
        )?;
        let employees = stmt
            .query_map(params![date, number.get()], employee_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(employees)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn slot(n: u8) -> SlotNumber {
        SlotNumber::new(n).unwrap()
    }

    #[test]
    fn file_store_runs_in_wal_mode() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::open(dir.path().join("roster.db"), DEFAULT_TIMEOUT).unwrap();
        let mode: String = store
            .conn
            .query_row("PRAGMA journal_mode", [], |r| r.get(0))
            .unwrap();
        assert_eq!(mode, "wal");
    }

    #[test]
    fn get_or_create_slot_is_idempotent() {
        let store = SqliteStore::in_memory().unwrap();
        let a = store.get_or_create_slot(d(2025, 3, 10), slot(1)).unwrap();
        let b = store.get_or_create_slot(d(2025, 3, 10), slot(1)).unwrap();
        let c = store.get_or_create_slot(d(2025, 3, 10), slot(2)).unwrap();
        assert_eq!(a, b);
        assert_ne!(a.id, c.id);
    }

    #[test]
    fn create_then_count_and_lookup() {
        let store = SqliteStore::in_memory().unwrap();
        let medic = store.register_employee("Anna", Role::Medic).unwrap();
        let s = store.get_or_create_slot(d(2025, 3, 10), slot(1)).unwrap();

        assert!(!store.is_assigned(medic.id, s.id).unwrap());
        store.create_assignment(medic.id, s.id, Role::Medic).unwrap();
        assert!(store.is_assigned(medic.id, s.id).unwrap());
        assert_eq!(store.count_by_role(s.id, Role::Medic).unwrap(), 1);
        assert_eq!(store.count_by_role(s.id, Role::Technical).unwrap(), 0);
    }

    #[test]
    fn duplicate_insert_hits_unique_constraint() {
        let store = SqliteStore::in_memory().unwrap();
        let medic = store.register_employee("Anna", Role::Medic).unwrap();
        let s = store.get_or_create_slot(d(2025, 3, 10), slot(1)).unwrap();
        store.create_assignment(medic.id, s.id, Role::Medic).unwrap();
        let err = insert_assignment(&store.conn, medic.id, s.id, Role::Medic).unwrap_err();
        assert!(is_unique_violation(&err));
    }

    #[test]
    fn rejected_commit_leaves_no_slot_behind() {
        let store = SqliteStore::in_memory().unwrap();
        let admin = store.register_employee("Zoé", Role::Administrator).unwrap();
        let outcome = store
            .commit_assignment(admin.id, d(2025, 3, 10), slot(2), Role::Administrator, 0)
            .unwrap();
        assert!(matches!(outcome, CommitOutcome::CapacityReached { occupied: 0, .. }));

        let slots: i64 = store
            .conn
            .query_row("SELECT COUNT(*) FROM shift_slot", [], |r| r.get(0))
            .unwrap();
        assert_eq!(slots, 0);
    }

    #[test]
    fn remove_missing_assignment_is_not_found() {
        let store = SqliteStore::in_memory().unwrap();
        let medic = store.register_employee("Anna", Role::Medic).unwrap();
        let err = store
            .remove_assignment(medic.id, d(2025, 3, 10), slot(1))
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[test]
    fn list_assignments_is_ordered_and_bounded() {
        let store = SqliteStore::in_memory().unwrap();
        let tech = store.register_employee("Luc", Role::Technical).unwrap();
        for (date, n) in [(d(2025, 3, 12), 1), (d(2025, 3, 10), 3), (d(2025, 3, 10), 1)] {
            let s = store.get_or_create_slot(date, slot(n)).unwrap();
            store.create_assignment(tech.id, s.id, Role::Technical).unwrap();
        }

        let all = store.list_assignments(tech.id, None).unwrap();
        let keys: Vec<_> = all.iter().map(|a| (a.date, a.number.get())).collect();
        assert_eq!(
            keys,
            vec![(d(2025, 3, 10), 1), (d(2025, 3, 10), 3), (d(2025, 3, 12), 1)]
        );

        let bounded = store
            .list_assignments(tech.id, Some((d(2025, 3, 11), d(2025, 3, 12))))
            .unwrap();
        assert_eq!(bounded.len(), 1);
    }

    #[test]
    fn aggregate_counts_groups_by_slot_and_role() {
        let store = SqliteStore::in_memory().unwrap();
        let a = store.register_employee("Anna", Role::Medic).unwrap();
        let b = store.register_employee("Bruno", Role::Medic).unwrap();
        let t = store.register_employee("Luc", Role::Technical).unwrap();
        let s = store.get_or_create_slot(d(2025, 3, 10), slot(2)).unwrap();
        store.create_assignment(a.id, s.id, Role::Medic).unwrap();
        store.create_assignment(b.id, s.id, Role::Medic).unwrap();
        store.create_assignment(t.id, s.id, Role::Technical).unwrap();

        let counts = store.aggregate_counts(d(2025, 3, 10), d(2025, 3, 10)).unwrap();
        assert_eq!(counts.get(d(2025, 3, 10), slot(2), Role::Medic), 2);
        assert_eq!(counts.get(d(2025, 3, 10), slot(2), Role::Technical), 1);
        assert_eq!(counts.get(d(2025, 3, 10), slot(1), Role::Medic), 0);

        let outside = store.aggregate_counts(d(2025, 3, 11), d(2025, 3, 20)).unwrap();
        assert!(outside.is_empty());
    }
}
