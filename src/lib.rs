#![forbid(unsafe_code)]
//! Secours — moteur de planning des gardes pour un service de secours en montagne.
//!
//! - Créneaux fixes de 8h (1..=3 par jour), créés à la demande.
//! - Capacité par rôle, limite de jours consécutifs, fenêtre de réservation.
//! - Grille de disponibilité et résolution « qui est de garde maintenant ».
//! - Stockage SQLite ; tout en UTC.

pub mod clock;
pub mod config;
pub mod io;
pub mod model;
pub mod rules;
pub mod scheduler;
pub mod storage;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::RosterConfig;
pub use model::{
    Assignment, AssignmentId, Employee, EmployeeId, Role, ShiftSlot, SlotId, SlotNumber,
};
pub use rules::{consecutive_run_length, CapacityTable, ConsecutiveDutyRule};
pub use scheduler::{
    AssignOptions, AssignmentReceipt, DayAvailability, ErrorClass, RosterStore, SchedError,
    Scheduler,
};
pub use storage::{CommitOutcome, EmployeeDirectory, ShiftStore, SlotCounts, SqliteStore, StoreError};
