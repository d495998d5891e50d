use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifiant fort pour Employee
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmployeeId(i64);

impl EmployeeId {
    pub fn new(raw: i64) -> Self {
        Self(raw)
    }
    pub fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for EmployeeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identifiant fort pour ShiftSlot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlotId(i64);

impl SlotId {
    pub fn new(raw: i64) -> Self {
        Self(raw)
    }
    pub fn get(self) -> i64 {
        self.0
    }
}

/// Identifiant fort pour Assignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssignmentId(i64);

impl AssignmentId {
    pub fn new(raw: i64) -> Self {
        Self(raw)
    }
    pub fn get(self) -> i64 {
        self.0
    }
}

/// Rôle opérationnel d'un membre du personnel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Medic,
    Technical,
    Administrator,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Medic, Role::Technical, Role::Administrator];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Medic => "medic",
            Role::Technical => "technical",
            Role::Administrator => "administrator",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "medic" => Ok(Role::Medic),
            "technical" => Ok(Role::Technical),
            "administrator" | "admin" => Ok(Role::Administrator),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// Membre du personnel, tel que fourni par l'annuaire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub id: EmployeeId,
    pub name: String,
    pub role: Role,
}

/// Numéro de créneau journalier (1..=3), chacun couvrant 8h consécutives (UTC).
///
/// - 1 : 06:00–14:00
/// - 2 : 14:00–22:00
/// - 3 : 22:00–06:00 (le lendemain)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct SlotNumber(u8);

const SLOT_HOURS: i64 = 8;
const FIRST_SLOT_START_HOUR: u32 = 6;

impl SlotNumber {
    pub const ALL: [SlotNumber; 3] = [SlotNumber(1), SlotNumber(2), SlotNumber(3)];

    pub fn new(n: u8) -> Result<Self, String> {
        if (1..=3).contains(&n) {
            Ok(Self(n))
        } else {
            Err(format!("slot number must be 1, 2 or 3 (got {n})"))
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }

    fn start_time(self) -> NaiveTime {
        let hour = (FIRST_SLOT_START_HOUR + u32::from(self.0 - 1) * SLOT_HOURS as u32) % 24;
        NaiveTime::from_hms_opt(hour, 0, 0).unwrap_or(NaiveTime::MIN)
    }

    /// Fenêtre [start, end) du créneau pour une date donnée.
    pub fn window_on(self, date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
        let start = Utc.from_utc_datetime(&NaiveDateTime::new(date, self.start_time()));
        (start, start + Duration::hours(SLOT_HOURS))
    }

    /// Créneau (et date de rattachement) actif à l'instant donné.
    ///
    /// Avant 06:00, l'instant appartient au créneau 3 de la veille.
    pub fn containing(instant: DateTime<Utc>) -> (NaiveDate, SlotNumber) {
        let date = instant.date_naive();
        match instant.hour() {
            6..=13 => (date, SlotNumber(1)),
            14..=21 => (date, SlotNumber(2)),
            22..=23 => (date, SlotNumber(3)),
            _ => (date.pred_opt().unwrap_or(date), SlotNumber(3)),
        }
    }
}

impl TryFrom<u8> for SlotNumber {
    type Error = String;

    fn try_from(n: u8) -> Result<Self, Self::Error> {
        SlotNumber::new(n)
    }
}

impl From<SlotNumber> for u8 {
    fn from(slot: SlotNumber) -> u8 {
        slot.0
    }
}

impl fmt::Display for SlotNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Créneau persisté : unique par (date, numéro).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftSlot {
    pub id: SlotId,
    pub date: NaiveDate,
    pub number: SlotNumber,
}

impl ShiftSlot {
    pub fn window(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        self.number.window_on(self.date)
    }
}

/// Lien employé ↔ créneau, avec le rôle figé au moment de l'assignation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub id: AssignmentId,
    pub employee: EmployeeId,
    pub slot: SlotId,
    pub date: NaiveDate,
    pub number: SlotNumber,
    pub role: Role,
}
