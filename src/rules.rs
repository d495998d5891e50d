//! Règles pures : capacité par rôle et durée maximale d'astreinte consécutive.

use crate::model::Role;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Nombre maximal d'occupants simultanés par rôle sur un créneau.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CapacityTable {
    pub medic: u32,
    pub technical: u32,
    pub administrator: u32,
}

impl Default for CapacityTable {
    fn default() -> Self {
        Self {
            medic: 2,
            technical: 4,
            administrator: 0,
        }
    }
}

impl CapacityTable {
    pub fn capacity(&self, role: Role) -> u32 {
        match role {
            Role::Medic => self.medic,
            Role::Technical => self.technical,
            Role::Administrator => self.administrator,
        }
    }

    /// Places restantes, planchées à zéro.
    pub fn remaining(&self, role: Role, occupied: u32) -> u32 {
        self.capacity(role).saturating_sub(occupied)
    }

    /// Rôles ayant au moins une place (les autres sont inassignables).
    pub fn assignable_roles(&self) -> Vec<Role> {
        Role::ALL
            .into_iter()
            .filter(|role| self.capacity(*role) > 0)
            .collect()
    }
}

/// Longueur de la série maximale de jours consécutifs contenant `candidate`,
/// une fois `candidate` ajouté à `on_duty`.
pub fn consecutive_run_length(on_duty: &BTreeSet<NaiveDate>, candidate: NaiveDate) -> u32 {
    let mut run = 1u32;

    let mut day = candidate;
    while let Some(prev) = day.pred_opt() {
        if !on_duty.contains(&prev) {
            break;
        }
        run += 1;
        day = prev;
    }

    let mut day = candidate;
    while let Some(next) = day.succ_opt() {
        if !on_duty.contains(&next) {
            break;
        }
        run += 1;
        day = next;
    }

    run
}

/// Règle des jours consécutifs, paramétrée par le maximum autorisé.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConsecutiveDutyRule {
    pub max_days: u32,
}

impl ConsecutiveDutyRule {
    pub fn new(max_days: u32) -> Self {
        Self { max_days }
    }

    /// Rayon (en jours) de la fenêtre d'historique à lire autour d'une date candidate.
    pub fn lookaround_days(&self) -> i64 {
        i64::from(self.max_days)
    }

    /// `Err(run)` si l'ajout de `candidate` dépasse le maximum.
    pub fn check(&self, on_duty: &BTreeSet<NaiveDate>, candidate: NaiveDate) -> Result<u32, u32> {
        let run = consecutive_run_length(on_duty, candidate);
        if run > self.max_days {
            Err(run)
        } else {
            Ok(run)
        }
    }
}
