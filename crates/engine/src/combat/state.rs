use serde::{Deserialize, Serialize};

use super::STARTING_HEALTH;
use crate::fighter::FighterId;

/// One side of a fight as the simulator sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lane {
    One,
    Two,
}

impl Lane {
    pub fn other(self) -> Lane {
        match self {
            Lane::One => Lane::Two,
            Lane::Two => Lane::One,
        }
    }
}

/// How a finished fight ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Finish {
    Death,
    Knockout,
    Decision,
    Draw,
}

/// Simulation-only state of one fight.
///
/// Health stays within `[0, STARTING_HEALTH]` and `is_complete` never goes
/// back to `false`; once set, winner, death flag and health are frozen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FightState {
    pub health1: i32,
    pub health2: i32,
    /// Last tick simulated (0 before the first).
    pub tick: u32,
    pub round: u32,
    /// Damage taken by each lane on the last tick.
    pub last_damage1: i32,
    pub last_damage2: i32,
    pub is_complete: bool,
    pub winner: Option<FighterId>,
    pub death_occurred: bool,
    pub finish: Option<Finish>,
}

impl FightState {
    pub fn new() -> Self {
        Self {
            health1: STARTING_HEALTH,
            health2: STARTING_HEALTH,
            tick: 0,
            round: 1,
            last_damage1: 0,
            last_damage2: 0,
            is_complete: false,
            winner: None,
            death_occurred: false,
            finish: None,
        }
    }

    pub fn health(&self, lane: Lane) -> i32 {
        match lane {
            Lane::One => self.health1,
            Lane::Two => self.health2,
        }
    }

    pub(crate) fn health_mut(&mut self, lane: Lane) -> &mut i32 {
        match lane {
            Lane::One => &mut self.health1,
            Lane::Two => &mut self.health2,
        }
    }

    pub(crate) fn last_damage_mut(&mut self, lane: Lane) -> &mut i32 {
        match lane {
            Lane::One => &mut self.last_damage1,
            Lane::Two => &mut self.last_damage2,
        }
    }

    pub(crate) fn clamp_health(&mut self) {
        self.health1 = self.health1.clamp(0, STARTING_HEALTH);
        self.health2 = self.health2.clamp(0, STARTING_HEALTH);
    }

    /// Mark the fight finished. A no-op if it already is.
    pub(crate) fn finish(&mut self, winner: Option<FighterId>, finish: Finish) {
        if self.is_complete {
            return;
        }
        self.is_complete = true;
        self.winner = winner;
        self.death_occurred = finish == Finish::Death;
        self.finish = Some(finish);
    }

    /// Lane with strictly more health, if any.
    pub fn leader(&self) -> Option<Lane> {
        match self.health1.cmp(&self.health2) {
            std::cmp::Ordering::Greater => Some(Lane::One),
            std::cmp::Ordering::Less => Some(Lane::Two),
            std::cmp::Ordering::Equal => None,
        }
    }
}

impl Default for FightState {
    fn default() -> Self {
        Self::new()
    }
}
