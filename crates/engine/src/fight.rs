//! Fights, tournaments and their lifecycle.

use std::fmt;

use chrono::{DateTime, Duration, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::fighter::{Fighter, FighterId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FightId(pub i64);

impl fmt::Display for FightId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TournamentId(pub i64);

impl fmt::Display for TournamentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How long after its scheduled start a fight may still be activated, and
/// how long it runs once it is.
pub const ACTIVATION_WINDOW_MINUTES: i64 = 30;

pub fn activation_window() -> Duration {
    Duration::minutes(ACTIVATION_WINDOW_MINUTES)
}

/// `scheduled -> active -> completed | voided`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FightStatus {
    Scheduled,
    Active,
    Completed,
    Voided,
}

impl FightStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, FightStatus::Completed | FightStatus::Voided)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FightStatus::Scheduled => "scheduled",
            FightStatus::Active => "active",
            FightStatus::Completed => "completed",
            FightStatus::Voided => "voided",
        }
    }
}

impl fmt::Display for FightStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fight {
    pub id: FightId,
    pub tournament_id: TournamentId,
    pub fighter1_id: FighterId,
    pub fighter2_id: FighterId,
    /// Names as they were when the fight was booked.
    pub fighter1_name: String,
    pub fighter2_name: String,
    pub scheduled_at: DateTime<FixedOffset>,
    pub status: FightStatus,
    #[serde(default)]
    pub winner_id: Option<FighterId>,
    #[serde(default)]
    pub final_score1: Option<i32>,
    #[serde(default)]
    pub final_score2: Option<i32>,
    #[serde(default)]
    pub completed_at: Option<DateTime<FixedOffset>>,
    #[serde(default)]
    pub void_reason: Option<String>,
}

impl Fight {
    /// End of the activation window (also the natural end of a live fight).
    pub fn window_end(&self) -> DateTime<FixedOffset> {
        self.scheduled_at + activation_window()
    }

    /// A scheduled fight whose start has arrived and whose window is still open.
    pub fn is_due(&self, now: DateTime<FixedOffset>) -> bool {
        self.status == FightStatus::Scheduled && self.scheduled_at <= now && now < self.window_end()
    }

    /// A scheduled fight whose window closed before anyone activated it.
    pub fn is_expired(&self, now: DateTime<FixedOffset>) -> bool {
        self.status == FightStatus::Scheduled && self.window_end() < now
    }

    pub fn involves(&self, fighter: FighterId) -> bool {
        self.fighter1_id == fighter || self.fighter2_id == fighter
    }

    pub fn name_of(&self, fighter: FighterId) -> Option<&str> {
        if fighter == self.fighter1_id {
            Some(&self.fighter1_name)
        } else if fighter == self.fighter2_id {
            Some(&self.fighter2_name)
        } else {
            None
        }
    }

    /// The other side of the fight, if `fighter` is on it.
    pub fn opponent_of(&self, fighter: FighterId) -> Option<FighterId> {
        if fighter == self.fighter1_id {
            Some(self.fighter2_id)
        } else if fighter == self.fighter2_id {
            Some(self.fighter1_id)
        } else {
            None
        }
    }

    pub fn outcome(&self) -> Option<Outcome> {
        if !self.status.is_terminal() {
            return None;
        }
        Some(Outcome::from_winner(self, self.winner_id))
    }
}

/// A fight that has been generated but not yet stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewFight {
    pub tournament_id: TournamentId,
    pub fighter1_id: FighterId,
    pub fighter2_id: FighterId,
    pub fighter1_name: String,
    pub fighter2_name: String,
    pub scheduled_at: DateTime<FixedOffset>,
}

impl NewFight {
    pub fn between(
        tournament_id: TournamentId,
        fighter1: &Fighter,
        fighter2: &Fighter,
        scheduled_at: DateTime<FixedOffset>,
    ) -> Self {
        Self {
            tournament_id,
            fighter1_id: fighter1.id,
            fighter2_id: fighter2.id,
            fighter1_name: fighter1.name.clone(),
            fighter2_name: fighter2.name.clone(),
            scheduled_at,
        }
    }

    pub fn into_fight(self, id: FightId) -> Fight {
        Fight {
            id,
            tournament_id: self.tournament_id,
            fighter1_id: self.fighter1_id,
            fighter2_id: self.fighter2_id,
            fighter1_name: self.fighter1_name,
            fighter2_name: self.fighter2_name,
            scheduled_at: self.scheduled_at,
            status: FightStatus::Scheduled,
            winner_id: None,
            final_score1: None,
            final_score2: None,
            completed_at: None,
            void_reason: None,
        }
    }
}

/// A weekly tournament period. Read-only to the core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tournament {
    pub id: TournamentId,
    pub week_number: u32,
    pub name: String,
    pub sponsor: String,
    pub start_date: NaiveDate,
}

/// Result of a fight from the record-keeping point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Fighter1Wins,
    Fighter2Wins,
    Draw,
}

impl Outcome {
    /// Any winner that is not one of the two fighters counts as a draw.
    pub fn from_winner(fight: &Fight, winner: Option<FighterId>) -> Self {
        match winner {
            Some(id) if id == fight.fighter1_id => Outcome::Fighter1Wins,
            Some(id) if id == fight.fighter2_id => Outcome::Fighter2Wins,
            _ => Outcome::Draw,
        }
    }
}
