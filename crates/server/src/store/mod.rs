//! Persistence boundary.
//!
//! The core only talks to storage through [`Repository`]. Every write must be
//! visible to the very next read; the schedule manager re-derives all of its
//! decisions from what it reads here on each pass.

pub mod memory;

use anyhow::Result;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use spoodblort_engine::fight::{Fight, FightId, NewFight, Outcome, Tournament, TournamentId};
use spoodblort_engine::fighter::{Fighter, FighterId, Stat, StatEffect};

pub use memory::MemoryStore;

/// Final numbers of a fight, written once when it completes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FightResult {
    pub winner: Option<FighterId>,
    pub score1: i32,
    pub score2: i32,
    pub completed_at: DateTime<FixedOffset>,
}

/// Stat awarded to the special-day champion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChampionLegacy {
    pub fight_id: FightId,
    pub fighter_id: FighterId,
    pub tournament_id: TournamentId,
    pub stat: Stat,
    pub delta: i32,
    pub awarded_at: DateTime<FixedOffset>,
}

pub trait Repository: Send + Sync + 'static {
    // ── Tournaments ─────────────────────────────────────────────────────────
    fn tournament_for_week(&self, week: u32) -> Result<Option<Tournament>>;
    fn tournament(&self, id: TournamentId) -> Result<Option<Tournament>>;

    // ── Fighters ────────────────────────────────────────────────────────────
    fn fighter(&self, id: FighterId) -> Result<Option<Fighter>>;
    /// Alive or undead fighters.
    fn eligible_fighters(&self) -> Result<Vec<Fighter>>;
    fn record_outcome(&self, fighter1: FighterId, fighter2: FighterId, outcome: Outcome) -> Result<()>;
    fn kill_fighter(&self, id: FighterId) -> Result<()>;
    fn increment_stat(&self, id: FighterId, stat: Stat, delta: i32) -> Result<()>;
    /// Effects applied to `fighter` within `[from, to)`.
    fn effects_between(
        &self,
        fighter: FighterId,
        from: DateTime<FixedOffset>,
        to: DateTime<FixedOffset>,
    ) -> Result<Vec<StatEffect>>;
    fn record_champion_legacy(&self, legacy: ChampionLegacy) -> Result<()>;

    // ── Fights ──────────────────────────────────────────────────────────────
    fn fight(&self, id: FightId) -> Result<Option<Fight>>;
    /// Fights of a tournament scheduled within `[from, to)`, in schedule order.
    fn fights_between(
        &self,
        tournament: TournamentId,
        from: DateTime<FixedOffset>,
        to: DateTime<FixedOffset>,
    ) -> Result<Vec<Fight>>;
    fn completed_fights_between(
        &self,
        tournament: TournamentId,
        from: DateTime<FixedOffset>,
        to: DateTime<FixedOffset>,
    ) -> Result<Vec<Fight>>;
    fn fight_exists_at(&self, tournament: TournamentId, at: DateTime<FixedOffset>) -> Result<bool>;
    fn insert_fight(&self, fight: NewFight) -> Result<FightId>;
    /// Move due `scheduled` fights to `active`; returns the ones moved.
    fn activate_due_fights(&self, tournament: TournamentId, now: DateTime<FixedOffset>) -> Result<Vec<FightId>>;
    fn expired_scheduled_fights(&self, tournament: TournamentId, now: DateTime<FixedOffset>) -> Result<Vec<Fight>>;
    fn active_fights(&self) -> Result<Vec<Fight>>;
    /// Void a fight that has not finished. `false` if it already had.
    fn void_fight(&self, id: FightId, reason: &str, at: DateTime<FixedOffset>) -> Result<bool>;
    /// Complete a fight that has not finished. `false` if it already had.
    fn record_result(&self, id: FightId, result: &FightResult) -> Result<bool>;
}
