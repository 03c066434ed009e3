//! The single exit for a finished fight.
//!
//! The live loop, the catch-up path and the over-the-window path all end
//! here. The stored status is the exactly-once guard: only the call that
//! moves the fight out of a non-terminal status goes on to update records,
//! award the championship legacy and notify.

use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, FixedOffset};
use rand::Rng;

use spoodblort_engine::calendar::Calendar;
use spoodblort_engine::combat::FightState;
use spoodblort_engine::fight::{Fight, FightStatus, Outcome};
use spoodblort_engine::fighter::{FighterId, Stat};
use spoodblort_engine::matchup::playoff::is_championship;
use spoodblort_engine::rng;

use crate::fight_log::{self, FightLog};
use crate::notifier::{FightReport, Notifier};
use crate::store::{ChampionLegacy, FightResult, Repository};

/// Stat points the special-day champion gains.
pub const LEGACY_STAT_BONUS: i32 = 1;

pub struct Finalizer {
    repo: Arc<dyn Repository>,
    notifier: Arc<dyn Notifier>,
    calendar: Calendar,
}

impl Finalizer {
    pub fn new(repo: Arc<dyn Repository>, notifier: Arc<dyn Notifier>, calendar: Calendar) -> Self {
        Self { repo, notifier, calendar }
    }

    /// Record a finished fight. Returns `false` if another path already did.
    ///
    /// The log, when given, is closed whether or not this call wins.
    pub fn complete(
        &self,
        fight: &Fight,
        state: &FightState,
        log: Option<FightLog>,
        now: DateTime<FixedOffset>,
    ) -> Result<bool> {
        if let Some(log) = log {
            match log.finish(&fight_log::result_line(fight, state)) {
                Ok(path) => tracing::debug!(fight = %fight.id, "fight log closed: {}", path.display()),
                Err(e) => tracing::warn!(fight = %fight.id, "fight log not finished: {:#}", e),
            }
        }

        let result = FightResult {
            winner: state.winner,
            score1: state.health1,
            score2: state.health2,
            completed_at: now,
        };
        if !self.repo.record_result(fight.id, &result)? {
            tracing::debug!(fight = %fight.id, "already finalized");
            return Ok(false);
        }
        tracing::info!(
            fight = %fight.id,
            "{} vs {} finished after {} ticks: {}",
            fight.fighter1_name,
            fight.fighter2_name,
            state.tick,
            fight_log::result_line(fight, state)
        );

        let outcome = Outcome::from_winner(fight, state.winner);
        if state.death_occurred {
            let loser = state.winner.and_then(|w| fight.opponent_of(w));
            if let Some(loser) = loser {
                if let Err(e) = self.repo.kill_fighter(loser) {
                    tracing::warn!(fight = %fight.id, "failed to mark fighter {} dead: {:#}", loser, e);
                }
            }
        }
        if let Err(e) = self.repo.record_outcome(fight.fighter1_id, fight.fighter2_id, outcome) {
            tracing::warn!(fight = %fight.id, "failed to update records: {:#}", e);
        }

        if is_championship(fight, &self.calendar) {
            if let Some(champion) = state.winner {
                if let Err(e) = self.award_legacy(fight, champion, now) {
                    tracing::warn!(fight = %fight.id, "champion legacy not applied: {:#}", e);
                }
            }
        }

        let report = FightReport {
            fight: Fight {
                status: FightStatus::Completed,
                winner_id: result.winner,
                final_score1: Some(result.score1),
                final_score2: Some(result.score2),
                completed_at: Some(now),
                ..fight.clone()
            },
            state: state.clone(),
            fighter1: self.repo.fighter(fight.fighter1_id).ok().flatten(),
            fighter2: self.repo.fighter(fight.fighter2_id).ok().flatten(),
        };
        if let Err(e) = self.notifier.fight_result(&report) {
            tracing::warn!(fight = %fight.id, "result notification failed: {:#}", e);
        }
        Ok(true)
    }

    fn award_legacy(
        &self,
        fight: &Fight,
        champion: FighterId,
        now: DateTime<FixedOffset>,
    ) -> Result<()> {
        let mut rng = rng::seeded(now.timestamp() ^ fight.id.0);
        let stat = Stat::ALL[rng.gen_range(0..Stat::ALL.len())];
        self.repo.increment_stat(champion, stat, LEGACY_STAT_BONUS)?;
        self.repo.record_champion_legacy(ChampionLegacy {
            fight_id: fight.id,
            fighter_id: champion,
            tournament_id: fight.tournament_id,
            stat,
            delta: LEGACY_STAT_BONUS,
            awarded_at: now,
        })?;
        tracing::info!(fight = %fight.id, "champion {} gains +{} {}", champion, LEGACY_STAT_BONUS, stat);
        Ok(())
    }
}
