//! Cleaning up fights the process missed.

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset};
use rand::Rng;

use spoodblort_engine::fight::{FightId, Outcome, TournamentId};
use spoodblort_engine::rng;

use crate::store::Repository;

pub const VOID_REASONS: [&str; 8] = [
    "Lost to the temporal void due to server maintenance",
    "Fighters got lost in the existential dread dimension",
    "Fight cancelled due to molecular density interference",
    "Bout voided by the Department of Recreational Violence",
    "Match dissolved into pure chaos energy",
    "Fighters busy counting their fingers and toes",
    "Combat suspended due to horoscope incompatibility",
    "Fight absorbed by a nearby participation trophy",
];

pub struct Recovery {
    repo: Arc<dyn Repository>,
}

impl Recovery {
    pub fn new(repo: Arc<dyn Repository>) -> Self {
        Self { repo }
    }

    /// Void every scheduled fight whose window closed unactivated, recording
    /// a draw for both fighters. Returns the fights this call voided.
    pub fn void_expired_fights(&self, tournament: TournamentId, now: DateTime<FixedOffset>) -> Result<Vec<FightId>> {
        let expired = self
            .repo
            .expired_scheduled_fights(tournament, now)
            .context("loading expired fights")?;
        if expired.is_empty() {
            return Ok(Vec::new());
        }
        tracing::info!("Voiding {} fights that never happened", expired.len());

        let mut rng = rng::seeded(rng::void_reason_seed(&now));
        let mut voided = Vec::with_capacity(expired.len());
        for fight in expired {
            let reason = VOID_REASONS[rng.gen_range(0..VOID_REASONS.len())];
            if !self
                .repo
                .void_fight(fight.id, reason, now)
                .with_context(|| format!("voiding fight {}", fight.id))?
            {
                continue;
            }
            tracing::debug!(fight = %fight.id, "voided: {}", reason);
            voided.push(fight.id);

            if let Err(e) = self.repo.record_outcome(fight.fighter1_id, fight.fighter2_id, Outcome::Draw) {
                tracing::warn!(fight = %fight.id, "voided but records not updated: {:#}", e);
            }
        }
        Ok(voided)
    }

    pub fn activate_due_fights(&self, tournament: TournamentId, now: DateTime<FixedOffset>) -> Result<Vec<FightId>> {
        let activated = self
            .repo
            .activate_due_fights(tournament, now)
            .context("activating due fights")?;
        for id in &activated {
            tracing::info!(fight = %id, "fight activated");
        }
        Ok(activated)
    }
}
