//! Spectator-facing HTTP surface.
//!
//! `GET /fights/:id` returns a [`FightSnapshot`]; `GET /fights/:id/live`
//! upgrades to a websocket that opens with the same snapshot and then
//! streams the fight's broadcast messages.

pub mod server;

use std::sync::Arc;

use anyhow::{Result, anyhow};
use chrono::{DateTime, FixedOffset};
use serde::Serialize;

use spoodblort_engine::calendar::Calendar;
use spoodblort_engine::fight::{Fight, FightId, FightStatus};
use spoodblort_engine::fighter::{Fighter, FighterId, Record, Stats};

use crate::live::LiveCoordinator;
use crate::spectators::SpectatorRegistry;
use crate::store::Repository;

/// Shared state handed to every handler.
pub struct AppState {
    pub repo: Arc<dyn Repository>,
    pub spectators: Arc<SpectatorRegistry>,
    pub live: Arc<LiveCoordinator>,
    pub calendar: Calendar,
}

#[derive(Debug, Clone, Serialize)]
pub struct FighterCard {
    pub id: FighterId,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<Stats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<Record>,
    pub is_undead: bool,
}

impl FighterCard {
    /// Card for one side of `fight`. Falls back to the stored display name
    /// when the fighter record is gone.
    fn for_side(id: FighterId, name: &str, fighter: Option<Fighter>) -> Self {
        match fighter {
            Some(f) => Self {
                id,
                name: f.name,
                stats: Some(f.stats),
                record: Some(f.record),
                is_undead: f.is_undead,
            },
            None => Self {
                id,
                name: name.to_string(),
                stats: None,
                record: None,
                is_undead: false,
            },
        }
    }
}

/// What a spectator sees on arrival. Which optional fields are present
/// depends on the fight's status.
#[derive(Debug, Clone, Serialize)]
pub struct FightSnapshot {
    pub fight_id: FightId,
    pub status: FightStatus,
    pub scheduled_at: DateTime<FixedOffset>,
    pub fighter1: FighterCard,
    pub fighter2: FighterCard,
    pub viewers: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health1: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health2: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tick: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub round: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner_id: Option<FighterId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_score1: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_score2: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub void_reason: Option<String>,
}

impl AppState {
    pub fn load_fight(&self, id: FightId) -> Result<Fight> {
        self.repo.fight(id)?.ok_or_else(|| anyhow!("fight {} not found", id))
    }

    pub fn snapshot(&self, fight: &Fight, now: DateTime<FixedOffset>) -> Result<FightSnapshot> {
        let mut snapshot = FightSnapshot {
            fight_id: fight.id,
            status: fight.status,
            scheduled_at: fight.scheduled_at,
            fighter1: FighterCard::for_side(fight.fighter1_id, &fight.fighter1_name, self.repo.fighter(fight.fighter1_id)?),
            fighter2: FighterCard::for_side(fight.fighter2_id, &fight.fighter2_name, self.repo.fighter(fight.fighter2_id)?),
            viewers: self.spectators.viewer_count(fight.id),
            health1: None,
            health2: None,
            tick: None,
            round: None,
            winner_id: None,
            final_score1: None,
            final_score2: None,
            void_reason: None,
        };

        match fight.status {
            FightStatus::Scheduled => {}
            FightStatus::Active => {
                let state = self.live.catch_up_state(fight, now)?;
                snapshot.health1 = Some(state.health1);
                snapshot.health2 = Some(state.health2);
                snapshot.tick = Some(state.tick);
                snapshot.round = Some(state.round);
            }
            FightStatus::Completed => {
                snapshot.winner_id = fight.winner_id;
                snapshot.final_score1 = fight.final_score1;
                snapshot.final_score2 = fight.final_score2;
            }
            FightStatus::Voided => {
                snapshot.void_reason = fight.void_reason.clone();
            }
        }
        Ok(snapshot)
    }
}
