//! In-memory repository with JSON snapshot persistence.
//!
//! All state lives behind one `RwLock`; every operation is brief and never
//! awaits while holding it. Snapshots are written to a temporary file and
//! renamed into place so a crash mid-save leaves the previous snapshot.

use std::fs;
use std::path::Path;
use std::sync::RwLock;
use std::time::Instant;

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Duration, FixedOffset};
use serde::{Deserialize, Serialize};

use spoodblort_engine::calendar::Calendar;
use spoodblort_engine::fight::{Fight, FightId, FightStatus, NewFight, Outcome, Tournament, TournamentId};
use spoodblort_engine::fighter::{Fighter, FighterId, Stat, StatEffect, Stats};

use super::{ChampionLegacy, FightResult, Repository};

/// Everything the store holds. Also the on-disk snapshot format.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreData {
    pub fighters: Vec<Fighter>,
    pub tournaments: Vec<Tournament>,
    pub fights: Vec<Fight>,
    #[serde(default)]
    pub effects: Vec<StatEffect>,
    #[serde(default)]
    pub legacies: Vec<ChampionLegacy>,
    #[serde(default)]
    pub next_fight_id: i64,
}

impl StoreData {
    fn fighter_mut(&mut self, id: FighterId) -> Result<&mut Fighter> {
        self.fighters
            .iter_mut()
            .find(|f| f.id == id)
            .ok_or_else(|| anyhow!("fighter {} not found", id))
    }

    fn fight_mut(&mut self, id: FightId) -> Result<&mut Fight> {
        self.fights
            .iter_mut()
            .find(|f| f.id == id)
            .ok_or_else(|| anyhow!("fight {} not found", id))
    }
}

#[derive(Default)]
pub struct MemoryStore {
    data: RwLock<StoreData>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_data(data: StoreData) -> Self {
        Self { data: RwLock::new(data) }
    }

    /// Load a snapshot, or start empty when the file does not exist yet.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }
        let start = Instant::now();
        let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
        let data: StoreData =
            serde_json::from_slice(&bytes).with_context(|| format!("parsing {}", path.display()))?;
        tracing::info!(
            "Loaded {} fighters, {} tournaments, {} fights from {} in {:.1?}",
            data.fighters.len(),
            data.tournaments.len(),
            data.fights.len(),
            path.display(),
            start.elapsed()
        );
        Ok(Self::from_data(data))
    }

    /// Write a snapshot. Returns the number of fights written.
    pub fn save(&self, path: &Path) -> Result<usize> {
        let start = Instant::now();
        let data = self.snapshot();
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
            }
        }
        let json = serde_json::to_vec_pretty(&data).context("serializing store")?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json).with_context(|| format!("writing {}", tmp.display()))?;
        fs::rename(&tmp, path).with_context(|| format!("replacing {}", path.display()))?;
        tracing::debug!("Saved {} fights in {:.1?}", data.fights.len(), start.elapsed());
        Ok(data.fights.len())
    }

    pub fn snapshot(&self) -> StoreData {
        self.read().clone()
    }

    pub fn add_fighter(&self, fighter: Fighter) {
        let mut data = self.write();
        data.fighters.retain(|f| f.id != fighter.id);
        data.fighters.push(fighter);
    }

    pub fn add_tournament(&self, tournament: Tournament) {
        let mut data = self.write();
        data.tournaments.retain(|t| t.id != tournament.id);
        data.tournaments.push(tournament);
    }

    pub fn add_effect(&self, effect: StatEffect) {
        self.write().effects.push(effect);
    }

    /// Overwrite a stored fight wholesale.
    pub fn put_fight(&self, fight: Fight) {
        let mut data = self.write();
        data.next_fight_id = data.next_fight_id.max(fight.id.0);
        data.fights.retain(|f| f.id != fight.id);
        data.fights.push(fight);
    }

    pub fn all_fights(&self) -> Vec<Fight> {
        self.read().fights.clone()
    }

    pub fn legacies(&self) -> Vec<ChampionLegacy> {
        self.read().legacies.clone()
    }

    /// Fill an empty store with a season of tournaments and a roster.
    /// Returns `false` if the store already had fighters.
    pub fn seed_demo(&self, calendar: &Calendar) -> bool {
        let mut data = self.write();
        if !data.fighters.is_empty() {
            return false;
        }
        const NAMES: [&str; 24] = [
            "Sampson", "Timber", "Gristle McBone", "Lady Femur", "Chunk Norris", "The Spleen",
            "Viscera Jones", "Knuckles Malone", "Dr. Elbow", "Molar Express", "Crusty Pete",
            "Bad Brad", "Tibia Tina", "Gutbucket", "Sir Wallop", "Mandible Max", "Kneecap Kate",
            "The Accountant", "Rib Eye", "Hammerhead Hal", "Big Lenny", "Ulna Ursula",
            "Pancreas Pam", "Captain Clavicle",
        ];
        for (i, name) in NAMES.iter().enumerate() {
            let n = i as i32;
            let stats = Stats::new(8 + (n * 7) % 23, 8 + (n * 11) % 19, 8 + (n * 5) % 21, 8 + (n * 13) % 17);
            data.fighters.push(Fighter::new(FighterId(i as i64 + 1), *name, stats));
        }
        for week in 1..=calendar.max_week() {
            data.tournaments.push(Tournament {
                id: TournamentId(week as i64),
                week_number: week,
                name: format!("Week {} Spoodblort Invitational", week),
                sponsor: "The Department of Recreational Violence".to_string(),
                start_date: calendar.season_start() + Duration::weeks(week as i64 - 1),
            });
        }
        tracing::info!("Seeded {} fighters and {} tournaments", data.fighters.len(), data.tournaments.len());
        true
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, StoreData> {
        self.data.read().expect("store lock poisoned")
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, StoreData> {
        self.data.write().expect("store lock poisoned")
    }
}

fn by_schedule(fights: &mut [Fight]) {
    fights.sort_by(|a, b| a.scheduled_at.cmp(&b.scheduled_at).then(a.id.cmp(&b.id)));
}

impl Repository for MemoryStore {
    fn tournament_for_week(&self, week: u32) -> Result<Option<Tournament>> {
        Ok(self.read().tournaments.iter().find(|t| t.week_number == week).cloned())
    }

    fn tournament(&self, id: TournamentId) -> Result<Option<Tournament>> {
        Ok(self.read().tournaments.iter().find(|t| t.id == id).cloned())
    }

    fn fighter(&self, id: FighterId) -> Result<Option<Fighter>> {
        Ok(self.read().fighters.iter().find(|f| f.id == id).cloned())
    }

    fn eligible_fighters(&self) -> Result<Vec<Fighter>> {
        Ok(self.read().fighters.iter().filter(|f| f.is_eligible()).cloned().collect())
    }

    fn record_outcome(&self, fighter1: FighterId, fighter2: FighterId, outcome: Outcome) -> Result<()> {
        let mut data = self.write();
        match outcome {
            Outcome::Fighter1Wins => {
                data.fighter_mut(fighter1)?.record.wins += 1;
                data.fighter_mut(fighter2)?.record.losses += 1;
            }
            Outcome::Fighter2Wins => {
                data.fighter_mut(fighter1)?.record.losses += 1;
                data.fighter_mut(fighter2)?.record.wins += 1;
            }
            Outcome::Draw => {
                data.fighter_mut(fighter1)?.record.draws += 1;
                data.fighter_mut(fighter2)?.record.draws += 1;
            }
        }
        Ok(())
    }

    fn kill_fighter(&self, id: FighterId) -> Result<()> {
        let mut data = self.write();
        let fighter = data.fighter_mut(id)?;
        fighter.is_dead = true;
        fighter.is_undead = false;
        Ok(())
    }

    fn increment_stat(&self, id: FighterId, stat: Stat, delta: i32) -> Result<()> {
        let mut data = self.write();
        let fighter = data.fighter_mut(id)?;
        let current = fighter.stats.get(stat);
        fighter.stats.set(stat, current + delta);
        Ok(())
    }

    fn effects_between(
        &self,
        fighter: FighterId,
        from: DateTime<FixedOffset>,
        to: DateTime<FixedOffset>,
    ) -> Result<Vec<StatEffect>> {
        Ok(self
            .read()
            .effects
            .iter()
            .filter(|e| e.fighter_id == fighter && e.applied_at >= from && e.applied_at < to)
            .cloned()
            .collect())
    }

    fn record_champion_legacy(&self, legacy: ChampionLegacy) -> Result<()> {
        self.write().legacies.push(legacy);
        Ok(())
    }

    fn fight(&self, id: FightId) -> Result<Option<Fight>> {
        Ok(self.read().fights.iter().find(|f| f.id == id).cloned())
    }

    fn fights_between(
        &self,
        tournament: TournamentId,
        from: DateTime<FixedOffset>,
        to: DateTime<FixedOffset>,
    ) -> Result<Vec<Fight>> {
        let mut fights: Vec<Fight> = self
            .read()
            .fights
            .iter()
            .filter(|f| f.tournament_id == tournament && f.scheduled_at >= from && f.scheduled_at < to)
            .cloned()
            .collect();
        by_schedule(&mut fights);
        Ok(fights)
    }

    fn completed_fights_between(
        &self,
        tournament: TournamentId,
        from: DateTime<FixedOffset>,
        to: DateTime<FixedOffset>,
    ) -> Result<Vec<Fight>> {
        let mut fights = self.fights_between(tournament, from, to)?;
        fights.retain(|f| f.status == FightStatus::Completed);
        Ok(fights)
    }

    fn fight_exists_at(&self, tournament: TournamentId, at: DateTime<FixedOffset>) -> Result<bool> {
        Ok(self
            .read()
            .fights
            .iter()
            .any(|f| f.tournament_id == tournament && f.scheduled_at == at))
    }

    fn insert_fight(&self, fight: NewFight) -> Result<FightId> {
        let mut data = self.write();
        data.next_fight_id += 1;
        let id = FightId(data.next_fight_id);
        data.fights.push(fight.into_fight(id));
        Ok(id)
    }

    fn activate_due_fights(&self, tournament: TournamentId, now: DateTime<FixedOffset>) -> Result<Vec<FightId>> {
        let mut data = self.write();
        let mut activated = Vec::new();
        for fight in data.fights.iter_mut().filter(|f| f.tournament_id == tournament) {
            if fight.is_due(now) {
                fight.status = FightStatus::Active;
                activated.push(fight.id);
            }
        }
        Ok(activated)
    }

    fn expired_scheduled_fights(&self, tournament: TournamentId, now: DateTime<FixedOffset>) -> Result<Vec<Fight>> {
        let mut fights: Vec<Fight> = self
            .read()
            .fights
            .iter()
            .filter(|f| f.tournament_id == tournament && f.is_expired(now))
            .cloned()
            .collect();
        by_schedule(&mut fights);
        Ok(fights)
    }

    fn active_fights(&self) -> Result<Vec<Fight>> {
        let mut fights: Vec<Fight> = self
            .read()
            .fights
            .iter()
            .filter(|f| f.status == FightStatus::Active)
            .cloned()
            .collect();
        by_schedule(&mut fights);
        Ok(fights)
    }

    fn void_fight(&self, id: FightId, reason: &str, at: DateTime<FixedOffset>) -> Result<bool> {
        let mut data = self.write();
        let fight = data.fight_mut(id)?;
        if fight.status.is_terminal() {
            return Ok(false);
        }
        fight.status = FightStatus::Voided;
        fight.void_reason = Some(reason.to_string());
        fight.completed_at = Some(at);
        Ok(true)
    }

    fn record_result(&self, id: FightId, result: &FightResult) -> Result<bool> {
        let mut data = self.write();
        let fight = data.fight_mut(id)?;
        if fight.status.is_terminal() {
            return Ok(false);
        }
        fight.status = FightStatus::Completed;
        fight.winner_id = result.winner;
        fight.final_score1 = Some(result.score1);
        fight.final_score2 = Some(result.score2);
        fight.completed_at = Some(result.completed_at);
        Ok(true)
    }
}
