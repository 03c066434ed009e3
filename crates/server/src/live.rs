//! Live broadcast coordinator.
//!
//! Each active fight gets one task. Starting a fight first replays the ticks
//! that already elapsed on the wall clock without broadcasting anything, so
//! a fight picked up late (after a restart, say) resumes where it would have
//! been. If the replay alone ends the fight it is finalized on the spot.
//! Otherwise the task steps the fight once per tick period and fans every
//! action out through the [`Broadcaster`].
//!
//! The `live` map doubles as the double-start guard: a fight has an entry
//! exactly while some task owns it. The entry holds no state until the
//! catch-up replay is done, so nobody sees a half-replayed fight.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, FixedOffset};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::task::JoinHandle;

use spoodblort_engine::calendar::Calendar;
use spoodblort_engine::combat::{
    ActionSink, Bout, FightState, LiveAction, MAX_TICKS, TICK_DURATION_SECONDS, elapsed_ticks,
};
use spoodblort_engine::fight::{Fight, FightId};
use spoodblort_engine::fighter::Combatant;

use crate::broadcast::Broadcaster;
use crate::fight_log::FightLog;
use crate::finalize::Finalizer;
use crate::spectators::CLAP_ROUND_INTERVAL;
use crate::store::Repository;

pub const TICK_PERIOD: Duration = Duration::from_secs(TICK_DURATION_SECONDS as u64);

#[derive(Debug)]
pub enum LiveStart {
    /// Another task already owns this fight.
    AlreadyRunning,
    /// The elapsed time covered the whole fight; it has been finalized.
    FinishedDuringCatchUp,
    Running(JoinHandle<()>),
}

pub struct LiveCoordinator {
    repo: Arc<dyn Repository>,
    broadcaster: Arc<dyn Broadcaster>,
    finalizer: Arc<Finalizer>,
    calendar: Calendar,
    log_dir: Option<PathBuf>,
    live: DashMap<FightId, Option<FightState>>,
}

/// Releases a fight's claim when its task ends, however it ends.
struct LiveGuard {
    coordinator: Arc<LiveCoordinator>,
    fight: FightId,
}

impl Drop for LiveGuard {
    fn drop(&mut self) {
        self.coordinator.live.remove(&self.fight);
        self.coordinator.broadcaster.clear_claps(self.fight);
    }
}

/// Broadcasts each action and copies it into the fight log.
struct LiveSink<'a> {
    broadcaster: &'a dyn Broadcaster,
    fight: FightId,
    log: &'a mut Option<FightLog>,
}

impl ActionSink for LiveSink<'_> {
    fn emit(&mut self, action: LiveAction) {
        self.broadcaster.broadcast_action(self.fight, &action);
        if let Some(log) = self.log.as_mut() {
            if let Err(e) = log.action(&action) {
                tracing::warn!(fight = %self.fight, "fight log disabled: {:#}", e);
                *self.log = None;
            }
        }
    }
}

impl LiveCoordinator {
    pub fn new(
        repo: Arc<dyn Repository>,
        broadcaster: Arc<dyn Broadcaster>,
        finalizer: Arc<Finalizer>,
        calendar: Calendar,
        log_dir: Option<PathBuf>,
    ) -> Self {
        Self {
            repo,
            broadcaster,
            finalizer,
            calendar,
            log_dir,
            live: DashMap::new(),
        }
    }

    pub fn is_live(&self, fight: FightId) -> bool {
        self.live.contains_key(&fight)
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// State of a fight being broadcast right now. `None` while it is still
    /// being caught up.
    pub fn live_state(&self, fight: FightId) -> Option<FightState> {
        self.live.get(&fight).and_then(|s| s.clone())
    }

    /// Effective combatants for `fight`, with effects from its scheduled day.
    pub fn prepare_bout(&self, fight: &Fight) -> Result<Bout> {
        let (day_start, day_end) = self.calendar.day_bounds(fight.scheduled_at);
        let mut sides = Vec::with_capacity(2);
        for id in [fight.fighter1_id, fight.fighter2_id] {
            let fighter = self
                .repo
                .fighter(id)?
                .ok_or_else(|| anyhow!("fighter {} of fight {} not found", id, fight.id))?;
            let effects = self
                .repo
                .effects_between(id, day_start, day_end)
                .with_context(|| format!("loading effects for fighter {}", id))?;
            sides.push(Combatant::prepare(&fighter, &effects));
        }
        let two = sides.pop().ok_or_else(|| anyhow!("missing fighter 2"))?;
        let one = sides.pop().ok_or_else(|| anyhow!("missing fighter 1"))?;
        Ok(Bout::new(fight.id, one, two))
    }

    /// Where `fight` stands at `now`: the live state if it is running,
    /// otherwise a quiet replay of the elapsed ticks.
    pub fn catch_up_state(&self, fight: &Fight, now: DateTime<FixedOffset>) -> Result<FightState> {
        if let Some(state) = self.live_state(fight.id) {
            return Ok(state);
        }
        let bout = self.prepare_bout(fight)?;
        Ok(bout.replay_to(elapsed_ticks(fight.scheduled_at, now)))
    }

    fn claim(self: &Arc<Self>, fight: FightId) -> Option<LiveGuard> {
        match self.live.entry(fight) {
            Entry::Occupied(_) => None,
            Entry::Vacant(slot) => {
                slot.insert(None);
                Some(LiveGuard { coordinator: Arc::clone(self), fight })
            }
        }
    }

    /// Begin broadcasting `fight`, caught up to `now`. Starting a fight that
    /// is already running does nothing.
    pub fn start(self: &Arc<Self>, fight: Fight, now: DateTime<FixedOffset>) -> Result<LiveStart> {
        let Some(guard) = self.claim(fight.id) else {
            tracing::debug!(fight = %fight.id, "already live");
            return Ok(LiveStart::AlreadyRunning);
        };

        let bout = self.prepare_bout(&fight)?;
        let mut state = bout.replay_to(elapsed_ticks(fight.scheduled_at, now));
        if state.is_complete || state.tick >= MAX_TICKS {
            bout.judges_decision(&mut state);
            tracing::info!(fight = %fight.id, tick = state.tick, "finished during catch-up");
            self.finalizer.complete(&fight, &state, None, now)?;
            return Ok(LiveStart::FinishedDuringCatchUp);
        }
        self.live.insert(fight.id, Some(state.clone()));

        let log = self.log_dir.as_ref().and_then(|dir| {
            let tournament = self.repo.tournament(fight.tournament_id).ok().flatten();
            match FightLog::create(dir, &fight, tournament.as_ref()) {
                Ok(log) => Some(log),
                Err(e) => {
                    tracing::warn!(fight = %fight.id, "no fight log: {:#}", e);
                    None
                }
            }
        });

        // Line the first live tick up with its slot on the wall clock.
        let next_tick_at = fight.scheduled_at
            + chrono::Duration::seconds((state.tick as i64 + 1) * TICK_DURATION_SECONDS);
        let delay = (next_tick_at - now).to_std().unwrap_or(Duration::ZERO);

        tracing::info!(
            fight = %fight.id,
            tick = state.tick,
            "going live: {} vs {}",
            fight.fighter1_name,
            fight.fighter2_name
        );
        let this = Arc::clone(self);
        let handle = tokio::spawn(async move {
            this.run_live(fight, bout, state, log, delay, guard).await;
        });
        Ok(LiveStart::Running(handle))
    }

    async fn run_live(
        self: Arc<Self>,
        fight: Fight,
        bout: Bout,
        mut state: FightState,
        mut log: Option<FightLog>,
        delay: Duration,
        _guard: LiveGuard,
    ) {
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + delay, TICK_PERIOD);
        self.broadcaster.broadcast_viewer_count(fight.id);

        loop {
            ticker.tick().await;
            let previous_round = state.round;
            let mut sink = LiveSink {
                broadcaster: self.broadcaster.as_ref(),
                fight: fight.id,
                log: &mut log,
            };
            if !bout.step(&mut state, &mut sink) {
                break;
            }
            self.live.insert(fight.id, Some(state.clone()));

            if state.round != previous_round && previous_round % CLAP_ROUND_INTERVAL == 0 {
                let totals = self.broadcaster.round_clap_totals(fight.id, previous_round);
                self.broadcaster.broadcast_clap_summary(fight.id, &totals);
                self.broadcaster.reset_round_claps(fight.id, previous_round);
            }
            if state.is_complete || state.tick >= MAX_TICKS {
                break;
            }
        }

        bout.judges_decision(&mut state);
        self.live.insert(fight.id, Some(state.clone()));
        if let Err(e) = self.finalizer.complete(&fight, &state, log, self.calendar.now()) {
            tracing::error!(fight = %fight.id, "failed to finalize: {:#}", e);
        }
    }

    /// Make sure every active fight is either running or finished.
    /// Returns how many were started.
    pub fn process_active(self: &Arc<Self>, now: DateTime<FixedOffset>) -> Result<usize> {
        let mut started = 0;
        for fight in self.repo.active_fights()? {
            if self.is_live(fight.id) {
                continue;
            }
            let id = fight.id;
            match self.start(fight, now) {
                Ok(LiveStart::Running(_)) => started += 1,
                Ok(_) => {}
                Err(e) => tracing::error!(fight = %id, "failed to start: {:#}", e),
            }
        }
        Ok(started)
    }
}
