//! Running a fight tick by tick: catch-up, live stepping and full runs.

use chrono::{DateTime, FixedOffset};

use super::commentary;
use super::state::{FightState, Finish};
use super::tick::{ActionSink, Quiet, simulate_tick_with};
use super::{MAX_TICKS, TICK_DURATION_SECONDS, TICKS_PER_ROUND};
use crate::fight::FightId;
use crate::fighter::Combatant;

/// A fight ready to simulate: its id plus both effective combatants.
///
/// Every path that advances a fight (full run, catch-up, live loop) goes
/// through [`Bout::step`], so they all agree on tick and round bookkeeping.
#[derive(Debug, Clone)]
pub struct Bout {
    pub fight_id: FightId,
    pub one: Combatant,
    pub two: Combatant,
}

impl Bout {
    pub fn new(fight_id: FightId, one: Combatant, two: Combatant) -> Self {
        Self { fight_id, one, two }
    }

    /// Simulate the next tick. Returns `false` when the fight is over or has
    /// hit the tick ceiling, in which case nothing was simulated.
    pub fn step<S: ActionSink + ?Sized>(&self, state: &mut FightState, sink: &mut S) -> bool {
        if state.is_complete || state.tick >= MAX_TICKS {
            return false;
        }
        let tick = state.tick + 1;
        simulate_tick_with(self.fight_id, tick, &self.one, &self.two, state, sink);

        if !state.is_complete && tick % TICKS_PER_ROUND == 0 {
            state.round += 1;
            if sink.enabled() {
                sink.emit(commentary::round_action(state));
            }
        }
        true
    }

    /// Quietly advance `state` up to `target_tick` (capped at the ceiling).
    pub fn catch_up(&self, state: &mut FightState, target_tick: u32) {
        let target = target_tick.min(MAX_TICKS);
        while state.tick < target && self.step(state, &mut Quiet) {}
    }

    /// Fresh state caught up to `target_tick`.
    pub fn replay_to(&self, target_tick: u32) -> FightState {
        let mut state = FightState::new();
        self.catch_up(&mut state, target_tick);
        state
    }

    /// Quiet full run, ending in a judges' decision if nobody was finished.
    pub fn run_to_completion(&self) -> FightState {
        self.run_with(&mut Quiet)
    }

    /// Full run handing every event to `sink`.
    pub fn run_with<S: ActionSink + ?Sized>(&self, sink: &mut S) -> FightState {
        let mut state = FightState::new();
        while self.step(&mut state, sink) {}
        self.judges_decision(&mut state);
        state
    }

    /// Settle a fight that went the distance: more health wins, equal health
    /// is a draw. Finished fights are left alone.
    pub fn judges_decision(&self, state: &mut FightState) {
        if state.is_complete {
            return;
        }
        match state.leader() {
            Some(super::Lane::One) => state.finish(Some(self.one.id), Finish::Decision),
            Some(super::Lane::Two) => state.finish(Some(self.two.id), Finish::Decision),
            None => state.finish(None, Finish::Draw),
        }
        tracing::debug!(fight = %self.fight_id, "went to the judges: {:?}", state.finish);
    }
}

/// Whole ticks between `scheduled` and `now`, clamped to `[0, MAX_TICKS]`.
pub fn elapsed_ticks(scheduled: DateTime<FixedOffset>, now: DateTime<FixedOffset>) -> u32 {
    let seconds = (now - scheduled).num_seconds();
    (seconds / TICK_DURATION_SECONDS).clamp(0, MAX_TICKS as i64) as u32
}
