//! The tick core shared by every simulation path.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::action::LiveAction;
use super::commentary;
use super::state::{FightState, Finish, Lane};
use super::{
    CRIT_CHANCE, CRIT_DAMAGE_TABLE, CRIT_DICE, CRIT_THRESHOLD, DEATH_CHANCE, FRENZY_CHANCE,
    FRENZY_MULTIPLIERS, MAX_DAMAGE, MIN_DAMAGE, STARTING_HEALTH,
};
use crate::fight::FightId;
use crate::fighter::{Combatant, Stat, Stats};
use crate::rng;

/// Receives the descriptive events a tick produces.
///
/// Sinks never feed anything back into the state machine, so a tick leaves
/// the same [`FightState`] behind whichever sink it was given.
pub trait ActionSink {
    /// When `false` no events are built at all.
    fn enabled(&self) -> bool {
        true
    }

    fn emit(&mut self, action: LiveAction);
}

/// Sink for catch-up and bulk runs: builds nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct Quiet;

impl ActionSink for Quiet {
    fn enabled(&self) -> bool {
        false
    }

    fn emit(&mut self, _action: LiveAction) {}
}

impl ActionSink for Vec<LiveAction> {
    fn emit(&mut self, action: LiveAction) {
        self.push(action);
    }
}

/// An undead fighter trading one attribute for a damage multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frenzy {
    pub zeroed: Stat,
    pub multiplier: i32,
}

/// Quiet variant: advance `state` by tick `tick` without building events.
pub fn simulate_tick(
    fight_id: FightId,
    tick: u32,
    one: &Combatant,
    two: &Combatant,
    state: &mut FightState,
) {
    simulate_tick_with(fight_id, tick, one, two, state, &mut Quiet);
}

/// Advance `state` by tick `tick`, handing any events to `sink`.
///
/// A finished state is left untouched.
pub fn simulate_tick_with<S: ActionSink + ?Sized>(
    fight_id: FightId,
    tick: u32,
    one: &Combatant,
    two: &Combatant,
    state: &mut FightState,
    sink: &mut S,
) {
    if state.is_complete {
        return;
    }
    let side = |lane: Lane| match lane {
        Lane::One => one,
        Lane::Two => two,
    };

    let mut rng = rng::seeded(rng::fight_tick_seed(fight_id, tick));
    let mut stats1 = one.stats;
    let mut stats2 = two.stats;

    let mut advantage = exchange_winner(&stats1, &stats2, &mut rng);
    let frenzy1 = roll_frenzy(one.is_undead, &mut stats1, &mut rng);
    if frenzy1.is_some() {
        advantage = exchange_winner(&stats1, &stats2, &mut rng);
    }
    let frenzy2 = roll_frenzy(two.is_undead, &mut stats2, &mut rng);
    if frenzy2.is_some() {
        advantage = exchange_winner(&stats1, &stats2, &mut rng);
    }

    let mut base1 = base_damage(&stats1, &mut rng);
    let mut base2 = base_damage(&stats2, &mut rng);
    if let Some(frenzy) = frenzy1 {
        base1 *= frenzy.multiplier;
    }
    if let Some(frenzy) = frenzy2 {
        base2 *= frenzy.multiplier;
    }

    // Winner hits for 150%, loser for a third.
    let (dealt1, dealt2) = match advantage {
        Lane::One => (base1 + base1 / 2, base2 / 3),
        Lane::Two => (base1 / 3, base2 + base2 / 2),
    };

    state.tick = tick;
    state.health1 -= dealt2;
    state.health2 -= dealt1;
    state.last_damage1 = dealt2;
    state.last_damage2 = dealt1;
    state.clamp_health();

    if sink.enabled() {
        let mut action = commentary::exchange_action(fight_id, tick, one, two, state);
        action.frenzy1 = frenzy1;
        action.frenzy2 = frenzy2;
        sink.emit(action);
    }

    for (lane, taken) in [(Lane::One, dealt2), (Lane::Two, dealt1)] {
        if taken > 0 && check_death(&mut rng) {
            let (winner, loser) = (side(lane.other()), side(lane));
            tracing::debug!(fight = %fight_id, tick, "{} died from damage", loser.name);
            state.finish(Some(winner.id), Finish::Death);
            if sink.enabled() {
                sink.emit(commentary::death_action(fight_id, winner, loser, state));
            }
            return;
        }
    }

    let gap = state.health2 - state.health1;
    let trailing = if gap >= CRIT_THRESHOLD {
        Some(Lane::One)
    } else if gap <= -CRIT_THRESHOLD {
        Some(Lane::Two)
    } else {
        None
    };

    if let Some(attacker_lane) = trailing {
        if rng.gen_range(0..CRIT_CHANCE) == 0 {
            let bonus = crit_damage(&mut rng);
            if bonus > 0 {
                let victim_lane = attacker_lane.other();
                let (attacker, victim) = (side(attacker_lane), side(victim_lane));

                *state.health_mut(victim_lane) -= bonus;
                *state.last_damage_mut(victim_lane) += bonus;
                // Lifesteal, unless the victim is undead.
                if !victim.is_undead {
                    let healed = state.health(attacker_lane).saturating_add(bonus / 2);
                    *state.health_mut(attacker_lane) = healed.min(STARTING_HEALTH);
                }
                state.clamp_health();

                if sink.enabled() {
                    sink.emit(commentary::comeback_crit_action(attacker, victim, bonus, state));
                }

                if check_death(&mut rng) {
                    state.finish(Some(attacker.id), Finish::Death);
                    if sink.enabled() {
                        sink.emit(commentary::death_action(fight_id, attacker, victim, state));
                    }
                    return;
                }
            }
        }
    }

    for lane in [Lane::One, Lane::Two] {
        if state.health(lane) <= 0 {
            let (winner, loser) = (side(lane.other()), side(lane));
            tracing::debug!(fight = %fight_id, tick, "{} won by KO", winner.name);
            state.finish(Some(winner.id), Finish::Knockout);
            if sink.enabled() {
                sink.emit(commentary::knockout_action(fight_id, winner, loser, state));
            }
            return;
        }
    }
}

// ── Rolls ───────────────────────────────────────────────────────────────────

/// Weighted coin-flip contest on one random attribute.
///
/// Each side flips one fair coin per attribute point; more heads wins the
/// exchange and an exact tie goes to one more coin. Negative attributes
/// flip no coins.
pub fn exchange_winner<R: Rng + ?Sized>(stats1: &Stats, stats2: &Stats, rng: &mut R) -> Lane {
    let stat = Stat::ALL[rng.gen_range(0..Stat::ALL.len())];
    let heads1 = count_heads(stats1.get(stat), rng);
    let heads2 = count_heads(stats2.get(stat), rng);
    match heads1.cmp(&heads2) {
        std::cmp::Ordering::Greater => Lane::One,
        std::cmp::Ordering::Less => Lane::Two,
        std::cmp::Ordering::Equal => {
            if rng.gen_range(0..2) == 0 {
                Lane::One
            } else {
                Lane::Two
            }
        }
    }
}

fn count_heads<R: Rng + ?Sized>(flips: i32, rng: &mut R) -> u32 {
    let mut heads = 0;
    for _ in 0..flips.max(0) {
        if rng.gen_range(0..2) == 0 {
            heads += 1;
        }
    }
    heads
}

/// Base damage in `[MIN_DAMAGE, MAX_DAMAGE)`, scaled by strength.
pub fn base_damage<R: Rng + ?Sized>(stats: &Stats, rng: &mut R) -> i32 {
    let roll = MIN_DAMAGE + rng.gen_range(0..MAX_DAMAGE - MIN_DAMAGE);
    let multiplier = 1.0 + (stats.strength.max(0) as f64 / 100.0) * 0.5;
    ((roll as f64 * multiplier) as i32).max(MIN_DAMAGE)
}

/// Five d20, counting natural 20s, looked up in [`CRIT_DAMAGE_TABLE`].
pub fn crit_damage<R: Rng + ?Sized>(rng: &mut R) -> i32 {
    let mut successes = 0;
    for _ in 0..CRIT_DICE {
        if rng.gen_range(1..=20) == 20 {
            successes += 1;
        }
    }
    CRIT_DAMAGE_TABLE[successes]
}

fn check_death<R: Rng + ?Sized>(rng: &mut R) -> bool {
    rng.gen_range(0..DEATH_CHANCE) == 0
}

fn roll_frenzy<R: Rng + ?Sized>(is_undead: bool, stats: &mut Stats, rng: &mut R) -> Option<Frenzy> {
    if !is_undead || rng.gen_range(0..FRENZY_CHANCE) != 0 {
        return None;
    }
    let zeroed = Stat::ALL[rng.gen_range(0..Stat::ALL.len())];
    stats.set(zeroed, 0);
    let multiplier = FRENZY_MULTIPLIERS[rng.gen_range(0..FRENZY_MULTIPLIERS.len())];
    Some(Frenzy { zeroed, multiplier })
}
