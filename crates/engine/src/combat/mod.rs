//! Deterministic tick-based combat.
//!
//! A fight is a sequence of ticks. Each tick draws a fresh stream keyed by
//! `(fight, tick)`, so any tick can be recomputed in isolation and a fight
//! replayed from the start always lands on the same state.
//!
//! The quiet and broadcasting variants share one tick core
//! ([`tick::simulate_tick_with`]); they differ only in the [`ActionSink`]
//! they pass, which decides whether descriptive events are built at all.

pub mod action;
pub mod bout;
pub mod commentary;
pub mod odds;
pub mod state;
pub mod tick;

pub use action::{ActionKind, LiveAction};
pub use bout::{Bout, elapsed_ticks};
pub use state::{FightState, Finish, Lane};
pub use tick::{ActionSink, Frenzy, Quiet, simulate_tick, simulate_tick_with};

// ── Tuning constants ────────────────────────────────────────────────────────

/// Wall-clock length of one tick.
pub const TICK_DURATION_SECONDS: i64 = 5;

/// A fight runs for at most this long before the judges decide.
pub const FIGHT_DURATION_SECONDS: i64 = 30 * 60;

/// Hard tick ceiling: 360.
pub const MAX_TICKS: u32 = (FIGHT_DURATION_SECONDS / TICK_DURATION_SECONDS) as u32;

/// A new round starts after every this many ticks.
pub const TICKS_PER_ROUND: u32 = 6;

pub const STARTING_HEALTH: i32 = 100_000;

/// One in this many damage-taking ticks is instantly fatal.
pub const DEATH_CHANCE: u32 = 100_000;

/// One in this many eligible ticks the trailing side attempts a comeback crit.
pub const CRIT_CHANCE: u32 = 2;

/// Minimum health gap before the trailing side may crit.
pub const CRIT_THRESHOLD: i32 = 3_000;

/// Bonus damage by number of natural 20s on five d20s.
pub const CRIT_DAMAGE_TABLE: [i32; 6] = [0, 5_000, 10_000, 15_000, 20_000, 100_000];

pub const CRIT_DICE: usize = 5;

pub const MIN_DAMAGE: i32 = 10;
pub const MAX_DAMAGE: i32 = 500;

/// One in this many ticks an undead fighter frenzies.
pub const FRENZY_CHANCE: u32 = 4;

pub const FRENZY_MULTIPLIERS: [i32; 3] = [2, 3, 4];
