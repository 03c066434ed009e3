//! Seeded random streams.
//!
//! Every random decision in the engine draws from a stream keyed by a stable
//! integer, so replaying the same key always yields the same rolls.

use chrono::{DateTime, Datelike, NaiveDate, TimeZone};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

use crate::fight::{FightId, TournamentId};

/// The generator behind every seeded stream.
pub type FightRng = ChaCha20Rng;

/// Tick numbers are folded into the fight id below this multiplier.
pub const TICK_SEED_STRIDE: i64 = 1_000_000;

/// Tick slot reserved for death announcements.
pub const DEATH_SEED_TICK: u32 = 999_999;

/// Open a reproducible stream for `key`.
pub fn seeded(key: i64) -> FightRng {
    ChaCha20Rng::seed_from_u64(key as u64)
}

/// Key for the rolls of one combat tick.
pub fn fight_tick_seed(fight: FightId, tick: u32) -> i64 {
    fight.0.wrapping_mul(TICK_SEED_STRIDE).wrapping_add(tick as i64)
}

/// Key for the daily fighter shuffle.
pub fn daily_seed(date: NaiveDate) -> i64 {
    date.year() as i64 * 10_000 + date.ordinal() as i64
}

/// Key for the fighter1/fighter2 orientation flips of a card.
pub fn pairing_flip_seed(date: NaiveDate, tournament: TournamentId) -> i64 {
    daily_seed(date) ^ tournament.0
}

/// Void reasons are cosmetic, so wall-clock seconds are good enough.
pub fn void_reason_seed<Tz: TimeZone>(now: &DateTime<Tz>) -> i64 {
    now.timestamp()
}
