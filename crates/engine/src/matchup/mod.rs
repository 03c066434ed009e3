//! Matchup generation: the daily card and the special-day round-robin that
//! feeds a playoff bracket.
//!
//! Generators are pure functions of the fighter pool, the date and the
//! tournament. They never store anything; the schedule manager inserts what
//! they return.

use std::fmt;

use thiserror::Error;

pub mod daily;
pub mod playoff;
pub mod round_robin;

pub use daily::{generate_daily_card, select_daily_fighters};
pub use playoff::{PlayoffSlot, group_winner};
pub use round_robin::{RoundRobinCard, generate_round_robin, rank_weekly_winners};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardKind {
    Daily,
    RoundRobin,
}

impl fmt::Display for CardKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CardKind::Daily => f.write_str("daily card"),
            CardKind::RoundRobin => f.write_str("round-robin groups"),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MatchupError {
    #[error("need at least {needed} fighters for the {card} (got {got})")]
    InsufficientEntrants { card: CardKind, needed: usize, got: usize },
}
