//! Playoff fixtures that follow the group stage.

use std::collections::HashMap;

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate};

use super::round_robin::group_of;
use crate::calendar::{Calendar, SPECIAL_DAY};
use crate::fight::{Fight, FightStatus};
use crate::fighter::FighterId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlayoffSlot {
    /// Group A winner vs group B winner.
    SemifinalOne,
    /// Group C winner vs group D winner.
    SemifinalTwo,
    Final,
}

impl PlayoffSlot {
    pub const ALL: [PlayoffSlot; 3] = [PlayoffSlot::SemifinalOne, PlayoffSlot::SemifinalTwo, PlayoffSlot::Final];

    pub fn time_of_day(self) -> (u32, u32) {
        match self {
            PlayoffSlot::SemifinalOne => (22, 30),
            PlayoffSlot::SemifinalTwo => (23, 0),
            PlayoffSlot::Final => (23, 30),
        }
    }

    /// Group indices feeding a semifinal.
    pub fn feeder_groups(self) -> Option<(usize, usize)> {
        match self {
            PlayoffSlot::SemifinalOne => Some((0, 1)),
            PlayoffSlot::SemifinalTwo => Some((2, 3)),
            PlayoffSlot::Final => None,
        }
    }

    pub fn at(self, calendar: &Calendar, date: NaiveDate) -> DateTime<FixedOffset> {
        let (hour, minute) = self.time_of_day();
        calendar.at(date, hour, minute)
    }

    pub fn label(self) -> &'static str {
        match self {
            PlayoffSlot::SemifinalOne => "semifinal 1",
            PlayoffSlot::SemifinalTwo => "semifinal 2",
            PlayoffSlot::Final => "final",
        }
    }
}

/// Fights of one group: those sitting on its slots.
pub fn group_fights<'a>(fights: &'a [Fight], calendar: &Calendar, date: NaiveDate, group: usize) -> Vec<&'a Fight> {
    fights
        .iter()
        .filter(|f| group_of(calendar, date, f.scheduled_at) == Some(group))
        .collect()
}

/// The fight sitting on a playoff slot, if it exists.
pub fn fight_at<'a>(fights: &'a [Fight], calendar: &Calendar, date: NaiveDate, slot: PlayoffSlot) -> Option<&'a Fight> {
    let at = slot.at(calendar, date);
    fights.iter().find(|f| f.scheduled_at == at)
}

/// Whether `fight` is the special-day final.
pub fn is_championship(fight: &Fight, calendar: &Calendar) -> bool {
    let local = calendar.local(fight.scheduled_at);
    local.weekday() == SPECIAL_DAY && fight.scheduled_at == PlayoffSlot::Final.at(calendar, local.date_naive())
}

#[derive(Debug, Default, Clone, Copy)]
struct Standing {
    wins: u32,
    differential: i64,
    first_win: Option<DateTime<FixedOffset>>,
}

/// Resolve a group once every one of its fights is over.
///
/// Only fighters with at least one win qualify. Ties go to the larger
/// score differential, then the earlier first win, then the lower id.
/// `None` while any fight is still pending or if nobody won anything.
pub fn group_winner(fights: &[&Fight]) -> Option<FighterId> {
    if fights.is_empty() || fights.iter().any(|f| !f.status.is_terminal()) {
        return None;
    }

    let mut standings: HashMap<FighterId, Standing> = HashMap::new();
    for fight in fights.iter().filter(|f| f.status == FightStatus::Completed) {
        let s1 = fight.final_score1.unwrap_or(0) as i64;
        let s2 = fight.final_score2.unwrap_or(0) as i64;
        standings.entry(fight.fighter1_id).or_default().differential += s1 - s2;
        standings.entry(fight.fighter2_id).or_default().differential += s2 - s1;

        if let Some(winner) = fight.winner_id {
            let when = fight.completed_at.unwrap_or(fight.scheduled_at);
            let standing = standings.entry(winner).or_default();
            standing.wins += 1;
            standing.first_win = Some(match standing.first_win {
                Some(existing) if existing <= when => existing,
                _ => when,
            });
        }
    }

    standings
        .into_iter()
        .filter(|(_, s)| s.wins > 0)
        .min_by(|(id_a, a), (id_b, b)| {
            b.wins
                .cmp(&a.wins)
                .then(b.differential.cmp(&a.differential))
                .then(a.first_win.cmp(&b.first_win))
                .then(id_a.cmp(id_b))
        })
        .map(|(id, _)| id)
}
