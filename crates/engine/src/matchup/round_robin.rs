//! Special-day group stage.
//!
//! Entrants are dealt into four groups. Each group plays its canonical
//! pairings on repeat, one fight per hour. The groups are interleaved a
//! quarter hour apart, so a fight starts every 15 minutes from 10:00 and
//! no fighter is ever booked into two fights inside the same 30-minute
//! window. The last group fight ends by the first semifinal.

use std::collections::HashMap;

use chrono::{DateTime, Duration, FixedOffset, NaiveDate};
use rand::Rng;

use super::{CardKind, MatchupError};
use crate::calendar::Calendar;
use crate::fight::{Fight, FightStatus, NewFight, Tournament};
use crate::fighter::{Fighter, FighterId};
use crate::rng;

pub const GROUP_COUNT: usize = 4;
pub const GROUP_LABELS: [char; GROUP_COUNT] = ['A', 'B', 'C', 'D'];

/// Entrant counts the bracket supports, largest first.
pub const SUPPORTED_ENTRANTS: [usize; 3] = [16, 12, 8];
pub const MIN_ENTRANTS: usize = 8;

pub const SLOTS_PER_GROUP: usize = 12;
/// Minutes between consecutive fights of one group.
pub const SLOT_SPACING_MINUTES: i64 = 60;
/// Offset of each group inside an hour.
pub const GROUP_STAGGER_MINUTES: i64 = 15;

pub const GROUP_START_HOUR: u32 = 10;
pub const GROUP_START_MINUTE: u32 = 0;

/// Pairings by group size, as indices into the group.
pub fn canonical_order(size: usize) -> &'static [(usize, usize)] {
    match size {
        2 => &[(0, 1)],
        3 => &[(0, 1), (1, 2), (0, 2)],
        4 => &[(0, 1), (2, 3), (0, 2), (1, 3), (0, 3), (1, 2)],
        _ => &[],
    }
}

#[derive(Debug, Clone)]
pub struct Group {
    pub label: char,
    pub members: Vec<Fighter>,
}

#[derive(Debug, Clone)]
pub struct RoundRobinCard {
    pub groups: Vec<Group>,
    pub fights: Vec<NewFight>,
}

/// Start time of `slot` for `group` on `date`.
pub fn group_slot_at(calendar: &Calendar, date: NaiveDate, group: usize, slot: usize) -> DateTime<FixedOffset> {
    calendar.at(date, GROUP_START_HOUR, GROUP_START_MINUTE)
        + Duration::minutes(group as i64 * GROUP_STAGGER_MINUTES + slot as i64 * SLOT_SPACING_MINUTES)
}

/// The group whose slot starts exactly at `at`, if any.
pub fn group_of(calendar: &Calendar, date: NaiveDate, at: DateTime<FixedOffset>) -> Option<usize> {
    let offset = at - calendar.at(date, GROUP_START_HOUR, GROUP_START_MINUTE);
    let minutes = offset.num_minutes();
    if minutes < 0 || offset != Duration::minutes(minutes) {
        return None;
    }
    let slot = (minutes / SLOT_SPACING_MINUTES) as usize;
    let phase = minutes % SLOT_SPACING_MINUTES;
    let group = (phase / GROUP_STAGGER_MINUTES) as usize;
    (slot < SLOTS_PER_GROUP && phase % GROUP_STAGGER_MINUTES == 0 && group < GROUP_COUNT).then_some(group)
}

/// Deal the strongest supported number of entrants into groups.
///
/// Entrants are expected in seeding order; `i % 4` dealing spreads the top
/// seeds across groups.
pub fn deal_groups(entrants: &[Fighter]) -> Result<Vec<Group>, MatchupError> {
    let take = SUPPORTED_ENTRANTS
        .iter()
        .copied()
        .find(|&n| entrants.len() >= n)
        .ok_or(MatchupError::InsufficientEntrants {
            card: CardKind::RoundRobin,
            needed: MIN_ENTRANTS,
            got: entrants.len(),
        })?;

    let mut groups: Vec<Group> = GROUP_LABELS
        .iter()
        .map(|&label| Group { label, members: Vec::new() })
        .collect();
    for (i, fighter) in entrants.iter().take(take).enumerate() {
        groups[i % GROUP_COUNT].members.push(fighter.clone());
    }
    Ok(groups)
}

/// Build the group stage for `date`.
pub fn generate_round_robin(
    tournament: &Tournament,
    entrants: &[Fighter],
    date: NaiveDate,
    calendar: &Calendar,
) -> Result<RoundRobinCard, MatchupError> {
    let groups = deal_groups(entrants)?;
    let mut flip = rng::seeded(rng::pairing_flip_seed(date, tournament.id));
    let mut fights = Vec::with_capacity(GROUP_COUNT * SLOTS_PER_GROUP);

    for (index, group) in groups.iter().enumerate() {
        let order = canonical_order(group.members.len());
        for slot in 0..SLOTS_PER_GROUP {
            let (a, b) = order[slot % order.len()];
            let (first, second) = if flip.gen_range(0..2) == 1 {
                (&group.members[b], &group.members[a])
            } else {
                (&group.members[a], &group.members[b])
            };
            let at = group_slot_at(calendar, date, index, slot);
            fights.push(NewFight::between(tournament.id, first, second, at));
        }
    }

    fights.sort_by_key(|f| f.scheduled_at);
    Ok(RoundRobinCard { groups, fights })
}

/// Winners of completed fights, by win count descending then id.
pub fn rank_weekly_winners(completed: &[Fight]) -> Vec<(FighterId, u32)> {
    let mut wins: HashMap<FighterId, u32> = HashMap::new();
    for fight in completed {
        if fight.status != FightStatus::Completed {
            continue;
        }
        if let Some(winner) = fight.winner_id {
            *wins.entry(winner).or_default() += 1;
        }
    }
    let mut ranked: Vec<(FighterId, u32)> = wins.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    ranked
}
