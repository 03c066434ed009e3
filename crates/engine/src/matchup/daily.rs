use chrono::{Duration, NaiveDate};
use rand::Rng;

use super::{CardKind, MatchupError};
use crate::calendar::Calendar;
use crate::fight::{NewFight, Tournament};
use crate::fighter::Fighter;
use crate::rng;

/// Most fighters booked on one daily card.
pub const MAX_DAILY_FIGHTERS: usize = 48;

pub const DAILY_START_HOUR: u32 = 12;
pub const DAILY_START_MINUTE: u32 = 0;
pub const DAILY_SPACING_MINUTES: i64 = 30;

/// Shuffle the eligible pool with the day's seed and cap it.
///
/// The pool is put in id order first so the result does not depend on the
/// order the repository happened to return.
pub fn select_daily_fighters(pool: &[Fighter], date: NaiveDate) -> Vec<Fighter> {
    let mut fighters: Vec<Fighter> = pool.iter().filter(|f| f.is_eligible()).cloned().collect();
    fighters.sort_by_key(|f| f.id);

    let mut rng = rng::seeded(rng::daily_seed(date));
    for i in (1..fighters.len()).rev() {
        let j = rng.gen_range(0..=i);
        fighters.swap(i, j);
    }
    fighters.truncate(MAX_DAILY_FIGHTERS);
    fighters
}

/// Pair the day's fighters into a card.
///
/// An odd fighter out is dropped, the rest are ordered by stat total (id
/// breaks ties) and neighbours fight each other. Which of the two is
/// fighter 1 is a reproducible coin flip.
pub fn generate_daily_card(
    tournament: &Tournament,
    fighters: &[Fighter],
    date: NaiveDate,
    calendar: &Calendar,
) -> Result<Vec<NewFight>, MatchupError> {
    if fighters.len() < 2 {
        return Err(MatchupError::InsufficientEntrants {
            card: CardKind::Daily,
            needed: 2,
            got: fighters.len(),
        });
    }

    let mut pool = fighters.to_vec();
    if pool.len() % 2 != 0 {
        pool.pop();
    }
    pool.sort_by_key(|f| (f.stats.total(), f.id));

    let mut flip = rng::seeded(rng::pairing_flip_seed(date, tournament.id));
    let start = calendar.at(date, DAILY_START_HOUR, DAILY_START_MINUTE);

    let fights = pool
        .chunks_exact(2)
        .enumerate()
        .map(|(slot, pair)| {
            let (first, second) = if flip.gen_range(0..2) == 1 {
                (&pair[1], &pair[0])
            } else {
                (&pair[0], &pair[1])
            };
            let at = start + Duration::minutes(slot as i64 * DAILY_SPACING_MINUTES);
            NewFight::between(tournament.id, first, second, at)
        })
        .collect();
    Ok(fights)
}
