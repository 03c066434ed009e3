//! Monte Carlo win estimates.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::bout::Bout;
use crate::fight::FightId;
use crate::fighter::Combatant;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Odds {
    pub fighter1: f64,
    pub fighter2: f64,
    pub draw: f64,
    pub samples: usize,
}

#[derive(Default, Clone, Copy)]
struct Tally {
    one: usize,
    two: usize,
    draw: usize,
}

/// Simulate `samples` independent full fights and report outcome rates.
///
/// Sample `i` replays as fight `base_seed + i`, so the estimate is itself
/// reproducible.
pub fn estimate_odds(one: &Combatant, two: &Combatant, samples: usize, base_seed: i64) -> Odds {
    let tally = (0..samples)
        .into_par_iter()
        .map(|i| {
            let bout = Bout::new(FightId(base_seed.wrapping_add(i as i64)), one.clone(), two.clone());
            let state = bout.run_to_completion();
            match state.winner {
                Some(id) if id == one.id => Tally { one: 1, ..Tally::default() },
                Some(id) if id == two.id => Tally { two: 1, ..Tally::default() },
                _ => Tally { draw: 1, ..Tally::default() },
            }
        })
        .reduce(Tally::default, |a, b| Tally {
            one: a.one + b.one,
            two: a.two + b.two,
            draw: a.draw + b.draw,
        });

    let rate = |n: usize| if samples == 0 { 0.0 } else { n as f64 / samples as f64 };
    Odds {
        fighter1: rate(tally.one),
        fighter2: rate(tally.two),
        draw: rate(tally.draw),
        samples,
    }
}
