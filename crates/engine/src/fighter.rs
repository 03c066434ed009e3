//! Fighters, their combat attributes and the per-fight effects layered on top.

use std::fmt;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Stable identity of a fighter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FighterId(pub i64);

impl fmt::Display for FighterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The four combat attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stat {
    Strength,
    Speed,
    Endurance,
    Technique,
}

impl Stat {
    /// Fixed order used whenever a stat is picked by index.
    pub const ALL: [Stat; 4] = [Stat::Strength, Stat::Speed, Stat::Endurance, Stat::Technique];

    pub fn name(self) -> &'static str {
        match self {
            Stat::Strength => "strength",
            Stat::Speed => "speed",
            Stat::Endurance => "endurance",
            Stat::Technique => "technique",
        }
    }
}

impl fmt::Display for Stat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Stats {
    pub strength: i32,
    pub speed: i32,
    pub endurance: i32,
    pub technique: i32,
}

impl Stats {
    pub const fn new(strength: i32, speed: i32, endurance: i32, technique: i32) -> Self {
        Self { strength, speed, endurance, technique }
    }

    /// Same value in every attribute.
    pub const fn uniform(value: i32) -> Self {
        Self::new(value, value, value, value)
    }

    pub fn get(&self, stat: Stat) -> i32 {
        match stat {
            Stat::Strength => self.strength,
            Stat::Speed => self.speed,
            Stat::Endurance => self.endurance,
            Stat::Technique => self.technique,
        }
    }

    pub fn set(&mut self, stat: Stat, value: i32) {
        match stat {
            Stat::Strength => self.strength = value,
            Stat::Speed => self.speed = value,
            Stat::Endurance => self.endurance = value,
            Stat::Technique => self.technique = value,
        }
    }

    pub fn total(&self) -> i64 {
        Stat::ALL.iter().map(|&s| self.get(s) as i64).sum()
    }

    /// Raise every attribute to at least `min`.
    pub fn floored(mut self, min: i32) -> Self {
        for stat in Stat::ALL {
            if self.get(stat) < min {
                self.set(stat, min);
            }
        }
        self
    }
}

/// Win/loss/draw counters. Voided fights count as draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Record {
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fighter {
    pub id: FighterId,
    pub name: String,
    pub stats: Stats,
    #[serde(default)]
    pub is_dead: bool,
    /// Revived after death. Undead fighters may frenzy and are still eligible.
    #[serde(default)]
    pub is_undead: bool,
    #[serde(default)]
    pub record: Record,
    /// Owning user, if someone has claimed the fighter.
    #[serde(default)]
    pub owner_id: Option<i64>,
}

impl Fighter {
    pub fn new(id: FighterId, name: impl Into<String>, stats: Stats) -> Self {
        Self {
            id,
            name: name.into(),
            stats,
            is_dead: false,
            is_undead: false,
            record: Record::default(),
            owner_id: None,
        }
    }

    /// Alive fighters and revived ones can be put on a card.
    pub fn is_eligible(&self) -> bool {
        !self.is_dead || self.is_undead
    }
}

// ── Blessings and curses ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectKind {
    Blessing,
    Curse,
}

/// An externally applied stat adjustment, valid for the local day it was
/// applied on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatEffect {
    pub fighter_id: FighterId,
    pub kind: EffectKind,
    pub stat: Stat,
    pub value: i32,
    pub applied_at: DateTime<FixedOffset>,
}

impl StatEffect {
    fn signed_value(&self) -> i32 {
        match self.kind {
            EffectKind::Blessing => self.value,
            EffectKind::Curse => self.value.saturating_neg(),
        }
    }
}

/// Floor applied to every attribute after effects.
pub const MIN_EFFECTIVE_STAT: i32 = 1;

/// Add blessings, subtract curses, then clamp each attribute to
/// [`MIN_EFFECTIVE_STAT`].
pub fn apply_effects(base: Stats, effects: &[StatEffect]) -> Stats {
    let mut stats = base;
    for effect in effects {
        let current = stats.get(effect.stat);
        stats.set(effect.stat, current.saturating_add(effect.signed_value()));
    }
    stats.floored(MIN_EFFECTIVE_STAT)
}

/// The view of a fighter the simulator works with: identity plus the
/// effective attributes for one fight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Combatant {
    pub id: FighterId,
    pub name: String,
    pub stats: Stats,
    pub is_undead: bool,
}

impl Combatant {
    /// Effective combatant for a fight, with the day's effects applied.
    pub fn prepare(fighter: &Fighter, effects: &[StatEffect]) -> Self {
        Self {
            id: fighter.id,
            name: fighter.name.clone(),
            stats: apply_effects(fighter.stats, effects),
            is_undead: fighter.is_undead,
        }
    }
}

impl From<&Fighter> for Combatant {
    fn from(fighter: &Fighter) -> Self {
        Self {
            id: fighter.id,
            name: fighter.name.clone(),
            stats: fighter.stats,
            is_undead: fighter.is_undead,
        }
    }
}
