//! Per-fight spectator registry.
//!
//! Each fight has its own shard of connections, so joins, leaves and
//! fan-out on one fight never contend with another. Connections receive
//! pre-serialized messages over an unbounded channel; a closed channel is
//! dropped on the next send.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tokio::sync::mpsc;

use spoodblort_engine::combat::LiveAction;
use spoodblort_engine::fight::FightId;

use crate::broadcast::{self, Broadcaster, ClapTotals};

/// Claps only count during rounds divisible by this.
pub const CLAP_ROUND_INTERVAL: u32 = 5;

/// Per spectator, per fight.
pub const MAX_CLAPS_PER_WINDOW: usize = 10;
pub const CLAP_WINDOW: Duration = Duration::from_secs(1);

pub type SpectatorId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClapOutcome {
    Accepted,
    NotClapRound,
    RateLimited,
    UnknownSpectator,
}

struct Spectator {
    tx: mpsc::UnboundedSender<Arc<str>>,
    recent_claps: VecDeque<Instant>,
}

#[derive(Default)]
pub struct SpectatorRegistry {
    fights: DashMap<FightId, HashMap<SpectatorId, Spectator>>,
    claps: DashMap<(FightId, u32), HashMap<SpectatorId, u32>>,
    next_id: AtomicU64,
}

impl SpectatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection for `fight` and announce the new viewer count.
    pub fn join(&self, fight: FightId) -> (SpectatorId, mpsc::UnboundedReceiver<Arc<str>>) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let (tx, rx) = mpsc::unbounded_channel();
        self.fights
            .entry(fight)
            .or_default()
            .insert(id, Spectator { tx, recent_claps: VecDeque::new() });
        tracing::debug!(fight = %fight, spectator = id, "spectator joined");
        self.broadcast_viewer_count(fight);
        (id, rx)
    }

    pub fn leave(&self, fight: FightId, spectator: SpectatorId) {
        let removed = match self.fights.get_mut(&fight) {
            Some(mut shard) => shard.remove(&spectator).is_some(),
            None => false,
        };
        self.fights.remove_if(&fight, |_, shard| shard.is_empty());
        if removed {
            tracing::debug!(fight = %fight, spectator, "spectator left");
            self.broadcast_viewer_count(fight);
        }
    }

    pub fn viewer_count(&self, fight: FightId) -> usize {
        self.fights.get(&fight).map(|shard| shard.len()).unwrap_or(0)
    }

    /// Send one message to one spectator.
    pub fn send_to(&self, fight: FightId, spectator: SpectatorId, message: Arc<str>) -> bool {
        self.fights
            .get(&fight)
            .and_then(|shard| shard.get(&spectator).map(|s| s.tx.send(message).is_ok()))
            .unwrap_or(false)
    }

    /// Fan a message out to every spectator of `fight`, pruning dead channels.
    pub fn send_all(&self, fight: FightId, message: Arc<str>) {
        let Some(mut shard) = self.fights.get_mut(&fight) else {
            return;
        };
        shard.retain(|_, s| s.tx.send(Arc::clone(&message)).is_ok());
    }

    /// Count a clap from `spectator` during `round`. Claps are tallied for the
    /// crowd summary only.
    pub fn clap(&self, fight: FightId, spectator: SpectatorId, round: u32, now: Instant) -> ClapOutcome {
        if round == 0 || round % CLAP_ROUND_INTERVAL != 0 {
            return ClapOutcome::NotClapRound;
        }

        {
            let Some(mut shard) = self.fights.get_mut(&fight) else {
                return ClapOutcome::UnknownSpectator;
            };
            let Some(entry) = shard.get_mut(&spectator) else {
                return ClapOutcome::UnknownSpectator;
            };
            while entry
                .recent_claps
                .front()
                .is_some_and(|t| now.duration_since(*t) >= CLAP_WINDOW)
            {
                entry.recent_claps.pop_front();
            }
            if entry.recent_claps.len() >= MAX_CLAPS_PER_WINDOW {
                return ClapOutcome::RateLimited;
            }
            entry.recent_claps.push_back(now);
        }

        *self.claps.entry((fight, round)).or_default().entry(spectator).or_default() += 1;
        ClapOutcome::Accepted
    }
}

impl Broadcaster for SpectatorRegistry {
    fn broadcast_action(&self, fight: FightId, action: &LiveAction) {
        self.send_all(fight, broadcast::action_message(action));
    }

    fn broadcast_viewer_count(&self, fight: FightId) {
        let count = self.viewer_count(fight);
        self.send_all(fight, broadcast::viewer_count_message(count));
    }

    fn round_clap_totals(&self, fight: FightId, round: u32) -> ClapTotals {
        let Some(tally) = self.claps.get(&(fight, round)) else {
            return ClapTotals { round, ..ClapTotals::default() };
        };
        ClapTotals {
            round,
            total: tally.values().sum(),
            spectators: tally.len() as u32,
        }
    }

    fn reset_round_claps(&self, fight: FightId, round: u32) {
        self.claps.remove(&(fight, round));
    }

    fn broadcast_clap_summary(&self, fight: FightId, totals: &ClapTotals) {
        self.send_all(fight, broadcast::clap_summary_message(totals));
    }

    fn clear_claps(&self, fight: FightId) {
        self.claps.retain(|(f, _), _| *f != fight);
    }
}
