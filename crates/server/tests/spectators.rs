use std::time::{Duration, Instant};

use serde_json::Value;

use spoodblort_engine::fight::FightId;
use spoodblort_server::broadcast::Broadcaster;
use spoodblort_server::spectators::{ClapOutcome, MAX_CLAPS_PER_WINDOW, SpectatorRegistry};

fn parse(message: &str) -> Value {
    serde_json::from_str(message).unwrap()
}

#[tokio::test]
async fn viewer_counts_follow_joins_and_leaves() {
    let registry = SpectatorRegistry::new();
    let fight = FightId(3);

    let (first, mut first_rx) = registry.join(fight);
    let joined = parse(&first_rx.recv().await.unwrap());
    assert_eq!(joined["type"], "viewer_count");
    assert_eq!(joined["count"], 1);

    let (second, _second_rx) = registry.join(fight);
    assert_eq!(parse(&first_rx.recv().await.unwrap())["count"], 2);
    assert_eq!(registry.viewer_count(fight), 2);
    assert_eq!(registry.viewer_count(FightId(4)), 0);

    registry.leave(fight, second);
    assert_eq!(parse(&first_rx.recv().await.unwrap())["count"], 1);
    registry.leave(fight, first);
    assert_eq!(registry.viewer_count(fight), 0);
}

#[tokio::test]
async fn broadcasts_stay_within_their_fight() {
    let registry = SpectatorRegistry::new();
    let (_a, mut rx_a) = registry.join(FightId(1));
    let (_b, mut rx_b) = registry.join(FightId(2));
    rx_a.recv().await.unwrap();
    rx_b.recv().await.unwrap();

    registry.send_all(FightId(1), "{\"type\":\"ping\"}".into());
    assert_eq!(parse(&rx_a.recv().await.unwrap())["type"], "ping");
    assert!(rx_b.try_recv().is_err());
}

#[test]
fn claps_only_count_on_clap_rounds() {
    let registry = SpectatorRegistry::new();
    let fight = FightId(9);
    let (spectator, _rx) = registry.join(fight);
    let now = Instant::now();

    assert_eq!(registry.clap(fight, spectator, 4, now), ClapOutcome::NotClapRound);
    assert_eq!(registry.clap(fight, spectator, 5, now), ClapOutcome::Accepted);
    assert_eq!(registry.clap(fight, 999, 5, now), ClapOutcome::UnknownSpectator);
    assert_eq!(registry.clap(FightId(10), spectator, 5, now), ClapOutcome::UnknownSpectator);

    let totals = registry.round_clap_totals(fight, 5);
    assert_eq!((totals.round, totals.total, totals.spectators), (5, 1, 1));
    assert_eq!(registry.round_clap_totals(fight, 4).total, 0);
}

#[test]
fn claps_are_rate_limited_per_spectator() {
    let registry = SpectatorRegistry::new();
    let fight = FightId(9);
    let (loud, _rx1) = registry.join(fight);
    let (quiet, _rx2) = registry.join(fight);
    let now = Instant::now();

    for _ in 0..MAX_CLAPS_PER_WINDOW {
        assert_eq!(registry.clap(fight, loud, 10, now), ClapOutcome::Accepted);
    }
    assert_eq!(registry.clap(fight, loud, 10, now), ClapOutcome::RateLimited);
    assert_eq!(registry.clap(fight, quiet, 10, now), ClapOutcome::Accepted);

    let later = now + Duration::from_secs(1);
    assert_eq!(registry.clap(fight, loud, 10, later), ClapOutcome::Accepted);

    let totals = registry.round_clap_totals(fight, 10);
    assert_eq!(totals.total, MAX_CLAPS_PER_WINDOW as u32 + 2);
    assert_eq!(totals.spectators, 2);

    registry.reset_round_claps(fight, 10);
    assert_eq!(registry.round_clap_totals(fight, 10).total, 0);
}

#[test]
fn finished_fights_drop_their_clap_tallies() {
    let registry = SpectatorRegistry::new();
    let (spectator, _rx) = registry.join(FightId(9));
    let (other, _rx2) = registry.join(FightId(10));
    let now = Instant::now();

    registry.clap(FightId(9), spectator, 15, now);
    registry.clap(FightId(9), spectator, 20, now);
    registry.clap(FightId(10), other, 15, now);

    registry.clear_claps(FightId(9));
    assert_eq!(registry.round_clap_totals(FightId(9), 15).total, 0);
    assert_eq!(registry.round_clap_totals(FightId(9), 20).total, 0);
    assert_eq!(registry.round_clap_totals(FightId(10), 15).total, 1);
}
