use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock, Weak};

use chrono::{DateTime, Duration, FixedOffset, NaiveDate};

use spoodblort_engine::calendar::Calendar;
use spoodblort_engine::combat::{ActionKind, Finish, FightState, LiveAction, MAX_TICKS};
use spoodblort_engine::fight::{Fight, FightId, FightStatus, NewFight, Tournament, TournamentId};
use spoodblort_engine::fighter::{EffectKind, Fighter, FighterId, Stat, StatEffect, Stats};
use spoodblort_engine::matchup::PlayoffSlot;
use spoodblort_server::broadcast::{Broadcaster, ClapTotals};
use spoodblort_server::finalize::Finalizer;
use spoodblort_server::live::{LiveCoordinator, LiveStart};
use spoodblort_server::notifier::{FightReport, Notifier};
use spoodblort_server::store::{MemoryStore, Repository};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn calendar() -> Calendar {
    Calendar::from_offset_minutes(-360, date(2025, 7, 21), 24).unwrap()
}

/// Counts results and records what the coordinator exposes for the fight
/// at the moment it is reported.
#[derive(Default)]
struct CountingNotifier {
    results: AtomicUsize,
    coordinator: OnceLock<Weak<LiveCoordinator>>,
    seen_while_reporting: Mutex<Vec<(bool, Option<FightState>)>>,
}

impl Notifier for CountingNotifier {
    fn fight_result(&self, report: &FightReport) -> anyhow::Result<()> {
        self.results.fetch_add(1, Ordering::SeqCst);
        if let Some(live) = self.coordinator.get().and_then(Weak::upgrade) {
            let id = report.fight.id;
            self.seen_while_reporting.lock().unwrap().push((live.is_live(id), live.live_state(id)));
        }
        Ok(())
    }
}

#[derive(Default)]
struct RecordingBroadcaster {
    actions: Mutex<Vec<LiveAction>>,
    viewer_counts: AtomicUsize,
    summaries: Mutex<Vec<ClapTotals>>,
    cleared: Mutex<Vec<FightId>>,
}

impl Broadcaster for RecordingBroadcaster {
    fn broadcast_action(&self, _fight: FightId, action: &LiveAction) {
        self.actions.lock().unwrap().push(action.clone());
    }

    fn broadcast_viewer_count(&self, _fight: FightId) {
        self.viewer_counts.fetch_add(1, Ordering::SeqCst);
    }

    fn round_clap_totals(&self, _fight: FightId, round: u32) -> ClapTotals {
        ClapTotals { round, total: 0, spectators: 0 }
    }

    fn reset_round_claps(&self, _fight: FightId, _round: u32) {}

    fn broadcast_clap_summary(&self, _fight: FightId, totals: &ClapTotals) {
        self.summaries.lock().unwrap().push(totals.clone());
    }

    fn clear_claps(&self, fight: FightId) {
        self.cleared.lock().unwrap().push(fight);
    }
}

struct Harness {
    store: Arc<MemoryStore>,
    broadcaster: Arc<RecordingBroadcaster>,
    notifier: Arc<CountingNotifier>,
    finalizer: Arc<Finalizer>,
    live: Arc<LiveCoordinator>,
}

fn harness(log_dir: Option<std::path::PathBuf>) -> Harness {
    let cal = calendar();
    let store = Arc::new(MemoryStore::new());
    store.add_tournament(Tournament {
        id: TournamentId(1),
        week_number: 1,
        name: "Week 1 Invitational".into(),
        sponsor: "Big Soup".into(),
        start_date: date(2025, 7, 21),
    });
    store.add_fighter(Fighter::new(FighterId(1), "Sampson", Stats::new(18, 14, 16, 12)));
    store.add_fighter(Fighter::new(FighterId(2), "Timber", Stats::new(12, 16, 14, 18)));

    let repo: Arc<dyn Repository> = store.clone();
    let broadcaster = Arc::new(RecordingBroadcaster::default());
    let notifier = Arc::new(CountingNotifier::default());
    let finalizer = Arc::new(Finalizer::new(Arc::clone(&repo), notifier.clone(), cal));
    let live = Arc::new(LiveCoordinator::new(
        repo,
        broadcaster.clone(),
        Arc::clone(&finalizer),
        cal,
        log_dir,
    ));
    let _ = notifier.coordinator.set(Arc::downgrade(&live));
    Harness { store, broadcaster, notifier, finalizer, live }
}

fn active_fight(h: &Harness, id: i64, at: DateTime<FixedOffset>) -> Fight {
    let one = h.store.fighter(FighterId(1)).unwrap().unwrap();
    let two = h.store.fighter(FighterId(2)).unwrap().unwrap();
    let mut fight = NewFight::between(TournamentId(1), &one, &two, at).into_fight(FightId(id));
    fight.status = FightStatus::Active;
    h.store.put_fight(fight.clone());
    fight
}

fn tuesday_noon() -> DateTime<FixedOffset> {
    calendar().at(date(2025, 7, 22), 12, 0)
}

#[test]
fn fight_past_its_window_finishes_during_catch_up() {
    let h = harness(None);
    let fight = active_fight(&h, 7, tuesday_noon());
    let now = tuesday_noon() + Duration::minutes(40);

    let expected = h.live.prepare_bout(&fight).unwrap().run_to_completion();
    let started = h.live.start(fight.clone(), now).unwrap();
    assert!(matches!(started, LiveStart::FinishedDuringCatchUp));
    assert!(!h.live.is_live(fight.id));

    let stored = h.store.fight(fight.id).unwrap().unwrap();
    assert_eq!(stored.status, FightStatus::Completed);
    assert_eq!(stored.winner_id, expected.winner);
    assert_eq!(stored.final_score1, Some(expected.health1));
    assert_eq!(stored.final_score2, Some(expected.health2));
    assert_eq!(h.notifier.results.load(Ordering::SeqCst), 1);
    assert!(h.broadcaster.actions.lock().unwrap().is_empty());

    // Claimed during the replay, but no fresh state was ever exposed.
    let seen = h.notifier.seen_while_reporting.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert!(seen[0].0);
    assert_eq!(seen[0].1, None);
    assert_eq!(*h.broadcaster.cleared.lock().unwrap(), vec![fight.id]);
}

#[tokio::test(start_paused = true)]
async fn second_start_is_a_no_op() {
    let h = harness(None);
    let fight = active_fight(&h, 8, tuesday_noon());

    let handle = match h.live.start(fight.clone(), tuesday_noon()).unwrap() {
        LiveStart::Running(handle) => handle,
        other => panic!("expected a live task, got {:?}", other),
    };
    assert!(h.live.is_live(fight.id));
    assert!(matches!(
        h.live.start(fight.clone(), tuesday_noon()).unwrap(),
        LiveStart::AlreadyRunning
    ));
    assert_eq!(h.live.process_active(tuesday_noon()).unwrap(), 0);

    handle.await.unwrap();
    assert!(!h.live.is_live(fight.id));
}

#[tokio::test(start_paused = true)]
async fn live_loop_matches_a_quiet_run_and_finalizes_once() {
    let logs = tempfile::tempdir().unwrap();
    let h = harness(Some(logs.path().to_path_buf()));
    let fight = active_fight(&h, 9, tuesday_noon());
    let expected = h.live.prepare_bout(&fight).unwrap().run_to_completion();

    // Join a third of the way in: the first ticks are replayed quietly.
    let now = tuesday_noon() + Duration::minutes(10);
    let LiveStart::Running(handle) = h.live.start(fight.clone(), now).unwrap() else {
        // Some seeds end the fight before minute ten; that path is covered above.
        assert!(expected.tick <= 120);
        return;
    };
    handle.await.unwrap();

    let stored = h.store.fight(fight.id).unwrap().unwrap();
    assert_eq!(stored.status, FightStatus::Completed);
    assert_eq!(stored.winner_id, expected.winner);
    assert_eq!(stored.final_score1, Some(expected.health1));
    assert_eq!(stored.final_score2, Some(expected.health2));
    assert_eq!(h.notifier.results.load(Ordering::SeqCst), 1);

    let actions = h.broadcaster.actions.lock().unwrap();
    assert!(actions.iter().all(|a| a.tick_number > 120));
    assert_eq!(actions.last().map(|a| a.tick_number), Some(expected.tick));
    if expected.tick >= 126 {
        assert!(actions.iter().any(|a| a.kind == ActionKind::Round));
    }
    assert_eq!(h.broadcaster.viewer_counts.load(Ordering::SeqCst), 1);
    assert_eq!(*h.broadcaster.cleared.lock().unwrap(), vec![fight.id]);

    // While reporting, the live entry already holds the final state.
    {
        let seen = h.notifier.seen_while_reporting.lock().unwrap();
        assert_eq!(seen.len(), 1);
        let (live, state) = &seen[0];
        assert!(*live);
        assert_eq!(state.as_ref().map(|s| s.is_complete), Some(true));
    }

    // Round 25 ends well inside the live part of a full-length fight.
    if expected.tick == MAX_TICKS {
        let summaries = h.broadcaster.summaries.lock().unwrap();
        assert!(summaries.iter().any(|s| s.round == 25));
    }

    // A late duplicate finalization changes nothing.
    assert!(!h.finalizer.complete(&stored, &expected, None, now).unwrap());
    assert_eq!(h.notifier.results.load(Ordering::SeqCst), 1);

    let log_files: Vec<_> = std::fs::read_dir(logs.path()).unwrap().collect();
    assert_eq!(log_files.len(), 1);
    let text = std::fs::read_to_string(log_files[0].as_ref().unwrap().path()).unwrap();
    assert!(text.starts_with("Sampson vs Timber\nWeek 1 Invitational, Sponsored by Big Soup\n\n"));
    let last = text.lines().last().unwrap();
    assert!(
        last.ends_with("wins by DEATH!")
            || last.ends_with("wins by KO!")
            || last.ends_with("wins by decision!")
            || last == "Fight ends in a draw!",
        "unexpected result line: {}",
        last
    );
}

#[test]
fn active_fights_past_their_window_are_completed() {
    let h = harness(None);
    let fight = active_fight(&h, 10, tuesday_noon());
    let now = tuesday_noon() + Duration::hours(2);
    assert_eq!(h.live.process_active(now).unwrap(), 0);
    assert_eq!(h.store.fight(fight.id).unwrap().unwrap().status, FightStatus::Completed);
    assert!(h.store.active_fights().unwrap().is_empty());
}

#[test]
fn effects_from_the_scheduled_day_shape_the_bout() {
    let h = harness(None);
    let fight = active_fight(&h, 11, tuesday_noon());
    let effect = |kind, stat, value, at| StatEffect { fighter_id: FighterId(1), kind, stat, value, applied_at: at };
    h.store.add_effect(effect(EffectKind::Blessing, Stat::Strength, 5, tuesday_noon() - Duration::hours(3)));
    h.store.add_effect(effect(EffectKind::Curse, Stat::Speed, 100, tuesday_noon() - Duration::hours(1)));
    // The day before does not count.
    h.store.add_effect(effect(EffectKind::Blessing, Stat::Technique, 9, tuesday_noon() - Duration::hours(20)));

    let bout = h.live.prepare_bout(&fight).unwrap();
    assert_eq!(bout.one.stats, Stats::new(23, 1, 16, 12));
    assert_eq!(bout.two.stats, Stats::new(12, 16, 14, 18));
}

#[test]
fn death_kills_the_loser_and_records_once() {
    let h = harness(None);
    let fight = active_fight(&h, 12, tuesday_noon());
    let state = FightState {
        health1: 64_000,
        health2: 31_000,
        tick: 40,
        is_complete: true,
        winner: Some(FighterId(1)),
        death_occurred: true,
        finish: Some(Finish::Death),
        ..FightState::new()
    };
    let now = tuesday_noon() + Duration::minutes(5);
    assert!(h.finalizer.complete(&fight, &state, None, now).unwrap());
    assert!(!h.finalizer.complete(&fight, &state, None, now).unwrap());

    let winner = h.store.fighter(FighterId(1)).unwrap().unwrap();
    let loser = h.store.fighter(FighterId(2)).unwrap().unwrap();
    assert_eq!((winner.record.wins, winner.record.losses), (1, 0));
    assert_eq!((loser.record.wins, loser.record.losses), (0, 1));
    assert!(loser.is_dead);
    assert!(!winner.is_dead);
    assert_eq!(h.notifier.results.load(Ordering::SeqCst), 1);
    assert!(h.store.legacies().is_empty());
}

#[test]
fn championship_winner_gains_a_legacy_stat() {
    let h = harness(None);
    let saturday = date(2025, 7, 26);
    let at = PlayoffSlot::Final.at(&calendar(), saturday);
    let fight = active_fight(&h, 13, at);
    let before = h.store.fighter(FighterId(2)).unwrap().unwrap().stats.total();

    let state = FightState {
        health1: 20_000,
        health2: 55_000,
        tick: MAX_TICKS,
        is_complete: true,
        winner: Some(FighterId(2)),
        finish: Some(Finish::Decision),
        ..FightState::new()
    };
    assert!(h.finalizer.complete(&fight, &state, None, at + Duration::minutes(30)).unwrap());

    let after = h.store.fighter(FighterId(2)).unwrap().unwrap().stats.total();
    assert_eq!(after, before + 1);
    let legacies = h.store.legacies();
    assert_eq!(legacies.len(), 1);
    assert_eq!(legacies[0].fighter_id, FighterId(2));
    assert_eq!(legacies[0].fight_id, fight.id);
}
