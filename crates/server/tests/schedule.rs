use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveDate};

use spoodblort_engine::calendar::Calendar;
use spoodblort_engine::fight::{Fight, FightId, FightStatus, NewFight, Tournament, TournamentId};
use spoodblort_engine::fighter::{Fighter, FighterId, Stats};
use spoodblort_engine::matchup::PlayoffSlot;
use spoodblort_engine::matchup::round_robin::group_of;
use spoodblort_server::finalize::Finalizer;
use spoodblort_server::live::LiveCoordinator;
use spoodblort_server::notifier::LogNotifier;
use spoodblort_server::recovery::{Recovery, VOID_REASONS};
use spoodblort_server::schedule::{ScheduleError, ScheduleManager};
use spoodblort_server::spectators::SpectatorRegistry;
use spoodblort_server::store::{FightResult, MemoryStore, Repository};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn calendar() -> Calendar {
    Calendar::from_offset_minutes(-360, date(2025, 7, 21), 24).unwrap()
}

fn week_one() -> Tournament {
    Tournament {
        id: TournamentId(1),
        week_number: 1,
        name: "Week 1 Invitational".into(),
        sponsor: "Big Soup".into(),
        start_date: date(2025, 7, 21),
    }
}

fn store_with_fighters(count: i64) -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    store.add_tournament(week_one());
    for id in 1..=count {
        let stats = Stats::new(10 + (id % 7) as i32, 12, 9 + (id % 3) as i32, 11);
        store.add_fighter(Fighter::new(FighterId(id), format!("Fighter {}", id), stats));
    }
    store
}

fn manager(store: &Arc<MemoryStore>) -> ScheduleManager {
    let cal = calendar();
    let repo: Arc<dyn Repository> = store.clone();
    let notifier = Arc::new(LogNotifier);
    let finalizer = Arc::new(Finalizer::new(Arc::clone(&repo), notifier.clone(), cal));
    let live = Arc::new(LiveCoordinator::new(
        Arc::clone(&repo),
        Arc::new(SpectatorRegistry::new()),
        finalizer,
        cal,
        None,
    ));
    ScheduleManager::new(repo, live, notifier, cal)
}

fn local(d: NaiveDate, hour: u32, minute: u32) -> DateTime<FixedOffset> {
    calendar().at(d, hour, minute)
}

fn fights_on(store: &MemoryStore, d: NaiveDate) -> Vec<Fight> {
    let cal = calendar();
    store
        .all_fights()
        .into_iter()
        .filter(|f| cal.local_date(f.scheduled_at) == d)
        .collect()
}

#[test]
fn daily_card_is_generated_once() {
    let store = store_with_fighters(10);
    let schedule = manager(&store);
    let tuesday = date(2025, 7, 22);
    let now = local(tuesday, 9, 0);

    let first = schedule.ensure_today(now).unwrap();
    assert_eq!(first.generated, 5);
    assert!(first.activated.is_empty());

    let second = schedule.ensure_today(now).unwrap();
    assert_eq!(second.generated, 0);
    assert_eq!(fights_on(&store, tuesday).len(), 5);

    let today = schedule.todays_schedule(now).unwrap();
    assert_eq!(today.len(), 5);
    assert_eq!(today[0].scheduled_at, local(tuesday, 12, 0));
    assert_eq!(schedule.next_fight(now).unwrap().map(|f| f.id), Some(today[0].id));
}

#[test]
fn closed_day_does_nothing() {
    let store = store_with_fighters(10);
    let schedule = manager(&store);
    let report = schedule.ensure_today(local(date(2025, 7, 27), 13, 0)).unwrap();
    assert!(report.closed);
    assert!(store.all_fights().is_empty());
}

#[test]
fn missing_tournament_is_an_error() {
    let store = Arc::new(MemoryStore::new());
    store.add_fighter(Fighter::new(FighterId(1), "Solo", Stats::uniform(10)));
    let schedule = manager(&store);
    let err = schedule.ensure_today(local(date(2025, 7, 22), 9, 0)).unwrap_err();
    assert!(matches!(err, ScheduleError::MissingTournament { week: 1 }));
}

#[test]
fn too_few_fighters_is_an_error() {
    let store = store_with_fighters(1);
    let schedule = manager(&store);
    let err = schedule.ensure_today(local(date(2025, 7, 22), 9, 0)).unwrap_err();
    assert!(matches!(err, ScheduleError::Matchup(_)));
    assert!(store.all_fights().is_empty());
}

#[tokio::test]
async fn expired_fights_are_voided_once_with_a_draw() {
    let store = store_with_fighters(10);
    let schedule = manager(&store);
    let tuesday = date(2025, 7, 22);
    schedule.ensure_today(local(tuesday, 9, 0)).unwrap();

    // 12:00, 12:30 and 13:00 have closed; 13:30 is open; 14:00 has not started.
    let now = local(tuesday, 13, 45);
    let report = schedule.ensure_today(now).unwrap();
    assert_eq!(report.voided.len(), 3);
    assert_eq!(report.activated.len(), 1);

    let again = schedule.ensure_today(now).unwrap();
    assert!(again.voided.is_empty());
    assert!(again.activated.is_empty());

    for id in &report.voided {
        let fight = store.fight(*id).unwrap().unwrap();
        assert_eq!(fight.status, FightStatus::Voided);
        assert!(VOID_REASONS.contains(&fight.void_reason.as_deref().unwrap()));
        for side in [fight.fighter1_id, fight.fighter2_id] {
            assert_eq!(store.fighter(side).unwrap().unwrap().record.draws, 1);
        }
    }
}

#[test]
fn recovery_voids_each_fight_exactly_once() {
    let store = store_with_fighters(2);
    let repo: Arc<dyn Repository> = store.clone();
    let recovery = Recovery::new(Arc::clone(&repo));
    let tuesday = date(2025, 7, 22);
    let one = store.fighter(FighterId(1)).unwrap().unwrap();
    let two = store.fighter(FighterId(2)).unwrap().unwrap();
    let id = repo
        .insert_fight(NewFight::between(TournamentId(1), &one, &two, local(tuesday, 12, 0)))
        .unwrap();

    // Window still open at 12:30 exactly.
    assert!(recovery.void_expired_fights(TournamentId(1), local(tuesday, 12, 30)).unwrap().is_empty());

    let now = local(tuesday, 12, 31);
    assert_eq!(recovery.void_expired_fights(TournamentId(1), now).unwrap(), vec![id]);
    assert!(recovery.void_expired_fights(TournamentId(1), now).unwrap().is_empty());
    assert_eq!(store.fighter(FighterId(1)).unwrap().unwrap().record.draws, 1);
    assert_eq!(store.fighter(FighterId(2)).unwrap().unwrap().record.draws, 1);
}

/// Sixteen fighters each win once during the week.
fn seed_qualifying_week(store: &MemoryStore) {
    let monday = date(2025, 7, 21);
    for i in 1..=16i64 {
        let winner = store.fighter(FighterId(i)).unwrap().unwrap();
        let loser = store.fighter(FighterId(i + 16)).unwrap().unwrap();
        let at = local(monday, 12, 0) + chrono::Duration::minutes(30 * i);
        let mut fight = NewFight::between(TournamentId(1), &winner, &loser, at).into_fight(FightId(1000 + i));
        fight.status = FightStatus::Completed;
        fight.winner_id = Some(winner.id);
        fight.final_score1 = Some(60_000);
        fight.final_score2 = Some(0);
        fight.completed_at = Some(at + chrono::Duration::minutes(30));
        store.put_fight(fight);
    }
}

fn complete_group(store: &MemoryStore, saturday: NaiveDate, group: usize) {
    let cal = calendar();
    for fight in store.all_fights() {
        if cal.local_date(fight.scheduled_at) != saturday || group_of(&cal, saturday, fight.scheduled_at) != Some(group) {
            continue;
        }
        let result = FightResult {
            winner: Some(fight.fighter1_id),
            score1: 50_000,
            score2: 10_000,
            completed_at: fight.scheduled_at + chrono::Duration::minutes(30),
        };
        store.record_result(fight.id, &result).unwrap();
    }
}

fn fights_at(store: &MemoryStore, at: DateTime<FixedOffset>) -> usize {
    store.all_fights().iter().filter(|f| f.scheduled_at == at).count()
}

#[test]
fn special_day_builds_groups_then_playoffs_once() {
    let store = store_with_fighters(32);
    seed_qualifying_week(&store);
    let schedule = manager(&store);
    let cal = calendar();
    let saturday = date(2025, 7, 26);
    let morning = local(saturday, 9, 0);

    let first = schedule.ensure_today(morning).unwrap();
    assert_eq!(first.generated, 48);
    assert!(first.playoffs_created.is_empty());
    assert_eq!(schedule.ensure_today(morning).unwrap().generated, 0);
    let group_fights = fights_on(&store, saturday);
    assert_eq!(group_fights.len(), 48);
    assert!(group_fights.iter().all(|f| f.fighter1_id.0 <= 16 && f.fighter2_id.0 <= 16));

    let tournament = week_one();
    complete_group(&store, saturday, 0);
    assert!(schedule.maybe_create_playoffs(&tournament, morning).unwrap().is_empty());

    complete_group(&store, saturday, 1);
    assert_eq!(
        schedule.maybe_create_playoffs(&tournament, morning).unwrap(),
        vec![PlayoffSlot::SemifinalOne]
    );
    assert!(schedule.maybe_create_playoffs(&tournament, morning).unwrap().is_empty());
    assert_eq!(fights_at(&store, PlayoffSlot::SemifinalOne.at(&cal, saturday)), 1);

    complete_group(&store, saturday, 2);
    complete_group(&store, saturday, 3);
    assert_eq!(
        schedule.maybe_create_playoffs(&tournament, morning).unwrap(),
        vec![PlayoffSlot::SemifinalTwo]
    );

    // Final waits for both semifinals to be decided.
    assert!(schedule.maybe_create_playoffs(&tournament, morning).unwrap().is_empty());
    for slot in [PlayoffSlot::SemifinalOne, PlayoffSlot::SemifinalTwo] {
        let at = slot.at(&cal, saturday);
        let semi = store.all_fights().into_iter().find(|f| f.scheduled_at == at).unwrap();
        let result = FightResult {
            winner: Some(semi.fighter2_id),
            score1: 0,
            score2: 70_000,
            completed_at: at + chrono::Duration::minutes(30),
        };
        assert!(store.record_result(semi.id, &result).unwrap());
    }
    assert_eq!(
        schedule.maybe_create_playoffs(&tournament, morning).unwrap(),
        vec![PlayoffSlot::Final]
    );
    assert!(schedule.maybe_create_playoffs(&tournament, morning).unwrap().is_empty());

    for slot in PlayoffSlot::ALL {
        assert_eq!(fights_at(&store, slot.at(&cal, saturday)), 1, "{}", slot.label());
    }
    assert_eq!(fights_on(&store, saturday).len(), 51);
}
