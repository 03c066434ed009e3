use chrono::{Duration, NaiveDate};

use spoodblort_engine::calendar::Calendar;
use spoodblort_engine::fight::{FightStatus, NewFight, Outcome, TournamentId};
use spoodblort_engine::fighter::{EffectKind, FighterId, Stat, StatEffect};
use spoodblort_server::store::{FightResult, MemoryStore, Repository};

fn calendar() -> Calendar {
    Calendar::from_offset_minutes(-360, NaiveDate::from_ymd_opt(2025, 7, 21).unwrap(), 24).unwrap()
}

#[test]
fn seeding_only_fills_an_empty_store() {
    let store = MemoryStore::new();
    assert!(store.seed_demo(&calendar()));
    assert!(!store.seed_demo(&calendar()));

    let data = store.snapshot();
    assert_eq!(data.fighters.len(), 24);
    assert_eq!(data.tournaments.len(), 24);
    assert_eq!(store.tournament_for_week(3).unwrap().unwrap().start_date, NaiveDate::from_ymd_opt(2025, 8, 4).unwrap());
    assert_eq!(store.eligible_fighters().unwrap().len(), 24);
}

#[test]
fn snapshot_survives_a_save_and_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("tournament.json");
    let cal = calendar();

    let store = MemoryStore::new();
    store.seed_demo(&cal);
    let one = store.fighter(FighterId(1)).unwrap().unwrap();
    let two = store.fighter(FighterId(2)).unwrap().unwrap();
    let at = cal.at(NaiveDate::from_ymd_opt(2025, 7, 22).unwrap(), 12, 0);
    let id = store.insert_fight(NewFight::between(TournamentId(1), &one, &two, at)).unwrap();
    store.add_effect(StatEffect {
        fighter_id: one.id,
        kind: EffectKind::Curse,
        stat: Stat::Endurance,
        value: 3,
        applied_at: at - Duration::hours(2),
    });
    store.kill_fighter(two.id).unwrap();

    assert_eq!(store.save(&path).unwrap(), 1);
    let loaded = MemoryStore::load(&path).unwrap();

    assert_eq!(loaded.fight(id).unwrap(), store.fight(id).unwrap());
    assert_eq!(loaded.snapshot().effects.len(), 1);
    assert!(loaded.fighter(two.id).unwrap().unwrap().is_dead);
    assert_eq!(loaded.eligible_fighters().unwrap().len(), 23);

    // Ids keep counting up after a reload.
    let next = loaded.insert_fight(NewFight::between(TournamentId(1), &one, &two, at + Duration::minutes(30))).unwrap();
    assert!(next > id);
}

#[test]
fn missing_snapshot_loads_empty() {
    let dir = tempfile::tempdir().unwrap();
    let store = MemoryStore::load(&dir.path().join("absent.json")).unwrap();
    assert!(store.all_fights().is_empty());
}

#[test]
fn status_transitions_happen_once() {
    let cal = calendar();
    let store = MemoryStore::new();
    store.seed_demo(&cal);
    let one = store.fighter(FighterId(3)).unwrap().unwrap();
    let two = store.fighter(FighterId(4)).unwrap().unwrap();
    let at = cal.at(NaiveDate::from_ymd_opt(2025, 7, 22).unwrap(), 12, 0);
    let id = store.insert_fight(NewFight::between(TournamentId(1), &one, &two, at)).unwrap();

    assert!(store.activate_due_fights(TournamentId(1), at - Duration::minutes(1)).unwrap().is_empty());
    assert_eq!(store.activate_due_fights(TournamentId(1), at).unwrap(), vec![id]);
    assert!(store.activate_due_fights(TournamentId(1), at).unwrap().is_empty());
    assert_eq!(store.active_fights().unwrap().len(), 1);

    let result = FightResult { winner: Some(two.id), score1: 0, score2: 44_000, completed_at: at + Duration::minutes(12) };
    assert!(store.record_result(id, &result).unwrap());
    assert!(!store.record_result(id, &result).unwrap());
    assert!(!store.void_fight(id, "late", at).unwrap());

    let fight = store.fight(id).unwrap().unwrap();
    assert_eq!(fight.status, FightStatus::Completed);
    assert_eq!(fight.outcome(), Some(Outcome::Fighter2Wins));
    assert_eq!(store.completed_fights_between(TournamentId(1), at, at + Duration::days(1)).unwrap().len(), 1);
    assert!(store.fight_exists_at(TournamentId(1), at).unwrap());
}
