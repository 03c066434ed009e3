//! The schedule manager: one idempotent pass over today's card.
//!
//! Every call re-reads the store and decides from what it finds, so the pass
//! can run on a short interval forever. Card generation is skipped when the
//! day already has fights, and every playoff fixture is guarded by an
//! existence check on its exact time slot.

use std::sync::Arc;

use chrono::{DateTime, FixedOffset};
use thiserror::Error;

use spoodblort_engine::calendar::Calendar;
use spoodblort_engine::fight::{Fight, FightId, FightStatus, NewFight, Tournament};
use spoodblort_engine::fighter::FighterId;
use spoodblort_engine::matchup::playoff::{fight_at, group_fights};
use spoodblort_engine::matchup::{
    MatchupError, PlayoffSlot, generate_daily_card, generate_round_robin, group_winner, rank_weekly_winners,
    select_daily_fighters,
};

use crate::live::LiveCoordinator;
use crate::notifier::Notifier;
use crate::recovery::Recovery;
use crate::store::Repository;

#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("no tournament for week {week}")]
    MissingTournament { week: u32 },
    #[error(transparent)]
    Matchup(#[from] MatchupError),
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

/// What one pass did.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TickReport {
    /// The pass ran on the closed day and did nothing.
    pub closed: bool,
    pub generated: usize,
    pub activated: Vec<FightId>,
    pub voided: Vec<FightId>,
    pub started: usize,
    pub playoffs_created: Vec<PlayoffSlot>,
}

pub struct ScheduleManager {
    repo: Arc<dyn Repository>,
    recovery: Recovery,
    live: Arc<LiveCoordinator>,
    notifier: Arc<dyn Notifier>,
    calendar: Calendar,
}

impl ScheduleManager {
    pub fn new(
        repo: Arc<dyn Repository>,
        live: Arc<LiveCoordinator>,
        notifier: Arc<dyn Notifier>,
        calendar: Calendar,
    ) -> Self {
        Self {
            recovery: Recovery::new(Arc::clone(&repo)),
            repo,
            live,
            notifier,
            calendar,
        }
    }

    pub fn calendar(&self) -> &Calendar {
        &self.calendar
    }

    pub fn current_tournament(&self, now: DateTime<FixedOffset>) -> Result<Tournament, ScheduleError> {
        let week = self.calendar.week_number(now);
        self.repo
            .tournament_for_week(week)?
            .ok_or(ScheduleError::MissingTournament { week })
    }

    /// Bring today's fights up to date with `now`.
    pub fn ensure_today(&self, now: DateTime<FixedOffset>) -> Result<TickReport, ScheduleError> {
        let mut report = TickReport::default();
        if self.calendar.is_closed_day(now) {
            tracing::debug!("closed day, nothing to schedule");
            if let Err(e) = self.notifier.clear_schedule_announcements() {
                tracing::warn!("failed to clear schedule announcements: {:#}", e);
            }
            report.closed = true;
            return Ok(report);
        }

        let tournament = self.current_tournament(now)?;
        let (day_start, day_end) = self.calendar.day_bounds(now);
        let existing = self.repo.fights_between(tournament.id, day_start, day_end)?;
        if existing.is_empty() {
            report.generated = if self.calendar.is_special_day(now) {
                self.generate_round_robin(&tournament, now)?
            } else {
                self.generate_daily(&tournament, now)?
            };
        } else {
            tracing::debug!("{} fights already scheduled today", existing.len());
        }

        report.activated = self.recovery.activate_due_fights(tournament.id, now)?;
        report.voided = self.recovery.void_expired_fights(tournament.id, now)?;
        report.started = self.live.process_active(now)?;

        if self.calendar.is_special_day(now) {
            report.playoffs_created = self.maybe_create_playoffs(&tournament, now)?;
        }
        Ok(report)
    }

    fn generate_daily(&self, tournament: &Tournament, now: DateTime<FixedOffset>) -> Result<usize, ScheduleError> {
        let date = self.calendar.local_date(now);
        let pool = self.repo.eligible_fighters()?;
        let selected = select_daily_fighters(&pool, date);
        tracing::info!("Selected {} of {} eligible fighters for {}", selected.len(), pool.len(), date);

        let card = generate_daily_card(tournament, &selected, date, &self.calendar)?;
        let count = card.len();
        for fight in card {
            self.repo.insert_fight(fight)?;
        }
        tracing::info!("{}: generated {} fights for {}", tournament.name, count, date);
        Ok(count)
    }

    fn generate_round_robin(&self, tournament: &Tournament, now: DateTime<FixedOffset>) -> Result<usize, ScheduleError> {
        let date = self.calendar.local_date(now);
        let (from, to) = self.calendar.qualifying_window(now);
        let completed = self.repo.completed_fights_between(tournament.id, from, to)?;

        let mut entrants = Vec::new();
        for (id, wins) in rank_weekly_winners(&completed) {
            match self.repo.fighter(id)? {
                Some(fighter) if fighter.is_eligible() => entrants.push(fighter),
                Some(_) => tracing::debug!("weekly winner {} ({} wins) is not eligible", id, wins),
                None => tracing::warn!("weekly winner {} not found", id),
            }
        }

        let card = generate_round_robin(tournament, &entrants, date, &self.calendar)?;
        for group in &card.groups {
            let names: Vec<&str> = group.members.iter().map(|f| f.name.as_str()).collect();
            tracing::info!("Group {}: {}", group.label, names.join(", "));
        }
        let count = card.fights.len();
        for fight in card.fights {
            self.repo.insert_fight(fight)?;
        }
        tracing::info!("{}: generated {} group fights for {}", tournament.name, count, date);
        Ok(count)
    }

    /// Create whichever playoff fixtures have become known. Safe to repeat.
    pub fn maybe_create_playoffs(
        &self,
        tournament: &Tournament,
        now: DateTime<FixedOffset>,
    ) -> Result<Vec<PlayoffSlot>, ScheduleError> {
        let date = self.calendar.local_date(now);
        let (day_start, day_end) = self.calendar.day_bounds(now);
        let fights = self.repo.fights_between(tournament.id, day_start, day_end)?;
        let mut created = Vec::new();

        for slot in [PlayoffSlot::SemifinalOne, PlayoffSlot::SemifinalTwo] {
            let Some((group_a, group_b)) = slot.feeder_groups() else {
                continue;
            };
            let at = slot.at(&self.calendar, date);
            if self.repo.fight_exists_at(tournament.id, at)? {
                continue;
            }
            let winner_a = group_winner(&group_fights(&fights, &self.calendar, date, group_a));
            let winner_b = group_winner(&group_fights(&fights, &self.calendar, date, group_b));
            let (Some(a), Some(b)) = (winner_a, winner_b) else {
                continue;
            };
            if self.insert_playoff(tournament, slot, a, b, at)? {
                created.push(slot);
            }
        }

        let at = PlayoffSlot::Final.at(&self.calendar, date);
        if !self.repo.fight_exists_at(tournament.id, at)? {
            let semi_winner = |slot| {
                fight_at(&fights, &self.calendar, date, slot)
                    .filter(|f| f.status == FightStatus::Completed)
                    .and_then(|f| f.winner_id)
            };
            if let (Some(a), Some(b)) = (semi_winner(PlayoffSlot::SemifinalOne), semi_winner(PlayoffSlot::SemifinalTwo)) {
                if self.insert_playoff(tournament, PlayoffSlot::Final, a, b, at)? {
                    created.push(PlayoffSlot::Final);
                }
            }
        }
        Ok(created)
    }

    fn insert_playoff(
        &self,
        tournament: &Tournament,
        slot: PlayoffSlot,
        a: FighterId,
        b: FighterId,
        at: DateTime<FixedOffset>,
    ) -> Result<bool, ScheduleError> {
        let (Some(one), Some(two)) = (self.repo.fighter(a)?, self.repo.fighter(b)?) else {
            tracing::warn!("{}: fighter {} or {} not found", slot.label(), a, b);
            return Ok(false);
        };
        let id = self.repo.insert_fight(NewFight::between(tournament.id, &one, &two, at))?;
        tracing::info!(fight = %id, "{} set: {} vs {}", slot.label(), one.name, two.name);
        Ok(true)
    }

    /// Today's fights in schedule order.
    pub fn todays_schedule(&self, now: DateTime<FixedOffset>) -> Result<Vec<Fight>, ScheduleError> {
        let tournament = self.current_tournament(now)?;
        let (day_start, day_end) = self.calendar.day_bounds(now);
        Ok(self.repo.fights_between(tournament.id, day_start, day_end)?)
    }

    /// The next fight still to start today, else the first fight of the next
    /// open day if that card already exists.
    pub fn next_fight(&self, now: DateTime<FixedOffset>) -> Result<Option<Fight>, ScheduleError> {
        if !self.calendar.is_closed_day(now) {
            let upcoming = self
                .todays_schedule(now)?
                .into_iter()
                .find(|f| f.status == FightStatus::Scheduled && f.scheduled_at > now);
            if upcoming.is_some() {
                return Ok(upcoming);
            }
        }

        let next_day = self.calendar.next_open_day(self.calendar.local_date(now));
        let next_start = self.calendar.start_of(next_day);
        let Some(tournament) = self.repo.tournament_for_week(self.calendar.week_number(next_start))? else {
            return Ok(None);
        };
        let (from, to) = self.calendar.day_bounds(next_start);
        Ok(self
            .repo
            .fights_between(tournament.id, from, to)?
            .into_iter()
            .find(|f| f.status == FightStatus::Scheduled))
    }
}
