//! Tournament calendar: local time, week numbers and day boundaries.
//!
//! The tournament runs on one fixed UTC offset. All "what day is it" questions
//! go through [`Calendar`] so the schedule manager and the generators agree
//! on where a day starts.

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveTime, Utc, Weekday};

/// No fights are held on this day.
pub const CLOSED_DAY: Weekday = Weekday::Sun;

/// Round-robin groups and playoffs replace the daily card on this day.
pub const SPECIAL_DAY: Weekday = Weekday::Sat;

/// Default offset: US Central standard time.
pub const DEFAULT_UTC_OFFSET_MINUTES: i32 = -6 * 60;

pub const DEFAULT_MAX_WEEK: u32 = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Calendar {
    offset: FixedOffset,
    season_start: NaiveDate,
    max_week: u32,
}

impl Calendar {
    pub fn new(offset: FixedOffset, season_start: NaiveDate, max_week: u32) -> Self {
        Self { offset, season_start, max_week: max_week.max(1) }
    }

    /// Build from an offset in minutes east of UTC. `None` if out of range.
    pub fn from_offset_minutes(minutes: i32, season_start: NaiveDate, max_week: u32) -> Option<Self> {
        let offset = FixedOffset::east_opt(minutes.checked_mul(60)?)?;
        Some(Self::new(offset, season_start, max_week))
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    pub fn season_start(&self) -> NaiveDate {
        self.season_start
    }

    pub fn max_week(&self) -> u32 {
        self.max_week
    }

    pub fn now(&self) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&self.offset)
    }

    /// Re-express an instant in tournament local time.
    pub fn local(&self, t: DateTime<FixedOffset>) -> DateTime<FixedOffset> {
        t.with_timezone(&self.offset)
    }

    pub fn local_date(&self, t: DateTime<FixedOffset>) -> NaiveDate {
        self.local(t).date_naive()
    }

    /// Local wall-clock `hour:minute` on `date`.
    pub fn at(&self, date: NaiveDate, hour: u32, minute: u32) -> DateTime<FixedOffset> {
        let local = date.and_time(NaiveTime::MIN)
            + Duration::minutes(hour as i64 * 60 + minute as i64);
        let utc = local - Duration::seconds(self.offset.local_minus_utc() as i64);
        DateTime::from_naive_utc_and_offset(utc, self.offset)
    }

    /// Local midnight starting `date`.
    pub fn start_of(&self, date: NaiveDate) -> DateTime<FixedOffset> {
        self.at(date, 0, 0)
    }

    /// `[today 00:00, tomorrow 00:00)` in local time.
    pub fn day_bounds(&self, now: DateTime<FixedOffset>) -> (DateTime<FixedOffset>, DateTime<FixedOffset>) {
        let start = self.start_of(self.local_date(now));
        (start, start + Duration::days(1))
    }

    /// One-based week of the season, clamped to `[1, max_week]`.
    pub fn week_number(&self, now: DateTime<FixedOffset>) -> u32 {
        let days = (self.local_date(now) - self.season_start).num_days();
        if days < 0 {
            return 1;
        }
        ((days / 7) as u32 + 1).min(self.max_week)
    }

    pub fn is_closed_day(&self, now: DateTime<FixedOffset>) -> bool {
        self.local(now).weekday() == CLOSED_DAY
    }

    pub fn is_special_day(&self, now: DateTime<FixedOffset>) -> bool {
        self.local(now).weekday() == SPECIAL_DAY
    }

    /// Monday 00:00 up to Saturday 00:00 of the week containing `now`.
    pub fn qualifying_window(&self, now: DateTime<FixedOffset>) -> (DateTime<FixedOffset>, DateTime<FixedOffset>) {
        let date = self.local_date(now);
        let monday = date - Duration::days(date.weekday().num_days_from_monday() as i64);
        let start = self.start_of(monday);
        (start, start + Duration::days(5))
    }

    /// The first day after `date` that is not the closed day.
    pub fn next_open_day(&self, date: NaiveDate) -> NaiveDate {
        let mut next = date + Duration::days(1);
        while next.weekday() == CLOSED_DAY {
            next += Duration::days(1);
        }
        next
    }
}
