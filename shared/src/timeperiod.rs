use chrono::{Datelike, Days, Month, Months, NaiveDate, NaiveDateTime, NaiveTime};
use strum::{Display, EnumIter, IntoStaticStr};

use super::*;

pub use strum::IntoEnumIterator;

/// Hour of the local day at which the monthly winner is revealed.
pub const REVEAL_HOUR: u32 = 10;

#[derive(
    Serialize,
    Deserialize,
    Debug,
    PartialEq,
    Eq,
    Clone,
    Copy,
    Display,
    IntoStaticStr,
    EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RevealMode {
    Countdown,
    Reveal,
}

impl RevealMode {
    /// Classifies `now`. Callers must not hold on to the result past one render cycle.
    pub fn classify(now: NaiveDateTime) -> Self {
        if is_reveal_window(now) {
            RevealMode::Reveal
        } else {
            RevealMode::Countdown
        }
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Copy)]
pub struct Countdown {
    pub target: NaiveDateTime,
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
}

impl Countdown {
    pub fn until(now: NaiveDateTime) -> Self {
        let target = target_reveal_instant(now);
        let remaining = (target - now).num_seconds().max(0);
        Self {
            target,
            days: remaining / 86_400,
            hours: remaining % 86_400 / 3_600,
            minutes: remaining % 3_600 / 60,
            seconds: remaining % 60,
        }
    }

    pub fn is_elapsed(&self) -> bool {
        self.days == 0 && self.hours == 0 && self.minutes == 0 && self.seconds == 0
    }
}

// Day 0 of next month, i.e. the first of next month minus one day
pub fn last_day_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1)
        .and_then(|first| first.checked_add_months(Months::new(1)))
        .and_then(|next| next.checked_sub_days(Days::new(1)))
        .unwrap_or(date)
}

pub fn is_reveal_window(now: NaiveDateTime) -> bool {
    let date = now.date();
    date == last_day_of_month(date)
}

pub fn target_reveal_instant(now: NaiveDateTime) -> NaiveDateTime {
    let reveal_time = NaiveTime::from_hms_opt(REVEAL_HOUR, 0, 0).unwrap_or_default();
    last_day_of_month(now.date()).and_time(reveal_time)
}

pub fn current_month_name(now: NaiveDateTime) -> &'static str {
    month_name(now.month())
}

pub fn previous_month_name(now: NaiveDateTime) -> &'static str {
    previous_month(now).0
}

/// Month before `now` together with its year, rolling back over January.
pub fn previous_month(now: NaiveDateTime) -> (&'static str, i32) {
    match now.month() {
        1 => (month_name(12), now.year() - 1),
        month => (month_name(month - 1), now.year()),
    }
}

/// Parses an English month name into its 1-based number.
pub fn month_index(name: &str) -> Option<u32> {
    name.trim()
        .parse::<Month>()
        .ok()
        .map(|month| month.number_from_month())
}

fn month_name(month: u32) -> &'static str {
    u8::try_from(month)
        .ok()
        .and_then(|month| Month::try_from(month).ok())
        .map(|month| month.name())
        .unwrap_or("Unknown")
}
