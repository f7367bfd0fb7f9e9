//! Timezone-aware calendar arithmetic for bucketing transactions into weeks,
//! months and pay cycles.
//!
//! All functions are relative to a single [Calendar], which fixes the
//! timezone and the first day of the week. The calendar is an immutable value
//! that is built once at start-up and then passed to whoever needs it.
//!
//! None of the calendar functions return errors. When a local date or time
//! cannot be produced (e.g., the result would fall outside the supported date
//! range or into a daylight-saving gap), the input timestamp is returned
//! unchanged.

use std::fmt::Debug;

use time::{Date, Duration, Month, OffsetDateTime, PrimitiveDateTime, Weekday};
use time_tz::{Offset, OffsetResult, PrimitiveDateTimeExt, TimeZone, Tz, timezones};

use crate::Error;

/// The number of days in a calendar week.
pub const DAYS_IN_WEEK: i64 = 7;

/// The canonical timezone used when none is configured.
pub const DEFAULT_TIMEZONE: &str = "Europe/London";

/// The locale used when none is configured.
pub const DEFAULT_LOCALE: &str = "en_GB";

/// Regions where the week conventionally starts on a Sunday.
const SUNDAY_FIRST_REGIONS: [&str; 10] = ["US", "CA", "JP", "BR", "MX", "IL", "KR", "TW", "PH", "ZA"];

/// Which way [Calendar::next_occurrence] should search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchDirection {
    /// Search for the next occurrence on or after the given time.
    Forward,
    /// Search for the most recent occurrence on or before the given time.
    Backward,
}

/// A Gregorian calendar fixed to a timezone and a first day of the week.
#[derive(Clone, Copy)]
pub struct Calendar {
    timezone: &'static Tz,
    first_weekday: Weekday,
}

impl Debug for Calendar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Calendar")
            .field("timezone", &self.timezone.name())
            .field("first_weekday", &self.first_weekday)
            .finish()
    }
}

impl Default for Calendar {
    /// The calendar for Europe/London with weeks starting on Monday (en_GB).
    fn default() -> Self {
        Self {
            timezone: timezones::db::europe::LONDON,
            first_weekday: first_weekday_for_locale(DEFAULT_LOCALE),
        }
    }
}

impl Calendar {
    /// Create a calendar for a canonical timezone name, e.g. "Europe/London",
    /// and a locale such as "en_GB".
    ///
    /// The locale only determines the first day of the week.
    ///
    /// # Errors
    /// Returns an [Error::InvalidTimezone] if `timezone_name` is not a known
    /// canonical timezone.
    pub fn new(timezone_name: &str, locale: &str) -> Result<Self, Error> {
        let timezone = timezones::get_by_name(timezone_name)
            .ok_or_else(|| Error::InvalidTimezone(timezone_name.to_owned()))?;

        Ok(Self {
            timezone,
            first_weekday: first_weekday_for_locale(locale),
        })
    }

    /// The canonical name of the calendar's timezone.
    pub fn timezone_name(&self) -> &'static str {
        self.timezone.name()
    }

    /// The day that weeks start on.
    pub fn first_weekday(&self) -> Weekday {
        self.first_weekday
    }

    /// The 1-based day of the month of `t` in the calendar's timezone.
    pub fn day_of_month(&self, t: OffsetDateTime) -> u8 {
        self.local_or_input(t).day()
    }

    /// Midnight of the calendar day containing `t`.
    pub fn start_of_day(&self, t: OffsetDateTime) -> OffsetDateTime {
        match self.local(t) {
            Some(local) => self.resolve_or(local.date().midnight(), t),
            None => fall_back(t),
        }
    }

    /// Midnight of the first day of the week containing `t`.
    pub fn start_of_week(&self, t: OffsetDateTime) -> OffsetDateTime {
        let Some(date) = self.local(t).map(|local| local.date()) else {
            return fall_back(t);
        };
        let days_into_week = days_since(date.weekday(), self.first_weekday);

        match date.checked_sub(Duration::days(days_into_week)) {
            Some(start) => self.resolve_or(start.midnight(), t),
            None => fall_back(t),
        }
    }

    /// The start of the week after the one containing `t`.
    pub fn end_of_week(&self, t: OffsetDateTime) -> OffsetDateTime {
        self.add_days(self.start_of_week(t), DAYS_IN_WEEK)
    }

    /// Midnight of the first day of the month containing `t`.
    pub fn start_of_month(&self, t: OffsetDateTime) -> OffsetDateTime {
        self.start_of_day(self.set_day(t, 1))
    }

    /// The start of the month after the one containing `t`.
    pub fn end_of_month(&self, t: OffsetDateTime) -> OffsetDateTime {
        self.add_months(self.start_of_month(t), 1)
    }

    /// Add `days` calendar days to `t`, keeping the local time of day.
    ///
    /// Adding zero days returns `t` as is.
    pub fn add_days(&self, t: OffsetDateTime, days: i64) -> OffsetDateTime {
        if days == 0 {
            return t;
        }

        match self
            .local(t)
            .and_then(|local| local.checked_add(Duration::days(days)))
        {
            Some(shifted) => self.resolve_or(shifted, t),
            None => fall_back(t),
        }
    }

    /// Add `months` calendar months to `t`, keeping the local time of day.
    ///
    /// If the day of the month does not exist in the target month, the last
    /// day of the target month is used instead, e.g. 31 January plus one
    /// month is 29 February in a leap year. Adding zero months returns `t` as
    /// is.
    pub fn add_months(&self, t: OffsetDateTime, months: i32) -> OffsetDateTime {
        if months == 0 {
            return t;
        }

        let Some(local) = self.local(t) else {
            return fall_back(t);
        };

        match shift_months(local.date(), months) {
            Some(date) => self.resolve_or(date.with_time(local.time()), t),
            None => fall_back(t),
        }
    }

    /// Midnight of `day` in the same year and month as `t`.
    ///
    /// Returns `t` unchanged if `day` does not exist in that month.
    pub fn set_day(&self, t: OffsetDateTime, day: u8) -> OffsetDateTime {
        match self.local(t).map(|local| local.date().replace_day(day)) {
            Some(Ok(date)) => self.resolve_or(date.midnight(), t),
            _ => fall_back(t),
        }
    }

    /// Find the start of the nearest day whose day of the month is `day`.
    ///
    /// Searching forward gives the next occurrence strictly after the current
    /// day of the month, searching backward gives the most recent occurrence
    /// on or before `t`.
    pub fn next_occurrence(
        &self,
        t: OffsetDateTime,
        day: u8,
        direction: SearchDirection,
    ) -> OffsetDateTime {
        let current_day = self.day_of_month(t);

        let months = match direction {
            SearchDirection::Forward if current_day >= day => 1,
            SearchDirection::Backward if current_day < day => -1,
            _ => 0,
        };

        self.start_of_day(self.set_day(self.add_months(t, months), day))
    }

    /// The number of calendar days from the day containing `from` to the day
    /// containing `to`.
    ///
    /// The result is negative if `to` is on an earlier day than `from`.
    pub fn days_between(&self, from: OffsetDateTime, to: OffsetDateTime) -> i64 {
        (self.local_or_input(to).date() - self.local_or_input(from).date()).whole_days()
    }

    /// The number of days in the month containing `t`.
    pub fn days_in_month(&self, t: OffsetDateTime) -> u8 {
        let date = self.local_or_input(t).date();

        date.month().length(date.year())
    }

    /// The number of weeks in the month containing `t`, e.g. 4.0 for a
    /// 28-day February.
    pub fn weeks_in_month(&self, t: OffsetDateTime) -> f64 {
        f64::from(self.days_in_month(t)) / DAYS_IN_WEEK as f64
    }

    /// Whether `a` and `b` fall in the same calendar week.
    pub fn is_same_week(&self, a: OffsetDateTime, b: OffsetDateTime) -> bool {
        self.start_of_week(a) == self.start_of_week(b)
    }

    /// The wall-clock date and time of `t` in the calendar's timezone, or
    /// `None` if it falls outside the supported date range.
    fn local(&self, t: OffsetDateTime) -> Option<PrimitiveDateTime> {
        let offset = self.timezone.get_offset_utc(&t).to_utc();
        let local = t.checked_to_offset(offset)?;

        Some(PrimitiveDateTime::new(local.date(), local.time()))
    }

    /// Like [Calendar::local], but falls back to the wall-clock date and time
    /// of `t` in its own offset.
    fn local_or_input(&self, t: OffsetDateTime) -> PrimitiveDateTime {
        self.local(t).unwrap_or_else(|| {
            let t = fall_back(t);
            PrimitiveDateTime::new(t.date(), t.time())
        })
    }

    /// Attach the calendar's timezone to a local date-time, or return
    /// `fallback` if the local date-time does not exist.
    ///
    /// Ambiguous local times resolve to the earlier instant.
    fn resolve_or(&self, local: PrimitiveDateTime, fallback: OffsetDateTime) -> OffsetDateTime {
        match local.assume_timezone(self.timezone) {
            OffsetResult::Some(date_time) => date_time,
            OffsetResult::Ambiguous(earliest, _) => earliest,
            OffsetResult::None => fall_back(fallback),
        }
    }
}

fn fall_back(t: OffsetDateTime) -> OffsetDateTime {
    tracing::debug!("Calendar computation failed for {t}, falling back to the input timestamp.");
    t
}

/// The number of days from the most recent `first` weekday to `weekday`.
fn days_since(weekday: Weekday, first: Weekday) -> i64 {
    let weekday = i64::from(weekday.number_days_from_monday());
    let first = i64::from(first.number_days_from_monday());

    (weekday - first).rem_euclid(DAYS_IN_WEEK)
}

fn shift_months(date: Date, months: i32) -> Option<Date> {
    let month_index =
        i64::from(date.year()) * 12 + i64::from(u8::from(date.month())) - 1 + i64::from(months);

    let year = i32::try_from(month_index.div_euclid(12)).ok()?;
    let month = Month::try_from(u8::try_from(month_index.rem_euclid(12) + 1).ok()?).ok()?;
    let day = date.day().min(month.length(year));

    Date::from_calendar_date(year, month, day).ok()
}

/// Get the first day of the week for a locale such as "en_GB" or "en-US".
///
/// Locales without a region, or with a region not known to start weeks on
/// Sunday, start weeks on Monday.
pub fn first_weekday_for_locale(locale: &str) -> Weekday {
    let region = locale.split(['_', '-']).nth(1).unwrap_or_default();

    if SUNDAY_FIRST_REGIONS.contains(&region) {
        Weekday::Sunday
    } else {
        Weekday::Monday
    }
}
