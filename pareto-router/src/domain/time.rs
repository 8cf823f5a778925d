//! Schedule time handling.
//!
//! The search works on whole minutes counted from midnight of the first day
//! of the schedule period. Trips repeat daily, so a time also has a day index
//! and a local minute-of-day that wraps at [`MINUTES_A_DAY`].

use std::fmt;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// Number of minutes in one schedule day.
pub const MINUTES_A_DAY: u32 = 1440;

/// Error returned when parsing an invalid time string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid time: {reason}")]
pub struct TimeError {
    reason: &'static str,
}

impl TimeError {
    fn new(reason: &'static str) -> Self {
        Self { reason }
    }
}

/// A point in schedule time, in minutes since the start of the period.
///
/// # Examples
///
/// ```
/// use pareto_router::domain::Time;
///
/// let t = Time::parse_hhmm("25:10", 0).unwrap();
/// assert_eq!(t.day(), 1);
/// assert_eq!(t.minute_of_day(), 70);
/// assert_eq!(t.to_string(), "01:10+1");
/// ```
#[derive(
    Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Time(u32);

impl Time {
    /// Start of the schedule period.
    pub const ZERO: Time = Time(0);

    /// Creates a time from an absolute minute count.
    pub const fn from_minutes(minutes: u32) -> Self {
        Self(minutes)
    }

    /// Creates a time from a day index and a minute offset into that day.
    ///
    /// The offset may exceed [`MINUTES_A_DAY`]; overnight trips store their
    /// later events relative to the day the trip started.
    pub const fn from_day(day: u32, offset: u32) -> Self {
        Self(day * MINUTES_A_DAY + offset)
    }

    /// Parse "HH:MM" relative to the given day.
    ///
    /// Hours up to 47 are accepted so that overnight events can be written
    /// relative to the trip's start day ("24:15" is 00:15 the next day).
    pub fn parse_hhmm(s: &str, day: u32) -> Result<Self, TimeError> {
        if s.len() != 5 {
            return Err(TimeError::new("expected HH:MM format"));
        }

        let bytes = s.as_bytes();
        if bytes[2] != b':' {
            return Err(TimeError::new("expected colon at position 2"));
        }

        let hour =
            parse_two_digits(&bytes[0..2]).ok_or_else(|| TimeError::new("invalid hour digits"))?;
        if hour > 47 {
            return Err(TimeError::new("hour must be 0-47"));
        }

        let minute = parse_two_digits(&bytes[3..5])
            .ok_or_else(|| TimeError::new("invalid minute digits"))?;
        if minute > 59 {
            return Err(TimeError::new("minute must be 0-59"));
        }

        Ok(Self::from_day(day, hour * 60 + minute))
    }

    /// Returns the absolute minute count.
    pub const fn minutes(self) -> u32 {
        self.0
    }

    /// Returns the index of the day this time falls on.
    pub const fn day(self) -> u32 {
        self.0 / MINUTES_A_DAY
    }

    /// Returns the local minute of the day (0-1439).
    pub const fn minute_of_day(self) -> u32 {
        self.0 % MINUTES_A_DAY
    }

    /// Add minutes, returning `None` on overflow.
    pub fn checked_add(self, minutes: u32) -> Option<Self> {
        self.0.checked_add(minutes).map(Self)
    }

    /// Subtract minutes, returning `None` before the start of the period.
    pub fn checked_sub(self, minutes: u32) -> Option<Self> {
        self.0.checked_sub(minutes).map(Self)
    }

    /// Add minutes, clamping at the largest representable time.
    pub fn saturating_add(self, minutes: u32) -> Self {
        Self(self.0.saturating_add(minutes))
    }

    /// Subtract minutes, clamping at the start of the period.
    pub fn saturating_sub(self, minutes: u32) -> Self {
        Self(self.0.saturating_sub(minutes))
    }

    /// Absolute distance between two times in minutes.
    pub fn abs_diff(self, other: Self) -> u32 {
        self.0.abs_diff(other.0)
    }
}

impl fmt::Debug for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Time(day {} {:02}:{:02})",
            self.day(),
            self.minute_of_day() / 60,
            self.minute_of_day() % 60
        )
    }
}

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = self.minute_of_day();
        write!(f, "{:02}:{:02}", m / 60, m % 60)?;
        if self.day() > 0 {
            write!(f, "+{}", self.day())?;
        }
        Ok(())
    }
}

/// Parse two ASCII digit bytes into a u32.
fn parse_two_digits(bytes: &[u8]) -> Option<u32> {
    if bytes.len() != 2 {
        return None;
    }
    let d1 = (bytes[0] as char).to_digit(10)?;
    let d2 = (bytes[1] as char).to_digit(10)?;
    Some(d1 * 10 + d2)
}

/// The calendar span covered by a timetable.
///
/// Maps between unix timestamps (seconds, UTC) and schedule [`Time`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulePeriod {
    first_day: NaiveDate,
    begin_unix: i64,
    days: u32,
}

impl SchedulePeriod {
    /// Creates a period of `days` days starting at midnight UTC of `first_day`.
    pub fn new(first_day: NaiveDate, days: u32) -> Self {
        let begin_unix = first_day.and_time(NaiveTime::MIN).and_utc().timestamp();
        Self {
            first_day,
            begin_unix,
            days,
        }
    }

    /// Returns the first calendar day.
    pub fn first_day(&self) -> NaiveDate {
        self.first_day
    }

    /// Returns the number of schedule days.
    pub fn days(&self) -> u32 {
        self.days
    }

    /// Returns the first instant after the period.
    pub fn end(&self) -> Time {
        Time::from_day(self.days, 0)
    }

    /// Converts a unix timestamp into schedule time.
    ///
    /// Returns `None` if the timestamp lies before the period or after its
    /// last day. Seconds are truncated to the minute.
    pub fn to_time(&self, unix: i64) -> Option<Time> {
        let offset = unix.checked_sub(self.begin_unix)?;
        if offset < 0 {
            return None;
        }
        let minutes = u32::try_from(offset / 60).ok()?;
        let time = Time::from_minutes(minutes);
        (time <= self.end()).then_some(time)
    }

    /// Like [`Self::to_time`], but rounds seconds up to the next minute.
    pub fn to_time_ceil(&self, unix: i64) -> Option<Time> {
        let rem = unix.checked_sub(self.begin_unix)?.rem_euclid(60);
        let rounded = if rem == 0 { unix } else { unix.checked_add(60 - rem)? };
        self.to_time(rounded)
    }

    /// Converts schedule time into a unix timestamp.
    pub fn to_unix(&self, time: Time) -> i64 {
        self.begin_unix + i64::from(time.minutes()) * 60
    }
}
