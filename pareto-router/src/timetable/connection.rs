//! Scheduled events ("light connections") and their shared metadata.

use serde::{Deserialize, Serialize};

/// Index into the timetable's category table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CategoryId(pub u16);

/// Index into the timetable's connection-info table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InfoId(pub u32);

/// Index into the timetable's track-name table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TrackId(pub u16);

/// A service attribute such as "bicycles carried".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceAttribute {
    pub code: String,
    pub text: String,
}

/// Metadata shared by every section of one trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionInfo {
    pub category: CategoryId,
    pub train_nr: u32,
    pub line: String,
    pub attributes: Vec<ServiceAttribute>,
    /// Price for riding one route edge.
    pub price: u32,
}

/// Set of schedule days on which a trip instance starts.
///
/// Bit `d` set means the trip runs when started on schedule day `d`.
/// Schedules are limited to [`DayMask::MAX_DAYS`] days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DayMask(u64);

impl DayMask {
    /// Maximum number of schedule days a mask can describe.
    pub const MAX_DAYS: u32 = 64;

    /// Runs on every day.
    pub const ALL: DayMask = DayMask(u64::MAX);

    /// Runs on no day.
    pub const NONE: DayMask = DayMask(0);

    /// Creates a mask from explicit day indices.
    ///
    /// Returns `None` if a day is beyond [`DayMask::MAX_DAYS`].
    pub fn from_days(days: impl IntoIterator<Item = u32>) -> Option<Self> {
        let mut bits = 0u64;
        for day in days {
            if day >= Self::MAX_DAYS {
                return None;
            }
            bits |= 1 << day;
        }
        Some(Self(bits))
    }

    /// Returns true if the trip starts on `day`.
    pub fn runs_on(self, day: u32) -> bool {
        day < Self::MAX_DAYS && self.0 & (1 << day) != 0
    }

    /// Returns the highest day with a set bit.
    pub fn last_day(self) -> Option<u32> {
        (self.0 != 0).then(|| 63 - self.0.leading_zeros())
    }
}

/// One scheduled vehicle traversing one route edge.
///
/// Times are minutes relative to midnight of the day the trip instance
/// starts; they may exceed a day for overnight trips.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LightConnection {
    pub departure: u32,
    pub arrival: u32,
    pub info: InfoId,
    pub days: DayMask,
    pub departure_track: Option<TrackId>,
    pub arrival_track: Option<TrackId>,
}

impl LightConnection {
    /// Creates a daily connection without track information.
    pub fn new(departure: u32, arrival: u32, info: InfoId) -> Self {
        Self {
            departure,
            arrival,
            info,
            days: DayMask::ALL,
            departure_track: None,
            arrival_track: None,
        }
    }

    /// Ride time in minutes.
    pub fn duration(&self) -> u32 {
        self.arrival - self.departure
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_mask_membership() {
        let mask = DayMask::from_days([0, 2, 63]).unwrap();
        assert!(mask.runs_on(0));
        assert!(!mask.runs_on(1));
        assert!(mask.runs_on(2));
        assert!(mask.runs_on(63));
        assert!(!mask.runs_on(64));
        assert_eq!(mask.last_day(), Some(63));
    }

    #[test]
    fn day_mask_rejects_out_of_range() {
        assert_eq!(DayMask::from_days([64]), None);
        assert_eq!(DayMask::NONE.last_day(), None);
        assert!(!DayMask::NONE.runs_on(0));
        assert!(DayMask::ALL.runs_on(10));
    }

    #[test]
    fn connection_duration() {
        let c = LightConnection::new(1430, 1450, InfoId(0));
        assert_eq!(c.duration(), 20);
        assert_eq!(c.days, DayMask::ALL);
    }
}
