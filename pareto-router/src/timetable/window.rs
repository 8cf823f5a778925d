//! Time-window queries over a route edge's events.
//!
//! Events of a route edge are stored once, relative to the day their trip
//! starts, and repeat on every day their [`DayMask`](super::DayMask) allows.
//! A window query binary-searches each candidate day and merges the per-day
//! runs lazily, so callers see events in strict time order.

use serde::{Deserialize, Serialize};

use crate::domain::{MINUTES_A_DAY, Time};

use super::{LightConnection, RouteEdge};

/// Direction in which a search moves through time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[default]
    Forward,
    Backward,
}

/// One concrete trip instance on a route edge.
#[derive(Debug, Clone, Copy)]
pub struct Event<'a> {
    /// Trip index on the route (also the index into the edge's events).
    pub trip: u32,
    /// Schedule day on which the trip instance started.
    pub day: u32,
    pub departure: Time,
    pub arrival: Time,
    pub connection: &'a LightConnection,
}

impl<'a> Event<'a> {
    /// Builds the instance of `trip` started on `day`.
    pub fn instance(events: &'a [LightConnection], trip: u32, day: u32) -> Option<Self> {
        let connection = events.get(trip as usize)?;
        Some(Self {
            trip,
            day,
            departure: Time::from_day(day, connection.departure),
            arrival: Time::from_day(day, connection.arrival),
            connection,
        })
    }
}

#[derive(Debug, Clone, Copy)]
struct DayRun {
    day: u32,
    lo: usize,
    hi: usize,
}

/// Lazy sequence of events whose departure (forward) or arrival
/// (backward) lies in a half-open window.
///
/// Forward windows yield ascending departures; backward windows yield
/// descending arrivals.
#[derive(Debug, Clone)]
pub struct EventsInWindow<'a> {
    events: &'a [LightConnection],
    direction: Direction,
    runs: Vec<DayRun>,
}

impl<'a> EventsInWindow<'a> {
    /// Events of `edge` with key time in `[begin, end)`, limited to the
    /// first `day_count` schedule days.
    pub fn new(
        edge: &'a RouteEdge,
        begin: Time,
        end: Time,
        direction: Direction,
        day_count: u32,
    ) -> Self {
        let events = edge.events.as_slice();
        let mut runs = Vec::new();

        let (key_min, key_max) = match direction {
            Direction::Forward => (edge.min_departure, edge.max_departure),
            Direction::Backward => (edge.min_arrival, edge.max_arrival),
        };
        let key = |e: &LightConnection| match direction {
            Direction::Forward => e.departure,
            Direction::Backward => e.arrival,
        };

        let (begin, end) = (begin.minutes(), end.minutes());
        if !events.is_empty() && begin < end && day_count > 0 && end - 1 >= key_min {
            let first_day = begin.saturating_sub(key_max).div_ceil(MINUTES_A_DAY);
            let last_day = ((end - 1 - key_min) / MINUTES_A_DAY).min(day_count - 1);

            for day in first_day..=last_day {
                let base = day * MINUTES_A_DAY;
                let lo = events.partition_point(|e| base + key(e) < begin);
                let hi = events.partition_point(|e| base + key(e) < end);
                if lo < hi {
                    runs.push(DayRun { day, lo, hi });
                }
            }
        }

        Self {
            events,
            direction,
            runs,
        }
    }

    fn key_time(&self, run: &DayRun, idx: usize) -> u32 {
        let e = &self.events[idx];
        let key = match self.direction {
            Direction::Forward => e.departure,
            Direction::Backward => e.arrival,
        };
        run.day * MINUTES_A_DAY + key
    }

    fn take_next(&mut self) -> Option<(u32, usize)> {
        let mut best: Option<(usize, u32)> = None;
        for (i, run) in self.runs.iter().enumerate() {
            if run.lo >= run.hi {
                continue;
            }
            let t = match self.direction {
                Direction::Forward => self.key_time(run, run.lo),
                Direction::Backward => self.key_time(run, run.hi - 1),
            };
            let better = match (best, self.direction) {
                (None, _) => true,
                (Some((_, bt)), Direction::Forward) => t < bt,
                (Some((_, bt)), Direction::Backward) => t > bt,
            };
            if better {
                best = Some((i, t));
            }
        }

        let (i, _) = best?;
        let run = &mut self.runs[i];
        let idx = match self.direction {
            Direction::Forward => {
                run.lo += 1;
                run.lo - 1
            }
            Direction::Backward => {
                run.hi -= 1;
                run.hi
            }
        };
        Some((run.day, idx))
    }
}

impl<'a> Iterator for EventsInWindow<'a> {
    type Item = Event<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (day, idx) = self.take_next()?;
            if !self.events[idx].days.runs_on(day) {
                continue;
            }
            return Event::instance(self.events, idx as u32, day);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timetable::{DayMask, InfoId};

    fn edge(times: &[(u32, u32)]) -> RouteEdge {
        RouteEdge::new(
            times
                .iter()
                .map(|&(d, a)| LightConnection::new(d, a, InfoId(0)))
                .collect(),
        )
    }

    fn deps(it: EventsInWindow<'_>) -> Vec<u32> {
        it.map(|e| e.departure.minutes()).collect()
    }

    #[test]
    fn forward_window_on_one_day() {
        let e = edge(&[(480, 500), (540, 560), (600, 620)]);
        let it = EventsInWindow::new(
            &e,
            Time::from_minutes(500),
            Time::from_minutes(600),
            Direction::Forward,
            1,
        );
        assert_eq!(deps(it), vec![540]);
    }

    #[test]
    fn forward_window_wraps_to_next_day() {
        let e = edge(&[(60, 90), (1380, 1400)]);
        let it = EventsInWindow::new(
            &e,
            Time::from_minutes(1300),
            Time::from_day(1, 100),
            Direction::Forward,
            3,
        );
        assert_eq!(deps(it), vec![1380, MINUTES_A_DAY + 60]);
    }

    #[test]
    fn forward_window_merges_overnight_runs() {
        // Departures relative to the trip's start day: 23:50 and 24:20.
        let e = edge(&[(1430, 1450), (1460, 1480)]);
        let it = EventsInWindow::new(
            &e,
            Time::from_day(1, 0),
            Time::from_day(2, 0),
            Direction::Forward,
            3,
        );
        // Day 0's 24:20 trip departs at day 1 00:20, before day 1's 23:50 trip.
        assert_eq!(
            deps(it),
            vec![MINUTES_A_DAY + 20, MINUTES_A_DAY + 1430]
        );
    }

    #[test]
    fn backward_window_descends_by_arrival() {
        let e = edge(&[(480, 500), (540, 560), (600, 620)]);
        let it = EventsInWindow::new(
            &e,
            Time::from_minutes(0),
            Time::from_minutes(561),
            Direction::Backward,
            1,
        );
        let arrivals: Vec<u32> = it.map(|e| e.arrival.minutes()).collect();
        assert_eq!(arrivals, vec![560, 500]);
    }

    #[test]
    fn respects_day_mask_and_day_count() {
        let mut e = edge(&[(480, 500)]);
        e.events[0].days = DayMask::from_days([1]).unwrap();
        let it = EventsInWindow::new(
            &e,
            Time::ZERO,
            Time::from_day(5, 0),
            Direction::Forward,
            2,
        );
        let days: Vec<u32> = it.map(|e| e.day).collect();
        assert_eq!(days, vec![1]);
    }

    #[test]
    fn empty_window() {
        let e = edge(&[(480, 500)]);
        let it = EventsInWindow::new(
            &e,
            Time::from_minutes(500),
            Time::from_minutes(500),
            Direction::Forward,
            1,
        );
        assert_eq!(it.count(), 0);
    }

    #[test]
    fn instance_offsets_by_day() {
        let e = edge(&[(480, 500)]);
        let ev = Event::instance(&e.events, 0, 2).unwrap();
        assert_eq!(ev.departure, Time::from_day(2, 480));
        assert_eq!(ev.arrival, Time::from_day(2, 500));
        assert!(Event::instance(&e.events, 1, 0).is_none());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use crate::timetable::InfoId;
    use proptest::prelude::*;

    fn sorted_events() -> impl Strategy<Value = Vec<u32>> {
        prop::collection::vec(0u32..2000, 1..12).prop_map(|mut v| {
            v.sort_unstable();
            v
        })
    }

    proptest! {
        /// The lazy window equals a brute-force scan over all days.
        #[test]
        fn matches_brute_force(
            departures in sorted_events(),
            begin in 0u32..4000,
            len in 0u32..3000,
        ) {
            let edge = RouteEdge::new(
                departures
                    .iter()
                    .map(|&d| LightConnection::new(d, d + 10, InfoId(0)))
                    .collect(),
            );
            let days = 3;
            let got: Vec<u32> = EventsInWindow::new(
                &edge,
                Time::from_minutes(begin),
                Time::from_minutes(begin + len),
                Direction::Forward,
                days,
            )
            .map(|e| e.departure.minutes())
            .collect();

            let mut expected: Vec<u32> = (0..days)
                .flat_map(|day| departures.iter().map(move |&d| day * MINUTES_A_DAY + d))
                .filter(|&t| t >= begin && t < begin + len)
                .collect();
            expected.sort_unstable();

            prop_assert_eq!(got, expected);
        }
    }
}
