//! Ordering of search results.

use std::cmp::Ordering;

use crate::domain::Journey;

/// Rank journeys for presentation.
///
/// Journeys are ordered by:
/// 1. Departure time (earlier first)
/// 2. Duration (shorter first)
/// 3. Transfers (fewer first)
/// 4. Price (cheaper first)
pub fn rank_journeys(mut journeys: Vec<Journey>) -> Vec<Journey> {
    journeys.sort_by(compare);
    journeys
}

fn compare(a: &Journey, b: &Journey) -> Ordering {
    a.departure_time()
        .cmp(&b.departure_time())
        .then(a.duration.cmp(&b.duration))
        .then(a.transfers.cmp(&b.transfers))
        .then(a.price.cmp(&b.price))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Move, Stop, StopEvent, Transport};

    fn journey(departure: i64, duration: u32, transfers: u32, price: u32) -> Journey {
        let mut from = Stop::new("A", "A");
        from.departure = Some(StopEvent {
            time: departure,
            platform: None,
        });
        let mut to = Stop::new("B", "B");
        to.arrival = Some(StopEvent {
            time: departure + i64::from(duration) * 60,
            platform: None,
        });
        let ride = Transport {
            from: 0,
            to: 1,
            movement: Move::Connection {
                category: "RE".into(),
                train_nr: 1,
                line: String::new(),
                duration,
            },
        };
        Journey::new(vec![from, to], vec![ride], vec![], duration, transfers, price).unwrap()
    }

    #[test]
    fn rank_by_departure_first() {
        let ranked = rank_journeys(vec![journey(600, 10, 0, 0), journey(0, 90, 2, 50)]);
        assert_eq!(ranked[0].departure_time(), Some(0));
        assert_eq!(ranked[1].departure_time(), Some(600));
    }

    #[test]
    fn ties_broken_by_duration_transfers_price() {
        let ranked = rank_journeys(vec![
            journey(0, 60, 1, 5),
            journey(0, 60, 0, 9),
            journey(0, 50, 3, 9),
            journey(0, 60, 0, 2),
        ]);
        let keys: Vec<(u32, u32, u32)> = ranked
            .iter()
            .map(|j| (j.duration, j.transfers, j.price))
            .collect();
        assert_eq!(keys, vec![(50, 3, 9), (60, 0, 2), (60, 0, 9), (60, 1, 5)]);
    }

    #[test]
    fn empty_is_empty() {
        assert!(rank_journeys(Vec::new()).is_empty());
    }
}
