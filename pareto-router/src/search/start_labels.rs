//! Start times of a search.
//!
//! A pre-trip search starts once for every distinct departure (forward)
//! or arrival (backward) in the query interval, at the origin or at a
//! station one walk away. Walk starts are shifted by the walk duration so
//! that every label starts at the origin.

use tracing::trace;

use crate::domain::Time;
use crate::timetable::{Direction, EdgeKind, NodeId, Timetable};

use super::query_graph::QueryGraph;
use super::request::TripType;

/// Distinct start times at `origin` for `[begin, end]`, ascending.
pub fn start_times(
    graph: &QueryGraph<'_>,
    origin: NodeId,
    begin: Time,
    end: Time,
    trip_type: TripType,
    direction: Direction,
) -> Vec<Time> {
    if trip_type == TripType::OnTrip {
        let at = match direction {
            Direction::Forward => begin,
            Direction::Backward => end,
        };
        return vec![at];
    }

    let tt = graph.timetable();
    let mut times = station_events(tt, origin, begin, end, direction);

    for edge in graph.edges(origin, direction) {
        let walk = match &graph.edge(edge).kind {
            EdgeKind::Foot(f) => f.duration,
            EdgeKind::Mumo(m) if m.window.is_none() => m.duration,
            _ => continue,
        };
        let other = graph.target(edge, direction);
        let shifted: Vec<Time> = match direction {
            Direction::Forward => {
                let (Some(b), Some(e)) = (begin.checked_add(walk), end.checked_add(walk)) else {
                    continue;
                };
                station_events(tt, other, b, e, direction)
                    .into_iter()
                    .filter_map(|t| t.checked_sub(walk))
                    .collect()
            }
            Direction::Backward => {
                let Some(e) = end.checked_sub(walk) else {
                    continue;
                };
                station_events(tt, other, begin.saturating_sub(walk), e, direction)
                    .into_iter()
                    .filter_map(|t| t.checked_add(walk))
                    .collect()
            }
        };
        trace!(node = other.0, walk, count = shifted.len(), "walk start times");
        times.extend(shifted);
    }

    times.sort_unstable();
    times.dedup();
    times
}

/// Departures (forward) or arrivals (backward) of vehicles at a station
/// node in `[begin, end]`.
fn station_events(
    tt: &Timetable,
    station: NodeId,
    begin: Time,
    end: Time,
    direction: Direction,
) -> Vec<Time> {
    let end = end.saturating_add(1);
    let adjacent = |node: NodeId| match direction {
        Direction::Forward => tt.out_edges(node),
        Direction::Backward => tt.in_edges(node),
    };

    let mut times = Vec::new();
    for &access_edge in adjacent(station) {
        let edge = tt.edge(access_edge);
        let route_node = match (&edge.kind, direction) {
            (EdgeKind::Enter, Direction::Forward) => edge.to,
            (EdgeKind::Exit, Direction::Backward) => edge.from,
            _ => continue,
        };
        for &id in adjacent(route_node) {
            let EdgeKind::Route(route) = &tt.edge(id).kind else {
                continue;
            };
            times.extend(
                tt.events_in_window(route, begin, end, direction)
                    .map(|e| match direction {
                        Direction::Forward => e.departure,
                        Direction::Backward => e.arrival,
                    }),
            );
        }
    }
    times
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SchedulePeriod;
    use crate::timetable::{ConnectionInfo, TimetableBuilder, TripSpec};
    use chrono::NaiveDate;

    /// A -> B at 08:00, 09:00, 09:00 (a second line), 10:00; C walks 5
    /// minutes to A; B -> C trip arrives 11:00.
    fn timetable() -> Timetable {
        let mut b = TimetableBuilder::new(SchedulePeriod::new(
            NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            1,
        ));
        let cat = b.add_category("RB");
        let a = b.add_station("A", "A", 2).unwrap();
        let bb = b.add_station("B", "B", 2).unwrap();
        let c = b.add_station("C", "C", 2).unwrap();
        let info = b.add_info(ConnectionInfo {
            category: cat,
            train_nr: 1,
            line: String::new(),
            attributes: vec![],
            price: 0,
        });
        let trip = |dep: u32| TripSpec::daily(info, &[(None, Some(dep)), (Some(dep + 30), None)]);
        b.add_route(&[a, bb], vec![trip(480), trip(540), trip(600)])
            .unwrap();
        b.add_route(&[a, bb], vec![trip(540)]).unwrap();
        b.add_route(&[bb, c], vec![trip(630)]).unwrap();
        b.add_footpath(c, a, 5).unwrap();
        b.build()
    }

    fn node(tt: &Timetable, id: &str) -> NodeId {
        tt.station(tt.station_by_id(id).unwrap()).node
    }

    fn t(m: u32) -> Time {
        Time::from_minutes(m)
    }

    #[test]
    fn pre_trip_departures_are_distinct() {
        let tt = timetable();
        let g = QueryGraph::new(&tt, &[]);
        let times = start_times(&g, node(&tt, "A"), t(480), t(600), TripType::PreTrip, Direction::Forward);
        assert_eq!(times, vec![t(480), t(540), t(600)]);

        let narrow = start_times(&g, node(&tt, "A"), t(481), t(599), TripType::PreTrip, Direction::Forward);
        assert_eq!(narrow, vec![t(540)]);
    }

    #[test]
    fn walk_starts_are_shifted() {
        let tt = timetable();
        let g = QueryGraph::new(&tt, &[]);
        // From C: no departures, but A is five minutes away.
        let times = start_times(&g, node(&tt, "C"), t(470), t(540), TripType::PreTrip, Direction::Forward);
        assert_eq!(times, vec![t(475), t(535)]);
    }

    #[test]
    fn backward_uses_arrivals() {
        let tt = timetable();
        let g = QueryGraph::new(&tt, &[]);
        let times = start_times(&g, node(&tt, "B"), t(500), t(600), TripType::PreTrip, Direction::Backward);
        assert_eq!(times, vec![t(510), t(570)]);

        // Arriving at A means walking in from C.
        let walk = start_times(&g, node(&tt, "A"), t(600), t(700), TripType::PreTrip, Direction::Backward);
        assert_eq!(walk, vec![t(665)]);
    }

    #[test]
    fn on_trip_uses_interval_edge() {
        let tt = timetable();
        let g = QueryGraph::new(&tt, &[]);
        let a = node(&tt, "A");
        assert_eq!(
            start_times(&g, a, t(100), t(200), TripType::OnTrip, Direction::Forward),
            vec![t(100)]
        );
        assert_eq!(
            start_times(&g, a, t(100), t(200), TripType::OnTrip, Direction::Backward),
            vec![t(200)]
        );
    }
}
