//! Cost of traversing one edge from a label.
//!
//! Forward search moves from `edge.from` to `edge.to` and time increases;
//! backward search traverses edges in reverse and time decreases. In both
//! cases the cost is a non-negative duration.

use crate::domain::{MINUTES_A_DAY, Time};
use crate::timetable::{
    Direction, EdgeId, EdgeKind, Event, HotelEdge, MumoEdge, MumoWindow, RouteEdge, StationIdx,
    Timetable,
};

use super::SearchError;
use super::criteria::CriteriaSet;
use super::label::{Label, Ride, UsedConnection};
use super::query_graph::{EdgeRef, QueryGraph};

/// Effect of one edge on a label.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EdgeCost {
    /// Minutes, including waiting.
    pub time: u32,
    pub price: u32,
    /// A vehicle is boarded after an earlier one.
    pub transfer: bool,
    /// Event used, for route edges.
    pub connection: Option<UsedConnection>,
    /// Trip instance ridden after the edge.
    pub ride: Option<Ride>,
    /// Successor waits on a route node to board.
    pub boarding: bool,
    /// The edge is a hotel stay.
    pub hotel: bool,
}

/// Computes the cost of `edge` from `label`, or `None` if the edge cannot
/// be used from the label's state.
///
/// `horizon` caps how far from the label's start a boarding may look.
///
/// # Errors
///
/// Returns [`SearchError::GraphInconsistency`] if the trip a label rides
/// has no usable event on the next route edge.
pub fn edge_cost<C: CriteriaSet>(
    graph: &QueryGraph<'_>,
    label: &Label<C>,
    edge: EdgeRef,
    direction: Direction,
    horizon: u32,
) -> Result<Option<EdgeCost>, SearchError> {
    let tt = graph.timetable();
    let kind = &graph.edge(edge).kind;
    let at_station = label.ride.is_none() && !label.boarding;
    if kind.tag().is_walk() && !at_station {
        return Ok(None);
    }

    let cost = match (kind, direction) {
        (EdgeKind::Enter, Direction::Forward) | (EdgeKind::Exit, Direction::Backward) => {
            at_station.then(|| EdgeCost {
                boarding: true,
                ..EdgeCost::default()
            })
        }
        (EdgeKind::Exit, Direction::Forward) | (EdgeKind::Enter, Direction::Backward) => {
            label.ride.map(|_| EdgeCost::default())
        }
        (EdgeKind::Route(route), _) => {
            let EdgeRef::Graph(id) = edge else {
                return Ok(None);
            };
            let station = tt.node(label.node).station();
            return route_cost(tt, label, id, route, station, direction, horizon);
        }
        (EdgeKind::Through(through), _) => label.ride.and_then(|ride| {
            let trip = match direction {
                Direction::Forward => through.forward(ride.trip),
                Direction::Backward => through.backward(ride.trip),
            }?;
            Some(EdgeCost {
                ride: Some(Ride { trip, day: ride.day }),
                ..EdgeCost::default()
            })
        }),
        (EdgeKind::Foot(foot), _) => Some(EdgeCost {
            time: foot.duration,
            price: foot.price,
            ..EdgeCost::default()
        }),
        (EdgeKind::Mumo(mumo), _) => mumo_time(mumo, label.now, direction)
            .filter(|&time| !label.pinned || time == mumo.duration)
            .map(|time| EdgeCost {
                time,
                price: mumo.price,
                ..EdgeCost::default()
            }),
        // Pinned labels may not wait.
        (EdgeKind::Hotel(hotel), _) => (!label.hotel && !label.pinned).then(|| EdgeCost {
            time: hotel_stay(hotel, label.now, direction),
            price: hotel.price,
            hotel: true,
            ..EdgeCost::default()
        }),
    };
    Ok(cost)
}

fn route_cost<C: CriteriaSet>(
    tt: &Timetable,
    label: &Label<C>,
    edge: EdgeId,
    route: &RouteEdge,
    station: StationIdx,
    direction: Direction,
    horizon: u32,
) -> Result<Option<EdgeCost>, SearchError> {
    let now = label.now;

    if let Some(ride) = label.ride {
        let inconsistent = || {
            SearchError::GraphInconsistency(format!(
                "trip {} on day {} has no usable event on route edge {}",
                ride.trip, ride.day, edge.0
            ))
        };
        let event = Event::instance(&route.events, ride.trip, ride.day)
            .ok_or_else(inconsistent)?;
        let time = match direction {
            Direction::Forward if event.departure >= now => event.arrival.minutes() - now.minutes(),
            Direction::Backward if event.arrival <= now => now.minutes() - event.departure.minutes(),
            _ => return Err(inconsistent()),
        };
        let info = tt.info(event.connection.info);
        return Ok(Some(EdgeCost {
            time,
            price: info.price,
            transfer: false,
            connection: Some(UsedConnection {
                edge,
                trip: ride.trip,
                day: ride.day,
                category: info.category,
            }),
            ride: Some(ride),
            boarding: false,
            hotel: false,
        }));
    }

    if !label.boarding {
        return Ok(None);
    }

    let last = label.last_connection;
    let change = |category| match last {
        Some(prev) => match direction {
            Direction::Forward => tt.interchange_time(station, prev.category, category),
            Direction::Backward => tt.interchange_time(station, category, prev.category),
        },
        None => 0,
    };

    let (begin, end) = match (direction, label.pinned) {
        (_, true) => (now, now.saturating_add(1)),
        (Direction::Forward, false) => (now, label.start.saturating_add(horizon + 1)),
        (Direction::Backward, false) => (label.start.saturating_sub(horizon), now.saturating_add(1)),
    };

    let chosen = tt
        .events_in_window(route, begin, end, direction)
        .find(|event| {
            let category = tt.info(event.connection.info).category;
            let change = change(category);
            match direction {
                Direction::Forward => event.departure >= now.saturating_add(change),
                Direction::Backward => event.arrival.saturating_add(change) <= now,
            }
        });
    let Some(event) = chosen else {
        return Ok(None);
    };

    let info = tt.info(event.connection.info);
    let time = match direction {
        Direction::Forward => event.arrival.minutes() - now.minutes(),
        Direction::Backward => now.minutes() - event.departure.minutes(),
    };
    Ok(Some(EdgeCost {
        time,
        price: info.price,
        transfer: last.is_some(),
        connection: Some(UsedConnection {
            edge,
            trip: event.trip,
            day: event.day,
            category: info.category,
        }),
        ride: Some(Ride {
            trip: event.trip,
            day: event.day,
        }),
        boarding: false,
        hotel: false,
    }))
}

/// Equal bounds mean open all day.
fn in_daily_window(minute: u32, begin: u32, end: u32) -> bool {
    if begin == end {
        true
    } else if begin < end {
        begin <= minute && minute < end
    } else {
        minute >= begin || minute < end
    }
}

/// Minutes including any wait for the window to open (forward) or the
/// latest departure inside it (backward).
fn mumo_time(mumo: &MumoEdge, now: Time, direction: Direction) -> Option<u32> {
    let Some(window) = mumo.window else {
        return Some(mumo.duration);
    };

    match direction {
        Direction::Forward => {
            let wait = match window {
                MumoWindow::Absolute { begin, end } => {
                    let departure = now.max(begin);
                    if departure >= end {
                        return None;
                    }
                    departure.minutes() - now.minutes()
                }
                MumoWindow::Daily { begin, end } => {
                    let minute = now.minute_of_day();
                    if in_daily_window(minute, begin, end) {
                        0
                    } else {
                        (begin + MINUTES_A_DAY - minute) % MINUTES_A_DAY
                    }
                }
            };
            wait.checked_add(mumo.duration)
        }
        Direction::Backward => {
            let departure = now.checked_sub(mumo.duration)?;
            let early = match window {
                MumoWindow::Absolute { begin, end } => {
                    let latest = departure.min(end.checked_sub(1)?);
                    if latest < begin {
                        return None;
                    }
                    departure.minutes() - latest.minutes()
                }
                MumoWindow::Daily { begin, end } => {
                    let minute = departure.minute_of_day();
                    if in_daily_window(minute, begin, end) {
                        0
                    } else {
                        let last = (end + MINUTES_A_DAY - 1) % MINUTES_A_DAY;
                        (minute + MINUTES_A_DAY - last) % MINUTES_A_DAY
                    }
                }
            };
            let time = mumo.duration + early;
            (time <= now.minutes()).then_some(time)
        }
    }
}

/// Forward: stay until the next checkout. Backward: the stay ends at
/// `now` and is as long as the time since that day's checkout. Never
/// shorter than the minimum stay.
fn hotel_stay(hotel: &HotelEdge, now: Time, direction: Direction) -> u32 {
    let minute = now.minute_of_day();
    let until = match direction {
        Direction::Forward => (hotel.checkout_time + MINUTES_A_DAY - minute) % MINUTES_A_DAY,
        Direction::Backward => (minute + MINUTES_A_DAY - hotel.checkout_time) % MINUTES_A_DAY,
    };
    until.max(hotel.min_stay)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SchedulePeriod;
    use crate::search::criteria::TravelTime;
    use crate::search::request::{AdditionalEdge, MumoTimeWindow};
    use crate::timetable::{ConnectionInfo, NodeId, TimetableBuilder, TripSpec};
    use chrono::NaiveDate;

    type L = Label<(TravelTime,)>;

    fn t(s: &str) -> Time {
        Time::parse_hhmm(s, 0).unwrap()
    }

    fn label(node: NodeId, start: Time) -> L {
        Label::start(node, start, 0, false, (TravelTime::default(),))
    }

    /// Route A -> B with trips at 08:00 (ICE) and 08:20 (ICE); A has a
    /// 10 minute ICE->ICE interchange.
    fn timetable() -> Timetable {
        let mut b = TimetableBuilder::new(SchedulePeriod::new(
            NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            2,
        ));
        let ice = b.add_category("ICE");
        let a = b.add_station("A", "A", 10).unwrap();
        let z = b.add_station("B", "B", 2).unwrap();
        let info = b.add_info(ConnectionInfo {
            category: ice,
            train_nr: 1,
            line: String::new(),
            attributes: vec![],
            price: 12,
        });
        b.add_route(
            &[a, z],
            vec![
                TripSpec::daily(info, &[(None, Some(480)), (Some(510), None)]),
                TripSpec::daily(info, &[(None, Some(500)), (Some(530), None)]),
            ],
        )
        .unwrap();
        b.build()
    }

    /// (station node A, route node A, route edge, route node B)
    fn parts(tt: &Timetable) -> (NodeId, NodeId, EdgeRef, NodeId) {
        let a = tt.station(tt.station_by_id("A").unwrap()).node;
        let enter = tt.out_edges(a)[0];
        let route_node = tt.edge(enter).to;
        let route_edge = tt
            .out_edges(route_node)
            .iter()
            .copied()
            .find(|e| matches!(tt.edge(*e).kind, EdgeKind::Route(_)))
            .unwrap();
        (a, route_node, EdgeRef::Graph(route_edge), tt.edge(route_edge).to)
    }

    #[test]
    fn boarding_picks_earliest_departure() {
        let tt = timetable();
        let g = QueryGraph::new(&tt, &[]);
        let (_, route_node, route_edge, _) = parts(&tt);

        let mut l = label(route_node, t("07:55"));
        l.boarding = true;
        let cost = edge_cost(&g, &l, route_edge, Direction::Forward, 1440)
            .unwrap()
            .unwrap();
        assert_eq!(cost.time, 35);
        assert_eq!(cost.price, 12);
        assert!(!cost.transfer);
        assert_eq!(cost.ride, Some(Ride { trip: 0, day: 0 }));
    }

    #[test]
    fn interchange_time_applies_after_a_connection() {
        let tt = timetable();
        let g = QueryGraph::new(&tt, &[]);
        let (_, route_node, route_edge, _) = parts(&tt);

        let mut l = label(route_node, t("07:55"));
        l.boarding = true;
        l.last_connection = Some(UsedConnection {
            edge: EdgeId(0),
            trip: 0,
            day: 0,
            category: crate::timetable::CategoryId(0),
        });
        // 07:55 + 10 minutes misses 08:00, takes 08:20.
        let cost = edge_cost(&g, &l, route_edge, Direction::Forward, 1440)
            .unwrap()
            .unwrap();
        assert_eq!(cost.ride, Some(Ride { trip: 1, day: 0 }));
        assert_eq!(cost.time, 55);
        assert!(cost.transfer);
    }

    #[test]
    fn boarding_rolls_over_to_next_day() {
        let tt = timetable();
        let g = QueryGraph::new(&tt, &[]);
        let (_, route_node, route_edge, _) = parts(&tt);

        let mut l = label(route_node, t("09:00"));
        l.boarding = true;
        let cost = edge_cost(&g, &l, route_edge, Direction::Forward, 1440)
            .unwrap()
            .unwrap();
        assert_eq!(cost.ride, Some(Ride { trip: 0, day: 1 }));
        assert_eq!(cost.time, 23 * 60 + 30);

        // Beyond the horizon nothing is found.
        assert_eq!(
            edge_cost(&g, &l, route_edge, Direction::Forward, 60).unwrap(),
            None
        );
    }

    #[test]
    fn riding_continues_the_same_trip() {
        let tt = timetable();
        let g = QueryGraph::new(&tt, &[]);
        let (_, route_node, route_edge, _) = parts(&tt);

        let mut l = label(route_node, t("08:20"));
        l.ride = Some(Ride { trip: 1, day: 0 });
        let cost = edge_cost(&g, &l, route_edge, Direction::Forward, 1440)
            .unwrap()
            .unwrap();
        assert_eq!(cost.time, 30);
        assert_eq!(cost.ride, l.ride);

        // The trip already left: the graph contradicts the label.
        l.now = t("08:21");
        assert!(matches!(
            edge_cost(&g, &l, route_edge, Direction::Forward, 1440),
            Err(SearchError::GraphInconsistency(_))
        ));

        l.ride = Some(Ride { trip: 9, day: 0 });
        assert!(edge_cost(&g, &l, route_edge, Direction::Forward, 1440).is_err());
    }

    #[test]
    fn backward_boarding_picks_latest_arrival() {
        let tt = timetable();
        let g = QueryGraph::new(&tt, &[]);
        let (_, _, route_edge, route_b) = parts(&tt);

        let mut l = label(route_b, t("08:45"));
        l.boarding = true;
        let cost = edge_cost(&g, &l, route_edge, Direction::Backward, 1440)
            .unwrap()
            .unwrap();
        // 08:50 arrives too late, 08:30 is taken.
        assert_eq!(cost.ride, Some(Ride { trip: 0, day: 0 }));
        assert_eq!(cost.time, 45);
    }

    #[test]
    fn state_gates() {
        let tt = timetable();
        let g = QueryGraph::new(&tt, &[]);
        let (a, route_node, route_edge, _) = parts(&tt);
        let enter = EdgeRef::Graph(tt.out_edges(a)[0]);

        // Enter only from a station.
        let at_station = label(a, t("08:00"));
        let cost = edge_cost(&g, &at_station, enter, Direction::Forward, 1440).unwrap();
        assert_eq!(cost.map(|c| c.boarding), Some(true));

        let mut riding = label(a, t("08:00"));
        riding.ride = Some(Ride { trip: 0, day: 0 });
        assert_eq!(edge_cost(&g, &riding, enter, Direction::Forward, 1440).unwrap(), None);

        // A route node label that neither rides nor boards cannot move.
        let idle = label(route_node, t("08:00"));
        assert_eq!(edge_cost(&g, &idle, route_edge, Direction::Forward, 1440).unwrap(), None);
    }

    #[test]
    fn pinned_label_boards_only_at_its_time() {
        let tt = timetable();
        let g = QueryGraph::new(&tt, &[]);
        let (_, route_node, route_edge, route_b) = parts(&tt);

        let mut l = label(route_node, t("08:00"));
        l.boarding = true;
        l.pinned = true;
        let cost = edge_cost(&g, &l, route_edge, Direction::Forward, 1440)
            .unwrap()
            .unwrap();
        assert_eq!(cost.ride, Some(Ride { trip: 0, day: 0 }));
        assert_eq!(cost.time, 30);

        // 08:20 leaves later than the label's time.
        l.now = t("08:05");
        assert_eq!(edge_cost(&g, &l, route_edge, Direction::Forward, 1440).unwrap(), None);

        let mut back = label(route_b, t("08:45"));
        back.boarding = true;
        back.pinned = true;
        assert_eq!(edge_cost(&g, &back, route_edge, Direction::Backward, 1440).unwrap(), None);
        back.now = t("08:50");
        let cost = edge_cost(&g, &back, route_edge, Direction::Backward, 1440)
            .unwrap()
            .unwrap();
        assert_eq!(cost.ride, Some(Ride { trip: 1, day: 0 }));
    }

    #[test]
    fn pinned_label_does_not_wait_at_a_station() {
        let tt = timetable();
        let hotel = AdditionalEdge::Hotel {
            station_id: "A".into(),
            checkout_time: 540,
            min_stay: 360,
            price: 90,
        };
        let taxi = AdditionalEdge::Mumo {
            from_station_id: "A".into(),
            to_station_id: "B".into(),
            duration: 20,
            price: 3,
            id: 1,
            name: "taxi".into(),
            window: Some(MumoTimeWindow::Daily {
                begin_minute: 360,
                end_minute: 1320,
            }),
        };
        let g = QueryGraph::new(&tt, &[hotel, taxi]);
        let a = tt.station(tt.station_by_id("A").unwrap()).node;
        let extra: Vec<EdgeRef> = g
            .edges(a, Direction::Forward)
            .filter(|e| matches!(e, EdgeRef::Extra(_)))
            .collect();
        assert_eq!(extra.len(), 2);

        let mut l = label(a, t("05:00"));
        for &e in &extra {
            assert!(edge_cost(&g, &l, e, Direction::Forward, 1440).unwrap().is_some());
        }
        l.pinned = true;
        for &e in &extra {
            assert_eq!(edge_cost(&g, &l, e, Direction::Forward, 1440).unwrap(), None);
        }
        // Inside the window the taxi leaves at once.
        l.now = t("07:00");
        let taxi_cost = extra
            .iter()
            .filter_map(|&e| edge_cost(&g, &l, e, Direction::Forward, 1440).unwrap())
            .collect::<Vec<_>>();
        assert_eq!(taxi_cost.len(), 1);
        assert_eq!(taxi_cost[0].time, 20);
    }

    #[test]
    fn hotel_is_marked_and_used_once() {
        let tt = timetable();
        let hotel = AdditionalEdge::Hotel {
            station_id: "A".into(),
            checkout_time: 540,
            min_stay: 360,
            price: 90,
        };
        let g = QueryGraph::new(&tt, &[hotel]);
        let a = tt.station(tt.station_by_id("A").unwrap()).node;
        let stay = EdgeRef::Extra(0);

        let mut l = label(a, t("22:00"));
        let cost = edge_cost(&g, &l, stay, Direction::Forward, 1440).unwrap().unwrap();
        assert!(cost.hotel);
        assert_eq!(cost.time, 11 * 60);

        l.hotel = true;
        assert_eq!(edge_cost(&g, &l, stay, Direction::Forward, 1440).unwrap(), None);
    }

    fn mumo(window: Option<MumoWindow>) -> MumoEdge {
        MumoEdge {
            id: 1,
            name: "bike".into(),
            duration: 20,
            price: 3,
            window,
        }
    }

    #[test]
    fn mumo_windows() {
        let untimed = mumo(None);
        assert_eq!(mumo_time(&untimed, t("03:00"), Direction::Forward), Some(20));

        let daily = mumo(Some(MumoWindow::Daily { begin: 360, end: 1320 }));
        assert_eq!(mumo_time(&daily, t("07:00"), Direction::Forward), Some(20));
        // Waits from 05:00 until 06:00.
        assert_eq!(mumo_time(&daily, t("05:00"), Direction::Forward), Some(80));
        // 23:00 waits until 06:00 next day.
        assert_eq!(mumo_time(&daily, t("23:00"), Direction::Forward), Some(7 * 60 + 20));
        // Backward: arriving 05:20 means departing 05:00, latest usable is 21:59.
        assert_eq!(
            mumo_time(&daily, Time::from_day(1, 320), Direction::Backward),
            Some(20 + 7 * 60 + 1)
        );

        let absolute = mumo(Some(MumoWindow::Absolute {
            begin: t("08:00"),
            end: t("09:00"),
        }));
        assert_eq!(mumo_time(&absolute, t("07:30"), Direction::Forward), Some(50));
        assert_eq!(mumo_time(&absolute, t("09:00"), Direction::Forward), None);
        assert_eq!(mumo_time(&absolute, t("10:00"), Direction::Backward), Some(20 + 41));
        assert_eq!(mumo_time(&absolute, t("08:10"), Direction::Backward), None);
    }

    #[test]
    fn overnight_daily_window() {
        assert!(in_daily_window(1400, 1320, 120));
        assert!(in_daily_window(60, 1320, 120));
        assert!(!in_daily_window(600, 1320, 120));
        assert!(in_daily_window(600, 0, 0));
    }

    #[test]
    fn hotel_stays() {
        let hotel = HotelEdge {
            checkout_time: 540,
            min_stay: 360,
            price: 90,
        };
        // 22:00 until 09:00.
        assert_eq!(hotel_stay(&hotel, t("22:00"), Direction::Forward), 11 * 60);
        // 05:00 until 11:00 because of the minimum stay.
        assert_eq!(hotel_stay(&hotel, t("05:00"), Direction::Forward), 360);
        assert_eq!(hotel_stay(&hotel, t("09:00"), Direction::Backward), 360);
        assert_eq!(hotel_stay(&hotel, t("20:00"), Direction::Backward), 11 * 60);
    }
}
