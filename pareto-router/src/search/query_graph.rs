//! Timetable view extended with query-local edges.

use std::collections::HashMap;

use tracing::debug;

use crate::domain::{MINUTES_A_DAY, SchedulePeriod, Time};
use crate::timetable::{
    Direction, Edge, EdgeId, EdgeKind, HotelEdge, MumoEdge, MumoWindow, NodeId, Timetable,
};

use super::request::{AdditionalEdge, MumoTimeWindow};

/// Reference to a timetable edge or a query-local edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeRef {
    Graph(EdgeId),
    Extra(u32),
}

/// The timetable plus hotel and mumo edges of one query.
#[derive(Debug)]
pub struct QueryGraph<'a> {
    timetable: &'a Timetable,
    extra: Vec<Edge>,
    extra_out: HashMap<NodeId, Vec<u32>>,
    extra_in: HashMap<NodeId, Vec<u32>>,
}

impl<'a> QueryGraph<'a> {
    /// Resolves `edges` against the timetable. Edges naming an unknown
    /// station, or a window outside the schedule, are skipped.
    pub fn new(timetable: &'a Timetable, edges: &[AdditionalEdge]) -> Self {
        let mut graph = Self {
            timetable,
            extra: Vec::new(),
            extra_out: HashMap::new(),
            extra_in: HashMap::new(),
        };

        for edge in edges {
            match graph.resolve(edge) {
                Some(e) => graph.push(e),
                None => debug!(?edge, "skipping additional edge"),
            }
        }
        graph
    }

    fn station_node(&self, id: &str) -> Option<NodeId> {
        let idx = self.timetable.station_by_id(id)?;
        Some(self.timetable.station(idx).node)
    }

    fn resolve(&self, edge: &AdditionalEdge) -> Option<Edge> {
        match edge {
            AdditionalEdge::Hotel {
                station_id,
                checkout_time,
                min_stay,
                price,
            } => {
                let node = self.station_node(station_id)?;
                Some(Edge {
                    from: node,
                    to: node,
                    kind: EdgeKind::Hotel(HotelEdge {
                        checkout_time: checkout_time % MINUTES_A_DAY,
                        min_stay: *min_stay,
                        price: *price,
                    }),
                })
            }
            AdditionalEdge::Mumo {
                from_station_id,
                to_station_id,
                duration,
                price,
                id,
                name,
                window,
            } => {
                let from = self.station_node(from_station_id)?;
                let to = self.station_node(to_station_id)?;
                let window = match window {
                    None => None,
                    Some(w) => Some(schedule_window(self.timetable.period(), *w)?),
                };
                Some(Edge {
                    from,
                    to,
                    kind: EdgeKind::Mumo(MumoEdge {
                        id: *id,
                        name: name.clone(),
                        duration: *duration,
                        price: *price,
                        window,
                    }),
                })
            }
        }
    }

    fn push(&mut self, edge: Edge) {
        let idx = self.extra.len() as u32;
        self.extra_out.entry(edge.from).or_default().push(idx);
        self.extra_in.entry(edge.to).or_default().push(idx);
        self.extra.push(edge);
    }

    pub fn timetable(&self) -> &'a Timetable {
        self.timetable
    }

    pub fn extra_count(&self) -> usize {
        self.extra.len()
    }

    pub fn edge(&self, edge: EdgeRef) -> &Edge {
        match edge {
            EdgeRef::Graph(id) => self.timetable.edge(id),
            EdgeRef::Extra(i) => &self.extra[i as usize],
        }
    }

    /// Edges to expand from `node`: outgoing when searching forward,
    /// incoming when searching backward.
    pub fn edges(&self, node: NodeId, direction: Direction) -> impl Iterator<Item = EdgeRef> + '_ {
        let (fixed, extra) = match direction {
            Direction::Forward => (self.timetable.out_edges(node), self.extra_out.get(&node)),
            Direction::Backward => (self.timetable.in_edges(node), self.extra_in.get(&node)),
        };
        fixed
            .iter()
            .map(|&e| EdgeRef::Graph(e))
            .chain(extra.into_iter().flatten().map(|&i| EdgeRef::Extra(i)))
    }

    /// Node reached by traversing `edge` in `direction`.
    pub fn target(&self, edge: EdgeRef, direction: Direction) -> NodeId {
        let e = self.edge(edge);
        match direction {
            Direction::Forward => e.to,
            Direction::Backward => e.from,
        }
    }
}

/// Maps a request window onto schedule time. Absolute windows are clipped
/// to the schedule; a window entirely outside it makes the edge unusable.
fn schedule_window(period: &SchedulePeriod, window: MumoTimeWindow) -> Option<MumoWindow> {
    match window {
        MumoTimeWindow::Daily {
            begin_minute,
            end_minute,
        } => Some(MumoWindow::Daily {
            begin: begin_minute % MINUTES_A_DAY,
            end: end_minute % MINUTES_A_DAY,
        }),
        MumoTimeWindow::Absolute { begin, end } => {
            let start = period.to_unix(Time::ZERO);
            let stop = period.to_unix(period.end());
            if end <= start || begin >= stop || begin >= end {
                return None;
            }
            let begin = period.to_time(begin.max(start))?;
            let end = period.to_time(end.min(stop))?;
            Some(MumoWindow::Absolute { begin, end })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timetable::{EdgeTag, TimetableBuilder};
    use chrono::NaiveDate;

    fn timetable() -> Timetable {
        let mut b = TimetableBuilder::new(SchedulePeriod::new(
            NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            2,
        ));
        let a = b.add_station("A", "A", 2).unwrap();
        let z = b.add_station("Z", "Z", 2).unwrap();
        b.add_footpath(a, z, 5).unwrap();
        b.build()
    }

    fn mumo(from: &str, to: &str, window: Option<MumoTimeWindow>) -> AdditionalEdge {
        AdditionalEdge::Mumo {
            from_station_id: from.into(),
            to_station_id: to.into(),
            duration: 15,
            price: 30,
            id: 7,
            name: "taxi".into(),
            window,
        }
    }

    #[test]
    fn chains_static_and_extra_edges() {
        let tt = timetable();
        let g = QueryGraph::new(&tt, &[mumo("A", "Z", None)]);
        let a = tt.station(tt.station_by_id("A").unwrap()).node;
        let z = tt.station(tt.station_by_id("Z").unwrap()).node;

        let tags: Vec<EdgeTag> = g
            .edges(a, Direction::Forward)
            .map(|e| g.edge(e).kind.tag())
            .collect();
        assert_eq!(tags, vec![EdgeTag::Foot, EdgeTag::Mumo]);
        assert_eq!(g.edges(z, Direction::Backward).count(), 2);
        assert_eq!(g.edges(z, Direction::Forward).count(), 0);

        let extra = g.edges(a, Direction::Forward).last().unwrap();
        assert_eq!(extra, EdgeRef::Extra(0));
        assert_eq!(g.target(extra, Direction::Forward), z);
        assert_eq!(g.target(extra, Direction::Backward), a);
    }

    #[test]
    fn unknown_stations_are_skipped() {
        let tt = timetable();
        let hotel = AdditionalEdge::Hotel {
            station_id: "NOPE".into(),
            checkout_time: 540,
            min_stay: 360,
            price: 80,
        };
        let g = QueryGraph::new(&tt, &[mumo("A", "Q", None), hotel]);
        assert_eq!(g.extra_count(), 0);
    }

    #[test]
    fn hotel_is_self_loop() {
        let tt = timetable();
        let hotel = AdditionalEdge::Hotel {
            station_id: "Z".into(),
            checkout_time: 540,
            min_stay: 360,
            price: 80,
        };
        let g = QueryGraph::new(&tt, &[hotel]);
        let e = g.edge(EdgeRef::Extra(0));
        assert_eq!(e.from, e.to);
    }

    #[test]
    fn absolute_windows_are_clipped() {
        let tt = timetable();
        let period = *tt.period();
        let begin = period.to_unix(Time::ZERO);

        let w = schedule_window(
            &period,
            MumoTimeWindow::Absolute {
                begin: begin - 3600,
                end: begin + 7200,
            },
        );
        assert_eq!(
            w,
            Some(MumoWindow::Absolute {
                begin: Time::ZERO,
                end: Time::from_minutes(120)
            })
        );

        let outside = mumo(
            "A",
            "Z",
            Some(MumoTimeWindow::Absolute {
                begin: begin - 7200,
                end: begin - 3600,
            }),
        );
        assert_eq!(QueryGraph::new(&tt, &[outside]).extra_count(), 0);
    }
}
