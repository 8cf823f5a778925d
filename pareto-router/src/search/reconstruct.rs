//! Turning a result label chain into a [`Journey`].
//!
//! The chain is first put into real travel order, so forward and backward
//! results are rendered by the same pass. Each step between two labels
//! traverses one edge in its stored direction.

use crate::domain::{Attribute, Journey, Move, Stop, StopEvent, Time, Transport, WalkKind};
use crate::timetable::{Direction, Event, EdgeKind, InfoId, NodeId, TrackId};

use super::SearchError;
use super::arena::LabelId;
use super::criteria::CriteriaSet;
use super::label::{Label, UsedConnection};
use super::pareto_dijkstra::ParetoDijkstra;
use super::query_graph::{EdgeRef, QueryGraph};

/// One edge of a journey in travel order.
#[derive(Debug, Clone, Copy)]
struct Step {
    edge: EdgeRef,
    connection: Option<UsedConnection>,
    /// Time at the edge's tail and head.
    at_from: Time,
    at_to: Time,
}

#[derive(Debug, Clone, Copy)]
struct OpenRide {
    from: usize,
    info: InfoId,
    departure: Time,
    arrival: Time,
}

/// Renders the journey ending (forward) or starting (backward) at
/// `result`.
pub fn reconstruct<C: CriteriaSet>(
    search: &ParetoDijkstra<C>,
    result: LabelId,
    graph: &QueryGraph<'_>,
    direction: Direction,
) -> Result<Journey, SearchError> {
    let mut chain: Vec<Label<C>> = Vec::new();
    let mut cursor = Some(result);
    while let Some(id) = cursor {
        let label = search.label(id);
        chain.push(*label);
        cursor = label.pred;
    }
    if direction == Direction::Forward {
        chain.reverse();
    }

    let steps = chain
        .windows(2)
        .map(|w| {
            let (traversed, connection) = match direction {
                Direction::Forward => (w[1].edge, w[1].connection),
                Direction::Backward => (w[0].edge, w[0].connection),
            };
            let edge = traversed.ok_or_else(|| {
                SearchError::GraphInconsistency("label chain misses an edge".into())
            })?;
            Ok(Step {
                edge,
                connection,
                at_from: w[0].now,
                at_to: w[1].now,
            })
        })
        .collect::<Result<Vec<_>, SearchError>>()?;

    let Some(first) = chain.first() else {
        return Err(SearchError::GraphInconsistency("empty label chain".into()));
    };
    let mut builder = JourneyBuilder::new(graph, direction, first.node);
    for step in &steps {
        builder.step(step)?;
    }
    builder.finish(search.label(result).travel_time())
}

struct JourneyBuilder<'q, 'g> {
    graph: &'q QueryGraph<'g>,
    direction: Direction,
    stops: Vec<Stop>,
    transports: Vec<Transport>,
    attributes: Vec<Attribute>,
    ride: Option<OpenRide>,
    boardings: u32,
    price: u32,
}

impl<'q, 'g> JourneyBuilder<'q, 'g> {
    fn new(graph: &'q QueryGraph<'g>, direction: Direction, origin: NodeId) -> Self {
        let mut builder = Self {
            graph,
            direction,
            stops: Vec::new(),
            transports: Vec::new(),
            attributes: Vec::new(),
            ride: None,
            boardings: 0,
            price: 0,
        };
        builder.push_stop(origin);
        builder
    }

    fn push_stop(&mut self, node: NodeId) -> usize {
        let tt = self.graph.timetable();
        let station = tt.station(tt.node(node).station());
        self.stops.push(Stop::new(station.id.as_str(), &station.name));
        self.stops.len() - 1
    }

    fn current(&self) -> usize {
        self.stops.len() - 1
    }

    fn event(&self, time: Time, track: Option<TrackId>) -> StopEvent {
        let tt = self.graph.timetable();
        StopEvent {
            time: tt.period().to_unix(time),
            platform: track.map(|t| tt.track_name(t).to_string()),
        }
    }

    fn step(&mut self, step: &Step) -> Result<(), SearchError> {
        let graph = self.graph;
        let edge = graph.edge(step.edge);
        match &edge.kind {
            EdgeKind::Enter => {
                let interchange = self.boardings > 0;
                let at = self.current();
                let stop = &mut self.stops[at];
                stop.enter = true;
                stop.interchange = interchange;
                self.boardings += 1;
            }
            EdgeKind::Route(route) => {
                let used = step.connection.ok_or_else(|| {
                    SearchError::GraphInconsistency("route step without a connection".into())
                })?;
                let event = Event::instance(&route.events, used.trip, used.day).ok_or_else(|| {
                    SearchError::GraphInconsistency(format!(
                        "trip {} missing on route edge {}",
                        used.trip, used.edge.0
                    ))
                })?;
                self.ride_section(&event, edge.to);
            }
            EdgeKind::Through(_) => {}
            EdgeKind::Exit => {
                self.close_ride()?;
                let at = self.current();
                self.stops[at].exit = true;
            }
            EdgeKind::Foot(foot) => {
                self.walk(step, edge.from, edge.to, foot.duration, WalkKind::Foot);
                self.price += foot.price;
            }
            EdgeKind::Mumo(mumo) => {
                let kind = WalkKind::Mumo {
                    id: mumo.id,
                    name: mumo.name.clone(),
                };
                self.walk(step, edge.from, edge.to, mumo.duration, kind);
                self.price += mumo.price;
            }
            EdgeKind::Hotel(hotel) => {
                let at = self.current();
                self.transports.push(Transport {
                    from: at,
                    to: at,
                    movement: Move::Walk {
                        kind: WalkKind::Hotel,
                        duration: step.at_to.minutes() - step.at_from.minutes(),
                    },
                });
                self.price += hotel.price;
            }
        }
        Ok(())
    }

    /// One route edge of a ride. A change of train info on a through
    /// connection splits the ride at the current stop.
    fn ride_section(&mut self, event: &Event<'_>, to: NodeId) {
        let tt = self.graph.timetable();
        let info = event.connection.info;

        if let Some(open) = self.ride {
            if open.info != info {
                let at = self.current();
                self.push_connection(open, at);
                self.ride = None;
            }
        }

        let at = self.current();
        if self.stops[at].departure.is_none() {
            let departure = self.event(event.departure, event.connection.departure_track);
            self.stops[at].departure = Some(departure);
        }
        let open = self.ride.get_or_insert(OpenRide {
            from: at,
            info,
            departure: event.departure,
            arrival: event.arrival,
        });
        open.arrival = event.arrival;

        let arrival = self.event(event.arrival, event.connection.arrival_track);
        let next = self.push_stop(to);
        self.stops[next].arrival = Some(arrival);

        let data = tt.info(info);
        self.price += data.price;
        for attr in &data.attributes {
            let merged = self
                .attributes
                .iter_mut()
                .rev()
                .find(|a| a.code == attr.code && a.to == at);
            match merged {
                Some(a) => a.to = next,
                None => self.attributes.push(Attribute {
                    from: at,
                    to: next,
                    code: attr.code.clone(),
                    text: attr.text.clone(),
                }),
            }
        }
    }

    fn push_connection(&mut self, ride: OpenRide, to: usize) {
        let tt = self.graph.timetable();
        let info = tt.info(ride.info);
        self.transports.push(Transport {
            from: ride.from,
            to,
            movement: Move::Connection {
                category: tt.category_name(info.category).to_string(),
                train_nr: info.train_nr,
                line: info.line.clone(),
                duration: ride.arrival.minutes() - ride.departure.minutes(),
            },
        });
    }

    fn close_ride(&mut self) -> Result<(), SearchError> {
        let open = self.ride.take().ok_or_else(|| {
            SearchError::GraphInconsistency("exit without a ride".into())
        })?;
        let at = self.current();
        self.push_connection(open, at);
        Ok(())
    }

    fn walk(&mut self, step: &Step, from: NodeId, to: NodeId, duration: u32, kind: WalkKind) {
        let tt = self.graph.timetable();
        // Waiting for a mumo window sits at the end the search came from.
        let (departure, arrival) = match self.direction {
            Direction::Forward => (step.at_to.saturating_sub(duration), step.at_to),
            Direction::Backward => (step.at_from, step.at_from.saturating_add(duration)),
        };
        let at = self.current();
        if self.stops[at].departure.is_none() {
            let departure = self.event(departure, None);
            self.stops[at].departure = Some(departure);
        }

        let target = if tt.node(from).station() == tt.node(to).station() {
            at
        } else {
            let arrival = self.event(arrival, None);
            let next = self.push_stop(to);
            self.stops[next].arrival = Some(arrival);
            next
        };
        self.transports.push(Transport {
            from: at,
            to: target,
            movement: Move::Walk { kind, duration },
        });
    }

    fn finish(self, duration: u32) -> Result<Journey, SearchError> {
        if self.ride.is_some() {
            return Err(SearchError::GraphInconsistency(
                "journey ends on board".into(),
            ));
        }
        let transfers = self.boardings.saturating_sub(1);
        Journey::new(
            self.stops,
            self.transports,
            self.attributes,
            duration,
            transfers,
            self.price,
        )
        .map_err(|e| SearchError::GraphInconsistency(e.to_string()))
    }
}
