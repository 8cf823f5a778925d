//! Validating timetable construction.

use std::collections::HashMap;

use crate::domain::{SchedulePeriod, StationId};

use super::{
    CategoryId, ConnectionInfo, DayMask, Edge, EdgeId, EdgeKind, FootEdge, GraphError, InfoId,
    LightConnection, Node, NodeId, NodeKind, RouteEdge, RouteId, Station, StationIdx,
    ThroughEdge, Timetable, TrackId,
};

/// Arrival and departure of one trip at one stop, in minutes relative to
/// the trip's start day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StopTime {
    pub arrival: Option<u32>,
    pub departure: Option<u32>,
    pub arrival_track: Option<TrackId>,
    pub departure_track: Option<TrackId>,
}

/// One trip of a route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TripSpec {
    pub info: InfoId,
    pub days: DayMask,
    pub stops: Vec<StopTime>,
}

impl TripSpec {
    /// A trip running every day, from `(arrival, departure)` pairs.
    pub fn daily(info: InfoId, times: &[(Option<u32>, Option<u32>)]) -> Self {
        Self {
            info,
            days: DayMask::ALL,
            stops: times
                .iter()
                .map(|&(arrival, departure)| StopTime {
                    arrival,
                    departure,
                    ..StopTime::default()
                })
                .collect(),
        }
    }

    /// Restricts the trip to the given traffic days.
    pub fn on_days(mut self, days: DayMask) -> Self {
        self.days = days;
        self
    }
}

#[derive(Debug, Clone)]
struct RouteMeta {
    nodes: Vec<NodeId>,
    edges: Vec<EdgeId>,
    trips: usize,
}

/// Incrementally assembles a [`Timetable`].
///
/// Every `add_*` method validates its input before touching the graph, so
/// a rejected call leaves the builder unchanged.
#[derive(Debug)]
pub struct TimetableBuilder {
    period: SchedulePeriod,
    stations: Vec<Station>,
    station_index: HashMap<StationId, StationIdx>,
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    infos: Vec<ConnectionInfo>,
    categories: Vec<String>,
    tracks: Vec<String>,
    routes: Vec<RouteMeta>,
}

impl TimetableBuilder {
    /// Starts an empty timetable. Trips only run on the first
    /// [`DayMask::MAX_DAYS`] days of `period`.
    pub fn new(period: SchedulePeriod) -> Self {
        Self {
            period,
            stations: Vec::new(),
            station_index: HashMap::new(),
            nodes: Vec::new(),
            edges: Vec::new(),
            infos: Vec::new(),
            categories: Vec::new(),
            tracks: Vec::new(),
            routes: Vec::new(),
        }
    }

    pub fn add_category(&mut self, name: &str) -> CategoryId {
        self.categories.push(name.to_string());
        CategoryId((self.categories.len() - 1) as u16)
    }

    pub fn add_track(&mut self, name: &str) -> TrackId {
        self.tracks.push(name.to_string());
        TrackId((self.tracks.len() - 1) as u16)
    }

    pub fn add_info(&mut self, info: ConnectionInfo) -> InfoId {
        self.infos.push(info);
        InfoId((self.infos.len() - 1) as u32)
    }

    /// Adds a station and its station node.
    pub fn add_station(
        &mut self,
        id: &str,
        name: &str,
        transfer_time: u32,
    ) -> Result<StationIdx, GraphError> {
        let id = StationId::parse(id)?;
        if self.station_index.contains_key(&id) {
            return Err(GraphError::DuplicateStation(id.to_string()));
        }

        let idx = StationIdx(self.stations.len() as u32);
        let node = self.push_node(NodeKind::Station(idx));
        self.station_index.insert(id.clone(), idx);
        self.stations.push(Station {
            id,
            name: name.to_string(),
            transfer_time,
            interchange: HashMap::new(),
            node,
        });
        Ok(idx)
    }

    /// Overrides the interchange time at `station` between two categories.
    pub fn set_interchange(
        &mut self,
        station: StationIdx,
        from: CategoryId,
        to: CategoryId,
        minutes: u32,
    ) {
        if let Some(s) = self.stations.get_mut(station.0 as usize) {
            s.interchange.insert((from, to), minutes);
        }
    }

    /// Adds a route serving `stops` with the given trips.
    ///
    /// Trips must be listed in departure order and must not overtake each
    /// other. Trip `i` becomes event `i` on every route edge.
    pub fn add_route(
        &mut self,
        stops: &[StationIdx],
        trips: Vec<TripSpec>,
    ) -> Result<RouteId, GraphError> {
        if stops.len() < 2 {
            return Err(GraphError::RouteTooShort { stops: stops.len() });
        }
        for s in stops {
            self.check_station(*s)?;
        }

        let sections = trips
            .iter()
            .enumerate()
            .map(|(t, trip)| self.trip_sections(t, trip, stops.len()))
            .collect::<Result<Vec<_>, _>>()?;

        let mut edge_events = Vec::with_capacity(stops.len() - 1);
        for i in 0..stops.len() - 1 {
            let events: Vec<LightConnection> = trips
                .iter()
                .zip(&sections)
                .map(|(trip, times)| LightConnection {
                    departure: times[i].0,
                    arrival: times[i].1,
                    info: trip.info,
                    days: trip.days,
                    departure_track: trip.stops[i].departure_track,
                    arrival_track: trip.stops[i + 1].arrival_track,
                })
                .collect();

            let edge = self.edges.len() + i;
            for w in events.windows(2) {
                if w[1].departure < w[0].departure {
                    return Err(GraphError::UnsortedEvents { edge });
                }
                if w[1].arrival < w[0].arrival {
                    return Err(GraphError::Overtaking { edge });
                }
            }
            edge_events.push(events);
        }

        let route = RouteId(self.routes.len() as u32);
        let nodes: Vec<NodeId> = stops
            .iter()
            .map(|&station| self.push_node(NodeKind::Route { station, route }))
            .collect();

        let mut edges = Vec::with_capacity(edge_events.len());
        for (i, events) in edge_events.into_iter().enumerate() {
            let id = self.push_edge(nodes[i], nodes[i + 1], EdgeKind::Route(RouteEdge::new(events)));
            edges.push(id);
        }
        for (i, &station) in stops.iter().enumerate() {
            let station_node = self.stations[station.0 as usize].node;
            if i + 1 < stops.len() {
                self.push_edge(station_node, nodes[i], EdgeKind::Enter);
            }
            if i > 0 {
                self.push_edge(nodes[i], station_node, EdgeKind::Exit);
            }
        }

        self.routes.push(RouteMeta {
            nodes,
            edges,
            trips: trips.len(),
        });
        Ok(route)
    }

    /// Links the last stop of `from` with the first stop of `to`, where
    /// trip `i` of `from` continues as trip `trips[i]` of `to`.
    pub fn add_through(
        &mut self,
        from: RouteId,
        to: RouteId,
        trips: Vec<Option<u32>>,
    ) -> Result<EdgeId, GraphError> {
        let src = self
            .routes
            .get(from.0 as usize)
            .ok_or(GraphError::UnknownRoute(from.0))?;
        let dst = self
            .routes
            .get(to.0 as usize)
            .ok_or(GraphError::UnknownRoute(to.0))?;

        let (Some(&src_node), Some(&dst_node)) = (src.nodes.last(), dst.nodes.first()) else {
            return Err(GraphError::InvalidThrough("empty route".into()));
        };
        if self.nodes[src_node.0 as usize].station() != self.nodes[dst_node.0 as usize].station() {
            return Err(GraphError::InvalidThrough(
                "routes do not meet at one station".into(),
            ));
        }
        if trips.len() != src.trips {
            return Err(GraphError::InvalidThrough(format!(
                "{} trips mapped, route has {}",
                trips.len(),
                src.trips
            )));
        }

        let arriving = self.route_events(src.edges.last().copied());
        let departing = self.route_events(dst.edges.first().copied());
        for (i, target) in trips.iter().enumerate() {
            let Some(t) = *target else { continue };
            let (Some(arr), Some(dep)) = (arriving.get(i), departing.get(t as usize)) else {
                return Err(GraphError::InvalidThrough(format!("trip {t} out of range")));
            };
            if dep.departure < arr.arrival {
                return Err(GraphError::InvalidThrough(format!(
                    "trip {i} continues before it arrives"
                )));
            }
        }

        Ok(self.push_edge(src_node, dst_node, EdgeKind::Through(ThroughEdge { trips })))
    }

    /// Adds a one-way footpath between two stations.
    pub fn add_footpath(
        &mut self,
        from: StationIdx,
        to: StationIdx,
        duration: u32,
    ) -> Result<EdgeId, GraphError> {
        self.check_station(from)?;
        self.check_station(to)?;
        let from = self.stations[from.0 as usize].node;
        let to = self.stations[to.0 as usize].node;
        Ok(self.push_edge(
            from,
            to,
            EdgeKind::Foot(FootEdge { duration, price: 0 }),
        ))
    }

    pub fn build(self) -> Timetable {
        let mut out_edges = vec![Vec::new(); self.nodes.len()];
        let mut in_edges = vec![Vec::new(); self.nodes.len()];
        for (i, edge) in self.edges.iter().enumerate() {
            out_edges[edge.from.0 as usize].push(EdgeId(i as u32));
            in_edges[edge.to.0 as usize].push(EdgeId(i as u32));
        }

        Timetable {
            period: self.period,
            stations: self.stations,
            station_index: self.station_index,
            nodes: self.nodes,
            edges: self.edges,
            out_edges,
            in_edges,
            infos: self.infos,
            categories: self.categories,
            tracks: self.tracks,
        }
    }

    fn check_station(&self, station: StationIdx) -> Result<(), GraphError> {
        if (station.0 as usize) < self.stations.len() {
            Ok(())
        } else {
            Err(GraphError::UnknownStation(format!("#{}", station.0)))
        }
    }

    /// Validates one trip and returns its (departure, arrival) per section.
    fn trip_sections(
        &self,
        t: usize,
        trip: &TripSpec,
        stops: usize,
    ) -> Result<Vec<(u32, u32)>, GraphError> {
        if trip.stops.len() != stops {
            return Err(GraphError::MisalignedTrip {
                trip: t,
                expected: stops,
                found: trip.stops.len(),
            });
        }
        if trip.days != DayMask::ALL {
            if let Some(day) = trip.days.last_day() {
                if day >= self.period.days() {
                    return Err(GraphError::DayMaskBeyondSchedule {
                        trip: t,
                        day,
                        days: self.period.days(),
                    });
                }
            }
        }

        let mut sections = Vec::with_capacity(stops - 1);
        let mut reached = None;
        for i in 0..stops - 1 {
            let departure = trip.stops[i].departure.ok_or(GraphError::MissingTime {
                trip: t,
                stop: i,
                what: "departure",
            })?;
            let arrival = trip.stops[i + 1].arrival.ok_or(GraphError::MissingTime {
                trip: t,
                stop: i + 1,
                what: "arrival",
            })?;
            if reached.is_some_and(|r| departure < r) {
                return Err(GraphError::TimeTravel { trip: t, stop: i });
            }
            if arrival < departure {
                return Err(GraphError::TimeTravel { trip: t, stop: i + 1 });
            }
            sections.push((departure, arrival));
            reached = Some(arrival);
        }
        Ok(sections)
    }

    fn route_events(&self, edge: Option<EdgeId>) -> &[LightConnection] {
        match edge.map(|e| &self.edges[e.0 as usize].kind) {
            Some(EdgeKind::Route(route)) => &route.events,
            _ => &[],
        }
    }

    fn push_node(&mut self, kind: NodeKind) -> NodeId {
        self.nodes.push(Node { kind });
        NodeId((self.nodes.len() - 1) as u32)
    }

    fn push_edge(&mut self, from: NodeId, to: NodeId, kind: EdgeKind) -> EdgeId {
        self.edges.push(Edge { from, to, kind });
        EdgeId((self.edges.len() - 1) as u32)
    }
}
