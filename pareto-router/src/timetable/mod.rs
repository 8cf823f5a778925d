//! Time-expanded timetable graph.
//!
//! Every station has one station node. Each route (a sequence of stops
//! served by index-aligned trips) has one route node per stop, connected by
//! route edges that carry the scheduled events. Enter and exit edges link a
//! station node with its route nodes; foot edges link station nodes.
//!
//! The graph is built once by [`TimetableBuilder`] and only read by the
//! search. Mutation between searches goes through [`ScheduleLock`].

mod builder;
mod connection;
mod edge;
mod error;
mod fixture;
mod lock;
mod window;

use std::collections::HashMap;

use crate::domain::{SchedulePeriod, StationId, Time};

pub use builder::{StopTime, TimetableBuilder, TripSpec};
pub use connection::{
    CategoryId, ConnectionInfo, DayMask, InfoId, LightConnection, ServiceAttribute, TrackId,
};
pub use edge::{
    Edge, EdgeId, EdgeKind, EdgeTag, FootEdge, HotelEdge, MumoEdge, MumoWindow, RouteEdge,
    ThroughEdge,
};
pub use error::GraphError;
pub use fixture::TimetableFixture;
pub use lock::{ReadScope, ScheduleLock, WriteScope};
pub use window::{Direction, Event, EventsInWindow};

/// Index into the timetable's node list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

/// Index into the timetable's station list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StationIdx(pub u32);

/// Index of a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RouteId(pub u32);

/// A physical station.
#[derive(Debug, Clone)]
pub struct Station {
    pub id: StationId,
    pub name: String,
    /// Default minimum interchange time in minutes.
    pub transfer_time: u32,
    /// Interchange times overriding `transfer_time` for a
    /// (arriving category, departing category) pair.
    pub interchange: HashMap<(CategoryId, CategoryId), u32>,
    /// The station node.
    pub node: NodeId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Station(StationIdx),
    Route { station: StationIdx, route: RouteId },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Node {
    pub kind: NodeKind,
}

impl Node {
    /// Station this node belongs to.
    pub fn station(&self) -> StationIdx {
        match self.kind {
            NodeKind::Station(s) | NodeKind::Route { station: s, .. } => s,
        }
    }

    pub fn is_station_node(&self) -> bool {
        matches!(self.kind, NodeKind::Station(_))
    }
}

/// The immutable timetable graph.
#[derive(Debug, Clone)]
pub struct Timetable {
    period: SchedulePeriod,
    stations: Vec<Station>,
    station_index: HashMap<StationId, StationIdx>,
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    out_edges: Vec<Vec<EdgeId>>,
    in_edges: Vec<Vec<EdgeId>>,
    infos: Vec<ConnectionInfo>,
    categories: Vec<String>,
    tracks: Vec<String>,
}

impl Timetable {
    pub fn period(&self) -> &SchedulePeriod {
        &self.period
    }

    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    pub fn station(&self, idx: StationIdx) -> &Station {
        &self.stations[idx.0 as usize]
    }

    /// Looks up a station by external id.
    pub fn station_by_id(&self, id: &str) -> Option<StationIdx> {
        let id = StationId::parse(id).ok()?;
        self.station_index.get(&id).copied()
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0 as usize]
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge(&self, id: EdgeId) -> &Edge {
        &self.edges[id.0 as usize]
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Edges leaving `node`.
    pub fn out_edges(&self, node: NodeId) -> &[EdgeId] {
        &self.out_edges[node.0 as usize]
    }

    /// Edges entering `node`.
    pub fn in_edges(&self, node: NodeId) -> &[EdgeId] {
        &self.in_edges[node.0 as usize]
    }

    /// Events of a route edge departing (forward) or arriving (backward)
    /// within `[begin, end)`.
    pub fn events_in_window<'a>(
        &self,
        edge: &'a RouteEdge,
        begin: Time,
        end: Time,
        direction: Direction,
    ) -> EventsInWindow<'a> {
        EventsInWindow::new(edge, begin, end, direction, self.period.days())
    }

    /// Minimum time to change at `station` from a vehicle of category
    /// `from` to one of category `to`.
    pub fn interchange_time(&self, station: StationIdx, from: CategoryId, to: CategoryId) -> u32 {
        let station = self.station(station);
        station
            .interchange
            .get(&(from, to))
            .copied()
            .unwrap_or(station.transfer_time)
    }

    pub fn info(&self, id: InfoId) -> &ConnectionInfo {
        &self.infos[id.0 as usize]
    }

    pub fn category_name(&self, id: CategoryId) -> &str {
        &self.categories[id.0 as usize]
    }

    pub fn track_name(&self, id: TrackId) -> &str {
        &self.tracks[id.0 as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn timetable() -> Timetable {
        let mut b = TimetableBuilder::new(SchedulePeriod::new(
            NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            2,
        ));
        let ice = b.add_category("ICE");
        let re = b.add_category("RE");
        let a = b.add_station("A", "Alpha", 5).unwrap();
        let c = b.add_station("C", "Gamma", 3).unwrap();
        b.set_interchange(a, ice, re, 12);
        let info = b.add_info(ConnectionInfo {
            category: ice,
            train_nr: 100,
            line: String::new(),
            attributes: vec![],
            price: 10,
        });
        b.add_route(&[a, c], vec![TripSpec::daily(info, &[(None, Some(480)), (Some(510), None)])])
            .unwrap();
        b.build()
    }

    #[test]
    fn lookup_and_topology() {
        let tt = timetable();
        let a = tt.station_by_id("A").unwrap();
        assert_eq!(tt.station(a).name, "Alpha");
        assert!(tt.station_by_id("Z").is_none());
        assert!(tt.station_by_id("").is_none());

        // Station node A has one enter edge to its route node.
        let node = tt.station(a).node;
        assert!(tt.node(node).is_station_node());
        let out = tt.out_edges(node);
        assert_eq!(out.len(), 1);
        assert_eq!(tt.edge(out[0]).kind.tag(), EdgeTag::Enter);
        assert!(tt.in_edges(node).is_empty());
    }

    #[test]
    fn interchange_rules() {
        let tt = timetable();
        let a = tt.station_by_id("A").unwrap();
        let c = tt.station_by_id("C").unwrap();
        let (ice, re) = (CategoryId(0), CategoryId(1));
        assert_eq!(tt.interchange_time(a, ice, re), 12);
        assert_eq!(tt.interchange_time(a, re, ice), 5);
        assert_eq!(tt.interchange_time(c, ice, re), 3);
        assert_eq!(tt.category_name(ice), "ICE");
    }
}
