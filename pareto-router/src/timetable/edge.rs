//! Graph edges.

use crate::domain::Time;

use super::{LightConnection, NodeId};

/// Index into the timetable's edge list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeId(pub u32);

/// A directed edge between two nodes.
#[derive(Debug, Clone)]
pub struct Edge {
    pub from: NodeId,
    pub to: NodeId,
    pub kind: EdgeKind,
}

/// Tagged edge variants.
#[derive(Debug, Clone)]
pub enum EdgeKind {
    /// Between consecutive route nodes of one route.
    Route(RouteEdge),
    /// Station node to route node (boarding in forward direction).
    Enter,
    /// Route node to station node (alighting in forward direction).
    Exit,
    /// Last route node of one route to the first route node of another at
    /// the same station: the vehicle continues under a different route.
    Through(ThroughEdge),
    /// Static footpath between two station nodes.
    Foot(FootEdge),
    /// Query-local mode-of-transport edge between station nodes.
    Mumo(MumoEdge),
    /// Query-local overnight stay (station node self-loop).
    Hotel(HotelEdge),
}

/// Discriminant of [`EdgeKind`] without payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeTag {
    Route,
    Enter,
    Exit,
    Through,
    Foot,
    Mumo,
    Hotel,
}

impl EdgeKind {
    pub fn tag(&self) -> EdgeTag {
        match self {
            EdgeKind::Route(_) => EdgeTag::Route,
            EdgeKind::Enter => EdgeTag::Enter,
            EdgeKind::Exit => EdgeTag::Exit,
            EdgeKind::Through(_) => EdgeTag::Through,
            EdgeKind::Foot(_) => EdgeTag::Foot,
            EdgeKind::Mumo(_) => EdgeTag::Mumo,
            EdgeKind::Hotel(_) => EdgeTag::Hotel,
        }
    }
}

impl EdgeTag {
    /// Edges that move a passenger who is not on a vehicle.
    pub fn is_walk(self) -> bool {
        matches!(self, EdgeTag::Foot | EdgeTag::Mumo | EdgeTag::Hotel)
    }
}

/// Scheduled events of a route edge.
///
/// # Invariants
///
/// - `events` is sorted ascending by departure, and also by arrival
///   (vehicles on one route do not overtake each other)
/// - Event `i` belongs to trip `i` of the route, on every edge of the route
#[derive(Debug, Clone)]
pub struct RouteEdge {
    pub events: Vec<LightConnection>,
    pub(crate) min_departure: u32,
    pub(crate) max_departure: u32,
    pub(crate) min_arrival: u32,
    pub(crate) max_arrival: u32,
    pub(crate) min_duration: u32,
}

impl RouteEdge {
    /// Wraps pre-validated events. `events` must be non-empty and sorted.
    pub(crate) fn new(events: Vec<LightConnection>) -> Self {
        let min_departure = events.first().map_or(0, |e| e.departure);
        let max_departure = events.last().map_or(0, |e| e.departure);
        let min_arrival = events.first().map_or(0, |e| e.arrival);
        let max_arrival = events.last().map_or(0, |e| e.arrival);
        let min_duration = events.iter().map(|e| e.duration()).min().unwrap_or(0);
        Self {
            events,
            min_departure,
            max_departure,
            min_arrival,
            max_arrival,
            min_duration,
        }
    }

    /// Shortest ride time over all events.
    pub fn min_duration(&self) -> u32 {
        self.min_duration
    }
}

/// Trip continuation across a through edge.
#[derive(Debug, Clone)]
pub struct ThroughEdge {
    /// `trips[i]` is the trip index on the target route that continues
    /// trip `i` of the source route.
    pub trips: Vec<Option<u32>>,
}

impl ThroughEdge {
    /// Trip on the target route continuing `trip` of the source route.
    pub fn forward(&self, trip: u32) -> Option<u32> {
        self.trips.get(trip as usize).copied().flatten()
    }

    /// Trip on the source route continued by `trip` of the target route.
    pub fn backward(&self, trip: u32) -> Option<u32> {
        self.trips
            .iter()
            .position(|t| *t == Some(trip))
            .map(|i| i as u32)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FootEdge {
    pub duration: u32,
    pub price: u32,
}

/// When a time-limited mumo edge may be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MumoWindow {
    /// Departure must lie in `[begin, end)`.
    Absolute { begin: Time, end: Time },
    /// Departure minute-of-day must lie in `[begin, end)`, every day.
    Daily { begin: u32, end: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MumoEdge {
    pub id: u32,
    pub name: String,
    pub duration: u32,
    pub price: u32,
    pub window: Option<MumoWindow>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HotelEdge {
    /// Minute of day at which guests leave.
    pub checkout_time: u32,
    pub min_stay: u32,
    pub price: u32,
}
