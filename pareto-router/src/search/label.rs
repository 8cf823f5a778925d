//! Search labels.

use crate::domain::Time;
use crate::timetable::{CategoryId, Direction, EdgeId, NodeId};

use super::arena::LabelId;
use super::criteria::CriteriaSet;
use super::edge_cost::EdgeCost;
use super::query_graph::EdgeRef;

/// A route event used by a label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsedConnection {
    pub edge: EdgeId,
    pub trip: u32,
    pub day: u32,
    pub category: CategoryId,
}

/// The trip instance a label is riding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ride {
    pub trip: u32,
    pub day: u32,
}

/// A partial journey ending at `node`.
///
/// `start` is the departure at the origin (forward) or the arrival at the
/// destination (backward); `now` is the time at `node`. Predecessor links
/// point into the search's label arena and always lead back to a start
/// label.
#[derive(Debug, Clone, Copy)]
pub struct Label<C> {
    pub node: NodeId,
    /// Edge traversed to reach `node`; `None` for start labels.
    pub edge: Option<EdgeRef>,
    pub pred: Option<LabelId>,
    pub start: Time,
    pub now: Time,
    /// Event used on `edge`, for route edges.
    pub connection: Option<UsedConnection>,
    /// Most recent event used anywhere in the chain.
    pub last_connection: Option<UsedConnection>,
    pub ride: Option<Ride>,
    /// On a route node, about to board.
    pub boarding: bool,
    /// A hotel edge was used somewhere in the chain.
    pub hotel: bool,
    /// Pre-trip label that has not boarded yet. It may not wait: its first
    /// vehicle must depart (forward) or arrive (backward) exactly at `now`.
    pub pinned: bool,
    /// Via stops visited so far.
    pub progress: u8,
    pub criteria: C,
}

impl<C: CriteriaSet> Label<C> {
    pub fn start(node: NodeId, time: Time, progress: u8, pinned: bool, criteria: C) -> Self {
        Self {
            node,
            edge: None,
            pred: None,
            start: time,
            now: time,
            connection: None,
            last_connection: None,
            ride: None,
            boarding: false,
            hotel: false,
            pinned,
            progress,
            criteria,
        }
    }

    /// The label reached from `self`, stored as `id`, over `edge`.
    ///
    /// Via progress and criteria are carried over unchanged; the caller
    /// updates them.
    pub fn successor(
        &self,
        id: LabelId,
        edge: EdgeRef,
        node: NodeId,
        now: Time,
        cost: &EdgeCost,
    ) -> Self {
        Self {
            node,
            edge: Some(edge),
            pred: Some(id),
            start: self.start,
            now,
            connection: cost.connection,
            last_connection: cost.connection.or(self.last_connection),
            ride: cost.ride,
            boarding: cost.boarding,
            hotel: self.hotel || cost.hotel,
            pinned: self.pinned && cost.connection.is_none(),
            progress: self.progress,
            criteria: self.criteria,
        }
    }

    pub fn travel_time(&self) -> u32 {
        self.now.abs_diff(self.start)
    }

    fn last_category(&self) -> Option<CategoryId> {
        self.last_connection.map(|c| c.category)
    }

    /// Whether `self` may prune `other`, both settled at the same node,
    /// on grounds other than criteria.
    ///
    /// Both must be in the same state, and `self` must have started no
    /// earlier and be no later at the node (mirrored for backward search).
    /// Pinned labels board at exactly `now`, so they only compare at equal
    /// times.
    pub fn comparable(&self, other: &Self, direction: Direction) -> bool {
        let same_state = self.progress == other.progress
            && self.ride == other.ride
            && self.boarding == other.boarding
            && self.last_category() == other.last_category()
            && (!self.hotel || other.hotel)
            && self.pinned == other.pinned
            && (!self.pinned || self.now == other.now);
        if !same_state {
            return false;
        }
        match direction {
            Direction::Forward => self.start >= other.start && self.now <= other.now,
            Direction::Backward => self.start <= other.start && self.now >= other.now,
        }
    }
}
