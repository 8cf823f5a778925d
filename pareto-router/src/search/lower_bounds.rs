//! Admissible per-node lower bounds on the remaining cost to the goal.
//!
//! Computed per query by Dijkstra from the goal against the search
//! direction, with time-independent edge weights.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::timetable::{Direction, EdgeKind, NodeId};

use super::query_graph::QueryGraph;

/// Bound of a node that cannot reach the goal.
pub const INFINITE: u32 = u32::MAX;

#[derive(Debug, Clone)]
pub struct LowerBounds {
    travel_time: Vec<u32>,
    boardings: Vec<u32>,
    price: Vec<u32>,
}

impl LowerBounds {
    /// Bounds towards `goal` for a search in `direction`.
    pub fn compute(graph: &QueryGraph<'_>, goal: NodeId, direction: Direction) -> Self {
        let tt = graph.timetable();
        let boarding_edge = |kind: &EdgeKind| match direction {
            Direction::Forward => matches!(kind, EdgeKind::Enter),
            Direction::Backward => matches!(kind, EdgeKind::Exit),
        };

        let travel_time = dijkstra(graph, goal, direction, |kind| match kind {
            EdgeKind::Route(r) => r.min_duration(),
            EdgeKind::Enter | EdgeKind::Exit | EdgeKind::Through(_) => 0,
            EdgeKind::Foot(f) => f.duration,
            EdgeKind::Mumo(m) => m.duration,
            EdgeKind::Hotel(h) => h.min_stay,
        });
        let boardings = dijkstra(graph, goal, direction, |kind| u32::from(boarding_edge(kind)));
        let price = dijkstra(graph, goal, direction, |kind| match kind {
            EdgeKind::Route(r) => r
                .events
                .iter()
                .map(|e| tt.info(e.info).price)
                .min()
                .unwrap_or(0),
            EdgeKind::Enter | EdgeKind::Exit | EdgeKind::Through(_) => 0,
            EdgeKind::Foot(f) => f.price,
            EdgeKind::Mumo(m) => m.price,
            EdgeKind::Hotel(h) => h.price,
        });

        Self {
            travel_time,
            boardings,
            price,
        }
    }

    pub fn travel_time(&self, node: NodeId) -> u32 {
        self.travel_time[node.0 as usize]
    }

    /// Lower bound on vehicles still to board.
    pub fn boardings(&self, node: NodeId) -> u32 {
        self.boardings[node.0 as usize]
    }

    pub fn price(&self, node: NodeId) -> u32 {
        self.price[node.0 as usize]
    }

    pub fn is_reachable(&self, node: NodeId) -> bool {
        self.travel_time(node) != INFINITE
    }
}

/// Distances to `goal`, relaxing edges against `direction`.
fn dijkstra(
    graph: &QueryGraph<'_>,
    goal: NodeId,
    direction: Direction,
    weight: impl Fn(&EdgeKind) -> u32,
) -> Vec<u32> {
    let reverse = match direction {
        Direction::Forward => Direction::Backward,
        Direction::Backward => Direction::Forward,
    };

    let mut dist = vec![INFINITE; graph.timetable().node_count()];
    let mut heap = BinaryHeap::new();
    dist[goal.0 as usize] = 0;
    heap.push(Reverse((0u32, goal.0)));

    while let Some(Reverse((d, node))) = heap.pop() {
        if d > dist[node as usize] {
            continue;
        }
        for edge in graph.edges(NodeId(node), reverse) {
            let next = graph.target(edge, reverse);
            let nd = d.saturating_add(weight(&graph.edge(edge).kind));
            if nd < dist[next.0 as usize] {
                dist[next.0 as usize] = nd;
                heap.push(Reverse((nd, next.0)));
            }
        }
    }
    dist
}
