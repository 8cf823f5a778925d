//! Label-setting multi-criteria Dijkstra.
//!
//! Labels are popped in order of their travel-time lower bound. A popped
//! label survives if no result dominates it in terminal form and no label
//! already settled at its node weakly dominates it. Surviving labels at
//! the goal become results; all others are expanded along the node's
//! edges.

use tracing::{debug, trace};

use crate::domain::Time;
use crate::timetable::{Direction, NodeId};

use super::SearchError;
use super::arena::{LabelArena, LabelId};
use super::config::SearchConfig;
use super::criteria::{BoundContext, CriteriaSet};
use super::edge_cost::edge_cost;
use super::label::Label;
use super::lower_bounds::LowerBounds;
use super::query_graph::QueryGraph;
use super::queue::BucketQueue;
use super::request::{Statistics, TripType};

/// Where a search starts and where it must go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTarget {
    pub origin: NodeId,
    pub goal: NodeId,
    /// Station nodes to pass, in search order.
    pub vias: Vec<NodeId>,
}

impl SearchTarget {
    /// Via progress after arriving at `node` with `progress` vias done.
    pub fn advance(&self, node: NodeId, mut progress: u8) -> u8 {
        while self.vias.get(progress as usize) == Some(&node) {
            progress += 1;
        }
        progress
    }

    pub fn is_goal<C>(&self, label: &Label<C>) -> bool {
        label.node == self.goal && progress_done(label.progress, &self.vias)
    }
}

fn progress_done(progress: u8, vias: &[NodeId]) -> bool {
    progress as usize == vias.len()
}

/// Everything one run needs besides reusable storage.
#[derive(Debug, Clone, Copy)]
pub struct Query<'q, 'g> {
    pub graph: &'q QueryGraph<'g>,
    pub lower_bounds: &'q LowerBounds,
    pub target: &'q SearchTarget,
    pub direction: Direction,
    pub start_times: &'q [Time],
    pub trip_type: TripType,
}

/// Inserts `item` into a Pareto front.
///
/// Rejects it if an element dominates it or is the `same`; otherwise
/// removes the elements it dominates and appends it. Returns whether it
/// was inserted.
pub fn pareto_insert<T>(
    front: &mut Vec<T>,
    item: T,
    dominates: impl Fn(&T, &T) -> bool,
    same: impl Fn(&T, &T) -> bool,
) -> bool {
    if front.iter().any(|e| dominates(e, &item) || same(e, &item)) {
        return false;
    }
    front.retain(|e| !dominates(&item, e));
    front.push(item);
    true
}

/// Reusable search storage.
#[derive(Debug)]
pub struct ParetoDijkstra<C> {
    arena: LabelArena<Label<C>>,
    queue: BucketQueue<LabelId>,
    node_labels: Vec<Vec<LabelId>>,
    results: Vec<LabelId>,
}

impl<C: CriteriaSet> ParetoDijkstra<C> {
    pub fn new(config: &SearchConfig) -> Self {
        Self {
            arena: LabelArena::new(config.arena_block_labels),
            queue: BucketQueue::new(config.max_bucket(), config.sorted_buckets),
            node_labels: Vec::new(),
            results: Vec::new(),
        }
    }

    /// Result labels of the last run, in insertion order.
    pub fn results(&self) -> &[LabelId] {
        &self.results
    }

    pub fn label(&self, id: LabelId) -> &Label<C> {
        &self.arena[id]
    }

    pub fn arena_bytes(&self) -> usize {
        self.arena.bytes_in_use()
    }

    /// Drops every label of the last run. Keeps the first arena block.
    pub fn reset(&mut self, config: &SearchConfig) {
        self.arena.clear();
        self.queue.reset(config.max_bucket(), config.sorted_buckets);
        for labels in &mut self.node_labels {
            labels.clear();
        }
        self.results.clear();
    }

    fn push(&mut self, label: Label<C>) -> Result<(), SearchError> {
        let bucket = label.criteria.bucket();
        let id = self.arena.alloc(label)?;
        let arena = &self.arena;
        self.queue
            .push_by(bucket, id, |a, b| arena[*a].criteria.compare(&arena[*b].criteria));
        Ok(())
    }

    fn discard(&mut self, id: LabelId) {
        self.arena.dealloc(id);
    }

    /// Runs one search. Results are left in [`Self::results`] until the
    /// next [`Self::reset`].
    ///
    /// # Errors
    ///
    /// Fails on graph inconsistencies and when the arena cannot grow.
    pub fn run(
        &mut self,
        query: &Query<'_, '_>,
        config: &SearchConfig,
        stats: &mut Statistics,
    ) -> Result<(), SearchError> {
        let tt = query.graph.timetable();
        if self.node_labels.len() < tt.node_count() {
            self.node_labels.resize_with(tt.node_count(), Vec::new);
        }

        let origin = query.target.origin;
        let progress = query.target.advance(origin, 0);
        let ctx = BoundContext {
            node: origin,
            lower_bounds: query.lower_bounds,
            boarding: false,
            has_connection: false,
        };
        let pinned = query.trip_type == TripType::PreTrip;
        for &time in query.start_times {
            let criteria = C::init(&ctx);
            if criteria.filter(config) {
                stats.labels_filtered += 1;
                continue;
            }
            self.push(Label::start(origin, time, progress, pinned, criteria))?;
            trace!(start = %time, "start label");
            stats.start_label_count += 1;
            stats.labels_created += 1;
        }

        let mut last_result_pop = 0;
        while !self.queue.is_empty() {
            if stats.labels_popped >= config.max_label_count as u64 {
                stats.max_label_quit = true;
                debug!(popped = stats.labels_popped, "label budget exhausted");
                break;
            }
            let Some(id) = self.queue.pop() else {
                break;
            };
            stats.labels_popped += 1;
            let label = self.arena[id];

            let arena = &self.arena;
            if self
                .results
                .iter()
                .any(|r| arena[*r].criteria.dominates(&label.criteria, true))
            {
                stats.labels_dominated_by_results += 1;
                self.discard(id);
                continue;
            }

            let settled = &self.node_labels[label.node.0 as usize];
            if settled.iter().any(|o| {
                let other = &arena[*o];
                other.comparable(&label, query.direction)
                    && other.criteria.weakly_dominates(&label.criteria)
            }) {
                stats.labels_dominated_at_node += 1;
                self.discard(id);
                continue;
            }
            self.node_labels[label.node.0 as usize].push(id);

            if query.target.is_goal(&label) {
                let arena = &self.arena;
                let inserted = pareto_insert(
                    &mut self.results,
                    id,
                    |a, b| arena[*a].criteria.dominates(&arena[*b].criteria, false),
                    |a, b| {
                        let (a, b) = (&arena[*a], &arena[*b]);
                        a.criteria == b.criteria && a.start == b.start && a.now == b.now
                    },
                );
                if inserted {
                    if stats.labels_popped_until_first_result == 0 {
                        stats.labels_popped_until_first_result = stats.labels_popped;
                    }
                    last_result_pop = stats.labels_popped;
                    trace!(label = id.index(), results = self.results.len(), "result");
                }
                continue;
            }

            self.expand(id, &label, query, config, stats)?;
        }

        if !self.results.is_empty() {
            stats.labels_popped_after_last_result = stats.labels_popped - last_result_pop;
        }
        debug!(
            popped = stats.labels_popped,
            created = stats.labels_created,
            results = self.results.len(),
            "pareto dijkstra complete"
        );
        Ok(())
    }

    fn expand(
        &mut self,
        id: LabelId,
        label: &Label<C>,
        query: &Query<'_, '_>,
        config: &SearchConfig,
        stats: &mut Statistics,
    ) -> Result<(), SearchError> {
        let graph = query.graph;
        for edge in graph.edges(label.node, query.direction) {
            let Some(cost) =
                edge_cost(graph, label, edge, query.direction, config.max_travel_time_mins)?
            else {
                continue;
            };
            let now = match query.direction {
                Direction::Forward => label.now.checked_add(cost.time),
                Direction::Backward => label.now.checked_sub(cost.time),
            };
            let Some(now) = now else {
                continue;
            };

            let node = graph.target(edge, query.direction);
            let mut next = label.successor(id, edge, node, now, &cost);
            next.progress = query.target.advance(node, label.progress);
            let ctx = BoundContext {
                node,
                lower_bounds: query.lower_bounds,
                boarding: cost.boarding,
                has_connection: next.last_connection.is_some(),
            };
            next.criteria.update(&cost, &ctx);
            if next.criteria.filter(config) {
                stats.labels_filtered += 1;
                continue;
            }

            self.push(next)?;
            stats.labels_created += 1;
        }
        Ok(())
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn dominates(a: &(u8, u8), b: &(u8, u8)) -> bool {
        a.0 <= b.0 && a.1 <= b.1 && a != b
    }

    proptest! {
        /// After any insertion sequence the front is mutually
        /// non-dominated and covers every inserted point.
        #[test]
        fn front_is_non_dominated(points in prop::collection::vec((0u8..10, 0u8..10), 0..40)) {
            let mut front = Vec::new();
            for p in &points {
                pareto_insert(&mut front, *p, dominates, |a, b| a == b);
            }
            for a in &front {
                for b in &front {
                    prop_assert!(!dominates(a, b));
                }
            }
            for p in &points {
                prop_assert!(front.iter().any(|f| f == p || dominates(f, p)));
            }
        }
    }
}
