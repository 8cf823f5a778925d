//! Multi-criteria journey search.
//!
//! A [`Router`] answers [`SearchRequest`]s against a [`Timetable`] with the
//! Pareto-optimal set of journeys over its criteria (by default travel
//! time, transfers and price). The router owns its label arena and queue
//! and reuses them across queries; concurrent searches use one router
//! each and share the timetable through a [`ScheduleLock`].

mod arena;
mod config;
mod criteria;
mod edge_cost;
mod error;
mod label;
mod lower_bounds;
mod pareto_dijkstra;
mod query_graph;
mod queue;
mod rank;
mod reconstruct;
mod request;
mod start_labels;


use std::time::Instant;

use tracing::debug;

use crate::domain::Time;
use crate::timetable::{Direction, NodeId, ScheduleLock, Timetable};

pub use arena::{LabelArena, LabelId};
pub use config::{ConfigError, SearchConfig};
pub use criteria::{
    BoundContext, CriteriaSet, CriteriaSummary, Criterion, DefaultCriteria, DominanceInfo, Price,
    Transfers, TravelTime,
};
pub use edge_cost::EdgeCost;
pub use error::SearchError;
pub use label::{Label, Ride, UsedConnection};
pub use lower_bounds::{INFINITE, LowerBounds};
pub use pareto_dijkstra::{ParetoDijkstra, Query, SearchTarget, pareto_insert};
pub use query_graph::{EdgeRef, QueryGraph};
pub use queue::BucketQueue;
pub use rank::rank_journeys;
pub use request::{
    AdditionalEdge, Interval, MumoTimeWindow, PathStop, SearchRequest, SearchResponse,
    Statistics, TripType,
};

/// Searches `timetable` with a fresh router and the default configuration.
pub fn search(timetable: &Timetable, request: &SearchRequest) -> Result<SearchResponse, SearchError> {
    Router::<DefaultCriteria>::new(SearchConfig::default()).search(timetable, request)
}

/// Reusable search worker.
#[derive(Debug)]
pub struct Router<C: CriteriaSet = DefaultCriteria> {
    config: SearchConfig,
    dijkstra: ParetoDijkstra<C>,
}

impl<C: CriteriaSet> Router<C> {
    pub fn new(config: SearchConfig) -> Self {
        let dijkstra = ParetoDijkstra::new(&config);
        Self { config, dijkstra }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Bytes held by the label arena. Stays at the first block between
    /// searches.
    pub fn arena_bytes(&self) -> usize {
        self.dijkstra.arena_bytes()
    }

    /// Answers one query.
    ///
    /// # Errors
    ///
    /// Returns `Err` for unknown stations, malformed or out-of-schedule
    /// intervals, and fatal graph or allocator failures. Running out of
    /// label budget is not an error.
    pub fn search(
        &mut self,
        timetable: &Timetable,
        request: &SearchRequest,
    ) -> Result<SearchResponse, SearchError> {
        let started = Instant::now();
        let outcome = self.run(timetable, request);
        self.dijkstra.reset(&self.config);

        let mut response = outcome?;
        response.statistics.total_calculation_time = started.elapsed().as_millis() as u64;
        debug!(
            journeys = response.journeys.len(),
            popped = response.statistics.labels_popped,
            max_label_quit = response.statistics.max_label_quit,
            ms = response.statistics.total_calculation_time,
            "search complete"
        );
        Ok(response)
    }

    /// Answers one query while holding a single read scope on `schedule`.
    pub fn search_shared(
        &mut self,
        schedule: &ScheduleLock<Timetable>,
        request: &SearchRequest,
    ) -> Result<SearchResponse, SearchError> {
        let timetable = schedule.read();
        self.search(&timetable, request)
    }

    fn run(
        &mut self,
        timetable: &Timetable,
        request: &SearchRequest,
    ) -> Result<SearchResponse, SearchError> {
        request.validate()?;
        let direction = request.direction;
        let target = resolve_target(timetable, request)?;
        let (begin, end) = schedule_interval(timetable, request)?;

        let graph = QueryGraph::new(timetable, &request.additional_edges);
        let mut statistics = Statistics::default();

        let bounds_started = Instant::now();
        let lower_bounds = LowerBounds::compute(&graph, target.goal, direction);
        statistics.lower_bounds_time = bounds_started.elapsed().as_millis() as u64;

        let start_times = if lower_bounds.is_reachable(target.origin) {
            start_labels::start_times(&graph, target.origin, begin, end, request.trip_type, direction)
        } else {
            debug!("destination unreachable from origin");
            Vec::new()
        };
        let query = Query {
            graph: &graph,
            lower_bounds: &lower_bounds,
            target: &target,
            direction,
            start_times: &start_times,
            trip_type: request.trip_type,
        };
        self.dijkstra.run(&query, &self.config, &mut statistics)?;

        let journeys = self
            .dijkstra
            .results()
            .iter()
            .map(|&id| reconstruct::reconstruct(&self.dijkstra, id, &graph, direction))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(SearchResponse {
            journeys: rank_journeys(journeys),
            statistics,
        })
    }
}

fn station_node(timetable: &Timetable, station_id: &str) -> Result<NodeId, SearchError> {
    let idx = timetable
        .station_by_id(station_id)
        .ok_or_else(|| SearchError::StationNotFound(station_id.to_string()))?;
    Ok(timetable.station(idx).node)
}

/// Origin, goal and vias in search order.
fn resolve_target(timetable: &Timetable, request: &SearchRequest) -> Result<SearchTarget, SearchError> {
    let nodes = request
        .path
        .iter()
        .map(|stop| station_node(timetable, &stop.station_id))
        .collect::<Result<Vec<_>, _>>()?;

    let (Some(&first), Some(&last)) = (nodes.first(), nodes.last()) else {
        return Err(SearchError::InvalidRequest("empty path".into()));
    };
    let mut vias = nodes[1..nodes.len() - 1].to_vec();
    if first == last && vias.is_empty() {
        return Err(SearchError::InvalidRequest(
            "origin and destination are the same station".into(),
        ));
    }
    if vias.len() > usize::from(u8::MAX) {
        return Err(SearchError::InvalidRequest("too many via stops".into()));
    }

    Ok(match request.direction {
        Direction::Forward => SearchTarget {
            origin: first,
            goal: last,
            vias,
        },
        Direction::Backward => {
            vias.reverse();
            SearchTarget {
                origin: last,
                goal: first,
                vias,
            }
        }
    })
}

/// Clips the request interval to the schedule period.
fn schedule_interval(
    timetable: &Timetable,
    request: &SearchRequest,
) -> Result<(Time, Time), SearchError> {
    let period = timetable.period();
    let first = period.to_unix(Time::ZERO);
    let last = period.to_unix(period.end());
    let interval = request.interval;
    if interval.end < first || interval.begin > last {
        return Err(SearchError::OutsideSchedule);
    }

    let begin = period.to_time_ceil(interval.begin.max(first));
    let end = period.to_time(interval.end.min(last));
    match (begin, end) {
        (Some(begin), Some(end)) => Ok((begin, end)),
        _ => Err(SearchError::OutsideSchedule),
    }
}
