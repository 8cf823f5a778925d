//! Query and response types.

use serde::{Deserialize, Serialize};

use crate::domain::Journey;
use crate::timetable::Direction;

use super::SearchError;

/// Unix-timestamp interval (seconds). For pre-trip queries, the window of
/// departure (forward) or arrival (backward) times.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interval {
    pub begin: i64,
    pub end: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathStop {
    pub station_id: String,
    #[serde(default)]
    pub name: String,
}

impl PathStop {
    pub fn new(station_id: impl Into<String>) -> Self {
        Self {
            station_id: station_id.into(),
            name: String::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TripType {
    /// Any departure inside the interval.
    #[default]
    PreTrip,
    /// Already at the origin at a fixed instant: `interval.begin`
    /// forward, `interval.end` backward.
    OnTrip,
}

/// Usage window of a mumo edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MumoTimeWindow {
    /// Unix timestamps.
    Absolute { begin: i64, end: i64 },
    /// Minutes of day, repeating daily.
    Daily { begin_minute: u32, end_minute: u32 },
}

/// A query-local edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AdditionalEdge {
    Hotel {
        station_id: String,
        /// Minute of day.
        checkout_time: u32,
        min_stay: u32,
        price: u32,
    },
    Mumo {
        from_station_id: String,
        to_station_id: String,
        duration: u32,
        price: u32,
        #[serde(default)]
        id: u32,
        #[serde(default)]
        name: String,
        #[serde(default)]
        window: Option<MumoTimeWindow>,
    },
}

/// A journey query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub interval: Interval,
    /// Origin, optional via stops in order, destination.
    pub path: Vec<PathStop>,
    #[serde(default)]
    pub trip_type: TripType,
    #[serde(default)]
    pub direction: Direction,
    #[serde(default)]
    pub additional_edges: Vec<AdditionalEdge>,
}

impl SearchRequest {
    /// A forward pre-trip query from `from` to `to`.
    pub fn new(from: &str, to: &str, begin: i64, end: i64) -> Self {
        Self {
            interval: Interval { begin, end },
            path: vec![PathStop::new(from), PathStop::new(to)],
            trip_type: TripType::PreTrip,
            direction: Direction::Forward,
            additional_edges: Vec::new(),
        }
    }

    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    pub fn on_trip(mut self) -> Self {
        self.trip_type = TripType::OnTrip;
        self
    }

    /// Inserts a via stop before the destination.
    pub fn via(mut self, station_id: &str) -> Self {
        let at = self.path.len().saturating_sub(1);
        self.path.insert(at, PathStop::new(station_id));
        self
    }

    pub fn with_edge(mut self, edge: AdditionalEdge) -> Self {
        self.additional_edges.push(edge);
        self
    }

    /// Validate the request shape. Station lookup happens against the
    /// timetable later.
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.interval.begin > self.interval.end {
            return Err(SearchError::MalformedInterval {
                begin: self.interval.begin,
                end: self.interval.end,
            });
        }

        if self.path.len() < 2 {
            return Err(SearchError::InvalidRequest(
                "path needs an origin and a destination".to_string(),
            ));
        }

        Ok(())
    }
}

/// Counters describing one search run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statistics {
    pub labels_created: u64,
    pub labels_popped: u64,
    pub labels_popped_until_first_result: u64,
    pub labels_popped_after_last_result: u64,
    pub start_label_count: u64,
    /// The label budget ran out; results are partial.
    pub max_label_quit: bool,
    pub labels_filtered: u64,
    pub labels_dominated_by_results: u64,
    pub labels_dominated_at_node: u64,
    /// Milliseconds.
    pub lower_bounds_time: u64,
    /// Milliseconds.
    pub total_calculation_time: u64,
}

/// Result of journey search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResponse {
    /// Journeys ranked by departure, duration, transfers, price.
    pub journeys: Vec<Journey>,
    pub statistics: Statistics,
}
