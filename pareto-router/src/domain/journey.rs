//! Journey types.
//!
//! A `Journey` is the passenger-visible rendering of one search result:
//! the stops visited, the transports between them, and the service
//! attributes that apply to ranges of stops.

use serde::{Deserialize, Serialize};

use super::DomainError;

/// Arrival or departure at a stop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopEvent {
    /// Unix timestamp (seconds, UTC).
    pub time: i64,
    /// Platform or track, if known.
    pub platform: Option<String>,
}

/// A stop of a journey.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stop {
    pub station_id: String,
    pub name: String,
    /// Absent for the first stop.
    pub arrival: Option<StopEvent>,
    /// Absent for the last stop.
    pub departure: Option<StopEvent>,
    /// A vehicle is boarded here.
    pub enter: bool,
    /// A vehicle is left here.
    pub exit: bool,
    /// The boarding here follows an earlier connection.
    pub interchange: bool,
}

impl Stop {
    /// Creates a stop with no events or flags set.
    pub fn new(station_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            station_id: station_id.into(),
            name: name.into(),
            arrival: None,
            departure: None,
            enter: false,
            exit: false,
            interchange: false,
        }
    }
}

/// The kind of a non-scheduled move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WalkKind {
    Foot,
    Mumo { id: u32, name: String },
    Hotel,
}

/// How the passenger gets from one stop to another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "move", rename_all = "snake_case")]
pub enum Move {
    /// A scheduled vehicle.
    Connection {
        category: String,
        train_nr: u32,
        line: String,
        duration: u32,
    },
    /// A walk, a mumo ride or an overnight stay.
    Walk { kind: WalkKind, duration: u32 },
}

/// A transport between two stops (indices into [`Journey::stops`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transport {
    pub from: usize,
    pub to: usize,
    #[serde(flatten)]
    pub movement: Move,
}

impl Transport {
    /// Returns true for scheduled vehicles.
    pub fn is_connection(&self) -> bool {
        matches!(self.movement, Move::Connection { .. })
    }

    /// Returns the duration in minutes.
    pub fn duration(&self) -> u32 {
        match &self.movement {
            Move::Connection { duration, .. } | Move::Walk { duration, .. } => *duration,
        }
    }
}

/// A service attribute valid between two stops.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub from: usize,
    pub to: usize,
    pub code: String,
    pub text: String,
}

/// A complete journey.
///
/// # Invariants
///
/// - At least one stop
/// - Every transport and attribute range lies inside the stop list and
///   runs forward (`from <= to`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Journey {
    stops: Vec<Stop>,
    transports: Vec<Transport>,
    attributes: Vec<Attribute>,
    /// Travel time in minutes as minimized by the search.
    pub duration: u32,
    pub transfers: u32,
    pub price: u32,
}

impl Journey {
    /// Constructs a journey, validating stop ranges.
    ///
    /// # Errors
    ///
    /// Returns `Err` if there are no stops or a range is out of bounds.
    pub fn new(
        stops: Vec<Stop>,
        transports: Vec<Transport>,
        attributes: Vec<Attribute>,
        duration: u32,
        transfers: u32,
        price: u32,
    ) -> Result<Self, DomainError> {
        if stops.is_empty() {
            return Err(DomainError::EmptyJourney);
        }

        let ranges = transports
            .iter()
            .map(|t| (t.from, t.to))
            .chain(attributes.iter().map(|a| (a.from, a.to)));
        for (from, to) in ranges {
            if from > to {
                return Err(DomainError::ReversedRange { from, to });
            }
            if to >= stops.len() {
                return Err(DomainError::StopOutOfRange {
                    from,
                    to,
                    stops: stops.len(),
                });
            }
        }

        Ok(Self {
            stops,
            transports,
            attributes,
            duration,
            transfers,
            price,
        })
    }

    pub fn stops(&self) -> &[Stop] {
        &self.stops
    }

    pub fn transports(&self) -> &[Transport] {
        &self.transports
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// Returns the departure timestamp at the first stop.
    pub fn departure_time(&self) -> Option<i64> {
        self.stops
            .iter()
            .find_map(|s| s.departure.as_ref())
            .map(|e| e.time)
    }

    /// Returns the arrival timestamp at the last stop.
    pub fn arrival_time(&self) -> Option<i64> {
        self.stops
            .iter()
            .rev()
            .find_map(|s| s.arrival.as_ref())
            .map(|e| e.time)
    }

    /// Counts interchange stops, which equals the number of transfers.
    pub fn interchange_count(&self) -> usize {
        self.stops.iter().filter(|s| s.interchange).count()
    }

    /// Pareto dominance on (duration, transfers, price).
    ///
    /// True if `self` is no worse in every criterion and strictly better in
    /// at least one.
    pub fn dominates(&self, other: &Journey) -> bool {
        let a = (self.duration, self.transfers, self.price);
        let b = (other.duration, other.transfers, other.price);
        a.0 <= b.0 && a.1 <= b.1 && a.2 <= b.2 && a != b
    }
}
