//! Timetable construction errors.

use crate::domain::InvalidStationId;

/// Error raised while building or loading a timetable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    #[error(transparent)]
    InvalidStationId(#[from] InvalidStationId),

    #[error("station {0} defined twice")]
    DuplicateStation(String),

    #[error("unknown station {0}")]
    UnknownStation(String),

    #[error("unknown category {0}")]
    UnknownCategory(String),

    #[error("unknown route {0}")]
    UnknownRoute(u32),

    /// A route needs at least two stops
    #[error("route with {stops} stops is too short")]
    RouteTooShort { stops: usize },

    /// A trip's stop list does not match its route
    #[error("trip {trip} has {found} stops, route has {expected}")]
    MisalignedTrip {
        trip: usize,
        expected: usize,
        found: usize,
    },

    #[error("trip {trip} has no {what} time at stop {stop}")]
    MissingTime {
        trip: usize,
        stop: usize,
        what: &'static str,
    },

    /// Times of one trip decrease along its stops
    #[error("trip {trip} goes back in time at stop {stop}")]
    TimeTravel { trip: usize, stop: usize },

    /// Departures on a route edge are not in trip order
    #[error("departures on route edge {edge} are not sorted")]
    UnsortedEvents { edge: usize },

    /// One trip overtakes another on the same route
    #[error("trips overtake each other on route edge {edge}")]
    Overtaking { edge: usize },

    #[error("trip {trip} runs on day {day}, schedule has {days} days")]
    DayMaskBeyondSchedule { trip: usize, day: u32, days: u32 },

    #[error("invalid through connection: {0}")]
    InvalidThrough(String),

    #[error("malformed timetable fixture: {0}")]
    MalformedFixture(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = GraphError::MisalignedTrip {
            trip: 2,
            expected: 3,
            found: 4,
        };
        assert_eq!(err.to_string(), "trip 2 has 4 stops, route has 3");

        let err = GraphError::MissingTime {
            trip: 0,
            stop: 1,
            what: "arrival",
        };
        assert_eq!(err.to_string(), "trip 0 has no arrival time at stop 1");
    }

    #[test]
    fn wraps_station_id_error() {
        let err: GraphError = crate::domain::StationId::parse("").unwrap_err().into();
        assert!(matches!(err, GraphError::InvalidStationId(_)));
    }
}
