//! Search errors.
//!
//! Query-input problems are reported to the caller. Graph inconsistencies
//! and allocator exhaustion are fatal for the query. Hitting the label
//! budget is not an error; see [`Statistics::max_label_quit`].
//!
//! [`Statistics::max_label_quit`]: super::Statistics::max_label_quit

/// Error from journey search.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SearchError {
    /// A path station is not in the timetable
    #[error("station not found: {0}")]
    StationNotFound(String),

    /// Interval begins after it ends
    #[error("malformed interval: begin {begin} is after end {end}")]
    MalformedInterval { begin: i64, end: i64 },

    /// Interval does not overlap the schedule period
    #[error("interval lies outside the schedule period")]
    OutsideSchedule,

    /// Invalid search request
    #[error("invalid search request: {0}")]
    InvalidRequest(String),

    /// The timetable contradicts its own invariants
    #[error("timetable inconsistency: {0}")]
    GraphInconsistency(String),

    /// The label arena could not grow
    #[error("label arena exhausted")]
    ArenaExhausted,
}

impl SearchError {
    /// Returns true for errors caused by the timetable or the process
    /// rather than by the query.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            SearchError::GraphInconsistency(_) | SearchError::ArenaExhausted
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        assert_eq!(
            SearchError::StationNotFound("X".into()).to_string(),
            "station not found: X"
        );
        assert_eq!(
            SearchError::MalformedInterval { begin: 5, end: 1 }.to_string(),
            "malformed interval: begin 5 is after end 1"
        );
    }

    #[test]
    fn fatal_kinds() {
        assert!(SearchError::ArenaExhausted.is_fatal());
        assert!(SearchError::GraphInconsistency("x".into()).is_fatal());
        assert!(!SearchError::OutsideSchedule.is_fatal());
    }
}
