//! Domain error types.
//!
//! These errors represent inconsistent output values in the domain layer.
//! They are distinct from graph-validation and search errors.

/// Domain-level errors for journey validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    /// Journey has no stops
    #[error("journey must have at least one stop")]
    EmptyJourney,

    /// A transport or attribute references a stop that does not exist
    #[error("stop range {from}..={to} out of bounds for {stops} stops")]
    StopOutOfRange { from: usize, to: usize, stops: usize },

    /// A transport runs backwards through the stop list
    #[error("stop range {from}..={to} is reversed")]
    ReversedRange { from: usize, to: usize },
}
