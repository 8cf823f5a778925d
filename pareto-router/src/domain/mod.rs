//! Domain types for the journey router.
//!
//! This module contains the value types shared by the timetable and the
//! search: validated station ids, schedule time, and the journey output
//! model. All types enforce their invariants at construction time.

mod error;
mod journey;
mod station;
mod time;

pub use error::DomainError;
pub use journey::{Attribute, Journey, Move, Stop, StopEvent, Transport, WalkKind};
pub use station::{InvalidStationId, StationId};
pub use time::{MINUTES_A_DAY, SchedulePeriod, Time, TimeError};
