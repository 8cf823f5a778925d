//! Multi-criteria journey planner.
//!
//! Answers: "which journeys from A to B within this time window are not
//! beaten on travel time, transfers and price by any other?" The
//! timetable is a time-expanded station/route graph; the search is a
//! label-setting Pareto-Dijkstra over it.

pub mod domain;
pub mod search;
pub mod timetable;
