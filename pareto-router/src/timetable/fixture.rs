//! JSON timetable fixtures.
//!
//! A small human-writable format used by the CLI and by tests. Times are
//! "HH:MM" strings relative to the trip's start day (hours up to 47).

use std::collections::HashMap;
use std::path::Path;

use chrono::NaiveDate;
use serde::Deserialize;

use crate::domain::{SchedulePeriod, Time};

use super::{
    CategoryId, ConnectionInfo, DayMask, GraphError, RouteId, ServiceAttribute, StationIdx,
    StopTime, Timetable, TimetableBuilder, TrackId, TripSpec,
};

#[derive(Debug, Clone, Deserialize)]
pub struct TimetableFixture {
    pub first_day: NaiveDate,
    pub days: u32,
    #[serde(default)]
    pub categories: Vec<String>,
    pub stations: Vec<StationFixture>,
    #[serde(default)]
    pub routes: Vec<RouteFixture>,
    #[serde(default)]
    pub footpaths: Vec<FootpathFixture>,
    #[serde(default)]
    pub through: Vec<ThroughFixture>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StationFixture {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub transfer_time: u32,
    #[serde(default)]
    pub interchange: Vec<InterchangeFixture>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InterchangeFixture {
    pub from: String,
    pub to: String,
    pub minutes: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RouteFixture {
    pub stops: Vec<String>,
    pub trips: Vec<TripFixture>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TripFixture {
    pub category: String,
    pub train_nr: u32,
    #[serde(default)]
    pub line: String,
    #[serde(default)]
    pub price: u32,
    #[serde(default)]
    pub attributes: Vec<ServiceAttribute>,
    /// Traffic days; absent means daily.
    #[serde(default)]
    pub days: Option<Vec<u32>>,
    /// `[arrival, departure]` per stop.
    pub times: Vec<(Option<String>, Option<String>)>,
    /// `[arrival track, departure track]` per stop.
    #[serde(default)]
    pub tracks: Vec<(Option<String>, Option<String>)>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FootpathFixture {
    pub from: String,
    pub to: String,
    pub duration: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ThroughFixture {
    pub from_route: u32,
    pub to_route: u32,
    pub trips: Vec<Option<u32>>,
}

impl TimetableFixture {
    /// Reads a fixture from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, GraphError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| GraphError::MalformedFixture(format!("{}: {e}", path.display())))?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, GraphError> {
        serde_json::from_str(text).map_err(|e| GraphError::MalformedFixture(e.to_string()))
    }

    /// Builds and validates the timetable.
    pub fn build(&self) -> Result<Timetable, GraphError> {
        if self.days == 0 || self.days > DayMask::MAX_DAYS {
            return Err(GraphError::MalformedFixture(format!(
                "schedule must have 1 to {} days, got {}",
                DayMask::MAX_DAYS,
                self.days
            )));
        }

        let mut b = TimetableBuilder::new(SchedulePeriod::new(self.first_day, self.days));

        let categories: HashMap<&str, CategoryId> = self
            .categories
            .iter()
            .map(|name| (name.as_str(), b.add_category(name)))
            .collect();
        let category = |name: &str| {
            categories
                .get(name)
                .copied()
                .ok_or_else(|| GraphError::UnknownCategory(name.to_string()))
        };

        let mut stations: HashMap<&str, StationIdx> = HashMap::new();
        for s in &self.stations {
            let idx = b.add_station(&s.id, &s.name, s.transfer_time)?;
            stations.insert(s.id.as_str(), idx);
        }
        let station = |id: &str| {
            stations
                .get(id)
                .copied()
                .ok_or_else(|| GraphError::UnknownStation(id.to_string()))
        };

        for s in &self.stations {
            let idx = station(&s.id)?;
            for rule in &s.interchange {
                b.set_interchange(idx, category(&rule.from)?, category(&rule.to)?, rule.minutes);
            }
        }

        let mut tracks: HashMap<String, TrackId> = HashMap::new();
        let mut routes: Vec<RouteId> = Vec::with_capacity(self.routes.len());
        for route in &self.routes {
            let stops = route
                .stops
                .iter()
                .map(|id| station(id))
                .collect::<Result<Vec<_>, _>>()?;

            let mut trips = Vec::with_capacity(route.trips.len());
            for trip in &route.trips {
                let info = b.add_info(ConnectionInfo {
                    category: category(&trip.category)?,
                    train_nr: trip.train_nr,
                    line: trip.line.clone(),
                    attributes: trip.attributes.clone(),
                    price: trip.price,
                });
                let days = match &trip.days {
                    None => DayMask::ALL,
                    Some(days) => DayMask::from_days(days.iter().copied()).ok_or_else(|| {
                        GraphError::MalformedFixture(format!("train {}: day out of range", trip.train_nr))
                    })?,
                };

                let mut times = Vec::with_capacity(trip.times.len());
                for (i, (arr, dep)) in trip.times.iter().enumerate() {
                    let (arr_track, dep_track) = trip.tracks.get(i).cloned().unwrap_or_default();
                    times.push(StopTime {
                        arrival: parse_minutes(arr.as_deref())?,
                        departure: parse_minutes(dep.as_deref())?,
                        arrival_track: arr_track.map(|t| intern(&mut b, &mut tracks, t)),
                        departure_track: dep_track.map(|t| intern(&mut b, &mut tracks, t)),
                    });
                }
                trips.push(TripSpec {
                    info,
                    days,
                    stops: times,
                });
            }
            routes.push(b.add_route(&stops, trips)?);
        }

        for path in &self.footpaths {
            b.add_footpath(station(&path.from)?, station(&path.to)?, path.duration)?;
        }

        for through in &self.through {
            let route = |i: u32| {
                routes
                    .get(i as usize)
                    .copied()
                    .ok_or(GraphError::UnknownRoute(i))
            };
            b.add_through(
                route(through.from_route)?,
                route(through.to_route)?,
                through.trips.clone(),
            )?;
        }

        Ok(b.build())
    }
}

fn parse_minutes(s: Option<&str>) -> Result<Option<u32>, GraphError> {
    s.map(|s| {
        Time::parse_hhmm(s, 0)
            .map(Time::minutes)
            .map_err(|e| GraphError::MalformedFixture(format!("{s:?}: {e}")))
    })
    .transpose()
}

fn intern(b: &mut TimetableBuilder, tracks: &mut HashMap<String, TrackId>, name: String) -> TrackId {
    *tracks.entry(name).or_insert_with_key(|name| b.add_track(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const FIXTURE: &str = r#"{
        "first_day": "2026-03-02",
        "days": 2,
        "categories": ["ICE", "RE"],
        "stations": [
            {"id": "A", "name": "Alpha", "transfer_time": 5,
             "interchange": [{"from": "ICE", "to": "RE", "minutes": 9}]},
            {"id": "B", "name": "Beta", "transfer_time": 3},
            {"id": "C", "name": "Gamma"}
        ],
        "routes": [
            {"stops": ["A", "B"], "trips": [
                {"category": "ICE", "train_nr": 100, "price": 20,
                 "times": [[null, "08:00"], ["08:30", null]],
                 "tracks": [[null, "1"], ["4", null]]},
                {"category": "ICE", "train_nr": 102, "days": [1],
                 "times": [[null, "10:00"], ["10:30", null]]}
            ]}
        ],
        "footpaths": [{"from": "B", "to": "C", "duration": 4}]
    }"#;

    #[test]
    fn builds_from_json() {
        let tt = TimetableFixture::from_json(FIXTURE).unwrap().build().unwrap();
        assert_eq!(tt.stations().len(), 3);
        assert_eq!(tt.period().days(), 2);

        let a = tt.station_by_id("A").unwrap();
        assert_eq!(tt.interchange_time(a, CategoryId(0), CategoryId(1)), 9);
        assert_eq!(tt.track_name(TrackId(0)), "1");
        assert_eq!(tt.track_name(TrackId(1)), "4");
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(FIXTURE.as_bytes()).unwrap();

        let fixture = TimetableFixture::load(file.path()).unwrap();
        assert_eq!(fixture.routes[0].trips.len(), 2);
        assert!(fixture.build().is_ok());
    }

    #[test]
    fn missing_file_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let err = TimetableFixture::load(dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, GraphError::MalformedFixture(_)));
    }

    #[test]
    fn rejects_unknown_references() {
        let mut fixture = TimetableFixture::from_json(FIXTURE).unwrap();
        fixture.routes[0].stops[1] = "Q".into();
        assert_eq!(
            fixture.build().unwrap_err(),
            GraphError::UnknownStation("Q".into())
        );

        let mut fixture = TimetableFixture::from_json(FIXTURE).unwrap();
        fixture.routes[0].trips[0].category = "TGV".into();
        assert_eq!(
            fixture.build().unwrap_err(),
            GraphError::UnknownCategory("TGV".into())
        );
    }

    #[test]
    fn rejects_bad_times_and_days() {
        let mut fixture = TimetableFixture::from_json(FIXTURE).unwrap();
        fixture.routes[0].trips[0].times[0].1 = Some("8am".into());
        assert!(matches!(
            fixture.build(),
            Err(GraphError::MalformedFixture(_))
        ));

        let mut fixture = TimetableFixture::from_json(FIXTURE).unwrap();
        fixture.days = 65;
        assert!(matches!(
            fixture.build(),
            Err(GraphError::MalformedFixture(_))
        ));
    }

    #[test]
    fn rejects_invalid_json() {
        assert!(matches!(
            TimetableFixture::from_json("{"),
            Err(GraphError::MalformedFixture(_))
        ));
    }
}
