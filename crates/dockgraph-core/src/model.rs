//! Trip and station data model.
//!
//! A [`TripRecord`] is one rental event. Station ids are optional at the type
//! level so that loaders can hand over rows with a missing dock id; the
//! analyser counts those as malformed instead of rejecting the whole batch.
//!
//! [`Station`] values are static reference data. They label output rows but
//! never decide which stations exist in a trip graph.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDateTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// UserType
// ---------------------------------------------------------------------------

/// Rider category of a trip (`member_casual` in Citi Bike exports).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    /// Annual or monthly subscriber.
    Member,
    /// Single ride or day pass customer.
    Casual,
    /// Anything the export did not classify.
    Unknown,
}

impl UserType {
    /// Canonical lowercase label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Member => "member",
            Self::Casual => "casual",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for UserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserType {
    type Err = std::convert::Infallible;

    /// Parse a rider label. Pre-2021 exports used `Subscriber` / `Customer`;
    /// both spellings are accepted. Unrecognised labels map to
    /// [`UserType::Unknown`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "member" | "subscriber" => Self::Member,
            "casual" | "customer" => Self::Casual,
            _ => Self::Unknown,
        })
    }
}

// ---------------------------------------------------------------------------
// Season
// ---------------------------------------------------------------------------

/// Meteorological season of a trip start, by calendar month.
///
/// Winter is December through February, so a season spans the year end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Season {
    Winter,
    Spring,
    Summer,
    Fall,
}

impl Season {
    pub const ALL: [Self; 4] = [Self::Winter, Self::Spring, Self::Summer, Self::Fall];

    /// Season for a month number (1 = January). Out-of-range months are
    /// treated modulo twelve.
    #[must_use]
    pub const fn from_month(month: u32) -> Self {
        match month % 12 {
            3..=5 => Self::Spring,
            6..=8 => Self::Summer,
            9..=11 => Self::Fall,
            _ => Self::Winter,
        }
    }

    /// Season a timestamp falls in.
    #[must_use]
    pub fn of(timestamp: &NaiveDateTime) -> Self {
        Self::from_month(timestamp.month())
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Winter => "winter",
            Self::Spring => "spring",
            Self::Summer => "summer",
            Self::Fall => "fall",
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Label that is not one of the four seasons.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown season `{0}`")]
pub struct UnknownSeason(pub String);

impl FromStr for Season {
    type Err = UnknownSeason;

    /// Case-insensitive; `autumn` is accepted for [`Season::Fall`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "winter" => Ok(Self::Winter),
            "spring" => Ok(Self::Spring),
            "summer" => Ok(Self::Summer),
            "fall" | "autumn" => Ok(Self::Fall),
            _ => Err(UnknownSeason(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// TripRecord
// ---------------------------------------------------------------------------

/// One rental event linking a start and end station.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripRecord {
    /// Dock the trip started at. `None` or blank marks the record malformed.
    pub start_station_id: Option<String>,
    /// Dock the trip ended at. `None` or blank marks the record malformed.
    pub end_station_id: Option<String>,
    /// Trip start time as reported by the operator (local wall clock).
    pub timestamp: NaiveDateTime,
    /// Rider category.
    pub user_type: UserType,
}

impl TripRecord {
    /// Build a well-formed record.
    pub fn new(
        start_station_id: impl Into<String>,
        end_station_id: impl Into<String>,
        timestamp: NaiveDateTime,
        user_type: UserType,
    ) -> Self {
        Self {
            start_station_id: Some(start_station_id.into()),
            end_station_id: Some(end_station_id.into()),
            timestamp,
            user_type,
        }
    }

    /// Return `(start, end)` station ids, trimmed, or `None` if either is
    /// missing or blank.
    #[must_use]
    pub fn endpoints(&self) -> Option<(&str, &str)> {
        let start = non_blank(self.start_station_id.as_deref())?;
        let end = non_blank(self.end_station_id.as_deref())?;
        Some((start, end))
    }

    /// True when both station ids are present.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        self.endpoints().is_some()
    }

    /// True when the trip starts and ends at the same dock.
    #[must_use]
    pub fn is_round_trip(&self) -> bool {
        self.endpoints().is_some_and(|(start, end)| start == end)
    }

    /// Season the trip started in.
    #[must_use]
    pub fn season(&self) -> Season {
        Season::of(&self.timestamp)
    }
}

fn non_blank(id: Option<&str>) -> Option<&str> {
    id.map(str::trim).filter(|id| !id.is_empty())
}

// ---------------------------------------------------------------------------
// Station
// ---------------------------------------------------------------------------

/// A physical docking point. Identity is [`Station::id`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    pub id: String,
    pub name: String,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

/// Reference lookup from station id to [`Station`].
///
/// Backed by a `BTreeMap` so iteration order is the station id order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StationDirectory {
    stations: BTreeMap<String, Station>,
}

impl StationDirectory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `station` unless its id is already known.
    ///
    /// The first sighting wins; exports repeat station attributes on every
    /// row and later rows occasionally carry rounded coordinates.
    /// Returns `true` if the station was inserted.
    pub fn insert_if_absent(&mut self, station: Station) -> bool {
        if self.stations.contains_key(&station.id) {
            return false;
        }
        self.stations.insert(station.id.clone(), station);
        true
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Station> {
        self.stations.get(id)
    }

    /// Display name for `id`, if known and non-empty.
    #[must_use]
    pub fn name_of(&self, id: &str) -> Option<&str> {
        self.stations
            .get(id)
            .map(|s| s.name.as_str())
            .filter(|name| !name.is_empty())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.stations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Station> {
        self.stations.values()
    }
}

impl FromIterator<Station> for StationDirectory {
    fn from_iter<I: IntoIterator<Item = Station>>(iter: I) -> Self {
        let mut dir = Self::new();
        for station in iter {
            dir.insert_if_absent(station);
        }
        dir
    }
}
