//! Citi Bike CSV loader.
//!
//! Reads a single trip export into [`TripRecord`]s plus a
//! [`StationDirectory`] built from the station name and coordinate columns.
//!
//! ## Required columns
//!
//! `start_station_id`, `end_station_id`, `started_at`, `member_casual`
//!
//! ## Optional columns
//!
//! `start_station_name`, `end_station_name`, `start_lat`, `start_lng`,
//! `end_lat`, `end_lng`
//!
//! Rows with blank station ids are kept as malformed records so the graph
//! builder can count them. Rows whose timestamp cannot be parsed, or that
//! fail to deserialise, are dropped here and reported in
//! [`LoadedTrips::unreadable_rows`].

use std::io;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use crate::error::LoadError;
use crate::model::{Station, StationDirectory, TripRecord, UserType};

const REQUIRED_COLUMNS: [&str; 4] = [
    "start_station_id",
    "end_station_id",
    "started_at",
    "member_casual",
];

/// Timestamp layouts seen across Citi Bike export generations.
const TIMESTAMP_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// Result of loading one export.
#[derive(Debug, Clone, Default)]
pub struct LoadedTrips {
    pub trips: Vec<TripRecord>,
    pub stations: StationDirectory,
    /// Rows dropped before becoming a [`TripRecord`].
    pub unreadable_rows: usize,
}

#[derive(Debug, Deserialize)]
struct RawTripRow {
    start_station_id: Option<String>,
    end_station_id: Option<String>,
    started_at: String,
    member_casual: Option<String>,
    #[serde(default)]
    start_station_name: Option<String>,
    #[serde(default)]
    end_station_name: Option<String>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    start_lat: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    start_lng: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    end_lat: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    end_lng: Option<f64>,
}

/// Load a trip export from `path`.
///
/// # Errors
///
/// [`LoadError::NotFound`] if the file does not exist,
/// [`LoadError::MissingColumn`] if a required header is absent, and
/// [`LoadError::Csv`] if the header row itself cannot be read.
#[instrument]
pub fn load_trips_csv(path: &Path) -> Result<LoadedTrips, LoadError> {
    if !path.exists() {
        return Err(LoadError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let file = std::fs::File::open(path).map_err(|e| csv_error(path, e.into()))?;
    let loaded = read_trips(file, path)?;
    info!(
        trips = loaded.trips.len(),
        stations = loaded.stations.len(),
        unreadable = loaded.unreadable_rows,
        "loaded trip export"
    );
    Ok(loaded)
}

/// Read a trip export from any reader. `source` is only used in errors.
///
/// # Errors
///
/// See [`load_trips_csv`].
pub fn read_trips<R: io::Read>(reader: R, source: &Path) -> Result<LoadedTrips, LoadError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers = rdr.headers().map_err(|e| csv_error(source, e))?.clone();
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == column) {
            return Err(LoadError::MissingColumn {
                path: source.to_path_buf(),
                column,
            });
        }
    }

    let mut loaded = LoadedTrips::default();

    for (line, row) in rdr.deserialize::<RawTripRow>().enumerate() {
        let row = match row {
            Ok(row) => row,
            Err(e) => {
                debug!(line = line + 2, error = %e, "skipping undecodable row");
                loaded.unreadable_rows += 1;
                continue;
            }
        };

        let Some(timestamp) = parse_timestamp(&row.started_at) else {
            debug!(
                line = line + 2,
                started_at = %row.started_at,
                "skipping row with bad timestamp"
            );
            loaded.unreadable_rows += 1;
            continue;
        };

        register_station(
            &mut loaded.stations,
            row.start_station_id.as_deref(),
            row.start_station_name.as_deref(),
            row.start_lat,
            row.start_lng,
        );
        register_station(
            &mut loaded.stations,
            row.end_station_id.as_deref(),
            row.end_station_name.as_deref(),
            row.end_lat,
            row.end_lng,
        );

        let user_type = row
            .member_casual
            .as_deref()
            .map_or(UserType::Unknown, |s| s.parse().unwrap_or(UserType::Unknown));

        loaded.trips.push(TripRecord {
            start_station_id: row.start_station_id,
            end_station_id: row.end_station_id,
            timestamp,
            user_type,
        });
    }

    if loaded.unreadable_rows > 0 {
        warn!(
            rows = loaded.unreadable_rows,
            source = %source.display(),
            "dropped unreadable rows"
        );
    }

    Ok(loaded)
}

fn register_station(
    stations: &mut StationDirectory,
    id: Option<&str>,
    name: Option<&str>,
    lat: Option<f64>,
    lon: Option<f64>,
) {
    let Some(id) = id.map(str::trim).filter(|id| !id.is_empty()) else {
        return;
    };
    stations.insert_if_absent(Station {
        id: id.to_string(),
        name: name.unwrap_or_default().to_string(),
        lat,
        lon,
    });
}

fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw.trim(), fmt).ok())
}

fn csv_error(path: &Path, source: csv::Error) -> LoadError {
    LoadError::Csv {
        path: PathBuf::from(path),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "ride_id,rideable_type,started_at,ended_at,start_station_name,start_station_id,end_station_name,end_station_id,start_lat,start_lng,end_lat,end_lng,member_casual";

    fn load(body: &str) -> Result<LoadedTrips, LoadError> {
        let csv = format!("{HEADER}\n{body}");
        read_trips(csv.as_bytes(), Path::new("test.csv"))
    }

    #[test]
    fn reads_current_export_layout() {
        let loaded = load(
            "r1,classic_bike,2022-01-01 08:00:00,2022-01-01 08:10:00,W 21 St & 6 Ave,6140.05,Broadway & W 58 St,6948.10,40.7417,-73.9942,40.7667,-73.9818,member\n\
             r2,electric_bike,2022-01-01 09:15:30.123,2022-01-01 09:30:00,Broadway & W 58 St,6948.10,W 21 St & 6 Ave,6140.05,40.7667,-73.9818,40.7417,-73.9942,casual\n",
        )
        .expect("load");

        assert_eq!(loaded.trips.len(), 2);
        assert_eq!(loaded.unreadable_rows, 0);
        assert_eq!(loaded.trips[0].endpoints(), Some(("6140.05", "6948.10")));
        assert_eq!(loaded.trips[1].user_type, UserType::Casual);

        assert_eq!(loaded.stations.len(), 2);
        let station = loaded.stations.get("6140.05").expect("station");
        assert_eq!(station.name, "W 21 St & 6 Ave");
        assert_eq!(station.lat, Some(40.7417));
    }

    #[test]
    fn blank_station_ids_stay_as_malformed_records() {
        let loaded = load(
            "r1,classic_bike,2022-01-01 08:00:00,2022-01-01 08:10:00,,,Broadway & W 58 St,6948.10,,,,,member\n",
        )
        .expect("load");
        assert_eq!(loaded.trips.len(), 1);
        assert!(!loaded.trips[0].is_well_formed());
        assert_eq!(loaded.stations.len(), 1);
    }

    #[test]
    fn bad_timestamp_counts_as_unreadable() {
        let loaded = load(
            "r1,classic_bike,yesterday,2022-01-01 08:10:00,A,1,B,2,,,,,member\n\
             r2,classic_bike,6/1/2022 07:05,6/1/2022 07:25,A,1,B,2,,,,,member\n",
        )
        .expect("load");
        assert_eq!(loaded.unreadable_rows, 1);
        assert_eq!(loaded.trips.len(), 1);
    }

    #[test]
    fn garbage_coordinates_do_not_drop_the_row() {
        let loaded = load("r1,classic_bike,2022-01-01 08:00:00,,A,1,B,2,n/a,n/a,,,casual\n")
            .expect("load");
        assert_eq!(loaded.trips.len(), 1);
        assert_eq!(loaded.stations.get("1").and_then(|s| s.lat), None);
    }

    #[test]
    fn missing_required_column_is_an_error() {
        let csv = "started_at,start_station_id,end_station_id\n2022-01-01 08:00:00,1,2\n";
        let err = read_trips(csv.as_bytes(), Path::new("t.csv")).expect_err("must fail");
        assert!(matches!(
            err,
            LoadError::MissingColumn {
                column: "member_casual",
                ..
            }
        ));
    }

    #[test]
    fn missing_file_is_not_found() {
        let err = load_trips_csv(Path::new("/definitely/not/here.csv")).expect_err("must fail");
        assert!(matches!(err, LoadError::NotFound { .. }));
    }
}
