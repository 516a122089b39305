//! Descriptive trip summaries.
//!
//! These are the figures a bike-share dashboard plots next to the network
//! metrics: rider mix, seasonal and daily volume, the busiest start stations
//! and the busiest routes. They are computed straight from trip records (or,
//! for routes, from the aggregated graph) and never fail.
//!
//! [`retain_seasons`] narrows a trip set to chosen seasons before any of
//! these, or the graph metrics, are computed.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use dockgraph_core::{Season, StationDirectory, TripRecord, UserType};
use serde::Serialize;
use tracing::{debug, instrument};

use crate::graph::build::StationGraph;

/// Trips started on one calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DailyCount {
    pub date: NaiveDate,
    pub trips: usize,
}

/// Trip starts at one station.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StationCount {
    pub station_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub trips: usize,
}

/// The busiest start stations and their mean start count.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationRanking {
    pub stations: Vec<StationCount>,
    /// Starts summed over the listed stations.
    pub total_trips: usize,
    /// Mean starts per listed station; 0.0 when the list is empty.
    pub avg_trips_per_station: f64,
}

/// Trips on one ordered station pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteCount {
    pub start_station_id: String,
    pub end_station_id: String,
    pub trips: u64,
}

/// Record counts, rider mix, seasonal and daily volume for a trip set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TripSummary {
    pub total_records: usize,
    pub well_formed_records: usize,
    pub skipped_records: usize,
    pub round_trips: usize,
    pub by_user_type: BTreeMap<UserType, usize>,
    /// Every season is present, with zero for seasons without trips.
    pub by_season: BTreeMap<Season, usize>,
    /// Ascending by date.
    pub daily: Vec<DailyCount>,
    /// Mean trips over the days that have any; 0.0 for an empty set.
    pub avg_daily_trips: f64,
    /// Busiest day; the earliest one on ties.
    pub peak_day: Option<DailyCount>,
    pub first_day: Option<NaiveDate>,
    pub last_day: Option<NaiveDate>,
}

impl TripSummary {
    /// Summarise `trips`. Every record counts towards the rider mix and
    /// daily volume; only well-formed ones count as usable.
    #[must_use]
    #[instrument(skip(trips), fields(records = trips.len()))]
    pub fn from_trips(trips: &[TripRecord]) -> Self {
        let mut by_user_type = BTreeMap::new();
        let mut by_season: BTreeMap<Season, usize> = Season::ALL.iter().map(|&s| (s, 0)).collect();
        let mut per_day: BTreeMap<NaiveDate, usize> = BTreeMap::new();
        let mut well_formed_records = 0;
        let mut round_trips = 0;

        for trip in trips {
            *by_user_type.entry(trip.user_type).or_insert(0) += 1;
            *by_season.entry(trip.season()).or_insert(0) += 1;
            *per_day.entry(trip.timestamp.date()).or_insert(0) += 1;
            if trip.is_well_formed() {
                well_formed_records += 1;
            }
            if trip.is_round_trip() {
                round_trips += 1;
            }
        }

        let daily: Vec<DailyCount> = per_day
            .into_iter()
            .map(|(date, trips)| DailyCount { date, trips })
            .collect();

        let peak_day = daily
            .iter()
            .copied()
            .fold(None::<DailyCount>, |best, day| match best {
                Some(b) if b.trips >= day.trips => Some(b),
                _ => Some(day),
            });

        Self {
            total_records: trips.len(),
            well_formed_records,
            skipped_records: trips.len() - well_formed_records,
            round_trips,
            by_user_type,
            by_season,
            avg_daily_trips: mean(trips.len(), daily.len()),
            first_day: daily.first().map(|d| d.date),
            last_day: daily.last().map(|d| d.date),
            daily,
            peak_day,
        }
    }
}

/// Keep only trips that started in one of `seasons`; an empty list keeps
/// everything. Returns the number of trips dropped.
pub fn retain_seasons(trips: &mut Vec<TripRecord>, seasons: &[Season]) -> usize {
    if seasons.is_empty() {
        return 0;
    }
    let before = trips.len();
    trips.retain(|trip| seasons.contains(&trip.season()));
    let dropped = before - trips.len();
    debug!(?seasons, kept = trips.len(), dropped, "filtered trips by season");
    dropped
}

/// The `n` stations with the most trip starts, most first; ties by id.
#[must_use]
pub fn top_start_stations(
    trips: &[TripRecord],
    n: usize,
    stations: Option<&StationDirectory>,
) -> StationRanking {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for (start, _) in trips.iter().filter_map(TripRecord::endpoints) {
        *counts.entry(start).or_insert(0) += 1;
    }

    let mut ranked: Vec<(&str, usize)> = counts.into_iter().collect();
    // Stable sort keeps the ascending id order among equal counts.
    ranked.sort_by(|a, b| b.1.cmp(&a.1));

    let listed: Vec<StationCount> = ranked
        .into_iter()
        .take(n)
        .map(|(id, trips)| StationCount {
            station_id: id.to_string(),
            name: stations.and_then(|d| d.name_of(id)).map(str::to_string),
            trips,
        })
        .collect();
    let total_trips = listed.iter().map(|s| s.trips).sum();

    StationRanking {
        avg_trips_per_station: mean(total_trips, listed.len()),
        total_trips,
        stations: listed,
    }
}

/// The `n` heaviest routes (edges, round trips included), most trips first;
/// ties by `(start, end)`.
#[must_use]
pub fn top_routes(sg: &StationGraph, n: usize) -> Vec<RouteCount> {
    let mut routes: Vec<(&str, &str, u64)> = sg.edges().collect();
    routes.sort_by(|a, b| b.2.cmp(&a.2));
    routes
        .into_iter()
        .take(n)
        .map(|(start, end, trips)| RouteCount {
            start_station_id: start.to_string(),
            end_station_id: end.to_string(),
            trips,
        })
        .collect()
}

#[allow(clippy::cast_precision_loss)]
const fn mean(total: usize, count: usize) -> f64 {
    if count == 0 {
        0.0
    } else {
        total as f64 / count as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{trip, trips};
    use dockgraph_core::Station;

    fn on(date: (i32, u32, u32), start: &str, end: &str, user_type: UserType) -> TripRecord {
        let ts = NaiveDate::from_ymd_opt(date.0, date.1, date.2)
            .and_then(|d| d.and_hms_opt(17, 45, 0))
            .expect("valid timestamp");
        TripRecord::new(start, end, ts, user_type)
    }

    #[test]
    fn summary_counts_rider_mix_and_days() {
        let records = vec![
            on((2022, 7, 2), "A", "B", UserType::Member),
            on((2022, 7, 1), "A", "A", UserType::Casual),
            on((2022, 7, 2), "B", "C", UserType::Member),
            on((2022, 7, 3), "C", "A", UserType::Unknown),
        ];
        let s = TripSummary::from_trips(&records);

        assert_eq!(s.total_records, 4);
        assert_eq!(s.well_formed_records, 4);
        assert_eq!(s.round_trips, 1);
        assert_eq!(s.by_user_type[&UserType::Member], 2);
        assert_eq!(s.by_user_type[&UserType::Casual], 1);
        assert_eq!(s.by_user_type[&UserType::Unknown], 1);

        let dates: Vec<u32> = s.daily.iter().map(|d| chrono::Datelike::day(&d.date)).collect();
        assert_eq!(dates, vec![1, 2, 3]);
        let peak = s.peak_day.expect("peak");
        assert_eq!(peak.trips, 2);
        assert_eq!(s.first_day, NaiveDate::from_ymd_opt(2022, 7, 1));
        assert_eq!(s.last_day, NaiveDate::from_ymd_opt(2022, 7, 3));
    }

    #[test]
    fn summary_counts_malformed_records() {
        let mut bad = trip("A", "B");
        bad.start_station_id = None;
        let s = TripSummary::from_trips(&[trip("A", "B"), bad]);
        assert_eq!(s.total_records, 2);
        assert_eq!(s.skipped_records, 1);
    }

    #[test]
    fn empty_summary_has_no_days() {
        let s = TripSummary::from_trips(&[]);
        assert_eq!(s.total_records, 0);
        assert!(s.daily.is_empty());
        assert_eq!(s.peak_day, None);
    }

    #[test]
    fn peak_day_prefers_earliest_on_ties() {
        let records = vec![
            on((2022, 7, 5), "A", "B", UserType::Member),
            on((2022, 7, 4), "A", "B", UserType::Member),
        ];
        let peak = TripSummary::from_trips(&records).peak_day.expect("peak");
        assert_eq!(peak.date, NaiveDate::from_ymd_opt(2022, 7, 4).expect("date"));
    }

    #[test]
    fn top_start_stations_ranks_by_starts_then_id() {
        let records = trips(&[("B", "A", 3), ("C", "A", 3), ("A", "B", 5), ("D", "A", 1)]);
        let dir: StationDirectory = [Station {
            id: "A".to_string(),
            name: "W 21 St & 6 Ave".to_string(),
            lat: None,
            lon: None,
        }]
        .into_iter()
        .collect();

        let ranking = top_start_stations(&records, 3, Some(&dir));
        let top = &ranking.stations;
        let ids: Vec<&str> = top.iter().map(|s| s.station_id.as_str()).collect();
        assert_eq!(ids, vec!["A", "B", "C"]);
        assert_eq!(top[0].trips, 5);
        assert_eq!(top[0].name.as_deref(), Some("W 21 St & 6 Ave"));
        assert_eq!(top[1].name, None);

        // D is not listed, so its single start stays out of the average.
        assert_eq!(ranking.total_trips, 11);
        assert!((ranking.avg_trips_per_station - 11.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn empty_ranking_has_zero_average() {
        let ranking = top_start_stations(&[], 5, None);
        assert!(ranking.stations.is_empty());
        assert_eq!(ranking.total_trips, 0);
        assert!(ranking.avg_trips_per_station.abs() < f64::EPSILON);
    }

    #[test]
    fn summary_counts_seasons_and_daily_average() {
        let records = vec![
            on((2022, 1, 10), "A", "B", UserType::Member),
            on((2022, 1, 10), "B", "A", UserType::Member),
            on((2022, 4, 2), "A", "C", UserType::Casual),
            on((2022, 12, 24), "C", "A", UserType::Member),
        ];
        let s = TripSummary::from_trips(&records);

        assert_eq!(s.by_season[&Season::Winter], 3);
        assert_eq!(s.by_season[&Season::Spring], 1);
        assert_eq!(s.by_season[&Season::Summer], 0);
        assert_eq!(s.by_season[&Season::Fall], 0);
        // Four trips over three active days.
        assert!((s.avg_daily_trips - 4.0 / 3.0).abs() < 1e-12);
        assert!(TripSummary::from_trips(&[]).avg_daily_trips.abs() < f64::EPSILON);
    }

    #[test]
    fn retain_seasons_keeps_selected_seasons() {
        let mut records = vec![
            on((2022, 2, 1), "A", "B", UserType::Member),
            on((2022, 7, 1), "A", "B", UserType::Member),
            on((2022, 10, 1), "B", "C", UserType::Casual),
            on((2022, 12, 1), "C", "A", UserType::Casual),
        ];

        assert_eq!(retain_seasons(&mut records, &[]), 0);
        assert_eq!(records.len(), 4);

        let dropped = retain_seasons(&mut records, &[Season::Winter, Season::Fall]);
        assert_eq!(dropped, 1);
        let seasons: Vec<Season> = records.iter().map(TripRecord::season).collect();
        assert_eq!(seasons, vec![Season::Winter, Season::Fall, Season::Winter]);
    }

    #[test]
    fn top_routes_ranks_edges() {
        let g = StationGraph::from_trips(&trips(&[("A", "B", 2), ("B", "A", 4), ("C", "C", 2)]))
            .expect("build");
        let top = top_routes(&g, 2);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].start_station_id, "B");
        assert_eq!(top[0].trips, 4);
        assert_eq!(top[1].start_station_id, "A", "A→B sorts before C→C on ties");
    }
}
