//! `dg top`: busiest start stations or routes.

use std::io::{self, Write};
use std::path::PathBuf;

use clap::Args;
use dockgraph_analysis::summary::{
    RouteCount, StationCount, StationRanking, top_routes, top_start_stations,
};
use dockgraph_core::config::DockgraphConfig;
use dockgraph_core::{Season, timing};
use serde::Serialize;

use super::{SeasonFilter, season_label};
use crate::output::{OutputMode, Renderable, pretty_kv, pretty_rule, render_list, render_mode};

/// Arguments for `dg top`.
#[derive(Args, Debug)]
pub struct TopArgs {
    /// Trip export (CSV).
    pub input: PathBuf,

    /// Number of rows (default: `analysis.top_n`).
    #[arg(long)]
    pub limit: Option<usize>,

    /// Rank station pairs instead of start stations.
    #[arg(long)]
    pub routes: bool,

    #[command(flatten)]
    pub filter: SeasonFilter,
}

#[derive(Debug, Serialize)]
struct StationsPayload {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    seasons: Vec<Season>,
    #[serde(flatten)]
    ranking: StationRanking,
}

impl Renderable for StationCount {
    fn render_human(&self, w: &mut dyn Write) -> io::Result<()> {
        writeln!(
            w,
            "{:<12} {:>8}  {}",
            self.station_id,
            self.trips,
            self.name.as_deref().unwrap_or("-")
        )
    }

    fn render_table(&self, w: &mut dyn Write) -> io::Result<()> {
        writeln!(w, "{}  {}", self.station_id, self.trips)
    }

    fn table_headers() -> &'static [&'static str] {
        &["station_id", "trips"]
    }
}

impl Renderable for RouteCount {
    fn render_human(&self, w: &mut dyn Write) -> io::Result<()> {
        writeln!(
            w,
            "{:<12} -> {:<12} {:>8}",
            self.start_station_id, self.end_station_id, self.trips
        )
    }

    fn render_table(&self, w: &mut dyn Write) -> io::Result<()> {
        writeln!(
            w,
            "{}  {}  {}",
            self.start_station_id, self.end_station_id, self.trips
        )
    }

    fn table_headers() -> &'static [&'static str] {
        &["start_station_id", "end_station_id", "trips"]
    }
}

/// Execute `dg top`.
pub fn run_top(args: &TopArgs, output: OutputMode, config: &DockgraphConfig) -> anyhow::Result<()> {
    let limit = args.limit.unwrap_or(config.analysis.top_n);
    let loaded = super::load_input(&args.input, &args.filter, output)?;

    if args.routes {
        let graph = super::build_graph(&loaded, &args.input, output)?;
        let routes = timing::timed("top.routes", || top_routes(&graph, limit));
        render_list(&routes, output)
    } else {
        let ranking = timing::timed("top.stations", || {
            top_start_stations(&loaded.trips, limit, Some(&loaded.stations))
        });
        let payload = StationsPayload {
            seasons: args.filter.selected(),
            ranking,
        };
        render_mode(output, &payload, render_stations_text, render_stations_pretty)
    }
}

fn render_stations_text(payload: &StationsPayload, w: &mut dyn Write) -> io::Result<()> {
    let stations = &payload.ranking.stations;
    if !stations.is_empty() {
        writeln!(w, "{}", StationCount::table_headers().join("  "))?;
    }
    for station in stations {
        station.render_table(w)?;
    }
    Ok(())
}

fn render_stations_pretty(payload: &StationsPayload, w: &mut dyn Write) -> io::Result<()> {
    let ranking = &payload.ranking;
    for station in &ranking.stations {
        station.render_human(w)?;
    }
    pretty_rule(w)?;
    if !payload.seasons.is_empty() {
        pretty_kv(w, "Seasons", season_label(&payload.seasons))?;
    }
    pretty_kv(w, "Listed trips", ranking.total_trips.to_string())?;
    pretty_kv(w, "Avg per station", format!("{:.0}", ranking.avg_trips_per_station))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> StationsPayload {
        StationsPayload {
            seasons: vec![Season::Summer],
            ranking: StationRanking {
                stations: vec![
                    StationCount {
                        station_id: "6140.05".to_string(),
                        name: Some("W 21 St & 6 Ave".to_string()),
                        trips: 9,
                    },
                    StationCount {
                        station_id: "5905.14".to_string(),
                        name: None,
                        trips: 3,
                    },
                ],
                total_trips: 12,
                avg_trips_per_station: 6.0,
            },
        }
    }

    #[test]
    fn text_lists_stations_under_header() {
        let mut buf = Vec::new();
        render_stations_text(&payload(), &mut buf).expect("render");
        let text = String::from_utf8(buf).expect("utf8");
        assert_eq!(text, "station_id  trips\n6140.05  9\n5905.14  3\n");
    }

    #[test]
    fn pretty_ends_with_average() {
        let mut buf = Vec::new();
        render_stations_pretty(&payload(), &mut buf).expect("render");
        let text = String::from_utf8(buf).expect("utf8");
        assert!(text.contains("W 21 St & 6 Ave"));
        assert!(text.contains("Seasons:"));
        assert!(text.trim_end().ends_with("Avg per station:   6"), "{text}");
    }

    #[test]
    fn json_flattens_ranking() {
        let json = serde_json::to_value(payload()).expect("serialize");
        assert_eq!(json["seasons"][0], "summer");
        assert_eq!(json["stations"][1]["station_id"], "5905.14");
        assert_eq!(json["avg_trips_per_station"], 6.0);
    }
}
