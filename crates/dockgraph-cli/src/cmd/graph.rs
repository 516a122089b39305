//! `dg graph`: station graph statistics.

use std::io::{self, Write};
use std::path::PathBuf;

use clap::Args;
use dockgraph_analysis::GraphStats;
use dockgraph_core::{Season, timing};
use serde::Serialize;

use super::{SeasonFilter, season_label};
use crate::output::{OutputMode, pretty_kv, pretty_section, render_mode};

/// Arguments for `dg graph`.
#[derive(Args, Debug)]
pub struct GraphArgs {
    /// Trip export (CSV).
    pub input: PathBuf,

    #[command(flatten)]
    pub filter: SeasonFilter,
}

#[derive(Debug, Serialize)]
struct GraphPayload {
    source: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    seasons: Vec<Season>,
    unreadable_rows: usize,
    #[serde(flatten)]
    stats: GraphStats,
}

/// Execute `dg graph`.
pub fn run_graph(args: &GraphArgs, output: OutputMode) -> anyhow::Result<()> {
    let loaded = super::load_input(&args.input, &args.filter, output)?;
    let graph = super::build_graph(&loaded, &args.input, output)?;
    let stats = timing::timed("graph.stats", || GraphStats::from_graph(&graph));

    let payload = GraphPayload {
        source: args.input.display().to_string(),
        seasons: args.filter.selected(),
        unreadable_rows: loaded.unreadable_rows,
        stats,
    };
    render_mode(output, &payload, render_text, render_pretty)
}

fn render_text(payload: &GraphPayload, w: &mut dyn Write) -> io::Result<()> {
    let s = &payload.stats;
    writeln!(w, "stations {}", s.node_count)?;
    writeln!(w, "routes {}", s.edge_count)?;
    writeln!(w, "trips {}", s.total_trips)?;
    writeln!(w, "round_trips {}", s.round_trips)?;
    writeln!(w, "density {:.6}", s.density)?;
    writeln!(w, "components {}", s.weakly_connected_component_count)?;
    writeln!(w, "isolated {}", s.isolated_station_count)?;
    writeln!(w, "skipped {}", s.skipped_records)?;
    writeln!(w, "unreadable {}", payload.unreadable_rows)?;
    writeln!(w, "hash {}", s.content_hash)
}

fn render_pretty(payload: &GraphPayload, w: &mut dyn Write) -> io::Result<()> {
    let s = &payload.stats;
    pretty_section(w, &format!("Station graph: {}", payload.source))?;
    if !payload.seasons.is_empty() {
        pretty_kv(w, "Seasons", season_label(&payload.seasons))?;
    }
    pretty_kv(w, "Stations", s.node_count.to_string())?;
    pretty_kv(
        w,
        "Routes",
        format!("{} ({} round-trip)", s.edge_count, s.round_trip_edges),
    )?;
    pretty_kv(
        w,
        "Trips",
        format!("{} ({} round trips)", s.total_trips, s.round_trips),
    )?;
    pretty_kv(w, "Density", format!("{:.4}", s.density))?;
    pretty_kv(w, "Components", s.weakly_connected_component_count.to_string())?;
    pretty_kv(w, "Isolated", s.isolated_station_count.to_string())?;
    pretty_kv(
        w,
        "Max neighbours",
        format!("{} in / {} out", s.max_in_neighbors, s.max_out_neighbors),
    )?;
    if let Some(ref route) = s.heaviest_route {
        pretty_kv(
            w,
            "Busiest route",
            format!(
                "{} -> {} ({} trips)",
                route.start_station_id, route.end_station_id, route.trips
            ),
        )?;
    }
    pretty_kv(
        w,
        "Skipped",
        format!(
            "{} missing station id, {} unreadable",
            s.skipped_records, payload.unreadable_rows
        ),
    )?;
    pretty_kv(w, "Content hash", &s.content_hash)
}
