//! `dg centrality`: per-station degree and betweenness table.

use std::io::{self, Write};
use std::path::PathBuf;

use clap::{Args, ValueEnum};
use dockgraph_analysis::{CentralityOptions, CentralityReport, CentralityResult, SortKey};
use dockgraph_core::config::DockgraphConfig;
use dockgraph_core::{Season, timing};
use serde::Serialize;
use tracing::info;

use super::{SeasonFilter, season_label};
use crate::output::{OutputMode, fmt_score, pretty_rule, pretty_section, render_mode};

/// Ordering for the centrality table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum SortBy {
    /// Ascending station id.
    #[default]
    Id,
    /// Most degree-central first.
    Degree,
    /// Most betweenness-central first.
    Betweenness,
}

impl From<SortBy> for SortKey {
    fn from(value: SortBy) -> Self {
        match value {
            SortBy::Id => Self::StationId,
            SortBy::Degree => Self::Degree,
            SortBy::Betweenness => Self::Betweenness,
        }
    }
}

impl SortBy {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Degree => "degree",
            Self::Betweenness => "betweenness",
        }
    }
}

/// Arguments for `dg centrality`.
#[derive(Args, Debug)]
pub struct CentralityArgs {
    /// Trip export (CSV).
    pub input: PathBuf,

    /// Row ordering.
    #[arg(long, value_enum, default_value_t = SortBy::Id)]
    pub sort: SortBy,

    /// Maximum rows to print. Ranked sorts default to `analysis.top_n`;
    /// sorting by id prints every station.
    #[arg(long)]
    pub limit: Option<usize>,

    /// Compute betweenness on all cores.
    #[arg(long)]
    pub parallel: bool,

    #[command(flatten)]
    pub filter: SeasonFilter,
}

#[derive(Debug, Serialize)]
struct CentralityPayload<'a> {
    source: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    seasons: Vec<Season>,
    sort: &'static str,
    node_count: usize,
    edge_count: usize,
    total_trips: u64,
    skipped_records: usize,
    unreadable_rows: usize,
    content_hash: &'a str,
    rows: Vec<&'a CentralityResult>,
}

/// Execute `dg centrality`.
pub fn run_centrality(
    args: &CentralityArgs,
    output: OutputMode,
    config: &DockgraphConfig,
) -> anyhow::Result<()> {
    let loaded = super::load_input(&args.input, &args.filter, output)?;
    let graph = super::build_graph(&loaded, &args.input, output)?;

    let options = CentralityOptions {
        parallel: args.parallel || config.analysis.parallel,
    };
    let report = timing::timed("metrics.centrality", || {
        CentralityReport::compute(&graph, Some(&loaded.stations), options)
    });

    let limit = match (args.limit, args.sort) {
        (Some(limit), _) => Some(limit),
        (None, SortBy::Id) => None,
        (None, _) => Some(config.analysis.top_n),
    };
    let rows = report.ranked(args.sort.into(), limit);
    info!(rows = rows.len(), sort = args.sort.as_str(), "rendering centrality table");

    let payload = CentralityPayload {
        source: args.input.display().to_string(),
        seasons: args.filter.selected(),
        sort: args.sort.as_str(),
        node_count: report.node_count,
        edge_count: report.edge_count,
        total_trips: report.total_trips,
        skipped_records: report.skipped_records,
        unreadable_rows: loaded.unreadable_rows,
        content_hash: &report.content_hash,
        rows,
    };

    render_mode(output, &payload, render_text, render_pretty)
}

fn render_text(payload: &CentralityPayload<'_>, w: &mut dyn Write) -> io::Result<()> {
    writeln!(w, "station_id  degree  betweenness  in  out  trips_out  trips_in")?;
    for row in &payload.rows {
        writeln!(
            w,
            "{}  {}  {}  {}  {}  {}  {}",
            row.station_id,
            fmt_score(row.degree_centrality),
            fmt_score(row.betweenness_centrality),
            row.in_neighbors,
            row.out_neighbors,
            row.trips_out,
            row.trips_in,
        )?;
    }
    Ok(())
}

fn render_pretty(payload: &CentralityPayload<'_>, w: &mut dyn Write) -> io::Result<()> {
    pretty_section(
        w,
        &format!(
            "Station centrality: {} stations, {} routes, {} trips (sorted by {})",
            payload.node_count, payload.edge_count, payload.total_trips, payload.sort
        ),
    )?;
    if !payload.seasons.is_empty() {
        writeln!(w, "seasons: {}", season_label(&payload.seasons))?;
    }
    writeln!(
        w,
        "{:<12} {:>9} {:>12} {:>4} {:>4}  NAME",
        "STATION", "DEGREE", "BETWEENNESS", "IN", "OUT"
    )?;
    for row in &payload.rows {
        writeln!(
            w,
            "{:<12} {:>9} {:>12} {:>4} {:>4}  {}",
            row.station_id,
            format!("{:.4}", row.degree_centrality),
            format!("{:.4}", row.betweenness_centrality),
            row.in_neighbors,
            row.out_neighbors,
            row.name.as_deref().unwrap_or("-"),
        )?;
    }
    pretty_rule(w)?;
    if payload.skipped_records > 0 || payload.unreadable_rows > 0 {
        writeln!(
            w,
            "skipped {} records without a station id, {} unreadable rows",
            payload.skipped_records, payload.unreadable_rows
        )?;
    }
    Ok(())
}
