//! `dg summary`: rider mix, seasonal and daily volume for a trip export.

use std::io::{self, Write};
use std::path::PathBuf;

use clap::Args;
use dockgraph_analysis::summary::TripSummary;
use dockgraph_core::{Season, timing};
use serde::Serialize;

use super::{SeasonFilter, season_label};
use crate::output::{OutputMode, pretty_kv, pretty_rule, pretty_section, render_mode};

/// Arguments for `dg summary`.
#[derive(Args, Debug)]
pub struct SummaryArgs {
    /// Trip export (CSV).
    pub input: PathBuf,

    #[command(flatten)]
    pub filter: SeasonFilter,
}

#[derive(Debug, Serialize)]
struct SummaryPayload {
    source: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    seasons: Vec<Season>,
    stations: usize,
    unreadable_rows: usize,
    #[serde(flatten)]
    summary: TripSummary,
}

/// Execute `dg summary`.
///
/// Unlike the graph commands this never fails on malformed records; an export
/// with no usable trips still has a rider mix and a date range.
pub fn run_summary(args: &SummaryArgs, output: OutputMode) -> anyhow::Result<()> {
    let loaded = super::load_input(&args.input, &args.filter, output)?;
    let summary = timing::timed("summary.trips", || TripSummary::from_trips(&loaded.trips));

    let payload = SummaryPayload {
        source: args.input.display().to_string(),
        seasons: args.filter.selected(),
        stations: loaded.stations.len(),
        unreadable_rows: loaded.unreadable_rows,
        summary,
    };
    render_mode(output, &payload, render_text, render_pretty)
}

fn render_text(payload: &SummaryPayload, w: &mut dyn Write) -> io::Result<()> {
    let s = &payload.summary;
    writeln!(w, "records {}", s.total_records)?;
    writeln!(w, "well_formed {}", s.well_formed_records)?;
    writeln!(w, "skipped {}", s.skipped_records)?;
    writeln!(w, "unreadable {}", payload.unreadable_rows)?;
    writeln!(w, "round_trips {}", s.round_trips)?;
    writeln!(w, "stations {}", payload.stations)?;
    writeln!(w, "avg_daily {:.2}", s.avg_daily_trips)?;
    for (user_type, count) in &s.by_user_type {
        writeln!(w, "user_type.{user_type} {count}")?;
    }
    for (season, count) in &s.by_season {
        writeln!(w, "season.{season} {count}")?;
    }
    for day in &s.daily {
        writeln!(w, "day.{} {}", day.date, day.trips)?;
    }
    Ok(())
}

fn render_pretty(payload: &SummaryPayload, w: &mut dyn Write) -> io::Result<()> {
    let s = &payload.summary;
    pretty_section(w, &format!("Trip summary: {}", payload.source))?;
    if !payload.seasons.is_empty() {
        pretty_kv(w, "Seasons", season_label(&payload.seasons))?;
    }
    pretty_kv(w, "Records", s.total_records.to_string())?;
    pretty_kv(
        w,
        "Usable",
        format!(
            "{} ({} missing station id, {} unreadable)",
            s.well_formed_records, s.skipped_records, payload.unreadable_rows
        ),
    )?;
    pretty_kv(w, "Round trips", s.round_trips.to_string())?;
    pretty_kv(w, "Stations", payload.stations.to_string())?;
    if let (Some(first), Some(last)) = (s.first_day, s.last_day) {
        pretty_kv(w, "Date range", format!("{first} .. {last}"))?;
    }
    pretty_kv(w, "Avg daily trips", format!("{:.0}", s.avg_daily_trips))?;
    if let Some(peak) = s.peak_day {
        pretty_kv(w, "Peak day", format!("{} ({} trips)", peak.date, peak.trips))?;
    }

    writeln!(w)?;
    pretty_section(w, "Riders")?;
    for (user_type, count) in &s.by_user_type {
        pretty_kv(w, user_type.as_str(), count.to_string())?;
    }

    writeln!(w)?;
    pretty_section(w, "Seasons")?;
    for (season, count) in &s.by_season {
        pretty_kv(w, season.as_str(), count.to_string())?;
    }

    if !s.daily.is_empty() {
        writeln!(w)?;
        pretty_section(w, "Daily volume")?;
        for day in &s.daily {
            writeln!(w, "{}  {:>7}", day.date, day.trips)?;
        }
        pretty_rule(w)?;
    }
    Ok(())
}
