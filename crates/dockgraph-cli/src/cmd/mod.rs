pub mod centrality;
pub mod completions;
pub mod graph;
pub mod summary;
pub mod top;

use std::path::Path;

use anyhow::Context as _;
use clap::{Args, ValueEnum};
use dockgraph_analysis::StationGraph;
use dockgraph_analysis::summary::retain_seasons;
use dockgraph_core::Season;
use dockgraph_core::load::{LoadedTrips, load_trips_csv};
use dockgraph_core::timing;
use tracing::info;

use crate::output::{CliError, OutputMode, render_error};

/// Season accepted by `--season`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SeasonArg {
    /// December to February.
    Winter,
    /// March to May.
    Spring,
    /// June to August.
    Summer,
    /// September to November.
    #[value(alias = "autumn")]
    Fall,
}

impl From<SeasonArg> for Season {
    fn from(value: SeasonArg) -> Self {
        match value {
            SeasonArg::Winter => Self::Winter,
            SeasonArg::Spring => Self::Spring,
            SeasonArg::Summer => Self::Summer,
            SeasonArg::Fall => Self::Fall,
        }
    }
}

/// `--season` filter shared by the data commands.
#[derive(Args, Debug, Default, Clone)]
pub struct SeasonFilter {
    /// Only use trips started in this season. Repeat to combine seasons;
    /// omit for the whole export.
    #[arg(long = "season", value_enum, value_name = "SEASON")]
    pub seasons: Vec<SeasonArg>,
}

impl SeasonFilter {
    /// Selected seasons in calendar order, without repeats.
    pub fn selected(&self) -> Vec<Season> {
        let mut seasons: Vec<Season> = self.seasons.iter().copied().map(Season::from).collect();
        seasons.sort_unstable();
        seasons.dedup();
        seasons
    }
}

/// Load a trip export and apply the season filter, rendering any failure in
/// the active output mode.
pub fn load_input(
    path: &Path,
    filter: &SeasonFilter,
    output: OutputMode,
) -> anyhow::Result<LoadedTrips> {
    let loaded = timing::timed("load.csv", || load_trips_csv(path));
    if let Err(ref err) = loaded {
        render_error(output, &CliError::from(err))?;
    }
    let mut loaded =
        loaded.with_context(|| format!("failed to load trips from {}", path.display()))?;

    let seasons = filter.selected();
    if !seasons.is_empty() {
        let dropped = retain_seasons(&mut loaded.trips, &seasons);
        info!(kept = loaded.trips.len(), dropped, "applied season filter");
    }
    Ok(loaded)
}

/// Build the station graph, rendering any failure in the active output mode.
pub fn build_graph(
    loaded: &LoadedTrips,
    path: &Path,
    output: OutputMode,
) -> anyhow::Result<StationGraph> {
    let graph = timing::timed("graph.build", || StationGraph::from_trips(&loaded.trips));
    if let Err(ref err) = graph {
        render_error(output, &CliError::from(err))?;
    }
    graph.with_context(|| format!("failed to build station graph from {}", path.display()))
}

/// Comma-separated season labels for human output.
pub fn season_label(seasons: &[Season]) -> String {
    seasons.iter().copied().map(Season::as_str).collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selected_seasons_are_ordered_and_deduplicated() {
        let filter = SeasonFilter {
            seasons: vec![SeasonArg::Fall, SeasonArg::Winter, SeasonArg::Fall],
        };
        assert_eq!(filter.selected(), vec![Season::Winter, Season::Fall]);
        assert!(SeasonFilter::default().selected().is_empty());
    }

    #[test]
    fn season_label_joins_names() {
        assert_eq!(season_label(&[Season::Spring, Season::Summer]), "spring, summer");
        assert_eq!(season_label(&[]), "");
    }
}
