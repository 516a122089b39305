//! Per-station centrality table.
//!
//! [`CentralityReport`] joins degree and betweenness centrality into one row
//! per station, sorted by station id. It is the hand-off point to whatever
//! renders the results: the CLI, a dashboard reading JSON, or a test.

use std::cmp::Ordering;

use dockgraph_core::{AnalysisError, StationDirectory, TripRecord};
use petgraph::Direction;
use serde::Serialize;
use tracing::{info, instrument};

use crate::graph::build::StationGraph;
use crate::metrics::betweenness::{
    compute_betweenness_centrality, compute_betweenness_centrality_parallel,
};
use crate::metrics::degree::degree_centrality;

/// Knobs for [`CentralityReport::compute`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CentralityOptions {
    /// Compute betweenness on the rayon pool. Results are identical.
    pub parallel: bool,
}

/// Centrality figures for one station.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CentralityResult {
    pub station_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub degree_centrality: f64,
    pub betweenness_centrality: f64,
    /// Distinct stations with trips into this one.
    pub in_neighbors: usize,
    /// Distinct stations receiving trips from this one.
    pub out_neighbors: usize,
    /// Trips ending here, round trips included.
    pub trips_in: u64,
    /// Trips starting here, round trips included.
    pub trips_out: u64,
    pub round_trips: u64,
}

/// Ranking key for [`CentralityReport::ranked`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    /// Ascending station id (the report's natural order).
    #[default]
    StationId,
    /// Descending degree centrality, ties by id.
    Degree,
    /// Descending betweenness centrality, ties by id.
    Betweenness,
}

/// Per-station metric table for one graph snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CentralityReport {
    /// One row per station, ascending by station id.
    pub rows: Vec<CentralityResult>,
    pub node_count: usize,
    pub edge_count: usize,
    pub total_trips: u64,
    pub skipped_records: usize,
    pub content_hash: String,
}

impl CentralityReport {
    /// Compute both metrics for `sg`. `stations` only supplies names.
    #[must_use]
    #[instrument(skip_all, fields(nodes = sg.node_count(), parallel = options.parallel))]
    pub fn compute(
        sg: &StationGraph,
        stations: Option<&StationDirectory>,
        options: CentralityOptions,
    ) -> Self {
        let degree = degree_centrality(sg);
        let betweenness = if options.parallel {
            compute_betweenness_centrality_parallel(sg)
        } else {
            compute_betweenness_centrality(sg)
        };

        let g = &sg.graph;
        let rows = sg
            .node_map
            .iter()
            .map(|(id, &idx)| {
                let trips_out: u64 = g
                    .edges_directed(idx, Direction::Outgoing)
                    .map(|e| *e.weight())
                    .sum();
                let trips_in: u64 = g
                    .edges_directed(idx, Direction::Incoming)
                    .map(|e| *e.weight())
                    .sum();
                let round_trips = g.find_edge(idx, idx).map_or(0, |e| g[e]);
                let counts = degree.neighbors.get(id).copied().unwrap_or_default();

                CentralityResult {
                    station_id: id.clone(),
                    name: stations.and_then(|d| d.name_of(id)).map(str::to_string),
                    degree_centrality: degree.centrality.get(id).copied().unwrap_or(0.0),
                    betweenness_centrality: betweenness.get(id).copied().unwrap_or(0.0),
                    in_neighbors: counts.incoming,
                    out_neighbors: counts.outgoing,
                    trips_in,
                    trips_out,
                    round_trips,
                }
            })
            .collect();

        info!(stations = sg.node_count(), "centrality report ready");

        Self {
            rows,
            node_count: sg.node_count(),
            edge_count: sg.edge_count(),
            total_trips: sg.total_trips(),
            skipped_records: sg.skipped_records,
            content_hash: sg.content_hash.clone(),
        }
    }

    /// Row for `station_id`.
    #[must_use]
    pub fn get(&self, station_id: &str) -> Option<&CentralityResult> {
        self.rows
            .binary_search_by(|row| row.station_id.as_str().cmp(station_id))
            .ok()
            .map(|i| &self.rows[i])
    }

    /// Rows ordered by `key`, truncated to `limit` when given.
    #[must_use]
    pub fn ranked(&self, key: SortKey, limit: Option<usize>) -> Vec<&CentralityResult> {
        let mut rows: Vec<&CentralityResult> = self.rows.iter().collect();
        match key {
            SortKey::StationId => {}
            SortKey::Degree => {
                rows.sort_by(|a, b| by_desc(a.degree_centrality, b.degree_centrality));
            }
            SortKey::Betweenness => {
                rows.sort_by(|a, b| by_desc(a.betweenness_centrality, b.betweenness_centrality));
            }
        }
        if let Some(limit) = limit {
            rows.truncate(limit);
        }
        rows
    }

    /// The `n` most degree-central stations.
    #[must_use]
    pub fn top_by_degree(&self, n: usize) -> Vec<&CentralityResult> {
        self.ranked(SortKey::Degree, Some(n))
    }

    /// The `n` most betweenness-central stations.
    #[must_use]
    pub fn top_by_betweenness(&self, n: usize) -> Vec<&CentralityResult> {
        self.ranked(SortKey::Betweenness, Some(n))
    }
}

/// Build the graph and compute the report in one step.
///
/// # Errors
///
/// See [`StationGraph::from_trips`].
pub fn analyze_trips(
    trips: &[TripRecord],
    stations: Option<&StationDirectory>,
    options: CentralityOptions,
) -> Result<CentralityReport, AnalysisError> {
    let sg = StationGraph::from_trips(trips)?;
    Ok(CentralityReport::compute(&sg, stations, options))
}

// Rows start in id order and the sort is stable, so equal scores keep it.
fn by_desc(a: f64, b: f64) -> Ordering {
    b.total_cmp(&a)
}
