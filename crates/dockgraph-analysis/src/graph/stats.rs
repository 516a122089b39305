//! Summary statistics for a station graph.
//!
//! # Statistics Provided
//!
//! - **node_count**: Stations appearing in at least one well-formed trip.
//! - **edge_count**: Distinct ordered station pairs, round trips included.
//! - **total_trips**: Sum of edge weights.
//! - **round_trip_edges** / **round_trips**: Stations with a self-loop, and
//!   the trips on those loops.
//! - **density**: Non-loop edges over the `n (n - 1)` possible directed
//!   pairs. Zero for graphs with 0 or 1 station.
//! - **weakly_connected_component_count**: Disjoint station clusters with no
//!   trips between them.
//! - **isolated_station_count**: Stations whose only trips are round trips.
//! - **max_in_neighbors** / **max_out_neighbors**: Largest number of distinct
//!   origin / destination stations seen at one station.
//! - **heaviest_route**: The edge with the most trips (ties go to the lowest
//!   `(start, end)` pair).

use petgraph::algo::connected_components;
use petgraph::visit::{EdgeRef, IntoNodeIdentifiers};
use serde::Serialize;

use crate::graph::build::StationGraph;
use crate::metrics::degree::neighbor_counts;
use crate::summary::RouteCount;

/// Summary statistics for a [`StationGraph`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphStats {
    pub node_count: usize,
    pub edge_count: usize,
    pub total_trips: u64,
    pub round_trip_edges: usize,
    pub round_trips: u64,
    pub density: f64,
    pub weakly_connected_component_count: usize,
    pub isolated_station_count: usize,
    pub max_in_neighbors: usize,
    pub max_out_neighbors: usize,
    pub heaviest_route: Option<RouteCount>,
    pub skipped_records: usize,
    pub content_hash: String,
}

impl GraphStats {
    /// Compute statistics from a [`StationGraph`].
    #[must_use]
    pub fn from_graph(sg: &StationGraph) -> Self {
        let g = &sg.graph;
        let node_count = g.node_count();

        let mut round_trip_edges = 0usize;
        let mut round_trips = 0u64;
        for e in g.edge_references() {
            if e.source() == e.target() {
                round_trip_edges += 1;
                round_trips += *e.weight();
            }
        }

        let connecting_edges = g.edge_count() - round_trip_edges;

        let mut isolated_station_count = 0usize;
        let mut max_in_neighbors = 0usize;
        let mut max_out_neighbors = 0usize;
        for idx in g.node_identifiers() {
            let counts = neighbor_counts(g, idx);
            if counts.distinct == 0 {
                isolated_station_count += 1;
            }
            max_in_neighbors = max_in_neighbors.max(counts.incoming);
            max_out_neighbors = max_out_neighbors.max(counts.outgoing);
        }

        // Edges are stored in ascending (start, end) order, so keeping the
        // first strict maximum gives the lowest pair on ties.
        let heaviest_route = sg
            .edges()
            .fold(None::<(&str, &str, u64)>, |best, edge| match best {
                Some(b) if b.2 >= edge.2 => Some(b),
                _ => Some(edge),
            })
            .map(|(start, end, trips)| RouteCount {
                start_station_id: start.to_string(),
                end_station_id: end.to_string(),
                trips,
            });

        Self {
            node_count,
            edge_count: g.edge_count(),
            total_trips: sg.total_trips(),
            round_trip_edges,
            round_trips,
            density: compute_density(node_count, connecting_edges),
            weakly_connected_component_count: connected_components(g),
            isolated_station_count,
            max_in_neighbors,
            max_out_neighbors,
            heaviest_route,
            skipped_records: sg.skipped_records,
            content_hash: sg.content_hash.clone(),
        }
    }
}

/// `edges / (n (n - 1))`, or 0.0 below two nodes.
#[allow(clippy::cast_precision_loss)]
fn compute_density(node_count: usize, edge_count: usize) -> f64 {
    if node_count < 2 {
        return 0.0;
    }
    edge_count as f64 / (node_count * (node_count - 1)) as f64
}
