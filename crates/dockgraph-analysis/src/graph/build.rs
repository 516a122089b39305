//! Graph construction from trip records.
//!
//! # Overview
//!
//! Trips are grouped by ordered `(start, end)` station pair. Each distinct
//! pair becomes one directed edge whose weight is the number of trips on it,
//! so edge weights always sum to the number of well-formed records.
//!
//! ## Round Trips
//!
//! A trip that ends where it started is kept as a self-loop on that station.
//! Self-loops count towards trip totals and the edge count but never towards
//! connectivity: degree and betweenness ignore them.
//!
//! ## Malformed Records
//!
//! Records missing either station id are skipped and counted in
//! [`StationGraph::skipped_records`]. Only when *every* record is malformed
//! does construction fail.
//!
//! ## Determinism
//!
//! Nodes are inserted in ascending station id order and edges in ascending
//! `(start, end)` order. Two trip slices holding the same multiset of trips
//! produce identical graphs, node indices and content hashes.

#![allow(clippy::module_name_repetitions)]

use std::collections::{BTreeMap, BTreeSet};

use dockgraph_core::{AnalysisError, TripRecord};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use tracing::{debug, instrument, warn};

// ---------------------------------------------------------------------------
// StationGraph
// ---------------------------------------------------------------------------

/// Directed station graph weighted by trip counts.
///
/// Nodes are station ids. An edge `A → B` with weight `w` means `w` trips
/// started at A and ended at B.
#[derive(Debug, Clone)]
pub struct StationGraph {
    /// Directed graph: nodes = station ids, edge weight = trip count (> 0).
    pub graph: DiGraph<String, u64>,
    /// Mapping from station id to petgraph `NodeIndex`.
    pub node_map: BTreeMap<String, NodeIndex>,
    /// Records dropped because a station id was missing.
    pub skipped_records: usize,
    /// BLAKE3 hash of the sorted weighted edge list.
    pub content_hash: String,
}

impl StationGraph {
    /// Build a [`StationGraph`] from trip records.
    ///
    /// # Errors
    ///
    /// [`AnalysisError::EmptyInput`] if `trips` is empty, and
    /// [`AnalysisError::NoValidRecords`] if no record names both stations.
    #[instrument(skip(trips), fields(records = trips.len()))]
    pub fn from_trips(trips: &[TripRecord]) -> Result<Self, AnalysisError> {
        if trips.is_empty() {
            return Err(AnalysisError::EmptyInput);
        }

        // Step 1: aggregate trips per ordered pair.
        let mut pair_counts: BTreeMap<(&str, &str), u64> = BTreeMap::new();
        let mut skipped_records = 0usize;

        for trip in trips {
            match trip.endpoints() {
                Some(pair) => *pair_counts.entry(pair).or_insert(0) += 1,
                None => skipped_records += 1,
            }
        }

        if pair_counts.is_empty() {
            return Err(AnalysisError::NoValidRecords {
                skipped: skipped_records,
            });
        }
        if skipped_records > 0 {
            warn!(skipped = skipped_records, "skipped trips with a missing station id");
        }

        // Step 2: nodes in sorted id order.
        let station_ids: BTreeSet<&str> = pair_counts
            .keys()
            .flat_map(|&(start, end)| [start, end])
            .collect();

        let mut graph = DiGraph::<String, u64>::with_capacity(station_ids.len(), pair_counts.len());
        let mut node_map = BTreeMap::new();
        for id in station_ids {
            let idx = graph.add_node(id.to_string());
            node_map.insert(id.to_string(), idx);
        }

        // Step 3: one weighted edge per pair, already sorted by (start, end).
        for (&(start, end), &count) in &pair_counts {
            graph.add_edge(node_map[start], node_map[end], count);
        }

        let content_hash = compute_edge_hash(&pair_counts);

        debug!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            skipped = skipped_records,
            "station graph built"
        );

        Ok(Self {
            graph,
            node_map,
            skipped_records,
            content_hash,
        })
    }

    /// Number of stations.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of distinct ordered station pairs, round trips included.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Sum of all edge weights (= well-formed trip count).
    #[must_use]
    pub fn total_trips(&self) -> u64 {
        self.graph.edge_weights().sum()
    }

    /// Look up the `NodeIndex` for a station id.
    #[must_use]
    pub fn node_index(&self, station_id: &str) -> Option<NodeIndex> {
        self.node_map.get(station_id).copied()
    }

    /// Return the station id label for a node.
    #[must_use]
    pub fn station_id(&self, idx: NodeIndex) -> Option<&str> {
        self.graph.node_weight(idx).map(String::as_str)
    }

    /// Trip count from `start` to `end`, if that edge exists.
    #[must_use]
    pub fn trip_count(&self, start: &str, end: &str) -> Option<u64> {
        let a = self.node_index(start)?;
        let b = self.node_index(end)?;
        self.graph.find_edge(a, b).map(|e| self.graph[e])
    }

    /// Station ids in ascending order.
    pub fn station_ids(&self) -> impl Iterator<Item = &str> {
        self.node_map.keys().map(String::as_str)
    }

    /// All edges as `(start, end, trips)`, in ascending `(start, end)` order.
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str, u64)> {
        self.graph.edge_references().map(|e| {
            (
                self.graph[e.source()].as_str(),
                self.graph[e.target()].as_str(),
                *e.weight(),
            )
        })
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Compute a BLAKE3 hash of the sorted weighted edge list.
fn compute_edge_hash(pairs: &BTreeMap<(&str, &str), u64>) -> String {
    let mut hasher = blake3::Hasher::new();
    for (&(start, end), count) in pairs {
        hasher.update(start.as_bytes());
        hasher.update(b"\x00");
        hasher.update(end.as_bytes());
        hasher.update(b"\x00");
        hasher.update(&count.to_le_bytes());
    }
    format!("blake3:{}", hasher.finalize())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
