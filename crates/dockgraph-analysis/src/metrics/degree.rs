//! Degree centrality.
//!
//! A station's degree centrality is the number of *distinct other stations*
//! it is linked to in either direction, divided by the `n - 1` stations it
//! could be linked to. A station with trips both to and from B counts B once,
//! so scores stay in `[0, 1]` and reach 1.0 exactly when a station exchanges
//! riders with every other station. Round trips are ignored.
//!
//! The raw in/out neighbour counts are kept alongside the normalised score.

use std::collections::BTreeMap;

use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::IntoNodeIdentifiers;
use tracing::instrument;

use crate::graph::build::StationGraph;

/// Neighbour counts of one node, self excluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NeighborCounts {
    /// Distinct stations with trips into this one.
    pub incoming: usize,
    /// Distinct stations receiving trips from this one.
    pub outgoing: usize,
    /// Size of the union of both sets.
    pub distinct: usize,
}

/// Per-station degree figures.
#[derive(Debug, Clone, PartialEq)]
pub struct DegreeCentrality {
    pub neighbors: BTreeMap<String, NeighborCounts>,
    /// `distinct / (n - 1)`, 0.0 when the graph has a single station.
    pub centrality: BTreeMap<String, f64>,
}

pub(crate) fn neighbor_counts(g: &DiGraph<String, u64>, idx: NodeIndex) -> NeighborCounts {
    let mut incoming: Vec<NodeIndex> = g
        .neighbors_directed(idx, Direction::Incoming)
        .filter(|&n| n != idx)
        .collect();
    let mut outgoing: Vec<NodeIndex> = g
        .neighbors_directed(idx, Direction::Outgoing)
        .filter(|&n| n != idx)
        .collect();
    incoming.sort_unstable();
    incoming.dedup();
    outgoing.sort_unstable();
    outgoing.dedup();

    let shared = incoming
        .iter()
        .filter(|&n| outgoing.binary_search(n).is_ok())
        .count();

    NeighborCounts {
        incoming: incoming.len(),
        outgoing: outgoing.len(),
        distinct: incoming.len() + outgoing.len() - shared,
    }
}

/// Compute neighbour counts and normalised degree centrality for every station.
#[must_use]
#[instrument(skip(sg), fields(nodes = sg.node_count()))]
pub fn degree_centrality(sg: &StationGraph) -> DegreeCentrality {
    let g = &sg.graph;
    let n = g.node_count();

    let mut neighbors = BTreeMap::new();
    let mut centrality = BTreeMap::new();

    for idx in g.node_identifiers() {
        let counts = neighbor_counts(g, idx);
        #[allow(clippy::cast_precision_loss)]
        let score = if n > 1 {
            counts.distinct as f64 / (n - 1) as f64
        } else {
            0.0
        };
        let id = g[idx].clone();
        centrality.insert(id.clone(), score);
        neighbors.insert(id, counts);
    }

    DegreeCentrality {
        neighbors,
        centrality,
    }
}

/// Normalised degree centrality per station id.
#[must_use]
pub fn compute_degree_centrality(sg: &StationGraph) -> BTreeMap<String, f64> {
    degree_centrality(sg).centrality
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::trips;

    fn build(edges: &[(&str, &str, usize)]) -> StationGraph {
        StationGraph::from_trips(&trips(edges)).expect("build")
    }

    #[test]
    fn chain_middle_station_is_fully_central() {
        // A → B → C
        let dc = compute_degree_centrality(&build(&[("A", "B", 3), ("B", "C", 2)]));
        assert!((dc["A"] - 0.5).abs() < 1e-12);
        assert!((dc["B"] - 1.0).abs() < 1e-12);
        assert!((dc["C"] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn triangle_every_station_is_fully_central() {
        // A → B, B → C, A → C
        let dc = compute_degree_centrality(&build(&[("A", "B", 3), ("B", "C", 2), ("A", "C", 1)]));
        for id in ["A", "B", "C"] {
            assert!((dc[id] - 1.0).abs() < 1e-12, "{id} got {}", dc[id]);
        }
    }

    #[test]
    fn reciprocal_edges_count_once() {
        // A ↔ B, C only reached from A.
        let d = degree_centrality(&build(&[("A", "B", 1), ("B", "A", 1), ("A", "C", 1)]));
        let a = d.neighbors["A"];
        assert_eq!(a.incoming, 1);
        assert_eq!(a.outgoing, 2);
        assert_eq!(a.distinct, 2);
        assert!((d.centrality["A"] - 1.0).abs() < 1e-12);
        assert!((d.centrality["B"] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn round_trip_only_station_scores_zero() {
        let dc = compute_degree_centrality(&build(&[("A", "A", 3)]));
        assert_eq!(dc.len(), 1);
        assert!(dc["A"].abs() < f64::EPSILON);
    }

    #[test]
    fn self_loop_does_not_change_scores() {
        let base = compute_degree_centrality(&build(&[("A", "B", 1), ("B", "C", 1)]));
        let looped =
            compute_degree_centrality(&build(&[("A", "B", 1), ("B", "C", 1), ("B", "B", 7)]));
        assert_eq!(base, looped);
    }

    #[test]
    fn weights_do_not_affect_degree() {
        let light = compute_degree_centrality(&build(&[("A", "B", 1), ("C", "B", 1)]));
        let heavy = compute_degree_centrality(&build(&[("A", "B", 50), ("C", "B", 1)]));
        assert_eq!(light, heavy);
    }
}
