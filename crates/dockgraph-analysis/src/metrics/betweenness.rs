//! Weighted betweenness centrality via Brandes' algorithm.
//!
//! # Overview
//!
//! Betweenness centrality measures how often a station lies on the cheapest
//! route between two other stations. Stations with high betweenness are
//! transfer points of the network: many origin/destination pairs are best
//! connected through them.
//!
//! # Edge Cost
//!
//! An edge carrying `w` trips costs `1 / w`. Busy routes are therefore
//! "short" and quiet routes "long", so the cheapest path between two
//! stations follows the corridors riders actually use.
//!
//! # Algorithm
//!
//! Brandes (2001), weighted variant:
//!
//! 1. For each source `s`, run Dijkstra, counting shortest paths (`sigma`)
//!    and recording predecessors on every shortest path.
//! 2. Walk the settled nodes farthest first, accumulating each node's
//!    dependency `delta`. When several shortest paths tie, the dependency is
//!    split in proportion to their path counts.
//! 3. Sum the dependencies over all sources.
//!
//! Path costs are sums of reciprocals, so two equal routes can differ in
//! the last bits. Costs within a relative [`TIE_EPSILON`] are treated as a
//! tie.
//!
//! Complexity: O(V · E · log V).
//!
//! # Output
//!
//! Scores are normalised by `(m - 1)(m - 2)`, where `m` counts the routed
//! stations: those with at least one trip to or from a different station.
//! That is the number of ordered pairs that exclude the station itself and
//! can be joined at all, so the score is the fraction of shortest paths
//! through each station. Stations seen only in round trips are never
//! traversed, carry no pairs and do not dilute the scores; adding a round
//! trip anywhere, even at a new station, leaves every score unchanged.
//! With fewer than three routed stations every score is 0.0.
//!
//! # Determinism
//!
//! Per-source dependency vectors are always added to the total in ascending
//! source order. [`compute_betweenness_centrality_parallel`] computes those
//! vectors on the rayon pool but sums them in the same order, so both entry
//! points return bit-identical scores for any thread count.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BinaryHeap};

use petgraph::visit::EdgeRef;
use rayon::prelude::*;
use tracing::{debug, instrument};

use crate::graph::build::StationGraph;

/// Relative tolerance under which two path costs count as equal.
pub const TIE_EPSILON: f64 = 1e-12;

/// Sources handed to the rayon pool per round in the parallel variant.
const PARALLEL_BATCH: usize = 128;

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Normalised betweenness centrality for every station.
///
/// Stations with no shortest paths through them, including isolated
/// stations, score 0.0.
#[must_use]
#[instrument(skip(sg), fields(nodes = sg.node_count(), edges = sg.edge_count()))]
pub fn compute_betweenness_centrality(sg: &StationGraph) -> BTreeMap<String, f64> {
    let adj = CostAdjacency::from_graph(sg);
    finish(sg, sequential_totals(&adj), adj.routed)
}

/// Same scores as [`compute_betweenness_centrality`], computed on the rayon
/// thread pool.
#[must_use]
#[instrument(skip(sg), fields(nodes = sg.node_count(), edges = sg.edge_count()))]
pub fn compute_betweenness_centrality_parallel(sg: &StationGraph) -> BTreeMap<String, f64> {
    let adj = CostAdjacency::from_graph(sg);
    let n = adj.len();
    let mut totals = vec![0.0; n];

    let mut start = 0;
    while start < n {
        let end = (start + PARALLEL_BATCH).min(n);
        let batch: Vec<Vec<f64>> = (start..end)
            .into_par_iter()
            .map_init(
                || Workspace::new(n),
                |ws, s| ws.single_source(&adj, s).to_vec(),
            )
            .collect();
        for delta in &batch {
            add_into(&mut totals, delta);
        }
        start = end;
    }

    finish(sg, totals, adj.routed)
}

/// Raw (unnormalised) betweenness: the number of shortest paths through
/// each station, with tied paths counted fractionally.
#[must_use]
pub fn raw_betweenness(sg: &StationGraph) -> BTreeMap<String, f64> {
    let adj = CostAdjacency::from_graph(sg);
    label(sg, &sequential_totals(&adj))
}

// ---------------------------------------------------------------------------
// Internals
// ---------------------------------------------------------------------------

/// Outgoing `(target, cost)` lists indexed by node, self-loops removed and
/// targets sorted.
struct CostAdjacency {
    out: Vec<Vec<(usize, f64)>>,
    /// Nodes with at least one traversable edge in either direction.
    routed: usize,
}

impl CostAdjacency {
    fn from_graph(sg: &StationGraph) -> Self {
        let g = &sg.graph;
        let mut out: Vec<Vec<(usize, f64)>> = vec![Vec::new(); g.node_count()];
        let mut touched = vec![false; g.node_count()];
        for e in g.edge_references() {
            let (v, w) = (e.source().index(), e.target().index());
            if v == w || *e.weight() == 0 {
                continue;
            }
            #[allow(clippy::cast_precision_loss)]
            let cost = 1.0 / *e.weight() as f64;
            out[v].push((w, cost));
            touched[v] = true;
            touched[w] = true;
        }
        for targets in &mut out {
            targets.sort_unstable_by_key(|&(w, _)| w);
        }
        let routed = touched.iter().filter(|&&t| t).count();
        Self { out, routed }
    }

    fn len(&self) -> usize {
        self.out.len()
    }
}

/// Min-heap entry ordered by cost, then node index.
#[derive(Clone, Copy)]
struct State {
    cost: f64,
    node: usize,
}

impl PartialEq for State {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for State {}

impl Ord for State {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed for a min-heap on top of `BinaryHeap`.
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for State {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Per-source scratch buffers, reused across sources.
struct Workspace {
    dist: Vec<f64>,
    sigma: Vec<f64>,
    delta: Vec<f64>,
    settled: Vec<bool>,
    predecessors: Vec<Vec<usize>>,
    order: Vec<usize>,
    heap: BinaryHeap<State>,
}

impl Workspace {
    fn new(n: usize) -> Self {
        Self {
            dist: vec![f64::INFINITY; n],
            sigma: vec![0.0; n],
            delta: vec![0.0; n],
            settled: vec![false; n],
            predecessors: vec![Vec::new(); n],
            order: Vec::with_capacity(n),
            heap: BinaryHeap::new(),
        }
    }

    fn reset(&mut self) {
        self.dist.fill(f64::INFINITY);
        self.sigma.fill(0.0);
        self.delta.fill(0.0);
        self.settled.fill(false);
        for preds in &mut self.predecessors {
            preds.clear();
        }
        self.order.clear();
        self.heap.clear();
    }

    /// Dependency of source `s` on every node; `delta[s]` is zero.
    fn single_source(&mut self, adj: &CostAdjacency, s: usize) -> &[f64] {
        self.reset();
        self.dist[s] = 0.0;
        self.sigma[s] = 1.0;
        self.heap.push(State { cost: 0.0, node: s });

        // Dijkstra, settling nodes in nondecreasing cost order.
        while let Some(State { node: v, .. }) = self.heap.pop() {
            if self.settled[v] {
                continue;
            }
            self.settled[v] = true;
            self.order.push(v);

            for &(w, cost) in &adj.out[v] {
                if self.settled[w] {
                    continue;
                }
                let candidate = self.dist[v] + cost;
                let current = self.dist[w];

                if current.is_infinite() || candidate < current - tolerance(candidate, current) {
                    self.dist[w] = candidate;
                    self.sigma[w] = self.sigma[v];
                    self.predecessors[w].clear();
                    self.predecessors[w].push(v);
                    self.heap.push(State {
                        cost: candidate,
                        node: w,
                    });
                } else if (candidate - current).abs() <= tolerance(candidate, current) {
                    self.sigma[w] += self.sigma[v];
                    self.predecessors[w].push(v);
                }
            }
        }

        // Accumulate dependencies, farthest nodes first.
        while let Some(w) = self.order.pop() {
            let coeff = (1.0 + self.delta[w]) / self.sigma[w];
            for &v in &self.predecessors[w] {
                self.delta[v] += self.sigma[v] * coeff;
            }
        }
        self.delta[s] = 0.0;

        &self.delta
    }
}

/// Sum of single-source dependencies, added in ascending source order.
fn sequential_totals(adj: &CostAdjacency) -> Vec<f64> {
    let mut totals = vec![0.0; adj.len()];
    let mut ws = Workspace::new(adj.len());
    for s in 0..adj.len() {
        add_into(&mut totals, ws.single_source(adj, s));
    }
    totals
}

fn tolerance(a: f64, b: f64) -> f64 {
    TIE_EPSILON * a.abs().max(b.abs())
}

fn add_into(totals: &mut [f64], delta: &[f64]) {
    for (t, d) in totals.iter_mut().zip(delta) {
        *t += d;
    }
}

fn finish(sg: &StationGraph, mut totals: Vec<f64>, routed: usize) -> BTreeMap<String, f64> {
    if routed < 3 {
        totals.fill(0.0);
    } else {
        #[allow(clippy::cast_precision_loss)]
        let scale = 1.0 / ((routed - 1) * (routed - 2)) as f64;
        for t in &mut totals {
            *t *= scale;
        }
    }
    debug!(nodes = totals.len(), routed, "betweenness computed");
    label(sg, &totals)
}

fn label(sg: &StationGraph, totals: &[f64]) -> BTreeMap<String, f64> {
    sg.graph
        .node_indices()
        .map(|idx| (sg.graph[idx].clone(), totals[idx.index()]))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
