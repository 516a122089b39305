//! Station graph module.
//!
//! # Overview
//!
//! [`build::StationGraph`] is a petgraph directed graph whose nodes are
//! station ids and whose edge weights are trip counts for the ordered
//! station pair. It is the input to every metric in [`crate::metrics`].
//!
//! ## Pipeline
//!
//! ```text
//! trip records
//!        ↓  build::StationGraph::from_trips()
//! StationGraph (one edge per distinct (start, end) pair, round trips kept)
//!        ↓  stats::GraphStats::from_graph()
//! GraphStats (density, components, round trips, heaviest route, …)
//! ```
//!
//! ## Change Detection
//!
//! [`StationGraph::content_hash`] is a BLAKE3 hash of the weighted edge set.
//! It does not depend on the order the trips were supplied in.

pub mod build;
pub mod stats;

pub use build::StationGraph;
pub use stats::GraphStats;
