//! Centrality metrics for the station graph.
//!
//! # Overview
//!
//! - **Degree centrality** (`degree`): How many distinct stations does a
//!   station exchange riders with?
//! - **Betweenness centrality** (`betweenness`): Which stations sit on the
//!   cheapest routes between other stations, where heavily travelled edges
//!   are cheap?
//!
//! # Usage
//!
//! Both metrics take a [`crate::graph::StationGraph`] and return scores keyed
//! by station id in a `BTreeMap`. Round trips (self-loops) never affect
//! either metric.
//!
//! ```rust,ignore
//! use dockgraph_analysis::graph::StationGraph;
//! use dockgraph_analysis::metrics::degree::compute_degree_centrality;
//! use dockgraph_analysis::metrics::betweenness::compute_betweenness_centrality;
//!
//! let g = StationGraph::from_trips(&trips)?;
//! let dc = compute_degree_centrality(&g);
//! let bc = compute_betweenness_centrality(&g);
//! ```

pub mod betweenness;
pub mod degree;
