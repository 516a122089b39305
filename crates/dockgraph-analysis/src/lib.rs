#![forbid(unsafe_code)]
//! dockgraph-analysis library.
//!
//! Builds a weighted station graph from trip records and derives per-station
//! centrality, graph statistics and descriptive trip summaries.
//!
//! ```text
//! &[TripRecord]
//!        ↓  graph::StationGraph::from_trips()
//! StationGraph (DiGraph<String, u64>, edge weight = trip count)
//!        ├─ graph::GraphStats::from_graph()
//!        ├─ metrics::degree::compute_degree_centrality()
//!        └─ metrics::betweenness::compute_betweenness_centrality()
//!               ↓
//!        report::CentralityReport (rows sorted by station id)
//! ```
//!
//! # Conventions
//!
//! - **Errors**: Fallible entry points return
//!   [`dockgraph_core::AnalysisError`]; metrics over an existing graph are
//!   infallible.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).
//! - **Ordering**: Every map returned to callers is a `BTreeMap` keyed by
//!   station id so output is reproducible run to run.

pub mod graph;
pub mod metrics;
pub mod report;
pub mod summary;

pub use graph::{GraphStats, StationGraph};
pub use report::{CentralityOptions, CentralityReport, CentralityResult, SortKey, analyze_trips};

#[cfg(test)]
pub(crate) mod testing {
    use chrono::NaiveDate;
    use dockgraph_core::{TripRecord, UserType};

    /// One member trip on 2022-06-01 at 08:00.
    pub fn trip(start: &str, end: &str) -> TripRecord {
        let ts = NaiveDate::from_ymd_opt(2022, 6, 1)
            .and_then(|d| d.and_hms_opt(8, 0, 0))
            .expect("valid timestamp");
        TripRecord::new(start, end, ts, UserType::Member)
    }

    /// Expand `(start, end, count)` triples into individual trips.
    pub fn trips(edges: &[(&str, &str, usize)]) -> Vec<TripRecord> {
        edges
            .iter()
            .flat_map(|&(start, end, count)| {
                std::iter::repeat_with(move || trip(start, end)).take(count)
            })
            .collect()
    }
}
