#![forbid(unsafe_code)]
//! dockgraph-core library.
//!
//! # Conventions
//!
//! - **Errors**: Library failures are `thiserror` enums in [`error`] that carry
//!   a stable [`error::ErrorCode`]; application code wraps them in
//!   `anyhow::Result`.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).

pub mod config;
pub mod error;
pub mod load;
pub mod model;
pub mod timing;

pub use error::{AnalysisError, ErrorCode, LoadError};
pub use model::{Season, Station, StationDirectory, TripRecord, UserType};
