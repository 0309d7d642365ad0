//! UWB Real-Time Locating System — tag positioning pipeline
//!
//! A mobile tag estimates its own 3D position by two-way ranging against a
//! set of fixed anchors with known coordinates: select anchors near the last
//! known position, range against them in round-robin order over several
//! rounds, average the distances and feed the means into a multilateration
//! solver. The anchor heuristic, the radio driver and the solver are trait
//! seams, so each can be swapped without touching the acquisition loop.

pub mod core;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod ranging;
pub mod registry;
pub mod selector;
pub mod solver;

// Re-export commonly used types
pub use crate::core::{Anchor, Measurement, Position, PositionEstimate, SELECTED_ANCHOR_COUNT};
pub use config::{ConfigError, RtlsConfig, TagConfig};
pub use error::PositioningError;
pub use pipeline::PositioningPipeline;
pub use ranging::{MockRangingDriver, RangingDriver, RangingError};
pub use registry::AnchorRegistry;
pub use selector::{AnchorSelector, NearestAnchorSelector, Selection};
pub use solver::{LeastSquaresSolver, PositionSolver, SolveError};
