//! Position solver abstraction
//!
//! Multilateration is a black box to the acquisition pipeline: any solver
//! that turns aggregated range measurements into a position estimate can be
//! plugged in here without touching the acquisition loop.

pub mod least_squares;

pub use self::least_squares::LeastSquaresSolver;

use crate::core::{Measurement, PositionEstimate};
use thiserror::Error;

/// Result type for solve operations
pub type SolveResult = Result<PositionEstimate, SolveError>;

/// Computes a position estimate from aggregated range measurements
pub trait PositionSolver {
    fn solve(&self, measurements: &[Measurement]) -> SolveResult;
}

impl<P: PositionSolver + ?Sized> PositionSolver for &P {
    fn solve(&self, measurements: &[Measurement]) -> SolveResult {
        (**self).solve(measurements)
    }
}

/// Solver-level failure, distinct from ranging failures so callers can tell
/// a radio problem from a geometry problem
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SolveError {
    #[error("need at least {required} measurements, got {available}")]
    InsufficientMeasurements { available: usize, required: usize },
    /// Anchor geometry does not constrain the position (collinear/coplanar
    /// anchors, rank-deficient system)
    #[error("degenerate anchor geometry: {details}")]
    DegenerateGeometry { details: String },
    #[error("solver did not converge within {iterations} iterations")]
    NotConverged { iterations: usize },
}

impl SolveError {
    /// Numeric solver result code, for log parity with the firmware stack
    pub fn solver_code(&self) -> i32 {
        match self {
            SolveError::InsufficientMeasurements { .. } => -1,
            SolveError::DegenerateGeometry { .. } => -2,
            SolveError::NotConverged { .. } => -3,
        }
    }
}
