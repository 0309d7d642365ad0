//! Pipeline-level error type and firmware status-code mapping

use crate::ranging::RangingError;
use crate::solver::SolveError;
use thiserror::Error;

/// Terminal failure of one positioning invocation.
///
/// The two firmware failure paths stay disjoint so callers can tell a radio
/// problem from a geometry problem. Neither leaves any state behind: the
/// last-known position is only updated on full success.
#[derive(Debug, Error)]
pub enum PositioningError {
    /// `repetitions` was zero; the mean would be a division by zero
    #[error("repetitions must be at least 1")]
    InvalidRepetitions,
    /// The anchor selector returned out-of-range or duplicate indices
    #[error("anchor selector broke its contract: {details}")]
    SelectorContract { details: String },
    /// A single TWR exchange failed; the whole invocation is discarded
    #[error("ranging against anchor {anchor_address} failed")]
    Ranging {
        anchor_address: u16,
        #[source]
        source: RangingError,
    },
    /// The solver rejected the aggregated measurements
    #[error("position solve failed")]
    Solve(#[from] SolveError),
}

impl PositioningError {
    /// Numeric status code matching the firmware convention: `-1` for a
    /// ranging failure, `-2` for a solve failure (success is `0`). Input
    /// validation failures get codes outside that range.
    pub fn status_code(&self) -> i32 {
        match self {
            PositioningError::Ranging { .. } => -1,
            PositioningError::Solve(_) => -2,
            PositioningError::InvalidRepetitions => -3,
            PositioningError::SelectorContract { .. } => -4,
        }
    }
}
