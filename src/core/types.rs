//! Core data types for the RTLS tag

use serde::{Deserialize, Serialize};

/// 3D position in the deployment's local Cartesian frame, meters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    /// Sentinel used before the first successful position fix
    pub const ZERO: Position = Position {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Euclidean distance to another position, meters
    pub fn distance_to(&self, other: &Position) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

/// Fixed UWB anchor with a known position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anchor {
    /// Ranging-network address, unique per anchor
    pub address: u16,
    pub position: Position,
}

/// One aggregated range measurement, ready for the solver
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    /// Mean distance to the anchor across all ranging rounds, meters
    pub distance: f64,
    /// Static position of the anchor the distance was measured against
    pub anchor_position: Position,
}

/// Solver output: estimated tag position plus a residual/confidence metric
#[derive(Debug, Clone, PartialEq)]
pub struct PositionEstimate {
    pub position: Position,
    /// Solver-defined error metric; lower is better
    pub error: f64,
}
