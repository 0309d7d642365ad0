//! Least-squares multilateration solver
//!
//! Two stages: a closed-form linearized solve (range equations differenced
//! against the first anchor) to get an initial estimate, then a short
//! Gauss-Newton refinement on the nonlinear range residuals. The reported
//! error metric is the RMS range residual at the final estimate.

use crate::core::{Measurement, Position, PositionEstimate};
use crate::solver::{PositionSolver, SolveError, SolveResult};
use nalgebra::{DMatrix, DVector, Vector3};

/// Minimum number of range measurements for an unambiguous 3D fix
pub const MIN_MEASUREMENTS: usize = 4;

/// Iterative least-squares position solver
#[derive(Debug, Clone)]
pub struct LeastSquaresSolver {
    /// Maximum Gauss-Newton iterations
    pub max_iterations: usize,
    /// Step-norm threshold below which the refinement stops (meters)
    pub convergence_tolerance: f64,
}

impl Default for LeastSquaresSolver {
    fn default() -> Self {
        Self {
            max_iterations: 20,
            convergence_tolerance: 1e-6,
        }
    }
}

const SINGULARITY_EPS: f64 = 1e-9;

impl LeastSquaresSolver {
    /// Closed-form initial estimate from the linearized range equations
    fn linear_estimate(&self, measurements: &[Measurement]) -> Result<Vector3<f64>, SolveError> {
        let reference = &measurements[0];
        let p0 = Vector3::new(
            reference.anchor_position.x,
            reference.anchor_position.y,
            reference.anchor_position.z,
        );
        let d0 = reference.distance;

        let rows = measurements.len() - 1;
        let mut a = DMatrix::zeros(rows, 3);
        let mut b = DVector::zeros(rows);

        for (row, m) in measurements[1..].iter().enumerate() {
            let pi = Vector3::new(m.anchor_position.x, m.anchor_position.y, m.anchor_position.z);
            let delta = pi - p0;
            a[(row, 0)] = 2.0 * delta.x;
            a[(row, 1)] = 2.0 * delta.y;
            a[(row, 2)] = 2.0 * delta.z;
            b[row] = d0 * d0 - m.distance * m.distance + pi.norm_squared() - p0.norm_squared();
        }

        let svd = a.svd(true, true);
        if svd.rank(SINGULARITY_EPS) < 3 {
            return Err(SolveError::DegenerateGeometry {
                details: "anchor positions are collinear or coplanar".to_string(),
            });
        }

        let solution = svd
            .solve(&b, SINGULARITY_EPS)
            .map_err(|details| SolveError::DegenerateGeometry {
                details: details.to_string(),
            })?;

        Ok(Vector3::new(solution[0], solution[1], solution[2]))
    }

    /// RMS of the range residuals at `estimate`
    fn rms_residual(estimate: &Vector3<f64>, measurements: &[Measurement]) -> f64 {
        let sum: f64 = measurements
            .iter()
            .map(|m| {
                let pi =
                    Vector3::new(m.anchor_position.x, m.anchor_position.y, m.anchor_position.z);
                let r = (estimate - pi).norm() - m.distance;
                r * r
            })
            .sum();
        (sum / measurements.len() as f64).sqrt()
    }
}

impl PositionSolver for LeastSquaresSolver {
    fn solve(&self, measurements: &[Measurement]) -> SolveResult {
        if measurements.len() < MIN_MEASUREMENTS {
            return Err(SolveError::InsufficientMeasurements {
                available: measurements.len(),
                required: MIN_MEASUREMENTS,
            });
        }

        let mut estimate = self.linear_estimate(measurements)?;

        let n = measurements.len();
        let mut converged = false;
        for _ in 0..self.max_iterations {
            let mut jacobian = DMatrix::zeros(n, 3);
            let mut residuals = DVector::zeros(n);

            for (row, m) in measurements.iter().enumerate() {
                let pi =
                    Vector3::new(m.anchor_position.x, m.anchor_position.y, m.anchor_position.z);
                let offset = estimate - pi;
                let range = offset.norm().max(SINGULARITY_EPS);

                jacobian[(row, 0)] = offset.x / range;
                jacobian[(row, 1)] = offset.y / range;
                jacobian[(row, 2)] = offset.z / range;
                residuals[row] = range - m.distance;
            }

            let svd = jacobian.svd(true, true);
            let step = svd
                .solve(&(-residuals), SINGULARITY_EPS)
                .map_err(|details| SolveError::DegenerateGeometry {
                    details: details.to_string(),
                })?;
            let step = Vector3::new(step[0], step[1], step[2]);

            estimate += step;
            if step.norm() < self.convergence_tolerance {
                converged = true;
                break;
            }
        }

        if !converged {
            return Err(SolveError::NotConverged {
                iterations: self.max_iterations,
            });
        }

        Ok(PositionEstimate {
            position: Position::new(estimate.x, estimate.y, estimate.z),
            error: Self::rms_residual(&estimate, measurements),
        })
    }
}
