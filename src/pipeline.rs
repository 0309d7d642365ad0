//! Position acquisition and aggregation pipeline
//!
//! One invocation runs the full measurement-and-solve cycle: pick anchors
//! near the last known position, range against them in round-robin order,
//! average the distances, hand the means to the solver and feed the result
//! back into the last-known position. Collaborators plug in via the
//! [`AnchorSelector`], [`RangingDriver`] and [`PositionSolver`] seams.

use std::thread;
use std::time::Instant;

use tracing::{info, warn};

use crate::config::TagConfig;
use crate::core::{Anchor, Measurement, Position, PositionEstimate, SELECTED_ANCHOR_COUNT};
use crate::error::PositioningError;
use crate::ranging::RangingDriver;
use crate::registry::AnchorRegistry;
use crate::selector::{AnchorSelector, Selection};
use crate::solver::PositionSolver;

/// Periodic positioning pipeline of one tag.
///
/// Owns the last-known position; `&mut self` on [`perform_positioning`]
/// serializes invocations, which is what makes the single read at the start
/// and the single write at the end race-free.
///
/// [`perform_positioning`]: PositioningPipeline::perform_positioning
pub struct PositioningPipeline<S, D, P> {
    registry: AnchorRegistry,
    selector: S,
    driver: D,
    solver: P,
    config: TagConfig,
    last_position: Position,
}

impl<S, D, P> PositioningPipeline<S, D, P>
where
    S: AnchorSelector,
    D: RangingDriver,
    P: PositionSolver,
{
    pub fn new(
        registry: AnchorRegistry,
        selector: S,
        driver: D,
        solver: P,
        config: TagConfig,
    ) -> Self {
        Self {
            registry,
            selector,
            driver,
            solver,
            config,
            last_position: Position::ZERO,
        }
    }

    /// Last successfully solved position, [`Position::ZERO`] before any fix
    pub fn last_position(&self) -> Position {
        self.last_position
    }

    /// Run one full positioning invocation with the configured round count
    pub fn perform_positioning_default(&mut self) -> Result<PositionEstimate, PositioningError> {
        self.perform_positioning(self.config.default_repetitions)
    }

    /// Run one full positioning invocation.
    ///
    /// Performs `repetitions` ranging rounds against the selected anchors,
    /// averages the per-anchor distances and solves for the position. The
    /// first ranging failure or a solver failure aborts the invocation and
    /// leaves the last-known position untouched.
    pub fn perform_positioning(
        &mut self,
        repetitions: usize,
    ) -> Result<PositionEstimate, PositioningError> {
        if repetitions == 0 {
            return Err(PositioningError::InvalidRepetitions);
        }

        let selection = self.selector.select(&self.registry, self.last_position);
        let selected = self.selected_anchors(&selection)?;

        let sums = self.acquire_distance_sums(&selected, repetitions)?;

        let measurements: Vec<Measurement> = selected
            .iter()
            .zip(sums.iter())
            .map(|(anchor, sum)| Measurement {
                distance: sum / repetitions as f64,
                anchor_position: anchor.position,
            })
            .collect();

        let solve_started = Instant::now();
        match self.solver.solve(&measurements) {
            Ok(estimate) => {
                info!(
                    x = estimate.position.x,
                    y = estimate.position.y,
                    z = estimate.position.z,
                    error = estimate.error,
                    solve_ms = solve_started.elapsed().as_millis() as u64,
                    "position fix"
                );
                self.last_position = estimate.position;
                Ok(estimate)
            }
            Err(source) => {
                warn!(code = source.solver_code(), "position solve failed: {source}");
                Err(source.into())
            }
        }
    }

    /// Resolve the selection into anchor records, enforcing the selector
    /// contract: every index in bounds, no duplicates.
    fn selected_anchors(&self, selection: &Selection) -> Result<Vec<Anchor>, PositioningError> {
        let mut selected = Vec::with_capacity(SELECTED_ANCHOR_COUNT);
        for (slot, &index) in selection.iter().enumerate() {
            if selection[..slot].contains(&index) {
                return Err(PositioningError::SelectorContract {
                    details: format!("registry index {index} selected twice"),
                });
            }
            let anchor = self.registry.get(index).ok_or_else(|| {
                PositioningError::SelectorContract {
                    details: format!(
                        "slot {slot} holds index {index}, registry has {} anchors",
                        self.registry.len()
                    ),
                }
            })?;
            selected.push(anchor.clone());
        }
        Ok(selected)
    }

    /// Accumulate per-anchor distance sums over `repetitions` rounds.
    ///
    /// The outer loop is over rounds and the inner loop over anchors on
    /// purpose: consecutive pings to the same anchor overwhelm its receiver,
    /// so each anchor is revisited only after a full round plus the fixed
    /// inter-ping delay. The delay after every exchange paces the radio and
    /// must stay inside the inner loop.
    fn acquire_distance_sums(
        &mut self,
        selected: &[Anchor],
        repetitions: usize,
    ) -> Result<[f64; SELECTED_ANCHOR_COUNT], PositioningError> {
        let delay = self.config.inter_ping_delay();
        let mut sums = [0.0f64; SELECTED_ANCHOR_COUNT];

        for _round in 0..repetitions {
            for (slot, anchor) in selected.iter().enumerate() {
                let distance = self
                    .driver
                    .range(self.config.pan_id, self.config.own_address, anchor.address)
                    .map_err(|source| {
                        warn!(
                            anchor = anchor.address,
                            code = source.driver_code(),
                            "TWR exchange failed"
                        );
                        PositioningError::Ranging {
                            anchor_address: anchor.address,
                            source,
                        }
                    })?;
                sums[slot] += distance;

                if !delay.is_zero() {
                    thread::sleep(delay);
                }
            }
        }

        Ok(sums)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ranging::{MockRangingDriver, RangingError};
    use crate::selector::NearestAnchorSelector;
    use crate::solver::{LeastSquaresSolver, SolveError, SolveResult};
    use std::cell::RefCell;

    /// Selector stub with a fixed selection; records every hint it was given
    struct RecordingSelector {
        order: Selection,
        seen: RefCell<Vec<Position>>,
    }

    impl RecordingSelector {
        fn new(order: Selection) -> Self {
            Self {
                order,
                seen: RefCell::new(Vec::new()),
            }
        }
    }

    impl AnchorSelector for RecordingSelector {
        fn select(&self, _registry: &AnchorRegistry, last_position: Position) -> Selection {
            self.seen.borrow_mut().push(last_position);
            self.order
        }
    }

    /// Solver stub with a canned result; records the measurement sets it saw
    struct StubSolver {
        result: SolveResult,
        captured: RefCell<Vec<Vec<Measurement>>>,
    }

    impl StubSolver {
        fn ok(position: Position, error: f64) -> Self {
            Self {
                result: Ok(PositionEstimate { position, error }),
                captured: RefCell::new(Vec::new()),
            }
        }

        fn failing() -> Self {
            Self {
                result: Err(SolveError::NotConverged { iterations: 20 }),
                captured: RefCell::new(Vec::new()),
            }
        }
    }

    impl PositionSolver for StubSolver {
        fn solve(&self, measurements: &[Measurement]) -> SolveResult {
            self.captured.borrow_mut().push(measurements.to_vec());
            self.result.clone()
        }
    }

    fn test_registry() -> AnchorRegistry {
        AnchorRegistry::new(vec![
            Anchor {
                address: 1,
                position: Position::new(0.0, 0.0, 0.0),
            },
            Anchor {
                address: 2,
                position: Position::new(5.0, 0.0, 0.5),
            },
            Anchor {
                address: 3,
                position: Position::new(0.0, 4.0, 2.8),
            },
            Anchor {
                address: 4,
                position: Position::new(5.0, 4.0, 3.0),
            },
            Anchor {
                address: 5,
                position: Position::new(2.5, 8.0, 1.0),
            },
        ])
        .unwrap()
    }

    fn test_config() -> TagConfig {
        TagConfig {
            inter_ping_delay_ms: 0,
            ..TagConfig::default()
        }
    }

    #[test]
    fn test_averaging_and_success_path() {
        let selector = RecordingSelector::new([0, 1, 2, 3]);
        let solver = StubSolver::ok(Position::new(1.0, 1.0, 1.0), 0.1);
        let mut driver = MockRangingDriver::new();
        driver.set_distance_for_all(5.0);

        let mut pipeline = PositioningPipeline::new(
            test_registry(),
            &selector,
            &mut driver,
            &solver,
            test_config(),
        );

        let estimate = pipeline.perform_positioning(3).unwrap();
        assert_eq!(estimate.position, Position::new(1.0, 1.0, 1.0));
        assert_eq!(estimate.error, 0.1);
        assert_eq!(pipeline.last_position(), Position::new(1.0, 1.0, 1.0));
        drop(pipeline);

        let captured = solver.captured.borrow();
        assert_eq!(captured.len(), 1);
        let measurements = &captured[0];
        assert_eq!(measurements.len(), SELECTED_ANCHOR_COUNT);
        for m in measurements {
            assert!((m.distance - 5.0).abs() < 1e-12);
        }
        // anchor positions attached in selection order
        assert_eq!(measurements[1].anchor_position, Position::new(5.0, 0.0, 0.5));
        assert_eq!(driver.call_count(), 12);
    }

    #[test]
    fn test_round_robin_ordering() {
        let selector = RecordingSelector::new([2, 0, 3, 1]);
        let solver = StubSolver::ok(Position::ZERO, 0.0);
        let mut driver = MockRangingDriver::new();
        driver.set_distance_for_all(1.0);

        let mut pipeline = PositioningPipeline::new(
            test_registry(),
            &selector,
            &mut driver,
            &solver,
            test_config(),
        );
        pipeline.perform_positioning(3).unwrap();
        drop(pipeline);

        // selection order repeated per round, never the same anchor twice in a row
        assert_eq!(
            driver.calls(),
            &[3, 1, 4, 2, 3, 1, 4, 2, 3, 1, 4, 2]
        );
    }

    #[test]
    fn test_fail_fast_on_ranging_failure() {
        let selector = RecordingSelector::new([0, 1, 2, 3]);
        let solver = StubSolver::ok(Position::new(9.0, 9.0, 9.0), 0.0);
        let mut driver = MockRangingDriver::new();
        driver.set_distance_for_all(5.0);
        // round 2, slot 3
        driver.fail_at_call(
            7,
            RangingError::ExchangeFailed {
                anchor_address: 3,
                code: -11,
            },
        );

        let mut pipeline = PositioningPipeline::new(
            test_registry(),
            &selector,
            &mut driver,
            &solver,
            test_config(),
        );

        let result = pipeline.perform_positioning(3);
        let error = result.unwrap_err();
        assert_eq!(error.status_code(), -1);
        assert!(matches!(
            error,
            PositioningError::Ranging {
                anchor_address: 3,
                ..
            }
        ));
        assert_eq!(pipeline.last_position(), Position::ZERO);
        drop(pipeline);

        assert_eq!(driver.call_count(), 7);
        assert!(solver.captured.borrow().is_empty());
    }

    #[test]
    fn test_solve_failure_leaves_state_untouched() {
        let selector = RecordingSelector::new([0, 1, 2, 3]);
        let solver = StubSolver::failing();
        let mut driver = MockRangingDriver::new();
        driver.set_distance_for_all(5.0);

        let mut pipeline = PositioningPipeline::new(
            test_registry(),
            &selector,
            &mut driver,
            &solver,
            test_config(),
        );

        let error = pipeline.perform_positioning(3).unwrap_err();
        assert_eq!(error.status_code(), -2);
        assert!(matches!(error, PositioningError::Solve(_)));
        assert_eq!(pipeline.last_position(), Position::ZERO);
        drop(pipeline);

        // all ranging ran; only the solve failed
        assert_eq!(driver.call_count(), 12);
    }

    #[test]
    fn test_last_position_feeds_next_selection() {
        let selector = RecordingSelector::new([0, 1, 2, 3]);
        let solver = StubSolver::ok(Position::new(1.0, 2.0, 3.0), 0.05);
        let mut driver = MockRangingDriver::new();
        driver.set_distance_for_all(4.0);

        let mut pipeline = PositioningPipeline::new(
            test_registry(),
            &selector,
            &mut driver,
            &solver,
            test_config(),
        );

        pipeline.perform_positioning(1).unwrap();
        pipeline.perform_positioning(1).unwrap();
        drop(pipeline);

        let seen = selector.seen.borrow();
        assert_eq!(seen.as_slice(), &[Position::ZERO, Position::new(1.0, 2.0, 3.0)]);
    }

    #[test]
    fn test_zero_repetitions_rejected_before_any_ranging() {
        let selector = RecordingSelector::new([0, 1, 2, 3]);
        let solver = StubSolver::ok(Position::ZERO, 0.0);
        let mut driver = MockRangingDriver::new();

        let mut pipeline = PositioningPipeline::new(
            test_registry(),
            &selector,
            &mut driver,
            &solver,
            test_config(),
        );

        let error = pipeline.perform_positioning(0).unwrap_err();
        assert!(matches!(error, PositioningError::InvalidRepetitions));
        drop(pipeline);

        assert_eq!(driver.call_count(), 0);
        assert!(selector.seen.borrow().is_empty());
    }

    #[test]
    fn test_selector_contract_violations_detected() {
        let solver = StubSolver::ok(Position::ZERO, 0.0);

        let duplicate = RecordingSelector::new([0, 0, 1, 2]);
        let mut driver = MockRangingDriver::new();
        let mut pipeline = PositioningPipeline::new(
            test_registry(),
            &duplicate,
            &mut driver,
            &solver,
            test_config(),
        );
        let error = pipeline.perform_positioning(1).unwrap_err();
        assert!(matches!(error, PositioningError::SelectorContract { .. }));
        drop(pipeline);
        assert_eq!(driver.call_count(), 0);

        let out_of_range = RecordingSelector::new([0, 1, 2, 9]);
        let mut driver = MockRangingDriver::new();
        let mut pipeline = PositioningPipeline::new(
            test_registry(),
            &out_of_range,
            &mut driver,
            &solver,
            test_config(),
        );
        let error = pipeline.perform_positioning(1).unwrap_err();
        assert!(matches!(error, PositioningError::SelectorContract { .. }));
        drop(pipeline);
        assert_eq!(driver.call_count(), 0);
    }

    #[test]
    fn test_network_identity_passed_to_driver() {
        let selector = RecordingSelector::new([0, 1, 2, 3]);
        let solver = StubSolver::ok(Position::ZERO, 0.0);
        let mut driver = MockRangingDriver::new();
        driver.set_distance_for_all(1.0);

        let config = TagConfig {
            pan_id: 0x1234,
            own_address: 77,
            inter_ping_delay_ms: 0,
            default_repetitions: 1,
        };
        let mut pipeline =
            PositioningPipeline::new(test_registry(), &selector, &mut driver, &solver, config);
        pipeline.perform_positioning_default().unwrap();
        drop(pipeline);

        assert_eq!(driver.last_pan_id(), Some(0x1234));
        assert_eq!(driver.last_own_address(), Some(77));
    }

    #[test]
    fn test_end_to_end_with_real_selector_and_solver() {
        let registry = test_registry();
        let truth = Position::new(2.2, 1.4, 1.1);

        let mut driver = MockRangingDriver::new();
        for anchor in registry.iter() {
            driver.set_distance(anchor.address, truth.distance_to(&anchor.position));
        }

        let mut pipeline = PositioningPipeline::new(
            registry,
            NearestAnchorSelector,
            &mut driver,
            LeastSquaresSolver::default(),
            test_config(),
        );

        let estimate = pipeline.perform_positioning(3).unwrap();
        assert!(estimate.position.distance_to(&truth) < 1e-6);
        assert!(estimate.error < 1e-6);
        assert_eq!(pipeline.last_position(), estimate.position);

        // second fix now selects relative to the previous position
        let second = pipeline.perform_positioning(3).unwrap();
        assert!(second.position.distance_to(&truth) < 1e-6);
    }
}
