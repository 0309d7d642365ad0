//! Mock ranging driver for testing and development

use crate::ranging::{RangingDriver, RangingError, RangingResult};
use std::collections::HashMap;

/// Scriptable in-memory ranging driver.
///
/// Distances are configured per anchor address; every call is recorded so
/// tests can assert on the exact exchange order. A failure can be scheduled
/// for a specific call number to exercise the fail-fast path.
pub struct MockRangingDriver {
    distances: HashMap<u16, f64>,
    /// Anchor addresses in the order they were ranged against
    calls: Vec<u16>,
    fail_at_call: Option<(usize, RangingError)>,
    last_pan_id: Option<u16>,
    last_own_address: Option<u16>,
}

impl MockRangingDriver {
    pub fn new() -> Self {
        Self {
            distances: HashMap::new(),
            calls: Vec::new(),
            fail_at_call: None,
            last_pan_id: None,
            last_own_address: None,
        }
    }

    /// Script the distance returned for one anchor address
    pub fn set_distance(&mut self, anchor_address: u16, distance: f64) {
        self.distances.insert(anchor_address, distance);
    }

    /// Script the same distance for every anchor
    pub fn set_distance_for_all(&mut self, distance: f64) {
        self.distances.clear();
        self.distances.insert(u16::MAX, distance);
    }

    /// Schedule `error` for the `call_number`-th exchange (1-indexed)
    pub fn fail_at_call(&mut self, call_number: usize, error: RangingError) {
        self.fail_at_call = Some((call_number, error));
    }

    /// Anchor addresses observed so far, in call order
    pub fn calls(&self) -> &[u16] {
        &self.calls
    }

    pub fn call_count(&self) -> usize {
        self.calls.len()
    }

    pub fn last_pan_id(&self) -> Option<u16> {
        self.last_pan_id
    }

    pub fn last_own_address(&self) -> Option<u16> {
        self.last_own_address
    }
}

impl Default for MockRangingDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl RangingDriver for MockRangingDriver {
    fn range(&mut self, pan_id: u16, own_address: u16, anchor_address: u16) -> RangingResult<f64> {
        self.calls.push(anchor_address);
        self.last_pan_id = Some(pan_id);
        self.last_own_address = Some(own_address);

        if let Some((call_number, error)) = &self.fail_at_call {
            if self.calls.len() == *call_number {
                return Err(error.clone());
            }
        }

        if let Some(&distance) = self.distances.get(&anchor_address) {
            return Ok(distance);
        }
        if let Some(&distance) = self.distances.get(&u16::MAX) {
            return Ok(distance);
        }

        Err(RangingError::ExchangeFailed {
            anchor_address,
            code: -2,
        })
    }
}
