//! Two-way-ranging driver abstraction
//!
//! The radio protocol itself lives below this seam. The pipeline only needs
//! one operation: a single blocking TWR exchange that yields a distance or a
//! driver error.

pub mod mock;

pub use self::mock::MockRangingDriver;

use thiserror::Error;

/// Result type for ranging operations
pub type RangingResult<T> = Result<T, RangingError>;

/// Performs one two-way-ranging exchange with one anchor.
///
/// A call blocks the invoking task for the duration of the radio exchange.
/// The pipeline treats any error as fatal for the whole invocation; drivers
/// should not retry internally unless the retry is invisible to timing.
pub trait RangingDriver {
    fn range(&mut self, pan_id: u16, own_address: u16, anchor_address: u16) -> RangingResult<f64>;
}

impl<D: RangingDriver + ?Sized> RangingDriver for &mut D {
    fn range(&mut self, pan_id: u16, own_address: u16, anchor_address: u16) -> RangingResult<f64> {
        (**self).range(pan_id, own_address, anchor_address)
    }
}

/// Driver-level failure of a single TWR exchange
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RangingError {
    /// The exchange ran but the driver rejected it with a result code
    #[error("TWR exchange with anchor {anchor_address} failed, driver code {code}")]
    ExchangeFailed { anchor_address: u16, code: i32 },
    /// No reply from the anchor within the driver's internal timeout
    #[error("TWR timeout after {timeout_ms}ms waiting for anchor {anchor_address}")]
    Timeout {
        anchor_address: u16,
        timeout_ms: u32,
    },
    /// The radio itself is not usable (not initialized, busy, hardware fault)
    #[error("UWB radio unavailable: {details}")]
    RadioUnavailable { details: String },
}

impl RangingError {
    /// Numeric driver result code, for log parity with the radio stack
    pub fn driver_code(&self) -> i32 {
        match self {
            RangingError::ExchangeFailed { code, .. } => *code,
            RangingError::Timeout { .. } => -110,
            RangingError::RadioUnavailable { .. } => -5,
        }
    }
}
