//! Compile-time constants for the positioning pipeline

/// Number of anchors ranged against per positioning invocation
pub const SELECTED_ANCHOR_COUNT: usize = 4;

/// Default pause between consecutive ranging exchanges (milliseconds)
pub const DEFAULT_INTER_PING_DELAY_MS: u64 = 2;

/// Default number of ranging rounds per invocation
pub const DEFAULT_REPETITIONS: usize = 3;
