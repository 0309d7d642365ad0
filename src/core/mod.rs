//! Core types and constants for the RTLS tag

pub mod types;
pub mod constants;

pub use self::types::*;
pub use self::constants::*;
