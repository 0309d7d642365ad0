//! Static configuration for the tag
//!
//! The ranging-network identity, pacing parameters and the anchor table are
//! deployment data: loaded once at startup (JSON file or compiled-in
//! defaults) and treated as immutable afterwards.

use crate::core::{Anchor, Position, DEFAULT_INTER_PING_DELAY_MS, DEFAULT_REPETITIONS};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Configuration loading/validation failure
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {parameter} = {value}: {reason}")]
    InvalidParameter {
        parameter: String,
        value: String,
        reason: String,
    },
    #[error("anchor address {address} appears more than once")]
    DuplicateAnchor { address: u16 },
    #[error("anchor table holds {available} anchors, positioning needs {required}")]
    InsufficientAnchors { available: usize, required: usize },
    #[error("failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Tag-side ranging parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagConfig {
    /// Ranging-network (PAN) identifier shared with the anchors
    pub pan_id: u16,
    /// This tag's own ranging address
    pub own_address: u16,
    /// Pause between consecutive ranging exchanges (milliseconds)
    pub inter_ping_delay_ms: u64,
    /// Ranging rounds per positioning invocation
    pub default_repetitions: usize,
}

impl Default for TagConfig {
    fn default() -> Self {
        Self {
            pan_id: 0xDECA,
            own_address: 100,
            inter_ping_delay_ms: DEFAULT_INTER_PING_DELAY_MS,
            default_repetitions: DEFAULT_REPETITIONS,
        }
    }
}

impl TagConfig {
    pub fn inter_ping_delay(&self) -> Duration {
        Duration::from_millis(self.inter_ping_delay_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_repetitions == 0 {
            return Err(ConfigError::InvalidParameter {
                parameter: "default_repetitions".to_string(),
                value: "0".to_string(),
                reason: "at least one ranging round is required".to_string(),
            });
        }
        Ok(())
    }
}

/// Full deployment configuration: tag parameters plus the anchor table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RtlsConfig {
    pub tag: TagConfig,
    pub anchors: Vec<Anchor>,
}

impl Default for RtlsConfig {
    fn default() -> Self {
        Self {
            tag: TagConfig::default(),
            anchors: vec![
                // shelf
                Anchor {
                    address: 1,
                    position: Position::new(2.34, 1.57, 4.31),
                },
                // corner of window
                Anchor {
                    address: 2,
                    position: Position::new(0.27, 2.31, 5.01),
                },
                // wardrobe
                Anchor {
                    address: 3,
                    position: Position::new(2.56, 2.36, 0.58),
                },
                // door
                Anchor {
                    address: 4,
                    position: Position::new(0.14, 0.05, 0.02),
                },
            ],
        }
    }
}

impl RtlsConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: RtlsConfig = serde_json::from_str(&contents)?;
        config.tag.validate()?;
        Ok(config)
    }
}
