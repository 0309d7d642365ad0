//! Immutable table of known anchors
//!
//! The registry is fixed configuration data: built once at startup, never
//! mutated afterwards. Both the anchor selector and the aggregation step
//! borrow it read-only.

use crate::config::ConfigError;
use crate::core::{Anchor, SELECTED_ANCHOR_COUNT};

/// Ordered, read-only sequence of known anchors
#[derive(Debug, Clone)]
pub struct AnchorRegistry {
    anchors: Vec<Anchor>,
}

impl AnchorRegistry {
    /// Build a registry, rejecting tables that cannot support positioning.
    ///
    /// The table must hold at least [`SELECTED_ANCHOR_COUNT`] anchors and
    /// every address must be unique.
    pub fn new(anchors: Vec<Anchor>) -> Result<Self, ConfigError> {
        if anchors.len() < SELECTED_ANCHOR_COUNT {
            return Err(ConfigError::InsufficientAnchors {
                available: anchors.len(),
                required: SELECTED_ANCHOR_COUNT,
            });
        }

        for (i, anchor) in anchors.iter().enumerate() {
            if anchors[..i].iter().any(|a| a.address == anchor.address) {
                return Err(ConfigError::DuplicateAnchor {
                    address: anchor.address,
                });
            }
        }

        Ok(Self { anchors })
    }

    pub fn get(&self, index: usize) -> Option<&Anchor> {
        self.anchors.get(index)
    }

    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Anchor> {
        self.anchors.iter()
    }
}
