//! Anchor selection for a positioning invocation
//!
//! The pipeline does not care how anchors are chosen, only that the selector
//! returns [`SELECTED_ANCHOR_COUNT`] distinct, in-bounds registry indices for
//! any input position, including the zero sentinel before the first fix.

use crate::core::{Position, SELECTED_ANCHOR_COUNT};
use crate::registry::AnchorRegistry;

/// Registry indices of the anchors to range against, in ranging order
pub type Selection = [usize; SELECTED_ANCHOR_COUNT];

/// Picks the subset of anchors to range against for one invocation.
///
/// Must be total: every call returns exactly [`SELECTED_ANCHOR_COUNT`]
/// distinct valid indices, even when `last_position` is [`Position::ZERO`].
pub trait AnchorSelector {
    fn select(&self, registry: &AnchorRegistry, last_position: Position) -> Selection;
}

impl<S: AnchorSelector + ?Sized> AnchorSelector for &S {
    fn select(&self, registry: &AnchorRegistry, last_position: Position) -> Selection {
        (**self).select(registry, last_position)
    }
}

/// Selects the anchors nearest to the tag's last known position.
///
/// Before the first fix (`last_position == Position::ZERO`) the heuristic has
/// nothing to go on, so the first registry entries are taken in table order.
/// Distance ties also resolve in table order, keeping selection deterministic.
#[derive(Debug, Clone, Default)]
pub struct NearestAnchorSelector;

impl AnchorSelector for NearestAnchorSelector {
    fn select(&self, registry: &AnchorRegistry, last_position: Position) -> Selection {
        let mut indices: Vec<usize> = (0..registry.len()).collect();

        if last_position != Position::ZERO {
            indices.sort_by(|&a, &b| {
                let da = registry.get(a).map(|x| x.position.distance_to(&last_position));
                let db = registry.get(b).map(|x| x.position.distance_to(&last_position));
                da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
            });
        }

        let mut selection = [0usize; SELECTED_ANCHOR_COUNT];
        selection.copy_from_slice(&indices[..SELECTED_ANCHOR_COUNT]);
        selection
    }
}
