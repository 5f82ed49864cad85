//! Uncommitted gesture state layered over the committed tree.

use serde::{Deserialize, Serialize};
use tessel_core::geometry::Rect;

use crate::hit::DropTarget;
use crate::pane::PaneId;

/// A small diff over the committed tree that geometry solving reads through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "preview", rename_all = "snake_case")]
pub enum PreviewOverlay {
    /// A split rendered at a ratio it does not (yet) have.
    Ratio { split: PaneId, ratio: f64 },
    /// A tab stack rendered in a different order.
    TabOrder {
        tab: PaneId,
        order: Vec<PaneId>,
        active: usize,
    },
    /// A detached pane hovering a drop target; geometry is unchanged and
    /// `ghost` marks where the pane would land.
    Drop { target: DropTarget, ghost: Rect },
}

impl PreviewOverlay {
    #[must_use]
    pub fn ratio_for(&self, split: PaneId) -> Option<f64> {
        match self {
            Self::Ratio {
                split: overlay_split,
                ratio,
            } if *overlay_split == split => Some(*ratio),
            _ => None,
        }
    }

    /// Overlay order for `tab`, provided it is still a permutation of the
    /// committed `children`.
    #[must_use]
    pub fn tab_order_for<'a>(
        &'a self,
        tab: PaneId,
        children: &[PaneId],
    ) -> Option<(&'a [PaneId], usize)> {
        match self {
            Self::TabOrder {
                tab: overlay_tab,
                order,
                active,
            } if *overlay_tab == tab
                && order.len() == children.len()
                && *active < order.len()
                && children.iter().all(|child| order.contains(child)) =>
            {
                Some((order.as_slice(), *active))
            }
            _ => None,
        }
    }

    /// Drop target of a detached drag.
    #[must_use]
    pub const fn drop_target(&self) -> Option<&DropTarget> {
        match self {
            Self::Drop { target, .. } => Some(target),
            Self::Ratio { .. } | Self::TabOrder { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: u64) -> PaneId {
        PaneId::new(raw).expect("test ID must be non-zero")
    }

    #[test]
    fn ratio_only_applies_to_its_split() {
        let overlay = PreviewOverlay::Ratio {
            split: id(3),
            ratio: 0.4,
        };
        assert_eq!(overlay.ratio_for(id(3)), Some(0.4));
        assert_eq!(overlay.ratio_for(id(4)), None);
        assert!(overlay.drop_target().is_none());
    }

    #[test]
    fn tab_order_requires_a_permutation() {
        let overlay = PreviewOverlay::TabOrder {
            tab: id(1),
            order: vec![id(3), id(2)],
            active: 1,
        };
        assert_eq!(
            overlay.tab_order_for(id(1), &[id(2), id(3)]),
            Some((&[id(3), id(2)][..], 1))
        );
        assert_eq!(overlay.tab_order_for(id(1), &[id(2), id(4)]), None);
        assert_eq!(overlay.tab_order_for(id(1), &[id(2), id(3), id(4)]), None);
    }
}
