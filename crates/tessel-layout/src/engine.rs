//! Layout engine: owns the pane tree and its solved geometry.
//!
//! Every mutation is expressed as a [`Mutation`] value and goes through
//! [`LayoutEngine::apply`], which edits a working copy of the tree, validates
//! it, re-solves geometry, and only then swaps both in. A failed mutation
//! leaves the committed tree and layout untouched.

use serde::{Deserialize, Serialize};
use tessel_core::geometry::Rect;
use tessel_core::view::View;
use thiserror::Error;

use crate::config::LayoutMetrics;
use crate::geometry::{self, DividerLayout, PaneLayout};
use crate::pane::{DockEdge, Orientation, PaneId, PaneModelError, PaneTree, PaneTreeSnapshot};
use crate::preview::PreviewOverlay;

/// Ratios resolved under conflicting minimums stay this far from 0 and 1.
const OVERCONSTRAINED_MARGIN: f64 = 1e-3;

/// Errors returned by layout mutations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LayoutError {
    #[error("pane {id} not found")]
    NotFound { id: PaneId },
    #[error("pane {id}: {reason}")]
    InvalidState { id: PaneId, reason: &'static str },
    #[error("moving pane {pane} into {target} would create a cycle")]
    CycleDetected { pane: PaneId, target: PaneId },
    #[error("index {index} out of range for tab {id} with {len} children")]
    OutOfRange { id: PaneId, index: usize, len: usize },
    #[error("area {area:?} extends past the coordinate range")]
    AreaOutOfBounds { area: Rect },
    #[error(transparent)]
    Model(#[from] PaneModelError),
}

/// Every cell of `area` must be addressable, so child offsets never overflow.
fn check_area(area: Rect) -> Result<(), LayoutError> {
    let fits =
        |origin: u16, extent: u16| u32::from(origin) + u32::from(extent) <= u32::from(u16::MAX);
    if fits(area.x, area.width) && fits(area.y, area.height) {
        Ok(())
    } else {
        Err(LayoutError::AreaOutOfBounds { area })
    }
}

/// One engine operation, serializable for traces and replay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Mutation {
    Split {
        target: PaneId,
        orientation: Orientation,
        view: View,
        insert_before: bool,
    },
    Resize {
        split: PaneId,
        ratio: f64,
    },
    MoveToTab {
        source: PaneId,
        tab: PaneId,
        index: usize,
    },
    ReorderTab {
        tab: PaneId,
        from: usize,
        to: usize,
    },
    RemoveLeaf {
        leaf: PaneId,
    },
    SetActiveTab {
        tab: PaneId,
        index: usize,
    },
    Dock {
        source: PaneId,
        target: PaneId,
        edge: DockEdge,
    },
    Stack {
        source: PaneId,
        target: PaneId,
    },
}

impl Mutation {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Split { .. } => "split",
            Self::Resize { .. } => "resize",
            Self::MoveToTab { .. } => "move_to_tab",
            Self::ReorderTab { .. } => "reorder_tab",
            Self::RemoveLeaf { .. } => "remove_leaf",
            Self::SetActiveTab { .. } => "set_active_tab",
            Self::Dock { .. } => "dock",
            Self::Stack { .. } => "stack",
        }
    }
}

/// Result of a committed mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct MutationOutcome {
    /// The mutation as committed; a resize carries its clamped ratio, so
    /// re-applying it reproduces the same tree.
    pub mutation: Mutation,
    /// Container created by the mutation (split, dock, stack).
    pub created: Option<PaneId>,
    /// Leaf created by a split.
    pub created_leaf: Option<PaneId>,
    /// A resize collapsed its split.
    pub collapsed: bool,
    pub before_hash: u64,
    pub after_hash: u64,
}

impl MutationOutcome {
    #[must_use]
    pub fn changed(&self) -> bool {
        self.before_hash != self.after_hash
    }
}

/// Owner of the pane tree.
#[derive(Debug, Clone)]
pub struct LayoutEngine {
    tree: PaneTree,
    area: Rect,
    metrics: LayoutMetrics,
    layout: PaneLayout,
    operations: u64,
}

impl LayoutEngine {
    /// Validate `tree` and solve it for `area`.
    pub fn new(tree: PaneTree, area: Rect, metrics: LayoutMetrics) -> Result<Self, LayoutError> {
        tree.validate()?;
        check_area(area)?;
        let layout = geometry::compute_geometry(&tree, area, &metrics)?;
        Ok(Self {
            tree,
            area,
            metrics,
            layout,
            operations: 0,
        })
    }

    pub fn from_snapshot(
        snapshot: PaneTreeSnapshot,
        area: Rect,
        metrics: LayoutMetrics,
    ) -> Result<Self, LayoutError> {
        Self::new(PaneTree::from_snapshot(snapshot)?, area, metrics)
    }

    #[must_use]
    pub const fn tree(&self) -> &PaneTree {
        &self.tree
    }

    /// Geometry of the committed tree.
    #[must_use]
    pub const fn layout(&self) -> &PaneLayout {
        &self.layout
    }

    #[must_use]
    pub const fn area(&self) -> Rect {
        self.area
    }

    #[must_use]
    pub const fn metrics(&self) -> &LayoutMetrics {
        &self.metrics
    }

    /// Number of mutations committed so far.
    #[must_use]
    pub const fn operations(&self) -> u64 {
        self.operations
    }

    #[must_use]
    pub fn snapshot(&self) -> PaneTreeSnapshot {
        self.tree.to_snapshot()
    }

    /// Re-solve for a new root rectangle.
    pub fn set_area(&mut self, area: Rect) -> Result<(), LayoutError> {
        check_area(area)?;
        self.layout = geometry::compute_geometry(&self.tree, area, &self.metrics)?;
        self.area = area;
        Ok(())
    }

    /// Geometry as it would look with `overlay` applied. The tree is not touched.
    pub fn preview_layout(&self, overlay: &PreviewOverlay) -> Result<PaneLayout, LayoutError> {
        Ok(geometry::compute_geometry_with(
            &self.tree,
            self.area,
            &self.metrics,
            Some(overlay),
        )?)
    }

    /// Smallest extent the subtree at `id` accepts along `orientation`.
    #[must_use]
    pub fn min_extent(&self, id: PaneId, orientation: Orientation) -> u16 {
        geometry::min_extent(&self.tree, id, orientation, &self.metrics)
    }

    /// The ratio [`LayoutEngine::resize`] would commit for `requested`.
    ///
    /// The result lies in `[0, 1]`; `0` or `1` means the resize collapses the
    /// split.
    pub fn preview_resize(&self, split: PaneId, requested: f64) -> Result<f64, LayoutError> {
        let Some(node) = self.tree.split(split) else {
            if self.tree.contains(split) {
                return Err(LayoutError::InvalidState {
                    id: split,
                    reason: "only a split can be resized",
                });
            }
            return Err(LayoutError::NotFound { id: split });
        };
        if !requested.is_finite() {
            return Err(LayoutError::InvalidState {
                id: split,
                reason: "ratio must be finite",
            });
        }
        let extent = self
            .layout
            .divider(split)
            .map_or(0, DividerLayout::available_extent);
        let first_min = self.min_extent(node.first, node.orientation);
        let second_min = self.min_extent(node.second, node.orientation);
        Ok(clamp_ratio(
            requested,
            extent,
            self.metrics.divider_thickness,
            first_min,
            second_min,
        ))
    }

    /// Apply one mutation atomically.
    pub fn apply(&mut self, mutation: &Mutation) -> Result<MutationOutcome, LayoutError> {
        let before_hash = self.tree.state_hash();
        let mut working = self.tree.clone();
        let mut committed = mutation.clone();
        let mut created = None;
        let mut created_leaf = None;
        let mut collapsed = false;

        match mutation {
            Mutation::Split {
                target,
                orientation,
                view,
                insert_before,
            } => {
                let (split, leaf) =
                    working.split_pane(*target, *orientation, view.clone(), *insert_before)?;
                created = Some(split);
                created_leaf = Some(leaf);
            }
            Mutation::Resize { split, ratio } => {
                let resolved = self.preview_resize(*split, *ratio)?;
                collapsed = working.apply_ratio(*split, resolved)?;
                committed = Mutation::Resize {
                    split: *split,
                    ratio: resolved,
                };
            }
            Mutation::MoveToTab { source, tab, index } => {
                working.move_into_tab(*source, *tab, *index)?;
            }
            Mutation::ReorderTab { tab, from, to } => {
                let _ = working.reorder_tab(*tab, *from, *to)?;
            }
            Mutation::RemoveLeaf { leaf } => {
                working.remove_leaf(*leaf)?;
            }
            Mutation::SetActiveTab { tab, index } => {
                let _ = working.set_active_tab(*tab, *index)?;
            }
            Mutation::Dock {
                source,
                target,
                edge,
            } => {
                created = Some(working.dock(*source, *target, *edge)?);
            }
            Mutation::Stack { source, target } => {
                created = Some(working.stack(*source, *target)?);
            }
        }

        working.validate()?;
        let layout = geometry::compute_geometry(&working, self.area, &self.metrics)?;
        let after_hash = working.state_hash();
        self.tree = working;
        self.layout = layout;
        self.operations += 1;

        let outcome = MutationOutcome {
            mutation: committed,
            created,
            created_leaf,
            collapsed,
            before_hash,
            after_hash,
        };
        log_committed(&outcome);
        Ok(outcome)
    }

    /// Split a leaf or tab stack; returns the new split's id.
    pub fn split(
        &mut self,
        target: PaneId,
        orientation: Orientation,
        view: View,
        insert_before: bool,
    ) -> Result<PaneId, LayoutError> {
        let outcome = self.apply(&Mutation::Split {
            target,
            orientation,
            view,
            insert_before,
        })?;
        outcome.created.ok_or(LayoutError::InvalidState {
            id: target,
            reason: "split produced no container",
        })
    }

    /// Resize a split; returns the committed (clamped) ratio.
    pub fn resize(&mut self, split: PaneId, ratio: f64) -> Result<f64, LayoutError> {
        let outcome = self.apply(&Mutation::Resize { split, ratio })?;
        match outcome.mutation {
            Mutation::Resize {
                ratio: committed, ..
            } => Ok(committed),
            _ => Ok(ratio),
        }
    }

    pub fn move_to_tab(
        &mut self,
        source: PaneId,
        tab: PaneId,
        index: usize,
    ) -> Result<MutationOutcome, LayoutError> {
        self.apply(&Mutation::MoveToTab { source, tab, index })
    }

    pub fn reorder_tab(
        &mut self,
        tab: PaneId,
        from: usize,
        to: usize,
    ) -> Result<MutationOutcome, LayoutError> {
        self.apply(&Mutation::ReorderTab { tab, from, to })
    }

    pub fn remove_leaf(&mut self, leaf: PaneId) -> Result<MutationOutcome, LayoutError> {
        self.apply(&Mutation::RemoveLeaf { leaf })
    }

    pub fn set_active_tab(
        &mut self,
        tab: PaneId,
        index: usize,
    ) -> Result<MutationOutcome, LayoutError> {
        self.apply(&Mutation::SetActiveTab { tab, index })
    }

    pub fn dock(
        &mut self,
        source: PaneId,
        target: PaneId,
        edge: DockEdge,
    ) -> Result<MutationOutcome, LayoutError> {
        self.apply(&Mutation::Dock {
            source,
            target,
            edge,
        })
    }

    pub fn stack(&mut self, source: PaneId, target: PaneId) -> Result<MutationOutcome, LayoutError> {
        self.apply(&Mutation::Stack { source, target })
    }
}

/// Clamp `requested` so both children keep their minimum extent.
///
/// [`split_rect`](crate::geometry::split_rect) takes the divider out of
/// whichever side ends up larger, so a child with a non-zero minimum needs
/// room for the divider on top of it. A zero minimum keeps its bound at the
/// edge, where the split collapses. When the minimums cannot both fit, space
/// is shared in proportion to them.
fn clamp_ratio(
    requested: f64,
    extent: u16,
    divider: u16,
    first_min: u16,
    second_min: u16,
) -> f64 {
    if extent == 0 {
        return requested.clamp(0.0, 1.0);
    }
    let reserve = |min: u16| {
        if min == 0 {
            0.0
        } else {
            f64::from(min) + f64::from(divider)
        }
    };
    let extent = f64::from(extent);
    let min_ratio = reserve(first_min) / extent;
    let max_ratio = 1.0 - reserve(second_min) / extent;
    if min_ratio > max_ratio {
        let total = f64::from(first_min) + f64::from(second_min);
        return (f64::from(first_min) / total)
            .clamp(OVERCONSTRAINED_MARGIN, 1.0 - OVERCONSTRAINED_MARGIN);
    }
    requested.clamp(min_ratio, max_ratio)
}

fn log_committed(outcome: &MutationOutcome) {
    let hash = outcome.after_hash;
    match &outcome.mutation {
        Mutation::Split {
            target,
            orientation,
            insert_before,
            ..
        } => tracing::debug!(
            pane = %target,
            orientation = ?orientation,
            insert_before,
            split = ?outcome.created,
            hash,
            "pane.split"
        ),
        Mutation::Resize { split, ratio } => tracing::debug!(
            split = %split,
            ratio,
            collapsed = outcome.collapsed,
            hash,
            "pane.resize"
        ),
        Mutation::MoveToTab { source, tab, index } => tracing::debug!(
            pane = %source,
            tab = %tab,
            index,
            hash,
            "tab.move"
        ),
        Mutation::ReorderTab { tab, from, to } => tracing::debug!(
            tab = %tab,
            from,
            to,
            hash,
            "tab.reorder"
        ),
        Mutation::RemoveLeaf { leaf } => tracing::debug!(
            pane = %leaf,
            hash,
            "pane.remove"
        ),
        Mutation::SetActiveTab { tab, index } => tracing::debug!(
            tab = %tab,
            index,
            hash,
            "tab.activate"
        ),
        Mutation::Dock {
            source,
            target,
            edge,
        } => tracing::debug!(
            pane = %source,
            target_pane = %target,
            edge = ?edge,
            hash,
            "pane.dock"
        ),
        Mutation::Stack { source, target } => tracing::debug!(
            pane = %source,
            target_pane = %target,
            hash,
            "pane.stack"
        ),
    }
}
