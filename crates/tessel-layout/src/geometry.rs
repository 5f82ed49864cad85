//! Top-down geometry solve.
//!
//! [`compute_geometry`] walks the tree once, distributing the root rectangle:
//! splits along their axis by ratio (divider carved from the larger child),
//! tab stacks into a handle strip plus the active child's content. Inactive
//! tab children and all of their descendants get a zero-area placeholder at
//! the content origin so renderers and hit-testing skip them.

use std::collections::BTreeMap;

use serde::Serialize;
use tessel_core::geometry::{Point, Rect};
use tessel_core::view::ViewCapabilities;

use crate::config::LayoutMetrics;
use crate::pane::{Orientation, PaneId, PaneModelError, PaneNodeKind, PaneTree};
use crate::preview::PreviewOverlay;

/// Divider between the two children of a split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DividerLayout {
    pub rect: Rect,
    /// The split's own rectangle.
    pub container: Rect,
    pub orientation: Orientation,
}

impl DividerLayout {
    /// Extent along the split axis that ratios are measured against.
    #[must_use]
    pub const fn available_extent(&self) -> u16 {
        self.orientation.extent(self.container)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TabHandleLayout {
    pub child: PaneId,
    pub rect: Rect,
}

/// Handle strip of a visible tab stack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TabStripLayout {
    pub rect: Rect,
    pub handles: Vec<TabHandleLayout>,
}

impl TabStripLayout {
    /// Index of the handle under `point`.
    #[must_use]
    pub fn handle_at(&self, point: Point) -> Option<usize> {
        self.handles
            .iter()
            .position(|handle| handle.rect.contains(point))
    }

    /// Twice the x coordinate of a handle's midpoint (kept integral).
    #[must_use]
    pub fn doubled_midpoint(&self, index: usize) -> Option<i32> {
        self.handles
            .get(index)
            .map(|handle| i32::from(handle.rect.x) * 2 + i32::from(handle.rect.width))
    }

    /// Insertion index for a drop at column `x`: the number of handles whose
    /// midpoint lies left of `x`.
    #[must_use]
    pub fn insertion_index(&self, x: i32) -> usize {
        (0..self.handles.len())
            .filter(|index| {
                self.doubled_midpoint(*index)
                    .is_some_and(|mid| x.saturating_mul(2) > mid)
            })
            .count()
    }
}

/// Solved geometry for every pane plus the interactive regions.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct PaneLayout {
    area: Rect,
    rects: BTreeMap<PaneId, Rect>,
    dividers: BTreeMap<PaneId, DividerLayout>,
    tab_strips: BTreeMap<PaneId, TabStripLayout>,
    titles: BTreeMap<PaneId, Rect>,
}

impl PaneLayout {
    #[must_use]
    pub const fn area(&self) -> Rect {
        self.area
    }

    #[must_use]
    pub fn rect(&self, id: PaneId) -> Option<Rect> {
        self.rects.get(&id).copied()
    }

    /// Whether a pane occupies any cells.
    #[must_use]
    pub fn is_visible(&self, id: PaneId) -> bool {
        self.rect(id).is_some_and(|rect| !rect.is_empty())
    }

    pub fn rects(&self) -> impl Iterator<Item = (PaneId, Rect)> + '_ {
        self.rects.iter().map(|(id, rect)| (*id, *rect))
    }

    #[must_use]
    pub fn divider(&self, split: PaneId) -> Option<&DividerLayout> {
        self.dividers.get(&split)
    }

    pub fn dividers(&self) -> impl Iterator<Item = (PaneId, &DividerLayout)> + '_ {
        self.dividers.iter().map(|(id, divider)| (*id, divider))
    }

    #[must_use]
    pub fn tab_strip(&self, tab: PaneId) -> Option<&TabStripLayout> {
        self.tab_strips.get(&tab)
    }

    pub fn tab_strips(&self) -> impl Iterator<Item = (PaneId, &TabStripLayout)> + '_ {
        self.tab_strips.iter().map(|(id, strip)| (*id, strip))
    }

    /// Title region of a leaf whose view is a drag handle.
    #[must_use]
    pub fn title(&self, leaf: PaneId) -> Option<Rect> {
        self.titles.get(&leaf).copied()
    }

    pub fn titles(&self) -> impl Iterator<Item = (PaneId, Rect)> + '_ {
        self.titles.iter().map(|(id, rect)| (*id, *rect))
    }
}

/// Solve geometry for the committed tree.
pub fn compute_geometry(
    tree: &PaneTree,
    area: Rect,
    metrics: &LayoutMetrics,
) -> Result<PaneLayout, PaneModelError> {
    compute_geometry_with(tree, area, metrics, None)
}

/// Solve geometry reading through a preview overlay.
///
/// The overlay substitutes one split ratio or one tab order; the tree itself
/// is only read.
pub fn compute_geometry_with(
    tree: &PaneTree,
    area: Rect,
    metrics: &LayoutMetrics,
    overlay: Option<&PreviewOverlay>,
) -> Result<PaneLayout, PaneModelError> {
    let mut layout = PaneLayout {
        area,
        ..PaneLayout::default()
    };
    let mut stack = vec![(tree.root(), None::<PaneId>, area, true)];

    while let Some((id, parent, rect, visible)) = stack.pop() {
        let Some(node) = tree.node(id) else {
            return Err(match parent {
                Some(parent) => PaneModelError::MissingChild { parent, child: id },
                None => PaneModelError::MissingRoot { root: id },
            });
        };
        let _ = layout.rects.insert(id, rect);

        if !visible {
            for child in node.kind.children() {
                stack.push((child, Some(id), rect, false));
            }
            continue;
        }

        match &node.kind {
            PaneNodeKind::Leaf(leaf) => {
                if leaf
                    .view
                    .capabilities()
                    .contains(ViewCapabilities::DRAG_HANDLE)
                {
                    let (title, _) = rect.take_top(metrics.title_height);
                    if !title.is_empty() {
                        let _ = layout.titles.insert(id, title);
                    }
                }
            }
            PaneNodeKind::Split(split) => {
                let ratio = overlay
                    .and_then(|overlay| overlay.ratio_for(id))
                    .unwrap_or(split.ratio.get());
                let (first, divider, second) =
                    split_rect(rect, split.orientation, ratio, metrics.divider_thickness);
                if !rect.is_empty() {
                    let _ = layout.dividers.insert(
                        id,
                        DividerLayout {
                            rect: divider,
                            container: rect,
                            orientation: split.orientation,
                        },
                    );
                }
                stack.push((split.second, Some(id), second, true));
                stack.push((split.first, Some(id), first, true));
            }
            PaneNodeKind::Tab(tabs) => {
                let (order, active) = overlay
                    .and_then(|overlay| overlay.tab_order_for(id, &tabs.children))
                    .unwrap_or((tabs.children.as_slice(), tabs.active));
                let (strip, content) = rect.take_top(metrics.tab_strip_height);
                if !rect.is_empty() {
                    let _ = layout.tab_strips.insert(
                        id,
                        TabStripLayout {
                            rect: strip,
                            handles: layout_handles(strip, order, metrics.tab_handle_width),
                        },
                    );
                }
                for (index, child) in order.iter().enumerate().rev() {
                    if index == active {
                        stack.push((*child, Some(id), content, true));
                    } else {
                        stack.push((*child, Some(id), content.collapsed(), false));
                    }
                }
            }
        }
    }

    Ok(layout)
}

/// Split `rect` along `orientation` into `(first, divider, second)`.
///
/// `first = round(extent * ratio)`, `second = extent - first`; the divider is
/// then taken out of the larger side (the first on ties), never more than
/// that side holds.
#[must_use]
pub fn split_rect(
    rect: Rect,
    orientation: Orientation,
    ratio: f64,
    divider_thickness: u16,
) -> (Rect, Rect, Rect) {
    let extent = orientation.extent(rect);
    let raw = (f64::from(extent) * ratio).round();
    let mut first = if raw.is_nan() || raw <= 0.0 {
        0
    } else if raw >= f64::from(extent) {
        extent
    } else {
        raw as u16
    };
    let mut second = extent - first;
    let divider = divider_thickness.min(first.max(second));
    if first >= second {
        first -= divider;
    } else {
        second -= divider;
    }

    match orientation {
        Orientation::Horizontal => {
            let divider_x = rect.x.saturating_add(first);
            (
                Rect::new(rect.x, rect.y, first, rect.height),
                Rect::new(divider_x, rect.y, divider, rect.height),
                Rect::new(divider_x.saturating_add(divider), rect.y, second, rect.height),
            )
        }
        Orientation::Vertical => {
            let divider_y = rect.y.saturating_add(first);
            (
                Rect::new(rect.x, rect.y, rect.width, first),
                Rect::new(rect.x, divider_y, rect.width, divider),
                Rect::new(rect.x, divider_y.saturating_add(divider), rect.width, second),
            )
        }
    }
}

fn layout_handles(strip: Rect, order: &[PaneId], preferred: u16) -> Vec<TabHandleLayout> {
    let count = u16::try_from(order.len()).unwrap_or(u16::MAX).max(1);
    let (width, remainder) = if u32::from(preferred) * u32::from(count) <= u32::from(strip.width)
    {
        (preferred, 0)
    } else {
        (strip.width / count, strip.width % count)
    };
    let last = order.len().saturating_sub(1);
    let mut x = strip.x;
    order
        .iter()
        .enumerate()
        .map(|(index, child)| {
            let w = if index == last {
                width + remainder
            } else {
                width
            };
            let rect = Rect::new(x, strip.y, w, strip.height);
            x = x.saturating_add(w);
            TabHandleLayout { child: *child, rect }
        })
        .collect()
}

/// Smallest extent the subtree rooted at `id` can take along `orientation`.
///
/// Leaves use their view's layout floor; splits along the same axis add up
/// their children plus the divider, splits across it take the larger child;
/// tab stacks take their largest child plus the strip when measured
/// vertically.
#[must_use]
pub fn min_extent(
    tree: &PaneTree,
    id: PaneId,
    orientation: Orientation,
    metrics: &LayoutMetrics,
) -> u16 {
    let Some(node) = tree.node(id) else {
        return 0;
    };
    match &node.kind {
        PaneNodeKind::Leaf(leaf) => orientation.size_along(leaf.view.layout_floor()),
        PaneNodeKind::Split(split) => {
            let first = min_extent(tree, split.first, orientation, metrics);
            let second = min_extent(tree, split.second, orientation, metrics);
            if split.orientation == orientation {
                first
                    .saturating_add(second)
                    .saturating_add(metrics.divider_thickness)
            } else {
                first.max(second)
            }
        }
        PaneNodeKind::Tab(tabs) => {
            let widest = tabs
                .children
                .iter()
                .map(|child| min_extent(tree, *child, orientation, metrics))
                .max()
                .unwrap_or(0);
            match orientation {
                Orientation::Horizontal => widest,
                Orientation::Vertical => widest.saturating_add(metrics.tab_strip_height),
            }
        }
    }
}
