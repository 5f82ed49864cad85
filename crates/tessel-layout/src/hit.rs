//! Pointer hit-testing and drop-target resolution.
//!
//! Press precedence: divider > tab handle > empty tab strip > title region.
//! Drop precedence for a detached pane: divider zone > tab strip > pane edge
//! > pane centre. Hidden panes have no dividers, strips or titles in the
//! layout, so they are never hit.

use serde::{Deserialize, Serialize};
use tessel_core::geometry::{Point, Rect};

use crate::config::DragTuning;
use crate::engine::Mutation;
use crate::geometry::PaneLayout;
use crate::pane::{DockEdge, PaneId, PaneNodeKind, PaneTree};

/// What a pointer press landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "hit", rename_all = "snake_case")]
pub enum HitTarget {
    DividerHandle { split: PaneId },
    TabHandle { tab: PaneId, index: usize },
    TabStripEmpty { tab: PaneId },
    PaneTitleRegion { pane: PaneId },
}

impl HitTarget {
    /// The pane the target belongs to.
    #[must_use]
    pub const fn pane(&self) -> PaneId {
        match self {
            Self::DividerHandle { split } => *split,
            Self::TabHandle { tab, .. } | Self::TabStripEmpty { tab } => *tab,
            Self::PaneTitleRegion { pane } => *pane,
        }
    }
}

/// Classify the region under `point`.
#[must_use]
pub fn hit_test(layout: &PaneLayout, point: Point, divider_slop: u16) -> Option<HitTarget> {
    let divider = layout
        .dividers()
        .filter(|(_, divider)| divider.rect.contains_with_slop(point, divider_slop))
        .min_by_key(|(split, divider)| (divider.container.area(), *split));
    if let Some((split, _)) = divider {
        return Some(HitTarget::DividerHandle { split });
    }

    for (tab, strip) in layout.tab_strips() {
        if strip.rect.contains(point) {
            return Some(match strip.handle_at(point) {
                Some(index) => HitTarget::TabHandle { tab, index },
                None => HitTarget::TabStripEmpty { tab },
            });
        }
    }

    layout
        .titles()
        .find(|(_, title)| title.contains(point))
        .map(|(pane, _)| HitTarget::PaneTitleRegion { pane })
}

/// Where a detached pane would land.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "zone", rename_all = "snake_case")]
pub enum DropTarget {
    /// Dock against the leading edge of the split's second child.
    DividerZone { split: PaneId },
    /// Insert into a tab stack at `index` (counted before the source detaches).
    TabInsert { tab: PaneId, index: usize },
    PaneEdge { pane: PaneId, edge: DockEdge },
    /// Stack with the pane in a new tab.
    PaneCenter { pane: PaneId },
}

impl DropTarget {
    /// The engine mutation that drops `source` here.
    #[must_use]
    pub fn mutation(&self, tree: &PaneTree, source: PaneId) -> Option<Mutation> {
        match *self {
            Self::DividerZone { split } => {
                let node = tree.split(split)?;
                Some(Mutation::Dock {
                    source,
                    target: node.second,
                    edge: DockEdge::leading(node.orientation),
                })
            }
            Self::TabInsert { tab, index } => {
                let tabs = tree.tabs(tab)?;
                let index = match tabs.position(source) {
                    Some(current) if current < index => index - 1,
                    _ => index,
                };
                Some(Mutation::MoveToTab { source, tab, index })
            }
            Self::PaneEdge { pane, edge } => Some(Mutation::Dock {
                source,
                target: pane,
                edge,
            }),
            Self::PaneCenter { pane } => Some(Mutation::Stack {
                source,
                target: pane,
            }),
        }
    }

    /// Highlight rectangle shown while hovering this target.
    #[must_use]
    pub fn ghost(&self, layout: &PaneLayout) -> Option<Rect> {
        match *self {
            Self::DividerZone { split } => layout.divider(split).map(|divider| divider.rect),
            Self::TabInsert { tab, .. } => layout.rect(tab),
            Self::PaneCenter { pane } => layout.rect(pane),
            Self::PaneEdge { pane, edge } => {
                let rect = layout.rect(pane)?;
                let half_width = rect.width / 2;
                let half_height = rect.height / 2;
                Some(match edge {
                    DockEdge::Left => Rect::new(rect.x, rect.y, half_width, rect.height),
                    DockEdge::Right => Rect::new(
                        rect.x + (rect.width - half_width),
                        rect.y,
                        half_width,
                        rect.height,
                    ),
                    DockEdge::Top => Rect::new(rect.x, rect.y, rect.width, half_height),
                    DockEdge::Bottom => Rect::new(
                        rect.x,
                        rect.y + (rect.height - half_height),
                        rect.width,
                        half_height,
                    ),
                })
            }
        }
    }
}

/// Panes that disappear when `source` is detached: a parent split always
/// collapses, a parent tab is pruned when `source` is its only child.
fn removed_by_detach(tree: &PaneTree, source: PaneId) -> Vec<PaneId> {
    let mut removed = Vec::new();
    let mut child = source;
    while let Some(parent) = tree.parent(child) {
        match tree.node(parent).map(|node| &node.kind) {
            Some(PaneNodeKind::Split(_)) => {
                removed.push(parent);
                break;
            }
            Some(PaneNodeKind::Tab(tabs)) if tabs.children.len() == 1 => {
                removed.push(parent);
                child = parent;
            }
            _ => break,
        }
    }
    removed
}

/// Resolve the drop target for `source` under `point`, never inside the
/// source subtree and never on a pane detaching would remove.
#[must_use]
pub fn resolve_drop(
    tree: &PaneTree,
    layout: &PaneLayout,
    point: Point,
    source: PaneId,
    tuning: &DragTuning,
) -> Option<DropTarget> {
    let removed = removed_by_detach(tree, source);
    let allowed = |id: PaneId| !tree.is_within(source, id) && !removed.contains(&id);

    let divider = layout
        .dividers()
        .filter(|(split, divider)| {
            divider
                .rect
                .contains_with_slop(point, tuning.divider_grab_slop)
                && allowed(*split)
                && tree.split(*split).is_some_and(|node| allowed(node.second))
        })
        .min_by_key(|(split, divider)| (divider.container.area(), *split));
    if let Some((split, _)) = divider {
        return Some(DropTarget::DividerZone { split });
    }

    for (tab, strip) in layout.tab_strips() {
        if strip.rect.contains(point) && allowed(tab) {
            return Some(DropTarget::TabInsert {
                tab,
                index: strip.insertion_index(point.x),
            });
        }
    }

    let (pane, rect) = layout.rects().find(|(id, rect)| {
        tree.view(*id).is_some() && !rect.is_empty() && rect.contains(point)
    })?;
    if !allowed(pane) {
        return None;
    }
    if let Some(edge) = edge_zone(rect, point, tuning.edge_dock_fraction) {
        return Some(DropTarget::PaneEdge { pane, edge });
    }
    match tree.parent(pane).and_then(|parent| Some((parent, tree.tabs(parent)?))) {
        Some((tab, tabs)) if allowed(tab) => Some(DropTarget::TabInsert {
            tab,
            index: tabs.children.len(),
        }),
        _ => Some(DropTarget::PaneCenter { pane }),
    }
}

/// Edge zone of `rect` containing `point`, measured at cell centres.
fn edge_zone(rect: Rect, point: Point, fraction: f64) -> Option<DockEdge> {
    let rx = (f64::from(point.x - i32::from(rect.x)) + 0.5) / f64::from(rect.width);
    let ry = (f64::from(point.y - i32::from(rect.y)) + 0.5) / f64::from(rect.height);
    let candidates = [
        (DockEdge::Left, rx),
        (DockEdge::Right, 1.0 - rx),
        (DockEdge::Top, ry),
        (DockEdge::Bottom, 1.0 - ry),
    ];
    let (edge, distance) = candidates
        .into_iter()
        .fold(None::<(DockEdge, f64)>, |best, candidate| match best {
            Some(best) if best.1 <= candidate.1 => Some(best),
            _ => Some(candidate),
        })?;
    (distance < fraction).then_some(edge)
}
