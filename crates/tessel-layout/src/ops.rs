//! Structural edits on a [`PaneTree`].
//!
//! These run on a working copy owned by the engine; the engine validates the
//! result before swapping it in, so an edit that fails halfway never reaches
//! the committed tree.

use tessel_core::view::View;

use crate::engine::LayoutError;
use crate::pane::{
    DockEdge, Orientation, PaneId, PaneNodeKind, PaneNodeRecord, PaneSplit, PaneTabs, PaneTree,
    SplitRatio,
};

impl PaneTree {
    fn allocate_id(&mut self) -> Result<PaneId, LayoutError> {
        let id = self.next_id;
        self.next_id = id.checked_next()?;
        Ok(id)
    }

    fn require(&self, id: PaneId) -> Result<&PaneNodeRecord, LayoutError> {
        self.node(id).ok_or(LayoutError::NotFound { id })
    }

    fn set_parent(&mut self, id: PaneId, parent: Option<PaneId>) -> Result<(), LayoutError> {
        let node = self.node_mut(id).ok_or(LayoutError::NotFound { id })?;
        node.parent = parent;
        Ok(())
    }

    fn tabs_mut(&mut self, id: PaneId) -> Result<&mut PaneTabs, LayoutError> {
        match self.node_mut(id) {
            None => Err(LayoutError::NotFound { id }),
            Some(PaneNodeRecord {
                kind: PaneNodeKind::Tab(tabs),
                ..
            }) => Ok(tabs),
            Some(_) => Err(LayoutError::InvalidState {
                id,
                reason: "pane is not a tab stack",
            }),
        }
    }

    fn replace_child(
        &mut self,
        parent: PaneId,
        old: PaneId,
        new: PaneId,
    ) -> Result<(), LayoutError> {
        let node = self
            .node_mut(parent)
            .ok_or(LayoutError::NotFound { id: parent })?;
        let replaced = match &mut node.kind {
            PaneNodeKind::Split(split) if split.first == old => {
                split.first = new;
                true
            }
            PaneNodeKind::Split(split) if split.second == old => {
                split.second = new;
                true
            }
            PaneNodeKind::Tab(tabs) => match tabs.position(old) {
                Some(index) => {
                    tabs.children[index] = new;
                    true
                }
                None => false,
            },
            PaneNodeKind::Split(_) | PaneNodeKind::Leaf(_) => false,
        };
        if replaced {
            Ok(())
        } else {
            Err(LayoutError::InvalidState {
                id: parent,
                reason: "parent does not reference the child being replaced",
            })
        }
    }

    /// Replace `split` by `survivor` in the split's parent (or at the root).
    fn promote(&mut self, split: PaneId, survivor: PaneId) -> Result<(), LayoutError> {
        let grandparent = self.parent(split);
        match grandparent {
            Some(grandparent) => self.replace_child(grandparent, split, survivor)?,
            None => self.root = survivor,
        }
        self.set_parent(survivor, grandparent)?;
        let _ = self.nodes.remove(&split);
        tracing::debug!(
            split = %split,
            survivor = %survivor,
            "pane.collapse"
        );
        Ok(())
    }

    fn discard_subtree(&mut self, id: PaneId) {
        for node in self.subtree_ids(id) {
            let _ = self.nodes.remove(&node);
        }
    }

    /// Unlink `id` from its parent, leaving its subtree in the arena as a
    /// parentless fragment. Containers left invalid collapse (split with one
    /// child) or prune (empty tab) upward.
    pub(crate) fn detach(&mut self, id: PaneId) -> Result<(), LayoutError> {
        let parent = self.require(id)?.parent.ok_or(LayoutError::InvalidState {
            id,
            reason: "the root pane cannot be detached",
        })?;
        let parent_kind = self.require(parent)?.kind.clone();
        match parent_kind {
            PaneNodeKind::Split(split) => {
                let sibling = split.sibling_of(id).ok_or(LayoutError::InvalidState {
                    id: parent,
                    reason: "split does not reference the detached child",
                })?;
                self.promote(parent, sibling)?;
            }
            PaneNodeKind::Tab(mut tabs) => {
                let index = tabs.position(id).ok_or(LayoutError::InvalidState {
                    id: parent,
                    reason: "tab does not reference the detached child",
                })?;
                let _ = tabs.children.remove(index);
                if tabs.children.is_empty() {
                    self.detach(parent)?;
                    let _ = self.nodes.remove(&parent);
                    tracing::debug!(tab = %parent, "pane.prune");
                } else {
                    if index < tabs.active {
                        tabs.active -= 1;
                    } else if index == tabs.active {
                        tabs.active = index.min(tabs.children.len() - 1);
                    }
                    *self.tabs_mut(parent)? = tabs;
                }
            }
            PaneNodeKind::Leaf(_) => {
                return Err(LayoutError::InvalidState {
                    id: parent,
                    reason: "a leaf cannot have children",
                });
            }
        }
        self.set_parent(id, None)
    }

    /// Wrap `target` in a new split together with the parentless `incoming`.
    fn wrap_in_split(
        &mut self,
        target: PaneId,
        orientation: Orientation,
        incoming: PaneId,
        incoming_first: bool,
    ) -> Result<PaneId, LayoutError> {
        let target_parent = self.require(target)?.parent;
        let split_id = self.allocate_id()?;
        let (first, second) = if incoming_first {
            (incoming, target)
        } else {
            (target, incoming)
        };
        let _ = self.nodes.insert(
            split_id,
            PaneNodeRecord::split(
                split_id,
                target_parent,
                PaneSplit {
                    orientation,
                    ratio: SplitRatio::HALF,
                    first,
                    second,
                },
            ),
        );
        match target_parent {
            Some(parent) => self.replace_child(parent, target, split_id)?,
            None => self.root = split_id,
        }
        self.set_parent(target, Some(split_id))?;
        self.set_parent(incoming, Some(split_id))?;
        Ok(split_id)
    }

    /// Wrap `target` in a new tab stack `[target, incoming]` with `incoming` active.
    fn wrap_in_tab(&mut self, target: PaneId, incoming: PaneId) -> Result<PaneId, LayoutError> {
        let target_parent = self.require(target)?.parent;
        let tab_id = self.allocate_id()?;
        let _ = self.nodes.insert(
            tab_id,
            PaneNodeRecord::tab(
                tab_id,
                target_parent,
                PaneTabs {
                    children: vec![target, incoming],
                    active: 1,
                },
            ),
        );
        match target_parent {
            Some(parent) => self.replace_child(parent, target, tab_id)?,
            None => self.root = tab_id,
        }
        self.set_parent(target, Some(tab_id))?;
        self.set_parent(incoming, Some(tab_id))?;
        Ok(tab_id)
    }

    fn ensure_relocatable(&self, source: PaneId, target: PaneId) -> Result<(), LayoutError> {
        let _ = self.require(source)?;
        let _ = self.require(target)?;
        if self.is_within(source, target) {
            return Err(LayoutError::CycleDetected {
                pane: source,
                target,
            });
        }
        Ok(())
    }

    /// Split a leaf or tab, returning `(new split, new leaf)`.
    pub(crate) fn split_pane(
        &mut self,
        target: PaneId,
        orientation: Orientation,
        view: View,
        insert_before: bool,
    ) -> Result<(PaneId, PaneId), LayoutError> {
        if let PaneNodeKind::Split(_) = self.require(target)?.kind {
            return Err(LayoutError::InvalidState {
                id: target,
                reason: "only a leaf or tab stack can be split",
            });
        }
        let leaf = self.allocate_id()?;
        let _ = self
            .nodes
            .insert(leaf, PaneNodeRecord::leaf(leaf, None, view));
        let split = self.wrap_in_split(target, orientation, leaf, insert_before)?;
        Ok((split, leaf))
    }

    /// Store a resolved ratio. `0` and `1` collapse the split, dropping the
    /// child that would get no space.
    pub(crate) fn apply_ratio(&mut self, split: PaneId, ratio: f64) -> Result<bool, LayoutError> {
        let (first, second) = match self.split(split) {
            Some(node) => (node.first, node.second),
            None => {
                let _ = self.require(split)?;
                return Err(LayoutError::InvalidState {
                    id: split,
                    reason: "only a split can be resized",
                });
            }
        };
        if ratio <= 0.0 || ratio >= 1.0 {
            let (removed, survivor) = if ratio <= 0.0 {
                (first, second)
            } else {
                (second, first)
            };
            self.promote(split, survivor)?;
            self.discard_subtree(removed);
            return Ok(true);
        }
        let ratio = SplitRatio::new(ratio)?;
        if let Some(PaneNodeRecord {
            kind: PaneNodeKind::Split(node),
            ..
        }) = self.node_mut(split)
        {
            node.ratio = ratio;
        }
        Ok(false)
    }

    pub(crate) fn move_into_tab(
        &mut self,
        source: PaneId,
        tab: PaneId,
        index: usize,
    ) -> Result<(), LayoutError> {
        let _ = self.tabs_mut(tab)?;
        self.ensure_relocatable(source, tab)?;
        self.detach(source)?;
        let tabs = match self.tabs_mut(tab) {
            Ok(tabs) => tabs,
            Err(LayoutError::NotFound { .. }) => {
                return Err(LayoutError::InvalidState {
                    id: tab,
                    reason: "target tab was pruned by detaching the source",
                });
            }
            Err(err) => return Err(err),
        };
        let len = tabs.children.len();
        if index > len {
            return Err(LayoutError::OutOfRange {
                id: tab,
                index,
                len,
            });
        }
        tabs.children.insert(index, source);
        tabs.active = index;
        self.set_parent(source, Some(tab))
    }

    /// Move the handle at `from` to `to`; the active child stays active.
    pub(crate) fn reorder_tab(
        &mut self,
        tab: PaneId,
        from: usize,
        to: usize,
    ) -> Result<bool, LayoutError> {
        let tabs = self.tabs_mut(tab)?;
        let len = tabs.children.len();
        for index in [from, to] {
            if index >= len {
                return Err(LayoutError::OutOfRange {
                    id: tab,
                    index,
                    len,
                });
            }
        }
        if from == to {
            return Ok(false);
        }
        let active_child = tabs.active_child();
        let moved = tabs.children.remove(from);
        tabs.children.insert(to, moved);
        if let Some(active_child) = active_child {
            tabs.active = tabs.position(active_child).unwrap_or(tabs.active);
        }
        Ok(true)
    }

    pub(crate) fn set_active_tab(&mut self, tab: PaneId, index: usize) -> Result<bool, LayoutError> {
        let tabs = self.tabs_mut(tab)?;
        let len = tabs.children.len();
        if index >= len {
            return Err(LayoutError::OutOfRange {
                id: tab,
                index,
                len,
            });
        }
        if tabs.active == index {
            return Ok(false);
        }
        tabs.active = index;
        Ok(true)
    }

    pub(crate) fn remove_leaf(&mut self, leaf: PaneId) -> Result<(), LayoutError> {
        let record = self.require(leaf)?;
        if !matches!(record.kind, PaneNodeKind::Leaf(_)) {
            return Err(LayoutError::InvalidState {
                id: leaf,
                reason: "only a leaf can be removed",
            });
        }
        if record.parent.is_none() {
            return Err(LayoutError::InvalidState {
                id: leaf,
                reason: "the last pane of the workspace cannot be removed",
            });
        }
        self.detach(leaf)?;
        let _ = self.nodes.remove(&leaf);
        Ok(())
    }

    pub(crate) fn dock(
        &mut self,
        source: PaneId,
        target: PaneId,
        edge: DockEdge,
    ) -> Result<PaneId, LayoutError> {
        self.ensure_relocatable(source, target)?;
        self.detach(source)?;
        if !self.contains(target) {
            return Err(LayoutError::InvalidState {
                id: target,
                reason: "target was pruned by detaching the source",
            });
        }
        self.wrap_in_split(target, edge.orientation(), source, edge.is_leading())
    }

    pub(crate) fn stack(&mut self, source: PaneId, target: PaneId) -> Result<PaneId, LayoutError> {
        if let PaneNodeKind::Tab(_) = self.require(target)?.kind {
            return Err(LayoutError::InvalidState {
                id: target,
                reason: "target is already a tab stack; move into it instead",
            });
        }
        self.ensure_relocatable(source, target)?;
        self.detach(source)?;
        if !self.contains(target) {
            return Err(LayoutError::InvalidState {
                id: target,
                reason: "target was pruned by detaching the source",
            });
        }
        self.wrap_in_tab(target, source)
    }
}
