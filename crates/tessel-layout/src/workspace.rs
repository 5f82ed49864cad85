//! Host-facing facade: one engine, one drag controller, one debug stream.
//!
//! Hosts feed [`PointerEvent`]s in arrival order and read back geometry and
//! render commands. Programmatic edits go through the same engine the drag
//! controller commits to, and are reported on the debug stream as
//! `MutationCommitted` events so a recorded trace replays both.

use tessel_core::event::PointerEvent;
use tessel_core::geometry::Rect;
use tessel_core::view::{RenderCommand, View};
use thiserror::Error;

use crate::config::{ConfigError, WorkspaceConfig};
use crate::drag::{DragController, DragOutcome, DragState};
use crate::engine::{LayoutEngine, LayoutError, Mutation, MutationOutcome};
use crate::geometry::PaneLayout;
use crate::hit::DropTarget;
use crate::pane::{DockEdge, Orientation, PaneId, PaneTree, PaneTreeSnapshot};
use crate::preview::PreviewOverlay;
use crate::sink::{CancelReason, DebugEmitter, DebugEventKind, DebugSink};

#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Layout(#[from] LayoutError),
}

#[derive(Debug)]
pub struct Workspace {
    engine: LayoutEngine,
    drag: DragController,
    emitter: DebugEmitter,
}

impl Workspace {
    pub fn new(tree: PaneTree, area: Rect, config: WorkspaceConfig) -> Result<Self, WorkspaceError> {
        config.validate()?;
        let engine = LayoutEngine::new(tree, area, config.metrics)?;
        Ok(Self {
            engine,
            drag: DragController::new(config.drag),
            emitter: DebugEmitter::default(),
        })
    }

    /// Restore a workspace from a persisted tree.
    pub fn from_snapshot(
        snapshot: PaneTreeSnapshot,
        area: Rect,
        config: WorkspaceConfig,
    ) -> Result<Self, WorkspaceError> {
        Self::new(
            PaneTree::from_snapshot(snapshot).map_err(LayoutError::from)?,
            area,
            config,
        )
    }

    /// Attach a debug sink before any events flow.
    #[must_use]
    pub fn with_sink(mut self, sink: Box<dyn DebugSink>) -> Self {
        let _ = self.emitter.set_sink(Some(sink));
        self
    }

    /// Stamp debug events with sequence numbers instead of wall time.
    #[must_use]
    pub fn with_logical_clock(mut self) -> Self {
        self.emitter = self.emitter.logical_clock();
        self
    }

    pub fn set_sink(&mut self, sink: Option<Box<dyn DebugSink>>) -> Option<Box<dyn DebugSink>> {
        self.emitter.set_sink(sink)
    }

    pub fn handle_pointer(&mut self, event: PointerEvent) -> DragOutcome {
        self.drag.handle(&mut self.engine, &mut self.emitter, event)
    }

    /// Abort the active gesture, if any.
    pub fn cancel_drag(&mut self) -> DragOutcome {
        self.drag.cancel(&mut self.emitter, CancelReason::Programmatic)
    }

    /// Apply a mutation on behalf of the host.
    ///
    /// An active gesture is left alone; it re-validates its target on the
    /// next pointer event.
    pub fn apply(&mut self, mutation: &Mutation) -> Result<MutationOutcome, LayoutError> {
        let outcome = self.engine.apply(mutation)?;
        self.emitter.emit(DebugEventKind::MutationCommitted {
            mutation: outcome.mutation.clone(),
            after_hash: outcome.after_hash,
        });
        Ok(outcome)
    }

    /// Split `target`; returns the new split's id.
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

    /// Resize a split; returns the committed ratio.
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

    /// Re-solve for a resized host window.
    pub fn set_area(&mut self, area: Rect) -> Result<(), LayoutError> {
        self.engine.set_area(area)
    }

    /// Committed geometry.
    #[must_use]
    pub const fn geometry(&self) -> &PaneLayout {
        self.engine.layout()
    }

    #[must_use]
    pub const fn tree(&self) -> &PaneTree {
        self.engine.tree()
    }

    #[must_use]
    pub const fn engine(&self) -> &LayoutEngine {
        &self.engine
    }

    #[must_use]
    pub fn tree_snapshot(&self) -> PaneTreeSnapshot {
        self.engine.snapshot()
    }

    #[must_use]
    pub const fn drag_state(&self) -> &DragState {
        self.drag.state()
    }

    /// Geometry with the active gesture's preview applied.
    #[must_use]
    pub fn drag_preview(&self) -> Option<PaneLayout> {
        let overlay = self.drag.preview()?;
        match self.engine.preview_layout(overlay) {
            Ok(layout) => Some(layout),
            Err(err) => {
                tracing::debug!(error = %err, "drag.preview_failed");
                None
            }
        }
    }

    /// Drop zone under the pointer of a detached pane, with its ghost rect.
    #[must_use]
    pub fn drop_preview(&self) -> Option<(DropTarget, Rect)> {
        match self.drag.preview()? {
            PreviewOverlay::Drop { target, ghost } => Some((*target, *ghost)),
            PreviewOverlay::Ratio { .. } | PreviewOverlay::TabOrder { .. } => None,
        }
    }

    /// Draw commands for every visible leaf, using the preview while dragging.
    #[must_use]
    pub fn render(&self) -> Vec<RenderCommand> {
        let preview = self.drag_preview();
        let layout = preview.as_ref().unwrap_or_else(|| self.engine.layout());
        let tree = self.engine.tree();
        tree.leaf_ids()
            .into_iter()
            .filter_map(|leaf| {
                let rect = layout.rect(leaf).filter(|rect| !rect.is_empty())?;
                tree.view(leaf).map(|view| view.render(rect))
            })
            .collect()
    }
}
