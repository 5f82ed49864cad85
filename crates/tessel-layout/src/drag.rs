//! Drag gesture state machine.
//!
//! `Idle → Hovering → Dragging → {Committed | Cancelled} → Idle`.
//!
//! The controller reads the engine's committed tree and layout, keeps its
//! live feedback in a [`PreviewOverlay`], and writes only through
//! [`LayoutEngine::apply`] on release. A gesture that cannot be committed is
//! cancelled, never surfaced as an error: the dragged pane disappearing under
//! a concurrent programmatic edit is an expected race.

use std::mem;

use tessel_core::event::PointerEvent;
use tessel_core::geometry::{Point, Rect};

use crate::config::DragTuning;
use crate::engine::{LayoutEngine, Mutation, MutationOutcome};
use crate::hit::{self, HitTarget};
use crate::pane::PaneId;
use crate::preview::PreviewOverlay;
use crate::sink::{CancelReason, DebugEmitter, DebugEventKind, DragPhase};

/// What a gesture is manipulating.
#[derive(Debug, Clone, PartialEq)]
pub enum DragMode {
    /// Moving a split divider.
    Divider { split: PaneId, start_ratio: f64 },
    /// Sliding a tab handle along its strip. `committed` is the tab's order
    /// when the gesture started, `order` the previewed order, and `to` the
    /// dragged handle's current slot.
    TabReorder {
        tab: PaneId,
        from: usize,
        to: usize,
        committed: Vec<PaneId>,
        order: Vec<PaneId>,
    },
    /// Carrying a pane (by its title, or a whole tab stack by its strip)
    /// towards a drop target. `detached` flips once the pointer leaves
    /// `origin_rect` by more than the activation threshold.
    Relocate {
        source: PaneId,
        origin_rect: Rect,
        detached: bool,
    },
}

/// An in-progress gesture.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveDrag {
    pub target: HitTarget,
    pub origin: Point,
    pub current: Point,
    pub mode: DragMode,
    pub preview: Option<PreviewOverlay>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Hovering(HitTarget),
    Dragging(ActiveDrag),
}

impl DragState {
    #[must_use]
    pub const fn phase(&self) -> DragPhase {
        match self {
            Self::Idle => DragPhase::Idle,
            Self::Hovering(_) => DragPhase::Hovering,
            Self::Dragging(_) => DragPhase::Dragging,
        }
    }

    #[must_use]
    pub const fn target(&self) -> Option<HitTarget> {
        match self {
            Self::Idle => None,
            Self::Hovering(target) => Some(*target),
            Self::Dragging(drag) => Some(drag.target),
        }
    }
}

/// Result of feeding one event to the controller.
#[derive(Debug, Clone, PartialEq)]
pub enum DragOutcome {
    /// Nothing changed.
    Ignored,
    /// The controller moved to a new resting phase.
    Transitioned(DragPhase),
    /// The in-progress gesture was updated.
    Previewed,
    Committed(MutationOutcome),
    Cancelled(CancelReason),
}

#[derive(Debug, Clone, Default)]
pub struct DragController {
    tuning: DragTuning,
    state: DragState,
}

impl DragController {
    #[must_use]
    pub fn new(tuning: DragTuning) -> Self {
        Self {
            tuning,
            state: DragState::Idle,
        }
    }

    #[must_use]
    pub const fn state(&self) -> &DragState {
        &self.state
    }

    #[must_use]
    pub const fn tuning(&self) -> &DragTuning {
        &self.tuning
    }

    #[must_use]
    pub const fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging(_))
    }

    /// Live preview of the in-progress gesture.
    #[must_use]
    pub fn preview(&self) -> Option<&PreviewOverlay> {
        match &self.state {
            DragState::Dragging(drag) => drag.preview.as_ref(),
            DragState::Idle | DragState::Hovering(_) => None,
        }
    }

    pub fn handle(
        &mut self,
        engine: &mut LayoutEngine,
        emitter: &mut DebugEmitter,
        event: PointerEvent,
    ) -> DragOutcome {
        match event {
            PointerEvent::Down(point) => self.pointer_down(engine, emitter, point),
            PointerEvent::Move(point) => self.pointer_move(engine, emitter, point),
            PointerEvent::Up(point) => self.pointer_up(engine, emitter, point),
            PointerEvent::Cancel => self.cancel(emitter, CancelReason::Explicit),
            PointerEvent::CaptureLost => self.cancel(emitter, CancelReason::CaptureLost),
        }
    }

    /// End the current gesture without mutating; hovering just returns to idle.
    pub fn cancel(&mut self, emitter: &mut DebugEmitter, reason: CancelReason) -> DragOutcome {
        match self.state {
            DragState::Dragging(_) => self.abort(emitter, reason, None),
            DragState::Hovering(_) => {
                self.transition(emitter, DragState::Idle);
                DragOutcome::Transitioned(DragPhase::Idle)
            }
            DragState::Idle => DragOutcome::Ignored,
        }
    }

    fn pointer_down(
        &mut self,
        engine: &LayoutEngine,
        emitter: &mut DebugEmitter,
        point: Point,
    ) -> DragOutcome {
        if self.is_dragging() {
            tracing::debug!(x = point.x, y = point.y, "drag.ignored_pointer_down");
            return DragOutcome::Ignored;
        }
        let Some(target) = hit::hit_test(engine.layout(), point, self.tuning.divider_grab_slop)
        else {
            return self.settle_hover(emitter, None);
        };
        let Some(mode) = start_mode(engine, target) else {
            return DragOutcome::Ignored;
        };
        self.transition(
            emitter,
            DragState::Dragging(ActiveDrag {
                target,
                origin: point,
                current: point,
                mode,
                preview: None,
            }),
        );
        DragOutcome::Transitioned(DragPhase::Dragging)
    }

    fn pointer_move(
        &mut self,
        engine: &LayoutEngine,
        emitter: &mut DebugEmitter,
        point: Point,
    ) -> DragOutcome {
        let DragState::Dragging(drag) = &mut self.state else {
            let hit = hit::hit_test(engine.layout(), point, self.tuning.divider_grab_slop);
            return self.settle_hover(emitter, hit);
        };
        match track(&self.tuning, engine, drag, point) {
            Ok(()) => {
                tracing::trace!(
                    x = point.x,
                    y = point.y,
                    preview = ?drag.preview,
                    "drag.preview"
                );
                DragOutcome::Previewed
            }
            Err(reason) => self.abort(emitter, reason, None),
        }
    }

    fn pointer_up(
        &mut self,
        engine: &mut LayoutEngine,
        emitter: &mut DebugEmitter,
        point: Point,
    ) -> DragOutcome {
        let DragState::Dragging(drag) = &mut self.state else {
            return DragOutcome::Ignored;
        };
        if let Err(reason) = track(&self.tuning, engine, drag, point) {
            return self.abort(emitter, reason, None);
        }
        let mutation = match plan(engine, drag) {
            Ok(mutation) => mutation,
            Err(reason) => return self.abort(emitter, reason, None),
        };
        match engine.apply(&mutation) {
            Ok(outcome) => self.commit(emitter, outcome),
            Err(err) => {
                tracing::debug!(error = %err, op = mutation.name(), "drag.rejected");
                self.abort(emitter, CancelReason::MutationRejected, Some(mutation))
            }
        }
    }

    fn settle_hover(&mut self, emitter: &mut DebugEmitter, hit: Option<HitTarget>) -> DragOutcome {
        let next = hit.map_or(DragState::Idle, DragState::Hovering);
        if next == self.state {
            return DragOutcome::Ignored;
        }
        let phase = next.phase();
        self.transition(emitter, next);
        DragOutcome::Transitioned(phase)
    }

    fn transition(&mut self, emitter: &mut DebugEmitter, next: DragState) {
        let from = self.state.phase();
        let to = next.phase();
        let target = next.target();
        tracing::debug!(from = ?from, to = ?to, target = ?target, "drag.transition");
        emitter.emit(DebugEventKind::StateTransition { from, to, target });
        self.state = next;
    }

    fn commit(&mut self, emitter: &mut DebugEmitter, outcome: MutationOutcome) -> DragOutcome {
        let target = mem::take(&mut self.state).target();
        emitter.emit(DebugEventKind::StateTransition {
            from: DragPhase::Dragging,
            to: DragPhase::Committed,
            target,
        });
        emitter.emit(DebugEventKind::MutationCommitted {
            mutation: outcome.mutation.clone(),
            after_hash: outcome.after_hash,
        });
        emitter.emit(DebugEventKind::StateTransition {
            from: DragPhase::Committed,
            to: DragPhase::Idle,
            target: None,
        });
        tracing::debug!(
            op = outcome.mutation.name(),
            hash = outcome.after_hash,
            "drag.commit"
        );
        DragOutcome::Committed(outcome)
    }

    fn abort(
        &mut self,
        emitter: &mut DebugEmitter,
        reason: CancelReason,
        mutation: Option<Mutation>,
    ) -> DragOutcome {
        let target = mem::take(&mut self.state).target();
        emitter.emit(DebugEventKind::StateTransition {
            from: DragPhase::Dragging,
            to: DragPhase::Cancelled,
            target,
        });
        emitter.emit(DebugEventKind::MutationCancelled { reason, mutation });
        emitter.emit(DebugEventKind::StateTransition {
            from: DragPhase::Cancelled,
            to: DragPhase::Idle,
            target: None,
        });
        tracing::debug!(reason = ?reason, "drag.cancel");
        DragOutcome::Cancelled(reason)
    }
}

fn start_mode(engine: &LayoutEngine, target: HitTarget) -> Option<DragMode> {
    let tree = engine.tree();
    match target {
        HitTarget::DividerHandle { split } => Some(DragMode::Divider {
            split,
            start_ratio: tree.split(split)?.ratio.get(),
        }),
        HitTarget::TabHandle { tab, index } => {
            let committed = tree.tabs(tab)?.children.clone();
            Some(DragMode::TabReorder {
                tab,
                from: index,
                to: index,
                order: committed.clone(),
                committed,
            })
        }
        HitTarget::TabStripEmpty { tab: pane } | HitTarget::PaneTitleRegion { pane } => {
            Some(DragMode::Relocate {
                source: pane,
                origin_rect: engine.layout().rect(pane)?,
                detached: false,
            })
        }
    }
}

/// Rows between `point` and the strip, measured vertically only.
fn rows_outside(strip: Rect, point: Point) -> u32 {
    let top = i32::from(strip.y);
    let bottom = i32::from(strip.bottom());
    if point.y < top {
        (top - point.y).unsigned_abs()
    } else if point.y >= bottom {
        (point.y - bottom + 1).unsigned_abs()
    } else {
        0
    }
}

/// Advance the gesture to `point`, re-validating its target first.
fn track(
    tuning: &DragTuning,
    engine: &LayoutEngine,
    drag: &mut ActiveDrag,
    point: Point,
) -> Result<(), CancelReason> {
    drag.current = point;
    let threshold = u32::from(tuning.activation_threshold);
    let mut tear_off = None;

    match &mut drag.mode {
        DragMode::Divider { split, start_ratio } => {
            if engine.tree().split(*split).is_none() {
                return Err(CancelReason::TargetInvalidated);
            }
            let divider = engine
                .layout()
                .divider(*split)
                .ok_or(CancelReason::TargetInvalidated)?;
            let extent = divider.available_extent();
            if extent == 0 {
                return Ok(());
            }
            let delta = divider
                .orientation
                .delta_along(point.delta_from(drag.origin));
            let candidate = *start_ratio + f64::from(delta) / f64::from(extent);
            let ratio = engine
                .preview_resize(*split, candidate)
                .map_err(|_| CancelReason::TargetInvalidated)?;
            drag.preview = Some(PreviewOverlay::Ratio {
                split: *split,
                ratio,
            });
        }
        DragMode::TabReorder {
            tab,
            from,
            to,
            committed,
            order,
        } => {
            let tabs = engine
                .tree()
                .tabs(*tab)
                .ok_or(CancelReason::TargetInvalidated)?;
            // `from` and `to` are slots in the order seen at drag start.
            if tabs.children != *committed {
                return Err(CancelReason::TargetInvalidated);
            }
            let strip = engine
                .layout()
                .tab_strip(*tab)
                .ok_or(CancelReason::TargetInvalidated)?;

            if rows_outside(strip.rect, point) > threshold {
                let dragged = order
                    .get(*to)
                    .copied()
                    .ok_or(CancelReason::TargetInvalidated)?;
                tear_off = Some((dragged, strip.rect));
            } else {
                let min_delta = i32::from(tuning.reorder_min_delta).saturating_mul(2);
                let x = point.x.saturating_mul(2);
                loop {
                    if let Some(next_mid) = strip.doubled_midpoint(*to + 1)
                        && x >= next_mid.saturating_add(min_delta)
                    {
                        order.swap(*to, *to + 1);
                        *to += 1;
                        continue;
                    }
                    if *to > 0
                        && let Some(prev_mid) = strip.doubled_midpoint(*to - 1)
                        && x <= prev_mid.saturating_sub(min_delta)
                    {
                        order.swap(*to, *to - 1);
                        *to -= 1;
                        continue;
                    }
                    break;
                }
                let active = tabs
                    .active_child()
                    .and_then(|child| order.iter().position(|candidate| *candidate == child))
                    .unwrap_or(0);
                drag.preview = (*from != *to).then(|| PreviewOverlay::TabOrder {
                    tab: *tab,
                    order: order.clone(),
                    active,
                });
            }
        }
        DragMode::Relocate {
            source,
            origin_rect,
            detached,
        } => {
            if !engine.tree().contains(*source) {
                return Err(CancelReason::TargetInvalidated);
            }
            if !*detached && origin_rect.distance_outside(point) > threshold {
                *detached = true;
                tracing::debug!(pane = %source, "drag.detach");
            }
            if *detached {
                let layout = engine.layout();
                drag.preview =
                    hit::resolve_drop(engine.tree(), layout, point, *source, tuning).map(
                        |target| PreviewOverlay::Drop {
                            target,
                            ghost: target.ghost(layout).unwrap_or_default(),
                        },
                    );
            }
        }
    }

    if let Some((source, origin_rect)) = tear_off {
        tracing::debug!(pane = %source, "drag.tab_tear_off");
        drag.mode = DragMode::Relocate {
            source,
            origin_rect,
            detached: true,
        };
        drag.preview = None;
        return track(tuning, engine, drag, point);
    }
    Ok(())
}

/// The mutation a release commits.
fn plan(engine: &LayoutEngine, drag: &ActiveDrag) -> Result<Mutation, CancelReason> {
    match &drag.mode {
        DragMode::Divider { split, .. } => match &drag.preview {
            Some(PreviewOverlay::Ratio { ratio, .. }) => Ok(Mutation::Resize {
                split: *split,
                ratio: *ratio,
            }),
            _ => Err(CancelReason::NoMovement),
        },
        DragMode::TabReorder { tab, from, to, .. } => {
            if from == to {
                Ok(Mutation::SetActiveTab {
                    tab: *tab,
                    index: *from,
                })
            } else {
                Ok(Mutation::ReorderTab {
                    tab: *tab,
                    from: *from,
                    to: *to,
                })
            }
        }
        DragMode::Relocate {
            source, detached, ..
        } => {
            if !detached {
                return Err(CancelReason::NoMovement);
            }
            match drag.preview.as_ref().and_then(PreviewOverlay::drop_target) {
                Some(target) => target
                    .mutation(engine.tree(), *source)
                    .ok_or(CancelReason::TargetInvalidated),
                None => Err(CancelReason::NoDropTarget),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LayoutMetrics;
    use crate::pane::{Orientation, PaneTree};
    use crate::sink::DebugEvent;
    use std::cell::RefCell;
    use std::rc::Rc;
    use tessel_core::view::View;

    struct Shared(Rc<RefCell<Vec<DebugEvent>>>);

    impl crate::sink::DebugSink for Shared {
        fn emit(&mut self, event: &DebugEvent) {
            self.0.borrow_mut().push(event.clone());
        }
    }

    fn id(raw: u64) -> PaneId {
        PaneId::new(raw).expect("test ID must be non-zero")
    }

    fn split_engine() -> LayoutEngine {
        let mut engine = LayoutEngine::new(
            PaneTree::singleton(View::page(1, "left")),
            Rect::new(0, 0, 81, 20),
            LayoutMetrics::default(),
        )
        .expect("engine");
        let _ = engine
            .split(id(1), Orientation::Horizontal, View::page(2, "right"), false)
            .expect("split");
        engine
    }

    fn recording() -> (DebugEmitter, Rc<RefCell<Vec<DebugEvent>>>) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let emitter = DebugEmitter::new(Some(Box::new(Shared(Rc::clone(&log))))).logical_clock();
        (emitter, log)
    }

    #[test]
    fn divider_drag_commits_resize() {
        let mut engine = split_engine();
        let (mut emitter, log) = recording();
        let mut drag = DragController::default();
        let divider = engine.layout().divider(id(3)).expect("divider").rect;
        let x = i32::from(divider.x);

        let down = drag.handle(&mut engine, &mut emitter, PointerEvent::Down(Point::new(x, 5)));
        assert_eq!(down, DragOutcome::Transitioned(DragPhase::Dragging));
        let moved = drag.handle(
            &mut engine,
            &mut emitter,
            PointerEvent::Move(Point::new(x - 16, 5)),
        );
        assert_eq!(moved, DragOutcome::Previewed);
        assert!(matches!(
            drag.preview(),
            Some(PreviewOverlay::Ratio { split, .. }) if *split == id(3)
        ));
        assert_eq!(engine.tree().split(id(3)).map(|s| s.ratio.get()), Some(0.5));

        let up = drag.handle(&mut engine, &mut emitter, PointerEvent::Up(Point::new(x - 16, 5)));
        let DragOutcome::Committed(outcome) = up else {
            panic!("expected commit, got {up:?}");
        };
        let expected = 0.5 - 16.0 / 81.0;
        let ratio = engine.tree().split(id(3)).expect("split").ratio.get();
        assert!((ratio - expected).abs() < 1e-9);
        assert!(matches!(outcome.mutation, Mutation::Resize { .. }));
        assert_eq!(drag.state(), &DragState::Idle);

        let kinds = log
            .borrow()
            .iter()
            .map(|event| event.kind.clone())
            .collect::<Vec<_>>();
        assert_eq!(kinds.len(), 4);
        assert!(matches!(
            kinds[1],
            DebugEventKind::StateTransition {
                from: DragPhase::Dragging,
                to: DragPhase::Committed,
                ..
            }
        ));
        assert!(matches!(kinds[2], DebugEventKind::MutationCommitted { .. }));
    }

    #[test]
    fn divider_click_without_movement_cancels() {
        let mut engine = split_engine();
        let mut emitter = DebugEmitter::default();
        let mut drag = DragController::default();
        let x = i32::from(engine.layout().divider(id(3)).expect("divider").rect.x);
        let _ = drag.handle(&mut engine, &mut emitter, PointerEvent::Down(Point::new(x, 2)));
        let up = drag.handle(&mut engine, &mut emitter, PointerEvent::Up(Point::new(x, 2)));
        assert_eq!(up, DragOutcome::Cancelled(CancelReason::NoMovement));
    }

    #[test]
    fn second_pointer_down_is_ignored() {
        let mut engine = split_engine();
        let mut emitter = DebugEmitter::default();
        let mut drag = DragController::default();
        let x = i32::from(engine.layout().divider(id(3)).expect("divider").rect.x);
        let _ = drag.handle(&mut engine, &mut emitter, PointerEvent::Down(Point::new(x, 2)));
        let before = drag.state().clone();
        let again = drag.handle(&mut engine, &mut emitter, PointerEvent::Down(Point::new(2, 0)));
        assert_eq!(again, DragOutcome::Ignored);
        assert_eq!(drag.state(), &before);
    }

    #[test]
    fn hover_tracks_targets_and_returns_to_idle() {
        let mut engine = split_engine();
        let mut emitter = DebugEmitter::default();
        let mut drag = DragController::default();
        let title = drag.handle(&mut engine, &mut emitter, PointerEvent::Move(Point::new(3, 0)));
        assert_eq!(title, DragOutcome::Transitioned(DragPhase::Hovering));
        assert_eq!(
            drag.state(),
            &DragState::Hovering(HitTarget::PaneTitleRegion { pane: id(1) })
        );
        let same = drag.handle(&mut engine, &mut emitter, PointerEvent::Move(Point::new(4, 0)));
        assert_eq!(same, DragOutcome::Ignored);
        let away = drag.handle(&mut engine, &mut emitter, PointerEvent::Move(Point::new(4, 9)));
        assert_eq!(away, DragOutcome::Transitioned(DragPhase::Idle));
        let cancel = drag.handle(&mut engine, &mut emitter, PointerEvent::Cancel);
        assert_eq!(cancel, DragOutcome::Ignored);
    }

    #[test]
    fn undetached_title_drag_cancels_without_change() {
        let mut engine = split_engine();
        let mut emitter = DebugEmitter::default();
        let mut drag = DragController::default();
        let before = engine.snapshot();
        let _ = drag.handle(&mut engine, &mut emitter, PointerEvent::Down(Point::new(3, 0)));
        let _ = drag.handle(&mut engine, &mut emitter, PointerEvent::Move(Point::new(5, 1)));
        let up = drag.handle(&mut engine, &mut emitter, PointerEvent::Up(Point::new(5, 1)));
        assert_eq!(up, DragOutcome::Cancelled(CancelReason::NoMovement));
        assert_eq!(engine.snapshot(), before);
    }

    #[test]
    fn rows_outside_ignores_horizontal_offset() {
        let strip = Rect::new(10, 5, 20, 1);
        assert_eq!(rows_outside(strip, Point::new(0, 5)), 0);
        assert_eq!(rows_outside(strip, Point::new(15, 2)), 3);
        assert_eq!(rows_outside(strip, Point::new(15, 8)), 3);
    }
}
